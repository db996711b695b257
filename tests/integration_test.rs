use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use datakit::upload_form::UploadFocus;
use datakit::{App, AppConfig, AppEvent, Mode, Screen, Theme};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::Widget;
use std::path::Path;
use std::sync::mpsc;
use tempfile::TempDir;

mod common;

fn press(app: &mut App, code: KeyCode) -> Option<AppEvent> {
    app.event(&AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
}

fn ctrl(app: &mut App, c: char) -> Option<AppEvent> {
    app.event(&AppEvent::Key(KeyEvent::new(
        KeyCode::Char(c),
        KeyModifiers::CONTROL,
    )))
}

fn screen_text(app: &mut App) -> String {
    let area = Rect::new(0, 0, 120, 40);
    let mut buf = Buffer::empty(area);
    Widget::render(&mut *app, area, &mut buf);
    buf.content().iter().map(|cell| cell.symbol()).collect()
}

fn app_with_output(output_dir: &Path) -> App {
    let (tx, _rx) = mpsc::channel();
    let mut config = AppConfig::default();
    config.export.output_dir = output_dir.display().to_string();
    App::new_with_config(tx, Theme::default(), config)
}

fn people_csv(dir: &Path) -> std::path::PathBuf {
    let mut text = String::from("id,group,score\n");
    for i in 0..10 {
        let score = if i == 3 { String::new() } else { (i * 10).to_string() };
        text.push_str(&format!("{},{},{}\n", i, if i % 2 == 0 { "x" } else { "y" }, score));
    }
    common::write_file(dir, "people.csv", text.as_bytes())
}

fn load_file(app: &mut App, path: &Path) {
    app.event(&AppEvent::Open(path.to_path_buf()));
    assert!(!app.error_modal.active, "open failed: {}", app.error_modal.message);
    while app.upload.focus != UploadFocus::Load {
        press(app, KeyCode::Tab);
    }
    press(app, KeyCode::Enter);
    assert!(!app.error_modal.active, "load failed: {}", app.error_modal.message);
}

#[test]
fn test_app_creation() {
    let (tx, _) = mpsc::channel();
    let mut app = App::new(tx);
    assert_eq!(app.screen(), Screen::Upload);
    assert!(screen_text(&mut app).contains("Data Toolkit"));
}

#[test]
fn test_full_workflow() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out");
    let csv = people_csv(dir.path());
    let mut app = app_with_output(&out);

    // 1. Load
    load_file(&mut app, &csv);
    assert_eq!(app.screen(), Screen::Overview);
    assert_eq!(app.session.dataset().unwrap().shape(), (10, 3));
    assert!(screen_text(&mut app).contains("people.csv"));

    // 2. Explore with the default analysis
    press(&mut app, KeyCode::Char('e'));
    assert_eq!(app.session.mode, Mode::Explore);
    press(&mut app, KeyCode::Char('r'));
    let report = app.explore.report.as_ref().expect("report");
    assert_eq!(report.describe.as_ref().map(|d| d.columns.len()), Some(2));
    screen_text(&mut app);
    press(&mut app, KeyCode::Esc);
    assert_eq!(app.screen(), Screen::Overview);

    // 3. Sample 4 random rows
    press(&mut app, KeyCode::Char('t'));
    assert_eq!(app.screen(), Screen::Transform);
    for _ in 0..3 {
        press(&mut app, KeyCode::Tab);
    }
    press(&mut app, KeyCode::Backspace);
    press(&mut app, KeyCode::Backspace);
    press(&mut app, KeyCode::Char('4'));
    press(&mut app, KeyCode::Enter);
    assert!(!app.error_modal.active, "{}", app.error_modal.message);
    assert_eq!(app.session.dataset().unwrap().height(), 4);
    screen_text(&mut app);

    // 4. Export the sample from the form that opened after applying
    for _ in 0..5 {
        press(&mut app, KeyCode::Tab);
    }
    press(&mut app, KeyCode::Enter);
    assert!(!app.error_modal.active, "{}", app.error_modal.message);
    let exported = out.join("people_sampling.csv");
    assert_eq!(app.session.last_export.as_deref(), Some(exported.as_path()));
    assert!(exported.exists());

    // 5. Continue from the exported file
    press(&mut app, KeyCode::Esc);
    press(&mut app, KeyCode::Char('c'));
    assert_eq!(app.session.dataset().unwrap().height(), 4);
    assert_eq!(app.session.default_output_base(), "people_sampling");

    // 6. Reset keeps the typed path
    ctrl(&mut app, 'r');
    assert_eq!(app.screen(), Screen::Upload);
    assert!(app.session.dataset().is_none());
    assert_eq!(app.upload.path_input.value(), csv.display().to_string());

    assert!(matches!(ctrl(&mut app, 'c'), Some(AppEvent::Exit)));
}

#[test]
fn test_bad_encoding_shows_error_and_keeps_session() {
    let dir = TempDir::new().unwrap();
    let path = common::write_file(dir.path(), "latin.csv", b"name\nJos\xe9\n");
    let mut app = app_with_output(&dir.path().join("out"));
    app.event(&AppEvent::Open(path));

    // Force utf-8 regardless of what was sniffed
    app.upload.encoding = datakit::source::TextEncoding::Utf8;
    app.upload.focus = UploadFocus::Load;
    press(&mut app, KeyCode::Enter);
    assert!(app.error_modal.active);
    assert!(app.error_modal.message.contains("utf-8"));
    assert!(!app.session.loaded);
    assert!(screen_text(&mut app).contains("Error"));

    // Keys other than Esc/Enter are swallowed by the modal
    assert!(press(&mut app, KeyCode::Char('q')).is_none());
    press(&mut app, KeyCode::Esc);
    assert!(!app.error_modal.active);
}

#[test]
fn test_help_overlay() {
    let (tx, _) = mpsc::channel();
    let mut app = App::new(tx);
    press(&mut app, KeyCode::F(1));
    assert!(app.show_help);
    press(&mut app, KeyCode::Esc);
    assert!(!app.show_help);
}

#[test]
fn test_missing_file_reports_error() {
    let (tx, _) = mpsc::channel();
    let mut app = App::new(tx);
    app.event(&AppEvent::Open("/definitely/not/here.csv".into()));
    assert!(app.error_modal.active);
    assert_eq!(app.screen(), Screen::Upload);
}
