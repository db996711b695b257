use clap::Parser;
use color_eyre::Result;
use datakit::{App, AppConfig, AppEvent, Args, ConfigManager, Theme, APP_NAME};
use ratatui::DefaultTerminal;
use std::sync::mpsc::channel;
use std::time::Duration;
use tracing::info;

fn render(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    terminal.draw(|frame| frame.render_widget(app, frame.area()))?;
    Ok(())
}

fn run(mut terminal: DefaultTerminal, args: &Args, config: AppConfig, theme: Theme) -> Result<()> {
    let poll_interval = Duration::from_millis(config.performance.event_poll_interval_ms);
    let (tx, rx) = channel::<AppEvent>();
    let mut app = App::new_with_config(tx.clone(), theme, config);
    if args.debug {
        app.enable_debug();
    }
    render(&mut terminal, &mut app)?;
    if let Some(path) = &args.path {
        tx.send(AppEvent::Open(path.clone()))?;
    }

    loop {
        if crossterm::event::poll(poll_interval)? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key)
                    if key.kind == crossterm::event::KeyEventKind::Press =>
                {
                    tx.send(AppEvent::Key(key))?
                }
                crossterm::event::Event::Resize(cols, rows) => {
                    tx.send(AppEvent::Resize(cols, rows))?
                }
                _ => {}
            }
        }

        let updated = match rx.recv_timeout(Duration::from_millis(0)) {
            Ok(event) => {
                match event {
                    AppEvent::Exit => break,
                    AppEvent::Crash(msg) => {
                        return Err(color_eyre::eyre::eyre!(msg));
                    }
                    event => {
                        if let Some(event) = app.event(&event) {
                            tx.send(event)?;
                        }
                    }
                }
                true
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => false,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        };

        if updated {
            render(&mut terminal, &mut app)?;
        }
    }
    Ok(())
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.generate_config {
        let manager = ConfigManager::new(APP_NAME)?;
        match manager.write_default_config(args.force) {
            Ok(path) => {
                println!("Configuration written to {}", path.display());
                return Ok(Some(()));
            }
            Err(e) => {
                eprintln!("Error generating config: {}", e);
                std::process::exit(1);
            }
        }
    }
    Ok(None)
}

/// Configuration file values with command-line flags applied on top.
fn effective_config(args: &Args) -> Result<AppConfig> {
    let mut config = AppConfig::load(APP_NAME)?;
    apply_args(&mut config, args);
    config.validate()?;
    Ok(config)
}

fn apply_args(config: &mut AppConfig, args: &Args) {
    if let Some(separator) = args.separator {
        config.file_loading.separator = Some(separator);
    }
    if let Some(encoding) = args.encoding {
        config.file_loading.encoding = Some(encoding);
    }
    if let Some(dir) = &args.output_dir {
        config.export.output_dir = dir.display().to_string();
    }
    if args.debug {
        config.debug.enabled = true;
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    color_eyre::install()?;
    let config = effective_config(&args)?;
    let log_dir = datakit::logging::resolve_log_dir(args.log_dir.as_deref(), &config.logging)?;
    datakit::logging::init(&log_dir, &config.logging, config.debug.enabled)?;
    info!(version = env!("CARGO_PKG_VERSION"), "starting");

    let theme = Theme::from_config(&config.theme)
        .or_else(|e| Theme::from_config(&AppConfig::default().theme).map_err(|_| e))?;

    let terminal = ratatui::init();
    let result = run(terminal, &args, config, theme);
    ratatui::restore();
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use datakit::source::{Separator, TextEncoding};

    #[test]
    fn test_flags_override_config() {
        let args = Args::parse_from([
            "datakit",
            "--separator",
            "semicolon",
            "--encoding",
            "latin-1",
            "--output-dir",
            "/tmp/out",
        ]);
        let mut config = AppConfig::default();
        apply_args(&mut config, &args);
        assert_eq!(config.file_loading.separator, Some(Separator::Semicolon));
        assert_eq!(config.file_loading.encoding, Some(TextEncoding::Latin1));
        assert_eq!(config.export.output_dir, "/tmp/out");
        assert!(!config.debug.enabled);
        assert!(config.validate().is_ok());
    }
}
