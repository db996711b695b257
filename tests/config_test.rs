use datakit::config::{AppConfig, ConfigManager, Theme, ThemeConfig};
use datakit::export::ExportFormat;
use datakit::source::{Separator, TextEncoding};
use std::fs;
use tempfile::TempDir;

// Helper to create a temporary config directory for testing
fn setup_test_config_dir() -> (TempDir, ConfigManager) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_manager = ConfigManager::with_dir(temp_dir.path().to_path_buf());
    (temp_dir, config_manager)
}

#[test]
fn test_default_config() {
    let config = AppConfig::default();
    assert_eq!(config.version, "0.1");
    assert_eq!(config.file_loading.separator, None);
    assert_eq!(config.file_loading.encoding, None);
    assert_eq!(config.export.output_dir, "output");
    assert_eq!(config.export.format, ExportFormat::Csv);
    assert_eq!(config.sampling.default_rows, 1000);
    assert_eq!(config.sampling.default_percentage, 10);
    assert_eq!(config.analysis.chart_format, "png");
    assert_eq!(config.logging.level, "error");
    assert_eq!(config.performance.event_poll_interval_ms, 25);
    assert!(!config.debug.enabled);
    assert!(config.validate().is_ok());
}

#[test]
fn test_missing_file_gives_defaults() {
    let (_temp_dir, manager) = setup_test_config_dir();
    let config = manager.load_config().unwrap();
    assert_eq!(config.sampling.default_rows, 1000);
}

#[test]
fn test_generated_template_matches_defaults() {
    let (_temp_dir, manager) = setup_test_config_dir();
    let path = manager.write_default_config(false).unwrap();
    assert!(path.exists());

    let loaded = manager.load_config().unwrap();
    let defaults = AppConfig::default();
    assert_eq!(loaded.version, defaults.version);
    assert_eq!(loaded.export.output_dir, defaults.export.output_dir);
    assert_eq!(loaded.analysis.kde_points, defaults.analysis.kde_points);
    assert_eq!(loaded.theme.colors.primary, defaults.theme.colors.primary);
    assert!(loaded.validate().is_ok());

    // Second write refuses without force
    assert!(manager.write_default_config(false).is_err());
    assert!(manager.write_default_config(true).is_ok());
}

#[test]
fn test_partial_config_merges_over_defaults() {
    let (_temp_dir, manager) = setup_test_config_dir();
    manager.ensure_config_dir().unwrap();
    fs::write(
        manager.config_path("config.toml"),
        r##"
[file_loading]
separator = "semicolon"
encoding = "cp1252"

[export]
format = "xlsx"

[sampling]
default_rows = 50

[theme.colors]
primary = "#ff0000"
"##,
    )
    .unwrap();

    let user = manager.load_config().unwrap();
    let mut config = AppConfig::default();
    config.merge(user);

    assert_eq!(config.file_loading.separator, Some(Separator::Semicolon));
    assert_eq!(config.file_loading.encoding, Some(TextEncoding::Windows1252));
    assert_eq!(config.export.format, ExportFormat::Xlsx);
    assert_eq!(config.export.output_dir, "output");
    assert_eq!(config.sampling.default_rows, 50);
    assert_eq!(config.sampling.default_percentage, 10);
    assert_eq!(config.theme.colors.primary, "#ff0000");
    assert_eq!(config.theme.colors.secondary, "yellow");
    assert!(config.validate().is_ok());
}

#[test]
fn test_malformed_config_is_an_error() {
    let (_temp_dir, manager) = setup_test_config_dir();
    manager.ensure_config_dir().unwrap();
    fs::write(manager.config_path("config.toml"), "[sampling\ndefault_rows = ").unwrap();
    let err = manager.load_config().unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
}

#[test]
fn test_validation_rejects_bad_values() {
    let mut config = AppConfig::default();
    config.sampling.default_percentage = 150;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.analysis.chart_format = "gif".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.logging.level = "loud".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.version = "9.0".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_theme_lookup() {
    let theme = Theme::from_config(&ThemeConfig::default()).unwrap();
    assert_eq!(theme.colors.len(), 19);
    assert_eq!(theme.get("no_such_color"), ratatui::style::Color::Reset);
}

#[test]
fn test_theme_section_ignores_retired_keys() {
    let (_temp_dir, manager) = setup_test_config_dir();
    manager.ensure_config_dir().unwrap();
    fs::write(
        manager.config_path("config.toml"),
        "[theme]\ncolor_mode = \"dark\"\n\n[theme.colors]\nprimary = \"red\"\n",
    )
    .unwrap();

    let user = manager.load_config().unwrap();
    assert_eq!(user.theme.colors.primary, "red");
    assert!(user.validate().is_ok());

    let template = fs::read_to_string(manager.write_default_config(false).unwrap()).unwrap();
    assert!(!template.contains("color_mode"));
}
