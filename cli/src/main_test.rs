use super::*;

fn parse(args: &[&str]) -> Cli {
    let mut argv = vec!["gesture-cli"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap()
}

// =============================================================
// Arguments
// =============================================================

#[test]
fn command_definition_is_consistent() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
}

#[test]
fn double_click_accepts_numeric_and_word_booleans() {
    assert_eq!(parse(&["--double-click", "1", "replay", "s.json"]).double_click, Some(true));
    assert_eq!(parse(&["--double-click", "0", "replay", "s.json"]).double_click, Some(false));
    assert_eq!(parse(&["--double-click", "yes", "snap"]).double_click, Some(true));
    assert_eq!(parse(&["--double-click", "off", "snap"]).double_click, Some(false));
}

#[test]
fn double_click_rejects_garbage() {
    assert!(Cli::try_parse_from(["gesture-cli", "--double-click", "maybe", "replay"]).is_err());
}

// =============================================================
// Configuration
// =============================================================

#[test]
fn config_file_replaces_defaults_and_flag_overrides_it() {
    let path = std::env::temp_dir().join(format!("gesture-cli-config-{}.json", std::process::id()));
    std::fs::write(&path, r#"{"double_click_enabled": false, "thresholds": {"move_x": 12.0}}"#).unwrap();
    let path_str = path.to_string_lossy().to_string();

    let from_file = gesture_config(&parse(&["--config", &path_str, "replay"])).unwrap();
    assert!(!from_file.double_click_enabled);
    assert!((from_file.thresholds.move_x - 12.0).abs() < f64::EPSILON);

    let overridden = gesture_config(&parse(&["--config", &path_str, "--double-click", "1", "replay"])).unwrap();
    assert!(overridden.double_click_enabled);
    assert!((overridden.thresholds.move_x - 12.0).abs() < f64::EPSILON);

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn missing_config_file_is_a_read_error() {
    let cli = parse(&["--config", "/nonexistent/gesture-config.json", "replay"]);
    assert!(matches!(gesture_config(&cli), Err(CliError::Read { .. })));
}
