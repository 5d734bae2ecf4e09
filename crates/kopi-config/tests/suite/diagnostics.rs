use kopi_config::{ConfigValidationError, ConfigWarning, KopiConfig, MatchMode};
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

#[test]
fn reports_unknown_keys_with_full_paths() {
    let text = r#"
typo = 1

[ranking]
guess_method_argumnets = false
match_mode = "prefix"

[logging]
levle = "debug"
"#;

    let (config, diagnostics) =
        KopiConfig::load_from_str_with_diagnostics(text).expect("config should parse");

    assert_eq!(
        diagnostics.unknown_keys,
        vec!["logging.levle", "ranking.guess_method_argumnets", "typo"]
    );
    assert_eq!(config.ranking.match_mode, MatchMode::Prefix);
    assert!(config.ranking.guess_method_arguments);
}

#[test]
fn reports_semantic_warnings_and_errors() {
    let text = r#"
[ranking]
completion_triggers = ""
documentation_timeout_ms = 0
max_results = 0
"#;

    let (_config, diagnostics) =
        KopiConfig::load_from_str_with_diagnostics(text).expect("config should parse");

    assert!(diagnostics.warnings.contains(&ConfigWarning::AutoPopupUnreachable));
    assert!(diagnostics.warnings.iter().any(|warning| matches!(
        warning,
        ConfigWarning::InvalidValue { toml_path, .. }
            if toml_path == "ranking.documentation_timeout_ms"
    )));
    assert_eq!(
        diagnostics.errors,
        vec![ConfigValidationError::InvalidValue {
            toml_path: "ranking.max_results".to_string(),
            message: "must be >= 1".to_string(),
        }]
    );
    assert!(!diagnostics.is_ok());
}

#[test]
fn invalid_logging_directive_is_a_warning() {
    let text = "[logging]\nlevel = \"kopi.completion=loud\"\n";
    let (_config, diagnostics) =
        KopiConfig::load_from_str_with_diagnostics(text).expect("config should parse");
    assert!(matches!(
        diagnostics.warnings.as_slice(),
        [ConfigWarning::LoggingLevelInvalid { .. }]
    ));
}

#[test]
fn loads_from_path() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(
        file.path(),
        "[ranking]\nmax_results = 50\nauto_popup_delay_ms = 100\n",
    )
    .unwrap();

    let (config, diagnostics) = KopiConfig::load_from_path_with_diagnostics(file.path()).unwrap();
    assert!(diagnostics.is_empty());
    assert_eq!(config.ranking.max_results, Some(50));
    assert_eq!(config.ranking.auto_popup_delay_ms, 100);
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = KopiConfig::load_from_path(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, kopi_config::ConfigError::Io { .. }));
}
