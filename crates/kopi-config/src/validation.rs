use crate::diagnostics::{ConfigValidationError, ConfigWarning, ValidationDiagnostics};
use crate::{KopiConfig, LoggingConfig};

const MAX_SENSIBLE_DELAY_MS: u64 = 10_000;
const MAX_SENSIBLE_DOC_TIMEOUT_MS: u64 = 60_000;

impl KopiConfig {
    /// Validate semantic invariants for a configuration.
    ///
    /// Reports as many problems as possible in one pass.
    #[must_use]
    pub fn validate(&self) -> ValidationDiagnostics {
        let mut out = ValidationDiagnostics::default();

        validate_ranking(self, &mut out);
        validate_logging(self, &mut out);

        out
    }
}

fn validate_ranking(config: &KopiConfig, out: &mut ValidationDiagnostics) {
    let ranking = &config.ranking;

    if ranking.completion_triggers.is_empty() && !ranking.auto_popup_on_identifier_part {
        out.warnings.push(ConfigWarning::AutoPopupUnreachable);
    }

    if ranking.auto_popup_delay_ms > MAX_SENSIBLE_DELAY_MS {
        out.warnings.push(ConfigWarning::InvalidValue {
            toml_path: "ranking.auto_popup_delay_ms".to_string(),
            message: format!("must be <= {MAX_SENSIBLE_DELAY_MS}"),
        });
    }

    if ranking.documentation_timeout_ms == 0 {
        out.warnings.push(ConfigWarning::InvalidValue {
            toml_path: "ranking.documentation_timeout_ms".to_string(),
            message: "must be >= 1; documentation will never be shown".to_string(),
        });
    } else if ranking.documentation_timeout_ms > MAX_SENSIBLE_DOC_TIMEOUT_MS {
        out.warnings.push(ConfigWarning::InvalidValue {
            toml_path: "ranking.documentation_timeout_ms".to_string(),
            message: format!("must be <= {MAX_SENSIBLE_DOC_TIMEOUT_MS}"),
        });
    }

    if ranking.max_results == Some(0) {
        out.errors.push(ConfigValidationError::InvalidValue {
            toml_path: "ranking.max_results".to_string(),
            message: "must be >= 1".to_string(),
        });
    }
}

fn validate_logging(config: &KopiConfig, out: &mut ValidationDiagnostics) {
    let normalized = LoggingConfig::normalize_level_directives(&config.logging.level);
    if !config.logging.level.trim().is_empty()
        && tracing_subscriber::EnvFilter::try_new(normalized.clone()).is_err()
    {
        out.warnings.push(ConfigWarning::LoggingLevelInvalid {
            value: config.logging.level.clone(),
            normalized,
        });
    }

    if config.logging.buffer_lines == 0 {
        out.errors.push(ConfigValidationError::InvalidValue {
            toml_path: "logging.buffer_lines".to_string(),
            message: "must be >= 1".to_string(),
        });
    }
}
