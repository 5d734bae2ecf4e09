use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use parking_lot::ReentrantMutex;
use thiserror::Error;

mod diagnostics;
mod logging;
mod schema;
mod validation;

pub use diagnostics::{
    ConfigDiagnostics, ConfigValidationError, ConfigWarning, ValidationDiagnostics,
};
pub use logging::{init_tracing, LogBuffer, LoggingConfig};
pub use schema::json_schema;

/// How the typed prefix selects candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Case-insensitive prefix match only.
    Prefix,
    /// Prefix match, or camel-case humps (`gNa` matches `getName`).
    #[default]
    CamelCase,
    /// Any in-order subsequence (`nme` matches `name`), scored so prefix matches still win.
    Subsequence,
}

/// Completion ranking preferences.
///
/// Passed by value to the engine and the session; a reload produces a fresh value instead of
/// mutating shared state.
///
/// ```toml
/// [ranking]
/// guess_method_arguments = true
/// completion_triggers = "."
/// auto_popup_delay_ms = 250
/// match_mode = "camel_case"
/// max_results = 500
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct RankingConfig {
    /// Fill method arguments with matching in-scope variables instead of parameter names.
    #[serde(default = "RankingConfig::default_guess_method_arguments")]
    pub guess_method_arguments: bool,

    /// Open completion automatically while typing identifier characters.
    #[serde(default)]
    pub auto_popup_on_identifier_part: bool,

    /// Characters that open completion automatically when typed.
    #[serde(default = "RankingConfig::default_completion_triggers")]
    pub completion_triggers: String,

    /// Delay between an auto-popup trigger and the query start.
    #[serde(default = "RankingConfig::default_auto_popup_delay_ms")]
    pub auto_popup_delay_ms: u64,

    #[serde(default)]
    pub match_mode: MatchMode,

    /// Truncate ranked results to this many items. Unlimited when unset.
    #[serde(default)]
    #[schemars(range(min = 1))]
    pub max_results: Option<usize>,

    /// Budget for a documentation lookup before the item is shown without it.
    #[serde(default = "RankingConfig::default_documentation_timeout_ms")]
    pub documentation_timeout_ms: u64,
}

impl RankingConfig {
    fn default_guess_method_arguments() -> bool {
        true
    }

    fn default_completion_triggers() -> String {
        ".".to_owned()
    }

    fn default_auto_popup_delay_ms() -> u64 {
        250
    }

    fn default_documentation_timeout_ms() -> u64 {
        1_000
    }

    pub fn auto_popup_delay(&self) -> Duration {
        Duration::from_millis(self.auto_popup_delay_ms)
    }

    pub fn documentation_timeout(&self) -> Duration {
        Duration::from_millis(self.documentation_timeout_ms)
    }

    /// Whether typing `ch` right before the caret should open completion automatically.
    pub fn is_auto_popup_trigger(&self, ch: char) -> bool {
        self.completion_triggers.contains(ch)
            || (self.auto_popup_on_identifier_part && (ch.is_alphanumeric() || ch == '_'))
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            guess_method_arguments: Self::default_guess_method_arguments(),
            auto_popup_on_identifier_part: false,
            completion_triggers: Self::default_completion_triggers(),
            auto_popup_delay_ms: Self::default_auto_popup_delay_ms(),
            match_mode: MatchMode::default(),
            max_results: None,
            documentation_timeout_ms: Self::default_documentation_timeout_ms(),
        }
    }
}

/// Top-level `kopi.toml`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[schemars(deny_unknown_fields)]
pub struct KopiConfig {
    #[serde(default)]
    pub ranking: RankingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // The `Display` impl embeds a source snippet; keep only the message.
        ConfigError::Toml(err.message().to_owned())
    }
}

fn read_config_text(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

impl KopiConfig {
    /// Load a config file from TOML.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = read_config_text(path.as_ref())?;
        Ok(toml::from_str(&text)?)
    }

    /// Load a config file from TOML and return diagnostics (unknown keys and semantic
    /// validation failures).
    pub fn load_from_path_with_diagnostics(
        path: impl AsRef<Path>,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let text = read_config_text(path.as_ref())?;
        Self::load_from_str_with_diagnostics(&text)
    }

    pub fn load_from_str_with_diagnostics(
        text: &str,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let (config, unknown_keys) =
            diagnostics::deserialize_toml_with_unknown_keys::<KopiConfig>(text)?;

        let mut diagnostics = ConfigDiagnostics {
            unknown_keys,
            ..ConfigDiagnostics::default()
        };
        diagnostics.extend_validation(config.validate());

        for key in &diagnostics.unknown_keys {
            tracing::warn!(target: "kopi.config", key = %key, "ignoring unknown config key");
        }

        Ok((config, diagnostics))
    }
}

/// Environment variable naming an explicit config file.
pub const KOPI_CONFIG_ENV_VAR: &str = "KOPI_CONFIG";

static CONFIG_ENV_LOCK: OnceLock<ReentrantMutex<()>> = OnceLock::new();

fn config_env_lock() -> &'static ReentrantMutex<()> {
    CONFIG_ENV_LOCK.get_or_init(|| ReentrantMutex::new(()))
}

/// Run `f` while holding the config environment lock.
///
/// Tests that set [`KOPI_CONFIG_ENV_VAR`] temporarily wrap the mutation and the discovery in this
/// helper so concurrent discovery never observes the override.
pub fn with_config_env_lock<R>(f: impl FnOnce() -> R) -> R {
    let _guard = config_env_lock().lock();
    f()
}

/// Discover the configuration file for a workspace root.
///
/// Search order:
/// 1) `KOPI_CONFIG` (absolute or relative to `workspace_root`)
/// 2) `kopi.toml` in `workspace_root`
/// 3) `.kopi/config.toml` in `workspace_root`
pub fn discover_config_path(workspace_root: &Path) -> Option<PathBuf> {
    let _guard = config_env_lock().lock();
    if let Some(value) = std::env::var_os(KOPI_CONFIG_ENV_VAR) {
        let candidate = PathBuf::from(value);
        let path = if candidate.is_absolute() {
            candidate
        } else {
            workspace_root.join(candidate)
        };
        return Some(path.canonicalize().unwrap_or(path));
    }

    ["kopi.toml", ".kopi/config.toml"]
        .into_iter()
        .map(|name| workspace_root.join(name))
        .find(|path| path.is_file())
        .map(|path| path.canonicalize().unwrap_or(path))
}

/// Load the configuration for a workspace root.
///
/// If no config is present, returns [`KopiConfig::default`] and `None`.
pub fn load_for_workspace(
    workspace_root: &Path,
) -> Result<(KopiConfig, Option<PathBuf>), ConfigError> {
    let Some(path) = discover_config_path(workspace_root) else {
        return Ok((KopiConfig::default(), None));
    };

    let config = KopiConfig::load_from_path(&path)?;
    Ok((config, Some(path)))
}

pub fn load_for_workspace_with_diagnostics(
    workspace_root: &Path,
) -> Result<(KopiConfig, Option<PathBuf>, ConfigDiagnostics), ConfigError> {
    let Some(path) = discover_config_path(workspace_root) else {
        return Ok((KopiConfig::default(), None, ConfigDiagnostics::default()));
    };

    let (config, diagnostics) = KopiConfig::load_from_path_with_diagnostics(&path)?;
    Ok((config, Some(path), diagnostics))
}

/// Reload the configuration for a workspace root and report whether it changed.
pub fn reload_for_workspace(
    workspace_root: &Path,
    previous: &KopiConfig,
    previous_path: Option<&Path>,
) -> Result<(KopiConfig, Option<PathBuf>, bool), ConfigError> {
    let (config, path) = load_for_workspace(workspace_root)?;
    let changed = path.as_deref() != previous_path || &config != previous;
    if changed {
        tracing::info!(
            target: "kopi.config",
            path = ?path,
            "configuration changed"
        );
    }
    Ok((config, path, changed))
}
