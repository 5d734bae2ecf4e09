use std::ffi::OsString;

use kopi_config::{
    discover_config_path, load_for_workspace, reload_for_workspace, with_config_env_lock,
    KopiConfig, KOPI_CONFIG_ENV_VAR,
};
use tempfile::tempdir;

struct EnvVarGuard {
    key: &'static str,
    prev: Option<OsString>,
}

impl EnvVarGuard {
    fn set(key: &'static str, value: &std::path::Path) -> Self {
        let prev = std::env::var_os(key);
        std::env::set_var(key, value);
        Self { key, prev }
    }

    fn unset(key: &'static str) -> Self {
        let prev = std::env::var_os(key);
        std::env::remove_var(key);
        Self { key, prev }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        match &self.prev {
            Some(v) => std::env::set_var(self.key, v),
            None => std::env::remove_var(self.key),
        }
    }
}

#[test]
fn discovers_kopi_toml_in_workspace_root() {
    with_config_env_lock(|| {
        let _env = EnvVarGuard::unset(KOPI_CONFIG_ENV_VAR);

        let dir = tempdir().unwrap();
        let config_path = dir.path().join("kopi.toml");
        std::fs::write(&config_path, "[ranking]\nmax_results = 10\n").unwrap();

        let discovered = discover_config_path(dir.path()).expect("kopi.toml should be found");
        assert_eq!(discovered, config_path.canonicalize().unwrap_or(config_path));
    });
}

#[test]
fn falls_back_to_dot_kopi_directory() {
    with_config_env_lock(|| {
        let _env = EnvVarGuard::unset(KOPI_CONFIG_ENV_VAR);

        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".kopi")).unwrap();
        std::fs::write(
            dir.path().join(".kopi/config.toml"),
            "[ranking]\nguess_method_arguments = false\n",
        )
        .unwrap();

        let (config, path) = load_for_workspace(dir.path()).unwrap();
        assert!(path.is_some());
        assert!(!config.ranking.guess_method_arguments);
    });
}

#[test]
fn env_override_wins_over_workspace_file() {
    with_config_env_lock(|| {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("kopi.toml"), "[ranking]\nmax_results = 10\n").unwrap();

        let override_path = dir.path().join("override.toml");
        std::fs::write(&override_path, "[ranking]\nmax_results = 99\n").unwrap();
        let _env = EnvVarGuard::set(KOPI_CONFIG_ENV_VAR, &override_path);

        let (config, _path) = load_for_workspace(dir.path()).unwrap();
        assert_eq!(config.ranking.max_results, Some(99));
    });
}

#[test]
fn missing_config_yields_defaults() {
    with_config_env_lock(|| {
        let _env = EnvVarGuard::unset(KOPI_CONFIG_ENV_VAR);
        let dir = tempdir().unwrap();

        let (config, path) = load_for_workspace(dir.path()).unwrap();
        assert_eq!(config, KopiConfig::default());
        assert_eq!(path, None);
    });
}

#[test]
fn reload_reports_changes() {
    with_config_env_lock(|| {
        let _env = EnvVarGuard::unset(KOPI_CONFIG_ENV_VAR);
        let dir = tempdir().unwrap();
        let file = dir.path().join("kopi.toml");
        std::fs::write(&file, "[ranking]\nmax_results = 10\n").unwrap();

        let (config, path) = load_for_workspace(dir.path()).unwrap();
        let (_same, _path, changed) =
            reload_for_workspace(dir.path(), &config, path.as_deref()).unwrap();
        assert!(!changed);

        std::fs::write(&file, "[ranking]\nmax_results = 20\n").unwrap();
        let (updated, _path, changed) =
            reload_for_workspace(dir.path(), &config, path.as_deref()).unwrap();
        assert!(changed);
        assert_eq!(updated.ranking.max_results, Some(20));
    });
}
