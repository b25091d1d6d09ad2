//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `smartbin.toml` and the required environment.
//!     tunables come from the file (or defaults); secrets only from the env.
//!
//! structure:
//!     - ServerConfig: listening port (PORT env wins).
//!     - StoreConfig: persistence file, dedup and fill-level toggles.
//!     - AuthConfig: optional session lifetime.
//!     - LoggingConfig: default log filter when RUST_LOG is unset.
//!     - Secrets: SECRET_KEY, FLASK_USER, FLASK_PASS (required; DASHBOARD_USER
//!       and DASHBOARD_PASS are accepted as aliases).
//!
//! ==============================================================================

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::store::StoreOptions;

pub const DEFAULT_PORT: u16 = 8080;

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// history file; unset keeps events in memory only
    pub persist_path: Option<PathBuf>,
    pub dedup: bool,
    pub track_level: bool,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    pub session_ttl_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

/// where the configuration came from, reported once logging is up
#[derive(Debug)]
pub enum ConfigOrigin {
    File(PathBuf),
    /// a discovered file was unusable, defaults were used instead
    Fallback { path: PathBuf, error: ConfigError },
    Defaults,
}

impl AppConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// resolve the configuration from the environment
    ///
    /// `SMARTBIN_CONFIG` names a file explicitly (errors are fatal). otherwise
    /// `config/smartbin.toml` and `../config/smartbin.toml` are tried, falling
    /// back to defaults. `PORT` overrides the file.
    pub fn from_env<F>(lookup: F) -> Result<(Self, ConfigOrigin), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (mut config, origin) = match lookup("SMARTBIN_CONFIG") {
            Some(path) => {
                let path = PathBuf::from(path);
                (Self::load(&path)?, ConfigOrigin::File(path))
            }
            None => Self::load_or_default(),
        };

        if let Some(port) = lookup("PORT") {
            config.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(port.clone()))?;
        }

        Ok((config, origin))
    }

    /// Load with default fallback
    pub fn load_or_default() -> (Self, ConfigOrigin) {
        let paths = [
            PathBuf::from("config").join("smartbin.toml"),
            PathBuf::from("..").join("config").join("smartbin.toml"),
        ];

        for path in paths {
            if path.exists() {
                return match Self::load(&path) {
                    Ok(config) => (config, ConfigOrigin::File(path)),
                    Err(error) => (Self::default(), ConfigOrigin::Fallback { path, error }),
                };
            }
        }

        (Self::default(), ConfigOrigin::Defaults)
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            dedup: self.store.dedup,
            track_level: self.store.track_level,
        }
    }

    pub fn session_ttl(&self) -> Option<Duration> {
        self.auth.session_ttl_secs.map(Duration::from_secs)
    }

    /// Log configuration summary
    pub fn log_summary(&self) {
        let persistence = match &self.store.persist_path {
            Some(path) => path.display().to_string(),
            None => "memory".to_string(),
        };
        tracing::info!(
            port = self.server.port,
            persistence = %persistence,
            dedup = self.store.dedup,
            track_level = self.store.track_level,
            session_ttl_secs = ?self.auth.session_ttl_secs,
            "configuration"
        );
    }
}

/// credentials and signing key, never read from the config file
#[derive(Clone)]
pub struct Secrets {
    pub session_key: String,
    pub username: String,
    pub password: String,
}

impl Secrets {
    /// every secret is required; an empty value counts as missing
    ///
    /// the credentials are read from `FLASK_USER` / `FLASK_PASS`, falling back
    /// to `DASHBOARD_USER` / `DASHBOARD_PASS`. errors name the primary variable.
    pub fn from_env<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str, alias: Option<&str>| {
            let present = |var: &str| lookup(var).filter(|value| !value.is_empty());
            present(name)
                .or_else(|| alias.and_then(present))
                .ok_or(ConfigError::MissingVar(name))
        };

        Ok(Self {
            session_key: required("SECRET_KEY", None)?,
            username: required("FLASK_USER", Some("DASHBOARD_USER"))?,
            password: required("FLASK_PASS", Some("DASHBOARD_PASS"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn secrets_are_required() {
        let err = Secrets::from_env(env(&[("SECRET_KEY", "k"), ("FLASK_USER", "u")])).err();
        assert!(matches!(err, Some(ConfigError::MissingVar("FLASK_PASS"))));

        let err = Secrets::from_env(env(&[
            ("SECRET_KEY", ""),
            ("FLASK_USER", "u"),
            ("FLASK_PASS", "p"),
        ]))
        .err();
        assert!(matches!(err, Some(ConfigError::MissingVar("SECRET_KEY"))));

        let secrets = Secrets::from_env(env(&[
            ("SECRET_KEY", "k"),
            ("FLASK_USER", "u"),
            ("FLASK_PASS", "p"),
        ]))
        .unwrap();
        assert_eq!(secrets.session_key, "k");
        assert_eq!(secrets.username, "u");
        assert_eq!(secrets.password, "p");
    }

    #[test]
    fn dashboard_aliases_fill_in_for_flask_names() {
        let secrets = Secrets::from_env(env(&[
            ("SECRET_KEY", "k"),
            ("DASHBOARD_USER", "alias-u"),
            ("DASHBOARD_PASS", "alias-p"),
        ]))
        .unwrap();
        assert_eq!(secrets.username, "alias-u");
        assert_eq!(secrets.password, "alias-p");

        // the flask names win when both are set
        let secrets = Secrets::from_env(env(&[
            ("SECRET_KEY", "k"),
            ("FLASK_USER", "u"),
            ("DASHBOARD_USER", "alias-u"),
            ("FLASK_PASS", ""),
            ("DASHBOARD_PASS", "alias-p"),
        ]))
        .unwrap();
        assert_eq!(secrets.username, "u");
        assert_eq!(secrets.password, "alias-p");

        let err = Secrets::from_env(env(&[("SECRET_KEY", "k"), ("DASHBOARD_PASS", "p")])).err();
        assert!(matches!(err, Some(ConfigError::MissingVar("FLASK_USER"))));
    }

    #[test]
    fn defaults_when_file_is_empty() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.store_options(), StoreOptions::default());
        assert_eq!(config.session_ttl(), None);
    }

    #[test]
    fn parses_all_sections() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            port = 9000

            [store]
            persist_path = "data/historico.json"
            dedup = true
            track_level = true

            [auth]
            session_ttl_secs = 3600

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.store.persist_path, Some(PathBuf::from("data/historico.json")));
        assert!(config.store_options().dedup);
        assert!(config.store_options().track_level);
        assert_eq!(config.session_ttl(), Some(Duration::from_secs(3600)));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn explicit_file_and_port_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("smartbin.toml");
        std::fs::write(&path, "[server]\nport = 9000\n[store]\ndedup = true\n").unwrap();
        let path_str = path.to_str().unwrap();

        let (config, origin) = AppConfig::from_env(env(&[("SMARTBIN_CONFIG", path_str)])).unwrap();
        assert_eq!(config.server.port, 9000);
        assert!(config.store.dedup);
        assert!(matches!(origin, ConfigOrigin::File(_)));

        let (config, _) =
            AppConfig::from_env(env(&[("SMARTBIN_CONFIG", path_str), ("PORT", "3000")])).unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn bad_port_or_explicit_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("smartbin.toml");
        std::fs::write(&path, "[server]\nport = \"oops\"\n").unwrap();

        let err = AppConfig::from_env(env(&[("SMARTBIN_CONFIG", path.to_str().unwrap())])).err();
        assert!(matches!(err, Some(ConfigError::Parse { .. })));

        let missing = dir.path().join("absent.toml");
        let err = AppConfig::from_env(env(&[("SMARTBIN_CONFIG", missing.to_str().unwrap())])).err();
        assert!(matches!(err, Some(ConfigError::Read { .. })));

        std::fs::write(&path, "").unwrap();
        let err = AppConfig::from_env(env(&[
            ("SMARTBIN_CONFIG", path.to_str().unwrap()),
            ("PORT", "http"),
        ]))
        .err();
        assert!(matches!(err, Some(ConfigError::InvalidPort(_))));
    }
}
