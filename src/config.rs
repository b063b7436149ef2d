//! Configuration loading and validation.
//!
//! Settings come from an optional TOML file overlaid with `FIXHIVE_*`
//! environment variables (environment wins). Empty values count as unset.
//!
//! ```toml
//! [remote]
//! url = "https://project.supabase.co"
//! key = "service-or-anon-key"
//!
//! [cache]
//! path = "~/.fixhive/data.db"
//!
//! [log]
//! level = "info"
//!
//! [server]
//! bind = "127.0.0.1:7717"
//! ```
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `FIXHIVE_SUPABASE_URL` | `remote.url` |
//! | `FIXHIVE_SUPABASE_KEY` | `remote.key` |
//! | `FIXHIVE_DB_PATH` | `cache.path` |
//! | `FIXHIVE_LOG_LEVEL` | `log.level` |
//! | `FIXHIVE_BIND` | `server.bind` |
//! | `FIXHIVE_DEVICE_ID` | `device.id` |
//!
//! The remote URL and key enable cloud mode together; configuring only one of
//! them is rejected by [`load_config`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::{Lazy, OnceCell};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const ENV_REMOTE_URL: &str = "FIXHIVE_SUPABASE_URL";
pub const ENV_REMOTE_KEY: &str = "FIXHIVE_SUPABASE_KEY";
pub const ENV_CACHE_PATH: &str = "FIXHIVE_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "FIXHIVE_LOG_LEVEL";
pub const ENV_BIND: &str = "FIXHIVE_BIND";
pub const ENV_DEVICE_ID: &str = "FIXHIVE_DEVICE_ID";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub cache: CacheConfig,
    pub log: LogConfig,
    pub server: ServerConfig,
    pub device: DeviceConfig,
}

/// Remote knowledge-base endpoint and credential.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RemoteConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
}

/// Local cache location. Reserved; nothing reads or writes it yet.
#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
        }
    }
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("~/.fixhive/data.db")
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct LogConfig {
    #[serde(default)]
    pub level: LogLevel,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(ConfigError::invalid(
                "log.level",
                format!("'{}' is not one of debug, info, warn, error", other),
            )),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7717".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DeviceConfig {
    #[serde(default)]
    pub id: Option<String>,
}

impl Config {
    /// True when both the remote URL and key are configured.
    pub fn cloud_enabled(&self) -> bool {
        self.remote_credentials().is_some()
    }

    /// The remote URL and key, if cloud mode is enabled.
    pub fn remote_credentials(&self) -> Option<(&str, &str)> {
        match (&self.remote.url, &self.remote.key) {
            (Some(url), Some(key)) => Some((url.as_str(), key.as_str())),
            _ => None,
        }
    }

    /// The effective configuration with the credential masked, for display.
    pub fn masked_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "cloudEnabled": self.cloud_enabled(),
            "remoteUrl": self.remote.url,
            "remoteKey": self.remote.key.as_ref().map(|_| "********"),
            "cachePath": self.cache.path.display().to_string(),
            "logLevel": self.log.level,
            "bind": self.server.bind,
            "deviceId": self.device.id,
        })
    }
}

/// Loads configuration from `path` (if given) and the process environment.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Like [`load_config`], reading overrides through `env` instead of the
/// process environment.
pub fn load_config_with_env(
    path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => Config::default(),
    };
    apply_env_overrides(&mut config, env)?;
    validate(config)
}

fn read_config_file(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn apply_env_overrides(
    config: &mut Config,
    env: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = env(ENV_REMOTE_URL) {
        config.remote.url = Some(url);
    }
    if let Some(key) = env(ENV_REMOTE_KEY) {
        config.remote.key = Some(key);
    }
    if let Some(path) = env(ENV_CACHE_PATH) {
        config.cache.path = PathBuf::from(path);
    }
    if let Some(level) = env(ENV_LOG_LEVEL) {
        config.log.level = level.trim().parse()?;
    }
    if let Some(bind) = env(ENV_BIND) {
        config.server.bind = bind;
    }
    if let Some(id) = env(ENV_DEVICE_ID) {
        config.device.id = Some(id);
    }
    Ok(())
}

fn validate(mut config: Config) -> Result<Config, ConfigError> {
    config.remote.url = non_empty(config.remote.url);
    config.remote.key = non_empty(config.remote.key);
    config.device.id = non_empty(config.device.id);

    if config.remote.url.is_some() != config.remote.key.is_some() {
        return Err(ConfigError::AsymmetricRemote);
    }

    if let Some(url) = &config.remote.url {
        let parsed = reqwest::Url::parse(url)
            .map_err(|e| ConfigError::invalid("remote.url", format!("must be a valid URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::invalid(
                "remote.url",
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }
        config.remote.url = Some(url.trim_end_matches('/').to_string());
    }

    if config.server.bind.trim().is_empty() {
        return Err(ConfigError::invalid("server.bind", "must not be empty"));
    }

    config.cache.path = expand_home(&config.cache.path);
    Ok(config)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Expands a leading `~` to the user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path.to_path_buf(),
    }
}

// ============ Process-wide cache ============

static SHARED: Lazy<RwLock<Arc<OnceCell<Arc<Config>>>>> =
    Lazy::new(|| RwLock::new(Arc::new(OnceCell::new())));

/// Returns the process-wide configuration, loading it on first use.
///
/// Concurrent first callers block on a single load and all observe the same
/// value. Later calls return the cached value and ignore `path`; call
/// [`reset_shared_config`] to force a reload.
pub fn shared_config(path: Option<&Path>) -> Result<Arc<Config>, ConfigError> {
    shared_config_with(|| load_config(path))
}

fn shared_config_with(
    load: impl FnOnce() -> Result<Config, ConfigError>,
) -> Result<Arc<Config>, ConfigError> {
    let cell = SHARED
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    cell.get_or_try_init(|| load().map(Arc::new)).cloned()
}

/// Drops the cached configuration so the next [`shared_config`] reloads it.
pub fn reset_shared_config() {
    *SHARED.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(OnceCell::new());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_offline() {
        let cfg = load_config_with_env(None, env_of(&[])).unwrap();
        assert!(!cfg.cloud_enabled());
        assert_eq!(cfg.log.level, LogLevel::Info);
        assert_eq!(cfg.server.bind, "127.0.0.1:7717");
        assert!(cfg.cache.path.ends_with(".fixhive/data.db"));
    }

    #[test]
    fn both_credentials_enable_cloud() {
        let cfg = load_config_with_env(
            None,
            env_of(&[
                (ENV_REMOTE_URL, "https://kb.example.co/"),
                (ENV_REMOTE_KEY, "anon-key"),
            ]),
        )
        .unwrap();
        assert!(cfg.cloud_enabled());
        assert_eq!(
            cfg.remote_credentials(),
            Some(("https://kb.example.co", "anon-key"))
        );
    }

    #[test]
    fn one_credential_is_fatal() {
        let err = load_config_with_env(None, env_of(&[(ENV_REMOTE_URL, "https://kb.example.co")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::AsymmetricRemote));

        let err =
            load_config_with_env(None, env_of(&[(ENV_REMOTE_KEY, "k")])).unwrap_err();
        assert!(matches!(err, ConfigError::AsymmetricRemote));
    }

    #[test]
    fn empty_values_count_as_unset() {
        let cfg = load_config_with_env(
            None,
            env_of(&[(ENV_REMOTE_URL, ""), (ENV_REMOTE_KEY, "  "), (ENV_LOG_LEVEL, "")]),
        )
        .unwrap();
        assert!(!cfg.cloud_enabled());
        assert_eq!(cfg.log.level, LogLevel::Info);
    }

    #[test]
    fn rejects_bad_url_and_level() {
        let err = load_config_with_env(
            None,
            env_of(&[(ENV_REMOTE_URL, "not a url"), (ENV_REMOTE_KEY, "k")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("remote.url"));

        let err = load_config_with_env(None, env_of(&[(ENV_LOG_LEVEL, "verbose")])).unwrap_err();
        assert!(err.to_string().contains("log.level"));
    }

    #[test]
    fn env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixhive.toml");
        std::fs::write(
            &path,
            r#"
[remote]
url = "https://file.example.co"
key = "file-key"

[log]
level = "debug"

[cache]
path = "/var/cache/fixhive.db"
"#,
        )
        .unwrap();

        let cfg = load_config_with_env(Some(&path), env_of(&[(ENV_REMOTE_KEY, "env-key")])).unwrap();
        assert_eq!(
            cfg.remote_credentials(),
            Some(("https://file.example.co", "env-key"))
        );
        assert_eq!(cfg.log.level, LogLevel::Debug);
        assert_eq!(cfg.cache.path, PathBuf::from("/var/cache/fixhive.db"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_config_with_env(Some(Path::new("/nonexistent/fixhive.toml")), env_of(&[]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn masked_summary_hides_key() {
        let cfg = load_config_with_env(
            None,
            env_of(&[
                (ENV_REMOTE_URL, "https://kb.example.co"),
                (ENV_REMOTE_KEY, "super-secret"),
            ]),
        )
        .unwrap();
        let text = cfg.masked_summary().to_string();
        assert!(!text.contains("super-secret"));
        assert!(text.contains("********"));
    }

    #[test]
    fn expand_home_leaves_absolute_paths() {
        assert_eq!(expand_home(Path::new("/tmp/x.db")), PathBuf::from("/tmp/x.db"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~/.fixhive/x.db")), home.join(".fixhive/x.db"));
        }
    }

    // The shared cache is process-global, so all of its checks live in one test.
    #[test]
    fn shared_config_initializes_once() {
        let load = || load_config_with_env(None, env_of(&[]));

        reset_shared_config();
        let first = shared_config_with(load).unwrap();
        let again = shared_config_with(|| -> Result<Config, ConfigError> {
            panic!("cached config was reloaded")
        })
        .unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        reset_shared_config();
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(move || shared_config_with(load).unwrap()))
            .collect();
        let configs: Vec<Arc<Config>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(configs.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert!(!Arc::ptr_eq(&first, &configs[0]));
        assert!(!configs[0].cloud_enabled());
        reset_shared_config();
    }
}
