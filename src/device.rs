//! Per-machine device identity.
//!
//! The device id is an opaque UUID forwarded with every remote request so
//! the store can attribute votes and reports to one installation. It is
//! taken from configuration when set, otherwise read from (or created at)
//! `~/.fixhive/device_id`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::Config;

/// Default location of the persisted device id.
pub fn default_device_id_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".fixhive").join("device_id"))
}

/// Returns the configured device id, or the persisted one, creating it if needed.
pub fn resolve_device_id(config: &Config) -> Result<String> {
    if let Some(id) = &config.device.id {
        return Ok(id.clone());
    }
    let path = default_device_id_path()
        .ok_or_else(|| anyhow::anyhow!("cannot locate home directory for device id"))?;
    load_or_create_device_id(&path)
}

/// Reads the device id stored at `path`, generating and persisting a new
/// UUID v4 when the file is missing or empty.
pub fn load_or_create_device_id(path: &Path) -> Result<String> {
    if let Ok(existing) = std::fs::read_to_string(path) {
        let existing = existing.trim();
        if !existing.is_empty() {
            return Ok(existing.to_string());
        }
    }

    let id = uuid::Uuid::new_v4().to_string();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, &id)
        .with_context(|| format!("Failed to write device id to {}", path.display()))?;
    tracing::info!(path = %path.display(), "Generated new device id");
    Ok(id)
}

/// Shortened id for log lines.
pub fn short_id(id: &str) -> String {
    format!("{}...", crate::logging::preview(id, 8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_then_reuses_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("device_id");

        let first = load_or_create_device_id(&path).unwrap();
        assert!(uuid::Uuid::parse_str(&first).is_ok());
        let second = load_or_create_device_id(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn configured_id_wins() {
        let mut config = Config::default();
        config.device.id = Some("fixed-device".into());
        assert_eq!(resolve_device_id(&config).unwrap(), "fixed-device");
    }

    #[test]
    fn short_id_truncates() {
        assert_eq!(short_id("0123456789abcdef"), "01234567...");
    }
}
