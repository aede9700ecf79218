//! Generic TOML configuration loading, shared by every component that reads
//! a config file.
//!
//! Precedence (poorest to richest): built-in `Default` → config file → caller
//! overrides (environment variables, CLI flags) applied by the caller after
//! loading. This module only owns the file tier; env/flag overlay happens in
//! `papeline-pmc::config` and the CLI, since that's where the concrete field
//! set lives.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::error::PmcError;

/// Locate the config file for `app_name`, searching:
/// 1. `./<app_name>.toml` (current directory)
/// 2. `$XDG_CONFIG_HOME/<app_name>/config.toml` (via `directories`)
pub fn default_config_path(app_name: &str) -> Option<PathBuf> {
    let local = PathBuf::from(format!("{app_name}.toml"));
    if local.exists() {
        return Some(local);
    }
    let dirs = directories::ProjectDirs::from("", "", app_name)?;
    let user = dirs.config_dir().join("config.toml");
    user.exists().then_some(user)
}

/// Load and parse a TOML config file into `T`, falling back to `T::default()`
/// if no file is found at the default search locations.
pub fn load<T: DeserializeOwned + Default>(
    app_name: &str,
    explicit_path: Option<&Path>,
) -> Result<T, PmcError> {
    let path = match explicit_path {
        Some(p) => Some(p.to_path_buf()),
        None => default_config_path(app_name),
    };

    let Some(path) = path else {
        log::debug!("no config file found for {app_name}, using defaults");
        return Ok(T::default());
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| PmcError::ConfigError(format!("reading {}: {e}", path.display())))?;
    let parsed: T = toml::from_str(&content)
        .map_err(|e| PmcError::ConfigError(format!("parsing {}: {e}", path.display())))?;
    log::info!("loaded config from {}", path.display());
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Deserialize, Default, PartialEq)]
    #[serde(default)]
    struct Dummy {
        value: i32,
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.toml");
        let cfg: Dummy = load("dummy", Some(&path)).unwrap_or_default();
        assert_eq!(cfg, Dummy::default());
    }

    #[test]
    fn load_parses_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.toml");
        std::fs::write(&path, "value = 42").unwrap();
        let cfg: Dummy = load("dummy", Some(&path)).unwrap();
        assert_eq!(cfg.value, 42);
    }

    #[test]
    fn load_rejects_malformed_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.toml");
        std::fs::write(&path, "value = [this is not valid").unwrap();
        assert!(load::<Dummy>("dummy", Some(&path)).is_err());
    }

    #[test]
    fn default_config_path_none_when_absent() {
        // Relies on no ./nonexistent-app-xyz.toml existing in test cwd.
        assert!(default_config_path("nonexistent-app-xyz-123").is_none());
    }
}
