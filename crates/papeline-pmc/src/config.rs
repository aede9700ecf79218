//! Application configuration: workers, timeouts, retries, and
//! credentials, layered per `papeline_core::config`'s precedence (file
//! tier here; env/CLI overlay applied by the caller after loading).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_workers() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub workers: usize,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub output_dir: Option<PathBuf>,
    pub emails: Vec<String>,
    pub api_key: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            output_dir: None,
            emails: Vec::new(),
            api_key: None,
        }
    }
}

impl Config {
    /// Load the TOML file tier (`pmcgrab.toml`, or `$XDG_CONFIG_HOME/pmcgrab/config.toml`),
    /// then overlay the `EMAILS`/`API_KEY`/`TIMEOUT`/`RETRIES` environment
    /// variables, per the three-tier precedence (file → env → CLI flags,
    /// the last applied by the caller after this returns).
    pub fn load(explicit_path: Option<&std::path::Path>) -> Result<Self, papeline_core::PmcError> {
        let mut config: Config = papeline_core::config::load("pmcgrab", explicit_path)?;
        if let Ok(emails) = std::env::var("EMAILS") {
            config.emails = emails
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(key) = std::env::var("API_KEY") {
            config.api_key = Some(key);
        }
        if let Ok(timeout) = std::env::var("TIMEOUT") {
            if let Ok(secs) = timeout.parse() {
                config.timeout_secs = secs;
            }
        }
        if let Ok(retries) = std::env::var("RETRIES") {
            if let Ok(attempts) = retries.parse() {
                config.max_attempts = attempts;
            }
        }
        Ok(config)
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }

    pub fn credential_pool(&self) -> crate::rate_limit::CredentialPool {
        crate::rate_limit::CredentialPool::new(self.emails.clone(), self.api_key.clone())
    }

    pub fn orchestrator_config(&self) -> crate::orchestrator::OrchestratorConfig {
        crate::orchestrator::OrchestratorConfig {
            workers: self.workers,
            timeout: self.timeout(),
            max_attempts: self.max_attempts,
            output_dir: self.output_dir.clone(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_workers() {
        let config = Config::default();
        assert!(config.workers >= 1);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.max_attempts, 3);
    }

    #[test]
    fn loads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("papeline-pmc.toml");
        std::fs::write(&path, "workers = 8\nmax_attempts = 5\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.workers, 8);
        assert_eq!(config.max_attempts, 5);
    }
}
