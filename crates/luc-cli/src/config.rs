//! Client configuration at `~/.luc/client.toml`.
//!
//! Provides default host, port, and user. CLI flags always override config
//! file values.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Top-level config file structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Default connection settings.
    #[serde(default)]
    pub default: DefaultConfig,
}

/// Default connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultConfig {
    /// Relay host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Relay port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Identity to declare (empty = current system user).
    #[serde(default)]
    pub user: String,
}

impl Default for DefaultConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: String::new(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    12345
}

impl Config {
    /// Load configuration from a TOML file, returning defaults if the file
    /// does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config at {}", path.display()))?;

        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}

/// Default config location.
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".luc")
        .join("client.toml")
}

/// Pick the identity: explicit flag, then config, then the system user.
pub fn resolve_user(flag: Option<&str>, config: &DefaultConfig) -> Result<String> {
    let user = match flag {
        Some(u) => u.to_string(),
        None if !config.user.is_empty() => config.user.clone(),
        None => std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .context("no --user given and no system user name available")?,
    };
    if user.trim().is_empty() {
        anyhow::bail!("user name must not be empty");
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_values() {
        let cfg = Config::default();
        assert_eq!(cfg.default.host, "127.0.0.1");
        assert_eq!(cfg.default.port, 12345);
        assert!(cfg.default.user.is_empty());
    }

    #[test]
    fn parse_partial_toml_config() {
        let toml_str = r#"
[default]
host = "relay.example.com"
"#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.default.host, "relay.example.com");
        assert_eq!(cfg.default.port, 12345);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[default]\nport = 5000\nuser = \"alice\"").unwrap();
        let cfg = Config::load(file.path()).unwrap();
        assert_eq!(cfg.default.port, 5000);
        assert_eq!(cfg.default.user, "alice");
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(cfg.default.port, 12345);
    }

    #[test]
    fn flag_beats_config_user() {
        let cfg = DefaultConfig {
            user: "from-config".into(),
            ..Default::default()
        };
        assert_eq!(resolve_user(Some("bob"), &cfg).unwrap(), "bob");
        assert_eq!(resolve_user(None, &cfg).unwrap(), "from-config");
        assert!(resolve_user(Some("  "), &cfg).is_err());
    }
}
