//! Server configuration: TOML file + CLI overrides.

use luc_core::{LucError, LucResult};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Top-level config file structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: ServerSection,
}

/// `[server]` section of the config TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_bind")]
    pub bind: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_clients")]
    pub max_clients: usize,
    #[serde(default = "default_wait_interval_ms")]
    pub wait_interval_ms: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            max_clients: default_max_clients(),
            wait_interval_ms: default_wait_interval_ms(),
        }
    }
}

fn default_bind() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}
fn default_port() -> u16 {
    12345
}
fn default_max_clients() -> usize {
    3
}
fn default_wait_interval_ms() -> u64 {
    1000
}

/// Resolved server configuration (CLI overrides applied, values validated).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
    /// Ceiling on simultaneously active sessions.
    pub max_clients: usize,
    /// Interval between `WAIT:` notifications to a queued client.
    pub wait_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_section(ServerSection::default())
    }
}

impl ServerConfig {
    /// Load config from TOML file, then apply CLI overrides.
    pub fn load(
        config_path: Option<&Path>,
        cli_bind: Option<IpAddr>,
        cli_port: Option<u16>,
        cli_max_clients: Option<usize>,
        cli_wait_interval_ms: Option<u64>,
    ) -> LucResult<Self> {
        let file_config = match config_path {
            Some(path) => {
                let expanded = expand_tilde(path);
                if expanded.exists() {
                    info!(path = %expanded.display(), "loading config file");
                    let content = std::fs::read_to_string(&expanded)?;
                    toml::from_str::<ConfigFile>(&content)
                        .map_err(|e| LucError::Config(format!("config parse error: {e}")))?
                } else {
                    info!(path = %expanded.display(), "config file not found, using defaults");
                    ConfigFile::default()
                }
            }
            None => ConfigFile::default(),
        };

        // Merge CLI overrides
        let mut section = file_config.server;
        if let Some(bind) = cli_bind {
            section.bind = bind;
        }
        if let Some(port) = cli_port {
            section.port = port;
        }
        if let Some(max_clients) = cli_max_clients {
            section.max_clients = max_clients;
        }
        if let Some(ms) = cli_wait_interval_ms {
            section.wait_interval_ms = ms;
        }

        if section.max_clients == 0 {
            return Err(LucError::Config("max_clients must be at least 1".into()));
        }
        if section.wait_interval_ms == 0 {
            return Err(LucError::Config(
                "wait_interval_ms must be greater than 0".into(),
            ));
        }

        Ok(Self::from_section(section))
    }

    fn from_section(section: ServerSection) -> Self {
        Self {
            bind: section.bind,
            port: section.port,
            max_clients: section.max_clients,
            wait_interval: Duration::from_millis(section.wait_interval_ms),
        }
    }

    /// Address the listener binds to.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

/// Default config location: `~/.luc/server.toml`.
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".luc")
        .join("server.toml")
}

/// Expand `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_reference_deployment() {
        let cfg = ServerConfig::load(None, None, None, None, None).unwrap();
        assert_eq!(cfg.port, 12345);
        assert_eq!(cfg.max_clients, 3);
        assert_eq!(cfg.wait_interval, Duration::from_secs(1));
        assert_eq!(cfg.listen_addr().to_string(), "0.0.0.0:12345");
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let cfg = ServerConfig::load(Some(&path), None, None, None, None).unwrap();
        assert_eq!(cfg.max_clients, 3);
    }

    #[test]
    fn file_values_then_cli_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[server]\nbind = \"127.0.0.1\"\nport = 9000\nmax_clients = 5\nwait_interval_ms = 250"
        )
        .unwrap();

        let cfg = ServerConfig::load(Some(file.path()), None, None, None, None).unwrap();
        assert_eq!(cfg.listen_addr().to_string(), "127.0.0.1:9000");
        assert_eq!(cfg.max_clients, 5);
        assert_eq!(cfg.wait_interval, Duration::from_millis(250));

        let cfg = ServerConfig::load(Some(file.path()), None, Some(9100), Some(1), None).unwrap();
        assert_eq!(cfg.port, 9100);
        assert_eq!(cfg.max_clients, 1);
        assert_eq!(cfg.wait_interval, Duration::from_millis(250));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = ServerConfig::load(None, None, None, Some(0), None).unwrap_err();
        assert!(matches!(err, LucError::Config(_)));
        assert!(ServerConfig::load(None, None, None, None, Some(0)).is_err());
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = \"not a number\"").unwrap();
        let err = ServerConfig::load(Some(file.path()), None, None, None, None).unwrap_err();
        assert!(matches!(err, LucError::Config(_)));
    }
}
