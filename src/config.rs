//! Layered configuration: hard defaults, overridden by an optional
//! `cached.toml` in the working directory, overridden in turn by CLI flags.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

pub const DEFAULT_PORT: u16 = 8086;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 60;

/// Server-side configuration: bind port, TLS material, credential file, and
/// the interactive idle timeout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
    pub users_path: PathBuf,
    pub idle_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            cert_path: PathBuf::from("cert.pem"),
            key_path: PathBuf::from("key.pem"),
            users_path: PathBuf::from("users"),
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
        }
    }
}

impl ServerConfig {
    /// Loads defaults, overlays an optional `cached.toml` from the working
    /// directory if present, then applies any `Some` override fields.
    pub fn resolve(overrides: ServerConfigOverrides) -> Result<Self> {
        Self::resolve_from(std::path::Path::new("cached.toml"), overrides)
    }

    /// Same as [`Self::resolve`] but with an explicit config-file path, so
    /// tests never need to touch the process-wide working directory.
    pub fn resolve_from(config_path: &std::path::Path, overrides: ServerConfigOverrides) -> Result<Self> {
        let mut config = match std::fs::read_to_string(config_path) {
            Ok(data) => toml::from_str(&data)
                .map_err(|e| CacheError::Startup(format!("malformed cached.toml: {e}")))?,
            Err(_) => ServerConfig::default(),
        };

        if let Some(port) = overrides.port {
            config.port = port;
        }
        if let Some(cert_path) = overrides.cert_path {
            config.cert_path = cert_path;
        }
        if let Some(key_path) = overrides.key_path {
            config.key_path = key_path;
        }
        if let Some(users_path) = overrides.users_path {
            config.users_path = users_path;
        }
        if let Some(idle_timeout_secs) = overrides.idle_timeout_secs {
            config.idle_timeout_secs = idle_timeout_secs;
        }
        Ok(config)
    }
}

/// CLI-supplied overrides, applied over whatever `cached.toml`/defaults
/// resolved to.
#[derive(Debug, Default)]
pub struct ServerConfigOverrides {
    pub port: Option<u16>,
    pub cert_path: Option<PathBuf>,
    pub key_path: Option<PathBuf>,
    pub users_path: Option<PathBuf>,
    pub idle_timeout_secs: Option<u64>,
}

/// Client-side configuration: default host/port and the TLS verification
/// posture.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Skips server certificate verification, matching the reference test
    /// client's `InsecureSkipVerify: true`. Off by default; production
    /// clients must verify.
    pub insecure: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            insecure: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.cert_path, PathBuf::from("cert.pem"));
        assert_eq!(config.idle_timeout_secs, 60);
    }

    #[test]
    fn client_config_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(!config.insecure);
    }

    #[test]
    fn server_config_serde_roundtrip() {
        let config = ServerConfig::default();
        let toml = toml::to_string(&config).unwrap();
        let back: ServerConfig = toml::from_str(&toml).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn resolve_applies_cli_overrides_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::resolve_from(
            &dir.path().join("cached.toml"),
            ServerConfigOverrides { port: Some(9999), ..Default::default() },
        )
        .unwrap();
        assert_eq!(config.port, 9999);
        assert_eq!(config.cert_path, PathBuf::from("cert.pem"));
    }

    #[test]
    fn resolve_overlays_config_file_under_cli_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cached.toml");
        std::fs::write(&path, "port = 1234\nidle_timeout_secs = 30\n").unwrap();
        let config = ServerConfig::resolve_from(
            &path,
            ServerConfigOverrides { idle_timeout_secs: Some(99), ..Default::default() },
        )
        .unwrap();
        assert_eq!(config.port, 1234, "file value used when no CLI override");
        assert_eq!(config.idle_timeout_secs, 99, "CLI override wins over file");
    }
}
