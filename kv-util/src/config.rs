//! Server configuration, loaded from an optional JSON file with hardcoded fallbacks.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 6379;
pub const DEFAULT_MAX_CONNECTION: u32 = 1024;
pub const DEFAULT_MAX_QUERY_LENGTH: u32 = 4096;

const MAX_MAX_CONNECTION: u32 = 4096;
const MAX_MAX_QUERY_LENGTH: u32 = 4096;

/// Server configuration. Mirrors the JSON shape of the config file: `port`,
/// `maxConnection`, `maxQueryLength`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub port: u16,
    #[serde(rename = "maxConnection")]
    pub max_connection: u32,
    #[serde(rename = "maxQueryLength")]
    pub max_query_length: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: DEFAULT_PORT,
            max_connection: DEFAULT_MAX_CONNECTION,
            max_query_length: DEFAULT_MAX_QUERY_LENGTH,
        }
    }
}

impl Config {
    /// Loads configuration from `path`. Any read or parse failure falls back to
    /// [`Config::default`] rather than erroring out the process; this matches the
    /// "never fail startup over a bad config file" behavior of the source this was
    /// ported from. Values outside the sane range are clamped rather than rejected.
    pub fn load(path: impl AsRef<Path>) -> Config {
        match Self::load_inner(path.as_ref()) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!(error = %err, "falling back to default configuration");
                Config::default()
            }
        }
    }

    fn load_inner(path: &Path) -> Result<Config, ConfigError> {
        let text = fs::read_to_string(path)?;
        let mut cfg: Config = serde_json::from_str(&text)?;
        cfg.max_connection = cfg.max_connection.min(MAX_MAX_CONNECTION);
        cfg.max_query_length = cfg.max_query_length.min(MAX_MAX_QUERY_LENGTH);
        Ok(cfg)
    }
}

#[derive(Debug, thiserror::Error)]
enum ConfigError {
    #[error("reading config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing config file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.port, 6379);
        assert_eq!(cfg.max_connection, 1024);
        assert_eq!(cfg.max_query_length, 4096);
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let cfg = Config::load("/nonexistent/path/does-not-exist.json");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn malformed_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, b"not json").unwrap();
        let cfg = Config::load(&path);
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn oversized_values_are_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.json");
        fs::write(
            &path,
            br#"{"port": 7000, "maxConnection": 999999, "maxQueryLength": 999999}"#,
        )
        .unwrap();
        let cfg = Config::load(&path);
        assert_eq!(cfg.port, 7000);
        assert_eq!(cfg.max_connection, MAX_MAX_CONNECTION);
        assert_eq!(cfg.max_query_length, MAX_MAX_QUERY_LENGTH);
    }
}
