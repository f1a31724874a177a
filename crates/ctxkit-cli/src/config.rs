//! Watch configuration
//!
//! Layered as defaults, then the TOML file (when present), then `CTXKIT_*`
//! environment variables. Command-line flags are applied last by the command.

use ctxkit::{Signal, SignalFilter};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable prefix
const ENV_PREFIX: &str = "CTXKIT_";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

impl ConfigError {
    fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Settings for `ctxkit watch`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Signals that end the watch; empty listens for any
    #[serde(deserialize_with = "signal_names")]
    pub signals: Vec<Signal>,
    /// Optional deadline in milliseconds
    pub timeout_ms: Option<u64>,
    /// Log filter directive
    pub log_level: String,
    /// Request-scoped values carried onto the watch context
    pub values: BTreeMap<String, String>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            signals: Vec::new(),
            timeout_ms: None,
            log_level: "info".to_string(),
            values: BTreeMap::new(),
        }
    }
}

/// Accept any spelling `Signal::from_str` does (`SIGINT`, `int`, `interrupt`)
fn signal_names<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Signal>, D::Error> {
    let names = Vec::<String>::deserialize(deserializer)?;
    names
        .iter()
        .map(|name| name.parse::<Signal>().map_err(serde::de::Error::custom))
        .collect()
}

impl WatchConfig {
    /// Defaults, then `path` if it exists, then the process environment
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            Self::load_from_file(path)?
        } else {
            Self::default()
        };
        config.merge_with_env()?;
        Ok(config)
    }

    /// Read a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `CTXKIT_SIGNALS`, `CTXKIT_TIMEOUT_MS` and `CTXKIT_LOG`
    pub fn merge_with_env(&mut self) -> Result<(), ConfigError> {
        self.merge_from(|name| std::env::var(name).ok())
    }

    fn merge_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let var = |suffix: &str| lookup(&format!("{ENV_PREFIX}{suffix}"));

        if let Some(raw) = var("SIGNALS") {
            self.signals = raw
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(|name| {
                    name.parse::<Signal>()
                        .map_err(|err| ConfigError::invalid("CTXKIT_SIGNALS", format!("{err}")))
                })
                .collect::<Result<_, _>>()?;
        }

        if let Some(raw) = var("TIMEOUT_MS") {
            let timeout = raw
                .trim()
                .parse::<u64>()
                .map_err(|err| ConfigError::invalid("CTXKIT_TIMEOUT_MS", err.to_string()))?;
            self.timeout_ms = Some(timeout);
        }

        if let Some(level) = var("LOG") {
            self.log_level = level;
        }

        Ok(())
    }

    /// Reject settings that cannot produce a meaningful watch
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == Some(0) {
            return Err(ConfigError::invalid("timeout_ms", "must be greater than zero"));
        }
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::invalid("log_level", "cannot be empty"));
        }
        Ok(())
    }

    /// Signal filter for the watch context
    pub fn filter(&self) -> SignalFilter {
        self.signals.iter().copied().collect()
    }

    /// Deadline offset, if any
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = WatchConfig::default();
        assert!(config.filter().is_empty());
        assert_eq!(config.timeout(), None);
        assert_eq!(config.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let config: WatchConfig = toml::from_str(
            r#"
            signals = ["SIGTERM", "interrupt"]
            timeout_ms = 1500

            [values]
            request_id = "req-7"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.filter(),
            SignalFilter::only([Signal::Terminate, Signal::Interrupt])
        );
        assert_eq!(config.timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.values.get("request_id").map(String::as_str), Some("req-7"));
    }

    #[test]
    fn test_parse_rejects_unknown_signal() {
        let result = toml::from_str::<WatchConfig>(r#"signals = ["SIGWINCH"]"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = WatchConfig {
            signals: vec![Signal::Hangup],
            timeout_ms: Some(10),
            ..WatchConfig::default()
        };
        let env: HashMap<&str, &str> = HashMap::from([
            ("CTXKIT_SIGNALS", "int, term"),
            ("CTXKIT_TIMEOUT_MS", "250"),
            ("CTXKIT_LOG", "debug"),
        ]);

        config
            .merge_from(|name| env.get(name).map(|value| value.to_string()))
            .unwrap();

        assert_eq!(config.signals, vec![Signal::Interrupt, Signal::Terminate]);
        assert_eq!(config.timeout_ms, Some(250));
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_env_rejects_bad_values() {
        let mut config = WatchConfig::default();
        let err = config
            .merge_from(|name| (name == "CTXKIT_TIMEOUT_MS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "CTXKIT_TIMEOUT_MS"));

        let err = config
            .merge_from(|name| (name == "CTXKIT_SIGNALS").then(|| "int,bogus".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "CTXKIT_SIGNALS"));
    }

    #[test]
    fn test_validate() {
        let zero = WatchConfig {
            timeout_ms: Some(0),
            ..WatchConfig::default()
        };
        assert!(zero.validate().is_err());

        let silent = WatchConfig {
            log_level: "  ".to_string(),
            ..WatchConfig::default()
        };
        assert!(silent.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "signals = [\"hup\"]\nlog_level = \"warn\"").unwrap();

        let config = WatchConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.signals, vec![Signal::Hangup]);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_load_from_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let err = WatchConfig::load_from_file(&missing).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }
}
