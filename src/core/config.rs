//! Configuration for the host monitor
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! environment variables (`SEQ_URL`, `SEQ_API_KEY`, `INTERVAL`), then CLI
//! flags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::monitor::network::default_excluded_interfaces;

pub const DEFAULT_SEQ_URL: &str = "http://seq:5341";
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(15);
pub const DEFAULT_SERVICE_NAME: &str = "SystemMonitor";
pub const DEFAULT_APPLICATION: &str = "Monitor";
pub const DEFAULT_HOSTNAME_FILE: &str = "/host/etc/hostname";

/// Errors raised while building the configuration at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Config file could not be read
    Io { path: PathBuf, message: String },
    /// Config file is not valid TOML for [`MonitorConfig`]
    Parse(String),
    /// A duration string could not be parsed
    InvalidDuration(String),
    /// The Seq URL is not an http(s) URL
    InvalidUrl(String),
    /// The sampling interval must be positive
    ZeroInterval,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, message } => {
                write!(f, "Failed to read {}: {}", path.display(), message)
            }
            ConfigError::Parse(msg) => write!(f, "Invalid config file: {}", msg),
            ConfigError::InvalidDuration(s) => write!(f, "Invalid duration: {:?}", s),
            ConfigError::InvalidUrl(s) => write!(f, "Invalid Seq URL: {:?}", s),
            ConfigError::ZeroInterval => write!(f, "Interval must be greater than zero"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Main monitor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Base URL of the Seq server
    pub seq_url: String,

    /// Optional Seq API key sent as `X-Seq-ApiKey`
    pub seq_api_key: Option<String>,

    /// Time between samples
    #[serde(with = "duration_str")]
    pub interval: Duration,

    /// Print samples to the console instead of sending them
    pub debug: bool,

    /// Windows service name
    pub service_name: String,

    /// `Application` property of every event
    pub application: String,

    /// Filesystem path whose disk usage is reported
    pub disk_path: PathBuf,

    /// File holding the host's name when running in a container
    pub hostname_file: Option<PathBuf>,

    /// Interfaces left out of network totals
    pub excluded_interfaces: Vec<String>,

    /// Timeout for one delivery request
    #[serde(with = "duration_str")]
    pub request_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            seq_url: DEFAULT_SEQ_URL.to_string(),
            seq_api_key: None,
            interval: DEFAULT_INTERVAL,
            debug: false,
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            application: DEFAULT_APPLICATION.to_string(),
            disk_path: crate::monitor::host::default_disk_path(),
            hostname_file: Some(PathBuf::from(DEFAULT_HOSTNAME_FILE)),
            excluded_interfaces: default_excluded_interfaces(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Values given on the command line; `None` leaves the lower layer alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub seq_url: Option<String>,
    pub seq_api_key: Option<String>,
    pub interval: Option<Duration>,
    pub debug: bool,
    pub service_name: Option<String>,
    pub disk_path: Option<PathBuf>,
}

impl MonitorConfig {
    /// Load config from TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save config to TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// `<config dir>/hostmon/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("hostmon").join("config.toml"))
    }

    /// Build the effective configuration from every layer.
    pub fn resolve(file: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let mut config = match file {
            Some(path) => Self::load(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => Self::load(&path)?,
                None => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Apply `SEQ_URL`, `SEQ_API_KEY` and `INTERVAL`.
    ///
    /// Empty values are ignored. An unparsable `INTERVAL` falls back to the
    /// default interval with a warning instead of aborting startup.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup("SEQ_URL") {
            self.seq_url = url;
        }
        if let Some(key) = lookup("SEQ_API_KEY") {
            self.seq_api_key = Some(key);
        }
        if let Some(raw) = lookup("INTERVAL") {
            match parse_duration(&raw) {
                Ok(interval) => self.interval = interval,
                Err(e) => {
                    warn!("{} in INTERVAL, using {}", e, format_duration(DEFAULT_INTERVAL));
                    self.interval = DEFAULT_INTERVAL;
                }
            }
        }
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(url) = &overrides.seq_url {
            self.seq_url = url.clone();
        }
        if let Some(key) = &overrides.seq_api_key {
            self.seq_api_key = Some(key.clone());
        }
        if let Some(interval) = overrides.interval {
            self.interval = interval;
        }
        if overrides.debug {
            self.debug = true;
        }
        if let Some(name) = &overrides.service_name {
            self.service_name = name.clone();
        }
        if let Some(path) = &overrides.disk_path {
            self.disk_path = path.clone();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        // The URL only matters when samples are actually sent.
        if !self.debug {
            let url = self.seq_url.trim();
            let has_scheme = url.starts_with("http://") || url.starts_with("https://");
            let has_host = url
                .split_once("://")
                .map(|(_, rest)| !rest.trim_matches('/').is_empty())
                .unwrap_or(false);
            if !has_scheme || !has_host {
                return Err(ConfigError::InvalidUrl(self.seq_url.clone()));
            }
        }
        Ok(())
    }

    /// Full CLEF ingestion endpoint.
    pub fn ingest_url(&self) -> String {
        format!("{}/ingest/clef", self.seq_url.trim().trim_end_matches('/'))
    }
}

// ============================================================================
// Duration Strings
// ============================================================================

/// Parse a Go-style duration: `500ms`, `15s`, `1m30s`, `2h`, `1.5m`.
pub fn parse_duration(input: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidDuration(input.to_string());
    let s = input.trim();
    if s.is_empty() {
        return Err(invalid());
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut total_nanos: f64 = 0.0;
    let mut rest = s;
    while !rest.is_empty() {
        let num_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        if num_end == 0 {
            return Err(invalid());
        }
        let value: f64 = rest[..num_end].parse().map_err(|_| invalid())?;
        rest = &rest[num_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit = match &rest[..unit_end] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return Err(invalid()),
        };
        rest = &rest[unit_end..];
        total_nanos += value * nanos_per_unit;
    }

    if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
        return Err(invalid());
    }
    Ok(Duration::from_nanos(total_nanos.round() as u64))
}

/// Format a duration the way [`parse_duration`] reads it back.
pub fn format_duration(duration: Duration) -> String {
    if duration.is_zero() {
        return "0s".to_string();
    }
    if duration.subsec_nanos() != 0 {
        let nanos = duration.as_nanos();
        return if nanos % 1_000_000 == 0 {
            format!("{}ms", nanos / 1_000_000)
        } else {
            format!("{}ns", nanos)
        };
    }

    let secs = duration.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    let mut out = String::new();
    if h > 0 {
        out.push_str(&format!("{}h", h));
    }
    if m > 0 {
        out.push_str(&format!("{}m", m));
    }
    if s > 0 {
        out.push_str(&format!("{}s", s));
    }
    out
}

mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_duration(&raw).map_err(serde::de::Error::custom)
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
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("15s").unwrap(), Duration::from_secs(15));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("1.5m").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration(" 10s ").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        for bad in ["", "15", "s", "15x", "abc", "1m30", "-5s", "1..5s"] {
            assert!(parse_duration(bad).is_err(), "{:?} should be rejected", bad);
        }
    }

    #[test]
    fn test_format_duration_round_trip() {
        for d in [
            Duration::from_secs(15),
            Duration::from_secs(90),
            Duration::from_secs(3661),
            Duration::from_millis(250),
        ] {
            assert_eq!(parse_duration(&format_duration(d)).unwrap(), d);
        }
        assert_eq!(format_duration(Duration::from_secs(90)), "1m30s");
    }

    #[test]
    fn test_defaults() {
        let config = MonitorConfig::default();
        assert_eq!(config.seq_url, "http://seq:5341");
        assert_eq!(config.interval, Duration::from_secs(15));
        assert_eq!(config.service_name, "SystemMonitor");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides_defaults() {
        let mut config = MonitorConfig::default();
        config.apply_env(env(&[("SEQ_URL", "http://logs:5341"), ("INTERVAL", "30s")]));
        assert_eq!(config.seq_url, "http://logs:5341");
        assert_eq!(config.interval, Duration::from_secs(30));
    }

    #[test]
    fn test_bad_env_interval_falls_back() {
        let mut config = MonitorConfig {
            interval: Duration::from_secs(60),
            ..Default::default()
        };
        config.apply_env(env(&[("INTERVAL", "soon")]));
        assert_eq!(config.interval, DEFAULT_INTERVAL);
    }

    #[test]
    fn test_empty_env_is_ignored() {
        let mut config = MonitorConfig::default();
        config.apply_env(env(&[("SEQ_URL", "")]));
        assert_eq!(config.seq_url, DEFAULT_SEQ_URL);
    }

    #[test]
    fn test_cli_overrides_env() {
        let mut config = MonitorConfig::default();
        config.apply_env(env(&[("SEQ_URL", "http://env:5341"), ("INTERVAL", "30s")]));
        config.apply_overrides(&ConfigOverrides {
            seq_url: Some("http://cli:5341".into()),
            interval: Some(Duration::from_secs(5)),
            debug: true,
            ..Default::default()
        });
        assert_eq!(config.seq_url, "http://cli:5341");
        assert_eq!(config.interval, Duration::from_secs(5));
        assert!(config.debug);
    }

    #[test]
    fn test_validate() {
        let zero = MonitorConfig {
            interval: Duration::ZERO,
            ..Default::default()
        };
        assert_eq!(zero.validate(), Err(ConfigError::ZeroInterval));

        let bad_url = MonitorConfig {
            seq_url: "seq:5341".into(),
            ..Default::default()
        };
        assert!(matches!(bad_url.validate(), Err(ConfigError::InvalidUrl(_))));

        let debug_ignores_url = MonitorConfig {
            seq_url: String::new(),
            debug: true,
            ..Default::default()
        };
        assert!(debug_ignores_url.validate().is_ok());
    }

    #[test]
    fn test_ingest_url() {
        let config = MonitorConfig {
            seq_url: "http://seq:5341/".into(),
            ..Default::default()
        };
        assert_eq!(config.ingest_url(), "http://seq:5341/ingest/clef");
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let config = MonitorConfig {
            seq_url: "https://seq.example.com".into(),
            interval: Duration::from_secs(45),
            seq_api_key: Some("key".into()),
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(MonitorConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "interval = \"1m\"\n").unwrap();
        let config = MonitorConfig::load(&path).unwrap();
        assert_eq!(config.interval, Duration::from_secs(60));
        assert_eq!(config.seq_url, DEFAULT_SEQ_URL);
    }

    #[test]
    fn test_file_with_bad_interval_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "interval = \"often\"\n").unwrap();
        assert!(matches!(MonitorConfig::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = MonitorConfig::load(Path::new("/nonexistent/hostmon.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
