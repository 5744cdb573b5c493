//! Service configuration.
//!
//! All tunables are collected here instead of scattering env lookups.
//!
//! Environment variables:
//! - `HOST`: bind host (default: 0.0.0.0)
//! - `PORT`: bind port (default: 3000)
//! - `DATA_DIR`: directory holding the snapshot (default: data)
//! - `SNAPSHOT_FILE`: snapshot file name (default: channels.json)
//! - `TICK_INTERVAL_SECS`: conversion interval in seconds (default: 5, min 1)
//! - `STATIC_DIR`: directory served for unmatched paths (default: .)
//! - `LOG_FORMAT`: "json" or "pretty" (default: json)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::policy::{GrowthPolicy, DEFAULT_TICK_INTERVAL};
use crate::store::file::DEFAULT_SNAPSHOT_FILE;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Structured JSON, one object per event.
    Json,
    /// Human-readable output for local development.
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Directory holding the snapshot file.
    pub data_dir: PathBuf,
    /// Snapshot file name inside `data_dir`.
    pub snapshot_file: String,
    /// Interval between conversion ticks.
    pub tick_interval: Duration,
    /// Directory served as static files.
    pub static_dir: PathBuf,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            data_dir: PathBuf::from("data"),
            snapshot_file: DEFAULT_SNAPSHOT_FILE.to_string(),
            tick_interval: DEFAULT_TICK_INTERVAL,
            static_dir: PathBuf::from("."),
            log_format: LogFormat::Json,
        }
    }
}

impl ServiceConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`. Invalid values keep their
    /// default and are logged.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(host) = lookup("HOST").filter(|s| !s.is_empty()) {
            cfg.host = host;
        }
        if let Some(port) = parse_var(&lookup, "PORT") {
            cfg.port = port;
        }
        if let Some(dir) = lookup("DATA_DIR").filter(|s| !s.is_empty()) {
            cfg.data_dir = PathBuf::from(dir);
        }
        if let Some(file) = lookup("SNAPSHOT_FILE").filter(|s| !s.is_empty()) {
            cfg.snapshot_file = file;
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "TICK_INTERVAL_SECS") {
            cfg.tick_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(dir) = lookup("STATIC_DIR").filter(|s| !s.is_empty()) {
            cfg.static_dir = PathBuf::from(dir);
        }
        if let Some(format) = parse_var(&lookup, "LOG_FORMAT") {
            cfg.log_format = format;
        }

        cfg
    }

    /// Full path of the snapshot file.
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(&self.snapshot_file)
    }

    /// Conversion policy for the configured tick interval.
    pub fn growth_policy(&self) -> GrowthPolicy {
        GrowthPolicy::new(self.tick_interval)
    }

    /// `host:port`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, value = %raw, error = %e, "Ignoring invalid configuration value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = ServiceConfig::from_lookup(|_| None);
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.tick_interval, Duration::from_secs(5));
        assert_eq!(cfg.snapshot_path(), PathBuf::from("data").join("channels.json"));
        assert_eq!(cfg.growth_policy().ticks_per_hour(), 720);
        assert_eq!(cfg.log_format, LogFormat::Json);
    }

    #[test]
    fn test_overrides() {
        let cfg = ServiceConfig::from_lookup(lookup_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("DATA_DIR", "/var/lib/ranking"),
            ("TICK_INTERVAL_SECS", "10"),
            ("LOG_FORMAT", "Pretty"),
        ]));

        assert_eq!(cfg.bind_address(), "127.0.0.1:8080");
        assert_eq!(cfg.snapshot_path(), PathBuf::from("/var/lib/ranking/channels.json"));
        assert_eq!(cfg.growth_policy().ticks_per_hour(), 360);
        assert_eq!(cfg.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let cfg = ServiceConfig::from_lookup(lookup_from(&[
            ("PORT", "not-a-port"),
            ("TICK_INTERVAL_SECS", "0"),
            ("LOG_FORMAT", "xml"),
        ]));

        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.tick_interval, Duration::from_secs(1));
        assert_eq!(cfg.log_format, LogFormat::Json);
    }
}
