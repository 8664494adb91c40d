//! Process configuration from environment variables.

use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use tracker_observability::LogFormat;
use tracker_orders::ProgressionPolicy;

pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    pub bind_addr: String,
    pub jwt_secret: String,
    pub log_format: LogFormat,
    pub progression: ProgressionPolicy,
    /// `None` disables the background sweep.
    pub sweep_interval: Option<Duration>,
    pub seed_catalog: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            log_format: LogFormat::Json,
            progression: ProgressionPolicy::default(),
            sweep_interval: Some(Duration::from_secs(60)),
            seed_catalog: true,
        }
    }
}

fn parse_u32(key: &'static str, value: String) -> Result<u32, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid { key, value })
}

fn parse_bool(key: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid { key, value }),
    }
}

impl TrackerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`TrackerConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();

        if let Some(v) = lookup("BIND_ADDR") {
            cfg.bind_addr = v;
        }

        match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(v) => cfg.jwt_secret = v,
            None => warn!("JWT_SECRET not set; using the development secret"),
        }

        if let Some(v) = lookup("LOG_FORMAT") {
            cfg.log_format = LogFormat::parse(&v).ok_or(ConfigError::Invalid {
                key: "LOG_FORMAT",
                value: v,
            })?;
        }

        if let Some(v) = lookup("AUTO_PROGRESS_MINUTES") {
            cfg.progression.auto_progress_after_minutes = parse_u32("AUTO_PROGRESS_MINUTES", v)?;
        }

        if let Some(v) = lookup("OVERDUE_AFTER_MINUTES") {
            cfg.progression.overdue_after_minutes = parse_u32("OVERDUE_AFTER_MINUTES", v)?;
        }

        if let Some(v) = lookup("PROGRESSION_SWEEP_SECONDS") {
            cfg.sweep_interval = match parse_u32("PROGRESSION_SWEEP_SECONDS", v)? {
                0 => None,
                secs => Some(Duration::from_secs(u64::from(secs))),
            };
        }

        if let Some(v) = lookup("SEED_CATALOG") {
            cfg.seed_catalog = parse_bool("SEED_CATALOG", v)?;
        }

        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from(pairs: &[(&str, &str)]) -> Result<TrackerConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        TrackerConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        assert_eq!(from(&[]).unwrap(), TrackerConfig::default());
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = from(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("JWT_SECRET", "s3cret"),
            ("LOG_FORMAT", "pretty"),
            ("AUTO_PROGRESS_MINUTES", "5"),
            ("OVERDUE_AFTER_MINUTES", "120"),
            ("PROGRESSION_SWEEP_SECONDS", "0"),
            ("SEED_CATALOG", "false"),
        ])
        .unwrap();

        assert_eq!(cfg.bind_addr, "127.0.0.1:9000");
        assert_eq!(cfg.jwt_secret, "s3cret");
        assert_eq!(cfg.log_format, LogFormat::Pretty);
        assert_eq!(cfg.progression.auto_progress_after_minutes, 5);
        assert_eq!(cfg.progression.overdue_after_minutes, 120);
        assert_eq!(cfg.sweep_interval, None);
        assert!(!cfg.seed_catalog);
    }

    #[test]
    fn invalid_numbers_name_the_key() {
        assert_eq!(
            from(&[("OVERDUE_AFTER_MINUTES", "nine hours")]),
            Err(ConfigError::Invalid {
                key: "OVERDUE_AFTER_MINUTES",
                value: "nine hours".into()
            })
        );
    }
}
