//! Console configuration

use std::path::PathBuf;
use std::time::Duration;

use derivative::Derivative;
use serde::{Deserialize, Deserializer};
use studio_auth::identity::Latency;
use tracing_subscriber::filter::Directive;

/// Logging output format
#[derive(Debug, Clone, Copy, Deserialize, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    /// Additional filtering directives
    #[serde(deserialize_with = "Logging::deserialize_filters")]
    pub filters: Vec<Directive>,

    /// Logging format
    pub format: LogFormat,
}

impl Logging {
    fn deserialize_filters<'de, D>(deserializer: D) -> Result<Vec<Directive>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let dirs: Vec<String> = Deserialize::deserialize(deserializer)?;
        dirs.into_iter()
            .map(|dir| dir.parse().map_err(serde::de::Error::custom))
            .collect()
    }
}

/// Persistence configuration
#[derive(Debug, Clone, Deserialize, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Storage {
    /// File keeping the durable storage scope
    #[derivative(Default(value = "PathBuf::from(\"studio-admin.json\")"))]
    pub durable_path: PathBuf,
}

/// Simulated identity service latency, in milliseconds
#[derive(Debug, Clone, Copy, Deserialize, Derivative)]
#[derivative(Default)]
#[serde(default)]
pub struct Identity {
    #[derivative(Default(value = "500"))]
    pub login_delay_ms: u64,
    #[derivative(Default(value = "200"))]
    pub logout_delay_ms: u64,
    #[derivative(Default(value = "300"))]
    pub verify_delay_ms: u64,
}

impl Identity {
    pub fn latency(&self) -> Latency {
        Latency {
            login: Duration::from_millis(self.login_delay_ms),
            logout: Duration::from_millis(self.logout_delay_ms),
            verify: Duration::from_millis(self.verify_delay_ms),
        }
    }
}

/// Top level console configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: Logging,

    /// Storage configuration
    pub storage: Storage,

    /// Identity service configuration
    pub identity: Identity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert!(config.logging.filters.is_empty());
        assert!(matches!(config.logging.format, LogFormat::Compact));
        assert_eq!(config.storage.durable_path, PathBuf::from("studio-admin.json"));
        assert_eq!(config.identity.latency(), Latency::default());
    }

    #[test]
    fn full_config() {
        let config: Config = toml::from_str(
            r#"
            [logging]
            format = "Pretty"
            filters = ["studio_auth=debug"]

            [storage]
            durable_path = "/tmp/studio/state.json"

            [identity]
            login_delay_ms = 0
            verify_delay_ms = 10
            "#,
        )
        .unwrap();

        assert!(matches!(config.logging.format, LogFormat::Pretty));
        assert_eq!(config.logging.filters.len(), 1);
        assert_eq!(
            config.storage.durable_path,
            PathBuf::from("/tmp/studio/state.json")
        );
        assert_eq!(
            config.identity.latency(),
            Latency {
                login: Duration::ZERO,
                logout: Duration::from_millis(200),
                verify: Duration::from_millis(10),
            }
        );
    }

    #[test]
    fn invalid_filter_is_rejected() {
        let result: Result<Config, _> = toml::from_str(
            r#"
            [logging]
            filters = ["studio_auth=loudly"]
            "#,
        );
        assert!(result.is_err());
    }
}
