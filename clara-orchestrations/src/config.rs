//! Orchestrator settings

use std::time::Duration;

use clara_models::{ClaraLang, DpeName, DEFAULT_POOL_SIZE};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Name the orchestrator signs its requests with
    pub name: String,
    /// DPE acting as the registrar and control-plane entry point
    pub front_end: DpeName,
    /// Background workers available to listener callbacks
    pub pool_size: usize,
    pub description: String,
    #[serde(with = "millis")]
    pub sync_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            name: format!("orchestrator-{}", uuid::Uuid::new_v4()),
            front_end: localhost_front_end(),
            pool_size: DEFAULT_POOL_SIZE,
            description: String::new(),
            sync_timeout: DEFAULT_SYNC_TIMEOUT,
        }
    }
}

fn localhost_front_end() -> DpeName {
    match DpeName::new("localhost", ClaraLang::Java) {
        Ok(dpe) => dpe,
        Err(_) => unreachable!("localhost is a valid host"),
    }
}

impl OrchestratorConfig {
    pub fn with_front_end(mut self, front_end: DpeName) -> Self {
        self.front_end = front_end;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_argument("orchestrator name must not be empty"));
        }
        if self.pool_size == 0 {
            return Err(Error::invalid_argument("subscription pool size must be greater than zero"));
        }
        if self.sync_timeout.is_zero() {
            return Err(Error::invalid_argument("sync timeout must be greater than zero"));
        }
        Ok(())
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OrchestratorConfig::default();
        assert!(config.name.starts_with("orchestrator-"));
        assert_eq!(config.front_end.canonical_name(), "localhost:7771_java");
        assert_eq!(config.pool_size, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_pool_size_is_invalid() {
        let config = OrchestratorConfig::default().with_pool_size(0);
        assert!(matches!(config.validate(), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: OrchestratorConfig =
            serde_json::from_str(r#"{"front_end": "10.1.1.1_java", "sync_timeout": 250}"#).unwrap();
        assert_eq!(config.front_end.canonical_name(), "10.1.1.1:7771_java");
        assert_eq!(config.sync_timeout, Duration::from_millis(250));
        assert_eq!(config.pool_size, 2);
    }
}
