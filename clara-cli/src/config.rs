use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clara_models::DpeName;
use clara_orchestrations::config::DEFAULT_SYNC_TIMEOUT;
use clara_orchestrations::OrchestratorConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub clara_home: PathBuf,
    pub front_end: DpeName,
    pub pool_size: usize,
    pub orchestrator_name: Option<String>,
    pub sync_timeout: Duration,
    pub user: String,
    /// Host this orchestrator runs on
    pub host: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());

        Ok(Self {
            clara_home: std::env::var("CLARA_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(home).join("clara")),
            front_end: std::env::var("CLARA_FRONT_END")
                .unwrap_or_else(|_| "localhost_java".to_string())
                .parse()
                .context("CLARA_FRONT_END must be a DPE canonical name")?,
            pool_size: std::env::var("CLARA_POOL_SIZE")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .context("CLARA_POOL_SIZE must be a positive number")?,
            orchestrator_name: std::env::var("CLARA_ORCHESTRATOR_NAME").ok(),
            sync_timeout: match std::env::var("CLARA_SYNC_TIMEOUT_MS") {
                Ok(ms) => Duration::from_millis(
                    ms.parse()
                        .context("CLARA_SYNC_TIMEOUT_MS must be a number of milliseconds")?,
                ),
                Err(_) => DEFAULT_SYNC_TIMEOUT,
            },
            user: std::env::var("USER").unwrap_or_else(|_| "clara".to_string()),
            host: std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string()),
        })
    }

    pub fn orchestrator_log_file(&self) -> PathBuf {
        crate::logs::log_file(&self.clara_home, &self.host, &self.user, crate::logs::ORCHESTRATOR_LOG_TYPE)
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        let mut config = OrchestratorConfig::default()
            .with_front_end(self.front_end.clone())
            .with_pool_size(self.pool_size);
        if let Some(name) = &self.orchestrator_name {
            config = config.with_name(name.as_str());
        }
        config.sync_timeout = self.sync_timeout;
        config
    }
}
