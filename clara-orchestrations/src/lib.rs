//! Clara Orchestrations - deployment, configuration and subscription management for CLARA services
//!
//! This crate turns a fire-and-forget publish/subscribe transport into the
//! request/response and at-most-once-subscription operations an orchestrator
//! needs: deploying and removing containers and services on DPEs, configuring
//! and executing services, throttling service reports, listening to reports
//! and querying the registrar.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use clara_orchestrations::{EngineData, Orchestrator, OrchestratorConfig};
//! use clara_orchestrations::transport::LocalTransport;
//!
//! # async fn example() -> clara_orchestrations::Result<()> {
//! let orchestrator = Orchestrator::new(Arc::new(LocalTransport::default()), OrchestratorConfig::default())?;
//!
//! orchestrator.deploy_container("10.1.1.1_java:master")?.send().await?;
//! orchestrator
//!     .deploy_service("10.1.1.1_java:master:Reader", "org.jlab.clas.std.services.convertors.EvioToEvioReader")?
//!     .send()
//!     .await?;
//!
//! orchestrator.start_reporting_done("10.1.1.1_java:master:Reader", 100).await?;
//! orchestrator
//!     .listen_service_done("10.1.1.1_java:master:Reader", |data| println!("{:?}", data))
//!     .await?;
//!
//! orchestrator
//!     .execute("10.1.1.1_java:master:Reader")?
//!     .with_data(EngineData::string("/data/run-1.evio"))?
//!     .send()
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod discovery;
pub mod error;
pub mod names;
pub mod orchestrator;
pub mod registry;
pub mod reports;
pub mod requests;
pub mod topics;
pub mod transport;
pub mod types;

// Re-export key types for convenience
pub use config::OrchestratorConfig;
pub use error::{Error, Result};
pub use orchestrator::Orchestrator;
pub use requests::RequestState;
pub use types::{DataTypeSet, EngineData, EngineDataType};
