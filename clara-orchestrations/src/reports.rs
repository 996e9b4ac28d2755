//! Report throttling
//!
//! Tells a service to publish a report every N executions, or to stop. No
//! state is kept locally: repeated calls simply re-send and the last message
//! to arrive wins.

use std::sync::Arc;

use clara_models::{ComponentDescriptor, ReportType, ServiceName};
use tracing::debug;

use crate::codec::{encode, ControlCommand};
use crate::error::{Error, Result};
use crate::topics::service_topic;
use crate::transport::{Message, Transport};

pub struct ReportController {
    transport: Arc<dyn Transport>,
    sender: String,
}

impl ReportController {
    pub fn new(transport: Arc<dyn Transport>, sender: impl Into<String>) -> Self {
        Self {
            transport,
            sender: sender.into(),
        }
    }

    /// Fails with [`Error::InvalidArgument`] unless `every_n` is positive
    pub async fn start_reporting(&self, service: &ServiceName, report: ReportType, every_n: i64) -> Result<()> {
        if every_n <= 0 {
            return Err(Error::invalid_argument(format!(
                "report interval must be positive, got {}",
                every_n
            )));
        }
        let every_n = u32::try_from(every_n)
            .map_err(|_| Error::invalid_argument(format!("report interval {} is too large", every_n)))?;
        self.send(service, ControlCommand::Report { report, every_n }).await
    }

    pub async fn stop_reporting(&self, service: &ServiceName, report: ReportType) -> Result<()> {
        self.send(service, ControlCommand::Report { report, every_n: 0 }).await
    }

    async fn send(&self, service: &ServiceName, command: ControlCommand) -> Result<()> {
        let message = Message::text(service_topic(service), encode(&command)?).with_sender(self.sender.as_str());
        debug!(service = %service, command = %command, "Setting report interval");
        self.transport
            .publish(&ComponentDescriptor::service(service), message)
            .await?;
        Ok(())
    }
}
