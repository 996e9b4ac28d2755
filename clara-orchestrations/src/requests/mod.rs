//! Request builders
//!
//! Every builder follows the same life cycle: it is created in
//! [`RequestState::Built`], moves to [`RequestState::Configured`] with each
//! setter call and ends in [`RequestState::Dispatched`] once sent. A dispatched
//! builder refuses any further use with [`Error::IllegalState`]. Validation
//! happens in the setters, so a malformed request never reaches the wire.

use std::sync::Arc;
use std::time::Duration;

use clara_models::{ComponentDescriptor, ReportKind, Topic};
use tracing::debug;

use crate::codec::{encode, ControlCommand};
use crate::error::{Error, Result};
use crate::transport::{Message, MessageMeta, ServiceAction, Transport};
use crate::types::{DataTypeSet, EngineData};

pub mod configure;
pub mod deploy;
pub mod execute;
pub mod exit;

pub use configure::ServiceConfigRequest;
pub use deploy::{DeployContainerRequest, DeployServiceRequest};
pub use execute::ServiceExecuteRequest;
pub use exit::ExitRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Built,
    Configured,
    Dispatched,
}

/// Transport handle and life-cycle state shared by all builders
pub(crate) struct RequestBase {
    transport: Arc<dyn Transport>,
    sender: String,
    state: RequestState,
}

impl RequestBase {
    pub(crate) fn new(transport: Arc<dyn Transport>, sender: impl Into<String>) -> Self {
        Self {
            transport,
            sender: sender.into(),
            state: RequestState::Built,
        }
    }

    pub(crate) fn state(&self) -> RequestState {
        self.state
    }

    pub(crate) fn ensure_open(&self, operation: &str) -> Result<()> {
        if self.state == RequestState::Dispatched {
            return Err(Error::IllegalState(format!(
                "{} called on a request that was already sent",
                operation
            )));
        }
        Ok(())
    }

    /// Checks the request is still open and records a configuration step
    pub(crate) fn configure(&mut self, operation: &str) -> Result<()> {
        self.ensure_open(operation)?;
        self.state = RequestState::Configured;
        Ok(())
    }

    /// Checks the request is still open and closes it
    ///
    /// Called before handing anything to the transport: a request whose
    /// dispatch failed is still spent.
    pub(crate) fn dispatch(&mut self, operation: &str) -> Result<()> {
        self.ensure_open(operation)?;
        self.state = RequestState::Dispatched;
        Ok(())
    }

    pub(crate) async fn publish(&self, target: &ComponentDescriptor, message: Message) -> Result<()> {
        debug!(
            target_name = target.canonical_name(),
            topic = %message.topic,
            sender = %self.sender,
            "Sending request"
        );
        self.transport
            .publish(target, message.with_sender(self.sender.as_str()))
            .await?;
        Ok(())
    }

    pub(crate) async fn sync_publish(
        &self,
        target: &ComponentDescriptor,
        message: Message,
        timeout: Duration,
    ) -> Result<Message> {
        debug!(
            target_name = target.canonical_name(),
            topic = %message.topic,
            sender = %self.sender,
            timeout_ms = timeout.as_millis() as u64,
            "Sending synchronous request"
        );
        let reply = self
            .transport
            .sync_publish(target, message.with_sender(self.sender.as_str()), timeout)
            .await?;
        Ok(reply)
    }
}

/// Encodes `command` into a text message on `topic`
pub(crate) fn control_message(topic: Topic, command: &ControlCommand) -> Result<Message> {
    Ok(Message::text(topic, encode(command)?))
}

/// Serializes `data` into a service request, failing on unregistered types
pub(crate) fn data_message(
    topic: Topic,
    action: ServiceAction,
    data: &EngineData,
    data_types: &DataTypeSet,
) -> Result<Message> {
    let bytes = data_types.serialize(data)?;
    let meta = MessageMeta {
        mime_type: data.mime_type.clone(),
        action: Some(action),
        description: data.description.clone(),
        ..MessageMeta::default()
    };
    Ok(Message::new(topic, meta, bytes))
}

/// Decodes the reply to a synchronous service request
pub(crate) fn reply_data(reply: Message, data_types: &DataTypeSet) -> Result<EngineData> {
    let value = data_types.deserialize(&reply.meta.mime_type, &reply.data)?;
    let mut data = EngineData::new(reply.meta.mime_type, value).with_description(reply.meta.description);
    if let Some(ReportKind::Status(status)) = reply.meta.report {
        data.status = Some(status);
    }
    Ok(data)
}
