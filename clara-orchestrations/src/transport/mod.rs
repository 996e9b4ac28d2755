//! The publish/subscribe transport the orchestration layer is built on
//!
//! Only this narrow surface is consumed. Delivery is fire-and-forget: a message
//! published to a target that does not exist is dropped by the transport and
//! the publisher is never told.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clara_models::{ComponentDescriptor, RegistrationRecord, ReportKind, Topic};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::mime;

pub mod local;

pub use local::LocalTransport;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("i/o failure: {0}")]
    Io(String),

    #[error("protocol failure: {0}")]
    Protocol(String),

    #[error("subscription rejected: {0}")]
    Subscribe(String),

    #[error("no reply after {timeout:?}")]
    Timeout { timeout: Duration },
}

/// What a service request asks the service to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceAction {
    Configure,
    Execute,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageMeta {
    pub mime_type: String,
    #[serde(default)]
    pub action: Option<ServiceAction>,
    /// Full composition for execute requests, so routing can continue downstream
    #[serde(default)]
    pub composition: Option<String>,
    /// Declared kind of a service report
    #[serde(default)]
    pub report: Option<ReportKind>,
    #[serde(default)]
    pub description: String,
    /// Name of the publishing actor
    #[serde(default)]
    pub sender: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub topic: Topic,
    pub meta: MessageMeta,
    pub data: Vec<u8>,
}

impl Message {
    pub fn new(topic: Topic, meta: MessageMeta, data: Vec<u8>) -> Self {
        Self { topic, meta, data }
    }

    /// A plain text message, as used by control payloads
    pub fn text(topic: Topic, text: impl Into<String>) -> Self {
        Self {
            topic,
            meta: MessageMeta {
                mime_type: mime::STRING.to_string(),
                ..MessageMeta::default()
            },
            data: text.into().into_bytes(),
        }
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.meta.sender = Some(sender.into());
        self
    }

    /// Text content, if the message is a valid UTF-8 string message
    pub fn as_text(&self) -> Option<&str> {
        if self.meta.mime_type != mime::STRING {
            return None;
        }
        std::str::from_utf8(&self.data).ok()
    }
}

/// Invoked by the transport for every message delivered to a subscription
///
/// Calls for one subscription are sequential; calls for different
/// subscriptions may run concurrently with each other and with the caller.
pub type MessageCallback = Arc<dyn Fn(Message) + Send + Sync>;

/// Opaque handle to a transport-level listener
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListenerHandle {
    id: u64,
    topic: Topic,
}

impl ListenerHandle {
    pub fn new(id: u64, topic: Topic) -> Self {
        Self { id, topic }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }
}

impl fmt::Display for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.id, self.topic)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Fire-and-forget publish through the proxy of `target`
    async fn publish(&self, target: &ComponentDescriptor, message: Message) -> Result<(), TransportError>;

    /// Publishes and waits for a single reply, failing with
    /// [`TransportError::Timeout`] when none arrives in time
    async fn sync_publish(
        &self,
        target: &ComponentDescriptor,
        message: Message,
        timeout: Duration,
    ) -> Result<Message, TransportError>;

    async fn subscribe(
        &self,
        target: &ComponentDescriptor,
        topic: &Topic,
        callback: MessageCallback,
    ) -> Result<ListenerHandle, TransportError>;

    async fn unsubscribe(&self, handle: ListenerHandle) -> Result<(), TransportError>;

    /// Whitespace-separated names of the registrants matching `pattern`
    async fn query_registrant_names(
        &self,
        registrar: &ComponentDescriptor,
        pattern: &Topic,
    ) -> Result<String, TransportError>;

    async fn query_registration_records(
        &self,
        registrar: &ComponentDescriptor,
        pattern: &Topic,
    ) -> Result<HashSet<RegistrationRecord>, TransportError>;
}
