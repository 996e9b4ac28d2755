//! Service configuration requests

use std::sync::Arc;
use std::time::Duration;

use clara_models::{ComponentDescriptor, ServiceName};
use serde_json::json;

use super::{data_message, reply_data, RequestBase, RequestState};
use crate::error::Result;
use crate::topics::service_topic;
use crate::transport::{Message, ServiceAction, Transport};
use crate::types::{DataTypeSet, EngineData, EngineDataType};

/// Accumulates configuration values for one service
///
/// Each value is serialized as soon as it is added, so an unregistered data
/// type fails here rather than at send time. A request with no values sends a
/// single empty JSON object.
pub struct ServiceConfigRequest {
    base: RequestBase,
    service: ServiceName,
    data_types: DataTypeSet,
    messages: Vec<Message>,
}

impl ServiceConfigRequest {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        sender: &str,
        service: ServiceName,
        data_types: DataTypeSet,
    ) -> Self {
        Self {
            base: RequestBase::new(transport, sender),
            service,
            data_types,
            messages: Vec::new(),
        }
    }

    /// Registers extra data types for this request only
    pub fn with_data_types(&mut self, types: impl IntoIterator<Item = EngineDataType>) -> Result<&mut Self> {
        self.base.configure("with_data_types")?;
        self.data_types.register(types);
        Ok(self)
    }

    pub fn with_data(&mut self, data: EngineData) -> Result<&mut Self> {
        self.base.configure("with_data")?;
        let message = data_message(
            service_topic(&self.service),
            ServiceAction::Configure,
            &data,
            &self.data_types,
        )?;
        self.messages.push(message);
        Ok(self)
    }

    pub fn state(&self) -> RequestState {
        self.base.state()
    }

    pub fn service(&self) -> &ServiceName {
        &self.service
    }

    pub fn target(&self) -> ComponentDescriptor {
        ComponentDescriptor::service(&self.service)
    }

    fn take_messages(&mut self) -> Result<Vec<Message>> {
        if !self.messages.is_empty() {
            return Ok(std::mem::take(&mut self.messages));
        }
        let empty = data_message(
            service_topic(&self.service),
            ServiceAction::Configure,
            &EngineData::json(json!({})),
            &self.data_types,
        )?;
        Ok(vec![empty])
    }

    pub async fn send(&mut self) -> Result<()> {
        self.base.dispatch("send")?;
        let target = self.target();
        for message in self.take_messages()? {
            self.base.publish(&target, message).await?;
        }
        Ok(())
    }

    /// Sends each value and waits for its reply
    pub async fn sync_send(&mut self, timeout: Duration) -> Result<Vec<EngineData>> {
        self.base.dispatch("sync_send")?;
        let target = self.target();
        let mut replies = Vec::new();
        for message in self.take_messages()? {
            let reply = self.base.sync_publish(&target, message, timeout).await?;
            replies.push(reply_data(reply, &self.data_types)?);
        }
        Ok(replies)
    }
}
