//! Service execution requests
//!
//! A request runs either a single service or a composition. Messages for a
//! composition are addressed to its first service and carry the whole
//! composition, so each service can route its output to the next hop.

use std::sync::Arc;
use std::time::Duration;

use clara_models::{ComponentDescriptor, Composition, ServiceName};

use super::{data_message, reply_data, RequestBase, RequestState};
use crate::error::{Error, Result};
use crate::topics::service_topic;
use crate::transport::{Message, ServiceAction, Transport};
use crate::types::{DataTypeSet, EngineData, EngineDataType};

pub struct ServiceExecuteRequest {
    base: RequestBase,
    composition: Composition,
    data_types: DataTypeSet,
    messages: Vec<Message>,
}

impl ServiceExecuteRequest {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        sender: &str,
        composition: Composition,
        data_types: DataTypeSet,
    ) -> Self {
        Self {
            base: RequestBase::new(transport, sender),
            composition,
            data_types,
            messages: Vec::new(),
        }
    }

    pub fn with_data_types(&mut self, types: impl IntoIterator<Item = EngineDataType>) -> Result<&mut Self> {
        self.base.configure("with_data_types")?;
        self.data_types.register(types);
        Ok(self)
    }

    /// Adds one input; each input is executed as a separate message
    pub fn with_data(&mut self, data: EngineData) -> Result<&mut Self> {
        self.base.configure("with_data")?;
        let mut message = data_message(
            service_topic(self.first_service()),
            ServiceAction::Execute,
            &data,
            &self.data_types,
        )?;
        message.meta.composition = Some(self.composition.to_string());
        self.messages.push(message);
        Ok(self)
    }

    pub fn state(&self) -> RequestState {
        self.base.state()
    }

    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    pub fn first_service(&self) -> &ServiceName {
        self.composition.first_service()
    }

    pub fn target(&self) -> ComponentDescriptor {
        ComponentDescriptor::service(self.first_service())
    }

    fn take_messages(&mut self, operation: &str) -> Result<Vec<Message>> {
        self.base.ensure_open(operation)?;
        if self.messages.is_empty() {
            return Err(Error::invalid_argument(format!(
                "nothing to execute on {}",
                self.first_service()
            )));
        }
        self.base.dispatch(operation)?;
        Ok(std::mem::take(&mut self.messages))
    }

    pub async fn send(&mut self) -> Result<()> {
        let messages = self.take_messages("send")?;
        let target = self.target();
        for message in messages {
            self.base.publish(&target, message).await?;
        }
        Ok(())
    }

    /// Executes each input and waits for its result
    pub async fn sync_send(&mut self, timeout: Duration) -> Result<Vec<EngineData>> {
        let messages = self.take_messages("sync_send")?;
        let target = self.target();
        let mut results = Vec::with_capacity(messages.len());
        for message in messages {
            let reply = self.base.sync_publish(&target, message, timeout).await?;
            results.push(reply_data(reply, &self.data_types)?);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{LocalTransport, MessageMeta};
    use crate::types::mime;
    use clara_models::{EngineStatus, ReportKind, Topic};
    use serde_json::json;

    fn composition() -> Composition {
        "10.1.1.1_java:c:Reader+10.1.1.2_java:c:Filter+10.1.1.1_java:c:Writer;"
            .parse()
            .unwrap()
    }

    fn request(transport: &Arc<LocalTransport>, composition: Composition) -> ServiceExecuteRequest {
        ServiceExecuteRequest::new(transport.clone(), "orch", composition, DataTypeSet::with_defaults())
    }

    #[tokio::test]
    async fn test_composition_goes_to_first_service() {
        let transport = Arc::new(LocalTransport::default());
        let mut request = request(&transport, composition());
        request.with_data(EngineData::string("/data/run-1.evio")).unwrap();
        request.send().await.unwrap();

        let published = transport.last_published().unwrap();
        assert_eq!(published.target.canonical_name(), "10.1.1.1:7771_java:c:Reader");
        assert_eq!(published.message.topic.to_string(), "service:10.1.1.1:7771_java:c:Reader");
        assert_eq!(published.message.meta.action, Some(ServiceAction::Execute));
        assert_eq!(
            published.message.meta.composition.as_deref(),
            Some("10.1.1.1:7771_java:c:Reader+10.1.1.2:7771_java:c:Filter+10.1.1.1:7771_java:c:Writer;")
        );
    }

    #[tokio::test]
    async fn test_single_service_execution() {
        let transport = Arc::new(LocalTransport::default());
        let service: ServiceName = "10.1.1.1_python:c:Fit".parse().unwrap();
        let mut request = request(&transport, Composition::from(service));
        request
            .with_data(EngineData::json(json!({"event": 1})))
            .unwrap()
            .with_data(EngineData::json(json!({"event": 2})))
            .unwrap();
        request.send().await.unwrap();

        let published = transport.published();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].target.port(), 7791);
    }

    #[tokio::test]
    async fn test_execute_without_data_is_rejected() {
        let transport = Arc::new(LocalTransport::default());
        let mut request = request(&transport, composition());

        assert!(matches!(request.send().await, Err(Error::InvalidArgument(_))));
        assert_eq!(request.state(), RequestState::Built);
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_sync_send_returns_status() {
        let transport = Arc::new(LocalTransport::default());
        transport.respond_with(Topic::build("service"), |request| {
            let meta = MessageMeta {
                mime_type: mime::STRING.to_string(),
                report: Some(ReportKind::Status(EngineStatus::Warning)),
                description: "partial".to_string(),
                ..MessageMeta::default()
            };
            Some(Message::new(request.topic.clone(), meta, b"3 events skipped".to_vec()))
        });
        let mut request = request(&transport, composition());
        request.with_data(EngineData::string("/data/run-2.evio")).unwrap();

        let results = request.sync_send(Duration::from_secs(1)).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, Some(EngineStatus::Warning));
        assert_eq!(results[0].description, "partial");
        assert!(matches!(request.with_data(EngineData::string("x")), Err(Error::IllegalState(_))));
    }
}
