//! Deploy requests for containers and services
//!
//! Both are sent to the owning DPE: the component does not exist yet, so only
//! its DPE can create it.

use std::sync::Arc;

use clara_models::{ClaraName, ComponentDescriptor, ContainerName, ServiceName, DEFAULT_POOL_SIZE};

use super::{control_message, RequestBase, RequestState};
use crate::codec::ControlCommand;
use crate::error::{Error, Result};
use crate::names::DATA_SEP;
use crate::topics::dpe_topic;
use crate::transport::{Message, Transport};

fn check_pool_size(pool_size: usize) -> Result<usize> {
    if pool_size == 0 {
        return Err(Error::invalid_argument("pool size must be greater than zero"));
    }
    Ok(pool_size)
}

pub struct DeployContainerRequest {
    base: RequestBase,
    container: ContainerName,
    pool_size: usize,
    description: String,
}

impl DeployContainerRequest {
    pub(crate) fn new(transport: Arc<dyn Transport>, sender: &str, container: ContainerName) -> Self {
        Self {
            base: RequestBase::new(transport, sender),
            container,
            pool_size: DEFAULT_POOL_SIZE,
            description: String::new(),
        }
    }

    pub fn with_pool_size(&mut self, pool_size: usize) -> Result<&mut Self> {
        self.base.configure("with_pool_size")?;
        self.pool_size = check_pool_size(pool_size)?;
        Ok(self)
    }

    pub fn with_description(&mut self, description: impl Into<String>) -> Result<&mut Self> {
        self.base.configure("with_description")?;
        self.description = description.into();
        Ok(self)
    }

    pub fn state(&self) -> RequestState {
        self.base.state()
    }

    pub fn container(&self) -> &ContainerName {
        &self.container
    }

    /// The owning DPE
    pub fn target(&self) -> ComponentDescriptor {
        ComponentDescriptor::dpe(self.container.dpe())
    }

    pub fn command(&self) -> ControlCommand {
        ControlCommand::DeployContainer {
            container: self.container.clone(),
            pool_size: self.pool_size,
            description: self.description.clone(),
        }
    }

    fn message(&self) -> Result<Message> {
        control_message(dpe_topic(self.container.dpe()), &self.command())
    }

    /// Fire and forget; an unreachable DPE silently drops the request
    pub async fn send(&mut self) -> Result<()> {
        let message = self.message()?;
        self.base.dispatch("send")?;
        self.base.publish(&self.target(), message).await
    }
}

pub struct DeployServiceRequest {
    base: RequestBase,
    service: ServiceName,
    class_path: String,
    pool_size: usize,
    description: String,
}

impl DeployServiceRequest {
    /// Fails when `class_path` is empty or contains the field separator
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        sender: &str,
        service: ServiceName,
        class_path: impl Into<String>,
    ) -> Result<Self> {
        let class_path = class_path.into();
        if class_path.trim().is_empty() {
            return Err(Error::invalid_argument(format!(
                "missing engine class path for {}",
                service
            )));
        }
        if class_path.contains(DATA_SEP) {
            return Err(Error::invalid_argument(format!(
                "engine class path '{}' for {} contains '{}'",
                class_path, service, DATA_SEP
            )));
        }
        Ok(Self {
            base: RequestBase::new(transport, sender),
            service,
            class_path,
            pool_size: DEFAULT_POOL_SIZE,
            description: String::new(),
        })
    }

    pub fn with_pool_size(&mut self, pool_size: usize) -> Result<&mut Self> {
        self.base.configure("with_pool_size")?;
        self.pool_size = check_pool_size(pool_size)?;
        Ok(self)
    }

    pub fn with_description(&mut self, description: impl Into<String>) -> Result<&mut Self> {
        self.base.configure("with_description")?;
        self.description = description.into();
        Ok(self)
    }

    pub fn state(&self) -> RequestState {
        self.base.state()
    }

    pub fn service(&self) -> &ServiceName {
        &self.service
    }

    /// The owning DPE
    pub fn target(&self) -> ComponentDescriptor {
        ComponentDescriptor::dpe(self.service.dpe())
    }

    pub fn command(&self) -> ControlCommand {
        ControlCommand::DeployService {
            service: self.service.clone(),
            class_path: self.class_path.clone(),
            pool_size: self.pool_size,
            description: self.description.clone(),
        }
    }

    fn message(&self) -> Result<Message> {
        control_message(dpe_topic(self.service.dpe()), &self.command())
    }

    pub async fn send(&mut self) -> Result<()> {
        let message = self.message()?;
        self.base.dispatch("send")?;
        self.base.publish(&self.target(), message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode;
    use crate::transport::LocalTransport;

    fn container() -> ContainerName {
        "10.1.1.1_java:master".parse().unwrap()
    }

    #[tokio::test]
    async fn test_deploy_container_goes_to_dpe() {
        let transport = Arc::new(LocalTransport::default());
        let mut request = DeployContainerRequest::new(transport.clone(), "orch", container());
        request.with_pool_size(4).unwrap().with_description("reco farm").unwrap();
        request.send().await.unwrap();

        let published = transport.last_published().unwrap();
        assert_eq!(published.target.canonical_name(), "10.1.1.1:7771_java");
        assert_eq!(published.message.topic.to_string(), "dpe:10.1.1.1:7771_java");
        assert_eq!(published.message.meta.sender.as_deref(), Some("orch"));
        assert_eq!(
            decode(published.message.as_text().unwrap()).unwrap(),
            ControlCommand::DeployContainer {
                container: container(),
                pool_size: 4,
                description: "reco farm".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_deploy_container_defaults() {
        let transport = Arc::new(LocalTransport::default());
        let mut request = DeployContainerRequest::new(transport.clone(), "orch", container());
        assert_eq!(request.state(), RequestState::Built);
        request.send().await.unwrap();

        let payload = transport.last_published().unwrap().message;
        assert_eq!(payload.as_text(), Some("startContainer?10.1.1.1:7771_java:master?2?"));
    }

    #[tokio::test]
    async fn test_zero_pool_size_is_rejected() {
        let transport = Arc::new(LocalTransport::default());
        let mut request = DeployContainerRequest::new(transport.clone(), "orch", container());

        assert!(matches!(request.with_pool_size(0), Err(Error::InvalidArgument(_))));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_sent_request_is_spent() {
        let transport = Arc::new(LocalTransport::default());
        let mut request = DeployContainerRequest::new(transport.clone(), "orch", container());
        request.send().await.unwrap();

        assert_eq!(request.state(), RequestState::Dispatched);
        assert!(matches!(request.with_description("late"), Err(Error::IllegalState(_))));
        assert!(matches!(request.send().await, Err(Error::IllegalState(_))));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_deploy_service_requires_class_path() {
        let transport = Arc::new(LocalTransport::default());
        let service = ServiceName::new(&container(), "Evio").unwrap();

        let result = DeployServiceRequest::new(transport.clone(), "orch", service, " ");
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_deploy_service_rejects_separator_in_class_path() {
        let transport = Arc::new(LocalTransport::default());
        let service = ServiceName::new(&container(), "Evio").unwrap();

        let result = DeployServiceRequest::new(transport.clone(), "orch", service, "org.jlab?Evio");
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_deploy_service_payload() {
        let transport = Arc::new(LocalTransport::default());
        let service = ServiceName::new(&container(), "Evio").unwrap();
        let mut request =
            DeployServiceRequest::new(transport.clone(), "orch", service.clone(), "org.jlab.clas.Evio").unwrap();
        request.with_pool_size(3).unwrap();
        request.send().await.unwrap();

        let published = transport.last_published().unwrap();
        assert_eq!(published.target.canonical_name(), "10.1.1.1:7771_java");
        assert_eq!(
            published.message.as_text(),
            Some("deployService?10.1.1.1:7771_java:master:Evio?org.jlab.clas.Evio?3?")
        );
    }
}
