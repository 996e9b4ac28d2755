//! The orchestrator facade
//!
//! Resolves canonical names, hands request builders the shared transport and
//! owns the subscription registry of one orchestrator instance. Names are
//! accepted in canonical string form; a malformed name fails with
//! [`Error::Addressing`] before any builder exists.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use clara_models::{
    CanonicalName, ComponentDescriptor, Composition, ContainerName, DpeName, EngineStatus, ProxyAddress,
    RegistrationRecord, ReportKind, ReportType, ServiceName,
};
use tracing::{debug, info};

use crate::codec::ControlCommand;
use crate::config::OrchestratorConfig;
use crate::discovery::Discovery;
use crate::error::{Error, Result};
use crate::registry::{report_callback, text_callback, SubscriptionRegistry};
use crate::reports::ReportController;
use crate::requests::{
    control_message, DeployContainerRequest, DeployServiceRequest, ExitRequest, ServiceConfigRequest,
    ServiceExecuteRequest,
};
use crate::topics::{alive_topic, dpe_topic, report_topic};
use crate::transport::Transport;
use crate::types::{DataTypeSet, EngineData, EngineDataType};

pub struct Orchestrator {
    transport: Arc<dyn Transport>,
    config: OrchestratorConfig,
    data_types: DataTypeSet,
    registry: SubscriptionRegistry,
    reports: ReportController,
    discovery: Discovery,
}

impl Orchestrator {
    pub fn new(transport: Arc<dyn Transport>, config: OrchestratorConfig) -> Result<Self> {
        config.validate()?;
        let front_end = ComponentDescriptor::dpe(&config.front_end);
        let orchestrator = Self {
            registry: SubscriptionRegistry::new(transport.clone()),
            reports: ReportController::new(transport.clone(), config.name.as_str()),
            discovery: Discovery::new(transport.clone(), front_end),
            data_types: DataTypeSet::with_defaults(),
            transport,
            config,
        };
        info!(
            descriptor = ?orchestrator.descriptor(),
            front_end = %orchestrator.config.front_end,
            "Orchestrator ready"
        );
        Ok(orchestrator)
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn front_end(&self) -> &DpeName {
        &self.config.front_end
    }

    /// This orchestrator as a component, reached through the front-end proxy
    pub fn descriptor(&self) -> ComponentDescriptor {
        ComponentDescriptor::orchestrator(
            self.config.name.as_str(),
            self.config.front_end.address(),
            self.config.pool_size,
            self.config.description.as_str(),
        )
    }

    // ------------------------------------------------------------------
    // Data types
    // ------------------------------------------------------------------

    pub fn register_data_types(&mut self, types: impl IntoIterator<Item = EngineDataType>) {
        self.data_types.register(types);
    }

    pub fn data_types(&self) -> &DataTypeSet {
        &self.data_types
    }

    // ------------------------------------------------------------------
    // Front end
    // ------------------------------------------------------------------

    async fn send_to_front_end(&self, command: ControlCommand) -> Result<()> {
        let target = ComponentDescriptor::dpe(&self.config.front_end);
        let message = control_message(dpe_topic(&self.config.front_end), &command)?.with_sender(self.name());
        debug!(front_end = %self.config.front_end, command = command.token(), "Sending front-end command");
        self.transport.publish(&target, message).await?;
        Ok(())
    }

    /// Asks the front end to start a DPE that registers with `registrar`
    pub async fn deploy_dpe(
        &self,
        dpe: &str,
        registrar: ProxyAddress,
        pool_size: usize,
        description: &str,
    ) -> Result<()> {
        if pool_size == 0 {
            return Err(Error::invalid_argument("pool size must be greater than zero"));
        }
        let dpe: DpeName = dpe.parse()?;
        self.send_to_front_end(ControlCommand::StartDpe {
            dpe,
            pool_size,
            registrar,
            description: description.to_string(),
        })
        .await
    }

    /// Points `dpe` at a new front end
    pub async fn set_front_end(&self, dpe: &str, front_end: &str) -> Result<()> {
        let dpe: DpeName = dpe.parse()?;
        let front_end: DpeName = front_end.parse()?;
        self.send_to_front_end(ControlCommand::SetFrontEndRemote { dpe, front_end }).await
    }

    pub async fn exit_front_end(&self) -> Result<()> {
        self.send_to_front_end(ControlCommand::StopDpe).await
    }

    /// Round trip to a DPE, returning its reply text
    pub async fn ping_dpe(&self, dpe: &str, timeout: Option<Duration>) -> Result<String> {
        let dpe: DpeName = dpe.parse()?;
        let timeout = timeout.unwrap_or(self.config.sync_timeout);
        let message = control_message(dpe_topic(&dpe), &ControlCommand::PingDpe)?.with_sender(self.name());
        let reply = self
            .transport
            .sync_publish(&ComponentDescriptor::dpe(&dpe), message, timeout)
            .await?;
        reply
            .as_text()
            .map(str::to_string)
            .ok_or_else(|| Error::Serialization(format!("ping reply from {} is not text", dpe)))
    }

    // ------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------

    pub fn deploy_container(&self, container: &str) -> Result<DeployContainerRequest> {
        let container: ContainerName = container.parse()?;
        Ok(DeployContainerRequest::new(self.transport.clone(), self.name(), container))
    }

    pub fn deploy_service(&self, service: &str, class_path: &str) -> Result<DeployServiceRequest> {
        let service: ServiceName = service.parse()?;
        DeployServiceRequest::new(self.transport.clone(), self.name(), service, class_path)
    }

    /// Stops a DPE or removes a container or service, whichever `name` is
    pub fn exit(&self, name: &str) -> Result<ExitRequest> {
        let name: CanonicalName = name.parse()?;
        Ok(ExitRequest::new(self.transport.clone(), self.name(), name))
    }

    pub fn configure(&self, service: &str) -> Result<ServiceConfigRequest> {
        let service: ServiceName = service.parse()?;
        Ok(ServiceConfigRequest::new(
            self.transport.clone(),
            self.name(),
            service,
            self.data_types.clone(),
        ))
    }

    pub fn execute(&self, service: &str) -> Result<ServiceExecuteRequest> {
        let service: ServiceName = service.parse()?;
        Ok(ServiceExecuteRequest::new(
            self.transport.clone(),
            self.name(),
            Composition::from(service),
            self.data_types.clone(),
        ))
    }

    pub fn execute_composition(&self, composition: &str) -> Result<ServiceExecuteRequest> {
        let composition: Composition = composition.parse()?;
        Ok(ServiceExecuteRequest::new(
            self.transport.clone(),
            self.name(),
            composition,
            self.data_types.clone(),
        ))
    }

    // ------------------------------------------------------------------
    // Report throttling
    // ------------------------------------------------------------------

    pub async fn start_reporting_done(&self, service: &str, every_n: i64) -> Result<()> {
        let service: ServiceName = service.parse()?;
        self.reports.start_reporting(&service, ReportType::Done, every_n).await
    }

    pub async fn stop_reporting_done(&self, service: &str) -> Result<()> {
        let service: ServiceName = service.parse()?;
        self.reports.stop_reporting(&service, ReportType::Done).await
    }

    pub async fn start_reporting_data(&self, service: &str, every_n: i64) -> Result<()> {
        let service: ServiceName = service.parse()?;
        self.reports.start_reporting(&service, ReportType::Data, every_n).await
    }

    pub async fn stop_reporting_data(&self, service: &str) -> Result<()> {
        let service: ServiceName = service.parse()?;
        self.reports.stop_reporting(&service, ReportType::Data).await
    }

    // ------------------------------------------------------------------
    // Listeners
    // ------------------------------------------------------------------

    async fn listen_reports<F>(&self, service: &str, kind: ReportKind, callback: F) -> Result<String>
    where
        F: Fn(EngineData) + Send + Sync + 'static,
    {
        let service: ServiceName = service.parse()?;
        let callback = report_callback(kind, self.data_types.clone(), callback);
        self.registry
            .listen(&ComponentDescriptor::service(&service), report_topic(kind, &service), callback)
            .await
    }

    async fn unlisten_reports(&self, service: &str, kind: ReportKind) -> Result<()> {
        let service: ServiceName = service.parse()?;
        self.registry
            .unlisten(&ComponentDescriptor::service(&service), &report_topic(kind, &service))
            .await
    }

    /// Status reports of one severity published by `service`
    pub async fn listen_service_status<F>(&self, service: &str, status: EngineStatus, callback: F) -> Result<String>
    where
        F: Fn(EngineData) + Send + Sync + 'static,
    {
        self.listen_reports(service, ReportKind::Status(status), callback).await
    }

    pub async fn unlisten_service_status(&self, service: &str, status: EngineStatus) -> Result<()> {
        self.unlisten_reports(service, ReportKind::Status(status)).await
    }

    /// Output data, as throttled by [`Self::start_reporting_data`]
    pub async fn listen_service_data<F>(&self, service: &str, callback: F) -> Result<String>
    where
        F: Fn(EngineData) + Send + Sync + 'static,
    {
        self.listen_reports(service, ReportKind::Data, callback).await
    }

    pub async fn unlisten_service_data(&self, service: &str) -> Result<()> {
        self.unlisten_reports(service, ReportKind::Data).await
    }

    pub async fn listen_service_done<F>(&self, service: &str, callback: F) -> Result<String>
    where
        F: Fn(EngineData) + Send + Sync + 'static,
    {
        self.listen_reports(service, ReportKind::Done, callback).await
    }

    pub async fn unlisten_service_done(&self, service: &str) -> Result<()> {
        self.unlisten_reports(service, ReportKind::Done).await
    }

    /// Liveness reports of every DPE publishing through the proxy of `dpe`
    ///
    /// The key only depends on the proxy host, so one listener per host.
    pub async fn listen_dpes<F>(&self, dpe: &str, callback: F) -> Result<String>
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        let dpe: DpeName = dpe.parse()?;
        self.registry
            .listen(&ComponentDescriptor::dpe(&dpe), alive_topic(), text_callback(callback))
            .await
    }

    pub async fn unlisten_dpes(&self, dpe: &str) -> Result<()> {
        let dpe: DpeName = dpe.parse()?;
        self.registry
            .unlisten(&ComponentDescriptor::dpe(&dpe), &alive_topic())
            .await
    }

    pub async fn is_listening(&self, key: &str) -> bool {
        self.registry.contains(key).await
    }

    // ------------------------------------------------------------------
    // Discovery
    // ------------------------------------------------------------------

    pub async fn list_dpes(&self) -> Result<HashSet<String>> {
        self.discovery.list_dpes().await
    }

    pub async fn list_containers(&self, dpe: &str) -> Result<HashSet<String>> {
        let dpe: DpeName = dpe.parse()?;
        self.discovery.list_containers(&dpe).await
    }

    pub async fn list_services(&self, container: &str) -> Result<HashSet<String>> {
        let container: ContainerName = container.parse()?;
        self.discovery.list_services(&container).await
    }

    pub async fn registration_info(&self, name: &str) -> Result<HashSet<RegistrationRecord>> {
        let name: CanonicalName = name.parse()?;
        self.discovery.registration_info(&name).await
    }
}
