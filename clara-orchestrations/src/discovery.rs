//! Registrar queries
//!
//! Each listing asks the registrar for registrants under a wildcard topic of
//! increasing specificity and returns the names as an unordered set.

use std::collections::HashSet;
use std::sync::Arc;

use clara_models::{CanonicalName, ComponentDescriptor, ContainerName, DpeName, RegistrationRecord, Topic};
use tracing::debug;

use crate::error::Result;
use crate::topics::{containers_pattern, control_topic, dpes_pattern, services_pattern};
use crate::transport::Transport;

/// Splits a registrar reply on whitespace; an empty reply is an empty set
pub fn parse_names(raw: &str) -> HashSet<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

pub struct Discovery {
    transport: Arc<dyn Transport>,
    registrar: ComponentDescriptor,
}

impl Discovery {
    pub fn new(transport: Arc<dyn Transport>, registrar: ComponentDescriptor) -> Self {
        Self { transport, registrar }
    }

    pub fn registrar(&self) -> &ComponentDescriptor {
        &self.registrar
    }

    async fn names(&self, pattern: Topic) -> Result<HashSet<String>> {
        let raw = self.transport.query_registrant_names(&self.registrar, &pattern).await?;
        let names = parse_names(&raw);
        debug!(pattern = %pattern, found = names.len(), "Queried registrar");
        Ok(names)
    }

    pub async fn list_dpes(&self) -> Result<HashSet<String>> {
        self.names(dpes_pattern()).await
    }

    pub async fn list_containers(&self, dpe: &DpeName) -> Result<HashSet<String>> {
        self.names(containers_pattern(dpe)).await
    }

    pub async fn list_services(&self, container: &ContainerName) -> Result<HashSet<String>> {
        self.names(services_pattern(container)).await
    }

    /// Full registration records of the component `name`
    pub async fn registration_info(&self, name: &CanonicalName) -> Result<HashSet<RegistrationRecord>> {
        let records = self
            .transport
            .query_registration_records(&self.registrar, &control_topic(name))
            .await?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topics::{container_topic, dpe_topic, service_topic};
    use crate::transport::LocalTransport;
    use clara_models::{ClaraLang, ClaraName, OwnerType, ServiceName};

    fn record(name: &str, topic: Topic) -> RegistrationRecord {
        RegistrationRecord {
            name: name.to_string(),
            host: "10.1.1.1".to_string(),
            port: 7771,
            topic,
            owner: OwnerType::Subscriber,
            description: String::new(),
        }
    }

    fn populated() -> (Arc<LocalTransport>, Discovery) {
        let transport = Arc::new(LocalTransport::default());
        let engine1: ServiceName = "10.1.1.1_java:master:engine1".parse().unwrap();
        let engine2: ServiceName = "10.1.1.1_java:master:engine2".parse().unwrap();
        let other: ServiceName = "10.1.1.2_java:slave:engine1".parse().unwrap();

        for service in [&engine1, &engine2, &other] {
            transport.register(record(service.canonical_name(), service_topic(service)));
            transport.register(record(
                service.container().canonical_name(),
                container_topic(service.container()),
            ));
            transport.register(record(
                service.container().dpe().canonical_name(),
                dpe_topic(service.container().dpe()),
            ));
        }

        let registrar = DpeName::new("10.1.1.1", ClaraLang::Java).unwrap();
        let discovery = Discovery::new(transport.clone(), ComponentDescriptor::dpe(&registrar));
        (transport, discovery)
    }

    #[test]
    fn test_parse_names_tolerates_blank_replies() {
        assert!(parse_names("").is_empty());
        assert!(parse_names("  \n ").is_empty());
        assert_eq!(parse_names("a b  a\tc").len(), 3);
    }

    #[tokio::test]
    async fn test_listings_by_level() {
        let (_transport, discovery) = populated();

        let dpes = discovery.list_dpes().await.unwrap();
        assert_eq!(
            dpes,
            HashSet::from(["10.1.1.1:7771_java".to_string(), "10.1.1.2:7771_java".to_string()])
        );

        let dpe: DpeName = "10.1.1.1_java".parse().unwrap();
        let containers = discovery.list_containers(&dpe).await.unwrap();
        assert_eq!(containers, HashSet::from(["10.1.1.1:7771_java:master".to_string()]));

        let container: ContainerName = "10.1.1.1_java:master".parse().unwrap();
        let services = discovery.list_services(&container).await.unwrap();
        assert_eq!(services.len(), 2);
        assert!(services.contains("10.1.1.1:7771_java:master:engine2"));
    }

    #[tokio::test]
    async fn test_empty_registrar_gives_empty_sets() {
        let transport = Arc::new(LocalTransport::default());
        let registrar = DpeName::new("10.1.1.1", ClaraLang::Java).unwrap();
        let discovery = Discovery::new(transport, ComponentDescriptor::dpe(&registrar));

        assert!(discovery.list_dpes().await.unwrap().is_empty());
        assert!(discovery.list_containers(&registrar).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_registration_info() {
        let (_transport, discovery) = populated();
        let name: CanonicalName = "10.1.1.1_java:master:engine1".parse().unwrap();

        let records = discovery.registration_info(&name).await.unwrap();
        assert_eq!(records.len(), 1);
        assert!(records.iter().all(|r| r.name == "10.1.1.1:7771_java:master:engine1"));
    }
}
