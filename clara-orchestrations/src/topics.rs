//! Topic construction
//!
//! Every topic this crate publishes or subscribes to is built here. The domain
//! is a report kind or a control domain from [`crate::names::topics`], the
//! subject is the DPE canonical name and the type carries the remaining local
//! ids of a container or service.

use clara_models::{
    CanonicalName, ClaraName, ContainerName, DpeName, EngineStatus, ReportKind, ServiceName, Topic,
};

use crate::error::Result;
use crate::names::{topics, MAPKEY_SEP};

pub fn report_domain(kind: ReportKind) -> &'static str {
    match kind {
        ReportKind::Done => topics::DONE,
        ReportKind::Data => topics::DATA,
        ReportKind::Status(EngineStatus::Warning) => topics::WARNING,
        ReportKind::Status(EngineStatus::Error) => topics::ERROR,
        ReportKind::Status(EngineStatus::Info) => topics::INFO,
    }
}

fn with_name(domain: &str, name: &CanonicalName) -> Topic {
    let topic = Topic::build(domain).with_subject(name.dpe().canonical_name());
    match name {
        CanonicalName::Dpe(_) => topic,
        CanonicalName::Container(container) => topic.with_type(container.name()),
        CanonicalName::Service(service) => {
            topic.with_type(format!("{}:{}", service.container().name(), service.name()))
        }
    }
}

/// Control topic of a DPE
pub fn dpe_topic(dpe: &DpeName) -> Topic {
    with_name(topics::DPE, &CanonicalName::Dpe(dpe.clone()))
}

/// Control topic of a container
pub fn container_topic(container: &ContainerName) -> Topic {
    with_name(topics::CONTAINER, &CanonicalName::Container(container.clone()))
}

/// Request topic of a service (configure, execute, report settings)
pub fn service_topic(service: &ServiceName) -> Topic {
    with_name(topics::SERVICE, &CanonicalName::Service(service.clone()))
}

/// Control topic for a name of any level
pub fn control_topic(name: &CanonicalName) -> Topic {
    let domain = match name {
        CanonicalName::Dpe(_) => topics::DPE,
        CanonicalName::Container(_) => topics::CONTAINER,
        CanonicalName::Service(_) => topics::SERVICE,
    };
    with_name(domain, name)
}

/// Topic a service publishes `kind` reports on
pub fn report_topic(kind: ReportKind, service: &ServiceName) -> Topic {
    with_name(report_domain(kind), &CanonicalName::Service(service.clone()))
}

/// Same as [`report_topic`], from a canonical string
pub fn report_topic_for(kind: ReportKind, service_canonical_name: &str) -> Result<Topic> {
    let service: ServiceName = service_canonical_name.parse()?;
    Ok(report_topic(kind, &service))
}

/// Liveness broadcast; no subject, so it matches every DPE reporting to a proxy
pub fn alive_topic() -> Topic {
    Topic::build(topics::DPE_ALIVE)
}

/// Registrar pattern matching every DPE
pub fn dpes_pattern() -> Topic {
    Topic::build(topics::DPE)
}

/// Registrar pattern matching every container of `dpe`
pub fn containers_pattern(dpe: &DpeName) -> Topic {
    Topic::build(topics::CONTAINER).with_subject(dpe.canonical_name())
}

/// Registrar pattern matching every service of `container`
pub fn services_pattern(container: &ContainerName) -> Topic {
    Topic::build(topics::SERVICE)
        .with_subject(container.dpe().canonical_name())
        .with_type(container.name())
}

/// Registry key of a subscription: `<host>#<topic>`
pub fn subscription_key(host: &str, topic: &Topic) -> String {
    format!("{}{}{}", host, MAPKEY_SEP, topic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::collections::HashSet;

    fn service() -> ServiceName {
        "10.1.1.1_java:master:engine1".parse().unwrap()
    }

    #[test]
    fn test_report_topics() {
        let service = service();
        assert_eq!(
            report_topic(ReportKind::Done, &service).to_string(),
            "done:10.1.1.1:7771_java:master:engine1"
        );
        assert_eq!(
            report_topic(ReportKind::Status(EngineStatus::Error), &service).to_string(),
            "error:10.1.1.1:7771_java:master:engine1"
        );
    }

    #[test]
    fn test_control_topics_by_level() {
        let service = service();
        assert_eq!(dpe_topic(service.dpe()).to_string(), "dpe:10.1.1.1:7771_java");
        assert_eq!(
            container_topic(service.container()).to_string(),
            "container:10.1.1.1:7771_java:master"
        );
        assert_eq!(
            control_topic(&CanonicalName::Service(service.clone())),
            service_topic(&service)
        );
    }

    #[test]
    fn test_report_topics_never_collide() {
        let names = [
            "10.1.1.1_java:master:engine1",
            "10.1.1.1_java:master:engine2",
            "10.1.1.1_cpp:master:engine1",
            "10.1.1.2_java:master:engine1",
            "10.1.1.1_java:slave:engine1",
        ];
        let kinds = [
            ReportKind::Done,
            ReportKind::Data,
            ReportKind::Status(EngineStatus::Warning),
            ReportKind::Status(EngineStatus::Error),
        ];

        let mut seen = HashSet::new();
        for name in names {
            for kind in kinds {
                let topic = report_topic_for(kind, name).unwrap().to_string();
                assert!(seen.insert(topic.clone()), "collision on {}", topic);
            }
        }
        assert!(seen.insert(alive_topic().to_string()));
    }

    #[test]
    fn test_malformed_name_is_an_addressing_error() {
        assert!(matches!(
            report_topic_for(ReportKind::Done, "10.1.1.1_java:master"),
            Err(Error::Addressing(_))
        ));
        assert!(matches!(
            report_topic_for(ReportKind::Data, ":7771_java:c:e"),
            Err(Error::Addressing(_))
        ));
    }

    #[test]
    fn test_discovery_patterns_cover_registrations() {
        let service = service();
        assert!(dpes_pattern().is_parent_of(&dpe_topic(service.dpe())));
        assert!(containers_pattern(service.dpe()).is_parent_of(&container_topic(service.container())));
        assert!(services_pattern(service.container()).is_parent_of(&service_topic(&service)));
        assert!(!services_pattern(service.container()).is_parent_of(&container_topic(service.container())));
    }

    #[test]
    fn test_subscription_key_format() {
        let service = service();
        let key = subscription_key(service.host(), &report_topic(ReportKind::Data, &service));
        assert_eq!(key, "10.1.1.1#data:10.1.1.1:7771_java:master:engine1");
    }
}
