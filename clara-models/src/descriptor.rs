use serde::{Deserialize, Serialize};
use std::fmt;

use crate::lang::ClaraLang;
use crate::name::{ClaraName, ContainerName, DpeName, ServiceName};

/// Default number of background workers processing subscriptions
pub const DEFAULT_POOL_SIZE: usize = 2;

/// Host and port of a DPE proxy
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProxyAddress {
    pub host: String,
    pub port: u16,
}

impl ProxyAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for ProxyAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Role of an addressable actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Orchestrator,
    Dpe,
    Container,
    Service,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Orchestrator => "orchestrator",
            Role::Dpe => "dpe",
            Role::Container => "container",
            Role::Service => "service",
        };
        f.write_str(s)
    }
}

/// An orchestrator is not part of the DPE hierarchy, it only owns a proxy connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrchestratorDescriptor {
    pub name: String,
    pub address: ProxyAddress,
    pub lang: ClaraLang,
    pub pool_size: usize,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DpeDescriptor {
    pub name: DpeName,
    pub pool_size: usize,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerDescriptor {
    pub name: ContainerName,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub name: ServiceName,
    pub description: String,
}

/// The routing target of a request
///
/// Containers and services are reached through the proxy of their DPE, so
/// [`ComponentDescriptor::address`] always resolves to a DPE host/port (or the
/// orchestrator's own proxy). Pool size only exists for the DPE and
/// orchestrator roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ComponentDescriptor {
    Orchestrator(OrchestratorDescriptor),
    Dpe(DpeDescriptor),
    Container(ContainerDescriptor),
    Service(ServiceDescriptor),
}

impl ComponentDescriptor {
    pub fn orchestrator(
        name: impl Into<String>,
        address: ProxyAddress,
        pool_size: usize,
        description: impl Into<String>,
    ) -> Self {
        ComponentDescriptor::Orchestrator(OrchestratorDescriptor {
            name: name.into(),
            address,
            lang: ClaraLang::Java,
            pool_size,
            description: description.into(),
        })
    }

    pub fn dpe(name: &DpeName) -> Self {
        ComponentDescriptor::Dpe(DpeDescriptor {
            name: name.clone(),
            pool_size: DEFAULT_POOL_SIZE,
            description: String::new(),
        })
    }

    pub fn container(name: &ContainerName) -> Self {
        ComponentDescriptor::Container(ContainerDescriptor {
            name: name.clone(),
            description: String::new(),
        })
    }

    pub fn service(name: &ServiceName) -> Self {
        ComponentDescriptor::Service(ServiceDescriptor {
            name: name.clone(),
            description: String::new(),
        })
    }

    pub fn role(&self) -> Role {
        match self {
            ComponentDescriptor::Orchestrator(_) => Role::Orchestrator,
            ComponentDescriptor::Dpe(_) => Role::Dpe,
            ComponentDescriptor::Container(_) => Role::Container,
            ComponentDescriptor::Service(_) => Role::Service,
        }
    }

    pub fn canonical_name(&self) -> &str {
        match self {
            ComponentDescriptor::Orchestrator(d) => &d.name,
            ComponentDescriptor::Dpe(d) => d.name.canonical_name(),
            ComponentDescriptor::Container(d) => d.name.canonical_name(),
            ComponentDescriptor::Service(d) => d.name.canonical_name(),
        }
    }

    /// Proxy through which the component is reached
    pub fn address(&self) -> ProxyAddress {
        match self {
            ComponentDescriptor::Orchestrator(d) => d.address.clone(),
            ComponentDescriptor::Dpe(d) => d.name.address(),
            ComponentDescriptor::Container(d) => d.name.dpe().address(),
            ComponentDescriptor::Service(d) => d.name.dpe().address(),
        }
    }

    pub fn host(&self) -> &str {
        match self {
            ComponentDescriptor::Orchestrator(d) => &d.address.host,
            ComponentDescriptor::Dpe(d) => d.name.host(),
            ComponentDescriptor::Container(d) => d.name.host(),
            ComponentDescriptor::Service(d) => d.name.host(),
        }
    }

    pub fn port(&self) -> u16 {
        self.address().port
    }

    pub fn lang(&self) -> ClaraLang {
        match self {
            ComponentDescriptor::Orchestrator(d) => d.lang,
            ComponentDescriptor::Dpe(d) => d.name.lang(),
            ComponentDescriptor::Container(d) => d.name.lang(),
            ComponentDescriptor::Service(d) => d.name.lang(),
        }
    }

    /// Only meaningful for DPEs and orchestrators
    pub fn pool_size(&self) -> Option<usize> {
        match self {
            ComponentDescriptor::Orchestrator(d) => Some(d.pool_size),
            ComponentDescriptor::Dpe(d) => Some(d.pool_size),
            ComponentDescriptor::Container(_) | ComponentDescriptor::Service(_) => None,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            ComponentDescriptor::Orchestrator(d) => &d.description,
            ComponentDescriptor::Dpe(d) => &d.description,
            ComponentDescriptor::Container(d) => &d.description,
            ComponentDescriptor::Service(d) => &d.description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_descriptor_resolves_to_dpe_proxy() {
        let service: ServiceName = "10.1.1.1_java:master:engine1".parse().unwrap();
        let descriptor = ComponentDescriptor::service(&service);

        assert_eq!(descriptor.role(), Role::Service);
        assert_eq!(descriptor.address(), ProxyAddress::new("10.1.1.1", 7771));
        assert_eq!(descriptor.pool_size(), None);
    }

    #[test]
    fn test_dpe_descriptor_has_pool_size() {
        let dpe: DpeName = "node1_python".parse().unwrap();
        let descriptor = ComponentDescriptor::dpe(&dpe);

        assert_eq!(descriptor.pool_size(), Some(DEFAULT_POOL_SIZE));
        assert_eq!(descriptor.port(), 7791);
        assert_eq!(descriptor.canonical_name(), "node1:7791_python");
    }

    #[test]
    fn test_descriptor_serialization_is_tagged_by_role() {
        let container: ContainerName = "10.1.1.1_java:master".parse().unwrap();
        let descriptor = ComponentDescriptor::container(&container);

        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["role"], "container");
        assert_eq!(json["name"], "10.1.1.1:7771_java:master");

        let parsed: ComponentDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, descriptor);
    }
}
