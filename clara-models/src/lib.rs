//! Value types shared by the orchestration layer: canonical names, component
//! descriptors, topics and report kinds.

pub mod composition;
pub mod descriptor;
pub mod lang;
pub mod name;
pub mod report;
pub mod topic;

pub use composition::Composition;
pub use descriptor::{
    ComponentDescriptor, ContainerDescriptor, DpeDescriptor, OrchestratorDescriptor,
    ProxyAddress, Role, ServiceDescriptor, DEFAULT_POOL_SIZE,
};
pub use lang::ClaraLang;
pub use name::{
    owning_dpe, CanonicalName, ClaraName, ContainerName, DpeName, NameError, ServiceName,
};
pub use report::{EngineStatus, OwnerType, RegistrationRecord, ReportKind, ReportType};
pub use topic::Topic;
