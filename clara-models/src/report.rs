use serde::{Deserialize, Serialize};
use std::fmt;

use crate::topic::Topic;

/// Outcome status a service attaches to an execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineStatus {
    Info,
    Warning,
    Error,
}

impl EngineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineStatus::Info => "info",
            EngineStatus::Warning => "warning",
            EngineStatus::Error => "error",
        }
    }
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reports a service can be throttled to emit every N executions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    /// Execution stats only
    Done,
    /// Full output data
    Data,
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportType::Done => f.write_str("done"),
            ReportType::Data => f.write_str("data"),
        }
    }
}

/// Kind of report a service publishes about its own execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Done,
    Data,
    Status(EngineStatus),
}

impl From<ReportType> for ReportKind {
    fn from(value: ReportType) -> Self {
        match value {
            ReportType::Done => ReportKind::Done,
            ReportType::Data => ReportKind::Data,
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportKind::Done => f.write_str("done"),
            ReportKind::Data => f.write_str("data"),
            ReportKind::Status(status) => write!(f, "status:{}", status),
        }
    }
}

/// Whether a registrant publishes or subscribes on its topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerType {
    Publisher,
    Subscriber,
}

/// An entry in the registrar
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistrationRecord {
    /// Canonical name of the registered actor
    pub name: String,
    pub host: String,
    pub port: u16,
    pub topic: Topic,
    pub owner: OwnerType,
    pub description: String,
}
