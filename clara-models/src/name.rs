//! Canonical names for the DPE / container / service hierarchy
//!
//! Canonical forms:
//! - DPE: `<host>:<port>_<lang>`
//! - Container: `<dpe-canonical>:<container-id>`
//! - Service: `<container-canonical>:<engine-id>`
//!
//! The short DPE form `<host>_<lang>` is accepted on input and resolves to the
//! language's default port. Rendering always uses the full form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::descriptor::ProxyAddress;
use crate::lang::ClaraLang;

/// Characters that may never appear inside a host or local id.
///
/// `:` separates levels, `?` separates control fields, `+`/`;` belong to the
/// composition grammar and `#` to subscription keys.
const RESERVED: &[char] = &[':', '?', '+', ';', '#'];

/// Malformed canonical name or name component
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("empty canonical name")]
    Empty,

    #[error("empty host in canonical name '{0}'")]
    EmptyHost(String),

    #[error("unknown language tag '{0}'")]
    UnknownLang(String),

    #[error("invalid port '{port}' in canonical name '{name}'")]
    InvalidPort { name: String, port: String },

    #[error("invalid identifier '{id}': {reason}")]
    InvalidId { id: String, reason: &'static str },

    #[error("malformed canonical name '{name}': {reason}")]
    Malformed { name: String, reason: String },
}

fn validate_id(id: &str) -> Result<(), NameError> {
    if id.is_empty() {
        return Err(NameError::InvalidId {
            id: id.to_string(),
            reason: "identifier is empty",
        });
    }
    if id.chars().any(char::is_whitespace) {
        return Err(NameError::InvalidId {
            id: id.to_string(),
            reason: "identifier contains whitespace",
        });
    }
    if id.contains(RESERVED) {
        return Err(NameError::InvalidId {
            id: id.to_string(),
            reason: "identifier contains a reserved character",
        });
    }
    Ok(())
}

/// Behaviour shared by every level of the hierarchy
pub trait ClaraName {
    /// Full canonical string
    fn canonical_name(&self) -> &str;

    /// DPE that owns (or is) this component
    fn dpe(&self) -> &DpeName;

    fn host(&self) -> &str {
        self.dpe().host()
    }

    fn port(&self) -> u16 {
        self.dpe().port()
    }

    fn lang(&self) -> ClaraLang {
        self.dpe().lang()
    }
}

// ============================================================================
// DPE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DpeName {
    host: String,
    port: u16,
    lang: ClaraLang,
    canonical: String,
}

impl DpeName {
    /// DPE on the default port of its language
    pub fn new(host: impl Into<String>, lang: ClaraLang) -> Result<Self, NameError> {
        Self::with_port(host, lang.default_port(), lang)
    }

    pub fn with_port(host: impl Into<String>, port: u16, lang: ClaraLang) -> Result<Self, NameError> {
        let host = host.into();
        if host.is_empty() {
            return Err(NameError::EmptyHost(format!(":{}_{}", port, lang)));
        }
        validate_id(&host)?;
        if port == 0 {
            return Err(NameError::InvalidPort {
                name: format!("{}:{}_{}", host, port, lang),
                port: port.to_string(),
            });
        }
        let canonical = format!("{}:{}_{}", host, port, lang);
        Ok(Self { host, port, lang, canonical })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn lang(&self) -> ClaraLang {
        self.lang
    }

    pub fn canonical_name(&self) -> &str {
        &self.canonical
    }

    /// Proxy the DPE listens on
    pub fn address(&self) -> ProxyAddress {
        ProxyAddress::new(self.host.clone(), self.port)
    }
}

impl ClaraName for DpeName {
    fn canonical_name(&self) -> &str {
        &self.canonical
    }

    fn dpe(&self) -> &DpeName {
        self
    }
}

impl FromStr for DpeName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (dpe, rest) = split_dpe(s)?;
        if !rest.is_empty() {
            return Err(NameError::Malformed {
                name: s.to_string(),
                reason: format!("expected a DPE name, found {} extra segment(s)", rest.len()),
            });
        }
        Ok(dpe)
    }
}

/// Splits off the DPE part of a canonical name, returning the remaining local ids.
fn split_dpe(s: &str) -> Result<(DpeName, Vec<&str>), NameError> {
    if s.trim().is_empty() {
        return Err(NameError::Empty);
    }
    let segments: Vec<&str> = s.split(':').collect();

    // Full form wins when the second segment is a port_lang pair, so hosts may
    // themselves end in a language suffix
    if let Some((port, lang)) = segments.get(1).and_then(|segment| parse_port_lang(segment)) {
        if segments[0].is_empty() {
            return Err(NameError::EmptyHost(s.to_string()));
        }
        let dpe = DpeName::with_port(segments[0], port, lang)?;
        return Ok((dpe, segments[2..].to_vec()));
    }

    // Short form: host_lang
    if let Some((host, lang)) = segments[0].rsplit_once('_') {
        if let Ok(lang) = lang.parse::<ClaraLang>() {
            if host.is_empty() {
                return Err(NameError::EmptyHost(s.to_string()));
            }
            let dpe = DpeName::new(host, lang)?;
            return Ok((dpe, segments[1..].to_vec()));
        }
    }

    // Full form: host:port_lang
    let Some(port_lang) = segments.get(1) else {
        return Err(NameError::Malformed {
            name: s.to_string(),
            reason: "missing language tag".to_string(),
        });
    };
    let Some((port, lang)) = port_lang.split_once('_') else {
        return Err(NameError::Malformed {
            name: s.to_string(),
            reason: "expected '<port>_<lang>' after the host".to_string(),
        });
    };
    if segments[0].is_empty() {
        return Err(NameError::EmptyHost(s.to_string()));
    }
    let port: u16 = port.parse().map_err(|_| NameError::InvalidPort {
        name: s.to_string(),
        port: port.to_string(),
    })?;
    let lang = lang.parse::<ClaraLang>()?;
    let dpe = DpeName::with_port(segments[0], port, lang)?;
    Ok((dpe, segments[2..].to_vec()))
}

fn parse_port_lang(segment: &str) -> Option<(u16, ClaraLang)> {
    let (port, lang) = segment.split_once('_')?;
    Some((port.parse().ok()?, lang.parse().ok()?))
}

// ============================================================================
// Container
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContainerName {
    dpe: DpeName,
    id: String,
    canonical: String,
}

impl ContainerName {
    pub fn new(dpe: &DpeName, id: impl Into<String>) -> Result<Self, NameError> {
        let id = id.into();
        validate_id(&id)?;
        let canonical = format!("{}:{}", dpe.canonical_name(), id);
        Ok(Self {
            dpe: dpe.clone(),
            id,
            canonical,
        })
    }

    /// Local container id
    pub fn name(&self) -> &str {
        &self.id
    }

    pub fn canonical_name(&self) -> &str {
        &self.canonical
    }
}

impl ClaraName for ContainerName {
    fn canonical_name(&self) -> &str {
        &self.canonical
    }

    fn dpe(&self) -> &DpeName {
        &self.dpe
    }
}

impl FromStr for ContainerName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (dpe, rest) = split_dpe(s)?;
        match rest.as_slice() {
            [id] => ContainerName::new(&dpe, *id),
            _ => Err(NameError::Malformed {
                name: s.to_string(),
                reason: format!("expected one container segment, found {}", rest.len()),
            }),
        }
    }
}

// ============================================================================
// Service
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceName {
    container: ContainerName,
    engine: String,
    canonical: String,
}

impl ServiceName {
    pub fn new(container: &ContainerName, engine: impl Into<String>) -> Result<Self, NameError> {
        let engine = engine.into();
        validate_id(&engine)?;
        let canonical = format!("{}:{}", container.canonical_name(), engine);
        Ok(Self {
            container: container.clone(),
            engine,
            canonical,
        })
    }

    pub fn container(&self) -> &ContainerName {
        &self.container
    }

    /// Engine id
    pub fn name(&self) -> &str {
        &self.engine
    }

    pub fn canonical_name(&self) -> &str {
        &self.canonical
    }
}

impl ClaraName for ServiceName {
    fn canonical_name(&self) -> &str {
        &self.canonical
    }

    fn dpe(&self) -> &DpeName {
        self.container.dpe()
    }
}

impl FromStr for ServiceName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (dpe, rest) = split_dpe(s)?;
        match rest.as_slice() {
            [container, engine] => {
                let container = ContainerName::new(&dpe, *container)?;
                ServiceName::new(&container, *engine)
            }
            _ => Err(NameError::Malformed {
                name: s.to_string(),
                reason: format!("expected container and engine segments, found {}", rest.len()),
            }),
        }
    }
}

// ============================================================================
// Any level
// ============================================================================

/// A canonical name of any level, as found in free-form input
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CanonicalName {
    Dpe(DpeName),
    Container(ContainerName),
    Service(ServiceName),
}

impl CanonicalName {
    pub fn canonical_name(&self) -> &str {
        match self {
            CanonicalName::Dpe(n) => n.canonical_name(),
            CanonicalName::Container(n) => n.canonical_name(),
            CanonicalName::Service(n) => n.canonical_name(),
        }
    }

    pub fn dpe(&self) -> &DpeName {
        match self {
            CanonicalName::Dpe(n) => n,
            CanonicalName::Container(n) => n.dpe(),
            CanonicalName::Service(n) => ClaraName::dpe(n),
        }
    }
}

impl ClaraName for CanonicalName {
    fn canonical_name(&self) -> &str {
        CanonicalName::canonical_name(self)
    }

    fn dpe(&self) -> &DpeName {
        CanonicalName::dpe(self)
    }
}

impl FromStr for CanonicalName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (dpe, rest) = split_dpe(s)?;
        match rest.as_slice() {
            [] => Ok(CanonicalName::Dpe(dpe)),
            [container] => Ok(CanonicalName::Container(ContainerName::new(&dpe, *container)?)),
            [container, engine] => {
                let container = ContainerName::new(&dpe, *container)?;
                Ok(CanonicalName::Service(ServiceName::new(&container, *engine)?))
            }
            _ => Err(NameError::Malformed {
                name: s.to_string(),
                reason: format!("too many segments ({})", rest.len()),
            }),
        }
    }
}

impl From<DpeName> for CanonicalName {
    fn from(name: DpeName) -> Self {
        CanonicalName::Dpe(name)
    }
}

impl From<ContainerName> for CanonicalName {
    fn from(name: ContainerName) -> Self {
        CanonicalName::Container(name)
    }
}

impl From<ServiceName> for CanonicalName {
    fn from(name: ServiceName) -> Self {
        CanonicalName::Service(name)
    }
}

/// Resolves the DPE that owns the component named by `canonical_name`
pub fn owning_dpe(canonical_name: &str) -> Result<DpeName, NameError> {
    Ok(canonical_name.parse::<CanonicalName>()?.dpe().clone())
}

macro_rules! string_conversions {
    ($($ty:ty),*) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.canonical_name())
                }
            }

            impl TryFrom<String> for $ty {
                type Error = NameError;

                fn try_from(value: String) -> Result<Self, Self::Error> {
                    value.parse()
                }
            }

            impl From<$ty> for String {
                fn from(value: $ty) -> String {
                    value.canonical_name().to_string()
                }
            }
        )*
    };
}

string_conversions!(DpeName, ContainerName, ServiceName, CanonicalName);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dpe_canonical_form() {
        let dpe = DpeName::new("10.1.1.1", ClaraLang::Java).unwrap();
        assert_eq!(dpe.canonical_name(), "10.1.1.1:7771_java");

        let dpe = DpeName::with_port("node1", 9000, ClaraLang::Cpp).unwrap();
        assert_eq!(dpe.canonical_name(), "node1:9000_cpp");
    }

    #[test]
    fn test_short_and_full_forms_are_equal() {
        let short: DpeName = "10.1.1.1_java".parse().unwrap();
        let full: DpeName = "10.1.1.1:7771_java".parse().unwrap();
        assert_eq!(short, full);
        assert_eq!(short.port(), 7771);
    }

    #[test]
    fn test_service_name_parts() {
        let service: ServiceName = "10.1.1.1_java:master:engine1".parse().unwrap();
        assert_eq!(service.canonical_name(), "10.1.1.1:7771_java:master:engine1");
        assert_eq!(service.name(), "engine1");
        assert_eq!(service.container().name(), "master");
        assert_eq!(service.host(), "10.1.1.1");
        assert_eq!(service.lang(), ClaraLang::Java);
    }

    #[test]
    fn test_full_form_service_parses() {
        let service: ServiceName = "node1:9000_python:c1:S1".parse().unwrap();
        assert_eq!(service.port(), 9000);
        assert_eq!(service.lang(), ClaraLang::Python);
        assert_eq!(service.container().canonical_name(), "node1:9000_python:c1");
    }

    #[test]
    fn test_host_with_underscore_in_full_form() {
        let dpe: DpeName = "my_host:7771_java".parse().unwrap();
        assert_eq!(dpe.host(), "my_host");
    }

    #[test]
    fn test_host_ending_in_lang_suffix_uses_full_form() {
        let parsed: CanonicalName = "node_java:7771_java".parse().unwrap();
        match parsed {
            CanonicalName::Dpe(dpe) => {
                assert_eq!(dpe.host(), "node_java");
                assert_eq!(dpe.port(), 7771);
            }
            other => panic!("expected a DPE, got {:?}", other),
        }

        let service: ServiceName = "node_java:7771_java:master:S1".parse().unwrap();
        assert_eq!(owning_dpe(service.canonical_name()).unwrap().canonical_name(), "node_java:7771_java");
    }

    #[test]
    fn test_wrong_segment_count_is_rejected() {
        assert!("10.1.1.1_java:master".parse::<ServiceName>().is_err());
        assert!("10.1.1.1_java:master:engine1".parse::<ContainerName>().is_err());
        assert!("10.1.1.1_java:a:b:c".parse::<CanonicalName>().is_err());
        assert!("10.1.1.1_java:master".parse::<DpeName>().is_err());
    }

    #[test]
    fn test_empty_host_is_rejected() {
        assert_eq!(
            "_java".parse::<DpeName>(),
            Err(NameError::EmptyHost("_java".to_string()))
        );
        assert!(matches!(
            ":7771_java".parse::<DpeName>(),
            Err(NameError::EmptyHost(_))
        ));
        assert_eq!("".parse::<DpeName>(), Err(NameError::Empty));
    }

    #[test]
    fn test_bad_port_and_lang_are_rejected() {
        assert!(matches!(
            "host:port_java".parse::<DpeName>(),
            Err(NameError::InvalidPort { .. })
        ));
        assert!(matches!(
            "host:7771_rust".parse::<DpeName>(),
            Err(NameError::UnknownLang(_))
        ));
        assert!("host".parse::<DpeName>().is_err());
    }

    #[test]
    fn test_ids_with_reserved_characters_are_rejected() {
        let dpe = DpeName::new("localhost", ClaraLang::Java).unwrap();
        assert!(ContainerName::new(&dpe, "").is_err());
        assert!(ContainerName::new(&dpe, "a b").is_err());
        assert!(ContainerName::new(&dpe, "a?b").is_err());
        assert!(ContainerName::new(&dpe, "a+b").is_err());
    }

    #[test]
    fn test_owning_dpe_is_idempotent() {
        for name in [
            "10.1.1.1_java",
            "10.1.1.1_java:master",
            "10.1.1.1_java:master:engine1",
            "node1:9000_cpp:c1:S1",
        ] {
            let dpe = owning_dpe(name).unwrap();
            let again = owning_dpe(dpe.canonical_name()).unwrap();
            assert_eq!(dpe, again);
        }
    }

    #[test]
    fn test_canonical_name_dispatches_on_segment_count() {
        assert!(matches!(
            "10.1.1.1_java".parse::<CanonicalName>().unwrap(),
            CanonicalName::Dpe(_)
        ));
        assert!(matches!(
            "10.1.1.1_java:master".parse::<CanonicalName>().unwrap(),
            CanonicalName::Container(_)
        ));
        assert!(matches!(
            "10.1.1.1_java:master:engine1".parse::<CanonicalName>().unwrap(),
            CanonicalName::Service(_)
        ));
    }

    #[test]
    fn test_names_serialize_as_canonical_strings() {
        let service: ServiceName = "10.1.1.1_java:master:engine1".parse().unwrap();
        let json = serde_json::to_string(&service).unwrap();
        assert_eq!(json, "\"10.1.1.1:7771_java:master:engine1\"");

        let parsed: ServiceName = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, service);

        assert!(serde_json::from_str::<DpeName>("\"bogus\"").is_err());
    }
}
