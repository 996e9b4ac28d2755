//! Service compositions
//!
//! A composition is written as one or more `;`-terminated statements, each a
//! `+`-separated chain of service canonical names:
//!
//! ```text
//! h_java:c:Reader+h_java:c:Filter+h_java:c:Writer;
//! ```
//!
//! Routing starts at the first service of the first statement.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::name::{NameError, ServiceName};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Composition {
    statements: Vec<Vec<ServiceName>>,
}

impl Composition {
    /// A single linear chain
    pub fn chain(services: Vec<ServiceName>) -> Result<Self, NameError> {
        if services.is_empty() {
            return Err(NameError::Malformed {
                name: String::new(),
                reason: "composition has no services".to_string(),
            });
        }
        Ok(Self {
            statements: vec![services],
        })
    }

    /// Entry point of the routing graph
    pub fn first_service(&self) -> &ServiceName {
        // non-empty by construction
        &self.statements[0][0]
    }

    /// Every distinct service, in order of first appearance
    pub fn services(&self) -> Vec<&ServiceName> {
        let mut seen = Vec::new();
        for service in self.statements.iter().flatten() {
            if !seen.contains(&service) {
                seen.push(service);
            }
        }
        seen
    }

    pub fn statements(&self) -> &[Vec<ServiceName>] {
        &self.statements
    }
}

impl fmt::Display for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in &self.statements {
            let chain: Vec<&str> = statement.iter().map(|s| s.canonical_name()).collect();
            write!(f, "{};", chain.join("+"))?;
        }
        Ok(())
    }
}

impl FromStr for Composition {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut statements = Vec::new();
        for statement in s.split(';').map(str::trim).filter(|st| !st.is_empty()) {
            let chain = statement
                .split('+')
                .map(|name| name.trim().parse::<ServiceName>())
                .collect::<Result<Vec<_>, _>>()?;
            statements.push(chain);
        }
        if statements.is_empty() {
            return Err(NameError::Malformed {
                name: s.to_string(),
                reason: "composition has no services".to_string(),
            });
        }
        Ok(Self { statements })
    }
}

impl From<ServiceName> for Composition {
    fn from(service: ServiceName) -> Self {
        Self {
            statements: vec![vec![service]],
        }
    }
}

impl TryFrom<String> for Composition {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Composition> for String {
    fn from(value: Composition) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_parses_and_renders() {
        let composition: Composition =
            "h_java:c:Reader+h_java:c:Filter+h_java:c:Writer;".parse().unwrap();

        assert_eq!(composition.first_service().name(), "Reader");
        assert_eq!(composition.services().len(), 3);
        assert_eq!(
            composition.to_string(),
            "h:7771_java:c:Reader+h:7771_java:c:Filter+h:7771_java:c:Writer;"
        );
    }

    #[test]
    fn test_multiple_statements_share_services() {
        let composition: Composition =
            "h_java:c:A+h_java:c:B;h_java:c:A+h_java:c:C;".parse().unwrap();

        assert_eq!(composition.statements().len(), 2);
        let names: Vec<&str> = composition.services().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_empty_or_malformed_composition_is_rejected() {
        assert!("".parse::<Composition>().is_err());
        assert!(";".parse::<Composition>().is_err());
        assert!("h_java:c:A+broken;".parse::<Composition>().is_err());
        assert!(Composition::chain(vec![]).is_err());
    }
}
