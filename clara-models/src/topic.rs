use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between topic levels
pub const TOPIC_SEP: char = ':';

/// A transport topic of up to three levels
///
/// An unset subject or type acts as a wildcard when subscribing and is simply
/// omitted when publishing. The type level may itself contain `:` (a service
/// topic carries `<container>:<engine>` there).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Topic {
    domain: String,
    subject: Option<String>,
    #[serde(rename = "type")]
    ty: Option<String>,
}

impl Topic {
    pub fn build(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            subject: None,
            ty: None,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets the type level. Has no effect on rendering unless a subject is set.
    pub fn with_type(mut self, ty: impl Into<String>) -> Self {
        self.ty = Some(ty.into());
        self
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn ty(&self) -> Option<&str> {
        self.ty.as_deref()
    }

    /// Whether a subscription on `self` receives messages published on `other`
    ///
    /// Each set level must match; the type level also matches any deeper
    /// `:`-separated suffix, so `service:<dpe>:<container>` covers every engine
    /// of that container.
    pub fn is_parent_of(&self, other: &Topic) -> bool {
        if self.domain != other.domain {
            return false;
        }
        let Some(subject) = &self.subject else {
            return true;
        };
        if other.subject.as_ref() != Some(subject) {
            return false;
        }
        let Some(ty) = &self.ty else {
            return true;
        };
        match &other.ty {
            Some(other_ty) => {
                other_ty == ty
                    || (other_ty.starts_with(ty.as_str())
                        && other_ty[ty.len()..].starts_with(TOPIC_SEP))
            }
            None => false,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.domain)?;
        if let Some(subject) = &self.subject {
            write!(f, "{}{}", TOPIC_SEP, subject)?;
            if let Some(ty) = &self.ty {
                write!(f, "{}{}", TOPIC_SEP, ty)?;
            }
        }
        Ok(())
    }
}
