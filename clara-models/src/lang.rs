use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::name::NameError;

/// Language a DPE (and everything it hosts) runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaraLang {
    Java,
    Cpp,
    Python,
}

impl ClaraLang {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaraLang::Java => "java",
            ClaraLang::Cpp => "cpp",
            ClaraLang::Python => "python",
        }
    }

    /// Proxy port a DPE of this language listens on when none is given
    pub fn default_port(&self) -> u16 {
        match self {
            ClaraLang::Java => 7771,
            ClaraLang::Cpp => 7781,
            ClaraLang::Python => 7791,
        }
    }
}

impl fmt::Display for ClaraLang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaraLang {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "java" => Ok(ClaraLang::Java),
            "cpp" => Ok(ClaraLang::Cpp),
            "python" => Ok(ClaraLang::Python),
            _ => Err(NameError::UnknownLang(s.to_string())),
        }
    }
}
