//! Engine data and the data types used to serialize it

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use clara_models::EngineStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

pub mod mime {
    pub const JSON: &str = "application/json";
    pub const STRING: &str = "text/string";
    pub const BYTES: &str = "binary/bytes";
}

// ============================================================================
// Engine data
// ============================================================================

/// A typed payload exchanged with a service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineData {
    pub mime_type: String,
    pub value: Value,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Option<EngineStatus>,
}

impl EngineData {
    pub fn new(mime_type: impl Into<String>, value: Value) -> Self {
        Self {
            mime_type: mime_type.into(),
            value,
            description: String::new(),
            status: None,
        }
    }

    pub fn json(value: Value) -> Self {
        Self::new(mime::JSON, value)
    }

    pub fn string(text: impl Into<String>) -> Self {
        Self::new(mime::STRING, Value::String(text.into()))
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

// ============================================================================
// Data types
// ============================================================================

/// Converts engine values to and from bytes for one mime type
pub trait EngineSerializer: Send + Sync {
    fn write(&self, value: &Value) -> std::result::Result<Vec<u8>, String>;
    fn read(&self, bytes: &[u8]) -> std::result::Result<Value, String>;
}

struct JsonSerializer;

impl EngineSerializer for JsonSerializer {
    fn write(&self, value: &Value) -> std::result::Result<Vec<u8>, String> {
        serde_json::to_vec(value).map_err(|e| e.to_string())
    }

    fn read(&self, bytes: &[u8]) -> std::result::Result<Value, String> {
        serde_json::from_slice(bytes).map_err(|e| e.to_string())
    }
}

struct StringSerializer;

impl EngineSerializer for StringSerializer {
    fn write(&self, value: &Value) -> std::result::Result<Vec<u8>, String> {
        match value {
            Value::String(s) => Ok(s.as_bytes().to_vec()),
            other => Err(format!("expected a string value, found {}", other)),
        }
    }

    fn read(&self, bytes: &[u8]) -> std::result::Result<Value, String> {
        String::from_utf8(bytes.to_vec())
            .map(Value::String)
            .map_err(|e| e.to_string())
    }
}

/// A mime type plus the routine that serializes it
///
/// Two data types are equal when their mime types are.
#[derive(Clone)]
pub struct EngineDataType {
    mime_type: String,
    serializer: Arc<dyn EngineSerializer>,
}

impl EngineDataType {
    pub fn new(mime_type: impl Into<String>, serializer: impl EngineSerializer + 'static) -> Self {
        Self {
            mime_type: mime_type.into(),
            serializer: Arc::new(serializer),
        }
    }

    pub fn json() -> Self {
        Self::new(mime::JSON, JsonSerializer)
    }

    pub fn string() -> Self {
        Self::new(mime::STRING, StringSerializer)
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn serializer(&self) -> &dyn EngineSerializer {
        self.serializer.as_ref()
    }
}

impl fmt::Debug for EngineDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineDataType")
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

impl PartialEq for EngineDataType {
    fn eq(&self, other: &Self) -> bool {
        self.mime_type == other.mime_type
    }
}

impl Eq for EngineDataType {}

/// Data types registered by the caller, keyed by mime type
#[derive(Debug, Clone, Default)]
pub struct DataTypeSet {
    types: HashMap<String, EngineDataType>,
}

impl DataTypeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON and plain strings
    pub fn with_defaults() -> Self {
        let mut set = Self::new();
        set.register([EngineDataType::json(), EngineDataType::string()]);
        set
    }

    /// Adds data types; a type with an already registered mime type replaces it
    pub fn register(&mut self, types: impl IntoIterator<Item = EngineDataType>) {
        for data_type in types {
            self.types.insert(data_type.mime_type.clone(), data_type);
        }
    }

    pub fn contains(&self, mime_type: &str) -> bool {
        self.types.contains_key(mime_type)
    }

    pub fn get(&self, mime_type: &str) -> Option<&EngineDataType> {
        self.types.get(mime_type)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Fails with [`Error::InvalidArgument`] when the type is not registered
    pub fn require(&self, mime_type: &str) -> Result<&EngineDataType> {
        self.get(mime_type).ok_or_else(|| {
            Error::invalid_argument(format!("unsupported data type: {}", mime_type))
        })
    }

    pub fn serialize(&self, data: &EngineData) -> Result<Vec<u8>> {
        self.require(&data.mime_type)?
            .serializer()
            .write(&data.value)
            .map_err(|e| Error::Serialization(format!("{}: {}", data.mime_type, e)))
    }

    pub fn deserialize(&self, mime_type: &str, bytes: &[u8]) -> Result<Value> {
        let data_type = self
            .get(mime_type)
            .ok_or_else(|| Error::Serialization(format!("unsupported data type: {}", mime_type)))?;
        data_type
            .serializer()
            .read(bytes)
            .map_err(|e| Error::Serialization(format!("{}: {}", mime_type, e)))
    }
}
