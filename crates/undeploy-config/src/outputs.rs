//! Creation-time outputs read from a JSON file

use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use undeploy_core::{OutputStore, TeardownError};

/// Outputs loaded once from a JSON object.
///
/// Values may be plain (`{"Network": "vpc-1"}`) or wrapped the way
/// terraform prints them (`{"Network": {"value": "vpc-1"}}`).
#[derive(Debug, Clone, Default)]
pub struct JsonOutputs {
    values: HashMap<String, String>,
}

impl JsonOutputs {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let error = |message: String| ConfigError::Outputs {
            path: path.display().to_string(),
            message,
        };
        let content = std::fs::read_to_string(path).map_err(|e| error(e.to_string()))?;
        Self::parse(&content).map_err(error)
    }

    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        let document: Value = serde_json::from_str(content).map_err(|e| e.to_string())?;
        let Value::Object(entries) = document else {
            return Err("expected a JSON object".to_string());
        };

        let values = entries
            .into_iter()
            .filter_map(|(key, value)| flatten(value).map(|v| (key, v)))
            .collect();
        Ok(Self { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn flatten(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Null => None,
        Value::Object(mut map) => map.remove("value").and_then(flatten),
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl OutputStore for JsonOutputs {
    async fn get(&self, key: &str) -> undeploy_core::Result<String> {
        self.values
            .get(key)
            .cloned()
            .ok_or_else(|| TeardownError::LookupFailure(format!("output {} not found", key)))
    }
}
