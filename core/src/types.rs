//! Payload exchanged with the CRUD service.
//!
//! # Design
//! Only `value` and `txHash` are known to the client; every other field the
//! caller sets travels through `extra` untouched. Responses are not typed at
//! all: the service's body is handed back as a `serde_json::Value`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request payload for create and update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(rename = "txHash", default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn with_tx_hash(mut self, tx_hash: impl Into<Value>) -> Self {
        self.tx_hash = Some(tx_hash.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub(crate) fn has_value(&self) -> bool {
        self.value.as_ref().is_some_and(is_truthy)
    }

    pub(crate) fn has_tx_hash(&self) -> bool {
        self.tx_hash.as_ref().is_some_and(is_truthy)
    }
}

/// `null`, `false`, zero and the empty string count as absent.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
