//! Core types used throughout the library

use crate::errors::{ChainError, Result};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// The opaque byte sequence threaded through a chain.
///
/// Cloning a payload bumps a reference count; it never copies the bytes.
pub type Payload = Bytes;

// ============================================================================
// Context
// ============================================================================

/// Request-scoped values carried alongside the payload.
///
/// A `Context` is never mutated in place. [`Context::with_value`] returns a
/// new context that shares nothing mutable with the original, so a trace
/// snapshot taken before a step keeps showing the pre-step values.
/// Cloning is cheap (one `Arc` bump).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context {
    values: Arc<BTreeMap<String, Value>>,
}

impl Context {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive a new context with `key` set to `value`
    pub fn with_value(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut values = (*self.values).clone();
        values.insert(key.into(), value.into());
        Self {
            values: Arc::new(values),
        }
    }

    /// Derive a new context without `key`
    pub fn without(&self, key: &str) -> Self {
        if !self.values.contains_key(key) {
            return self.clone();
        }
        let mut values = (*self.values).clone();
        values.remove(key);
        Self {
            values: Arc::new(values),
        }
    }

    /// Look up a value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Look up a string value
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for a chain run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Record input/output payloads on each step record
    #[serde(default = "default_true")]
    pub record_payloads: bool,
    /// Record input/output context snapshots on each step record
    #[serde(default = "default_true")]
    pub record_context: bool,
    /// Truncate recorded payloads to this many bytes (None = no limit)
    #[serde(default)]
    pub payload_preview_limit: Option<usize>,
}

fn default_true() -> bool {
    true
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            record_payloads: true,
            record_context: true,
            payload_preview_limit: None,
        }
    }
}

impl RunConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from JSON and validate it
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.payload_preview_limit == Some(0) {
            return Err(ChainError::invalid_config(
                "payload_preview_limit must be > 0 (use record_payloads = false to drop payloads)",
            ));
        }
        Ok(())
    }

    /// Builder method: toggle payload recording
    pub fn with_record_payloads(mut self, record: bool) -> Self {
        self.record_payloads = record;
        self
    }

    /// Builder method: toggle context recording
    pub fn with_record_context(mut self, record: bool) -> Self {
        self.record_context = record;
        self
    }

    /// Builder method: set payload preview limit
    pub fn with_payload_preview_limit(mut self, limit: usize) -> Self {
        self.payload_preview_limit = Some(limit);
        self
    }

    /// The bytes a step record should keep for `payload`.
    pub(crate) fn snapshot_payload(&self, payload: &Payload) -> Option<Payload> {
        if !self.record_payloads {
            return None;
        }
        let end = match self.payload_preview_limit {
            Some(limit) => limit.min(payload.len()),
            None => payload.len(),
        };
        Some(payload.slice(..end))
    }

    /// The context a step record should keep.
    pub(crate) fn snapshot_context(&self, ctx: &Context) -> Option<Context> {
        self.record_context.then(|| ctx.clone())
    }
}
