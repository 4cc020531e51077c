//! Execution trace: one [`StepRecord`] per handler phase that actually ran.
//!
//! Payload bytes serialize as UTF-8 text (lossy) so an emitted trace reads
//! naturally in a log line.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::errors::HandlerError;
use crate::types::{Context, Payload};

/// Which half of the onion a step belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Forward pass, `Handler::before`
    Before,
    /// Reverse pass, `Handler::after`
    After,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Before => "before",
            Phase::After => "after",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn serialize_payload<S: Serializer>(
    payload: &Option<Payload>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match payload {
        Some(bytes) => serializer.serialize_some(&String::from_utf8_lossy(bytes)),
        None => serializer.serialize_none(),
    }
}

/// One handler phase as observed by the runner.
///
/// `input_*` fields are captured before the transform is called and
/// `output_*` after it returns. On failure `output_payload` is `None` and
/// `output_context` repeats the input context.
///
/// Payload and context snapshots may be absent when disabled in
/// [`RunConfig`](crate::types::RunConfig).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    pub phase: Phase,
    pub handler: String,
    pub debug: String,
    pub input_context: Option<Context>,
    #[serde(serialize_with = "serialize_payload")]
    pub input_payload: Option<Payload>,
    pub output_context: Option<Context>,
    #[serde(serialize_with = "serialize_payload")]
    pub output_payload: Option<Payload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<HandlerError>,
}

impl StepRecord {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Record of a single run, handed to a
/// [`TraceEmitter`](super::observer::TraceEmitter) once the run is over.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunTrace {
    pub steps: Vec<StepRecord>,
    /// Context as it stood when the run ended.
    pub context: Option<Context>,
}

impl RunTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whether the run stopped on a handler error.
    pub fn failed(&self) -> bool {
        self.error().is_some()
    }

    /// The error that stopped the run, if any. Only the last step can carry one.
    pub fn error(&self) -> Option<&HandlerError> {
        self.steps.last().and_then(|s| s.error.as_ref())
    }

    /// `(phase, handler)` for every step, in execution order.
    pub fn phases(&self) -> Vec<(Phase, &str)> {
        self.steps
            .iter()
            .map(|s| (s.phase, s.handler.as_str()))
            .collect()
    }

    /// Serialize the trace as compact JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
