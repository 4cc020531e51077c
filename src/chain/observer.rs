//! Trace sinks.
//!
//! The runner hands every finished [`RunTrace`] to a [`TraceEmitter`] exactly
//! once, whether the run succeeded or not. Emission is fire-and-forget:
//! [`TraceEmitter::emit`] has no return value, and a sink that cannot deliver
//! drops the trace.
//!
//! Provided sinks:
//!
//! | Sink | Use |
//! |------|-----|
//! | [`NoopEmitter`] | discard traces |
//! | [`TracingEmitter`] | one structured `tracing` event per run (feature `tracing`) |
//! | [`ChannelEmitter`] | forward to an `mpsc` receiver, e.g. a log writer thread |
//! | [`CollectingEmitter`] | keep traces in memory for inspection |
//! | [`FnEmitter`] | adapt a closure |

use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use super::trace::RunTrace;

/// Receives the trace of each run.
pub trait TraceEmitter {
    fn emit(&self, trace: RunTrace);
}

impl<E: TraceEmitter + ?Sized> TraceEmitter for &E {
    fn emit(&self, trace: RunTrace) {
        (**self).emit(trace)
    }
}

impl<E: TraceEmitter + ?Sized> TraceEmitter for Box<E> {
    fn emit(&self, trace: RunTrace) {
        (**self).emit(trace)
    }
}

impl<E: TraceEmitter + ?Sized> TraceEmitter for Arc<E> {
    fn emit(&self, trace: RunTrace) {
        (**self).emit(trace)
    }
}

/// Discards every trace.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEmitter;

impl TraceEmitter for NoopEmitter {
    #[inline]
    fn emit(&self, _trace: RunTrace) {}
}

/// Logs each trace as one `tracing` event at `INFO`, or `WARN` when the run
/// failed.
///
/// The full trace is attached as a JSON string field named `trace`.
#[cfg(feature = "tracing")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEmitter;

#[cfg(feature = "tracing")]
impl TraceEmitter for TracingEmitter {
    fn emit(&self, trace: RunTrace) {
        let json = trace.to_json().unwrap_or_default();
        match trace.error() {
            Some(err) => tracing::warn!(
                steps = trace.len(),
                error = %err,
                trace = %json,
                "handler chain run failed"
            ),
            None => tracing::info!(steps = trace.len(), trace = %json, "handler chain run"),
        }
    }
}

/// Forwards traces over a channel. Send failures (receiver dropped) are
/// ignored.
#[derive(Debug, Clone)]
pub struct ChannelEmitter {
    tx: Sender<RunTrace>,
}

impl ChannelEmitter {
    pub fn new(tx: Sender<RunTrace>) -> Self {
        Self { tx }
    }
}

impl TraceEmitter for ChannelEmitter {
    fn emit(&self, trace: RunTrace) {
        let _ = self.tx.send(trace);
    }
}

/// Keeps every trace it receives.
#[derive(Debug, Default)]
pub struct CollectingEmitter {
    traces: Mutex<Vec<RunTrace>>,
}

impl CollectingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of traces received so far.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of all traces received so far, oldest first.
    pub fn traces(&self) -> Vec<RunTrace> {
        self.lock().clone()
    }

    /// The most recent trace.
    pub fn last(&self) -> Option<RunTrace> {
        self.lock().last().cloned()
    }

    /// Remove and return all traces.
    pub fn take(&self) -> Vec<RunTrace> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<RunTrace>> {
        self.traces.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TraceEmitter for CollectingEmitter {
    fn emit(&self, trace: RunTrace) {
        self.lock().push(trace);
    }
}

/// Adapts a closure into a [`TraceEmitter`].
#[derive(Debug, Clone, Copy)]
pub struct FnEmitter<F>(pub F);

impl<F: Fn(RunTrace)> TraceEmitter for FnEmitter<F> {
    fn emit(&self, trace: RunTrace) {
        (self.0)(trace)
    }
}
