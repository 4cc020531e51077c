//! Chain runner: onion-order execution of a [`HandlerChain`].
//!
//! [`HandlerChain::run`] threads a context and payload through every
//! handler's `before` transform in chain order, then through every `after`
//! transform in reverse chain order:
//!
//! ```text
//!   input ─▶ h0.before ─▶ h1.before ─▶ h2.before ─┐
//!                                                 │
//!  output ◀─ h0.after  ◀─ h1.after  ◀─ h2.after  ◀┘
//! ```
//!
//! # Failure
//!
//! [`HandlerError::Noop`] from a transform is swallowed and leaves no trace
//! step. Any other error ends the run at once: later `before` steps and the
//! whole `after` pass are skipped, and the error is returned as-is. There is
//! no compensation for handlers that already ran.
//!
//! # Trace emission
//!
//! The [`RunTrace`] is owned by a guard that hands it to the
//! [`TraceEmitter`] when dropped, so it is emitted exactly once on every exit
//! path, including an early `?` return or a panicking handler.

use super::handlers::HandlerChain;
use super::observer::TraceEmitter;
use super::trace::{Phase, RunTrace, StepRecord};
use super::traits::Handler;
use crate::errors::HandlerError;
use crate::types::{Context, Payload, RunConfig};

// ---------------------------------------------------------------------------
// Conditional tracing support
// ---------------------------------------------------------------------------

/// Enter a tracing span for one handler phase (when the `tracing` feature is
/// enabled). When disabled, this is a no-op and the compiler eliminates it.
macro_rules! trace_handler {
    ($phase:expr, $name:expr) => {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("chain_step", phase = %$phase, handler = $name).entered();
    };
}

/// Per-run state. Emits the trace with the final context when dropped.
struct RunGuard<'e, E: TraceEmitter + ?Sized> {
    emitter: &'e E,
    trace: RunTrace,
    ctx: Context,
}

impl<'e, E: TraceEmitter + ?Sized> RunGuard<'e, E> {
    fn new(emitter: &'e E, ctx: Context) -> Self {
        Self {
            emitter,
            trace: RunTrace::new(),
            ctx,
        }
    }

    /// Run one phase of one handler, recording a step unless it was a no-op.
    fn step(
        &mut self,
        handler: &dyn Handler,
        phase: Phase,
        data: Payload,
        cfg: &RunConfig,
    ) -> Result<Payload, HandlerError> {
        trace_handler!(phase, handler.name());

        let input_context = cfg.snapshot_context(&self.ctx);
        let input_payload = cfg.snapshot_payload(&data);

        let outcome = match phase {
            Phase::Before => handler.before(self.ctx.clone(), data.clone()),
            Phase::After => handler.after(self.ctx.clone(), data.clone()),
        };

        let (output_payload, error, result) = match outcome {
            Ok((ctx, out)) => {
                self.ctx = ctx;
                (cfg.snapshot_payload(&out), None, Ok(out))
            }
            Err(err) if err.is_noop() => return Ok(data),
            Err(err) => (None, Some(err.clone()), Err(err)),
        };

        self.trace.steps.push(StepRecord {
            phase,
            handler: handler.name().to_string(),
            debug: handler.debug_repr(),
            input_context,
            input_payload,
            output_context: cfg.snapshot_context(&self.ctx),
            output_payload,
            error,
        });
        result
    }
}

impl<'e, E: TraceEmitter + ?Sized> Drop for RunGuard<'e, E> {
    fn drop(&mut self) {
        let mut trace = std::mem::take(&mut self.trace);
        trace.context = Some(self.ctx.clone());
        #[cfg(feature = "tracing")]
        tracing::trace!(steps = trace.len(), failed = trace.failed(), "emitting run trace");
        self.emitter.emit(trace);
    }
}

impl HandlerChain {
    /// Run the chain over `input` with the default [`RunConfig`].
    ///
    /// Returns the payload produced by the last transform that ran, or the
    /// first non-noop error.
    pub fn run<E>(&self, ctx: Context, input: Payload, emitter: &E) -> Result<Payload, HandlerError>
    where
        E: TraceEmitter + ?Sized,
    {
        self.run_with(ctx, input, &RunConfig::default(), emitter)
    }

    /// Run the chain over `input`, recording steps as `cfg` directs.
    pub fn run_with<E>(
        &self,
        ctx: Context,
        input: Payload,
        cfg: &RunConfig,
        emitter: &E,
    ) -> Result<Payload, HandlerError>
    where
        E: TraceEmitter + ?Sized,
    {
        let mut run = RunGuard::new(emitter, ctx);
        let mut data = input;

        for handler in self.iter() {
            data = run.step(&**handler, Phase::Before, data, cfg)?;
        }
        for handler in self.iter().rev() {
            data = run.step(&**handler, Phase::After, data, cfg)?;
        }
        Ok(data)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::observer::CollectingEmitter;
    use crate::chain::traits::{FuncHandler, HandlerResult, SharedHandler};
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<String>>>;

    /// Logs `"<phase>:<name>"`; `before` appends the name to the payload and
    /// `after` appends `<`.
    fn logging(name: &'static str, log: &Log) -> SharedHandler {
        let before_log = Arc::clone(log);
        let after_log = Arc::clone(log);
        FuncHandler::new(name)
            .with_before(move |ctx, input| {
                before_log.lock().unwrap().push(format!("before:{name}"));
                let mut out = input.to_vec();
                out.extend_from_slice(name.as_bytes());
                Ok((ctx, out.into()))
            })
            .with_after(move |ctx, input| {
                after_log.lock().unwrap().push(format!("after:{name}"));
                let mut out = input.to_vec();
                out.push(b'<');
                Ok((ctx, out.into()))
            })
            .shared()
    }

    fn failing(name: &'static str) -> SharedHandler {
        FuncHandler::new(name)
            .with_before(move |_, _| Err(HandlerError::failed(name, "boom")))
            .shared()
    }

    fn payload(s: &'static str) -> Payload {
        Payload::from_static(s.as_bytes())
    }

    #[test]
    fn test_onion_order() {
        let log = Log::default();
        let chain = HandlerChain::from_handlers([logging("a", &log), logging("b", &log)]);
        let sink = CollectingEmitter::new();

        let out = chain.run(Context::new(), payload(">"), &sink).unwrap();
        assert_eq!(&out[..], b">ab<<");
        assert_eq!(
            *log.lock().unwrap(),
            vec!["before:a", "before:b", "after:b", "after:a"]
        );

        let trace = sink.last().unwrap();
        assert_eq!(
            trace.phases(),
            vec![
                (Phase::Before, "a"),
                (Phase::Before, "b"),
                (Phase::After, "b"),
                (Phase::After, "a"),
            ]
        );
    }

    #[test]
    fn test_step_records_inputs_and_outputs() {
        let log = Log::default();
        let chain = HandlerChain::from_handlers([logging("a", &log)]);
        let sink = CollectingEmitter::new();

        chain.run(Context::new(), payload("x"), &sink).unwrap();
        let trace = sink.last().unwrap();
        let step = &trace.steps[0];
        assert_eq!(step.handler, "a");
        assert_eq!(step.input_payload.as_deref(), Some(&b"x"[..]));
        assert_eq!(step.output_payload.as_deref(), Some(&b"xa"[..]));
        assert_eq!(step.error, None);

        let step = &trace.steps[1];
        assert_eq!(step.input_payload.as_deref(), Some(&b"xa"[..]));
        assert_eq!(step.output_payload.as_deref(), Some(&b"xa<"[..]));
    }

    #[test]
    fn test_noop_phase_is_skipped_but_other_phase_runs() {
        let log = Log::default();
        let post_only = FuncHandler::new("post")
            .with_after(|ctx, input| {
                let mut out = input.to_vec();
                out.push(b'!');
                Ok((ctx, out.into()))
            })
            .shared();
        let chain = HandlerChain::from_handlers([post_only, logging("a", &log)]);
        let sink = CollectingEmitter::new();

        let out = chain.run(Context::new(), payload(""), &sink).unwrap();
        assert_eq!(&out[..], b"a<!");
        assert_eq!(
            sink.last().unwrap().phases(),
            vec![
                (Phase::Before, "a"),
                (Phase::After, "a"),
                (Phase::After, "post"),
            ]
        );
    }

    #[test]
    fn test_noop_keeps_payload_and_context() {
        let chain = HandlerChain::from_handlers([FuncHandler::new("empty").shared()]);
        let sink = CollectingEmitter::new();
        let ctx = Context::new().with_value("k", "v");

        let out = chain.run(ctx.clone(), payload("same"), &sink).unwrap();
        assert_eq!(&out[..], b"same");

        let trace = sink.last().unwrap();
        assert!(trace.is_empty());
        assert_eq!(trace.context, Some(ctx));
    }

    #[test]
    fn test_pre_pass_error_halts_run() {
        let log = Log::default();
        let chain = HandlerChain::from_handlers([
            logging("a", &log),
            failing("b"),
            logging("c", &log),
        ]);
        let sink = CollectingEmitter::new();

        let err = chain.run(Context::new(), payload(""), &sink).unwrap_err();
        assert_eq!(err, HandlerError::failed("b", "boom"));
        assert_eq!(*log.lock().unwrap(), vec!["before:a"]);

        let trace = sink.last().unwrap();
        assert_eq!(
            trace.phases(),
            vec![(Phase::Before, "a"), (Phase::Before, "b")]
        );
        assert_eq!(trace.error(), Some(&err));
        assert_eq!(trace.steps[1].output_payload, None);
    }

    #[test]
    fn test_first_handler_failure_has_single_step() {
        let log = Log::default();
        let chain = HandlerChain::from_handlers([failing("A"), logging("B", &log)]);
        let sink = CollectingEmitter::new();

        let err = chain.run(Context::new(), payload(""), &sink).unwrap_err();
        assert_eq!(err, HandlerError::failed("A", "boom"));

        let trace = sink.last().unwrap();
        assert_eq!(trace.len(), 1);
        assert_eq!(trace.steps[0].phase, Phase::Before);
        assert_eq!(trace.steps[0].handler, "A");
        assert_eq!(trace.steps[0].error, Some(err));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_post_pass_error_halts_remaining_post_steps() {
        let log = Log::default();
        let bad_after = FuncHandler::new("bad")
            .with_after(|_, _| Err(HandlerError::invalid_payload("truncated")))
            .shared();
        let chain = HandlerChain::from_handlers([logging("a", &log), bad_after]);
        let sink = CollectingEmitter::new();

        let err = chain.run(Context::new(), payload(""), &sink).unwrap_err();
        assert_eq!(err, HandlerError::invalid_payload("truncated"));
        assert_eq!(*log.lock().unwrap(), vec!["before:a"]);
        assert_eq!(
            sink.last().unwrap().phases(),
            vec![(Phase::Before, "a"), (Phase::After, "bad")]
        );
    }

    #[test]
    fn test_context_threads_through_steps() {
        let chain = HandlerChain::from_handlers([
            FuncHandler::new("set")
                .with_before(|ctx, input| Ok((ctx.with_value("user", "alice"), input)))
                .shared(),
            FuncHandler::new("read")
                .with_before(|ctx, _| {
                    let user = ctx.get_str("user").unwrap_or("nobody").to_string();
                    Ok((ctx, user.into()))
                })
                .shared(),
        ]);
        let sink = CollectingEmitter::new();

        let out = chain.run(Context::new(), payload(""), &sink).unwrap();
        assert_eq!(&out[..], b"alice");

        let trace = sink.last().unwrap();
        assert_eq!(trace.steps[0].input_context, Some(Context::new()));
        assert_eq!(
            trace.steps[1].input_context.as_ref().and_then(|c| c.get_str("user")),
            Some("alice")
        );
        assert_eq!(
            trace.context.as_ref().and_then(|c| c.get_str("user")),
            Some("alice")
        );
    }

    #[test]
    fn test_trace_emitted_once_per_run() {
        let chain = HandlerChain::from_handlers([failing("x")]);
        let sink = CollectingEmitter::new();
        let _ = chain.run(Context::new(), payload(""), &sink);
        let _ = chain.run(Context::new(), payload(""), &sink);
        assert_eq!(sink.len(), 2);

        HandlerChain::new()
            .run(Context::new(), payload("p"), &sink)
            .unwrap();
        assert_eq!(sink.len(), 3);
        assert!(sink.last().unwrap().is_empty());
    }

    #[test]
    fn test_trace_emitted_when_handler_panics() {
        let chain = HandlerChain::from_handlers([FuncHandler::new("panics")
            .with_before(|_, _| -> HandlerResult { panic!("handler bug") })
            .shared()]);
        let sink = CollectingEmitter::new();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            chain.run(Context::new(), payload(""), &sink)
        }));
        assert!(result.is_err());
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_debug_repr_recorded() {
        struct Tagged;
        impl Handler for Tagged {
            fn name(&self) -> &str {
                "tagged"
            }
            fn before(&self, ctx: Context, input: Payload) -> HandlerResult {
                Ok((ctx, input))
            }
            fn debug_repr(&self) -> String {
                "tagged-v1".into()
            }
        }

        let mut chain = HandlerChain::new();
        chain.push(Tagged);
        let sink = CollectingEmitter::new();
        chain.run(Context::new(), payload(""), &sink).unwrap();
        assert_eq!(sink.last().unwrap().steps[0].debug, "tagged-v1");
    }

    #[test]
    fn test_run_with_config_controls_snapshots() {
        let log = Log::default();
        let chain = HandlerChain::from_handlers([logging("abc", &log)]);
        let sink = CollectingEmitter::new();

        let cfg = RunConfig::new()
            .with_payload_preview_limit(2)
            .with_record_context(false);
        chain.run_with(Context::new(), payload("xyz"), &cfg, &sink).unwrap();
        let step = &sink.last().unwrap().steps[0];
        assert_eq!(step.input_payload.as_deref(), Some(&b"xy"[..]));
        assert_eq!(step.output_payload.as_deref(), Some(&b"xy"[..]));
        assert_eq!(step.input_context, None);
        assert_eq!(step.output_context, None);

        let cfg = RunConfig::new().with_record_payloads(false);
        let out = chain.run_with(Context::new(), payload("xyz"), &cfg, &sink).unwrap();
        assert_eq!(&out[..], b"xyzabc<");
        let step = &sink.last().unwrap().steps[0];
        assert_eq!(step.input_payload, None);
        assert_eq!(step.output_payload, None);
    }

    #[test]
    fn test_run_accepts_dyn_emitter() {
        let sink = CollectingEmitter::new();
        let dyn_sink: &dyn TraceEmitter = &sink;
        HandlerChain::new()
            .run(Context::new(), payload(""), dyn_sink)
            .unwrap();
        assert_eq!(sink.len(), 1);
    }
}
