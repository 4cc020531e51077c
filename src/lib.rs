//! # onion_chain
//!
//! An ordered, mutable chain of named handlers executed in "onion" order.
//!
//! Every handler may contribute a `before` transform and an `after`
//! transform over a [`Context`] and a byte [`Payload`]. A run applies all
//! `before` transforms front to back, then all `after` transforms back to
//! front, and hands a [`RunTrace`] of the steps to a [`TraceEmitter`].
//!
//! ## Features
//!
//! - **Positional editing**: insert before/after, delete and replace by
//!   position, with forgiving out-of-range behaviour
//! - **Phase opt-out**: a handler that returns [`HandlerError::Noop`] for a
//!   phase is skipped without a trace entry
//! - **Fail-fast**: the first real error ends the run and is returned as-is
//! - **Tracing**: optional `tracing` spans per step and a structured
//!   per-run trace sink (feature `tracing`, on by default)
//!
//! ```
//! use onion_chain::{Context, FuncHandler, HandlerChain, NoopEmitter, Payload};
//!
//! let mut chain = HandlerChain::new();
//! chain.push(FuncHandler::new("shout")
//!     .with_before(|ctx, input| Ok((ctx, input.to_ascii_uppercase().into()))));
//!
//! let out = chain
//!     .run(Context::new(), Payload::from_static(b"hi"), &NoopEmitter)
//!     .unwrap();
//! assert_eq!(&out[..], b"HI");
//! ```

pub mod chain;
pub mod errors;
pub mod flow;
pub mod types;

// Re-export commonly used types
pub use chain::{
    json_repr, noop_transform, ChainSpec, ChannelEmitter, CollectingEmitter, FnEmitter,
    FuncHandler, Handler, HandlerChain, HandlerResult, NoopEmitter, Phase, RunTrace,
    SharedHandler, StepRecord, TraceEmitter, TransformFn,
};
#[cfg(feature = "tracing")]
pub use chain::TracingEmitter;
pub use errors::{ChainError, HandlerError, Result};
pub use flow::Flow;
pub use types::{Context, Payload, RunConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
