//! Handler chain: storage, execution, and tracing.
//!
//! ## Submodules
//!
//! - [`traits`]: the [`Handler`] trait and the closure-backed [`FuncHandler`]
//! - [`handlers`]: [`HandlerChain`] storage, positional mutation, lookup
//! - [`runner`]: onion-order execution (`HandlerChain::run`)
//! - [`trace`]: per-run [`RunTrace`] and its [`StepRecord`]s
//! - [`observer`]: [`TraceEmitter`] sinks
//! - [`spec`]: declarative [`ChainSpec`]

pub mod handlers;
pub mod observer;
pub mod runner;
pub mod spec;
pub mod trace;
pub mod traits;

pub use handlers::HandlerChain;
pub use observer::{ChannelEmitter, CollectingEmitter, FnEmitter, NoopEmitter, TraceEmitter};
#[cfg(feature = "tracing")]
pub use observer::TracingEmitter;
pub use spec::ChainSpec;
pub use trace::{Phase, RunTrace, StepRecord};
pub use traits::{
    json_repr, noop_transform, FuncHandler, Handler, HandlerResult, SharedHandler, TransformFn,
};
