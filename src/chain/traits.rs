//! Handler trait definition and the function-backed adapter.
//!
//! A handler contributes up to two transforms to a chain: `before` runs on the
//! way in (chain order) and `after` runs on the way out (reverse chain order).
//! A phase the handler does not care about returns [`HandlerError::Noop`],
//! which is what the default trait methods do.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::errors::HandlerError;
use crate::types::{Context, Payload};

/// Result of one transform: the (possibly new) context and payload.
pub type HandlerResult = std::result::Result<(Context, Payload), HandlerError>;

/// Signature of a transform closure.
pub type TransformFn = Arc<dyn Fn(Context, Payload) -> HandlerResult + Send + Sync>;

/// The empty transform. Returns its inputs together with the no-op sentinel.
///
/// The runner discards the sentinel, so a handler built on this contributes
/// nothing to the run or its trace for that phase.
pub fn noop_transform(_ctx: Context, _input: Payload) -> HandlerResult {
    Err(HandlerError::Noop)
}

// ============================================================================
// Handler
// ============================================================================

/// A named unit of bidirectional work in a [`HandlerChain`](super::HandlerChain).
///
/// # Contract
///
/// - **Immutable**: a handler holds no mutable state of its own; anything a
///   run needs to carry forward goes into the returned [`Context`].
/// - **Names**: need not be unique. Positional operations and first/last
///   lookups resolve duplicates.
/// - **Errors**: return [`HandlerError::Noop`] for a phase that is not
///   implemented. Any other error halts the run.
pub trait Handler: Send + Sync {
    /// Name used for lookups and trace records.
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str {
        ""
    }

    /// Pre-pass transform, run in chain order.
    fn before(&self, ctx: Context, input: Payload) -> HandlerResult {
        noop_transform(ctx, input)
    }

    /// Post-pass transform, run in reverse chain order.
    fn after(&self, ctx: Context, input: Payload) -> HandlerResult {
        noop_transform(ctx, input)
    }

    /// Representation recorded on every trace step this handler produces.
    ///
    /// Handlers that derive `Serialize` can return [`json_repr(self)`](json_repr).
    fn debug_repr(&self) -> String {
        String::new()
    }
}

/// Shared, type-erased handler as stored in a chain.
pub type SharedHandler = Arc<dyn Handler>;

/// Serialize `value` as compact JSON for use as a [`Handler::debug_repr`].
///
/// Serialization failures yield an empty string; the representation is
/// diagnostic only.
pub fn json_repr<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_default()
}

// ============================================================================
// FuncHandler: closures as a handler
// ============================================================================

/// Handler built from two optional closures.
///
/// An absent closure behaves as [`noop_transform`]. When a closure fails, the
/// error is passed through untouched.
///
/// ```
/// # use onion_chain::chain::FuncHandler;
/// let upper = FuncHandler::new("upper")
///     .with_before(|ctx, input| Ok((ctx, input.to_ascii_uppercase().into())));
/// ```
#[derive(Clone)]
pub struct FuncHandler {
    name: String,
    description: String,
    before: Option<TransformFn>,
    after: Option<TransformFn>,
}

impl FuncHandler {
    pub const DEFAULT_DESCRIPTION: &'static str = "wraps functions as a handler";

    /// Create a handler with no transforms.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Self::DEFAULT_DESCRIPTION.to_string(),
            before: None,
            after: None,
        }
    }

    /// Create a handler from optional pre/post closures.
    pub fn from_fns(
        name: impl Into<String>,
        before: Option<TransformFn>,
        after: Option<TransformFn>,
    ) -> Self {
        Self {
            before,
            after,
            ..Self::new(name)
        }
    }

    /// Builder method: set the pre-pass closure
    pub fn with_before<F>(mut self, f: F) -> Self
    where
        F: Fn(Context, Payload) -> HandlerResult + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(f));
        self
    }

    /// Builder method: set the post-pass closure
    pub fn with_after<F>(mut self, f: F) -> Self
    where
        F: Fn(Context, Payload) -> HandlerResult + Send + Sync + 'static,
    {
        self.after = Some(Arc::new(f));
        self
    }

    /// Builder method: set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn has_before(&self) -> bool {
        self.before.is_some()
    }

    pub fn has_after(&self) -> bool {
        self.after.is_some()
    }

    /// Wrap into the shared form stored by a chain.
    pub fn shared(self) -> SharedHandler {
        Arc::new(self)
    }
}

impl Handler for FuncHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn before(&self, ctx: Context, input: Payload) -> HandlerResult {
        match &self.before {
            Some(f) => f(ctx, input),
            None => noop_transform(ctx, input),
        }
    }

    fn after(&self, ctx: Context, input: Payload) -> HandlerResult {
        match &self.after {
            Some(f) => f(ctx, input),
            None => noop_transform(ctx, input),
        }
    }
}

impl fmt::Debug for FuncHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuncHandler")
            .field("name", &self.name)
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}
