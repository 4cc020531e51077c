//! Ordered handler storage with positional mutation and name lookup.
//!
//! # Positions
//!
//! Mutation operations take a signed, zero-based `position`. Out-of-range
//! positions are never an error:
//!
//! | Operation | Out-of-range behaviour |
//! |-----------|------------------------|
//! | [`insert_before`](HandlerChain::insert_before) | insert at head (also for `position > len - 1`) |
//! | [`insert_after`](HandlerChain::insert_after) | append at tail (also for `position >= len - 1`) |
//! | [`delete`](HandlerChain::delete) | no-op |
//! | [`replace`](HandlerChain::replace) | no-op |
//!
//! Fallbacks are reported as `tracing` events so misconfigured positions can
//! be diagnosed without changing the silent behaviour.
//!
//! # Storage
//!
//! Every mutation assembles a fresh `Vec`. Handlers themselves are shared
//! `Arc`s, so a cloned chain is cheap and is never affected by later
//! mutations of the chain it was cloned from.

use std::fmt;
use std::sync::Arc;

use super::traits::{Handler, SharedHandler};
use crate::errors::{ChainError, Result};
use crate::flow::Flow;

macro_rules! position_fallback {
    ($op:expr, $position:expr, $len:expr, $msg:literal) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(op = $op, position = $position, len = $len, $msg);
    };
}

macro_rules! position_ignored {
    ($op:expr, $position:expr, $len:expr) => {
        #[cfg(feature = "tracing")]
        tracing::warn!(
            op = $op,
            position = $position,
            len = $len,
            "position out of range, chain unchanged"
        );
    };
}

/// Resolve a signed position against `len`.
fn checked(position: isize, len: usize) -> Option<usize> {
    usize::try_from(position).ok().filter(|&i| i < len)
}

/// Name comparison used by [`HandlerChain::get_by_name`].
fn names_match_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

/// An ordered sequence of handlers.
///
/// Order is load-bearing: `before` transforms run front to back and `after`
/// transforms run back to front. Duplicate names are allowed.
#[derive(Clone, Default)]
pub struct HandlerChain {
    handlers: Vec<SharedHandler>,
}

impl HandlerChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a chain from an initial set of handlers.
    pub fn from_handlers(handlers: impl IntoIterator<Item = SharedHandler>) -> Self {
        let mut chain = Self::new();
        chain.append(handlers);
        chain
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SharedHandler> {
        self.handlers.get(index)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &SharedHandler> + ExactSizeIterator {
        self.handlers.iter()
    }

    pub fn as_slice(&self) -> &[SharedHandler] {
        &self.handlers
    }

    // ------------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------------

    /// Add handlers to the end of the chain.
    pub fn append(&mut self, handlers: impl IntoIterator<Item = SharedHandler>) {
        self.handlers.extend(handlers);
    }

    /// Add a single concrete handler to the end of the chain.
    pub fn push<H: Handler + 'static>(&mut self, handler: H) {
        self.handlers.push(Arc::new(handler));
    }

    /// Insert handlers immediately before `position`.
    ///
    /// `position <= 0` and `position > len - 1` both insert at the head.
    pub fn insert_before(
        &mut self,
        position: isize,
        handlers: impl IntoIterator<Item = SharedHandler>,
    ) {
        let len = self.len();
        match checked(position, len) {
            Some(at) if at > 0 => self.splice(at, at, handlers),
            _ => {
                if position != 0 {
                    position_fallback!("insert_before", position, len, "inserting at head");
                }
                self.splice(0, 0, handlers);
            }
        }
    }

    /// Insert handlers immediately after `position`.
    ///
    /// `position < 0` and `position >= len - 1` both append at the tail.
    pub fn insert_after(
        &mut self,
        position: isize,
        handlers: impl IntoIterator<Item = SharedHandler>,
    ) {
        let len = self.len();
        match checked(position, len) {
            Some(at) if at + 1 < len => self.splice(at + 1, at + 1, handlers),
            _ => {
                if checked(position, len).is_none() {
                    position_fallback!("insert_after", position, len, "appending at tail");
                }
                self.splice(len, len, handlers);
            }
        }
    }

    /// Remove the handler at `position`. Out-of-range positions are ignored.
    pub fn delete(&mut self, position: isize) {
        match checked(position, self.len()) {
            Some(at) => self.splice(at, at + 1, std::iter::empty()),
            None => {
                position_ignored!("delete", position, self.len());
            }
        }
    }

    /// Replace the handler at `position` with zero or more handlers.
    /// Out-of-range positions are ignored.
    pub fn replace(
        &mut self,
        position: isize,
        handlers: impl IntoIterator<Item = SharedHandler>,
    ) {
        match checked(position, self.len()) {
            Some(at) => self.splice(at, at + 1, handlers),
            None => {
                position_ignored!("replace", position, self.len());
            }
        }
    }

    /// Insert before the first handler named `anchor`, or at the head when
    /// there is none.
    pub fn insert_before_name(
        &mut self,
        anchor: &str,
        handlers: impl IntoIterator<Item = SharedHandler>,
    ) {
        let position = self.index_first(anchor).map_or(-1, |i| i as isize);
        self.insert_before(position, handlers);
    }

    /// Insert after the last handler named `anchor`, or at the tail when
    /// there is none.
    pub fn insert_after_name(
        &mut self,
        anchor: &str,
        handlers: impl IntoIterator<Item = SharedHandler>,
    ) {
        let position = self.index_last(anchor).map_or(-1, |i| i as isize);
        self.insert_after(position, handlers);
    }

    /// Rebuild storage as `old[..start] + middle + old[end..]`.
    fn splice(
        &mut self,
        start: usize,
        end: usize,
        middle: impl IntoIterator<Item = SharedHandler>,
    ) {
        let old = std::mem::take(&mut self.handlers);
        let middle = middle.into_iter();
        let mut fresh = Vec::with_capacity(old.len() - (end - start) + middle.size_hint().0);
        fresh.extend_from_slice(&old[..start]);
        fresh.extend(middle);
        fresh.extend_from_slice(&old[end..]);
        self.handlers = fresh;
    }

    // ------------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------------

    /// All positions whose handler name equals `name` (case-sensitive).
    pub fn index(&self, name: &str) -> Vec<usize> {
        self.handlers
            .iter()
            .enumerate()
            .filter(|(_, h)| h.name() == name)
            .map(|(i, _)| i)
            .collect()
    }

    /// First position named `name` (case-sensitive).
    pub fn index_first(&self, name: &str) -> Option<usize> {
        self.handlers.iter().position(|h| h.name() == name)
    }

    /// Last position named `name` (case-sensitive).
    pub fn index_last(&self, name: &str) -> Option<usize> {
        self.handlers.iter().rposition(|h| h.name() == name)
    }

    /// Handler names in chain order.
    pub fn names(&self) -> Vec<String> {
        self.handlers.iter().map(|h| h.name().to_string()).collect()
    }

    /// Build a sub-chain holding, for each of `names`, the first handler whose
    /// name matches case-insensitively. The result follows the order of
    /// `names`.
    ///
    /// # Errors
    ///
    /// [`ChainError::HandlerNotFound`] for the first name with no match. No
    /// partial chain is returned.
    pub fn get_by_name<S: AsRef<str>>(&self, names: &[S]) -> Result<HandlerChain> {
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let handler = self
                .handlers
                .iter()
                .find(|h| names_match_ignore_case(h.name(), name))
                .ok_or_else(|| ChainError::handler_not_found(name))?;
            selected.push(Arc::clone(handler));
        }
        Ok(HandlerChain { handlers: selected })
    }

    /// [`get_by_name`](Self::get_by_name) driven by a [`Flow`].
    pub fn select(&self, flow: &Flow) -> Result<HandlerChain> {
        self.get_by_name(flow.names())
    }

    /// The chain's names as a [`Flow`].
    pub fn to_flow(&self) -> Flow {
        self.handlers.iter().map(|h| h.name()).collect()
    }
}

impl FromIterator<SharedHandler> for HandlerChain {
    fn from_iter<I: IntoIterator<Item = SharedHandler>>(iter: I) -> Self {
        Self::from_handlers(iter)
    }
}

impl<'a> IntoIterator for &'a HandlerChain {
    type Item = &'a SharedHandler;
    type IntoIter = std::slice::Iter<'a, SharedHandler>;

    fn into_iter(self) -> Self::IntoIter {
        self.handlers.iter()
    }
}

impl fmt::Debug for HandlerChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.handlers.iter().map(|h| h.name()))
            .finish()
    }
}
