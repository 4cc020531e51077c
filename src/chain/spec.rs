//! Declarative chain description.
//!
//! A [`ChainSpec`] names the handlers of a chain as a [`Flow`] and carries the
//! [`RunConfig`] to run it with. Handlers are picked from a catalog chain that
//! the host process assembles in code:
//!
//! ```json
//! { "flow": "decode, auth, gzip", "run": { "payload_preview_limit": 256 } }
//! ```

use serde::{Deserialize, Serialize};

use super::handlers::HandlerChain;
use crate::errors::{ChainError, Result};
use crate::flow::Flow;
use crate::types::RunConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainSpec {
    /// Handler names, in chain order.
    pub flow: Flow,
    #[serde(default)]
    pub run: RunConfig,
}

impl ChainSpec {
    pub fn new(flow: impl Into<Flow>) -> Self {
        Self {
            flow: flow.into(),
            run: RunConfig::default(),
        }
    }

    /// Builder method: set the run config
    pub fn with_run_config(mut self, run: RunConfig) -> Self {
        self.run = run;
        self
    }

    /// Parse and validate a spec from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let spec: Self = serde_json::from_str(json)?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<()> {
        if self.flow.is_empty() {
            return Err(ChainError::invalid_config("flow must name at least one handler"));
        }
        self.run.validate()
    }

    /// Select the named handlers from `catalog`, in flow order.
    ///
    /// # Errors
    ///
    /// [`ChainError::HandlerNotFound`] when a name has no match in `catalog`.
    pub fn build(&self, catalog: &HandlerChain) -> Result<HandlerChain> {
        catalog.select(&self.flow)
    }
}
