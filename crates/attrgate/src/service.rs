//! Fail-closed entry point for callers that only want the released set.

use std::sync::Arc;

use attrgate_config::AttrgateConfig;
use attrgate_filter::{
    AttributeFilter, AttributeFilterPolicy, Component, FilterContext, FilterError,
};
use attrgate_types::AttributeMap;
use tracing::error;

use crate::factory::ComponentFactory;

/// Wraps an initialized [`AttributeFilter`] for use by request handlers.
///
/// Cheap to clone; clones share the engine.
#[derive(Debug, Clone)]
pub struct AttributeReleaseService {
    engine: Arc<AttributeFilter>,
}

impl AttributeReleaseService {
    /// Initializes `engine` (if needed) and wraps it.
    pub fn new(engine: AttributeFilter) -> Result<Self, FilterError> {
        Ok(Self {
            engine: Arc::new(engine.into_initialized()?),
        })
    }

    /// Builds the engine from `policies` with the engine settings of `config`.
    pub fn from_config(
        config: &AttrgateConfig,
        policies: impl IntoIterator<Item = AttributeFilterPolicy>,
    ) -> anyhow::Result<Self> {
        let engine = ComponentFactory::from_config(config).engine(policies)?;
        Ok(Self::new(engine)?)
    }

    pub fn engine(&self) -> &AttributeFilter {
        &self.engine
    }

    /// Filters `context`, surfacing any error.
    pub fn try_release(&self, context: FilterContext) -> Result<AttributeMap, FilterError> {
        self.engine.filter(context)
    }

    /// Filters `context`. Any error is logged and nothing is released.
    pub fn release(&self, context: FilterContext) -> AttributeMap {
        let requester = context.requester_id().unwrap_or("<unknown>").to_string();
        match self.try_release(context) {
            Ok(released) => released,
            Err(err) => {
                error!(
                    engine = %self.engine.id(),
                    %requester,
                    class = ?err.class(),
                    error = %err,
                    "attribute release failed; releasing nothing"
                );
                AttributeMap::new()
            }
        }
    }
}
