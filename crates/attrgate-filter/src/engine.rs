//! The attribute filter engine.
//!
//! Runs every policy in order against a [`FilterContext`], then computes for
//! each prefiltered attribute
//!
//! ```text
//! filtered = values ∩ permitted − denied
//! ```
//!
//! keeping the original value order. Attributes left without values are
//! dropped. Any error aborts the pass and leaves the output empty.

use attrgate_types::AttributeMap;
use tracing::{debug, info, warn};

use crate::context::FilterContext;
use crate::error::Result;
use crate::lifecycle::{Component, ComponentState, Lifecycle};
use crate::policy::AttributeFilterPolicy;

/// Ordered set of policies applied to each request.
#[derive(Debug)]
pub struct AttributeFilter {
    lifecycle: Lifecycle,
    policies: Vec<AttributeFilterPolicy>,
}

impl AttributeFilter {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self {
            lifecycle: Lifecycle::new(id),
            policies: Vec::new(),
        }
    }

    /// Appends a policy (builder form).
    pub fn with_policy(mut self, policy: AttributeFilterPolicy) -> Self {
        self.policies.push(policy);
        self
    }

    pub fn add_policy(&mut self, policy: AttributeFilterPolicy) -> Result<()> {
        self.lifecycle.ensure_modifiable()?;
        self.policies.push(policy);
        Ok(())
    }

    pub fn policies(&self) -> &[AttributeFilterPolicy] {
        &self.policies
    }

    /// Filters `context` in place.
    ///
    /// On success the result is available from
    /// [`FilterContext::filtered_attributes`]. On error the context's output
    /// is empty. Either way the context cannot be filtered again.
    pub fn filter_attributes(&self, context: &mut FilterContext) -> Result<()> {
        self.lifecycle.ensure_usable()?;
        context.begin_evaluation()?;

        match self.run(context) {
            Ok(filtered) => {
                info!(
                    engine = %self.id(),
                    requester = context.requester_id().unwrap_or("<unknown>"),
                    offered = context.prefiltered_attributes().len(),
                    released = filtered.len(),
                    "attribute filtering complete"
                );
                context.complete(filtered);
                Ok(())
            }
            Err(err) => {
                warn!(engine = %self.id(), error = %err, "attribute filtering aborted; releasing nothing");
                context.abort();
                Err(err)
            }
        }
    }

    /// Consumes `context` and returns the filtered attributes.
    pub fn filter(&self, mut context: FilterContext) -> Result<AttributeMap> {
        self.filter_attributes(&mut context)?;
        Ok(context.into_filtered())
    }

    fn run(&self, context: &mut FilterContext) -> Result<AttributeMap> {
        for policy in &self.policies {
            policy.apply(context)?;
        }

        let mut filtered = AttributeMap::new();
        for (id, attribute) in context.prefiltered_attributes() {
            let Some(permitted) = context.permitted_values(id) else {
                debug!(attribute = %id, "no values permitted; attribute removed");
                continue;
            };
            let denied = context.denied_values(id);
            let kept = attribute.retain_values(|value| {
                permitted.contains(value) && !denied.is_some_and(|d| d.contains(value))
            });
            if kept.is_empty() {
                debug!(attribute = %id, "all values filtered out; attribute removed");
                continue;
            }
            debug!(
                attribute = %id,
                kept = kept.values().len(),
                offered = attribute.values().len(),
                "attribute released"
            );
            filtered.insert(id.clone(), kept);
        }
        Ok(filtered)
    }
}

impl Component for AttributeFilter {
    fn id(&self) -> &str {
        self.lifecycle.id()
    }

    fn state(&self) -> ComponentState {
        self.lifecycle.state()
    }

    /// Initializes every policy. An engine without policies is valid and
    /// releases nothing.
    fn initialize(&mut self) -> Result<()> {
        if !self.lifecycle.needs_initialization()? {
            return Ok(());
        }
        for policy in &mut self.policies {
            policy.initialize()?;
        }
        self.lifecycle.mark_initialized();
        Ok(())
    }

    fn destroy(&mut self) {
        for policy in &mut self.policies {
            policy.destroy();
        }
        self.lifecycle.destroy();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use attrgate_types::{Attribute, AttributeValue};

    use super::*;
    use crate::attribute_rule::AttributeRule;
    use crate::context::ContextPhase;
    use crate::error::FilterError;
    use crate::matcher::MatchesAll;
    use crate::rule::AnyRule;

    fn release_all(attribute_id: &str) -> AttributeFilterPolicy {
        AttributeFilterPolicy::new(format!("all-{attribute_id}"), Arc::new(AnyRule::new()))
            .with_attribute_rule(AttributeRule::permit(
                attribute_id,
                attribute_id,
                Arc::new(MatchesAll::new()),
            ))
    }

    fn ctx() -> FilterContext {
        FilterContext::from_attributes([
            Attribute::new("uid").unwrap().with_value("jsmith"),
            Attribute::new("cn").unwrap().with_value("John Smith"),
        ])
    }

    #[test]
    fn attributes_without_permits_are_dropped() {
        let engine = AttributeFilter::new("engine")
            .with_policy(release_all("uid"))
            .into_initialized()
            .unwrap();
        let filtered = engine.filter(ctx()).unwrap();

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered["uid"].values(), &[AttributeValue::string("jsmith")]);
    }

    #[test]
    fn no_policies_release_nothing() {
        let engine = AttributeFilter::new("engine").into_initialized().unwrap();
        assert!(engine.filter(ctx()).unwrap().is_empty());
    }

    #[test]
    fn context_cannot_be_reused() {
        let engine = AttributeFilter::new("engine")
            .with_policy(release_all("uid"))
            .into_initialized()
            .unwrap();
        let mut ctx = ctx();
        engine.filter_attributes(&mut ctx).unwrap();
        assert_eq!(ctx.phase(), ContextPhase::Complete);

        assert!(matches!(
            engine.filter_attributes(&mut ctx),
            Err(FilterError::ContractViolation(_))
        ));
        // First result untouched
        assert_eq!(ctx.filtered_attributes().len(), 1);
    }

    #[test]
    fn uninitialized_engine_is_rejected() {
        let engine = AttributeFilter::new("engine").with_policy(release_all("uid"));
        assert!(matches!(
            engine.filter(ctx()),
            Err(FilterError::Uninitialized { .. })
        ));
    }

    #[test]
    fn policies_are_frozen_after_initialization() {
        let mut engine = AttributeFilter::new("engine").into_initialized().unwrap();
        assert!(matches!(
            engine.add_policy(release_all("uid")),
            Err(FilterError::Unmodifiable { .. })
        ));
    }
}
