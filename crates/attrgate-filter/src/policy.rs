//! Attribute filter policies.
//!
//! A policy pairs one [`PolicyRequirementRule`] with the
//! [`AttributeRule`]s that apply when the rule is True.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use attrgate_filter::{AttributeFilterPolicy, AttributeRule, Component, ContextFieldRule, MatchesAll};
//!
//! let rule = ContextFieldRule::requester("sp", "https://sp.example.org").into_initialized()?;
//! let policy = AttributeFilterPolicy::new("releaseMailToSp", Arc::new(rule))
//!     .with_attribute_rule(AttributeRule::permit("mail", "mail", Arc::new(MatchesAll::new())))
//!     .into_initialized()?;
//!
//! assert_eq!(policy.attribute_rules().len(), 1);
//! # Ok::<(), attrgate_filter::FilterError>(())
//! ```

use tracing::{debug, warn};

use crate::attribute_rule::AttributeRule;
use crate::context::FilterContext;
use crate::error::{FilterError, Result};
use crate::lifecycle::{Component, ComponentState, Lifecycle, ensure_child_initialized};
use crate::rule::SharedRule;
use crate::tristate::Tristate;

/// One requirement rule plus the attribute rules it guards.
#[derive(Debug)]
pub struct AttributeFilterPolicy {
    lifecycle: Lifecycle,
    rule: SharedRule,
    attribute_rules: Vec<AttributeRule>,
}

impl AttributeFilterPolicy {
    pub fn new(id: impl AsRef<str>, rule: SharedRule) -> Self {
        Self {
            lifecycle: Lifecycle::new(id),
            rule,
            attribute_rules: Vec::new(),
        }
    }

    /// Adds an attribute rule (builder form).
    pub fn with_attribute_rule(mut self, attribute_rule: AttributeRule) -> Self {
        self.attribute_rules.push(attribute_rule);
        self
    }

    pub fn add_attribute_rule(&mut self, attribute_rule: AttributeRule) -> Result<()> {
        self.lifecycle.ensure_modifiable()?;
        self.attribute_rules.push(attribute_rule);
        Ok(())
    }

    pub fn rule(&self) -> &SharedRule {
        &self.rule
    }

    pub fn attribute_rules(&self) -> &[AttributeRule] {
        &self.attribute_rules
    }

    /// Evaluates the requirement rule. `Fail` counts as not applicable.
    pub fn is_applicable(&self, context: &FilterContext) -> Result<bool> {
        self.lifecycle.ensure_usable()?;
        let verdict = self.rule.matches(context)?;
        match verdict {
            Tristate::True => debug!(policy = %self.id(), "policy applies"),
            Tristate::False => debug!(policy = %self.id(), "policy does not apply"),
            Tristate::Fail => warn!(
                policy = %self.id(),
                rule = %self.rule.id(),
                "policy requirement rule could not be evaluated; policy not applied"
            ),
        }
        Ok(verdict.is_true())
    }

    /// Applies the attribute rules if the policy is applicable.
    ///
    /// Returns whether the policy applied.
    pub fn apply(&self, context: &mut FilterContext) -> Result<bool> {
        if !self.is_applicable(context)? {
            return Ok(false);
        }
        for attribute_rule in &self.attribute_rules {
            attribute_rule.apply(context)?;
        }
        Ok(true)
    }
}

impl Component for AttributeFilterPolicy {
    fn id(&self) -> &str {
        self.lifecycle.id()
    }

    fn state(&self) -> ComponentState {
        self.lifecycle.state()
    }

    /// Validates the policy and initializes its attribute rules.
    fn initialize(&mut self) -> Result<()> {
        if !self.lifecycle.needs_initialization()? {
            return Ok(());
        }
        if self.attribute_rules.is_empty() {
            return Err(FilterError::invalid_configuration(
                self.id(),
                "policy requires at least one attribute rule",
            ));
        }
        ensure_child_initialized(self.id(), &*self.rule)?;
        for attribute_rule in &mut self.attribute_rules {
            attribute_rule.initialize()?;
        }
        self.lifecycle.mark_initialized();
        Ok(())
    }

    fn destroy(&mut self) {
        for attribute_rule in &mut self.attribute_rules {
            attribute_rule.destroy();
        }
        self.lifecycle.destroy();
    }
}
