//! Binding of a matcher to one attribute, as a permit or deny rule.

use attrgate_types::trim_to_option;
use tracing::{debug, warn};

use crate::context::FilterContext;
use crate::error::{FilterError, Result};
use crate::lifecycle::{Component, ComponentState, Lifecycle, ensure_child_initialized};
use crate::matcher::{MatchOutcome, SharedMatcher, ValueSet};

/// Runs a matcher against one attribute and records the result.
///
/// A permit rule adds the matched values to the permitted set. A deny rule
/// adds them to the denied set; if its matcher fails, every value of the
/// attribute is denied.
#[derive(Debug)]
pub struct AttributeRule {
    lifecycle: Lifecycle,
    attribute_id: String,
    matcher: SharedMatcher,
    deny: bool,
}

impl AttributeRule {
    /// Creates a permit rule.
    pub fn permit(id: impl AsRef<str>, attribute_id: &str, matcher: SharedMatcher) -> Self {
        Self {
            lifecycle: Lifecycle::new(id),
            attribute_id: normalize(attribute_id),
            matcher,
            deny: false,
        }
    }

    /// Creates a deny rule.
    pub fn deny(id: impl AsRef<str>, attribute_id: &str, matcher: SharedMatcher) -> Self {
        Self {
            deny: true,
            ..Self::permit(id, attribute_id, matcher)
        }
    }

    pub fn attribute_id(&self) -> &str {
        &self.attribute_id
    }

    pub fn matcher(&self) -> &SharedMatcher {
        &self.matcher
    }

    pub fn is_deny_rule(&self) -> bool {
        self.deny
    }

    pub fn set_attribute_id(&mut self, attribute_id: &str) -> Result<()> {
        self.lifecycle.ensure_modifiable()?;
        self.attribute_id = normalize(attribute_id);
        Ok(())
    }

    pub fn set_matcher(&mut self, matcher: SharedMatcher) -> Result<()> {
        self.lifecycle.ensure_modifiable()?;
        self.matcher = matcher;
        Ok(())
    }

    pub fn set_deny(&mut self, deny: bool) -> Result<()> {
        self.lifecycle.ensure_modifiable()?;
        self.deny = deny;
        Ok(())
    }

    /// Runs the matcher against the target attribute of `context` and
    /// records the outcome.
    ///
    /// An absent or value-less attribute is a no-op.
    pub fn apply(&self, context: &mut FilterContext) -> Result<()> {
        self.lifecycle.ensure_usable()?;

        let values: ValueSet = {
            let Some(attribute) = context.prefiltered_attribute(&self.attribute_id) else {
                debug!(rule = %self.id(), attribute = %self.attribute_id, "attribute not present; skipped");
                return Ok(());
            };
            if attribute.is_empty() {
                debug!(rule = %self.id(), attribute = %self.attribute_id, "attribute has no values; skipped");
                return Ok(());
            }

            match self.matcher.matching_values(attribute, context)? {
                MatchOutcome::Matched(values) => values,
                MatchOutcome::Failed if self.deny => {
                    warn!(
                        rule = %self.id(),
                        attribute = %self.attribute_id,
                        "deny matcher failed; denying all values"
                    );
                    attribute.values().iter().cloned().collect()
                }
                MatchOutcome::Failed => {
                    warn!(
                        rule = %self.id(),
                        attribute = %self.attribute_id,
                        "permit matcher failed; no values released by this rule"
                    );
                    return Ok(());
                }
            }
        };

        debug!(
            rule = %self.id(),
            attribute = %self.attribute_id,
            deny = self.deny,
            count = values.len(),
            "attribute rule matched"
        );
        if self.deny {
            context.add_denied_values(&self.attribute_id, values)
        } else {
            context.add_permitted_values(&self.attribute_id, values)
        }
    }
}

fn normalize(attribute_id: &str) -> String {
    trim_to_option(attribute_id).unwrap_or_default().to_string()
}

impl Component for AttributeRule {
    fn id(&self) -> &str {
        self.lifecycle.id()
    }

    fn state(&self) -> ComponentState {
        self.lifecycle.state()
    }

    fn initialize(&mut self) -> Result<()> {
        if !self.lifecycle.needs_initialization()? {
            return Ok(());
        }
        if self.attribute_id.is_empty() {
            return Err(FilterError::invalid_configuration(
                self.id(),
                "attribute id must not be empty",
            ));
        }
        ensure_child_initialized(self.id(), &*self.matcher)?;
        self.lifecycle.mark_initialized();
        Ok(())
    }

    fn destroy(&mut self) {
        self.lifecycle.destroy();
    }
}
