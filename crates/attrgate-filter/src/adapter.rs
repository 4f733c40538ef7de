//! Adapters between rules and matchers.
//!
//! - [`PolicyFromMatcher`]: a rule that is True if a matcher selects any value
//!   of any attribute.
//! - [`PolicyFromMatcherId`]: the same, restricted to one attribute.
//! - [`MatcherFromPolicy`]: a matcher that selects all or nothing depending
//!   on a rule.

use attrgate_types::{Attribute, trim_to_option};
use tracing::debug;

use crate::context::FilterContext;
use crate::error::{FilterError, Result};
use crate::lifecycle::{
    Component, ComponentState, Lifecycle, check_depth, ensure_child_initialized,
};
use crate::matcher::{MatchOutcome, Matcher, SharedMatcher};
use crate::rule::{PolicyRequirementRule, SharedRule};
use crate::tristate::Tristate;

/// `Component` impl for an adapter wrapping `$inner`. The optional closure
/// adds validation of the adapter's own settings.
macro_rules! adapter_component {
    ($name:ident, $inner:ident) => {
        adapter_component!($name, $inner, |_this: &$name| Ok(()));
    };
    ($name:ident, $inner:ident, $validate:expr) => {
        impl Component for $name {
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
                let validate: fn(&$name) -> Result<()> = $validate;
                validate(self)?;
                ensure_child_initialized(self.id(), &*self.$inner)?;
                check_depth(self.id(), self.depth())?;
                self.lifecycle.mark_initialized();
                Ok(())
            }

            fn destroy(&mut self) {
                self.lifecycle.destroy();
            }
        }
    };
}

// ============================================================================
// Untargeted: matcher over every attribute
// ============================================================================

/// True if the matcher selects at least one value of any prefiltered
/// attribute. Attributes are scanned in id order; a failed matcher on any
/// of them makes the rule `Fail`.
#[derive(Debug)]
pub struct PolicyFromMatcher {
    lifecycle: Lifecycle,
    matcher: SharedMatcher,
}

impl PolicyFromMatcher {
    pub fn new(id: impl AsRef<str>, matcher: SharedMatcher) -> Self {
        Self {
            lifecycle: Lifecycle::new(id),
            matcher,
        }
    }
}

adapter_component!(PolicyFromMatcher, matcher);

impl PolicyRequirementRule for PolicyFromMatcher {
    fn matches(&self, context: &FilterContext) -> Result<Tristate> {
        self.lifecycle.ensure_usable()?;
        let mut found = false;
        for attribute in context.prefiltered_attributes().values() {
            match self.matcher.matching_values(attribute, context)? {
                MatchOutcome::Failed => {
                    debug!(rule = %self.id(), attribute = %attribute.id(), "matcher failed");
                    return Ok(Tristate::Fail);
                }
                MatchOutcome::Matched(values) => found |= !values.is_empty(),
            }
        }
        Ok(found.into())
    }

    fn depth(&self) -> usize {
        1 + self.matcher.depth()
    }
}

// ============================================================================
// Targeted: matcher over one attribute
// ============================================================================

/// True if the matcher selects at least one value of the named attribute.
/// An absent attribute is `False`; a failed matcher is `Fail`.
#[derive(Debug)]
pub struct PolicyFromMatcherId {
    lifecycle: Lifecycle,
    attribute_id: String,
    matcher: SharedMatcher,
}

impl PolicyFromMatcherId {
    pub fn new(id: impl AsRef<str>, attribute_id: &str, matcher: SharedMatcher) -> Self {
        Self {
            lifecycle: Lifecycle::new(id),
            attribute_id: trim_to_option(attribute_id).unwrap_or_default().to_string(),
            matcher,
        }
    }

    pub fn attribute_id(&self) -> &str {
        &self.attribute_id
    }
}

adapter_component!(PolicyFromMatcherId, matcher, |this: &PolicyFromMatcherId| {
    if this.attribute_id.is_empty() {
        return Err(FilterError::invalid_configuration(
            this.id(),
            "attribute id must not be empty",
        ));
    }
    Ok(())
});

impl PolicyRequirementRule for PolicyFromMatcherId {
    fn matches(&self, context: &FilterContext) -> Result<Tristate> {
        self.lifecycle.ensure_usable()?;
        let Some(attribute) = context.prefiltered_attribute(&self.attribute_id) else {
            debug!(rule = %self.id(), attribute = %self.attribute_id, "attribute not present");
            return Ok(Tristate::False);
        };
        Ok(match self.matcher.matching_values(attribute, context)? {
            MatchOutcome::Failed => Tristate::Fail,
            MatchOutcome::Matched(values) => (!values.is_empty()).into(),
        })
    }

    fn depth(&self) -> usize {
        1 + self.matcher.depth()
    }
}

// ============================================================================
// Rule as matcher
// ============================================================================

/// Selects every value when the rule is True, none when False, and fails
/// when the rule fails.
#[derive(Debug)]
pub struct MatcherFromPolicy {
    lifecycle: Lifecycle,
    rule: SharedRule,
}

impl MatcherFromPolicy {
    pub fn new(id: impl AsRef<str>, rule: SharedRule) -> Self {
        Self {
            lifecycle: Lifecycle::new(id),
            rule,
        }
    }
}

adapter_component!(MatcherFromPolicy, rule);

impl Matcher for MatcherFromPolicy {
    fn matching_values(
        &self,
        attribute: &Attribute,
        context: &FilterContext,
    ) -> Result<MatchOutcome> {
        self.lifecycle.ensure_usable()?;
        Ok(match self.rule.matches(context)? {
            Tristate::True => MatchOutcome::Matched(attribute.values().iter().cloned().collect()),
            Tristate::False => MatchOutcome::empty(),
            Tristate::Fail => MatchOutcome::Failed,
        })
    }

    fn depth(&self) -> usize {
        1 + self.rule.depth()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use attrgate_types::AttributeValue;
    use test_case::test_case;

    use super::*;
    use crate::matcher::{MatcherFails, MatchesNone, ValueMatcher};
    use crate::rule::{AnyRule, FailingRule, NoneRule};

    fn ctx() -> FilterContext {
        FilterContext::from_attributes([
            Attribute::new("cn").unwrap().with_value("John Smith"),
            Attribute::new("uid").unwrap().with_value("jsmith"),
        ])
    }

    fn equals(text: &str) -> SharedMatcher {
        Arc::new(
            ValueMatcher::value_string("eq", text, true)
                .into_initialized()
                .unwrap(),
        )
    }

    #[test_case(equals("jsmith"), Tristate::True; "found in one attribute")]
    #[test_case(equals("nobody"), Tristate::False; "found nowhere")]
    #[test_case(Arc::new(MatchesNone::new()), Tristate::False; "matches none")]
    #[test_case(Arc::new(MatcherFails::new()), Tristate::Fail; "matcher fails")]
    fn policy_from_matcher(matcher: SharedMatcher, expected: Tristate) {
        let rule = PolicyFromMatcher::new("p", matcher).into_initialized().unwrap();
        assert_eq!(rule.matches(&ctx()).unwrap(), expected);
    }

    #[test_case("uid", equals("jsmith"), Tristate::True; "hit")]
    #[test_case("cn", equals("jsmith"), Tristate::False; "miss")]
    #[test_case("mail", equals("jsmith"), Tristate::False; "absent attribute")]
    #[test_case("uid", Arc::new(MatcherFails::new()), Tristate::Fail; "matcher fails")]
    fn policy_from_matcher_id(attribute_id: &str, matcher: SharedMatcher, expected: Tristate) {
        let rule = PolicyFromMatcherId::new("p", attribute_id, matcher)
            .into_initialized()
            .unwrap();
        assert_eq!(rule.matches(&ctx()).unwrap(), expected);
    }

    #[test]
    fn policy_from_matcher_id_requires_attribute() {
        assert!(matches!(
            PolicyFromMatcherId::new("p", " ", equals("x")).into_initialized(),
            Err(FilterError::InvalidConfiguration { .. })
        ));
    }

    #[test_case(Arc::new(AnyRule::new()), MatchOutcome::Matched(std::iter::once(AttributeValue::string("jsmith")).collect()); "true selects all")]
    #[test_case(Arc::new(NoneRule::new()), MatchOutcome::empty(); "false selects none")]
    #[test_case(Arc::new(FailingRule::new()), MatchOutcome::Failed; "fail fails")]
    fn matcher_from_policy(rule: SharedRule, expected: MatchOutcome) {
        let matcher = MatcherFromPolicy::new("m", rule).into_initialized().unwrap();
        let context = ctx();
        let uid = context.prefiltered_attribute("uid").unwrap();
        assert_eq!(matcher.matching_values(uid, &context).unwrap(), expected);
    }

    #[test]
    fn uninitialized_inner_component_fails_initialization() {
        let bare_matcher: SharedMatcher = Arc::new(ValueMatcher::value_string("bare", "x", true));
        let bare_rule: SharedRule =
            Arc::new(crate::rule::NotRule::new("bare", Arc::new(AnyRule::new())));

        assert!(matches!(
            PolicyFromMatcher::new("p", bare_matcher.clone()).into_initialized(),
            Err(FilterError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            PolicyFromMatcherId::new("p", "uid", bare_matcher).into_initialized(),
            Err(FilterError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            MatcherFromPolicy::new("m", bare_rule).into_initialized(),
            Err(FilterError::InvalidConfiguration { .. })
        ));
    }
}
