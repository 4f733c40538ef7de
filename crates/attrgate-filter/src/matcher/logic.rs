use attrgate_types::Attribute;
use tracing::{debug, trace};

use super::{MatchOutcome, Matcher, SharedMatcher, ValueSet};
use crate::context::FilterContext;
use crate::error::{FilterError, Result};
use crate::lifecycle::{
    Component, ComponentState, Lifecycle, check_depth, ensure_child_initialized,
};

fn child_depth(children: &[SharedMatcher]) -> usize {
    children.iter().map(|c| c.depth()).max().unwrap_or(0)
}

fn ensure_children(id: &str, children: &[SharedMatcher]) -> Result<()> {
    if children.is_empty() {
        return Err(FilterError::invalid_configuration(
            id,
            "composite matcher requires at least one child",
        ));
    }
    children
        .iter()
        .try_for_each(|child| ensure_child_initialized(id, &**child))
}

// ============================================================================
// AND
// ============================================================================

/// Intersection of the children's matches. Any failed child fails the whole.
#[derive(Debug)]
pub struct AndMatcher {
    lifecycle: Lifecycle,
    children: Vec<SharedMatcher>,
}

impl AndMatcher {
    pub fn new(id: impl AsRef<str>, children: Vec<SharedMatcher>) -> Self {
        Self {
            lifecycle: Lifecycle::new(id),
            children,
        }
    }

    pub fn children(&self) -> &[SharedMatcher] {
        &self.children
    }
}

impl Component for AndMatcher {
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
        ensure_children(self.id(), &self.children)?;
        check_depth(self.id(), self.depth())?;
        self.lifecycle.mark_initialized();
        Ok(())
    }

    fn destroy(&mut self) {
        self.lifecycle.destroy();
    }
}

impl Matcher for AndMatcher {
    fn matching_values(
        &self,
        attribute: &Attribute,
        context: &FilterContext,
    ) -> Result<MatchOutcome> {
        self.lifecycle.ensure_usable()?;

        // An empty intersection does not stop the scan: a later failure
        // still has to turn the result into Failed.
        let mut intersection: Option<ValueSet> = None;
        for child in &self.children {
            let MatchOutcome::Matched(values) = child.matching_values(attribute, context)? else {
                debug!(matcher = %self.id(), child = %child.id(), "child matcher failed");
                return Ok(MatchOutcome::Failed);
            };
            intersection = Some(match intersection {
                None => values,
                Some(acc) => acc.intersection(&values).cloned().collect(),
            });
        }
        Ok(MatchOutcome::Matched(intersection.unwrap_or_default()))
    }

    fn depth(&self) -> usize {
        1 + child_depth(&self.children)
    }
}

// ============================================================================
// OR
// ============================================================================

/// Outcome of an [`OrMatcher`] whose children all failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OrFailurePolicy {
    /// The OR fails too, mirroring the OR rule.
    #[default]
    Fail,
    /// The OR matches nothing.
    Empty,
}

/// Union of the children's matches. Failed children contribute nothing; if
/// all of them fail the [`OrFailurePolicy`] decides.
#[derive(Debug)]
pub struct OrMatcher {
    lifecycle: Lifecycle,
    children: Vec<SharedMatcher>,
    failure_policy: OrFailurePolicy,
}

impl OrMatcher {
    pub fn new(id: impl AsRef<str>, children: Vec<SharedMatcher>) -> Self {
        Self {
            lifecycle: Lifecycle::new(id),
            children,
            failure_policy: OrFailurePolicy::default(),
        }
    }

    /// Builder form of [`set_failure_policy`](Self::set_failure_policy) for
    /// components that are still being assembled.
    pub fn with_failure_policy(mut self, policy: OrFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn set_failure_policy(&mut self, policy: OrFailurePolicy) -> Result<()> {
        self.lifecycle.ensure_modifiable()?;
        self.failure_policy = policy;
        Ok(())
    }

    pub fn failure_policy(&self) -> OrFailurePolicy {
        self.failure_policy
    }

    pub fn children(&self) -> &[SharedMatcher] {
        &self.children
    }
}

impl Component for OrMatcher {
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
        ensure_children(self.id(), &self.children)?;
        check_depth(self.id(), self.depth())?;
        self.lifecycle.mark_initialized();
        Ok(())
    }

    fn destroy(&mut self) {
        self.lifecycle.destroy();
    }
}

impl Matcher for OrMatcher {
    fn matching_values(
        &self,
        attribute: &Attribute,
        context: &FilterContext,
    ) -> Result<MatchOutcome> {
        self.lifecycle.ensure_usable()?;

        let mut union = ValueSet::new();
        let mut any_succeeded = false;
        for child in &self.children {
            match child.matching_values(attribute, context)? {
                MatchOutcome::Matched(values) => {
                    any_succeeded = true;
                    union.extend(values);
                }
                MatchOutcome::Failed => {
                    trace!(matcher = %self.id(), child = %child.id(), "child matcher failed; skipped");
                }
            }
        }

        if any_succeeded {
            return Ok(MatchOutcome::Matched(union));
        }
        debug!(matcher = %self.id(), policy = ?self.failure_policy, "all child matchers failed");
        Ok(match self.failure_policy {
            OrFailurePolicy::Fail => MatchOutcome::Failed,
            OrFailurePolicy::Empty => MatchOutcome::empty(),
        })
    }

    fn depth(&self) -> usize {
        1 + child_depth(&self.children)
    }
}

// ============================================================================
// NOT
// ============================================================================

/// The attribute's values minus the child's matches.
#[derive(Debug)]
pub struct NotMatcher {
    lifecycle: Lifecycle,
    child: SharedMatcher,
}

impl NotMatcher {
    pub fn new(id: impl AsRef<str>, child: SharedMatcher) -> Self {
        Self {
            lifecycle: Lifecycle::new(id),
            child,
        }
    }

    pub fn child(&self) -> &SharedMatcher {
        &self.child
    }
}

impl Component for NotMatcher {
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
        ensure_child_initialized(self.id(), &*self.child)?;
        check_depth(self.id(), self.depth())?;
        self.lifecycle.mark_initialized();
        Ok(())
    }

    fn destroy(&mut self) {
        self.lifecycle.destroy();
    }
}

impl Matcher for NotMatcher {
    fn matching_values(
        &self,
        attribute: &Attribute,
        context: &FilterContext,
    ) -> Result<MatchOutcome> {
        self.lifecycle.ensure_usable()?;
        let MatchOutcome::Matched(excluded) = self.child.matching_values(attribute, context)? else {
            return Ok(MatchOutcome::Failed);
        };
        Ok(MatchOutcome::Matched(
            attribute
                .values()
                .iter()
                .filter(|v| !excluded.contains(*v))
                .cloned()
                .collect(),
        ))
    }

    fn depth(&self) -> usize {
        1 + self.child.depth()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use attrgate_types::AttributeValue;

    use super::*;
    use crate::matcher::{MatcherFails, MatchesAll, ValueMatcher};

    fn v(text: &str) -> AttributeValue {
        AttributeValue::string(text)
    }

    fn attribute() -> Attribute {
        Attribute::new("color")
            .unwrap()
            .with_values([v("red"), v("green"), v("blue")])
    }

    fn equals(text: &str) -> SharedMatcher {
        Arc::new(
            ValueMatcher::value_string(format!("is-{text}"), text, true)
                .into_initialized()
                .unwrap(),
        )
    }

    fn regex(pattern: &str) -> SharedMatcher {
        Arc::new(
            ValueMatcher::value_regex("regex", pattern)
                .unwrap()
                .into_initialized()
                .unwrap(),
        )
    }

    fn fails() -> SharedMatcher {
        Arc::new(MatcherFails::new())
    }

    fn set(values: &[&str]) -> ValueSet {
        values.iter().map(|t| v(t)).collect()
    }

    fn run(matcher: &dyn Matcher) -> MatchOutcome {
        matcher
            .matching_values(&attribute(), &FilterContext::new(Default::default()))
            .unwrap()
    }

    #[test]
    fn and_intersects() {
        let and = AndMatcher::new("and", vec![regex("red|green"), regex("green|blue")])
            .into_initialized()
            .unwrap();
        assert_eq!(run(&and), MatchOutcome::Matched(set(&["green"])));
    }

    #[test]
    fn and_fails_if_any_child_fails() {
        let and = AndMatcher::new("and", vec![equals("red"), fails()])
            .into_initialized()
            .unwrap();
        assert_eq!(run(&and), MatchOutcome::Failed);

        // Failure after an empty intersection still wins
        let and = AndMatcher::new("and", vec![equals("purple"), fails()])
            .into_initialized()
            .unwrap();
        assert_eq!(run(&and), MatchOutcome::Failed);
    }

    #[test]
    fn or_unions() {
        let or = OrMatcher::new("or", vec![regex("red|green"), regex("green|blue")])
            .into_initialized()
            .unwrap();
        assert_eq!(run(&or), MatchOutcome::Matched(set(&["red", "green", "blue"])));
    }

    #[test]
    fn or_skips_failed_children() {
        let or = OrMatcher::new("or", vec![fails(), equals("red")])
            .into_initialized()
            .unwrap();
        assert_eq!(run(&or), MatchOutcome::Matched(set(&["red"])));
    }

    #[test]
    fn or_all_failed_follows_policy() {
        let strict = OrMatcher::new("or", vec![fails(), fails()])
            .into_initialized()
            .unwrap();
        assert_eq!(run(&strict), MatchOutcome::Failed);

        let lenient = OrMatcher::new("or", vec![fails(), fails()])
            .with_failure_policy(OrFailurePolicy::Empty)
            .into_initialized()
            .unwrap();
        assert_eq!(run(&lenient), MatchOutcome::empty());
    }

    #[test]
    fn failure_policy_is_frozen_after_initialization() {
        let mut or = OrMatcher::new("or", vec![fails()]).into_initialized().unwrap();
        assert!(matches!(
            or.set_failure_policy(OrFailurePolicy::Empty),
            Err(FilterError::Unmodifiable { .. })
        ));
        assert_eq!(or.failure_policy(), OrFailurePolicy::Fail);
    }

    #[test]
    fn not_complements() {
        let not = NotMatcher::new("not", equals("red")).into_initialized().unwrap();
        assert_eq!(run(&not), MatchOutcome::Matched(set(&["green", "blue"])));

        let not_all = NotMatcher::new("not", Arc::new(MatchesAll::new()))
            .into_initialized()
            .unwrap();
        assert_eq!(run(&not_all), MatchOutcome::empty());

        let not_failed = NotMatcher::new("not", fails()).into_initialized().unwrap();
        assert_eq!(run(&not_failed), MatchOutcome::Failed);
    }

    #[test]
    fn empty_children_fail_at_initialization() {
        assert!(AndMatcher::new("and", vec![]).into_initialized().is_err());
        assert!(OrMatcher::new("or", vec![]).into_initialized().is_err());
    }

    #[test]
    fn composites_are_unusable_before_initialization() {
        let context = FilterContext::new(Default::default());
        let matchers: [(&str, Box<dyn Matcher>); 3] = [
            ("and", Box::new(AndMatcher::new("and", vec![equals("red")]))),
            ("or", Box::new(OrMatcher::new("or", vec![equals("red")]))),
            ("not", Box::new(NotMatcher::new("not", equals("red")))),
        ];
        for (id, matcher) in matchers {
            assert!(matches!(
                matcher.matching_values(&attribute(), &context),
                Err(FilterError::Uninitialized { component }) if component == id
            ));
        }
    }

    #[test]
    fn composites_are_unusable_after_destroy() {
        let context = FilterContext::new(Default::default());
        let mut and = AndMatcher::new("and", vec![equals("red")]).into_initialized().unwrap();
        let mut or = OrMatcher::new("or", vec![equals("red")]).into_initialized().unwrap();
        let mut not = NotMatcher::new("not", equals("red")).into_initialized().unwrap();
        and.destroy();
        or.destroy();
        not.destroy();

        for matcher in [&and as &dyn Matcher, &or, &not] {
            assert!(matches!(
                matcher.matching_values(&attribute(), &context),
                Err(FilterError::Destroyed { .. })
            ));
        }
    }

    #[test]
    fn uninitialized_child_fails_initialization() {
        let bare: SharedMatcher = Arc::new(ValueMatcher::value_string("bare", "red", true));

        assert!(matches!(
            AndMatcher::new("and", vec![equals("red"), bare.clone()]).into_initialized(),
            Err(FilterError::InvalidConfiguration { component, .. }) if component == "and"
        ));
        assert!(matches!(
            OrMatcher::new("or", vec![bare.clone()]).into_initialized(),
            Err(FilterError::InvalidConfiguration { .. })
        ));

        let mut not = NotMatcher::new("not", bare);
        assert!(not.initialize().is_err());
        assert_eq!(not.state(), ComponentState::Created);
    }
}
