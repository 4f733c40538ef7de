use attrgate_types::{Attribute, AttributeValue};

use super::{MatchOutcome, Matcher};
use crate::comparison::Comparison;
use crate::context::FilterContext;
use crate::error::Result;
use crate::lifecycle::{Component, ComponentState, Lifecycle};

/// Which part of a value a [`ValueMatcher`] compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueTarget {
    /// String values, and the value part of scoped values.
    Value,
    /// The scope of scoped values. Other kinds never match.
    Scope,
}

impl ValueTarget {
    fn text(self, value: &AttributeValue) -> Option<&str> {
        match self {
            Self::Value => value.as_text(),
            Self::Scope => value.scope(),
        }
    }
}

/// Leaf matcher selecting the values whose text (or scope) satisfies a
/// [`Comparison`]. Byte and empty values never match.
#[derive(Debug)]
pub struct ValueMatcher {
    lifecycle: Lifecycle,
    target: ValueTarget,
    comparison: Comparison,
}

impl ValueMatcher {
    pub fn new(id: impl AsRef<str>, target: ValueTarget, comparison: Comparison) -> Self {
        Self {
            lifecycle: Lifecycle::new(id),
            target,
            comparison,
        }
    }

    pub fn value_string(id: impl AsRef<str>, expected: &str, case_sensitive: bool) -> Self {
        Self::new(id, ValueTarget::Value, exact(expected, case_sensitive))
    }

    pub fn value_regex(id: impl AsRef<str>, pattern: &str) -> Result<Self> {
        Ok(Self::new(id, ValueTarget::Value, Comparison::regex(pattern)?))
    }

    pub fn scope_string(id: impl AsRef<str>, expected: &str, case_sensitive: bool) -> Self {
        Self::new(id, ValueTarget::Scope, exact(expected, case_sensitive))
    }

    pub fn scope_regex(id: impl AsRef<str>, pattern: &str) -> Result<Self> {
        Ok(Self::new(id, ValueTarget::Scope, Comparison::regex(pattern)?))
    }

    pub fn target(&self) -> ValueTarget {
        self.target
    }

    pub fn comparison(&self) -> &Comparison {
        &self.comparison
    }
}

fn exact(expected: &str, case_sensitive: bool) -> Comparison {
    if case_sensitive {
        Comparison::exact(expected)
    } else {
        Comparison::exact_ignore_case(expected)
    }
}

impl Component for ValueMatcher {
    fn id(&self) -> &str {
        self.lifecycle.id()
    }

    fn state(&self) -> ComponentState {
        self.lifecycle.state()
    }

    fn initialize(&mut self) -> Result<()> {
        if self.lifecycle.needs_initialization()? {
            self.lifecycle.mark_initialized();
        }
        Ok(())
    }

    fn destroy(&mut self) {
        self.lifecycle.destroy();
    }
}

impl Matcher for ValueMatcher {
    fn matching_values(
        &self,
        attribute: &Attribute,
        _context: &FilterContext,
    ) -> Result<MatchOutcome> {
        self.lifecycle.ensure_usable()?;
        Ok(MatchOutcome::Matched(
            attribute
                .values()
                .iter()
                .filter(|value| {
                    self.target
                        .text(value)
                        .is_some_and(|text| self.comparison.matches(text))
                })
                .cloned()
                .collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FilterError;
    use crate::matcher::ValueSet;

    fn affiliation() -> Attribute {
        Attribute::new("eduPersonScopedAffiliation").unwrap().with_values([
            AttributeValue::scoped("staff", "example.org"),
            AttributeValue::scoped("member", "partner.org"),
            AttributeValue::string("staff"),
            AttributeValue::bytes(b"staff".to_vec()),
            AttributeValue::zero_length(),
        ])
    }

    fn run(matcher: ValueMatcher) -> ValueSet {
        matcher
            .into_initialized()
            .unwrap()
            .matching_values(&affiliation(), &FilterContext::new(Default::default()))
            .unwrap()
            .into_values()
            .unwrap()
    }

    #[test]
    fn value_string_matches_strings_and_scoped_values() {
        let matched = run(ValueMatcher::value_string("m", "staff", true));
        assert_eq!(
            matched,
            [
                AttributeValue::scoped("staff", "example.org"),
                AttributeValue::string("staff"),
            ]
            .into_iter()
            .collect()
        );
    }

    #[test]
    fn value_string_case_insensitive() {
        let matched = run(ValueMatcher::value_string("m", "STAFF", false));
        assert_eq!(matched.len(), 2);
        assert!(run(ValueMatcher::value_string("m", "STAFF", true)).is_empty());
    }

    #[test]
    fn scope_string_only_sees_scoped_values() {
        let matched = run(ValueMatcher::scope_string("m", "partner.org", true));
        assert_eq!(
            matched,
            std::iter::once(AttributeValue::scoped("member", "partner.org")).collect()
        );
    }

    #[test]
    fn scope_regex() {
        let matched = run(ValueMatcher::scope_regex("m", r".*\.org").unwrap());
        assert_eq!(matched.len(), 2);
    }

    #[test]
    fn regex_never_matches_bytes_or_empty() {
        let matched = run(ValueMatcher::value_regex("m", ".*").unwrap());
        assert!(matched.iter().all(|v| v.as_text().is_some()));
        assert_eq!(matched.len(), 3);
    }

    #[test]
    fn invalid_regex_is_rejected_at_construction() {
        assert!(ValueMatcher::value_regex("m", "[").is_err());
    }

    #[test]
    fn unusable_before_initialization_and_after_destroy() {
        let context = FilterContext::new(Default::default());
        let mut matcher = ValueMatcher::value_string("staff", "staff", true);
        assert!(matches!(
            matcher.matching_values(&affiliation(), &context),
            Err(FilterError::Uninitialized { component }) if component == "staff"
        ));

        matcher.initialize().unwrap();
        matcher.destroy();
        assert!(matches!(
            matcher.matching_values(&affiliation(), &context),
            Err(FilterError::Destroyed { .. })
        ));
    }
}
