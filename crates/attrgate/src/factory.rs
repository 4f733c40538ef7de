//! Builds initialized components with the engine-wide settings applied.
//!
//! Whatever turns a policy description into components should go through a
//! [`ComponentFactory`] so that settings such as the OR-matcher failure
//! policy are applied uniformly.

use std::sync::Arc;

use attrgate_config::{AttrgateConfig, OrMatcherAllFailed};
use attrgate_filter::{
    AndMatcher, AndRule, AttributeFilter, AttributeFilterPolicy, Component, NotMatcher, NotRule,
    OrFailurePolicy, OrMatcher, OrRule, Result, SharedMatcher, SharedRule,
};

/// Factory for initialized composite components.
#[derive(Debug, Clone)]
pub struct ComponentFactory {
    engine_id: String,
    or_failure_policy: OrFailurePolicy,
}

impl ComponentFactory {
    pub fn new(engine_id: impl Into<String>, or_failure_policy: OrFailurePolicy) -> Self {
        Self {
            engine_id: engine_id.into(),
            or_failure_policy,
        }
    }

    pub fn from_config(config: &AttrgateConfig) -> Self {
        Self::new(
            config.engine.id.clone(),
            or_failure_policy(config.engine.or_matcher_all_failed),
        )
    }

    pub fn or_failure_policy(&self) -> OrFailurePolicy {
        self.or_failure_policy
    }

    pub fn and_rule(&self, id: &str, children: Vec<SharedRule>) -> Result<SharedRule> {
        Ok(Arc::new(AndRule::new(id, children).into_initialized()?))
    }

    pub fn or_rule(&self, id: &str, children: Vec<SharedRule>) -> Result<SharedRule> {
        Ok(Arc::new(OrRule::new(id, children).into_initialized()?))
    }

    pub fn not_rule(&self, id: &str, child: SharedRule) -> Result<SharedRule> {
        Ok(Arc::new(NotRule::new(id, child).into_initialized()?))
    }

    pub fn and_matcher(&self, id: &str, children: Vec<SharedMatcher>) -> Result<SharedMatcher> {
        Ok(Arc::new(AndMatcher::new(id, children).into_initialized()?))
    }

    /// OR matcher using the configured all-failed policy.
    pub fn or_matcher(&self, id: &str, children: Vec<SharedMatcher>) -> Result<SharedMatcher> {
        Ok(Arc::new(
            OrMatcher::new(id, children)
                .with_failure_policy(self.or_failure_policy)
                .into_initialized()?,
        ))
    }

    pub fn not_matcher(&self, id: &str, child: SharedMatcher) -> Result<SharedMatcher> {
        Ok(Arc::new(NotMatcher::new(id, child).into_initialized()?))
    }

    /// Engine over `policies`, named after the configured engine id.
    pub fn engine(
        &self,
        policies: impl IntoIterator<Item = AttributeFilterPolicy>,
    ) -> Result<AttributeFilter> {
        policies
            .into_iter()
            .fold(AttributeFilter::new(&self.engine_id), AttributeFilter::with_policy)
            .into_initialized()
    }
}

impl Default for ComponentFactory {
    fn default() -> Self {
        Self::from_config(&AttrgateConfig::default())
    }
}

fn or_failure_policy(setting: OrMatcherAllFailed) -> OrFailurePolicy {
    match setting {
        OrMatcherAllFailed::Fail => OrFailurePolicy::Fail,
        OrMatcherAllFailed::Empty => OrFailurePolicy::Empty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attrgate_filter::{FilterContext, MatchOutcome, Matcher, MatcherFails};
    use attrgate_types::Attribute;
    use test_case::test_case;

    #[test_case(OrMatcherAllFailed::Fail, MatchOutcome::Failed; "fail")]
    #[test_case(OrMatcherAllFailed::Empty, MatchOutcome::empty(); "empty")]
    fn or_matcher_follows_configuration(setting: OrMatcherAllFailed, expected: MatchOutcome) {
        let mut config = AttrgateConfig::default();
        config.engine.or_matcher_all_failed = setting;
        let factory = ComponentFactory::from_config(&config);

        let or = factory
            .or_matcher("or", vec![Arc::new(MatcherFails::new())])
            .unwrap();
        let attribute = Attribute::new("uid").unwrap().with_value("jsmith");
        let outcome = or
            .matching_values(&attribute, &FilterContext::new(Default::default()))
            .unwrap();
        assert_eq!(outcome, expected);
    }

    #[test]
    fn engine_uses_configured_id() {
        let mut config = AttrgateConfig::default();
        config.engine.id = "idp-filter".to_string();
        let engine = ComponentFactory::from_config(&config).engine([]).unwrap();

        assert_eq!(engine.id(), "idp-filter");
        assert!(engine.is_initialized());
    }

    #[test]
    fn configuration_errors_surface() {
        let factory = ComponentFactory::default();
        assert!(factory.and_rule("and", vec![]).is_err());
        assert!(factory.or_matcher("or", vec![]).is_err());
    }
}
