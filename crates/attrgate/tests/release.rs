//! Release service behaviour with configuration loaded from disk.

use std::fs;
use std::sync::Arc;

use attrgate::{
    Attribute, AttrgateConfig, AttributeFilterPolicy, AttributeReleaseService, AttributeRule,
    AttributeValue, Component, ComponentFactory, ComponentState, ConfigLoader, ErrorClass,
    FilterContext, FilterError, Lifecycle, MatcherFails, MatchesAll, PolicyFromMatcherId,
    PolicyRequirementRule, Result, SharedMatcher, Tristate, ValueMatcher,
};
use tempfile::tempdir;

fn affiliation_context() -> FilterContext {
    FilterContext::from_attributes([
        Attribute::new("eduPersonAffiliation")
            .unwrap()
            .with_values([
                AttributeValue::string("staff"),
                AttributeValue::string("member"),
            ]),
        Attribute::new("uid").unwrap().with_value("jsmith"),
    ])
    .with_requester("https://sp.example.org")
}

/// Staff members get their staff affiliation. The uid rule's OR matcher has
/// only a failing child, so its outcome depends on the configured policy.
fn policies(factory: &ComponentFactory) -> Vec<AttributeFilterPolicy> {
    let staff: SharedMatcher = Arc::new(
        ValueMatcher::value_string("staff", "staff", true)
            .into_initialized()
            .unwrap(),
    );
    let broken: SharedMatcher = Arc::new(MatcherFails::new());
    let is_staff = PolicyFromMatcherId::new("isStaff", "eduPersonAffiliation", staff.clone())
        .into_initialized()
        .unwrap();

    vec![
        AttributeFilterPolicy::new("staffOnly", Arc::new(is_staff))
            .with_attribute_rule(AttributeRule::permit(
                "affiliation",
                "eduPersonAffiliation",
                factory.or_matcher("staffOrBroken", vec![staff]).unwrap(),
            ))
            .with_attribute_rule(AttributeRule::permit(
                "uid",
                "uid",
                factory.or_matcher("allBroken", vec![broken]).unwrap(),
            )),
    ]
}

#[test]
fn release_with_default_configuration() {
    let config = AttrgateConfig::default();
    let factory = ComponentFactory::from_config(&config);
    let service = AttributeReleaseService::from_config(&config, policies(&factory)).unwrap();

    let released = service.release(affiliation_context());

    assert_eq!(released.len(), 1);
    assert_eq!(
        released["eduPersonAffiliation"].values(),
        &[AttributeValue::string("staff")]
    );
}

#[test]
fn configuration_file_drives_engine_settings() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    fs::write(
        temp_dir.path().join("attrgate.toml"),
        r#"
[engine]
id = "campus-idp"
or_matcher_all_failed = "empty"
"#,
    )
    .expect("Failed to write config");

    let config = ConfigLoader::new()
        .with_base_dir(temp_dir.path())
        .without_user_config()
        .with_env_prefix("ATTRGATE_RELEASE_TEST")
        .load()
        .expect("Failed to load config");
    let factory = ComponentFactory::from_config(&config);
    let service = AttributeReleaseService::from_config(&config, policies(&factory)).unwrap();

    assert_eq!(service.engine().id(), "campus-idp");
    // With "empty" the all-failed matcher simply selects nothing
    let released = service.try_release(affiliation_context()).unwrap();
    assert_eq!(released.len(), 1);
    assert!(!released.contains_key("uid"));
}

/// A rule whose evaluation hits a fault.
#[derive(Debug)]
struct Faulty {
    lifecycle: Lifecycle,
}

impl Component for Faulty {
    fn id(&self) -> &str {
        self.lifecycle.id()
    }

    fn state(&self) -> ComponentState {
        self.lifecycle.state()
    }

    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    fn destroy(&mut self) {
        self.lifecycle.destroy();
    }
}

impl PolicyRequirementRule for Faulty {
    fn matches(&self, _context: &FilterContext) -> Result<Tristate> {
        Err(FilterError::evaluation_fault(self.id(), "directory unavailable"))
    }
}

#[test]
fn release_is_fail_closed() {
    let faulty = Faulty {
        lifecycle: Lifecycle::initialized("faulty"),
    };
    let mut all_policies = policies(&ComponentFactory::default());
    all_policies.push(
        AttributeFilterPolicy::new("broken", Arc::new(faulty)).with_attribute_rule(
            AttributeRule::permit("uid", "uid", Arc::new(MatchesAll::new())),
        ),
    );
    let service =
        AttributeReleaseService::from_config(&AttrgateConfig::default(), all_policies).unwrap();

    let err = service.try_release(affiliation_context()).unwrap_err();
    assert_eq!(err.class(), ErrorClass::EvaluationFault);

    // The first policy released an affiliation before the fault; none of it escapes
    assert!(service.release(affiliation_context()).is_empty());
}

#[test]
fn destroyed_engine_cannot_be_wrapped() {
    let factory = ComponentFactory::default();
    let mut engine = factory.engine(policies(&factory)).unwrap();
    engine.destroy();

    assert!(matches!(
        AttributeReleaseService::new(engine),
        Err(FilterError::Destroyed { .. })
    ));
}

#[test]
fn missing_affiliation_releases_nothing() {
    let factory = ComponentFactory::default();
    let service =
        AttributeReleaseService::from_config(&AttrgateConfig::default(), policies(&factory)).unwrap();

    let no_affiliation = FilterContext::from_attributes([Attribute::new("uid")
        .unwrap()
        .with_value("jsmith")]);
    assert!(service.release(no_affiliation).is_empty());
}
