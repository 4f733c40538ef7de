//! # attrgate-filter: Attribute release filtering
//!
//! Decides, per relying-party request, which attributes and which of their
//! values an identity provider may release.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  FilterContext                                │
//! │  (prefiltered attributes + requester/issuer)  │
//! └──────────────────┬───────────────────────────┘
//!                    │
//!                    ▼
//! ┌──────────────────────────────────────────────┐
//! │  AttributeFilter (policies in order)          │
//! │  ├─ PolicyRequirementRule → True/False/Fail   │
//! │  └─ AttributeRule × N                         │
//! │       └─ Matcher → permitted / denied values  │
//! └──────────────────┬───────────────────────────┘
//!                    │
//!                    ▼
//! ┌──────────────────────────────────────────────┐
//! │  Filtered attributes                          │
//! │  values ∩ permitted − denied, original order  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Rules answer "does this policy apply?" with a [`Tristate`]. Matchers
//! answer "which values pass?" with a [`MatchOutcome`]. Both compose with
//! AND/OR/NOT and are shared as `Arc<dyn ...>` trees that are immutable once
//! initialized.
//!
//! The engine fails closed: any error during a pass releases nothing.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use attrgate_filter::{
//!     AttributeFilter, AttributeFilterPolicy, AttributeRule, Component, ContextFieldRule,
//!     FilterContext, ValueMatcher,
//! };
//! use attrgate_types::Attribute;
//!
//! let requester = ContextFieldRule::requester("isSp", "https://sp.example.org").into_initialized()?;
//! let example_org = ValueMatcher::value_regex("exampleOrgMail", r".*@example\.org")?.into_initialized()?;
//!
//! let engine = AttributeFilter::new("engine")
//!     .with_policy(
//!         AttributeFilterPolicy::new("mailToSp", Arc::new(requester))
//!             .with_attribute_rule(AttributeRule::permit("mail", "mail", Arc::new(example_org))),
//!     )
//!     .into_initialized()?;
//!
//! let context = FilterContext::from_attributes([
//!     Attribute::new("mail")?.with_value("a@example.org").with_value("b@other.org"),
//!     Attribute::new("uid")?.with_value("jsmith"),
//! ])
//! .with_requester("https://sp.example.org");
//!
//! let released = engine.filter(context)?;
//! assert_eq!(released.len(), 1);
//! assert_eq!(released["mail"].values().len(), 1);
//! # Ok::<(), attrgate_filter::FilterError>(())
//! ```

pub mod adapter;
pub mod attribute_rule;
pub mod comparison;
pub mod context;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod matcher;
pub mod policy;
pub mod rule;
pub mod tristate;

// Kani proofs for bounded model checking
#[cfg(any(test, kani))]
mod kani_proofs;


pub use adapter::{MatcherFromPolicy, PolicyFromMatcher, PolicyFromMatcherId};
pub use attribute_rule::AttributeRule;
pub use comparison::Comparison;
pub use context::{ContextField, ContextPhase, FilterContext};
pub use engine::AttributeFilter;
pub use error::{ErrorClass, FilterError, Result};
pub use lifecycle::{Component, ComponentState, Lifecycle, MAX_COMPOSITION_DEPTH};
pub use matcher::{
    AndMatcher, MatchOutcome, Matcher, MatcherFails, MatchesAll, MatchesNone, NotMatcher,
    OrFailurePolicy, OrMatcher, SharedMatcher, ValueMatcher, ValueSet, ValueTarget,
};
pub use policy::AttributeFilterPolicy;
pub use rule::{
    AndRule, AnyRule, ContextFieldRule, FailingRule, NoneRule, NotRule,
    NumOfAttributeValuesRule, OrRule, PolicyRequirementRule, SharedRule,
};
pub use tristate::Tristate;
