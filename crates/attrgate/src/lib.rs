//! # attrgate: Attribute release filtering for identity providers
//!
//! Decides which identity attributes, and which of their values, may be
//! released to a relying party.
//!
//! This crate re-exports the data model ([`attrgate_types`]) and the filter
//! engine ([`attrgate_filter`]) and adds the pieces an application needs
//! around them:
//!
//! - [`ComponentFactory`]: builds initialized composites with engine-wide
//!   settings from [`AttrgateConfig`] applied.
//! - [`AttributeReleaseService`]: fail-closed wrapper that logs errors and
//!   releases nothing when a pass fails.
//! - [`telemetry::init_tracing`]: `tracing-subscriber` setup.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use attrgate::{
//!     Attribute, AttrgateConfig, AttributeFilterPolicy, AttributeReleaseService, AttributeRule,
//!     Component, ContextFieldRule, FilterContext, MatchesAll,
//! };
//!
//! let is_sp = ContextFieldRule::requester("isSp", "https://sp.example.org").into_initialized()?;
//! let policy = AttributeFilterPolicy::new("uidToSp", Arc::new(is_sp))
//!     .with_attribute_rule(AttributeRule::permit("uid", "uid", Arc::new(MatchesAll::new())));
//!
//! let service = AttributeReleaseService::from_config(&AttrgateConfig::default(), [policy])?;
//!
//! let context = FilterContext::from_attributes([Attribute::new("uid")?.with_value("jsmith")])
//!     .with_requester("https://sp.example.org");
//! assert_eq!(service.release(context).len(), 1);
//! # Ok::<(), anyhow::Error>(())
//! ```

mod factory;
mod service;
pub mod telemetry;

pub use attrgate_config::{
    AttrgateConfig, ConfigLoader, EngineConfig, LoggingConfig, OrMatcherAllFailed,
};
pub use attrgate_filter::*;
pub use attrgate_types::{Attribute, AttributeMap, AttributeValue, EmptyValue, ScopedValue};
pub use factory::ComponentFactory;
pub use service::AttributeReleaseService;
