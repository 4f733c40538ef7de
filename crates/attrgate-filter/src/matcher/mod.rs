//! Matchers: select which values of an attribute may pass.
//!
//! A matcher only ever narrows. Every value it returns is one of the
//! attribute's own values; the [`FilterContext`] accumulator rejects anything
//! else.

mod logic;
mod value;

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::sync::Arc;

use attrgate_types::{Attribute, AttributeValue};

pub use logic::{AndMatcher, NotMatcher, OrFailurePolicy, OrMatcher};
pub use value::{ValueMatcher, ValueTarget};

use crate::context::FilterContext;
use crate::error::Result;
use crate::lifecycle::{Component, ComponentState, Lifecycle};

/// Distinct values selected by a matcher.
pub type ValueSet = BTreeSet<AttributeValue>;

/// Result of running a [`Matcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The matcher ran; these values passed (possibly none).
    Matched(ValueSet),
    /// The matcher could not decide.
    Failed,
}

impl MatchOutcome {
    /// `Matched` with no values.
    pub fn empty() -> Self {
        Self::Matched(ValueSet::new())
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed)
    }

    pub fn values(&self) -> Option<&ValueSet> {
        match self {
            Self::Matched(values) => Some(values),
            Self::Failed => None,
        }
    }

    pub fn into_values(self) -> Option<ValueSet> {
        match self {
            Self::Matched(values) => Some(values),
            Self::Failed => None,
        }
    }
}

/// Selects the values of an attribute that satisfy a predicate.
pub trait Matcher: Component + Debug + Send + Sync {
    /// Returns the subset of `attribute`'s values that pass.
    ///
    /// `Ok(MatchOutcome::Failed)` means the matcher could not decide. `Err`
    /// is reserved for lifecycle violations and evaluation faults.
    fn matching_values(&self, attribute: &Attribute, context: &FilterContext)
    -> Result<MatchOutcome>;

    /// Nesting depth of this matcher tree; leaves are 1.
    fn depth(&self) -> usize {
        1
    }
}

/// Shared, immutable matcher handle.
pub type SharedMatcher = Arc<dyn Matcher>;

// ============================================================================
// Constant matchers
// ============================================================================

macro_rules! constant_matcher {
    ($(#[$doc:meta])* $name:ident, |$attribute:ident| $outcome:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            lifecycle: Lifecycle,
        }

        impl $name {
            pub fn new() -> Self {
                Self {
                    lifecycle: Lifecycle::initialized(stringify!($name)),
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl Component for $name {
            fn id(&self) -> &str {
                self.lifecycle.id()
            }

            fn state(&self) -> ComponentState {
                self.lifecycle.state()
            }

            fn initialize(&mut self) -> Result<()> {
                self.lifecycle.needs_initialization().map(|_| ())
            }

            fn destroy(&mut self) {
                self.lifecycle.destroy();
            }
        }

        impl Matcher for $name {
            fn matching_values(
                &self,
                $attribute: &Attribute,
                _context: &FilterContext,
            ) -> Result<MatchOutcome> {
                self.lifecycle.ensure_usable()?;
                Ok($outcome)
            }
        }
    };
}

constant_matcher!(
    /// Selects every value.
    MatchesAll,
    |attribute| MatchOutcome::Matched(attribute.values().iter().cloned().collect())
);
constant_matcher!(
    /// Selects nothing.
    MatchesNone,
    |_attribute| MatchOutcome::empty()
);
constant_matcher!(
    /// Always fails.
    MatcherFails,
    |_attribute| MatchOutcome::Failed
);
