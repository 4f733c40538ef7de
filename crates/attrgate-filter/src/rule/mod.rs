//! Policy requirement rules: decide whether a policy applies to a request.
//!
//! Rules compose into trees of [`AndRule`], [`OrRule`] and [`NotRule`] over
//! leaf predicates. Evaluation is read-only on the [`FilterContext`].

mod logic;
mod predicate;

use std::fmt::Debug;
use std::sync::Arc;

pub use logic::{AndRule, NotRule, OrRule};
pub use predicate::{ContextFieldRule, NumOfAttributeValuesRule};

use crate::context::FilterContext;
use crate::error::Result;
use crate::lifecycle::{Component, ComponentState, Lifecycle};
use crate::tristate::Tristate;

/// Decides whether a policy applies to the request in a [`FilterContext`].
pub trait PolicyRequirementRule: Component + Debug + Send + Sync {
    /// Evaluates the rule.
    ///
    /// `Ok(Tristate::Fail)` means the rule could not decide. `Err` is
    /// reserved for lifecycle violations and evaluation faults.
    fn matches(&self, context: &FilterContext) -> Result<Tristate>;

    /// Nesting depth of this rule tree; leaves are 1.
    fn depth(&self) -> usize {
        1
    }
}

/// Shared, immutable rule handle.
pub type SharedRule = Arc<dyn PolicyRequirementRule>;

// ============================================================================
// Constant rules
// ============================================================================

macro_rules! constant_rule {
    ($(#[$doc:meta])* $name:ident, $verdict:expr) => {
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

        impl PolicyRequirementRule for $name {
            fn matches(&self, _context: &FilterContext) -> Result<Tristate> {
                self.lifecycle.ensure_usable()?;
                Ok($verdict)
            }
        }
    };
}

constant_rule!(
    /// Always `True`.
    AnyRule,
    Tristate::True
);
constant_rule!(
    /// Always `False`.
    NoneRule,
    Tristate::False
);
constant_rule!(
    /// Always `Fail`.
    FailingRule,
    Tristate::Fail
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FilterError;

    #[test]
    fn constants_are_ready_to_use() {
        let ctx = FilterContext::new(Default::default());
        assert_eq!(AnyRule::new().matches(&ctx).unwrap(), Tristate::True);
        assert_eq!(NoneRule::new().matches(&ctx).unwrap(), Tristate::False);
        assert_eq!(FailingRule::new().matches(&ctx).unwrap(), Tristate::Fail);
    }

    #[test]
    fn destroyed_constant_is_unusable() {
        let ctx = FilterContext::new(Default::default());
        let mut rule = AnyRule::new();
        rule.destroy();

        assert!(matches!(rule.matches(&ctx), Err(FilterError::Destroyed { .. })));
        assert!(rule.initialize().is_err());
    }
}
