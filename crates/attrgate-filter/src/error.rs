//! Error types for the filtering engine.
//!
//! Indeterminate evaluations are *not* errors: a rule that cannot decide
//! returns [`Tristate::Fail`](crate::Tristate::Fail) and a matcher that cannot
//! run returns [`MatchOutcome::Failed`](crate::MatchOutcome::Failed). Anything
//! surfacing as a [`FilterError`] during a filtering pass aborts that pass.

use attrgate_types::TypesError;
use thiserror::Error;

/// Broad category of a [`FilterError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Detected while building or initializing components; prevents startup.
    Configuration,
    /// Misuse of the API by the caller (a programming error).
    ContractViolation,
    /// Unexpected failure inside a leaf predicate during a pass.
    EvaluationFault,
}

/// Error type for the filtering engine.
#[derive(Debug, Error)]
pub enum FilterError {
    /// A component failed validation during construction or initialization.
    #[error("Invalid configuration for '{component}': {reason}")]
    InvalidConfiguration { component: String, reason: String },

    /// A setter was called on a component that is already initialized.
    #[error("Component '{component}' is initialized and can no longer be modified")]
    Unmodifiable { component: String },

    /// A component was used before `initialize` succeeded.
    #[error("Component '{component}' has not been initialized")]
    Uninitialized { component: String },

    /// A component was used after `destroy`.
    #[error("Component '{component}' has been destroyed")]
    Destroyed { component: String },

    /// The caller broke an API contract (unknown attribute id, foreign value, reused context).
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    /// A leaf predicate hit an unexpected condition.
    #[error("Evaluation fault in '{component}': {reason}")]
    EvaluationFault { component: String, reason: String },

    /// Invalid attribute data.
    #[error(transparent)]
    Types(#[from] TypesError),
}

impl FilterError {
    /// Shorthand for [`FilterError::InvalidConfiguration`].
    pub fn invalid_configuration(component: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            component: component.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for [`FilterError::EvaluationFault`].
    pub fn evaluation_fault(component: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::EvaluationFault {
            component: component.into(),
            reason: reason.into(),
        }
    }

    /// Returns the category of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidConfiguration { .. } | Self::Unmodifiable { .. } | Self::Types(_) => {
                ErrorClass::Configuration
            }
            Self::Uninitialized { .. } | Self::Destroyed { .. } | Self::ContractViolation(_) => {
                ErrorClass::ContractViolation
            }
            Self::EvaluationFault { .. } => ErrorClass::EvaluationFault,
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, FilterError>;
