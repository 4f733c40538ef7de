//! Leaf rules that look at the request itself.

use attrgate_types::trim_to_option;
use tracing::debug;

use super::PolicyRequirementRule;
use crate::comparison::Comparison;
use crate::context::{ContextField, FilterContext};
use crate::error::{FilterError, Result};
use crate::lifecycle::{Component, ComponentState, Lifecycle};
use crate::tristate::Tristate;

// ============================================================================
// Identity field comparison
// ============================================================================

/// Compares one identity field of the request (requester, issuer, ...) with
/// a [`Comparison`]. A missing field yields `Fail`.
#[derive(Debug)]
pub struct ContextFieldRule {
    lifecycle: Lifecycle,
    field: ContextField,
    comparison: Comparison,
}

impl ContextFieldRule {
    pub fn new(id: impl AsRef<str>, field: ContextField, comparison: Comparison) -> Self {
        Self {
            lifecycle: Lifecycle::new(id),
            field,
            comparison,
        }
    }

    /// Shorthand for a case-sensitive requester match.
    pub fn requester(id: impl AsRef<str>, requester_id: &str) -> Self {
        Self::new(id, ContextField::Requester, Comparison::exact(requester_id))
    }

    /// Shorthand for a case-sensitive issuer match.
    pub fn issuer(id: impl AsRef<str>, issuer_id: &str) -> Self {
        Self::new(id, ContextField::Issuer, Comparison::exact(issuer_id))
    }

    pub fn field(&self) -> ContextField {
        self.field
    }

    pub fn comparison(&self) -> &Comparison {
        &self.comparison
    }
}

impl Component for ContextFieldRule {
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

impl PolicyRequirementRule for ContextFieldRule {
    fn matches(&self, context: &FilterContext) -> Result<Tristate> {
        self.lifecycle.ensure_usable()?;
        let Some(value) = context.field(self.field) else {
            debug!(rule = %self.id(), field = %self.field, "field absent from request");
            return Ok(Tristate::Fail);
        };
        Ok(self.comparison.matches(value).into())
    }
}

// ============================================================================
// Value count
// ============================================================================

/// True when the named attribute has between `minimum` and `maximum`
/// values (inclusive). An absent attribute is `False`.
#[derive(Debug)]
pub struct NumOfAttributeValuesRule {
    lifecycle: Lifecycle,
    attribute_id: String,
    minimum: usize,
    maximum: usize,
}

impl NumOfAttributeValuesRule {
    pub fn new(id: impl AsRef<str>, attribute_id: &str, minimum: usize, maximum: usize) -> Self {
        Self {
            lifecycle: Lifecycle::new(id),
            attribute_id: trim_to_option(attribute_id).unwrap_or_default().to_string(),
            minimum,
            maximum,
        }
    }

    pub fn attribute_id(&self) -> &str {
        &self.attribute_id
    }
}

impl Component for NumOfAttributeValuesRule {
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
        if self.attribute_id.is_empty() {
            return Err(FilterError::invalid_configuration(
                self.id(),
                "attribute id must not be empty",
            ));
        }
        if self.maximum == 0 {
            return Err(FilterError::invalid_configuration(
                self.id(),
                "maximum must be greater than zero",
            ));
        }
        if self.maximum < self.minimum {
            return Err(FilterError::invalid_configuration(
                self.id(),
                format!(
                    "maximum ({}) must not be less than minimum ({})",
                    self.maximum, self.minimum
                ),
            ));
        }
        self.lifecycle.mark_initialized();
        Ok(())
    }

    fn destroy(&mut self) {
        self.lifecycle.destroy();
    }
}

impl PolicyRequirementRule for NumOfAttributeValuesRule {
    fn matches(&self, context: &FilterContext) -> Result<Tristate> {
        self.lifecycle.ensure_usable()?;
        let Some(attribute) = context.prefiltered_attribute(&self.attribute_id) else {
            debug!(rule = %self.id(), attribute = %self.attribute_id, "attribute not present");
            return Ok(Tristate::False);
        };
        let count = attribute.values().len();
        Ok((self.minimum..=self.maximum).contains(&count).into())
    }
}
