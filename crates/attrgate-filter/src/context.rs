//! Per-request filtering state.
//!
//! A [`FilterContext`] is created for one request, handed to the engine once
//! and then read back. Rules and matchers see it through `&FilterContext`;
//! only the accumulation step of an [`AttributeRule`](crate::AttributeRule)
//! takes `&mut`.

use std::collections::{BTreeMap, BTreeSet};

use attrgate_types::{Attribute, AttributeMap, AttributeValue, trim_to_option};

use crate::error::{FilterError, Result};
use crate::matcher::ValueSet;

/// Progress of a context through a filtering pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextPhase {
    /// Populated but not yet filtered.
    Created,
    /// A pass is running.
    Evaluating,
    /// The pass finished (successfully or not); the context cannot be reused.
    Complete,
}

/// Identity fields a rule can inspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextField {
    /// Entity id of the relying party asking for attributes.
    Requester,
    /// Entity id of this identity provider.
    Issuer,
    /// Name of the authenticated subject.
    Principal,
    /// Authentication method used for the current session.
    AuthenticationMethod,
}

impl std::fmt::Display for ContextField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Requester => "requester",
            Self::Issuer => "issuer",
            Self::Principal => "principal",
            Self::AuthenticationMethod => "authentication method",
        })
    }
}

/// Mutable state of one filtering request.
#[derive(Debug)]
pub struct FilterContext {
    prefiltered: AttributeMap,
    permitted: BTreeMap<String, ValueSet>,
    denied: BTreeMap<String, ValueSet>,
    filtered: AttributeMap,
    requester_id: Option<String>,
    issuer_id: Option<String>,
    principal_name: Option<String>,
    authentication_method: Option<String>,
    phase: ContextPhase,
}

impl FilterContext {
    /// Creates a context over the unfiltered attribute set.
    pub fn new(prefiltered: AttributeMap) -> Self {
        Self {
            prefiltered,
            permitted: BTreeMap::new(),
            denied: BTreeMap::new(),
            filtered: AttributeMap::new(),
            requester_id: None,
            issuer_id: None,
            principal_name: None,
            authentication_method: None,
            phase: ContextPhase::Created,
        }
    }

    /// Creates a context from a list of attributes (last one wins on duplicate ids).
    pub fn from_attributes(attributes: impl IntoIterator<Item = Attribute>) -> Self {
        Self::new(attrgate_types::attribute_map(attributes))
    }

    // Identity fields are trimmed; blank values are treated as absent.

    pub fn with_requester(mut self, requester_id: &str) -> Self {
        self.requester_id = trim_to_option(requester_id).map(str::to_string);
        self
    }

    pub fn with_issuer(mut self, issuer_id: &str) -> Self {
        self.issuer_id = trim_to_option(issuer_id).map(str::to_string);
        self
    }

    pub fn with_principal(mut self, principal_name: &str) -> Self {
        self.principal_name = trim_to_option(principal_name).map(str::to_string);
        self
    }

    pub fn with_authentication_method(mut self, method: &str) -> Self {
        self.authentication_method = trim_to_option(method).map(str::to_string);
        self
    }

    pub fn requester_id(&self) -> Option<&str> {
        self.requester_id.as_deref()
    }

    pub fn issuer_id(&self) -> Option<&str> {
        self.issuer_id.as_deref()
    }

    pub fn principal_name(&self) -> Option<&str> {
        self.principal_name.as_deref()
    }

    pub fn authentication_method(&self) -> Option<&str> {
        self.authentication_method.as_deref()
    }

    /// Returns the named identity field, if present.
    pub fn field(&self, field: ContextField) -> Option<&str> {
        match field {
            ContextField::Requester => self.requester_id(),
            ContextField::Issuer => self.issuer_id(),
            ContextField::Principal => self.principal_name(),
            ContextField::AuthenticationMethod => self.authentication_method(),
        }
    }

    pub fn prefiltered_attributes(&self) -> &AttributeMap {
        &self.prefiltered
    }

    pub fn prefiltered_attribute(&self, id: &str) -> Option<&Attribute> {
        self.prefiltered.get(id)
    }

    /// Values permitted so far for `id`.
    pub fn permitted_values(&self, id: &str) -> Option<&ValueSet> {
        self.permitted.get(id)
    }

    /// Values denied so far for `id`.
    pub fn denied_values(&self, id: &str) -> Option<&ValueSet> {
        self.denied.get(id)
    }

    /// Output of the last pass. Empty until a pass completes successfully.
    pub fn filtered_attributes(&self) -> &AttributeMap {
        &self.filtered
    }

    pub fn into_filtered(self) -> AttributeMap {
        self.filtered
    }

    pub fn phase(&self) -> ContextPhase {
        self.phase
    }

    /// Records values released for attribute `id`.
    ///
    /// # Errors
    ///
    /// [`FilterError::ContractViolation`] if `id` is blank or unknown, if any
    /// value is not one of the attribute's prefiltered values, or if the pass
    /// is already complete. Nothing is recorded on error.
    pub fn add_permitted_values(
        &mut self,
        id: &str,
        values: impl IntoIterator<Item = AttributeValue>,
    ) -> Result<()> {
        let (id, values) = self.checked_values(id, values)?;
        self.permitted.entry(id).or_default().extend(values);
        Ok(())
    }

    /// Records values withheld for attribute `id`. Same contract as
    /// [`add_permitted_values`](Self::add_permitted_values).
    pub fn add_denied_values(
        &mut self,
        id: &str,
        values: impl IntoIterator<Item = AttributeValue>,
    ) -> Result<()> {
        let (id, values) = self.checked_values(id, values)?;
        self.denied.entry(id).or_default().extend(values);
        Ok(())
    }

    fn checked_values(
        &self,
        id: &str,
        values: impl IntoIterator<Item = AttributeValue>,
    ) -> Result<(String, ValueSet)> {
        if self.phase == ContextPhase::Complete {
            return Err(FilterError::ContractViolation(
                "filter context has already been evaluated".into(),
            ));
        }
        let id = trim_to_option(id).ok_or_else(|| {
            FilterError::ContractViolation("attribute id must not be empty or blank".into())
        })?;
        let attribute = self.prefiltered.get(id).ok_or_else(|| {
            FilterError::ContractViolation(format!("no prefiltered attribute with id '{id}'"))
        })?;

        let known: BTreeSet<&AttributeValue> = attribute.values().iter().collect();
        let values: ValueSet = values.into_iter().collect();
        if let Some(foreign) = values.iter().find(|v| !known.contains(v)) {
            return Err(FilterError::ContractViolation(format!(
                "value '{foreign}' is not a value of attribute '{id}'"
            )));
        }
        Ok((id.to_string(), values))
    }

    // ------------------------------------------------------------------------
    // Pass bookkeeping (engine only)
    // ------------------------------------------------------------------------

    pub(crate) fn begin_evaluation(&mut self) -> Result<()> {
        if self.phase != ContextPhase::Created {
            return Err(FilterError::ContractViolation(
                "filter context has already been evaluated".into(),
            ));
        }
        self.phase = ContextPhase::Evaluating;
        Ok(())
    }

    pub(crate) fn complete(&mut self, filtered: AttributeMap) {
        self.filtered = filtered;
        self.phase = ContextPhase::Complete;
    }

    /// Ends a failed pass. The output stays empty.
    pub(crate) fn abort(&mut self) {
        self.filtered.clear();
        self.phase = ContextPhase::Complete;
    }
}
