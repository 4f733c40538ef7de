//! # attrgate-types: Attribute data model for `attrgate`
//!
//! This crate contains the leaf data types shared by the filtering engine and
//! the layers around it:
//! - Attribute values ([`AttributeValue`], [`ScopedValue`], [`EmptyValue`])
//! - Named value collections ([`Attribute`])
//! - The per-request attribute set ([`AttributeMap`])
//!
//! Values are immutable and compared by value and type: the string `"a"` and
//! the scoped value `"a@example.org"` are different values even though both
//! expose `"a"` as their text.
//!
//! # Example
//!
//! ```
//! use attrgate_types::{Attribute, AttributeValue};
//!
//! let mail = Attribute::new("mail")?
//!     .with_value(AttributeValue::string("a@example.org"))
//!     .with_value(AttributeValue::string("b@example.org"));
//!
//! assert_eq!(mail.id(), "mail");
//! assert_eq!(mail.values().len(), 2);
//! assert!(mail.contains(&AttributeValue::string("a@example.org")));
//! # Ok::<(), attrgate_types::TypesError>(())
//! ```

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Errors raised while constructing attribute data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    /// Attribute identifiers must contain at least one non-whitespace character.
    #[error("attribute id must not be empty or blank")]
    BlankAttributeId,
}

/// Trims `value` and returns `None` if nothing is left.
///
/// Identifiers throughout the engine (attribute ids, component ids) are
/// normalized this way before use.
pub fn trim_to_option(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

// ============================================================================
// Attribute Values
// ============================================================================

/// Marker kinds for values that carry no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyValue {
    /// The source produced a value of zero length (e.g. an empty string).
    ZeroLength,
    /// The source produced an explicit null.
    Null,
}

/// A string value qualified by a security domain, e.g. `staff@example.org`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScopedValue {
    /// The unscoped part (`staff`).
    pub value: String,
    /// The scope (`example.org`).
    pub scope: String,
}

/// A single value of an [`Attribute`].
///
/// Equality is by variant and content. Two values with the same text but a
/// different variant never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    /// Plain string value.
    String(String),
    /// Opaque byte value (e.g. a binary identifier).
    Bytes(Bytes),
    /// String value with a scope.
    Scoped(ScopedValue),
    /// Value without content.
    Empty(EmptyValue),
}

impl AttributeValue {
    /// Creates a plain string value.
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Creates a scoped string value.
    pub fn scoped(value: impl Into<String>, scope: impl Into<String>) -> Self {
        Self::Scoped(ScopedValue {
            value: value.into(),
            scope: scope.into(),
        })
    }

    /// Creates a byte value.
    pub fn bytes(value: impl Into<Bytes>) -> Self {
        Self::Bytes(value.into())
    }

    /// Creates the zero-length empty marker.
    pub fn zero_length() -> Self {
        Self::Empty(EmptyValue::ZeroLength)
    }

    /// Creates the null empty marker.
    pub fn null() -> Self {
        Self::Empty(EmptyValue::Null)
    }

    /// Returns the textual content used by string comparisons.
    ///
    /// For scoped values this is the unscoped part. Byte and empty values
    /// have no text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Scoped(scoped) => Some(&scoped.value),
            Self::Bytes(_) | Self::Empty(_) => None,
        }
    }

    /// Returns the scope of a scoped value.
    pub fn scope(&self) -> Option<&str> {
        match self {
            Self::Scoped(scoped) => Some(&scoped.scope),
            _ => None,
        }
    }

    /// Returns true for the empty markers.
    pub fn is_empty_marker(&self) -> bool {
        matches!(self, Self::Empty(_))
    }

    /// Short name of the variant, used in log output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Scoped(_) => "scoped",
            Self::Empty(EmptyValue::ZeroLength) => "zero-length",
            Self::Empty(EmptyValue::Null) => "null",
        }
    }
}

impl Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Scoped(scoped) => write!(f, "{}@{}", scoped.value, scoped.scope),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Self::Empty(EmptyValue::ZeroLength) => f.write_str(""),
            Self::Empty(EmptyValue::Null) => f.write_str("<null>"),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::string(value)
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

// ============================================================================
// Attribute
// ============================================================================

/// A named, ordered collection of [`AttributeValue`]s.
///
/// Duplicate values are permitted. Value order is preserved through
/// filtering so that output is deterministic.
///
/// Localized display names and descriptions are keyed by language tag
/// (`"en"`, `"de-CH"`); blank entries are dropped on insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AttributeRepr", into = "AttributeRepr")]
pub struct Attribute {
    id: String,
    values: Vec<AttributeValue>,
    display_names: BTreeMap<String, String>,
    display_descriptions: BTreeMap<String, String>,
}

impl Attribute {
    /// Creates an attribute with no values.
    ///
    /// The id is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`TypesError::BlankAttributeId`] if the id is empty or blank.
    pub fn new(id: impl AsRef<str>) -> Result<Self, TypesError> {
        let id = trim_to_option(id.as_ref()).ok_or(TypesError::BlankAttributeId)?;
        Ok(Self {
            id: id.to_string(),
            values: Vec::new(),
            display_names: BTreeMap::new(),
            display_descriptions: BTreeMap::new(),
        })
    }

    /// Replaces the values of this attribute.
    pub fn with_values(mut self, values: impl IntoIterator<Item = AttributeValue>) -> Self {
        self.values = values.into_iter().collect();
        self
    }

    /// Appends a value.
    pub fn with_value(mut self, value: impl Into<AttributeValue>) -> Self {
        self.values.push(value.into());
        self
    }

    /// Adds a localized display name. Blank names are ignored.
    pub fn with_display_name(mut self, language: impl Into<String>, name: &str) -> Self {
        if let Some(name) = trim_to_option(name) {
            self.display_names.insert(language.into(), name.to_string());
        }
        self
    }

    /// Adds a localized description. Blank descriptions are ignored.
    pub fn with_display_description(mut self, language: impl Into<String>, text: &str) -> Self {
        if let Some(text) = trim_to_option(text) {
            self.display_descriptions
                .insert(language.into(), text.to_string());
        }
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn values(&self) -> &[AttributeValue] {
        &self.values
    }

    /// Returns true if the attribute has no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns true if `value` is one of this attribute's values.
    pub fn contains(&self, value: &AttributeValue) -> bool {
        self.values.contains(value)
    }

    pub fn display_names(&self) -> &BTreeMap<String, String> {
        &self.display_names
    }

    pub fn display_descriptions(&self) -> &BTreeMap<String, String> {
        &self.display_descriptions
    }

    /// Returns a copy of this attribute holding only the values for which
    /// `keep` returns true, in their original order.
    ///
    /// Display metadata is carried over unchanged. The receiver is not
    /// modified.
    pub fn retain_values(&self, mut keep: impl FnMut(&AttributeValue) -> bool) -> Self {
        Self {
            id: self.id.clone(),
            values: self.values.iter().filter(|v| keep(v)).cloned().collect(),
            display_names: self.display_names.clone(),
            display_descriptions: self.display_descriptions.clone(),
        }
    }
}

/// Serialized form of [`Attribute`]; validated on the way in.
#[derive(Serialize, Deserialize)]
struct AttributeRepr {
    id: String,
    #[serde(default)]
    values: Vec<AttributeValue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    display_names: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    display_descriptions: BTreeMap<String, String>,
}

impl TryFrom<AttributeRepr> for Attribute {
    type Error = TypesError;

    fn try_from(repr: AttributeRepr) -> Result<Self, Self::Error> {
        let mut attribute = Attribute::new(&repr.id)?.with_values(repr.values);
        for (language, name) in &repr.display_names {
            attribute = attribute.with_display_name(language.clone(), name);
        }
        for (language, text) in &repr.display_descriptions {
            attribute = attribute.with_display_description(language.clone(), text);
        }
        Ok(attribute)
    }
}

impl From<Attribute> for AttributeRepr {
    fn from(attribute: Attribute) -> Self {
        Self {
            id: attribute.id,
            values: attribute.values,
            display_names: attribute.display_names,
            display_descriptions: attribute.display_descriptions,
        }
    }
}

// ============================================================================
// Attribute Map
// ============================================================================

/// Attribute set keyed by attribute id.
///
/// A `BTreeMap` so that iteration (and therefore logging and any
/// order-sensitive rule) is deterministic across runs.
pub type AttributeMap = BTreeMap<String, Attribute>;

/// Builds an [`AttributeMap`] from attributes. A later attribute with the
/// same id replaces an earlier one.
pub fn attribute_map(attributes: impl IntoIterator<Item = Attribute>) -> AttributeMap {
    attributes
        .into_iter()
        .map(|attribute| (attribute.id.clone(), attribute))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
