//! Component lifecycle shared by rules, matchers, policies and the engine.
//!
//! Every component moves through `Created → Initialized → Destroyed`:
//!
//! - Setters only work while `Created`; afterwards they return
//!   [`FilterError::Unmodifiable`] (or [`FilterError::Destroyed`]).
//! - `initialize` validates the configuration. Configuration mistakes such as
//!   an empty child list are reported here, never during evaluation.
//! - Evaluation is only allowed while `Initialized`.
//!
//! Composite components do not initialize the shared children they hold;
//! each child is initialized on its own before it is composed. A composite
//! holding a child that is not initialized fails its own initialization.

use crate::error::{FilterError, Result};
use attrgate_types::trim_to_option;

/// Maximum nesting of composed rules/matchers.
///
/// Evaluation recurses once per level, so this bounds native stack use no
/// matter what a configuration loader hands us.
pub const MAX_COMPOSITION_DEPTH: usize = 64;

/// Lifecycle state of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentState {
    Created,
    Initialized,
    Destroyed,
}

/// Common lifecycle operations.
pub trait Component {
    /// Identifier used in logs and error messages.
    fn id(&self) -> &str;

    fn state(&self) -> ComponentState;

    /// Validates configuration and makes the component usable.
    ///
    /// Initializing an already initialized component is a no-op;
    /// initializing a destroyed one is an error.
    fn initialize(&mut self) -> Result<()>;

    /// Tears the component down. Later use is an error.
    fn destroy(&mut self);

    fn is_initialized(&self) -> bool {
        self.state() == ComponentState::Initialized
    }

    fn is_destroyed(&self) -> bool {
        self.state() == ComponentState::Destroyed
    }

    /// Initializes `self` and returns it (builder pattern).
    fn into_initialized(mut self) -> Result<Self>
    where
        Self: Sized,
    {
        self.initialize()?;
        Ok(self)
    }
}

/// Id + state bookkeeping embedded in every component.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    id: String,
    state: ComponentState,
}

impl Lifecycle {
    /// Creates a lifecycle in the `Created` state. The id is trimmed; a blank
    /// id is rejected by [`needs_initialization`](Self::needs_initialization).
    pub fn new(id: impl AsRef<str>) -> Self {
        Self {
            id: trim_to_option(id.as_ref()).unwrap_or_default().to_string(),
            state: ComponentState::Created,
        }
    }

    /// Creates a lifecycle that is already initialized (built-in constants).
    pub fn initialized(id: &str) -> Self {
        Self {
            id: id.to_string(),
            state: ComponentState::Initialized,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> ComponentState {
        self.state
    }

    /// Returns `Ok(true)` when the component still has to be validated,
    /// `Ok(false)` when it is already initialized.
    pub fn needs_initialization(&self) -> Result<bool> {
        match self.state {
            ComponentState::Destroyed => Err(self.destroyed()),
            ComponentState::Initialized => Ok(false),
            ComponentState::Created if self.id.is_empty() => Err(
                FilterError::invalid_configuration("<unnamed>", "component id must not be empty"),
            ),
            ComponentState::Created => Ok(true),
        }
    }

    pub fn mark_initialized(&mut self) {
        debug_assert_eq!(self.state, ComponentState::Created);
        self.state = ComponentState::Initialized;
    }

    pub fn destroy(&mut self) {
        self.state = ComponentState::Destroyed;
    }

    /// Fails unless the component is initialized and not destroyed.
    pub fn ensure_usable(&self) -> Result<()> {
        match self.state {
            ComponentState::Initialized => Ok(()),
            ComponentState::Created => Err(FilterError::Uninitialized {
                component: self.display_id().to_string(),
            }),
            ComponentState::Destroyed => Err(self.destroyed()),
        }
    }

    /// Fails unless the component is still being configured.
    pub fn ensure_modifiable(&self) -> Result<()> {
        match self.state {
            ComponentState::Created => Ok(()),
            ComponentState::Initialized => Err(FilterError::Unmodifiable {
                component: self.display_id().to_string(),
            }),
            ComponentState::Destroyed => Err(self.destroyed()),
        }
    }

    fn destroyed(&self) -> FilterError {
        FilterError::Destroyed {
            component: self.display_id().to_string(),
        }
    }

    fn display_id(&self) -> &str {
        if self.id.is_empty() {
            "<unnamed>"
        } else {
            &self.id
        }
    }
}

/// Rejects a shared child that was never initialized (or was destroyed).
///
/// Runs before [`check_depth`] so depth is only walked over validated
/// subtrees.
pub(crate) fn ensure_child_initialized<C>(component: &str, child: &C) -> Result<()>
where
    C: Component + ?Sized,
{
    if child.is_initialized() {
        return Ok(());
    }
    Err(FilterError::invalid_configuration(
        component,
        format!("child '{}' is {:?}, not initialized", child.id(), child.state()),
    ))
}

/// Rejects compositions nested deeper than [`MAX_COMPOSITION_DEPTH`].
pub(crate) fn check_depth(component: &str, depth: usize) -> Result<()> {
    if depth > MAX_COMPOSITION_DEPTH {
        return Err(FilterError::invalid_configuration(
            component,
            format!("composition depth {depth} exceeds the maximum of {MAX_COMPOSITION_DEPTH}"),
        ));
    }
    Ok(())
}
