use tracing::trace;

use super::{PolicyRequirementRule, SharedRule};
use crate::context::FilterContext;
use crate::error::{FilterError, Result};
use crate::lifecycle::{
    Component, ComponentState, Lifecycle, check_depth, ensure_child_initialized,
};
use crate::tristate::Tristate;

fn child_depth(children: &[SharedRule]) -> usize {
    children.iter().map(|c| c.depth()).max().unwrap_or(0)
}

fn ensure_children(id: &str, children: &[SharedRule]) -> Result<()> {
    if children.is_empty() {
        return Err(FilterError::invalid_configuration(
            id,
            "composite rule requires at least one child",
        ));
    }
    children
        .iter()
        .try_for_each(|child| ensure_child_initialized(id, &**child))
}

// ============================================================================
// AND
// ============================================================================

/// True when every child is True. Stops at the first child that is not.
#[derive(Debug)]
pub struct AndRule {
    lifecycle: Lifecycle,
    children: Vec<SharedRule>,
}

impl AndRule {
    pub fn new(id: impl AsRef<str>, children: Vec<SharedRule>) -> Self {
        Self {
            lifecycle: Lifecycle::new(id),
            children,
        }
    }

    pub fn children(&self) -> &[SharedRule] {
        &self.children
    }
}

impl Component for AndRule {
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
        ensure_children(self.id(), &self.children)?;
        check_depth(self.id(), self.depth())?;
        self.lifecycle.mark_initialized();
        Ok(())
    }

    fn destroy(&mut self) {
        self.lifecycle.destroy();
    }
}

impl PolicyRequirementRule for AndRule {
    fn matches(&self, context: &FilterContext) -> Result<Tristate> {
        self.lifecycle.ensure_usable()?;
        let verdict = Tristate::conjunction(self.children.iter().map(|c| c.matches(context)))?;
        trace!(rule = %self.id(), %verdict, "AND evaluated");
        Ok(verdict)
    }

    fn depth(&self) -> usize {
        1 + child_depth(&self.children)
    }
}

// ============================================================================
// OR
// ============================================================================

/// True when any child is True; Fail when none is and at least one failed.
#[derive(Debug)]
pub struct OrRule {
    lifecycle: Lifecycle,
    children: Vec<SharedRule>,
}

impl OrRule {
    pub fn new(id: impl AsRef<str>, children: Vec<SharedRule>) -> Self {
        Self {
            lifecycle: Lifecycle::new(id),
            children,
        }
    }

    pub fn children(&self) -> &[SharedRule] {
        &self.children
    }
}

impl Component for OrRule {
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
        ensure_children(self.id(), &self.children)?;
        check_depth(self.id(), self.depth())?;
        self.lifecycle.mark_initialized();
        Ok(())
    }

    fn destroy(&mut self) {
        self.lifecycle.destroy();
    }
}

impl PolicyRequirementRule for OrRule {
    fn matches(&self, context: &FilterContext) -> Result<Tristate> {
        self.lifecycle.ensure_usable()?;
        let verdict = Tristate::disjunction(self.children.iter().map(|c| c.matches(context)))?;
        trace!(rule = %self.id(), %verdict, "OR evaluated");
        Ok(verdict)
    }

    fn depth(&self) -> usize {
        1 + child_depth(&self.children)
    }
}

// ============================================================================
// NOT
// ============================================================================

/// Negates its child. `Fail` stays `Fail`.
#[derive(Debug)]
pub struct NotRule {
    lifecycle: Lifecycle,
    child: SharedRule,
}

impl NotRule {
    pub fn new(id: impl AsRef<str>, child: SharedRule) -> Self {
        Self {
            lifecycle: Lifecycle::new(id),
            child,
        }
    }

    pub fn child(&self) -> &SharedRule {
        &self.child
    }
}

impl Component for NotRule {
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
        ensure_child_initialized(self.id(), &*self.child)?;
        check_depth(self.id(), self.depth())?;
        self.lifecycle.mark_initialized();
        Ok(())
    }

    fn destroy(&mut self) {
        self.lifecycle.destroy();
    }
}

impl PolicyRequirementRule for NotRule {
    fn matches(&self, context: &FilterContext) -> Result<Tristate> {
        self.lifecycle.ensure_usable()?;
        Ok(self.child.matches(context)?.negate())
    }

    fn depth(&self) -> usize {
        1 + self.child.depth()
    }
}
