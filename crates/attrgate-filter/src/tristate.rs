//! Three-valued verdicts for policy requirement rules.
//!
//! `Fail` means "could not determine" (e.g. the requester is unknown). It is
//! kept apart from `False` so an undecidable branch is never mistaken for an
//! explicit "no":
//!
//! | NOT   |       |
//! |-------|-------|
//! | True  | False |
//! | False | True  |
//! | Fail  | Fail  |
//!
//! Conjunction stops at the first child that is not `True` and returns its
//! verdict. Disjunction stops at the first `True`; otherwise it returns `Fail`
//! if any child failed and `False` if none did.

use serde::{Deserialize, Serialize};

/// Result of evaluating a [`PolicyRequirementRule`](crate::PolicyRequirementRule).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tristate {
    True,
    False,
    Fail,
}

impl Tristate {
    pub fn is_true(self) -> bool {
        self == Self::True
    }

    /// Logical negation; `Fail` stays `Fail`.
    pub fn negate(self) -> Self {
        match self {
            Self::True => Self::False,
            Self::False => Self::True,
            Self::Fail => Self::Fail,
        }
    }

    /// Short-circuiting AND over lazily produced verdicts.
    ///
    /// Items are pulled in order; the first verdict that is not `True` is
    /// returned without pulling the rest. Errors propagate immediately.
    /// An empty input yields `True` (callers reject empty child lists at
    /// initialization).
    pub fn conjunction<I, E>(verdicts: I) -> Result<Self, E>
    where
        I: IntoIterator<Item = Result<Self, E>>,
    {
        for verdict in verdicts {
            match verdict? {
                Self::True => {}
                decided => return Ok(decided),
            }
        }
        Ok(Self::True)
    }

    /// Short-circuiting OR over lazily produced verdicts.
    ///
    /// Returns `True` at the first `True`. A `Fail` does not stop the scan,
    /// since a later `True` still wins. Errors propagate immediately.
    pub fn disjunction<I, E>(verdicts: I) -> Result<Self, E>
    where
        I: IntoIterator<Item = Result<Self, E>>,
    {
        let mut failed = false;
        for verdict in verdicts {
            match verdict? {
                Self::True => return Ok(Self::True),
                Self::Fail => failed = true,
                Self::False => {}
            }
        }
        Ok(if failed { Self::Fail } else { Self::False })
    }
}

impl std::ops::Not for Tristate {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.negate()
    }
}

impl From<bool> for Tristate {
    fn from(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }
}

impl std::fmt::Display for Tristate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::True => "TRUE",
            Self::False => "FALSE",
            Self::Fail => "FAIL",
        })
    }
}
