//! Guard predicates for controlling builder transitions.
//!
//! Guards are pure boolean functions that decide whether an input may be
//! applied. They keep admission rules declarative and free of side effects.

use super::state::{BuilderState, Phase};
use super::token::Operator;
use std::fmt;

/// Pure predicate that determines if a transition can execute.
///
/// # Example
///
/// ```rust
/// use tally::core::{BuilderState, Guard};
///
/// let has_input = Guard::new(|s: &BuilderState| !s.expression_text().trim().is_empty());
///
/// assert!(!has_input.check(&BuilderState::default()));
/// ```
pub struct Guard<S> {
    predicate: Box<dyn Fn(&S) -> bool + Send + Sync>,
}

impl<S> Guard<S> {
    /// Create a guard from a pure predicate function.
    ///
    /// The predicate must be deterministic and thread-safe.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&S) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Box::new(predicate),
        }
    }

    /// Check if the guard admits this input.
    pub fn check(&self, subject: &S) -> bool {
        (self.predicate)(subject)
    }

    /// Combine two guards; both must admit.
    pub fn and(self, other: Guard<S>) -> Self
    where
        S: 'static,
    {
        Guard::new(move |subject: &S| self.check(subject) && other.check(subject))
    }
}

impl<S> fmt::Debug for Guard<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard").finish_non_exhaustive()
    }
}

/// Snapshot handed to operator guards: what the builder looks like and
/// which operator is being appended.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct OperatorProposal {
    pub operator: Operator,
    pub phase: Phase,
    /// True when the operator would become the first token of the
    /// expression.
    pub is_first_token: bool,
}

impl OperatorProposal {
    pub fn new(state: &BuilderState, operator: Operator) -> Self {
        let phase = state.phase();
        let is_first_token = match phase {
            Phase::Empty | Phase::ShowingError => true,
            // The previous result seeds the expression.
            Phase::ShowingResult => state.current_token.is_empty(),
            Phase::Composing => false,
        };
        Self {
            operator,
            phase,
            is_first_token,
        }
    }
}

/// Rejects a binary operator (or a closing mark) as the very first token.
/// Unary minus and an opening grouping mark are allowed so that `-5` and
/// `(2 + 3)` can be entered.
pub fn leading_operator_guard() -> Guard<OperatorProposal> {
    Guard::new(|proposal: &OperatorProposal| {
        !proposal.is_first_token || proposal.operator.may_lead()
    })
}

/// Admits an evaluation request only for a non-blank expression. The
/// error sentinel is display state, not expression text.
pub fn evaluable_guard() -> Guard<BuilderState> {
    Guard::new(|state: &BuilderState| {
        !state.shows_error() && !state.expression_text().trim().is_empty()
    })
}
