//! Builder state for an in-progress expression.
//!
//! `BuilderState` is a plain value: every accessor is pure and the
//! builder in [`super::builder`] is the only code that changes it.

use serde::{Deserialize, Serialize};

/// Sentinel shown in place of a result when evaluation fails.
pub const ERROR_SENTINEL: &str = "Error";

/// Coarse position of the builder, derived from its fields.
///
/// # Example
///
/// ```rust
/// use tally::core::{BuilderState, Phase};
///
/// let state = BuilderState::default();
/// assert_eq!(state.phase(), Phase::Empty);
/// assert_eq!(state.phase().name(), "Empty");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Phase {
    /// Nothing committed, nothing being typed.
    Empty,
    /// The user is assembling an expression.
    Composing,
    /// The current token is the result of the last evaluation.
    ShowingResult,
    /// The last evaluation failed and the error sentinel is shown.
    ShowingError,
}

impl Phase {
    /// Get the phase's name for display/logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Empty => "Empty",
            Self::Composing => "Composing",
            Self::ShowingResult => "ShowingResult",
            Self::ShowingError => "ShowingError",
        }
    }

    /// Check if this is the error-display phase.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::ShowingError)
    }

    /// True if the next digit or function input starts a new expression.
    pub fn awaits_fresh_input(&self) -> bool {
        matches!(self, Self::ShowingResult | Self::ShowingError)
    }
}

/// The single mutable entity of a calculator session.
///
/// Invariants maintained by the builder:
/// - `current_token` contains at most one `.`
/// - `committed_expression` is empty or ends with a completed operator or
///   function-open token
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct BuilderState {
    /// Tokens already finalized, space-joined.
    pub committed_expression: String,
    /// The token currently being typed.
    pub current_token: String,
    /// Set right after an evaluation; the next input starts fresh.
    pub pending_reset_on_next_input: bool,
}

impl BuilderState {
    /// `committed_expression + current_token`, untrimmed.
    pub fn expression_text(&self) -> String {
        let mut text =
            String::with_capacity(self.committed_expression.len() + self.current_token.len());
        text.push_str(&self.committed_expression);
        text.push_str(&self.current_token);
        text
    }

    /// True when nothing has been committed or typed.
    pub fn is_empty(&self) -> bool {
        self.committed_expression.is_empty() && self.current_token.is_empty()
    }

    /// True when the current token is the failed-evaluation sentinel.
    pub fn shows_error(&self) -> bool {
        self.pending_reset_on_next_input && self.current_token == ERROR_SENTINEL
    }

    pub fn phase(&self) -> Phase {
        if self.pending_reset_on_next_input {
            if self.current_token == ERROR_SENTINEL {
                Phase::ShowingError
            } else {
                Phase::ShowingResult
            }
        } else if self.is_empty() {
            Phase::Empty
        } else {
            Phase::Composing
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(committed: &str, current: &str, pending: bool) -> BuilderState {
        BuilderState {
            committed_expression: committed.to_string(),
            current_token: current.to_string(),
            pending_reset_on_next_input: pending,
        }
    }

    #[test]
    fn default_state_is_empty() {
        let state = BuilderState::default();
        assert!(state.is_empty());
        assert_eq!(state.expression_text(), "");
        assert_eq!(state.phase(), Phase::Empty);
    }

    #[test]
    fn phase_tracks_fields() {
        assert_eq!(state("2 + ", "", false).phase(), Phase::Composing);
        assert_eq!(state("", "12", false).phase(), Phase::Composing);
        assert_eq!(state("", "5", true).phase(), Phase::ShowingResult);
        assert_eq!(state("", ERROR_SENTINEL, true).phase(), Phase::ShowingError);
    }

    #[test]
    fn typed_error_text_is_not_the_error_phase() {
        // The sentinel only counts while a reset is pending.
        let state = state("", ERROR_SENTINEL, false);
        assert!(!state.shows_error());
        assert_eq!(state.phase(), Phase::Composing);
    }

    #[test]
    fn expression_text_concatenates() {
        assert_eq!(state("2 + ", "3", false).expression_text(), "2 + 3");
    }

    #[test]
    fn awaits_fresh_input_only_after_evaluation() {
        assert!(!Phase::Empty.awaits_fresh_input());
        assert!(!Phase::Composing.awaits_fresh_input());
        assert!(Phase::ShowingResult.awaits_fresh_input());
        assert!(Phase::ShowingError.awaits_fresh_input());
        assert!(Phase::ShowingError.is_error());
    }

    #[test]
    fn state_serializes_correctly() {
        let state = state("sin(", "30", false);
        let json = serde_json::to_string(&state).unwrap();
        let deserialized: BuilderState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, deserialized);
    }
}
