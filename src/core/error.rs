//! Rejection reasons for builder inputs.

use super::token::Operator;
use thiserror::Error;

/// Why the builder refused an input. A rejected input never changes the
/// builder state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InputRejected {
    #[error("'{0}' is not a digit or decimal point")]
    NotADigit(char),

    #[error("Current token already contains a decimal point")]
    DuplicateDecimalPoint,

    #[error("Operator '{0}' cannot start an expression")]
    LeadingOperator(Operator),

    /// `position` is a character index into the replayed text.
    #[error("Unrecognized input '{text}' at position {position}")]
    Unrecognized { text: String, position: usize },
}
