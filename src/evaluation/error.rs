//! Evaluation error types.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// How an evaluation attempt failed. Every failure is terminal for its
/// attempt; nothing is retried automatically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// Blank expression; no request was sent.
    InputEmpty,
    /// The engine rejected the expression.
    MalformedExpression,
    /// The service could not be reached, failed, or timed out.
    TransportFailure,
    /// The engine answered without a usable value.
    InvalidResult,
}

/// Errors reported by an [`Evaluator`](super::Evaluator) implementation.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvaluatorError {
    /// 400-class answer: the expression itself is at fault.
    #[error("{message}{}", details_suffix(.details))]
    Rejected {
        message: String,
        details: Option<String>,
    },

    #[error("Evaluation service error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Evaluation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Evaluation returned no finite result")]
    NoResult,

    #[error("Invalid plot request: {0}")]
    InvalidPlotRequest(String),
}

fn details_suffix(details: &Option<String>) -> String {
    details
        .as_ref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

impl EvaluatorError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Rejected { .. } | Self::InvalidPlotRequest(_) => FailureKind::MalformedExpression,
            Self::Server { .. } | Self::Transport(_) | Self::Timeout(_) => {
                FailureKind::TransportFailure
            }
            Self::NoResult => FailureKind::InvalidResult,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_message_includes_details() {
        let err = EvaluatorError::Rejected {
            message: "Invalid Expression".to_string(),
            details: Some("Unexpected operator /".to_string()),
        };
        assert_eq!(err.to_string(), "Invalid Expression: Unexpected operator /");

        let bare = EvaluatorError::Rejected {
            message: "Expression is required".to_string(),
            details: None,
        };
        assert_eq!(bare.to_string(), "Expression is required");
    }

    #[test]
    fn errors_map_to_failure_kinds() {
        assert_eq!(
            EvaluatorError::Transport("refused".into()).kind(),
            FailureKind::TransportFailure
        );
        assert_eq!(
            EvaluatorError::Timeout(Duration::from_secs(1)).kind(),
            FailureKind::TransportFailure
        );
        assert_eq!(
            EvaluatorError::Server {
                status: 503,
                message: "down".into()
            }
            .kind(),
            FailureKind::TransportFailure
        );
        assert_eq!(EvaluatorError::NoResult.kind(), FailureKind::InvalidResult);
    }
}
