//! Evaluation client: the imperative shell around the pure builder.
//!
//! Arithmetic is delegated to an external engine behind the [`Evaluator`]
//! trait. The client prepares the expression (cosmetic symbol
//! normalization, parenthesis repair), bounds the call with a deadline and
//! folds every failure path into an [`EvaluationOutcome`].

mod error;
pub mod http;
mod wire;

pub use error::{EvaluatorError, FailureKind};
pub use http::HttpEvaluator;
pub use wire::{
    ErrorBody, EvaluationRequest, EvaluationResponse, PlotPoint, PlotRequest, PlotResponse,
    WireValue, DEFAULT_PLOT_RANGE, DEFAULT_PLOT_STEP,
};

use crate::config::EvaluatorConfig;
use crate::core::ResultValue;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Default deadline for a single evaluation call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Cosmetic symbols and their canonical replacements.
const SYMBOL_REPLACEMENTS: &[(&str, &str)] = &[
    ("\\times", "*"),
    ("\\div", "/"),
    ("×", "*"),
    ("÷", "/"),
    ("−", "-"),
];

/// An external expression-evaluation engine.
///
/// Implementations must support `+ - * /`, `^`, grouping and
/// `sin cos tan sqrt` in radians, and must accept the closing marks the
/// client appends to unbalanced input.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<ResultValue, EvaluatorError>;
}

#[async_trait]
impl<E: Evaluator + ?Sized> Evaluator for Box<E> {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<ResultValue, EvaluatorError> {
        (**self).evaluate(request).await
    }
}

#[async_trait]
impl<E: Evaluator + ?Sized> Evaluator for std::sync::Arc<E> {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<ResultValue, EvaluatorError> {
        (**self).evaluate(request).await
    }
}

/// Result of one evaluation attempt. Transient: consumed immediately by
/// the session.
#[derive(Clone, Debug, PartialEq)]
pub enum EvaluationOutcome {
    Success { result: ResultValue },
    Failure { kind: FailureKind, message: String },
}

impl EvaluationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            message: message.into(),
        }
    }
}

/// Sends assembled expressions to an [`Evaluator`].
#[derive(Debug, Clone)]
pub struct EvaluationClient<E> {
    engine: E,
    timeout: Duration,
}

impl EvaluationClient<HttpEvaluator> {
    /// Client backed by the HTTP evaluation service described by `config`.
    pub fn from_config(config: &EvaluatorConfig) -> Result<Self, EvaluatorError> {
        Ok(Self::new(HttpEvaluator::new(config)?).with_timeout(config.timeout()))
    }
}

impl<E: Evaluator> EvaluationClient<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Evaluate `expression_text`. Never fails: every error path becomes
    /// [`EvaluationOutcome::Failure`].
    pub async fn evaluate(&self, expression_text: &str) -> EvaluationOutcome {
        let Some(expression) = prepare_expression(expression_text) else {
            debug!("Skipping evaluation of blank expression");
            return EvaluationOutcome::failure(FailureKind::InputEmpty, "Expression is required");
        };

        let request = EvaluationRequest::new(expression);
        debug!(expression = %request.expression, "Sending evaluation request");

        let response = tokio::time::timeout(self.timeout, self.engine.evaluate(&request)).await;
        let result = match response {
            Ok(result) => result,
            Err(_) => Err(EvaluatorError::Timeout(self.timeout)),
        };

        match result {
            Ok(ResultValue::Number(n)) if !n.is_finite() => {
                warn!(expression = %request.expression, "Engine returned a non-finite number");
                EvaluationOutcome::failure(
                    FailureKind::InvalidResult,
                    EvaluatorError::NoResult.to_string(),
                )
            }
            Ok(result) => {
                info!(expression = %request.expression, %result, "Evaluation succeeded");
                EvaluationOutcome::Success { result }
            }
            Err(err) => {
                let kind = err.kind();
                match kind {
                    FailureKind::TransportFailure => {
                        error!(expression = %request.expression, error = %err, "Evaluation transport failed")
                    }
                    _ => {
                        warn!(expression = %request.expression, error = %err, "Evaluation rejected")
                    }
                }
                EvaluationOutcome::failure(kind, err.to_string())
            }
        }
    }
}

/// Trim, normalize cosmetic symbols and close unbalanced groupings.
/// Returns `None` for an all-whitespace expression.
///
/// # Example
///
/// ```rust
/// use tally::evaluation::prepare_expression;
///
/// assert_eq!(prepare_expression(" sin(30 ").as_deref(), Some("sin(30)"));
/// assert_eq!(prepare_expression("6 × 7").as_deref(), Some("6 * 7"));
/// assert_eq!(prepare_expression("   "), None);
/// ```
pub fn prepare_expression(expression_text: &str) -> Option<String> {
    let trimmed = expression_text.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(repair_grouping(&normalize_symbols(trimmed)))
}

/// Replace display symbols with the operators the engine understands.
pub fn normalize_symbols(expression: &str) -> String {
    SYMBOL_REPLACEMENTS
        .iter()
        .fold(expression.to_string(), |text, (from, to)| text.replace(from, to))
}

/// Append the closing marks missing from `expression`, tolerating a
/// trailing unclosed call such as `sin(30`.
pub fn repair_grouping(expression: &str) -> String {
    let opens = expression.matches('(').count();
    let closes = expression.matches(')').count();
    if opens <= closes {
        return expression.to_string();
    }

    let repaired = format!("{}{}", expression, ")".repeat(opens - closes));
    debug!(expression, repaired = %repaired, "Closed unbalanced parentheses");
    repaired
}
