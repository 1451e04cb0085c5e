//! JSON contract with the evaluation service.

use super::error::EvaluatorError;
use crate::core::ResultValue;
use serde::{Deserialize, Serialize};

/// Body of an evaluation request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub expression: String,
}

impl EvaluationRequest {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
        }
    }
}

/// Body of an evaluation response: `{ "result": … }` or
/// `{ "error": …, "details": … }`.
///
/// A non-finite engine result serializes as `null` and arrives here as
/// `Success { result: None }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EvaluationResponse {
    Failure {
        error: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
    Success {
        result: Option<WireValue>,
    },
}

/// A result value as it appears on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireValue {
    Number(f64),
    Text(String),
    /// Matrices, units and other structured engine values.
    Other(serde_json::Value),
}

impl From<WireValue> for ResultValue {
    fn from(value: WireValue) -> Self {
        match value {
            WireValue::Number(n) => ResultValue::Number(n),
            WireValue::Text(text) => ResultValue::Text(text),
            WireValue::Other(other) => ResultValue::Text(other.to_string()),
        }
    }
}

/// Error body shared by every endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub details: Option<String>,
}

/// Range and step used when a caller does not choose its own.
pub const DEFAULT_PLOT_RANGE: [f64; 2] = [-20.0, 20.0];
pub const DEFAULT_PLOT_STEP: f64 = 0.2;

/// Body of a plotting request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlotRequest {
    pub expression: String,
    #[serde(rename = "xRange")]
    pub x_range: [f64; 2],
    pub step: f64,
}

impl PlotRequest {
    /// Build a request, rejecting empty expressions, inverted ranges and
    /// non-positive steps.
    pub fn new(
        expression: impl Into<String>,
        x_range: [f64; 2],
        step: f64,
    ) -> Result<Self, EvaluatorError> {
        let expression = expression.into();
        if expression.trim().is_empty() {
            return Err(EvaluatorError::InvalidPlotRequest(
                "expression is empty".to_string(),
            ));
        }
        if !(x_range[0].is_finite() && x_range[1].is_finite()) || x_range[0] > x_range[1] {
            return Err(EvaluatorError::InvalidPlotRequest(format!(
                "invalid x range [{}, {}]",
                x_range[0], x_range[1]
            )));
        }
        if !(step.is_finite() && step > 0.0) {
            return Err(EvaluatorError::InvalidPlotRequest(format!(
                "step must be positive, got {step}"
            )));
        }
        Ok(Self {
            expression,
            x_range,
            step,
        })
    }

    pub fn with_defaults(expression: impl Into<String>) -> Result<Self, EvaluatorError> {
        Self::new(expression, DEFAULT_PLOT_RANGE, DEFAULT_PLOT_STEP)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlotPoint {
    pub x: f64,
    /// `None` where the engine produced a non-finite value.
    pub y: Option<f64>,
}

/// Points outside the function's domain are omitted by the service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotResponse {
    pub points: Vec<PlotPoint>,
}

impl PlotResponse {
    /// Points with a finite `y`, as `(x, y)` pairs.
    pub fn finite_points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.points
            .iter()
            .filter_map(|p| p.y.filter(|y| y.is_finite()).map(|y| (p.x, y)))
    }
}
