//! HTTP transport to the evaluation service.

use super::error::EvaluatorError;
use super::wire::{ErrorBody, EvaluationRequest, EvaluationResponse, PlotRequest, PlotResponse};
use super::Evaluator;
use crate::config::EvaluatorConfig;
use crate::core::ResultValue;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use tracing::debug;

/// Evaluator that posts JSON to `/api/calculate` (and `/api/plot`).
#[derive(Debug, Clone)]
pub struct HttpEvaluator {
    client: Client,
    calculate_url: String,
    plot_url: String,
}

impl HttpEvaluator {
    pub fn new(config: &EvaluatorConfig) -> Result<Self, EvaluatorError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| EvaluatorError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            calculate_url: config.calculate_url(),
            plot_url: config.plot_url(),
        })
    }

    pub fn calculate_url(&self) -> &str {
        &self.calculate_url
    }

    /// Sample `request.expression` over its x range.
    #[tracing::instrument(skip(self, request), fields(expression = %request.expression))]
    pub async fn plot(&self, request: &PlotRequest) -> Result<PlotResponse, EvaluatorError> {
        debug!(url = %self.plot_url, "Posting plot request");
        let response = self
            .client
            .post(&self.plot_url)
            .json(request)
            .send()
            .await
            .map_err(transport)?;

        let (status, body) = read_body(response).await?;
        if status.is_success() {
            return serde_json::from_str(&body).map_err(malformed);
        }
        Err(error_from_status(status, &body))
    }
}

#[async_trait]
impl Evaluator for HttpEvaluator {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<ResultValue, EvaluatorError> {
        debug!(url = %self.calculate_url, "Posting evaluation request");
        let response = self
            .client
            .post(&self.calculate_url)
            .json(request)
            .send()
            .await
            .map_err(transport)?;

        let (status, body) = read_body(response).await?;
        if status.is_server_error() {
            return Err(error_from_status(status, &body));
        }

        match serde_json::from_str::<EvaluationResponse>(&body) {
            Ok(EvaluationResponse::Failure { error, details }) => Err(EvaluatorError::Rejected {
                message: error,
                details,
            }),
            Ok(EvaluationResponse::Success { result: Some(value) }) if status.is_success() => {
                Ok(value.into())
            }
            Ok(EvaluationResponse::Success { result: None }) if status.is_success() => {
                Err(EvaluatorError::NoResult)
            }
            Ok(_) | Err(_) if !status.is_success() => Err(error_from_status(status, &body)),
            Ok(_) => Err(EvaluatorError::NoResult),
            Err(e) => Err(malformed(e)),
        }
    }
}

async fn read_body(response: Response) -> Result<(StatusCode, String), EvaluatorError> {
    let status = response.status();
    let body = response.text().await.map_err(transport)?;
    Ok((status, body))
}

/// Map a non-success status to an error, using the service's error body
/// when it has one.
fn error_from_status(status: StatusCode, body: &str) -> EvaluatorError {
    let parsed = serde_json::from_str::<ErrorBody>(body).ok();

    if status.is_client_error() {
        return match parsed {
            Some(ErrorBody { error, details }) => EvaluatorError::Rejected {
                message: error,
                details,
            },
            None => EvaluatorError::Rejected {
                message: status
                    .canonical_reason()
                    .unwrap_or("Bad Request")
                    .to_string(),
                details: (!body.trim().is_empty()).then(|| body.trim().to_string()),
            },
        };
    }

    let message = match parsed {
        Some(ErrorBody { error, .. }) => error,
        None => status
            .canonical_reason()
            .unwrap_or("Unexpected status")
            .to_string(),
    };
    EvaluatorError::Server {
        status: status.as_u16(),
        message,
    }
}

fn transport(err: reqwest::Error) -> EvaluatorError {
    EvaluatorError::Transport(err.to_string())
}

fn malformed(err: serde_json::Error) -> EvaluatorError {
    EvaluatorError::Transport(format!("Malformed response: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_error_with_body_is_rejected() {
        let err = error_from_status(
            StatusCode::BAD_REQUEST,
            r#"{"error":"Invalid Expression","details":"Unexpected end of expression"}"#,
        );
        assert_eq!(
            err,
            EvaluatorError::Rejected {
                message: "Invalid Expression".to_string(),
                details: Some("Unexpected end of expression".to_string()),
            }
        );
    }

    #[test]
    fn client_error_without_body_uses_reason() {
        let err = error_from_status(StatusCode::BAD_REQUEST, "");
        assert_eq!(
            err,
            EvaluatorError::Rejected {
                message: "Bad Request".to_string(),
                details: None,
            }
        );
    }

    #[test]
    fn server_error_keeps_status() {
        let err = error_from_status(StatusCode::BAD_GATEWAY, "<html>upstream down</html>");
        assert_eq!(
            err,
            EvaluatorError::Server {
                status: 502,
                message: "Bad Gateway".to_string(),
            }
        );
    }

    #[test]
    fn urls_come_from_config() {
        let evaluator = HttpEvaluator::new(&EvaluatorConfig {
            endpoint: "http://calc.test".to_string(),
            ..EvaluatorConfig::default()
        })
        .unwrap();
        assert_eq!(evaluator.calculate_url(), "http://calc.test/api/calculate");
    }
}
