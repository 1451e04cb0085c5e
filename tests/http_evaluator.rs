// HTTP transport tests for the evaluation client
// Each test runs against a mock evaluation service

use mockito::Matcher;
use serde_json::json;
use tally::config::EvaluatorConfig;
use tally::core::ResultValue;
use tally::evaluation::{
    EvaluationClient, EvaluationOutcome, EvaluationRequest, Evaluator, EvaluatorError,
    FailureKind, HttpEvaluator, PlotRequest,
};
use tally::session::{Action, Completion, Session};

fn evaluator_for(server: &mockito::Server) -> HttpEvaluator {
    HttpEvaluator::new(&EvaluatorConfig {
        endpoint: server.url(),
        ..EvaluatorConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_numeric_result() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/api/calculate")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({ "expression": "2 + 3" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"result":5}"#)
        .create_async()
        .await;

    let result = evaluator_for(&server)
        .evaluate(&EvaluationRequest::new("2 + 3"))
        .await;

    assert_eq!(result, Ok(ResultValue::Number(5.0)));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_invalid_expression() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/api/calculate")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"Invalid Expression","details":"Unexpected operator /"}"#)
        .create_async()
        .await;

    let result = evaluator_for(&server)
        .evaluate(&EvaluationRequest::new("5 / / 2"))
        .await;

    assert_eq!(
        result,
        Err(EvaluatorError::Rejected {
            message: "Invalid Expression".to_string(),
            details: Some("Unexpected operator /".to_string()),
        })
    );
}

#[tokio::test]
async fn test_server_error() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/api/calculate")
        .with_status(503)
        .with_body("upstream unavailable")
        .create_async()
        .await;

    let client = EvaluationClient::new(evaluator_for(&server));
    let outcome = client.evaluate("1 + 1").await;

    assert!(matches!(
        outcome,
        EvaluationOutcome::Failure {
            kind: FailureKind::TransportFailure,
            ..
        }
    ));
}

#[tokio::test]
async fn test_null_result_is_invalid() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/api/calculate")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"result":null}"#)
        .create_async()
        .await;

    let client = EvaluationClient::new(evaluator_for(&server));
    let outcome = client.evaluate("1 / 0").await;

    assert!(matches!(
        outcome,
        EvaluationOutcome::Failure {
            kind: FailureKind::InvalidResult,
            ..
        }
    ));
}

#[tokio::test]
async fn test_malformed_body_is_transport_failure() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/api/calculate")
        .with_status(200)
        .with_body("<html>not json</html>")
        .create_async()
        .await;

    let result = evaluator_for(&server)
        .evaluate(&EvaluationRequest::new("1"))
        .await;

    assert!(matches!(result, Err(EvaluatorError::Transport(_))));
}

#[tokio::test]
async fn test_unreachable_service() {
    // Nothing listens on port 9 (discard) in the test environment.
    let client = EvaluationClient::new(
        HttpEvaluator::new(&EvaluatorConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            timeout_ms: 1000,
            ..EvaluatorConfig::default()
        })
        .unwrap(),
    );

    let outcome = client.evaluate("1 + 1").await;

    assert!(matches!(
        outcome,
        EvaluationOutcome::Failure {
            kind: FailureKind::TransportFailure,
            ..
        }
    ));
}

#[tokio::test]
async fn test_session_sends_repaired_expression() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/api/calculate")
        .match_body(Matcher::Json(json!({ "expression": "sqrt(16)" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"result":4}"#)
        .create_async()
        .await;

    let client = EvaluationClient::new(evaluator_for(&server));
    let mut session = Session::default();
    session.apply(Action::from_key("sqrt").unwrap()).unwrap();
    session.apply(Action::Digit('1')).unwrap();
    session.apply(Action::Digit('6')).unwrap();

    let completion = session.evaluate(&client).await;

    assert!(matches!(completion, Completion::Recorded(_)));
    assert_eq!(session.frame().primary, "4");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_plot_points() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("POST", "/api/plot")
        .match_body(Matcher::Json(json!({
            "expression": "sqrt(x)",
            "xRange": [-1.0, 1.0],
            "step": 1.0
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"points":[{"x":0,"y":0},{"x":1,"y":1}]}"#)
        .create_async()
        .await;

    let request = PlotRequest::new("sqrt(x)", [-1.0, 1.0], 1.0).unwrap();
    let response = evaluator_for(&server).plot(&request).await.unwrap();

    let points: Vec<_> = response.finite_points().collect();
    assert_eq!(points, vec![(0.0, 0.0), (1.0, 1.0)]);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_plot_rejected() {
    let mut server = mockito::Server::new_async().await;

    let _mock = server
        .mock("POST", "/api/plot")
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":"Invalid plot request","details":"Undefined symbol y"}"#)
        .create_async()
        .await;

    let request = PlotRequest::with_defaults("y").unwrap();
    let err = evaluator_for(&server).plot(&request).await.unwrap_err();

    assert_eq!(err.kind(), FailureKind::MalformedExpression);
    assert_eq!(err.to_string(), "Invalid plot request: Undefined symbol y");
}
