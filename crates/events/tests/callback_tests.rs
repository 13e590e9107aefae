//! Integration tests for [`CallbackReporter`] against a mock callback endpoint.

use std::time::Duration;

use assert_matches::assert_matches;
use dbinit_core::{LifecycleResponse, ResponseStatus, RetryPolicy};
use dbinit_events::{CallbackReporter, DeliveryError, DeliveryOutcome, ResponseReporter};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn response(status: ResponseStatus) -> LifecycleResponse {
    LifecycleResponse {
        status,
        request_id: "req-1".into(),
        logical_resource_id: "CustomResource".into(),
        stack_id: "arn:aws:cloudformation:eu-west-1:123456789012:stack/infra/abc".into(),
        physical_resource_id: String::new(),
    }
}

fn reporter(max_attempts: u32) -> CallbackReporter {
    CallbackReporter::new(
        RetryPolicy::new(max_attempts, Duration::ZERO),
        Duration::from_secs(2),
    )
    .unwrap()
}

async fn received(server: &MockServer) -> usize {
    server.received_requests().await.unwrap_or_default().len()
}

// ---------------------------------------------------------------------------
// Test: happy path
// ---------------------------------------------------------------------------

/// A healthy endpoint receives exactly one PUT with the exact wire body.
#[tokio::test]
async fn delivers_exact_body_on_first_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/cb"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "Status": "SUCCESS",
            "RequestId": "req-1",
            "LogicalResourceId": "CustomResource",
            "StackId": "arn:aws:cloudformation:eu-west-1:123456789012:stack/infra/abc",
            "PhysicalResourceId": ""
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = reporter(5)
        .deliver(&format!("{}/cb", server.uri()), &response(ResponseStatus::Success))
        .await;

    assert_matches!(outcome, DeliveryOutcome::Delivered { attempts: 1 });
}

// ---------------------------------------------------------------------------
// Test: retry budget
// ---------------------------------------------------------------------------

/// Four failures followed by a success use the whole budget and deliver.
#[tokio::test]
async fn succeeds_on_fifth_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(4)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .with_priority(2)
        .mount(&server)
        .await;

    let outcome = reporter(5)
        .deliver(&format!("{}/cb", server.uri()), &response(ResponseStatus::Success))
        .await;

    assert_matches!(outcome, DeliveryOutcome::Delivered { attempts: 5 });
    assert_eq!(received(&server).await, 5);
}

/// An endpoint that always fails sees exactly five attempts and the
/// caller gets an outcome, not an error.
#[tokio::test]
async fn gives_up_after_five_failures() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let outcome = reporter(5)
        .deliver(&format!("{}/cb", server.uri()), &response(ResponseStatus::Failed))
        .await;

    assert_matches!(
        outcome,
        DeliveryOutcome::Exhausted {
            attempts: 5,
            last_error: DeliveryError::HttpStatus(503)
        }
    );
    assert_eq!(received(&server).await, 5);
}

/// Network failures are retried the same way as non-2xx responses.
#[tokio::test]
async fn network_failures_exhaust_the_budget() {
    // Bind and immediately drop a listener so the port refuses connections.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let outcome = reporter(5)
        .deliver(
            &format!("http://127.0.0.1:{port}/cb"),
            &response(ResponseStatus::Success),
        )
        .await;

    assert_matches!(
        outcome,
        DeliveryOutcome::Exhausted {
            attempts: 5,
            last_error: DeliveryError::Request(_)
        }
    );
}

/// The attempt count comes from the policy, not a constant.
#[tokio::test]
async fn honors_configured_attempt_count() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let outcome = reporter(2)
        .deliver(&format!("{}/cb", server.uri()), &response(ResponseStatus::Success))
        .await;

    assert_eq!(outcome.attempts(), 2);
    assert_eq!(received(&server).await, 2);
}
