use std::time::Duration;

use super::common::*;
use crate::screening::advisory::{
    AdvisoryClient, AdvisoryError, RetryBackoff, TransportFailure, TransportKind,
};

#[test]
fn first_success_makes_exactly_one_attempt() {
    let transport = CannedTransport::new(envelope("{\"answer\": true}"));
    let client = advisory_client(transport.clone());

    let body = client.request("assess this").expect("request succeeds");

    assert_eq!(body, "{\"answer\": true}");
    assert_eq!(transport.calls(), 1);
}

#[test]
fn transport_failures_consume_the_whole_attempt_budget() {
    let transport = FailingTransport::network();
    let client = advisory_client(transport.clone());

    let err = client.request("assess this").expect_err("request fails");

    assert_eq!(transport.calls(), 3);
    match err {
        AdvisoryError::Exhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert_eq!(last.kind, TransportKind::Network);
        }
        other => panic!("expected Exhausted, got {other:?}"),
    }
}

#[test]
fn recovery_mid_budget_stops_retrying() {
    let transport = SequenceTransport::new(vec![
        Err(TransportFailure {
            kind: TransportKind::Timeout,
            detail: "deadline exceeded".to_string(),
        }),
        Ok(envelope("{\"ok\": 1}")),
    ]);
    let client = advisory_client(transport.clone());

    let body = client.request("assess this").expect("second attempt succeeds");

    assert_eq!(body, "{\"ok\": 1}");
    assert_eq!(transport.calls(), 2);
}

#[test]
fn http_error_statuses_are_retried() {
    let transport = FailingTransport::new(TransportKind::HttpStatus(500));
    let client = advisory_client(transport.clone());

    let err = client.request("assess this").expect_err("request fails");

    assert_eq!(transport.calls(), 3);
    assert!(matches!(err, AdvisoryError::Exhausted { .. }));
}

#[test]
fn malformed_envelope_fails_without_retrying() {
    // The endpoint answered with a 200; resending the same payload cannot
    // turn a nonsense body into a good one.
    let transport = CannedTransport::new("not the envelope shape");
    let client = advisory_client(transport.clone());

    let err = client.request("assess this").expect_err("envelope must fail");

    assert_eq!(transport.calls(), 1);
    assert!(matches!(err, AdvisoryError::Envelope { .. }));
}

#[test]
fn prompt_and_model_travel_in_the_request() {
    let transport = CannedTransport::new(envelope("{}"));
    let client = advisory_client(transport.clone());

    client.request("the exact prompt").expect("request succeeds");

    let prompt = transport.last_prompt().expect("prompt recorded");
    assert_eq!(prompt, "the exact prompt");
}

#[test]
fn zero_retry_budget_still_attempts_once() {
    let mut config = test_advisory_config();
    config.max_retries = 0;
    let transport = FailingTransport::network();
    let client = AdvisoryClient::new(config, transport.clone());

    let err = client.request("assess this").expect_err("request fails");

    assert_eq!(transport.calls(), 1);
    match err {
        AdvisoryError::Exhausted { attempts, .. } => assert_eq!(attempts, 1),
        other => panic!("expected Exhausted, got {other:?}"),
    }
}

#[test]
fn backoff_schedules_grow_as_configured() {
    let fixed = RetryBackoff::Fixed(Duration::from_millis(250));
    assert_eq!(fixed.delay_after(1), Duration::from_millis(250));
    assert_eq!(fixed.delay_after(4), Duration::from_millis(250));

    let linear = RetryBackoff::Linear(Duration::from_millis(250));
    assert_eq!(linear.delay_after(1), Duration::from_millis(250));
    assert_eq!(linear.delay_after(3), Duration::from_millis(750));
}
