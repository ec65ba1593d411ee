//! SetupIntents API tests against a mocked Stripe.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use wiremock::matchers::{
    basic_auth, body_string, body_string_contains, header, method, path, query_param,
    query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

use stripe_setup_intents::{
    ConfigClientProvider, CreateSetupIntent, IdempotencyKey, MandateDataOptions, SetupIntentStatus,
    SetupIntentUsage, SetupIntentsApi, StripeClient, StripeClientProvider, StripeConfig,
    StripeError, StripeSetupIntents,
};

const API_KEY: &str = "sk_test_mock";

fn config(server: &MockServer) -> StripeConfig {
    StripeConfig::new(API_KEY).with_api_base(format!("{}/v1", server.uri()))
}

fn setup_intents(server: &MockServer) -> StripeSetupIntents {
    let provider = ConfigClientProvider::new(config(server));
    StripeSetupIntents::new(Arc::new(provider))
}

fn intent_json(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "object": "setup_intent",
        "client_secret": format!("{id}_secret_test"),
        "customer": "cus_123",
        "status": status,
        "usage": "off_session",
        "payment_method_types": ["card"],
        "metadata": {},
        "created": 1_700_000_000,
        "livemode": false
    })
}

/// Counts how often the client is requested.
struct CountingProvider {
    client: Arc<StripeClient>,
    calls: AtomicUsize,
}

#[async_trait]
impl StripeClientProvider for CountingProvider {
    async fn get(&self) -> stripe_setup_intents::Result<Arc<StripeClient>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::clone(&self.client))
    }
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn create_defaults_to_off_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/setup_intents"))
        .and(basic_auth(API_KEY, ""))
        .and(body_string("customer=cus_123&usage=off_session"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(intent_json("seti_1", "requires_payment_method")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let intent = setup_intents(&server)
        .create(CreateSetupIntent::new("cus_123"))
        .await
        .expect("create should succeed");

    assert_eq!(intent.id, "seti_1");
    assert_eq!(intent.status, SetupIntentStatus::RequiresPaymentMethod);
    assert_eq!(intent.usage, SetupIntentUsage::OffSession);
    assert_eq!(intent.client_secret.as_deref(), Some("seti_1_secret_test"));
}

#[tokio::test]
async fn create_sends_optional_fields_and_idempotency_key() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/setup_intents"))
        .and(header("Idempotency-Key", "order-42"))
        .and(body_string_contains("usage=on_session"))
        .and(body_string_contains("confirm=true"))
        .and(body_string_contains("payment_method=pm_123"))
        .and(body_string_contains("return_url=https%3A%2F%2Fexample.com%2Fdone"))
        .and(body_string_contains(
            "mandate_data%5Bcustomer_acceptance%5D%5Btype%5D=online",
        ))
        .and(body_string_contains("metadata%5Border%5D=42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(intent_json("seti_2", "succeeded")))
        .expect(1)
        .mount(&server)
        .await;

    let params = CreateSetupIntent::new("cus_123")
        .with_usage(SetupIntentUsage::OnSession)
        .with_confirm(true)
        .with_payment_method("pm_123")
        .with_return_url("https://example.com/done")
        .with_mandate_data(MandateDataOptions::online("203.0.113.7", "Mozilla/5.0"))
        .with_metadata("order", "42")
        .with_idempotency_key(IdempotencyKey::new("order-42").unwrap());

    let intent = setup_intents(&server).create(params).await.unwrap();
    assert!(intent.is_terminal());
}

#[tokio::test]
async fn create_without_key_sends_no_idempotency_header() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/setup_intents"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(intent_json("seti_3", "requires_payment_method")),
        )
        .mount(&server)
        .await;

    setup_intents(&server)
        .create(CreateSetupIntent::new("cus_123"))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("idempotency-key").is_none());
}

#[tokio::test]
async fn create_and_confirm_for_off_session_card() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/setup_intents"))
        .and(header("Idempotency-Key", "card-key"))
        .and(body_string_contains("customer=cus_123"))
        .and(body_string_contains("usage=off_session"))
        .and(body_string_contains("confirm=true"))
        .and(body_string_contains("payment_method=pm_card_visa"))
        .and(body_string_contains("payment_method_types%5B0%5D=card"))
        .respond_with(ResponseTemplate::new(200).set_body_json(intent_json("seti_4", "succeeded")))
        .expect(1)
        .mount(&server)
        .await;

    let intent = setup_intents(&server)
        .create_and_confirm_for_off_session_card(
            "cus_123",
            "pm_card_visa",
            None,
            Some(IdempotencyKey::new("card-key").unwrap()),
        )
        .await
        .unwrap();

    assert_eq!(intent.status, SetupIntentStatus::Succeeded);
}

#[tokio::test]
async fn blank_arguments_never_reach_stripe() {
    let server = MockServer::start().await;
    let api = setup_intents(&server);

    assert!(matches!(
        api.create(CreateSetupIntent::new("")).await,
        Err(StripeError::InvalidArgument(_))
    ));
    assert!(matches!(
        api.create_and_confirm_for_off_session_card("cus_123", " ", None, None)
            .await,
        Err(StripeError::InvalidArgument(_))
    ));
    assert!(matches!(api.get("").await, Err(StripeError::InvalidArgument(_))));
    assert!(matches!(api.cancel("").await, Err(StripeError::InvalidArgument(_))));
    assert!(matches!(
        api.confirm("", None, None).await,
        Err(StripeError::InvalidArgument(_))
    ));
    assert!(matches!(
        api.update("", HashMap::new()).await,
        Err(StripeError::InvalidArgument(_))
    ));
    assert!(matches!(api.list("").await, Err(StripeError::InvalidArgument(_))));

    assert!(server.received_requests().await.unwrap().is_empty());
}

// ============================================================================
// Retrieve / confirm / cancel / update
// ============================================================================

#[tokio::test]
async fn get_retrieves_by_id() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/setup_intents/seti_5"))
        .and(basic_auth(API_KEY, ""))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(intent_json("seti_5", "requires_action")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let intent = setup_intents(&server).get("seti_5").await.unwrap();
    assert_eq!(intent.id, "seti_5");
    assert!(intent.requires_action());
}

#[tokio::test]
async fn confirm_sends_payment_method_and_return_url() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/setup_intents/seti_6/confirm"))
        .and(body_string(
            "payment_method=pm_456&return_url=https%3A%2F%2Fexample.com%2F3ds",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(intent_json("seti_6", "succeeded")))
        .expect(1)
        .mount(&server)
        .await;

    let intent = setup_intents(&server)
        .confirm("seti_6", Some("pm_456"), Some("https://example.com/3ds"))
        .await
        .unwrap();
    assert_eq!(intent.status, SetupIntentStatus::Succeeded);
}

#[tokio::test]
async fn confirm_without_options_sends_empty_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/setup_intents/seti_7/confirm"))
        .and(body_string(""))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(intent_json("seti_7", "processing")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let intent = setup_intents(&server)
        .confirm("seti_7", None, None)
        .await
        .unwrap();
    assert_eq!(intent.status, SetupIntentStatus::Processing);
}

#[tokio::test]
async fn cancel_posts_to_cancel_endpoint() {
    let server = MockServer::start().await;

    let mut canceled = intent_json("seti_8", "canceled");
    canceled["cancellation_reason"] = json!("abandoned");

    Mock::given(method("POST"))
        .and(path("/v1/setup_intents/seti_8/cancel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(canceled))
        .expect(1)
        .mount(&server)
        .await;

    let intent = setup_intents(&server).cancel("seti_8").await.unwrap();
    assert_eq!(intent.status, SetupIntentStatus::Canceled);
    assert_eq!(intent.cancellation_reason.as_deref(), Some("abandoned"));
}

#[tokio::test]
async fn update_sends_metadata() {
    let server = MockServer::start().await;

    let mut updated = intent_json("seti_9", "requires_payment_method");
    updated["metadata"] = json!({"plan": "pro", "seat_count": "3"});

    Mock::given(method("POST"))
        .and(path("/v1/setup_intents/seti_9"))
        .and(body_string("metadata%5Bplan%5D=pro&metadata%5Bseat_count%5D=3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(updated))
        .expect(1)
        .mount(&server)
        .await;

    let metadata = HashMap::from([
        ("seat_count".to_string(), "3".to_string()),
        ("plan".to_string(), "pro".to_string()),
    ]);

    let intent = setup_intents(&server)
        .update("seti_9", metadata)
        .await
        .unwrap();
    assert_eq!(intent.metadata.get("plan").map(String::as_str), Some("pro"));
}

// ============================================================================
// List
// ============================================================================

#[tokio::test]
async fn list_follows_pagination() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/setup_intents"))
        .and(query_param("customer", "cus_123"))
        .and(query_param("limit", "100"))
        .and(query_param("starting_after", "seti_b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [intent_json("seti_c", "succeeded")],
            "has_more": false,
            "url": "/v1/setup_intents"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/setup_intents"))
        .and(query_param("customer", "cus_123"))
        .and(query_param_is_missing("starting_after"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [
                intent_json("seti_a", "succeeded"),
                intent_json("seti_b", "canceled")
            ],
            "has_more": true,
            "url": "/v1/setup_intents"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let intents = setup_intents(&server).list("cus_123").await.unwrap();
    let ids: Vec<_> = intents.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["seti_a", "seti_b", "seti_c"]);
}

#[tokio::test]
async fn list_empty_customer() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/setup_intents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [],
            "has_more": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let intents = setup_intents(&server).list("cus_empty").await.unwrap();
    assert!(intents.is_empty());
}

// ============================================================================
// Errors
// ============================================================================

#[tokio::test]
async fn api_errors_are_decoded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/setup_intents/seti_missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "type": "invalid_request_error",
                "code": "resource_missing",
                "message": "No such setupintent: 'seti_missing'",
                "param": "intent"
            }
        })))
        .mount(&server)
        .await;

    let err = setup_intents(&server).get("seti_missing").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.code(), Some("resource_missing"));

    match err {
        StripeError::Api {
            error_type, param, ..
        } => {
            assert_eq!(error_type, "invalid_request_error");
            assert_eq!(param.as_deref(), Some("intent"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn undecodable_errors_keep_status() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/setup_intents/seti_x/cancel"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
        .mount(&server)
        .await;

    let err = setup_intents(&server).cancel("seti_x").await.unwrap_err();
    match err {
        StripeError::Api {
            status,
            error_type,
            message,
            ..
        } => {
            assert_eq!(status, 502);
            assert_eq!(error_type, "unknown");
            assert!(message.contains("502"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// ============================================================================
// Client handle and headers
// ============================================================================

#[tokio::test]
async fn service_handle_is_built_once_and_rebuilt_after_close() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/setup_intents/seti_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(intent_json("seti_1", "succeeded")))
        .mount(&server)
        .await;

    let provider = Arc::new(CountingProvider {
        client: Arc::new(StripeClient::new(&config(&server)).unwrap()),
        calls: AtomicUsize::new(0),
    });
    let api = StripeSetupIntents::new(Arc::clone(&provider) as Arc<dyn StripeClientProvider>);

    for _ in 0..3 {
        api.get("seti_1").await.unwrap();
    }
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

    api.close().await;
    api.get("seti_1").await.unwrap();
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn version_and_account_headers_are_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/setup_intents/seti_1"))
        .and(header("Stripe-Version", "2024-06-20"))
        .and(header("Stripe-Account", "acct_123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(intent_json("seti_1", "succeeded")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = ConfigClientProvider::new(
        config(&server)
            .with_api_version("2024-06-20")
            .with_stripe_account("acct_123"),
    );
    let api = StripeSetupIntents::new(Arc::new(provider));

    api.get("seti_1").await.unwrap();
}

#[tokio::test]
async fn ids_are_escaped_in_paths() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/setup_intents/seti%2F..%2Fcustomers"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"type": "invalid_request_error", "message": "No such setupintent"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = setup_intents(&server)
        .get("seti/../customers")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
