mod common;

use checkout_dispatch::config::PaymentsConfig;
use checkout_dispatch::payments::providers::{MpesaConfig, StkQueryStatus};
use checkout_dispatch::payments::{Settlement, Widgets};
use checkout_dispatch::ErrorKind;
use rust_decimal_macros::dec;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{basic_auth, bearer_token, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_token(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/oauth/v1/generate"))
        .and(query_param("grant_type", "client_credentials"))
        .and(basic_auth("consumer-key", "consumer-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok",
            "expires_in": "3599"
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_stk_push_is_accepted_not_completed() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path("/mpesa/stkpush/v1/processrequest"))
        .and(bearer_token("tok"))
        .and(body_partial_json(json!({
            "BusinessShortCode": "174379",
            "TransactionType": "CustomerPayBillOnline",
            "Amount": "100",
            "PartyA": "254712345678",
            "PartyB": "174379",
            "PhoneNumber": "254712345678",
            "CallBackURL": "https://merchant.example/mpesa/callback",
            "TransactionDesc": "Payment for services - SILA TECH"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "MerchantRequestID": "29115-34620561-1",
            "CheckoutRequestID": "abc123",
            "ResponseCode": "0",
            "ResponseDescription": "Success. Request accepted for processing",
            "CustomerMessage": "ok"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = common::gateway(common::payments_config(&server), Widgets::default());
    let result = gateway.process(common::form("mpesa", dec!(100), "KES")).await;

    assert!(result.success, "unexpected failure: {:?}", result.error);
    assert_eq!(result.provider_reference.as_deref(), Some("abc123"));
    assert_eq!(result.settlement, Some(Settlement::Accepted));
    assert!(!result.is_completed());
    assert_eq!(result.amount, dec!(100));
    assert!(result.reference.unwrap().starts_with("SILA-"));
}

#[tokio::test]
async fn test_caller_reference_becomes_account_reference() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path("/mpesa/stkpush/v1/processrequest"))
        .and(body_partial_json(json!({ "AccountReference": "INV-2041" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "CheckoutRequestID": "ws_CO_2041",
            "ResponseCode": "0"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = common::gateway(common::payments_config(&server), Widgets::default());
    let mut form = common::form("mobile_money", dec!(250), "KES");
    form.reference = Some("INV-2041".to_string());
    let result = gateway.process(form).await;

    assert!(result.success);
    assert_eq!(result.reference.as_deref(), Some("INV-2041"));
}

#[tokio::test]
async fn test_placeholder_credentials_make_no_network_calls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = common::payments_config(&server);
    config.mpesa.consumer_key = "YOUR_CONSUMER_KEY".to_string();

    let gateway = common::gateway(config, Widgets::default());
    let result = gateway.process(common::form("mpesa", dec!(100), "KES")).await;

    assert!(!result.success);
    assert_eq!(result.error_kind(), Some(ErrorKind::Config));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_token_failure_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oauth/v1/generate"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "errorCode": "401.002.01",
            "errorMessage": "Error Occurred - Invalid Access Token"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let gateway = common::gateway(common::payments_config(&server), Widgets::default());
    let result = gateway.process(common::form("mpesa", dec!(100), "KES")).await;

    assert!(!result.success);
    assert_eq!(result.error_kind(), Some(ErrorKind::Auth));
}

#[tokio::test]
async fn test_nonzero_response_code_is_rejected() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path("/mpesa/stkpush/v1/processrequest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ResponseCode": "1",
            "ResponseDescription": "Invalid PhoneNumber"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = common::gateway(common::payments_config(&server), Widgets::default());
    let result = gateway.process(common::form("mpesa", dec!(100), "KES")).await;

    assert!(!result.success);
    let error = result.error.unwrap();
    assert_eq!(error.kind, ErrorKind::ProviderRejected);
    assert!(error.message.contains("Invalid PhoneNumber"));
    assert!(result.provider_reference.is_none());
}

#[tokio::test]
async fn test_http_error_with_vendor_message_is_rejected() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path("/mpesa/stkpush/v1/processrequest"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "requestId": "7071-4170-a0e4-8345632bad442",
            "errorCode": "400.002.02",
            "errorMessage": "Bad Request - Invalid Amount"
        })))
        .mount(&server)
        .await;

    let gateway = common::gateway(common::payments_config(&server), Widgets::default());
    let result = gateway.process(common::form("mpesa", dec!(0.5), "KES")).await;

    let error = result.error.unwrap();
    assert_eq!(error.kind, ErrorKind::ProviderRejected);
    assert!(error.message.contains("Invalid Amount"));
}

#[tokio::test]
async fn test_non_json_gateway_error_is_network_error() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path("/mpesa/stkpush/v1/processrequest"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let gateway = common::gateway(common::payments_config(&server), Widgets::default());
    let result = gateway.process(common::form("mpesa", dec!(100), "KES")).await;

    assert_eq!(result.error_kind(), Some(ErrorKind::Network));
}

#[tokio::test]
async fn test_neighbour_prefix_is_remapped_only_in_sandbox() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path("/mpesa/stkpush/v1/processrequest"))
        .and(body_partial_json(json!({ "PhoneNumber": "254712345678" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "CheckoutRequestID": "ws_CO_255",
            "ResponseCode": "0"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = common::gateway(common::payments_config(&server), Widgets::default());
    let mut form = common::form("mpesa", dec!(10), "KES");
    form.phone = "+255 712-345-678".to_string();
    let result = gateway.process(form).await;

    assert!(result.success, "unexpected failure: {:?}", result.error);
}

#[tokio::test]
async fn test_check_status_returns_raw_payload() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    let payload = json!({
        "ResponseCode": "0",
        "ResponseDescription": "The service request has been accepted successsfully",
        "MerchantRequestID": "22205-34066-1",
        "CheckoutRequestID": "abc123",
        "ResultCode": "1032",
        "ResultDesc": "Request cancelled by user"
    });
    Mock::given(method("POST"))
        .and(path("/mpesa/stkpushquery/v1/query"))
        .and(bearer_token("tok"))
        .and(body_partial_json(json!({
            "BusinessShortCode": "174379",
            "CheckoutRequestID": "abc123"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = common::gateway(common::payments_config(&server), Widgets::default());
    let returned = gateway.check_mobile_money_status("abc123").await.unwrap();

    assert_eq!(returned, payload);
    assert_eq!(StkQueryStatus::from_payload(&returned), StkQueryStatus::Cancelled);
}

#[tokio::test]
async fn test_check_status_requires_credentials() {
    let gateway = common::gateway(PaymentsConfig::default(), Widgets::default());
    let err = gateway.check_mobile_money_status("abc123").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[tokio::test]
async fn test_sample_callback_url_makes_no_network_calls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    for callback_url in [
        MpesaConfig::default().callback_url,
        "https://yourdomain.com/api/mpesa-callback".to_string(),
    ] {
        let mut config = common::payments_config(&server);
        config.mpesa.callback_url = callback_url;

        let gateway = common::gateway(config, Widgets::default());
        let result = gateway.process(common::form("mpesa", dec!(100), "KES")).await;

        assert_eq!(result.error_kind(), Some(ErrorKind::Config));
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_accepted_push_without_checkout_request_id_is_rejected() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path("/mpesa/stkpush/v1/processrequest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ResponseCode": "0",
            "ResponseDescription": "Success. Request accepted for processing",
            "CustomerMessage": "ok"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = common::gateway(common::payments_config(&server), Widgets::default());
    let result = gateway.process(common::form("mpesa", dec!(100), "KES")).await;

    assert!(!result.success);
    assert_eq!(result.error_kind(), Some(ErrorKind::ProviderRejected));
    assert!(result.provider_reference.is_none());
}

#[tokio::test]
async fn test_reconfigured_timeout_applies_to_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/oauth/v1/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "access_token": "tok" }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut gateway = common::gateway(common::payments_config(&server), Widgets::default());
    let mut config = common::payments_config(&server);
    config.timeout_secs = Some(1);
    gateway.configure(config).unwrap();
    assert_eq!(gateway.config().timeout_secs(), 1);

    let result = gateway.process(common::form("mpesa", dec!(100), "KES")).await;

    assert!(!result.success);
    assert_eq!(result.error_kind(), Some(ErrorKind::Network));
}
