mod support;

use checkout_payments::domain::error::PaymentError;
use checkout_payments::processors::{easypaisa, postex, xstack, PaymentProcessor};
use serde_json::json;
use support::sample_basket;

fn easypaisa() -> easypaisa::EasyPaisa {
    easypaisa::EasyPaisa {
        public_base_url: "https://shop.example".to_string(),
    }
}

fn postex() -> postex::PostEx {
    postex::PostEx {
        public_base_url: "https://shop.example".to_string(),
    }
}

fn postex_cod() -> postex::PostExCod {
    postex::PostExCod {
        public_base_url: "https://shop.example".to_string(),
        client: reqwest::Client::new(),
    }
}

fn xstack() -> xstack::XStack {
    xstack::XStack {
        public_base_url: "https://shop.example".to_string(),
        client: reqwest::Client::new(),
    }
}

#[test]
fn processors_report_their_registry_names() {
    assert_eq!(easypaisa().name(), "easypaisa");
    assert_eq!(postex().name(), "postex");
    assert_eq!(postex_cod().name(), "postex_cod");
    assert_eq!(xstack().name(), "xstack");
}

#[test]
fn a_missing_status_field_is_never_a_success() {
    let basket = sample_basket();

    let err = easypaisa()
        .handle_response(&json!({ "orderRefNumber": basket.order_number }), &basket)
        .unwrap_err();
    assert!(matches!(err, PaymentError::MalformedResponse));
    assert!(err.is_payment_failure());

    let err = postex()
        .handle_response(&json!({ "orderRefNum": basket.order_number }), &basket)
        .unwrap_err();
    assert!(matches!(err, PaymentError::MalformedResponse));
}

#[test]
fn easypaisa_decline_codes_map_to_documented_reasons() {
    let basket = sample_basket();

    let err = easypaisa()
        .handle_response(&json!({ "status": "0013" }), &basket)
        .unwrap_err();
    match err {
        PaymentError::Declined(reason) => assert_eq!(reason, "Low Balance"),
        other => panic!("expected a decline, got {other:?}"),
    }

    let err = easypaisa()
        .handle_response(&json!({ "status": "0001" }), &basket)
        .unwrap_err();
    match err {
        PaymentError::Declined(reason) => assert_eq!(reason, "System Error"),
        other => panic!("expected a decline, got {other:?}"),
    }
}

#[test]
fn an_unrecognized_status_code_is_still_a_decline() {
    let basket = sample_basket();

    let err = easypaisa()
        .handle_response(&json!({ "status": "9999" }), &basket)
        .unwrap_err();
    match err {
        PaymentError::Declined(reason) => {
            assert_eq!(reason, "Status Code not found in expected responses")
        }
        other => panic!("expected a decline, got {other:?}"),
    }
}

#[test]
fn easypaisa_success_prefers_the_provider_reference() {
    let basket = sample_basket();

    let handled = easypaisa()
        .handle_response(
            &json!({ "status": "0000", "orderRefNumber": "EP-REF-9" }),
            &basket,
        )
        .unwrap();
    assert_eq!(handled.transaction_id, "EP-REF-9");
    assert_eq!(handled.total_minor, basket.total_minor);
    assert_eq!(handled.display_label, "EasyPaisa Account");

    // Without the provider reference the order number stands in.
    let handled = easypaisa()
        .handle_response(&json!({ "status": "0000" }), &basket)
        .unwrap();
    assert_eq!(handled.transaction_id, basket.order_number);
}

#[test]
fn postex_maps_its_status_space() {
    let basket = sample_basket();

    let handled = postex()
        .handle_response(&json!({ "status": "200", "orderRefNum": "PX-1" }), &basket)
        .unwrap();
    assert_eq!(handled.transaction_id, "PX-1");
    assert_eq!(handled.display_label, "PostEx Account");

    let err = postex()
        .handle_response(&json!({ "status": "500" }), &basket)
        .unwrap_err();
    match err {
        PaymentError::Declined(reason) => assert_eq!(reason, "Transaction Fail"),
        other => panic!("expected a decline, got {other:?}"),
    }
}

#[test]
fn cod_success_requires_the_created_status_message() {
    let basket = sample_basket();

    let handled = postex_cod()
        .handle_response(
            &json!({ "payment_intent_response": { "statusMessage": "ORDER HAS BEEN CREATED" } }),
            &basket,
        )
        .unwrap();
    assert_eq!(handled.transaction_id, basket.order_number);
    assert_eq!(handled.display_label, "PostEx COD Account");

    let err = postex_cod()
        .handle_response(
            &json!({ "payment_intent_response": { "statusMessage": "ORDER REJECTED" } }),
            &basket,
        )
        .unwrap_err();
    assert!(matches!(err, PaymentError::Declined(_)));

    let err = postex_cod()
        .handle_response(&json!({ "payment_intent_response": {} }), &basket)
        .unwrap_err();
    assert!(matches!(err, PaymentError::MalformedResponse));
}

#[test]
fn xstack_success_requires_a_captured_intent() {
    let basket = sample_basket();

    let handled = xstack()
        .handle_response(
            &json!({
                "payment_intent_response": {
                    "data": { "_id": "pi_1", "last_payment_response": { "status": "PAYMENT_CAPTURED" } }
                }
            }),
            &basket,
        )
        .unwrap();
    assert_eq!(handled.transaction_id, basket.order_number);
    assert_eq!(handled.display_label, "XStack Account");

    let err = xstack()
        .handle_response(
            &json!({
                "payment_intent_response": {
                    "data": { "_id": "pi_1", "last_payment_response": { "status": "PAYMENT_FAILED" } }
                }
            }),
            &basket,
        )
        .unwrap_err();
    match err {
        PaymentError::Declined(reason) => assert!(reason.contains("pi_1")),
        other => panic!("expected a decline, got {other:?}"),
    }

    // No nested status at all is malformed, not declined.
    let err = xstack()
        .handle_response(&json!({ "payment_intent_response": { "data": {} } }), &basket)
        .unwrap_err();
    assert!(matches!(err, PaymentError::MalformedResponse));
}
