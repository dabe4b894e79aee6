mod support;

use checkout_payments::repo::ledger_repo::LedgerStore;
use checkout_payments::resolver::{BasketResolver, DuplicatePolicy, Resolution};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use support::{sample_basket, MemoryCommerce, MemoryLedger};

fn resolver(ledger: Arc<MemoryLedger>, commerce: Arc<MemoryCommerce>) -> BasketResolver {
    BasketResolver { ledger, commerce }
}

#[tokio::test]
async fn an_unknown_transaction_resolves_to_nothing() {
    let ledger = Arc::new(MemoryLedger::default());
    let commerce = Arc::new(MemoryCommerce::with_basket(sample_basket()));

    let resolution = resolver(ledger, commerce)
        .resolve("postex", "PX-UNKNOWN", DuplicatePolicy::Strict, &HashMap::new())
        .await
        .unwrap();

    assert!(matches!(resolution, Resolution::NotFound));
}

#[tokio::test]
async fn records_without_a_basket_link_are_ignored() {
    let basket = sample_basket();
    let ledger = Arc::new(MemoryLedger::default());
    let commerce = Arc::new(MemoryCommerce::with_basket(basket.clone()));

    // Audit-only record, written before resolution on the postback side.
    ledger
        .record("postex", &basket.order_number, None, json!({"response": {}}))
        .await
        .unwrap();

    let resolution = resolver(ledger, commerce)
        .resolve("postex", &basket.order_number, DuplicatePolicy::Lenient, &HashMap::new())
        .await
        .unwrap();

    assert!(matches!(resolution, Resolution::NotFound));
}

#[tokio::test]
async fn a_single_linked_record_resolves_and_annotates_attribution() {
    let basket = sample_basket();
    let ledger = Arc::new(MemoryLedger::default());
    let commerce = Arc::new(MemoryCommerce::with_basket(basket.clone()));

    ledger
        .record("easypaisa", &basket.order_number, Some(basket.basket_id), json!({}))
        .await
        .unwrap();

    let mut query = HashMap::new();
    query.insert("organization".to_string(), "acme-corp".to_string());

    let resolution = resolver(ledger, commerce)
        .resolve("easypaisa", &basket.order_number, DuplicatePolicy::Strict, &query)
        .await
        .unwrap();

    match resolution {
        Resolution::Resolved(resolved) => {
            assert_eq!(resolved.basket_id, basket.basket_id);
            assert_eq!(resolved.organization.as_deref(), Some("acme-corp"));
        }
        other => panic!("expected a resolved basket, got {other:?}"),
    }
}

#[tokio::test]
async fn duplicates_are_ambiguous_under_the_strict_policy() {
    let basket = sample_basket();
    let ledger = Arc::new(MemoryLedger::default());
    let commerce = Arc::new(MemoryCommerce::with_basket(basket.clone()));

    for _ in 0..2 {
        ledger
            .record("postex", &basket.order_number, Some(basket.basket_id), json!({}))
            .await
            .unwrap();
    }

    let resolution = resolver(ledger, commerce)
        .resolve("postex", &basket.order_number, DuplicatePolicy::Strict, &HashMap::new())
        .await
        .unwrap();

    assert!(matches!(resolution, Resolution::Ambiguous));
}

#[tokio::test]
async fn the_earliest_record_wins_under_the_lenient_policy() {
    let first = sample_basket();
    let mut second = sample_basket();
    second.order_number = first.order_number.clone();

    let ledger = Arc::new(MemoryLedger::default());
    let commerce = Arc::new(MemoryCommerce::with_basket(first.clone()));
    commerce.baskets.lock().unwrap().push(second.clone());

    ledger
        .record("easypaisa", &first.order_number, Some(first.basket_id), json!({}))
        .await
        .unwrap();
    ledger
        .record("easypaisa", &first.order_number, Some(second.basket_id), json!({}))
        .await
        .unwrap();

    let resolution = resolver(ledger, commerce)
        .resolve("easypaisa", &first.order_number, DuplicatePolicy::Lenient, &HashMap::new())
        .await
        .unwrap();

    match resolution {
        Resolution::Resolved(resolved) => assert_eq!(resolved.basket_id, first.basket_id),
        other => panic!("expected a resolved basket, got {other:?}"),
    }
}
