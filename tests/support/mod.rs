#![allow(dead_code)]

use checkout_payments::domain::basket::{Basket, HandledPaymentResult, PricingStrategy};
use checkout_payments::domain::error::PaymentError;
use checkout_payments::domain::orders::{Order, OrderPlacement};
use checkout_payments::repo::ledger_repo::{LedgerRecord, LedgerStore};
use checkout_payments::repo::processor_config_repo::ProcessorConfiguration;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

pub fn sample_basket() -> Basket {
    Basket {
        basket_id: Uuid::new_v4(),
        order_number: "EDX-100042".to_string(),
        owner_id: Uuid::new_v4(),
        owner_username: "ayesha".to_string(),
        owner_email: "ayesha@example.com".to_string(),
        currency: "PKR".to_string(),
        total_minor: 150_000,
        course_id: Some("course-v1:Org+CS101+2026".to_string()),
        course_title: "Intro to Programming".to_string(),
        organization: None,
        frozen: false,
        strategy: PricingStrategy::Default,
    }
}

pub fn config(processor_name: &str, pairs: &[(&str, &str)]) -> ProcessorConfiguration {
    let values: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ProcessorConfiguration::from_values("default", processor_name, values)
}

/// In-memory ledger; appends only, like the real one.
#[derive(Default)]
pub struct MemoryLedger {
    pub records: Mutex<Vec<LedgerRecord>>,
    next_id: AtomicI64,
}

impl MemoryLedger {
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl LedgerStore for MemoryLedger {
    async fn record(
        &self,
        processor_name: &str,
        transaction_id: &str,
        basket_ref: Option<Uuid>,
        raw_payload: serde_json::Value,
    ) -> anyhow::Result<()> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.records.lock().unwrap().push(LedgerRecord {
            id,
            processor_name: processor_name.to_string(),
            transaction_id: transaction_id.to_string(),
            basket_ref,
            raw_payload,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn find_by_transaction(
        &self,
        processor_name: &str,
        transaction_id: &str,
    ) -> anyhow::Result<Vec<LedgerRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.processor_name == processor_name && r.transaction_id == transaction_id)
            .cloned()
            .collect())
    }
}

/// In-memory stand-in for the commerce collaborator. Order creation is
/// idempotent per order number, matching the contract.
#[derive(Default)]
pub struct MemoryCommerce {
    pub baskets: Mutex<Vec<Basket>>,
    pub frozen: Mutex<Vec<Uuid>>,
    pub confirmations: Mutex<Vec<String>>,
    pub orders: Mutex<Vec<Order>>,
    pub fail_order_creation: AtomicBool,
}

impl MemoryCommerce {
    pub fn with_basket(basket: Basket) -> Self {
        let commerce = Self::default();
        commerce.baskets.lock().unwrap().push(basket);
        commerce
    }

    pub fn order_count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    pub fn confirmation_count(&self) -> usize {
        self.confirmations.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl OrderPlacement for MemoryCommerce {
    async fn basket_by_owner(
        &self,
        basket_id: Uuid,
        owner_id: Uuid,
    ) -> anyhow::Result<Option<Basket>> {
        Ok(self
            .baskets
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.basket_id == basket_id && b.owner_id == owner_id)
            .cloned())
    }

    async fn basket_by_id(&self, basket_id: Uuid) -> anyhow::Result<Option<Basket>> {
        Ok(self
            .baskets
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.basket_id == basket_id)
            .cloned())
    }

    async fn freeze(&self, basket: &Basket) -> anyhow::Result<()> {
        self.frozen.lock().unwrap().push(basket.basket_id);
        Ok(())
    }

    async fn confirm_payment(
        &self,
        _raw_response: &serde_json::Value,
        handled: &HandledPaymentResult,
        _basket: &Basket,
    ) -> Result<(), PaymentError> {
        self.confirmations
            .lock()
            .unwrap()
            .push(handled.transaction_id.clone());
        Ok(())
    }

    async fn create_order(&self, basket: &Basket) -> Result<Order, PaymentError> {
        if self.fail_order_creation.load(Ordering::SeqCst) {
            return Err(PaymentError::OrderCreationFailed);
        }

        let mut orders = self.orders.lock().unwrap();
        if let Some(existing) = orders.iter().find(|o| o.order_number == basket.order_number) {
            return Ok(existing.clone());
        }

        let order = Order {
            order_number: basket.order_number.clone(),
            basket_id: basket.basket_id,
            amount_minor: basket.total_minor,
            currency: basket.currency.clone(),
            placed_at: Utc::now(),
        };
        orders.push(order.clone());
        Ok(order)
    }

    async fn after_order_placed(&self, _order: &Order) -> anyhow::Result<()> {
        Ok(())
    }

    fn receipt_url(&self, order_number: &str) -> String {
        format!("https://shop.example/checkout/receipt/?order_number={}", order_number)
    }
}
