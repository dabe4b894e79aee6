use crate::domain::basket::{Basket, HandledPaymentResult};
use crate::domain::error::PaymentError;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub order_number: String,
    pub basket_id: Uuid,
    pub amount_minor: i64,
    pub currency: String,
    pub placed_at: DateTime<Utc>,
}

/// Contract this subsystem needs from the commerce toolkit. Basket and order
/// persistence live on the other side of this seam; the postback flow only
/// drives it.
///
/// `create_order` must be idempotent per order number: re-running it for an
/// already-placed order returns the existing order instead of creating a
/// duplicate. `confirm_payment` must likewise tolerate re-entry for the same
/// basket.
#[async_trait::async_trait]
pub trait OrderPlacement: Send + Sync {
    async fn basket_by_owner(&self, basket_id: Uuid, owner_id: Uuid) -> Result<Option<Basket>>;

    async fn basket_by_id(&self, basket_id: Uuid) -> Result<Option<Basket>>;

    async fn freeze(&self, basket: &Basket) -> Result<()>;

    async fn confirm_payment(
        &self,
        raw_response: &serde_json::Value,
        handled: &HandledPaymentResult,
        basket: &Basket,
    ) -> Result<(), PaymentError>;

    async fn create_order(&self, basket: &Basket) -> Result<Order, PaymentError>;

    async fn after_order_placed(&self, order: &Order) -> Result<()>;

    fn receipt_url(&self, order_number: &str) -> String;
}
