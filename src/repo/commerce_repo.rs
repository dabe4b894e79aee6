use crate::domain::basket::{Basket, HandledPaymentResult, PricingStrategy};
use crate::domain::error::PaymentError;
use crate::domain::orders::{Order, OrderPlacement};
use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// sqlx-backed implementation of the commerce-toolkit seam. Order creation is
/// idempotent per order number so duplicate postback deliveries cannot place
/// two orders.
#[derive(Clone)]
pub struct CommerceRepo {
    pub pool: PgPool,
    pub receipt_base_url: String,
}

fn basket_from_row(row: &PgRow) -> Basket {
    Basket {
        basket_id: row.get("basket_id"),
        order_number: row.get("order_number"),
        owner_id: row.get("owner_id"),
        owner_username: row.get("owner_username"),
        owner_email: row.get("owner_email"),
        currency: row.get("currency"),
        total_minor: row.get("total_minor"),
        course_id: row.get("course_id"),
        course_title: row.get("course_title"),
        organization: row.get("organization"),
        frozen: row.get("frozen"),
        strategy: PricingStrategy::Default,
    }
}

const BASKET_COLUMNS: &str = r#"
    basket_id, order_number, owner_id, owner_username, owner_email,
    currency, total_minor, course_id, course_title, organization, frozen
"#;

#[async_trait::async_trait]
impl OrderPlacement for CommerceRepo {
    async fn basket_by_owner(&self, basket_id: Uuid, owner_id: Uuid) -> Result<Option<Basket>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM baskets WHERE basket_id = $1 AND owner_id = $2",
            BASKET_COLUMNS
        ))
        .bind(basket_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| basket_from_row(&r)))
    }

    async fn basket_by_id(&self, basket_id: Uuid) -> Result<Option<Basket>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM baskets WHERE basket_id = $1",
            BASKET_COLUMNS
        ))
        .bind(basket_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| basket_from_row(&r)))
    }

    async fn freeze(&self, basket: &Basket) -> Result<()> {
        sqlx::query("UPDATE baskets SET frozen = TRUE WHERE basket_id = $1")
            .bind(basket.basket_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn confirm_payment(
        &self,
        _raw_response: &serde_json::Value,
        handled: &HandledPaymentResult,
        basket: &Basket,
    ) -> Result<(), PaymentError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|_| PaymentError::OrderCreationFailed)?;

        // Confirmations are append-only; re-confirming an already-confirmed
        // basket re-records the event rather than failing.
        sqlx::query(
            r#"
            INSERT INTO payment_confirmations (basket_id, transaction_id, amount_minor, currency, display_label, card_type)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(basket.basket_id)
        .bind(&handled.transaction_id)
        .bind(handled.total_minor)
        .bind(&handled.currency)
        .bind(&handled.display_label)
        .bind(&handled.card_type)
        .execute(tx.as_mut())
        .await
        .map_err(|_| PaymentError::OrderCreationFailed)?;

        sqlx::query("UPDATE baskets SET frozen = TRUE WHERE basket_id = $1")
            .bind(basket.basket_id)
            .execute(tx.as_mut())
            .await
            .map_err(|_| PaymentError::OrderCreationFailed)?;

        tx.commit()
            .await
            .map_err(|_| PaymentError::OrderCreationFailed)?;

        Ok(())
    }

    async fn create_order(&self, basket: &Basket) -> Result<Order, PaymentError> {
        sqlx::query(
            r#"
            INSERT INTO orders (order_number, basket_id, amount_minor, currency)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (order_number) DO NOTHING
            "#,
        )
        .bind(&basket.order_number)
        .bind(basket.basket_id)
        .bind(basket.total_minor)
        .bind(&basket.currency)
        .execute(&self.pool)
        .await
        .map_err(|_| PaymentError::OrderCreationFailed)?;

        let row = sqlx::query(
            r#"
            SELECT order_number, basket_id, amount_minor, currency, placed_at
            FROM orders
            WHERE order_number = $1
            "#,
        )
        .bind(&basket.order_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(|_| PaymentError::OrderCreationFailed)?
        .ok_or(PaymentError::OrderCreationFailed)?;

        Ok(Order {
            order_number: row.get("order_number"),
            basket_id: row.get("basket_id"),
            amount_minor: row.get("amount_minor"),
            currency: row.get("currency"),
            placed_at: row.get("placed_at"),
        })
    }

    async fn after_order_placed(&self, order: &Order) -> Result<()> {
        tracing::info!("order [{}] placed for basket [{}]", order.order_number, order.basket_id);
        Ok(())
    }

    fn receipt_url(&self, order_number: &str) -> String {
        format!(
            "{}/checkout/receipt/?order_number={}&disable_back_button=1",
            self.receipt_base_url, order_number
        )
    }
}
