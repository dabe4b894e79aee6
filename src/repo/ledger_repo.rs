use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub id: i64,
    pub processor_name: String,
    pub transaction_id: String,
    pub basket_ref: Option<Uuid>,
    pub raw_payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Append-only audit trail of raw provider payloads. Recording is a pure
/// append: it never deduplicates, never rejects a repeated transaction_id and
/// never mutates an existing row. Duplicate interpretation belongs to the
/// basket resolver.
#[async_trait::async_trait]
pub trait LedgerStore: Send + Sync {
    async fn record(
        &self,
        processor_name: &str,
        transaction_id: &str,
        basket_ref: Option<Uuid>,
        raw_payload: serde_json::Value,
    ) -> Result<()>;

    /// Matching records in creation order (earliest first).
    async fn find_by_transaction(
        &self,
        processor_name: &str,
        transaction_id: &str,
    ) -> Result<Vec<LedgerRecord>>;
}

#[derive(Clone)]
pub struct LedgerRepo {
    pub pool: PgPool,
}

#[async_trait::async_trait]
impl LedgerStore for LedgerRepo {
    async fn record(
        &self,
        processor_name: &str,
        transaction_id: &str,
        basket_ref: Option<Uuid>,
        raw_payload: serde_json::Value,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO processor_responses (processor_name, transaction_id, basket_ref, raw_payload)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(processor_name)
        .bind(transaction_id)
        .bind(basket_ref)
        .bind(raw_payload)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_transaction(
        &self,
        processor_name: &str,
        transaction_id: &str,
    ) -> Result<Vec<LedgerRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, processor_name, transaction_id, basket_ref, raw_payload, created_at
            FROM processor_responses
            WHERE processor_name = $1 AND transaction_id = $2
            ORDER BY id ASC
            "#,
        )
        .bind(processor_name)
        .bind(transaction_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| LedgerRecord {
                id: r.get("id"),
                processor_name: r.get("processor_name"),
                transaction_id: r.get("transaction_id"),
                basket_ref: r.get("basket_ref"),
                raw_payload: r.get("raw_payload"),
                created_at: r.get("created_at"),
            })
            .collect())
    }
}
