use crate::domain::basket::{Basket, PricingStrategy};
use crate::domain::orders::OrderPlacement;
use crate::repo::ledger_repo::LedgerStore;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// How duplicate ledger matches for one transaction_id are treated.
///
/// Webhook (server-to-server) callers are strict: a duplicate is a potential
/// replay and resolves to nothing. Browser-redirect callers are lenient:
/// page reloads legitimately re-deliver the same transaction, so the
/// earliest-created record wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    Strict,
    Lenient,
}

#[derive(Debug)]
pub enum Resolution {
    Resolved(Basket),
    NotFound,
    Ambiguous,
}

#[derive(Clone)]
pub struct BasketResolver {
    pub ledger: Arc<dyn LedgerStore>,
    pub commerce: Arc<dyn OrderPlacement>,
}

impl BasketResolver {
    /// Map an inbound transaction identifier to its basket. The returned
    /// basket is rehydrated with the default pricing strategy and annotated
    /// with organization attribution from the request's query parameters.
    pub async fn resolve(
        &self,
        processor_name: &str,
        transaction_id: &str,
        policy: DuplicatePolicy,
        query: &HashMap<String, String>,
    ) -> Result<Resolution> {
        let records = self
            .ledger
            .find_by_transaction(processor_name, transaction_id)
            .await?;

        let mut linked = records.iter().filter(|r| r.basket_ref.is_some());

        let first = match linked.next() {
            Some(record) => record,
            None => {
                tracing::warn!(
                    "no basket linked to [{}] transaction [{}]",
                    processor_name,
                    transaction_id
                );
                return Ok(Resolution::NotFound);
            }
        };

        if linked.next().is_some() {
            tracing::warn!(
                "duplicate transaction id [{}] received from [{}]",
                transaction_id,
                processor_name
            );
            match policy {
                DuplicatePolicy::Strict => return Ok(Resolution::Ambiguous),
                // Records are in creation order; the earliest one is the
                // authoritative interaction.
                DuplicatePolicy::Lenient => {}
            }
        }

        let Some(basket_ref) = first.basket_ref else {
            return Ok(Resolution::NotFound);
        };
        let basket = match self.commerce.basket_by_id(basket_ref).await? {
            Some(basket) => basket,
            None => return Ok(Resolution::NotFound),
        };

        let mut basket = basket;
        basket.strategy = PricingStrategy::Default;
        if let Some(organization) = query.get("organization") {
            basket.organization = Some(organization.clone());
        }

        Ok(Resolution::Resolved(basket))
    }
}
