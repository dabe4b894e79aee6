use crate::domain::basket::{Basket, CheckoutDetails};
use crate::domain::error::{envelope, ErrorEnvelope, PaymentError};
use crate::domain::orders::OrderPlacement;
use crate::processors::{self, InitiatedTransaction, PaymentProcessor};
use crate::repo::ledger_repo::LedgerStore;
use crate::repo::processor_config_repo::{ProcessorConfigRepo, ProcessorConfiguration};
use axum::http::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct InitiateRequest {
    #[serde(default = "default_tenant")]
    pub tenant: String,
    pub basket_id: Uuid,
    pub owner_id: Uuid,
    #[serde(default)]
    pub details: CheckoutDetails,
}

fn default_tenant() -> String {
    "default".to_string()
}

/// Everything a handler needs after an initiate call: the provider adapter
/// for any follow-up work, the built parameters, and the per-request config.
pub struct InitiatedCheckout {
    pub processor: Arc<dyn PaymentProcessor>,
    pub transaction: InitiatedTransaction,
    pub basket: Basket,
    pub config: ProcessorConfiguration,
}

#[derive(Clone)]
pub struct CheckoutService {
    pub config_repo: ProcessorConfigRepo,
    pub ledger: Arc<dyn LedgerStore>,
    pub commerce: Arc<dyn OrderPlacement>,
    pub client: reqwest::Client,
    pub public_base_url: String,
}

impl CheckoutService {
    /// Build the provider payload for a basket and record it before anything
    /// is returned to the caller. Configuration is resolved once here and
    /// threaded through; a missing key fails before any network call.
    pub async fn initiate(
        &self,
        processor_name: &str,
        req: InitiateRequest,
    ) -> Result<InitiatedCheckout, (StatusCode, ErrorEnvelope)> {
        let processor = processors::by_name(processor_name, self.client.clone(), &self.public_base_url)
            .ok_or_else(|| {
                (
                    StatusCode::NOT_FOUND,
                    envelope("UNKNOWN_PROCESSOR", "no such payment processor"),
                )
            })?;

        let config = self
            .config_repo
            .load(&req.tenant, processor_name)
            .await
            .map_err(internal)?;

        let basket = self
            .commerce
            .basket_by_owner(req.basket_id, req.owner_id)
            .await
            .map_err(internal)?
            .ok_or_else(|| {
                (
                    StatusCode::BAD_REQUEST,
                    envelope("BASKET_NOT_FOUND", "unable to find linked basket"),
                )
            })?;

        let transaction = processor
            .build_transaction_parameters(&basket, &req.details, &config)
            .await
            .map_err(payment_error)?;

        self.ledger
            .record(
                processor.name(),
                &transaction.transaction_id,
                Some(basket.basket_id),
                transaction.audit_payload.clone(),
            )
            .await
            .map_err(internal)?;

        Ok(InitiatedCheckout {
            processor,
            transaction,
            basket,
            config,
        })
    }
}

pub fn payment_error(err: PaymentError) -> (StatusCode, ErrorEnvelope) {
    let (status, code) = match &err {
        PaymentError::Configuration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR"),
        PaymentError::GatewayUnavailable(_) => (StatusCode::BAD_GATEWAY, "GATEWAY_UNAVAILABLE"),
        PaymentError::MalformedResponse => (StatusCode::BAD_GATEWAY, "MALFORMED_RESPONSE"),
        PaymentError::Declined(_) => (StatusCode::BAD_REQUEST, "PAYMENT_DECLINED"),
        PaymentError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        PaymentError::BasketNotFound | PaymentError::AmbiguousTransaction => {
            (StatusCode::BAD_REQUEST, "BASKET_NOT_FOUND")
        }
        PaymentError::OrderCreationFailed => (StatusCode::BAD_REQUEST, "ORDER_CREATION_FAILED"),
    };
    (status, envelope(code, &err.to_string()))
}

pub fn internal(err: anyhow::Error) -> (StatusCode, ErrorEnvelope) {
    tracing::error!("internal error: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        envelope("INTERNAL_ERROR", "internal error"),
    )
}
