use crate::domain::basket::{Basket, CheckoutDetails, HandledPaymentResult};
use crate::domain::error::PaymentError;
use crate::repo::processor_config_repo::ProcessorConfiguration;
use serde::Serialize;
use std::sync::Arc;

pub mod easypaisa;
pub mod postex;
pub mod xstack;

/// What the caller gets back from initiating a payment: either a URL to
/// navigate the buyer to, or a provider-side intent to complete client-side.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransactionParameters {
    RedirectUrl {
        payment_page_url: String,
    },
    Intent {
        intent_id: String,
        client_secret: Option<String>,
        encryption_key: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct InitiatedTransaction {
    pub parameters: TransactionParameters,
    /// Identifier the provider will echo back in its postback; ledger records
    /// for this interaction are keyed by it.
    pub transaction_id: String,
    /// Raw outbound payload, written to the ledger before the parameters are
    /// returned to the caller.
    pub audit_payload: serde_json::Value,
}

/// One adapter per gateway. Providers differ in payload encoding, interaction
/// shape and status-code space; everything else about the checkout flow is
/// shared and lives outside this trait.
#[async_trait::async_trait]
pub trait PaymentProcessor: Send + Sync {
    fn name(&self) -> &'static str;

    fn cancel_url(&self, config: &ProcessorConfiguration) -> Result<String, PaymentError>;

    fn error_url(&self, config: &ProcessorConfiguration) -> Result<String, PaymentError>;

    async fn build_transaction_parameters(
        &self,
        basket: &Basket,
        details: &CheckoutDetails,
        config: &ProcessorConfiguration,
    ) -> Result<InitiatedTransaction, PaymentError>;

    /// Map the provider's raw response to a normalized result. Absence of the
    /// expected status field, or an unrecognized code, is always a failure.
    fn handle_response(
        &self,
        raw: &serde_json::Value,
        basket: &Basket,
    ) -> Result<HandledPaymentResult, PaymentError>;

    async fn issue_credit(
        &self,
        order_number: &str,
        _reference_number: &str,
        _amount_minor: i64,
        _currency: &str,
        _config: &ProcessorConfiguration,
    ) -> Result<(), PaymentError> {
        // TODO: wire refunds through the providers once a refund policy exists
        tracing::warn!("refunds not supported for [{}], order [{}]", self.name(), order_number);
        Ok(())
    }
}

pub fn by_name(
    name: &str,
    client: reqwest::Client,
    public_base_url: &str,
) -> Option<Arc<dyn PaymentProcessor>> {
    match name {
        easypaisa::NAME => Some(Arc::new(easypaisa::EasyPaisa {
            public_base_url: public_base_url.to_string(),
        })),
        postex::NAME => Some(Arc::new(postex::PostEx {
            public_base_url: public_base_url.to_string(),
        })),
        postex::COD_NAME => Some(Arc::new(postex::PostExCod {
            public_base_url: public_base_url.to_string(),
            client,
        })),
        xstack::NAME => Some(Arc::new(xstack::XStack {
            public_base_url: public_base_url.to_string(),
            client,
        })),
        _ => None,
    }
}

/// Pull a string status out of the raw response; a missing field is a
/// malformed response, never an assumed success.
pub(crate) fn status_field<'a>(
    raw: &'a serde_json::Value,
    field: &str,
) -> Result<&'a str, PaymentError> {
    raw.get(field)
        .and_then(|v| v.as_str())
        .ok_or(PaymentError::MalformedResponse)
}

pub(crate) fn decline_reason(table: &[(&str, &str)], code: &str) -> String {
    table
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, reason)| (*reason).to_string())
        .unwrap_or_else(|| "Status Code not found in expected responses".to_string())
}
