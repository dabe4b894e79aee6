use serde::Serialize;
use thiserror::Error;

/// Failure modes of the payment subsystem. Everything a provider adapter or
/// the postback flow can surface is one of these; internal detail never
/// reaches a provider or a browser.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("missing processor configuration key: {0}")]
    Configuration(String),

    #[error("payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("provider response was missing or malformed")]
    MalformedResponse,

    #[error("payment declined: {0}")]
    Declined(String),

    #[error("caller origin not in the configured allow-list")]
    Forbidden,

    #[error("no basket found for transaction")]
    BasketNotFound,

    #[error("multiple ledger records matched the transaction")]
    AmbiguousTransaction,

    #[error("order creation failed")]
    OrderCreationFailed,
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorPayload,
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

pub fn envelope(code: &str, message: &str) -> ErrorEnvelope {
    ErrorEnvelope {
        error: ErrorPayload {
            code: code.to_string(),
            message: message.to_string(),
        },
    }
}

impl PaymentError {
    /// Business-level payment failures, as opposed to infrastructure errors.
    /// The postback flow catches these and keeps going; anything else aborts
    /// the attempt.
    pub fn is_payment_failure(&self) -> bool {
        matches!(
            self,
            PaymentError::Declined(_) | PaymentError::MalformedResponse
        )
    }
}
