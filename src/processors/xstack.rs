use crate::codec::signature::sign_payload;
use crate::domain::basket::{Basket, CheckoutDetails, HandledPaymentResult};
use crate::domain::error::PaymentError;
use crate::processors::{InitiatedTransaction, PaymentProcessor, TransactionParameters};
use crate::repo::processor_config_repo::ProcessorConfiguration;
use serde::Serialize;

pub const NAME: &str = "xstack";
const CAPTURED_STATUS: &str = "PAYMENT_CAPTURED";
const OK_STATUS: &str = "OK";

/// Intent-based card processor. The intent-creation body is signed with
/// HMAC-SHA256 over its canonical JSON; the digest travels in the
/// `x-signature` header, never inside the body.
pub struct XStack {
    pub public_base_url: String,
    pub client: reqwest::Client,
}

// Field order here is the signed byte order; do not reorder.
#[derive(Debug, Serialize)]
struct IntentCustomer {
    email: String,
    name: String,
    phone: String,
}

#[derive(Debug, Serialize)]
struct IntentShipping {
    address1: String,
    city: String,
    country: String,
    province: String,
    zip: String,
}

#[derive(Debug, Serialize)]
struct IntentMetadata {
    order_reference: String,
}

#[derive(Debug, Serialize)]
struct IntentRequest {
    amount: i64,
    currency: String,
    payment_method_types: String,
    customer: IntentCustomer,
    shipping: IntentShipping,
    metadata: IntentMetadata,
}

impl XStack {
    /// Create the provider-side payment intent. The signed body is sent
    /// byte-for-byte as serialized; re-serializing it would not be guaranteed
    /// to reproduce the signed bytes.
    pub async fn create_intent(
        &self,
        basket: &Basket,
        details: &CheckoutDetails,
        config: &ProcessorConfiguration,
    ) -> Result<InitiatedTransaction, PaymentError> {
        let create_url = config.get("payment_intent_create_url")?.to_string();
        let secret_key = config.get("secret_key")?.to_string();
        let hmac_secret = config.get("hmac_secret")?.to_string();
        let account_id = config.get("account_id")?.to_string();

        let request = IntentRequest {
            amount: basket.total_minor,
            currency: basket.currency.clone(),
            payment_method_types: "card".to_string(),
            customer: IntentCustomer {
                email: details.email.clone().unwrap_or_else(|| basket.owner_email.clone()),
                name: format!(
                    "{} {}",
                    details.first_name.as_deref().unwrap_or_default(),
                    details.last_name.as_deref().unwrap_or_default(),
                ),
                phone: details.phone_number.clone().unwrap_or_default(),
            },
            shipping: IntentShipping {
                address1: format!(
                    "{}, {}",
                    details.street_address.as_deref().unwrap_or_default(),
                    details.address_line2.as_deref().unwrap_or_default(),
                ),
                city: details.city.clone().unwrap_or_default(),
                country: details.country.clone().unwrap_or_default(),
                province: details.state.clone().unwrap_or_default(),
                zip: details.post_code.clone().unwrap_or_default(),
            },
            metadata: IntentMetadata {
                order_reference: format!("{}-{}", basket.owner_id, basket.order_number),
            },
        };

        let (body, digest) = sign_payload(hmac_secret.as_bytes(), &request)?;

        let response = self
            .client
            .post(&create_url)
            .header("x-api-key", secret_key)
            .header("Content-Type", "application/json")
            .header("x-signature", digest)
            .header("x-account-id", account_id)
            .body(body)
            .send()
            .await
            .map_err(|e| PaymentError::GatewayUnavailable(e.to_string()))?;

        let reply: serde_json::Value = response
            .json()
            .await
            .map_err(|_| PaymentError::MalformedResponse)?;

        let response_status = reply
            .get("responseStatus")
            .and_then(|s| s.as_str())
            .ok_or(PaymentError::MalformedResponse)?;

        if response_status != OK_STATUS {
            let message = reply
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("payment intent creation failed");
            return Err(PaymentError::Declined(message.to_string()));
        }

        let data = reply.get("data").ok_or(PaymentError::MalformedResponse)?;
        let intent_id = data
            .get("_id")
            .and_then(|v| v.as_str())
            .ok_or(PaymentError::MalformedResponse)?
            .to_string();

        tracing::info!(
            "created xstack payment intent [{}] for basket [{}]",
            intent_id,
            basket.basket_id
        );

        Ok(InitiatedTransaction {
            parameters: TransactionParameters::Intent {
                intent_id,
                client_secret: data
                    .get("pi_client_secret")
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
                encryption_key: data
                    .get("encryptionKey")
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
            },
            transaction_id: basket.order_number.clone(),
            audit_payload: serde_json::json!({ "payment_intent_response": reply }),
        })
    }

    /// Fetch the provider-side intent for completion; the reply feeds
    /// `handle_response` under the `payment_intent_response` key.
    pub async fn retrieve_intent(
        &self,
        intent_id: &str,
        config: &ProcessorConfiguration,
    ) -> Result<serde_json::Value, PaymentError> {
        let retrieve_url = config.get("payment_intent_retrieve_url")?.to_string();
        let secret_key = config.get("secret_key")?.to_string();
        let account_id = config.get("account_id")?.to_string();

        let response = self
            .client
            .get(format!("{}{}", retrieve_url, intent_id))
            .header("x-api-key", secret_key)
            .header("x-account-id", account_id)
            .send()
            .await
            .map_err(|e| PaymentError::GatewayUnavailable(e.to_string()))?;

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|_| PaymentError::MalformedResponse)
    }
}

#[async_trait::async_trait]
impl PaymentProcessor for XStack {
    fn name(&self) -> &'static str {
        NAME
    }

    fn cancel_url(&self, config: &ProcessorConfiguration) -> Result<String, PaymentError> {
        Ok(format!("{}{}", self.public_base_url, config.get("cancel_checkout_path")?))
    }

    fn error_url(&self, config: &ProcessorConfiguration) -> Result<String, PaymentError> {
        Ok(format!("{}{}", self.public_base_url, config.get("error_path")?))
    }

    /// The payment page URL points at our own intent endpoint; the provider
    /// call happens when the buyer submits their card details there.
    async fn build_transaction_parameters(
        &self,
        basket: &Basket,
        _details: &CheckoutDetails,
        _config: &ProcessorConfiguration,
    ) -> Result<InitiatedTransaction, PaymentError> {
        tracing::info!(
            "created xstack payment url [{}] for basket [{}]",
            basket.order_number,
            basket.basket_id
        );

        Ok(InitiatedTransaction {
            parameters: TransactionParameters::RedirectUrl {
                payment_page_url: format!("{}/postback/xstack", self.public_base_url),
            },
            transaction_id: basket.order_number.clone(),
            audit_payload: serde_json::json!({ "orderRefNum": basket.order_number }),
        })
    }

    fn handle_response(
        &self,
        raw: &serde_json::Value,
        basket: &Basket,
    ) -> Result<HandledPaymentResult, PaymentError> {
        let intent = raw
            .get("payment_intent_response")
            .ok_or(PaymentError::MalformedResponse)?;

        let status = intent
            .pointer("/data/last_payment_response/status")
            .and_then(|s| s.as_str())
            .ok_or(PaymentError::MalformedResponse)?;

        if status != CAPTURED_STATUS {
            let payment_id = intent
                .pointer("/data/_id")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");
            return Err(PaymentError::Declined(format!(
                "payment not captured for intent {}",
                payment_id
            )));
        }

        Ok(HandledPaymentResult {
            transaction_id: basket.order_number.clone(),
            total_minor: basket.total_minor,
            currency: basket.currency.clone(),
            display_label: "XStack Account".to_string(),
            card_type: None,
        })
    }
}
