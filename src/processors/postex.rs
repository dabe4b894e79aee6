use crate::codec::{self, OrderedFields};
use crate::domain::basket::{Basket, CheckoutDetails, HandledPaymentResult};
use crate::domain::error::PaymentError;
use crate::processors::{
    decline_reason, status_field, InitiatedTransaction, PaymentProcessor, TransactionParameters,
};
use crate::repo::processor_config_repo::ProcessorConfiguration;

pub const NAME: &str = "postex";
pub const COD_NAME: &str = "postex_cod";

const SUCCESS_STATUS: &str = "200";
const COD_CREATED_MESSAGE: &str = "ORDER HAS BEEN CREATED";

const RESPONSE_STATUSES: &[(&str, &str)] = &[("500", "Transaction Fail")];

/// Redirect-based card processor. Unlike the hash-over-sorted-fields
/// providers this one expects its fields in a fixed literal order.
pub struct PostEx {
    pub public_base_url: String,
}

#[async_trait::async_trait]
impl PaymentProcessor for PostEx {
    fn name(&self) -> &'static str {
        NAME
    }

    fn cancel_url(&self, config: &ProcessorConfiguration) -> Result<String, PaymentError> {
        Ok(format!("{}{}", self.public_base_url, config.get("cancel_checkout_path")?))
    }

    fn error_url(&self, config: &ProcessorConfiguration) -> Result<String, PaymentError> {
        Ok(format!("{}{}", self.public_base_url, config.get("error_url")?))
    }

    async fn build_transaction_parameters(
        &self,
        basket: &Basket,
        _details: &CheckoutDetails,
        config: &ProcessorConfiguration,
    ) -> Result<InitiatedTransaction, PaymentError> {
        let merchant_code = config.get("merchant_code")?.to_string();
        let api_url = config.get("url")?.to_string();
        let api_key = config.get("key")?.to_string();

        let mut fields = OrderedFields::new();
        fields.push("customerName", basket.owner_username.clone());
        fields.push("amount", basket.total_minor.to_string());
        fields.push("apiKey", api_key);
        fields.push("orderRefNum", basket.order_number.clone());
        fields.push("merchantCode", merchant_code);
        fields.push("customerPhoneNum", "");
        fields.push("customerAddress", "");

        let audit_payload = serde_json::json!({
            "orderRefNum": basket.order_number,
            "amount": basket.total_minor,
            "customerName": basket.owner_username,
        });

        tracing::info!(
            "created postex payment [{}] for basket [{}]",
            basket.order_number,
            basket.basket_id
        );

        // The configured base URL carries its own query separator.
        Ok(InitiatedTransaction {
            parameters: TransactionParameters::RedirectUrl {
                payment_page_url: format!("{}{}", api_url, codec::urlencode(&fields)),
            },
            transaction_id: basket.order_number.clone(),
            audit_payload,
        })
    }

    fn handle_response(
        &self,
        raw: &serde_json::Value,
        basket: &Basket,
    ) -> Result<HandledPaymentResult, PaymentError> {
        let status = status_field(raw, "status")?;

        if status != SUCCESS_STATUS {
            return Err(PaymentError::Declined(decline_reason(RESPONSE_STATUSES, status)));
        }

        let transaction_id = raw
            .get("orderRefNum")
            .and_then(|v| v.as_str())
            .unwrap_or(&basket.order_number)
            .to_string();

        Ok(HandledPaymentResult {
            transaction_id,
            total_minor: basket.total_minor,
            currency: basket.currency.clone(),
            display_label: "PostEx Account".to_string(),
            card_type: None,
        })
    }
}

/// Cash-on-delivery variant: instead of redirecting the buyer, a courier
/// order is POSTed to the provider synchronously and the payment completes
/// when the courier confirms creation.
pub struct PostExCod {
    pub public_base_url: String,
    pub client: reqwest::Client,
}

impl PostExCod {
    /// Create the courier order. The raw JSON reply feeds `handle_response`
    /// under the `payment_intent_response` key.
    pub async fn create_courier_order(
        &self,
        basket: &Basket,
        details: &CheckoutDetails,
        config: &ProcessorConfiguration,
    ) -> Result<serde_json::Value, PaymentError> {
        let api_url = config.get("create_order_url")?.to_string();
        let api_key = config.get("key")?.to_string();
        let pickup_address_code = config.get("pickup_address_code")?.to_string();
        let delivery_fee: i64 = config
            .get("fixed_delivery_charges")?
            .parse()
            .map_err(|_| PaymentError::Configuration("postex_cod/fixed_delivery_charges".to_string()))?;

        let address = format!(
            "{}, {}, {}, {} - {}",
            details.street_address.as_deref().unwrap_or_default(),
            details.city.as_deref().unwrap_or_default(),
            details.state.as_deref().unwrap_or_default(),
            details.country.as_deref().unwrap_or_default(),
            details.post_code.as_deref().unwrap_or_default(),
        );

        let payload = serde_json::json!({
            "cityName": details.city.as_deref().unwrap_or_default(),
            "customerName": full_name(details, &basket.owner_username),
            "customerPhone": details.phone_number.as_deref().unwrap_or_default(),
            "deliveryAddress": address,
            "invoiceDivision": 0,
            "invoicePayment": basket.total_minor + delivery_fee,
            "items": 1,
            "orderRefNumber": basket.order_number,
            "orderType": "Normal",
            "pickupAddressCode": pickup_address_code,
            "orderDetail": basket.course_line(),
        });

        let response = self
            .client
            .post(&api_url)
            .header("token", api_key)
            .json(&payload)
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
impl PaymentProcessor for PostExCod {
    fn name(&self) -> &'static str {
        COD_NAME
    }

    fn cancel_url(&self, config: &ProcessorConfiguration) -> Result<String, PaymentError> {
        Ok(format!("{}{}", self.public_base_url, config.get("cancel_checkout_path")?))
    }

    fn error_url(&self, config: &ProcessorConfiguration) -> Result<String, PaymentError> {
        Ok(format!("{}{}", self.public_base_url, config.get("error_url")?))
    }

    /// The buyer is not redirected anywhere; the payment page URL points at
    /// our own COD endpoint, which creates the courier order when the buyer
    /// submits their delivery details.
    async fn build_transaction_parameters(
        &self,
        basket: &Basket,
        _details: &CheckoutDetails,
        _config: &ProcessorConfiguration,
    ) -> Result<InitiatedTransaction, PaymentError> {
        tracing::info!(
            "created postex cod payment url [{}] for basket [{}]",
            basket.order_number,
            basket.basket_id
        );

        Ok(InitiatedTransaction {
            parameters: TransactionParameters::RedirectUrl {
                payment_page_url: format!("{}/postback/postex/cod", self.public_base_url),
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
        let status_message = raw
            .get("payment_intent_response")
            .and_then(|r| r.get("statusMessage"))
            .and_then(|s| s.as_str())
            .ok_or(PaymentError::MalformedResponse)?;

        if status_message != COD_CREATED_MESSAGE {
            return Err(PaymentError::Declined(format!(
                "courier order not created for {}",
                basket.order_number
            )));
        }

        Ok(HandledPaymentResult {
            transaction_id: basket.order_number.clone(),
            total_minor: basket.total_minor,
            currency: basket.currency.clone(),
            display_label: "PostEx COD Account".to_string(),
            card_type: None,
        })
    }
}

fn full_name(details: &CheckoutDetails, fallback: &str) -> String {
    match (&details.first_name, &details.last_name) {
        (Some(first), Some(last)) => format!("{} {}", first, last),
        (Some(first), None) => first.clone(),
        _ => fallback.to_string(),
    }
}
