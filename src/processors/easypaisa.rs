use crate::codec::{self, aes, OrderedFields};
use crate::domain::basket::{Basket, CheckoutDetails, HandledPaymentResult};
use crate::domain::error::PaymentError;
use crate::processors::{
    decline_reason, status_field, InitiatedTransaction, PaymentProcessor, TransactionParameters,
};
use crate::repo::processor_config_repo::ProcessorConfiguration;
use chrono::{Duration, Utc};

pub const NAME: &str = "easypaisa";
const SUCCESS_STATUS: &str = "0000";

/// Provider-documented decline codes.
const RESPONSE_STATUSES: &[(&str, &str)] = &[
    ("0001", "System Error"),
    ("0002", "Required Field Missing"),
    ("0005", "Merchant Account Not Active"),
    ("0006", "Invalid Store ID"),
    ("0007", "Store Not Active"),
    ("0008", "Payment Method Not Enabled"),
    ("0010", "Invalid Credentials"),
    ("0013", "Low Balance"),
    ("0014", "Account Does Not Exist"),
];

/// Redirect-based mobile-wallet/card processor. The request travels as an
/// AES-encrypted blob of lexicographically ordered fields inside the redirect
/// query string; the provider calls back on the browser channel.
pub struct EasyPaisa {
    pub public_base_url: String,
}

#[async_trait::async_trait]
impl PaymentProcessor for EasyPaisa {
    fn name(&self) -> &'static str {
        NAME
    }

    fn cancel_url(&self, config: &ProcessorConfiguration) -> Result<String, PaymentError> {
        Ok(format!("{}{}", self.public_base_url, config.get("cancel_checkout_path")?))
    }

    fn error_url(&self, config: &ProcessorConfiguration) -> Result<String, PaymentError> {
        Ok(format!("{}{}", self.public_base_url, config.get("error_path")?))
    }

    async fn build_transaction_parameters(
        &self,
        basket: &Basket,
        _details: &CheckoutDetails,
        config: &ProcessorConfiguration,
    ) -> Result<InitiatedTransaction, PaymentError> {
        let hash_key = config.get("hash_key")?.to_string();
        let store_id = config.get("store_id")?.to_string();
        let payment_method = config.get("payment_method")?.to_string();
        let api_url = config.get("api_url")?.to_string();

        let postback_url = format!("{}/postback/easypaisa", self.public_base_url);
        // Provider time, UTC+5, no zone suffix.
        let timestamp = (Utc::now() + Duration::hours(5))
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string();

        // The provider hashes over the lexicographically sorted field string;
        // any other order invalidates the request.
        let hash_fields = OrderedFields::sorted(vec![
            ("amount", basket.total_minor.to_string()),
            ("orderRefNum", basket.order_number.clone()),
            ("paymentMethod", payment_method.clone()),
            ("postBackURL", postback_url.clone()),
            ("storeId", store_id.clone()),
            ("timeStamp", timestamp.clone()),
        ]);
        let encrypted =
            aes::encrypt(hash_key.as_bytes(), &codec::urlencode_keeping_url_chars(&hash_fields))?;

        let redirect_fields = OrderedFields::sorted(vec![
            ("storeId", store_id.clone()),
            ("orderId", basket.order_number.clone()),
            ("transactionAmount", basket.total_minor.to_string()),
            ("mobileAccountNo", String::new()),
            ("emailAddress", String::new()),
            ("transactionType", payment_method),
            ("tokenExpiry", String::new()),
            ("bankIdentificationNumber", String::new()),
            ("encryptedHashRequest", encrypted),
            ("merchantPaymentMethod", String::new()),
            ("postBackURL", postback_url.clone()),
            ("signature", String::new()),
        ]);

        let audit_payload = serde_json::json!({
            "amount": basket.total_minor,
            "orderRefNum": basket.order_number,
            "postBackURL": postback_url,
            "storeId": store_id,
            "timeStamp": timestamp,
        });

        tracing::info!(
            "created easypaisa payment [{}] for basket [{}]",
            basket.order_number,
            basket.basket_id
        );

        Ok(InitiatedTransaction {
            parameters: TransactionParameters::RedirectUrl {
                payment_page_url: codec::with_query(&api_url, &redirect_fields),
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
            .get("orderRefNumber")
            .and_then(|v| v.as_str())
            .unwrap_or(&basket.order_number)
            .to_string();

        Ok(HandledPaymentResult {
            transaction_id,
            total_minor: basket.total_minor,
            currency: basket.currency.clone(),
            display_label: "EasyPaisa Account".to_string(),
            card_type: None,
        })
    }
}
