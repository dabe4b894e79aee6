use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pricing context a basket is rehydrated with after resolution. The
/// commerce collaborator owns pricing; resolved baskets always carry the
/// default strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PricingStrategy {
    Default,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Basket {
    pub basket_id: Uuid,
    pub order_number: String,
    pub owner_id: Uuid,
    pub owner_username: String,
    pub owner_email: String,
    pub currency: String,
    pub total_minor: i64,
    pub course_id: Option<String>,
    pub course_title: String,
    pub organization: Option<String>,
    pub frozen: bool,
    pub strategy: PricingStrategy,
}

impl Basket {
    /// `course_id|title` label used in provider order descriptions.
    pub fn course_line(&self) -> String {
        match &self.course_id {
            Some(id) => format!("{}|{}", id, self.course_title),
            None => self.course_title.clone(),
        }
    }
}

/// Buyer contact and shipping details collected at checkout. Redirect
/// providers ignore these; intent-shaped providers (card intents, COD courier
/// orders) require a subset of them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutDetails {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub street_address: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub post_code: Option<String>,
}

/// Normalized result of a successfully handled provider response. Only
/// produced after the provider-reported status is explicitly recognized as
/// success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandledPaymentResult {
    pub transaction_id: String,
    pub total_minor: i64,
    pub currency: String,
    pub display_label: String,
    pub card_type: Option<String>,
}
