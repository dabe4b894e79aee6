use crate::domain::basket::Basket;
use crate::domain::orders::OrderPlacement;
use crate::processors::PaymentProcessor;
use crate::repo::ledger_repo::LedgerStore;
use crate::repo::processor_config_repo::ProcessorConfiguration;
use crate::resolver::{BasketResolver, DuplicatePolicy, Resolution};
use crate::service::notifications::{
    NotificationDispatcher, PAYMENT_SUCCESSFUL_EVENT, PAYMENT_UNSUCCESSFUL_EVENT,
};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;

/// Which path a provider callback arrived on. Server-to-server webhooks are
/// origin-verified and strict about duplicate transactions; browser redirects
/// skip origin checks and tolerate reload-induced duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Webhook,
    Redirect,
}

impl Channel {
    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        match self {
            Channel::Webhook => DuplicatePolicy::Strict,
            Channel::Redirect => DuplicatePolicy::Lenient,
        }
    }

    fn audit_label(&self) -> &'static str {
        match self {
            Channel::Webhook => "IPN",
            Channel::Redirect => "Redirection",
        }
    }
}

/// Terminal state of one callback invocation. Every state except `Forbidden`
/// is acknowledged with 200 to webhook callers so the provider stops
/// retrying; browser callers are redirected instead.
#[derive(Debug)]
pub enum PostbackOutcome {
    Confirmed {
        order_number: String,
        receipt_url: String,
    },
    Forbidden,
    BasketNotFound,
    PaymentDeclined,
    OrderCreationFailed,
}

#[derive(Debug, Clone, Default)]
pub struct InboundPostback {
    pub transaction_id: Option<String>,
    pub params: serde_json::Value,
    pub query: HashMap<String, String>,
    pub remote_addr: Option<String>,
    pub forwarded_for: Option<String>,
    pub host: Option<String>,
}

#[derive(Clone)]
pub struct PostbackService {
    pub ledger: Arc<dyn LedgerStore>,
    pub commerce: Arc<dyn OrderPlacement>,
    pub resolver: BasketResolver,
    pub notifications: NotificationDispatcher,
}

impl PostbackService {
    /// Drive one provider callback through verification, resolution, payment
    /// confirmation and order placement. Audit-first: the raw inbound payload
    /// is ledgered before anything can mutate a basket.
    pub async fn handle(
        &self,
        processor: &dyn PaymentProcessor,
        config: &ProcessorConfiguration,
        channel: Channel,
        inbound: InboundPostback,
    ) -> Result<PostbackOutcome> {
        let transaction_id = inbound.transaction_id.clone().unwrap_or_default();

        self.ledger
            .record(
                processor.name(),
                &format!("{} {} for {}", processor.name(), channel.audit_label(), transaction_id),
                None,
                serde_json::json!({
                    "response": inbound.params,
                    "remote": inbound.remote_addr,
                    "forwarded": inbound.forwarded_for,
                    "host": inbound.host,
                }),
            )
            .await?;

        if channel == Channel::Webhook && !self.verified_origin(config, &inbound) {
            tracing::warn!(
                "rejected [{}] callback from unverified origin [{:?}]",
                processor.name(),
                inbound.forwarded_for
            );
            return Ok(PostbackOutcome::Forbidden);
        }

        let basket = match self
            .resolver
            .resolve(
                processor.name(),
                &transaction_id,
                channel.duplicate_policy(),
                &inbound.query,
            )
            .await?
        {
            Resolution::Resolved(basket) => basket,
            Resolution::NotFound | Resolution::Ambiguous => {
                tracing::error!(
                    "basket not found for [{}] transaction [{}]",
                    processor.name(),
                    transaction_id
                );
                return Ok(PostbackOutcome::BasketNotFound);
            }
        };

        self.settle(processor, &inbound.params, &basket, None).await
    }

    /// Completion path for intent-shaped providers: the basket is already
    /// known, so origin verification and resolution are skipped and the flow
    /// picks up at the audit write.
    pub async fn complete_intent(
        &self,
        processor: &dyn PaymentProcessor,
        basket: &Basket,
        raw: &serde_json::Value,
        tracking_id: Option<String>,
    ) -> Result<PostbackOutcome> {
        self.ledger
            .record(
                processor.name(),
                &format!("{} completion for {}", processor.name(), basket.order_number),
                Some(basket.basket_id),
                raw.clone(),
            )
            .await?;

        self.settle(processor, raw, basket, tracking_id).await
    }

    fn verified_origin(&self, config: &ProcessorConfiguration, inbound: &InboundPostback) -> bool {
        let allowed = config.allowed_hosts();
        inbound
            .forwarded_for
            .as_deref()
            .map(|caller| allowed.iter().any(|host| host == caller))
            .unwrap_or(false)
    }

    /// Steps 4-6: confirm payment, create the order, fire side effects.
    async fn settle(
        &self,
        processor: &dyn PaymentProcessor,
        raw: &serde_json::Value,
        basket: &Basket,
        tracking_id: Option<String>,
    ) -> Result<PostbackOutcome> {
        let handled = match processor.handle_response(raw, basket) {
            Ok(handled) => handled,
            Err(err) => {
                self.ledger
                    .record(
                        processor.name(),
                        &basket.order_number,
                        Some(basket.basket_id),
                        serde_json::json!({ "error_msg": err.to_string() }),
                    )
                    .await?;
                if err.is_payment_failure() {
                    tracing::info!(
                        "payment unsuccessful for basket [{}]: {}",
                        basket.basket_id,
                        err
                    );
                } else {
                    tracing::error!(
                        "failed to handle [{}] response for basket [{}]: {}",
                        processor.name(),
                        basket.basket_id,
                        err
                    );
                }
                self.notify_unsuccessful(basket);
                return Ok(PostbackOutcome::PaymentDeclined);
            }
        };

        self.ledger
            .record(
                processor.name(),
                &handled.transaction_id,
                Some(basket.basket_id),
                raw.clone(),
            )
            .await?;

        if let Err(err) = self.commerce.confirm_payment(raw, &handled, basket).await {
            tracing::error!(
                "payment confirmation failed for basket [{}]: {}",
                basket.basket_id,
                err
            );
            self.notify_unsuccessful(basket);
            return Ok(PostbackOutcome::PaymentDeclined);
        }

        let order = match self.commerce.create_order(basket).await {
            Ok(order) => order,
            Err(err) => {
                tracing::warn!(
                    "order creation failed for basket [{}]: {}",
                    basket.basket_id,
                    err
                );
                self.notify_unsuccessful(basket);
                return Ok(PostbackOutcome::OrderCreationFailed);
            }
        };

        // Confirmation is not re-attempted past this point; side-effect
        // failures are logged and swallowed.
        if let Err(err) = self.commerce.after_order_placed(&order).await {
            tracing::error!(
                "post-order handling failed for order [{}]: {}",
                order.order_number,
                err
            );
        }

        match tracking_id {
            Some(tracking) => self.notifications.spawn_cod_order_mail(
                basket.owner_username.clone(),
                basket.course_id.clone(),
                tracking,
            ),
            None => self
                .notifications
                .spawn_enrollment_mail(basket.owner_username.clone(), basket.course_id.clone()),
        }
        self.notifications.spawn_campaign_event(
            PAYMENT_SUCCESSFUL_EVENT,
            basket.owner_email.clone(),
            basket.course_id.clone(),
        );

        Ok(PostbackOutcome::Confirmed {
            order_number: order.order_number,
            receipt_url: self.commerce.receipt_url(&basket.order_number),
        })
    }

    fn notify_unsuccessful(&self, basket: &Basket) {
        self.notifications.spawn_campaign_event(
            PAYMENT_UNSUCCESSFUL_EVENT,
            basket.owner_email.clone(),
            basket.course_id.clone(),
        );
    }
}
