use crate::domain::basket::{Basket, CheckoutDetails};
use crate::domain::orders::OrderPlacement;
use crate::processors::{
    self, easypaisa, postex, xstack, PaymentProcessor, TransactionParameters,
};
use crate::service::checkout_service::{internal, payment_error};
use crate::service::postback_service::{Channel, InboundPostback, PostbackOutcome};
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

const FALLBACK_ERROR_PATH: &str = "/checkout/error/";

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn tenant_of(query: &HashMap<String, String>) -> String {
    query
        .get("tenant")
        .cloned()
        .unwrap_or_else(|| "default".to_string())
}

fn inbound(
    headers: &HeaderMap,
    query: &HashMap<String, String>,
    transaction_key: &str,
) -> InboundPostback {
    InboundPostback {
        transaction_id: query.get(transaction_key).cloned(),
        params: serde_json::to_value(query).unwrap_or_default(),
        query: query.clone(),
        remote_addr: header(headers, "x-real-ip"),
        forwarded_for: header(headers, "x-forwarded-for"),
        host: header(headers, "host"),
    }
}

/// Webhook channel: every terminal state except Forbidden is acknowledged
/// with 200 so the provider stops retrying.
fn ack(outcome: PostbackOutcome) -> Response {
    match outcome {
        PostbackOutcome::Forbidden => StatusCode::FORBIDDEN.into_response(),
        _ => StatusCode::OK.into_response(),
    }
}

/// Browser channel: receipt page on success, generic error page otherwise.
fn browser_redirect(outcome: PostbackOutcome, error_url: String) -> Response {
    match outcome {
        PostbackOutcome::Confirmed { receipt_url, .. } => Redirect::to(&receipt_url).into_response(),
        _ => Redirect::to(&error_url).into_response(),
    }
}

async fn run_postback(
    state: &AppState,
    processor_name: &str,
    channel: Channel,
    headers: HeaderMap,
    query: HashMap<String, String>,
    transaction_key: &str,
) -> Response {
    let Some(processor) =
        processors::by_name(processor_name, state.client.clone(), &state.public_base_url)
    else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let config = match state.config_repo.load(&tenant_of(&query), processor_name).await {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("failed to load [{}] configuration: {}", processor_name, err);
            return match channel {
                Channel::Webhook => StatusCode::OK.into_response(),
                Channel::Redirect => Redirect::to(FALLBACK_ERROR_PATH).into_response(),
            };
        }
    };

    let error_url = processor
        .error_url(&config)
        .unwrap_or_else(|_| FALLBACK_ERROR_PATH.to_string());

    match state
        .postbacks
        .handle(processor.as_ref(), &config, channel, inbound(&headers, &query, transaction_key))
        .await
    {
        Ok(outcome) => match channel {
            Channel::Webhook => ack(outcome),
            Channel::Redirect => browser_redirect(outcome, error_url),
        },
        Err(err) => {
            tracing::error!("postback handling failed for [{}]: {}", processor_name, err);
            match channel {
                Channel::Webhook => StatusCode::OK.into_response(),
                Channel::Redirect => Redirect::to(&error_url).into_response(),
            }
        }
    }
}

/// Browser return from the EasyPaisa payment page.
pub async fn easypaisa_postback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    run_postback(&state, easypaisa::NAME, Channel::Redirect, headers, query, "orderRefNumber").await
}

/// Server-to-server notification from PostEx; origin-verified.
pub async fn postex_ipn(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    run_postback(&state, postex::NAME, Channel::Webhook, headers, query, "orderRefNum").await
}

/// Browser return from the PostEx payment page; tolerant of reload retries.
pub async fn postex_redirect(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    run_postback(&state, postex::NAME, Channel::Redirect, headers, query, "orderRefNum").await
}

fn default_tenant() -> String {
    "default".to_string()
}

/// Fetch the caller's basket and freeze it before any provider call. Both the
/// intent-creation and completion paths freeze; totals must not move once a
/// provider has seen them.
pub async fn freeze_owned_basket(
    commerce: &dyn OrderPlacement,
    basket_id: Uuid,
    owner_id: Uuid,
) -> anyhow::Result<Option<Basket>> {
    let Some(basket) = commerce.basket_by_owner(basket_id, owner_id).await? else {
        return Ok(None);
    };
    commerce.freeze(&basket).await?;
    Ok(Some(basket))
}

#[derive(Debug, Deserialize)]
pub struct CodOrderRequest {
    #[serde(default = "default_tenant")]
    pub tenant: String,
    pub basket_id: Uuid,
    pub owner_id: Uuid,
    #[serde(default)]
    pub details: CheckoutDetails,
}

/// Create the COD courier order, then confirm payment and place the order in
/// the same request.
pub async fn postex_cod(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CodOrderRequest>,
) -> Response {
    let cod = postex::PostExCod {
        public_base_url: state.public_base_url.clone(),
        client: state.client.clone(),
    };

    let config = match state.config_repo.load(&req.tenant, postex::COD_NAME).await {
        Ok(config) => config,
        Err(err) => return into_error(internal(err)),
    };

    let basket =
        match freeze_owned_basket(state.commerce.as_ref(), req.basket_id, req.owner_id).await {
            Ok(Some(basket)) => basket,
            Ok(None) => {
                tracing::error!("basket not found for id [{}]", req.basket_id);
                return (
                    StatusCode::BAD_REQUEST,
                    "Unable to find linked basket".to_string(),
                )
                    .into_response();
            }
            Err(err) => return into_error(internal(err)),
        };

    let courier_response = match cod.create_courier_order(&basket, &req.details, &config).await {
        Ok(response) => response,
        Err(err) => return into_error(payment_error(err)),
    };

    let tracking_id = courier_response
        .pointer("/dist/trackingNumber")
        .and_then(|t| t.as_str())
        .map(str::to_string);

    let raw = serde_json::json!({
        "data": req.details,
        "payment_intent_response": courier_response,
        "remote": header(&headers, "x-real-ip"),
        "forwarded": header(&headers, "x-forwarded-for"),
        "host": header(&headers, "host"),
    });

    match state.postbacks.complete_intent(&cod, &basket, &raw, tracking_id).await {
        Ok(PostbackOutcome::Confirmed { receipt_url, .. }) => {
            Json(serde_json::json!({ "receipt_url": receipt_url })).into_response()
        }
        Ok(_) => (
            StatusCode::BAD_REQUEST,
            "COD order could not be completed".to_string(),
        )
            .into_response(),
        Err(err) => into_error(internal(err)),
    }
}

#[derive(Debug, Deserialize)]
pub struct IntentRequest {
    #[serde(default = "default_tenant")]
    pub tenant: String,
    pub basket_id: Uuid,
    pub owner_id: Uuid,
    #[serde(default)]
    pub details: CheckoutDetails,
}

/// Create an XStack payment intent for client-side completion.
pub async fn xstack_intent(
    State(state): State<AppState>,
    Json(req): Json<IntentRequest>,
) -> Response {
    let processor = xstack::XStack {
        public_base_url: state.public_base_url.clone(),
        client: state.client.clone(),
    };

    let config = match state.config_repo.load(&req.tenant, xstack::NAME).await {
        Ok(config) => config,
        Err(err) => return into_error(internal(err)),
    };

    let basket =
        match freeze_owned_basket(state.commerce.as_ref(), req.basket_id, req.owner_id).await {
            Ok(Some(basket)) => basket,
            Ok(None) => {
                return (
                    StatusCode::BAD_REQUEST,
                    "Unable to find linked basket".to_string(),
                )
                    .into_response()
            }
            Err(err) => return into_error(internal(err)),
        };

    let intent = match processor.create_intent(&basket, &req.details, &config).await {
        Ok(intent) => intent,
        Err(err) => return into_error(payment_error(err)),
    };

    if let Err(err) = state
        .ledger
        .record(
            processor.name(),
            &intent.transaction_id,
            Some(basket.basket_id),
            intent.audit_payload.clone(),
        )
        .await
    {
        return into_error(internal(err));
    }

    match intent.parameters {
        TransactionParameters::Intent {
            intent_id,
            client_secret,
            encryption_key,
        } => Json(serde_json::json!({
            "paymentIntentId": intent_id,
            "clientSecret": client_secret,
            "encryptionKey": encryption_key,
        }))
        .into_response(),
        TransactionParameters::RedirectUrl { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IntentCompletionRequest {
    #[serde(default = "default_tenant")]
    pub tenant: String,
    pub basket_id: Uuid,
    pub owner_id: Uuid,
    pub payment_intent_id: String,
}

/// Retrieve the completed intent from XStack, confirm payment and place the
/// order.
pub async fn xstack_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<IntentCompletionRequest>,
) -> Response {
    let processor = xstack::XStack {
        public_base_url: state.public_base_url.clone(),
        client: state.client.clone(),
    };

    let config = match state.config_repo.load(&req.tenant, xstack::NAME).await {
        Ok(config) => config,
        Err(err) => return into_error(internal(err)),
    };

    let basket =
        match freeze_owned_basket(state.commerce.as_ref(), req.basket_id, req.owner_id).await {
            Ok(Some(basket)) => basket,
            Ok(None) => {
                return (
                    StatusCode::BAD_REQUEST,
                    "Unable to find linked basket".to_string(),
                )
                    .into_response()
            }
            Err(err) => return into_error(internal(err)),
        };

    let retrieved = match processor.retrieve_intent(&req.payment_intent_id, &config).await {
        Ok(retrieved) => retrieved,
        Err(err) => return into_error(payment_error(err)),
    };

    let raw = serde_json::json!({
        "payment_intent_response": retrieved,
        "remote": header(&headers, "x-real-ip"),
        "forwarded": header(&headers, "x-forwarded-for"),
        "host": header(&headers, "host"),
    });

    match state.postbacks.complete_intent(&processor, &basket, &raw, None).await {
        Ok(PostbackOutcome::Confirmed { receipt_url, .. }) => {
            Json(serde_json::json!({ "receipt_url": receipt_url })).into_response()
        }
        Ok(_) => (
            StatusCode::BAD_REQUEST,
            "payment could not be completed".to_string(),
        )
            .into_response(),
        Err(err) => into_error(internal(err)),
    }
}

fn into_error(err: (StatusCode, crate::domain::error::ErrorEnvelope)) -> Response {
    (err.0, Json(err.1)).into_response()
}
