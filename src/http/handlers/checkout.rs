use crate::service::checkout_service::InitiateRequest;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Start a checkout against the named processor. The response body is the
/// transaction parameters the client needs to continue: a payment page URL
/// for redirect-shaped providers, or intent credentials for intent-shaped
/// ones. A cancel link is included when the processor configures one.
pub async fn initiate(
    State(state): State<AppState>,
    Path(processor_name): Path<String>,
    Json(req): Json<InitiateRequest>,
) -> Response {
    match state.checkout.initiate(&processor_name, req).await {
        Ok(initiated) => {
            let mut body = match serde_json::to_value(&initiated.transaction.parameters) {
                Ok(body) => body,
                Err(err) => {
                    tracing::error!("failed to serialize transaction parameters: {}", err);
                    return StatusCode::INTERNAL_SERVER_ERROR.into_response();
                }
            };
            if let Ok(cancel_url) = initiated.processor.cancel_url(&initiated.config) {
                body["cancel_url"] = serde_json::Value::String(cancel_url);
            }
            (StatusCode::OK, Json(body)).into_response()
        }
        Err((status, body)) => (status, Json(body)).into_response(),
    }
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"status": "ok"})))
}
