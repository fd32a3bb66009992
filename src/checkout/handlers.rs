//! REST API handlers for checkout and rate-limit lookups.

use super::{models::*, service::submit_order};
use crate::cart::handlers::ensure_cart_id;
use crate::cart::state::SharedState;
use crate::ratelimit::RateLimitDecision;
use crate::router::error::ApiError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

/// Creates routes for checkout operations
pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/carts/:cart_id/checkout", post(checkout))
        .route("/carts/:cart_id/receipt", get(receipt))
        .route("/rate-limit/:phone", get(rate_limit))
}

/// Endpoint: POST /carts/:cart_id/checkout
/// Submits the cart as an order; the cart is emptied only on success.
async fn checkout(
    State(state): State<SharedState>,
    Path(cart_id): Path<String>,
    Json(customer): Json<CustomerDetails>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_cart_id(&cart_id)?;
    let receipt = submit_order(&state, &cart_id, &customer).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Endpoint: GET /carts/:cart_id/receipt
/// Receipt of the last order placed from this cart.
async fn receipt(
    State(state): State<SharedState>,
    Path(cart_id): Path<String>,
) -> Result<Json<Receipt>, ApiError> {
    ensure_cart_id(&cart_id)?;
    state
        .receipt(&cart_id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found("لا يوجد طلب لهذه السلة"))
}

/// Endpoint: GET /rate-limit/:phone
async fn rate_limit(
    State(state): State<SharedState>,
    Path(phone): Path<String>,
) -> Json<RateLimitDecision> {
    Json(state.rate_limiter.check_order_rate_limit(&phone).await)
}
