//! REST API handlers for shopping cart operations
//!
//! This module implements HTTP endpoints for cart lifecycle, regular items
//! and bundle lines.

use super::{aggregate::Cart, helpers::*, models::*, state::SharedState};
use crate::bundle::{BundleSelection, ToggleOutcome};
use crate::catalog::{fetch_bundle_offer, fetch_product};
use crate::router::error::ApiError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};

/// Creates routes for cart-related operations
pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/carts", post(create_cart))
        .route("/carts/:cart_id", get(get_cart).delete(clear_cart))
        .route("/carts/:cart_id/items", post(add_item))
        .route(
            "/carts/:cart_id/items/:line_id",
            patch(update_quantity).delete(remove_item),
        )
        .route("/carts/:cart_id/bundles", post(add_bundle))
}

/// Rejects cart ids that cannot be used as storage keys.
pub(crate) fn ensure_cart_id(cart_id: &str) -> Result<(), ApiError> {
    if is_valid_cart_id(cart_id) {
        Ok(())
    } else {
        Err(ApiError::bad_request("معرف السلة غير صالح"))
    }
}

fn view(state: &SharedState, cart_id: &str) -> CartView {
    state.with_cart(cart_id, |cart| CartView::new(cart_id, cart))
}

/// Endpoint: POST /carts
/// Hands out a cart id, or adopts the one the client sent.
async fn create_cart(
    State(state): State<SharedState>,
    payload: Option<Json<CreateCartInput>>,
) -> Result<impl IntoResponse, ApiError> {
    let requested = payload.and_then(|Json(input)| input.cart_id);
    let cart_id = get_or_create_cart_id(requested);
    ensure_cart_id(&cart_id)?;

    // Touching the cart restores it from the store if it was persisted.
    let lines = state.with_cart(&cart_id, |cart| cart.items().len());
    tracing::info!(cart_id = %cart_id, lines, "cart opened");

    Ok((
        StatusCode::CREATED,
        Json(CreateCartResponse {
            status: "created".to_string(),
            cart_id,
        }),
    ))
}

/// Endpoint: GET /carts/:cart_id
async fn get_cart(
    State(state): State<SharedState>,
    Path(cart_id): Path<String>,
) -> Result<Json<CartView>, ApiError> {
    ensure_cart_id(&cart_id)?;
    Ok(Json(view(&state, &cart_id)))
}

/// Endpoint: DELETE /carts/:cart_id
/// Empties the cart and forgets its gift.
async fn clear_cart(
    State(state): State<SharedState>,
    Path(cart_id): Path<String>,
) -> Result<Json<CartView>, ApiError> {
    ensure_cart_id(&cart_id)?;
    state.mutate_cart(&cart_id, Cart::clear);
    state.gifts.remove(&cart_id);
    tracing::info!(cart_id = %cart_id, "cart cleared");
    Ok(Json(view(&state, &cart_id)))
}

/// Endpoint: POST /carts/:cart_id/items
/// Looks the product up in the catalog and adds it at its discounted price.
async fn add_item(
    State(state): State<SharedState>,
    Path(cart_id): Path<String>,
    Json(payload): Json<AddItemInput>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_cart_id(&cart_id)?;

    let product = fetch_product(state.data.as_ref(), &state.config.retry, &payload.product_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("المنتج {} غير موجود", payload.product_id)))?;

    let options = SelectedOptions::normalized(payload.selected_options);
    if let Err(mismatch) = product.check_options(options.as_ref()) {
        let message = match mismatch.field {
            "size" => "يرجى اختيار مقاس متوفر",
            _ => "يرجى اختيار لون متوفر",
        };
        return Err(ApiError::unprocessable(message));
    }

    let line = state.mutate_cart(&cart_id, |cart| {
        cart.add_item(NewCartLine {
            unit_price: product.effective_price(),
            product_id: product.id,
            name: product.name,
            quantity: payload.quantity,
            selected_options: options,
        })
        .clone()
    });
    tracing::info!(
        cart_id = %cart_id,
        line_id = %line.id,
        product_id = %line.product_id,
        quantity = line.quantity,
        "item added"
    );

    Ok((StatusCode::CREATED, Json(view(&state, &cart_id))))
}

/// Endpoint: PATCH /carts/:cart_id/items/:line_id
/// Sets the quantity of a line; zero or less removes it.
async fn update_quantity(
    State(state): State<SharedState>,
    Path((cart_id, line_id)): Path<(String, String)>,
    Json(payload): Json<UpdateQuantityInput>,
) -> Result<Json<CartView>, ApiError> {
    ensure_cart_id(&cart_id)?;
    let found = state.mutate_cart(&cart_id, |cart| cart.update_quantity(&line_id, payload.quantity));
    if !found {
        return Err(ApiError::not_found("العنصر غير موجود في السلة"));
    }
    Ok(Json(view(&state, &cart_id)))
}

/// Endpoint: DELETE /carts/:cart_id/items/:line_id
async fn remove_item(
    State(state): State<SharedState>,
    Path((cart_id, line_id)): Path<(String, String)>,
) -> Result<Json<CartView>, ApiError> {
    ensure_cart_id(&cart_id)?;
    if !state.mutate_cart(&cart_id, |cart| cart.remove_item(&line_id)) {
        return Err(ApiError::not_found("العنصر غير موجود في السلة"));
    }
    Ok(Json(view(&state, &cart_id)))
}

/// Endpoint: POST /carts/:cart_id/bundles
/// Composes a selection from the posted product ids and adds it as one line.
async fn add_bundle(
    State(state): State<SharedState>,
    Path(cart_id): Path<String>,
    Json(payload): Json<AddBundleInput>,
) -> Result<impl IntoResponse, ApiError> {
    ensure_cart_id(&cart_id)?;

    let offer = fetch_bundle_offer(state.data.as_ref(), &state.config.retry, &payload.offer_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("العرض {} غير متوفر", payload.offer_id)))?;

    let mut selection = BundleSelection::new(&offer);
    for product_id in &payload.product_ids {
        let Some(product) = offer.candidate(product_id) else {
            return Err(ApiError::unprocessable(format!(
                "المنتج {product_id} غير مشمول في العرض"
            )));
        };
        match selection.toggle(product) {
            ToggleOutcome::Added => {}
            ToggleOutcome::Removed => {
                return Err(ApiError::unprocessable(format!(
                    "المنتج {product_id} مكرر في الاختيار"
                )))
            }
            ToggleOutcome::Full => {
                return Err(ApiError::unprocessable(format!(
                    "يمكنك اختيار {} منتجات فقط",
                    selection.required_quantity()
                )))
            }
            ToggleOutcome::NotEligible => {
                return Err(ApiError::unprocessable(format!(
                    "المنتج {product_id} غير مشمول في العرض"
                )))
            }
        }
    }

    let line = state.mutate_cart(&cart_id, |cart| {
        cart.add_bundle(&selection, &offer).map(Clone::clone)
    })?;
    tracing::info!(
        cart_id = %cart_id,
        line_id = %line.id,
        offer_id = %offer.id,
        price = %line.unit_price,
        "bundle added"
    );

    Ok((StatusCode::CREATED, Json(view(&state, &cart_id))))
}
