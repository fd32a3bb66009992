//! REST API handlers for the gift promotion.

use super::{GiftEngine, GiftError, GiftMode, GiftPromotion, RevealPlan, SelectedGift};
use crate::cart::handlers::ensure_cart_id;
use crate::cart::{aggregate::Cart, state::SharedState};
use crate::catalog::fetch_active_gift_promotion;
use crate::router::error::ApiError;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Creates routes for gift operations
pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/carts/:cart_id/gift", get(gift_status).post(select_gift))
        .route("/carts/:cart_id/gift/reveal", post(reveal_gift))
}

/// Body of `POST /carts/:cart_id/gift`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectGiftInput {
    pub candidate_id: String,
}

/// Where a cart stands against the active promotion.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftStatus {
    pub promotion: GiftPromotion,
    pub subtotal: Decimal,
    pub eligible: bool,
    pub progress_percent: Decimal,
    pub remaining: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<SelectedGift>,
}

/// A reveal to animate client-side; only `finalPick` counts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealResponse {
    #[serde(flatten)]
    pub plan: RevealPlan,
    pub tick_ms: u64,
}

async fn load_engine(state: &SharedState) -> Result<GiftEngine, ApiError> {
    let promotion = fetch_active_gift_promotion(state.data.as_ref(), &state.config.retry)
        .await?
        .ok_or_else(|| ApiError::not_found("لا توجد هدية متاحة حالياً"))?;
    Ok(GiftEngine::new(promotion)?)
}

fn require_eligible(engine: &GiftEngine, subtotal: Decimal) -> Result<(), ApiError> {
    if engine.is_eligible(subtotal) {
        Ok(())
    } else {
        Err(ApiError::conflict(format!(
            "أضف منتجات بقيمة {} للحصول على الهدية",
            engine.remaining(subtotal)
        )))
    }
}

// ThreadRng is not Send; keep it out of the handler futures.
fn plan_with_thread_rng(engine: &GiftEngine, spins: u32) -> Result<RevealPlan, GiftError> {
    engine.plan_reveal(spins, &mut rand::rng())
}

/// Endpoint: GET /carts/:cart_id/gift
async fn gift_status(
    State(state): State<SharedState>,
    Path(cart_id): Path<String>,
) -> Result<Json<GiftStatus>, ApiError> {
    ensure_cart_id(&cart_id)?;
    let engine = load_engine(&state).await?;
    let subtotal = state.with_cart(&cart_id, Cart::total);

    Ok(Json(GiftStatus {
        eligible: engine.is_eligible(subtotal),
        progress_percent: engine.progress_percent(subtotal),
        remaining: engine.remaining(subtotal),
        selected: state
            .selected_gift(&cart_id)
            .filter(|g| g.promotion_id == engine.promotion().id),
        subtotal,
        promotion: engine.promotion().clone(),
    }))
}

/// Endpoint: POST /carts/:cart_id/gift
/// Records the customer's pick in `choice` mode.
async fn select_gift(
    State(state): State<SharedState>,
    Path(cart_id): Path<String>,
    Json(payload): Json<SelectGiftInput>,
) -> Result<Json<SelectedGift>, ApiError> {
    ensure_cart_id(&cart_id)?;
    let engine = load_engine(&state).await?;
    require_eligible(&engine, state.with_cart(&cart_id, Cart::total))?;

    let gift = engine.select_gift(&payload.candidate_id)?;
    state.gifts.insert(cart_id.clone(), gift.clone());
    tracing::info!(cart_id = %cart_id, gift_id = %gift.candidate.id, "gift selected");
    Ok(Json(gift))
}

/// Endpoint: POST /carts/:cart_id/gift/reveal
/// Draws the gift in `random` mode. Asking again replays the same final pick.
async fn reveal_gift(
    State(state): State<SharedState>,
    Path(cart_id): Path<String>,
) -> Result<Json<RevealResponse>, ApiError> {
    ensure_cart_id(&cart_id)?;
    let engine = load_engine(&state).await?;
    if engine.mode() != GiftMode::Random {
        return Err(GiftError::WrongMode {
            actual: engine.mode(),
        }
        .into());
    }
    require_eligible(&engine, state.with_cart(&cart_id, Cart::total))?;

    let mut plan = plan_with_thread_rng(&engine, state.config.reveal.spins)?;
    let previous = state
        .selected_gift(&cart_id)
        .filter(|g| g.promotion_id == engine.promotion().id && g.mode == GiftMode::Random);
    match previous {
        Some(gift) => plan.final_pick = gift,
        None => {
            state.gifts.insert(cart_id.clone(), plan.final_pick.clone());
            tracing::info!(
                cart_id = %cart_id,
                gift_id = %plan.final_pick.candidate.id,
                "gift drawn"
            );
        }
    }

    Ok(Json(RevealResponse {
        plan,
        tick_ms: state.config.reveal.tick_ms,
    }))
}
