//! Order submission.
//!
//! Validates the customer, consults the rate limiter, writes the order
//! through the retry wrapper and, only once the backend confirms, records the
//! rate-limit entry, takes the ordered lines out of the cart and keeps a
//! receipt. Any failure leaves the cart as it was. One submission per cart
//! runs at a time.

use chrono::Utc;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use super::models::{CustomerDetails, OrderPayload, Receipt};
use crate::cart::aggregate::Cart;
use crate::cart::helpers::format_item_summary;
use crate::cart::state::AppState;
use crate::data::{Collection, DataError};
use crate::retry::retry_with_backoff;

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("invalid customer {field}")]
    InvalidCustomer { field: &'static str },

    #[error("cart is empty")]
    EmptyCart,

    #[error("an order for this cart is already being submitted")]
    InProgress,

    #[error("order limit reached, retry in {retry_after_minutes} minutes")]
    RateLimited { retry_after_minutes: u32 },

    #[error("order submission failed: {0}")]
    Backend(#[source] DataError),

    #[error("order could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

impl CheckoutError {
    /// Message shown to the customer.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidCustomer { field } => {
                format!("يرجى إدخال {} بشكل صحيح", field_label(field))
            }
            Self::EmptyCart => "سلة التسوق فارغة".to_string(),
            Self::InProgress => "جاري إرسال طلبك، يرجى الانتظار".to_string(),
            Self::RateLimited {
                retry_after_minutes,
            } => format!(
                "لقد تجاوزت الحد المسموح من الطلبات، يرجى المحاولة مرة أخرى بعد {retry_after_minutes} دقيقة"
            ),
            Self::Backend(_) | Self::Encode(_) => {
                "تعذر إرسال الطلب، يرجى المحاولة مرة أخرى. لم يتم حذف محتويات السلة".to_string()
            }
        }
    }
}

fn field_label(field: &str) -> &'static str {
    match field {
        "name" => "الاسم",
        "phone" => "رقم الجوال",
        "city" => "المدينة",
        "address" => "العنوان",
        _ => "البيانات",
    }
}

/// Submits the cart `cart_id` as an order for `customer`.
pub async fn submit_order(
    state: &AppState,
    cart_id: &str,
    customer: &CustomerDetails,
) -> Result<Receipt, CheckoutError> {
    if let Some(field) = customer.invalid_field() {
        return Err(CheckoutError::InvalidCustomer { field });
    }

    let _claim = state
        .claim_checkout(cart_id)
        .ok_or(CheckoutError::InProgress)?;

    let cart = state.with_cart(cart_id, Cart::clone);
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let decision = state
        .rate_limiter
        .check_order_rate_limit(&customer.phone)
        .await;
    if !decision.allowed {
        return Err(CheckoutError::RateLimited {
            retry_after_minutes: decision
                .retry_after_minutes
                .unwrap_or(state.rate_limiter.policy().window_minutes),
        });
    }

    let total = cart.total();
    let gift = state
        .selected_gift(cart_id)
        .filter(|g| g.still_eligible(total));
    let now = Utc::now();
    let record = serde_json::to_value(OrderPayload::new(customer, &cart, gift.as_ref(), now))?;

    let stored = retry_with_backoff(
        || state.data.insert(Collection::Orders, record.clone()),
        &state.config.retry,
    )
    .await
    .map_err(|err| {
        tracing::error!(cart_id, error = %err, "order submission failed");
        CheckoutError::Backend(err)
    })?;

    let order_id = match stored.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };

    if let Err(err) = state
        .rate_limiter
        .record_order_attempt(&customer.phone)
        .await
    {
        tracing::warn!(cart_id, error = %err, "failed to record order for rate limiting");
    }

    state.mutate_cart(cart_id, |live| live.remove_ordered(cart.items()));
    state.gifts.remove(cart_id);

    let receipt = Receipt {
        order_id,
        receipt_id: Uuid::new_v4().simple().to_string(),
        total,
        gift: gift.map(|g| g.candidate.name),
        placed_at: now,
    };
    state.receipts.insert(cart_id.to_string(), receipt.clone());

    tracing::info!(
        cart_id,
        order_id = %receipt.order_id,
        total = %receipt.total,
        items = %format_item_summary(cart.items()),
        "order placed"
    );
    Ok(receipt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::models::NewCartLine;
    use crate::cart::store::MemoryCartStore;
    use crate::config::AppConfig;
    use crate::data::MemoryDataService;
    use rust_decimal::Decimal;
    use std::sync::Arc;
    use std::time::Duration;

    fn customer() -> CustomerDetails {
        CustomerDetails {
            name: "سارة".into(),
            phone: "+966 55 123 4567".into(),
            city: "جدة".into(),
            address: "حي الروضة".into(),
            notes: None,
        }
    }

    fn state_with(data: Arc<MemoryDataService>, config: AppConfig) -> AppState {
        let state = AppState::new(config, data, Arc::new(MemoryCartStore::new()));
        state.mutate_cart("c1", |cart| {
            cart.add_item(NewCartLine {
                product_id: "p1".into(),
                name: "بخور".into(),
                unit_price: Decimal::from(75),
                quantity: 2,
                selected_options: None,
            });
        });
        state
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_insert_failure_is_retried() {
        let data = Arc::new(MemoryDataService::new());
        let state = state_with(data.clone(), AppConfig::default());

        // First failure hits the rate-limit count (fail-open), second the insert.
        data.fail_next(DataError::status(503, "unavailable"));
        data.fail_next(DataError::Timeout);

        let receipt = submit_order(&state, "c1", &customer()).await.unwrap();
        assert_eq!(receipt.total, Decimal::from(150));
        assert_eq!(data.snapshot(Collection::Orders).len(), 1);
        assert!(state.with_cart("c1", Cart::is_empty));
        assert_eq!(state.receipt("c1"), Some(receipt));
    }

    #[tokio::test]
    async fn test_fail_closed_refuses_when_counter_unreadable() {
        let data = Arc::new(MemoryDataService::new());
        let mut config = AppConfig::default();
        config.rate_limit.fail_open = false;
        let state = state_with(data.clone(), config);

        data.fail_next(DataError::status(500, "boom"));
        let err = submit_order(&state, "c1", &customer()).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::RateLimited {
                retry_after_minutes: 30
            }
        ));
        assert!(err.user_message().contains("30"));
        assert_eq!(state.with_cart("c1", Cart::item_count), 2);
    }

    #[tokio::test]
    async fn test_rejected_insert_records_nothing() {
        let data = Arc::new(MemoryDataService::new());
        let state = state_with(data.clone(), AppConfig::default());

        data.fail_next(DataError::status(500, "count down"));
        data.fail_next(DataError::status(400, "rejected"));
        let err = submit_order(&state, "c1", &customer()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Backend(_)));
        assert!(data.snapshot(Collection::OrderRateLimits).is_empty());
        assert!(state.receipt("c1").is_none());
        assert!(!state.with_cart("c1", Cart::is_empty));
    }

    #[tokio::test(start_paused = true)]
    async fn test_line_added_during_submission_stays_in_cart() {
        let data = Arc::new(MemoryDataService::new());
        let state = state_with(data.clone(), AppConfig::default());

        // The insert times out once and waits a second before its retry.
        data.fail_next(DataError::status(503, "unavailable"));
        data.fail_next(DataError::Timeout);

        let add_late = async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            state.mutate_cart("c1", |cart| {
                cart.add_item(NewCartLine {
                    product_id: "p2".into(),
                    name: "مبخرة".into(),
                    unit_price: Decimal::from(60),
                    quantity: 1,
                    selected_options: None,
                })
                .id
                .clone()
            })
        };
        let cust = customer();
        let (receipt, late_id) = tokio::join!(submit_order(&state, "c1", &cust), add_late);

        assert_eq!(receipt.unwrap().total, Decimal::from(150));
        let orders = data.snapshot(Collection::Orders);
        assert_eq!(orders[0]["items"].as_array().unwrap().len(), 1);
        state.with_cart("c1", |cart| {
            assert_eq!(cart.items().len(), 1);
            assert!(cart.line(&late_id).is_some());
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_submissions_place_one_order() {
        let data = Arc::new(MemoryDataService::new());
        let state = state_with(data.clone(), AppConfig::default());
        data.fail_next(DataError::status(503, "unavailable"));
        data.fail_next(DataError::Timeout);

        let cust_a = customer();
        let cust_b = customer();
        let (first, second) = tokio::join!(
            submit_order(&state, "c1", &cust_a),
            submit_order(&state, "c1", &cust_b)
        );

        assert!(first.is_ok());
        assert!(matches!(second, Err(CheckoutError::InProgress)));
        assert_eq!(data.snapshot(Collection::Orders).len(), 1);
        assert!(state.checkouts.is_empty(), "claim released after submission");
    }
}
