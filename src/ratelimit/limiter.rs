//! Sliding-window submission limiter keyed by phone number.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::models::{timestamp, RateLimitDecision, RateLimitPolicy, RateLimitRecord};
use crate::data::{Collection, DataError, DataService, Filter};

const PHONE_FIELD: &str = "phone_number";
const CREATED_AT_FIELD: &str = "created_at";

/// Counts accepted orders per phone number within a trailing window.
pub struct RateLimiter {
    data: Arc<dyn DataService>,
    policy: RateLimitPolicy,
}

impl RateLimiter {
    pub fn new(data: Arc<dyn DataService>, policy: RateLimitPolicy) -> Self {
        Self { data, policy }
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Whether `phone` may submit another order now.
    pub async fn check_order_rate_limit(&self, phone: &str) -> RateLimitDecision {
        self.check_at(phone, Utc::now()).await
    }

    /// Same as [`check_order_rate_limit`](Self::check_order_rate_limit) at a
    /// given instant.
    pub async fn check_at(&self, phone: &str, now: DateTime<Utc>) -> RateLimitDecision {
        let phone = normalize_phone(phone);
        let since = now - self.policy.window();
        let filters = [
            Filter::eq(PHONE_FIELD, phone.as_str()),
            Filter::gte(CREATED_AT_FIELD, timestamp(since)),
        ];

        let count = match self.data.count(Collection::OrderRateLimits, &filters).await {
            Ok(count) => u32::try_from(count).unwrap_or(u32::MAX),
            Err(err) => return self.on_count_failure(&phone, &err),
        };

        let max = self.policy.max_submissions;
        if count < max {
            RateLimitDecision::allow(max - count)
        } else {
            tracing::info!(phone = %phone, count, max, "order rate limit reached");
            RateLimitDecision::refuse(self.policy.window_minutes)
        }
    }

    /// Appends a record for an accepted order.
    pub async fn record_order_attempt(&self, phone: &str) -> Result<(), DataError> {
        self.record_at(phone, Utc::now()).await
    }

    pub async fn record_at(&self, phone: &str, at: DateTime<Utc>) -> Result<(), DataError> {
        let record = RateLimitRecord::new(normalize_phone(phone), at);
        self.data
            .insert(Collection::OrderRateLimits, serde_json::to_value(record)?)
            .await
            .map(|_| ())
    }

    /// Deletes records older than the retention period.
    pub async fn cleanup_expired(&self) -> Result<u64, DataError> {
        self.cleanup_before(Utc::now() - self.policy.retention()).await
    }

    pub async fn cleanup_before(&self, cutoff: DateTime<Utc>) -> Result<u64, DataError> {
        let filters = [Filter::lt(CREATED_AT_FIELD, timestamp(cutoff))];
        self.data
            .delete(Collection::OrderRateLimits, &filters)
            .await
    }

    fn on_count_failure(&self, phone: &str, err: &DataError) -> RateLimitDecision {
        if self.policy.fail_open {
            tracing::warn!(phone = %phone, error = %err, "rate limit check failed, allowing order");
            RateLimitDecision::allow(self.policy.max_submissions)
        } else {
            tracing::warn!(phone = %phone, error = %err, "rate limit check failed, refusing order");
            RateLimitDecision::refuse(self.policy.window_minutes)
        }
    }
}

/// Calling code folded into the national format.
const HOME_COUNTRY_CODE: &str = "966";
/// Digits of a national number after the country code.
const NATIONAL_DIGITS: usize = 9;

/// Canonical form of a phone number used as the limiter key.
///
/// Keeps digits only; Arabic-Indic (`٠`-`٩`) and Eastern Arabic-Indic
/// (`۰`-`۹`) digits become ASCII. Home numbers written with the country code
/// (`+966…`, `00966…`, `966…`) become the national `0…` form, so one
/// subscriber has one key. Other international numbers keep a leading `+`.
pub fn normalize_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    let digits: String = trimmed.chars().filter_map(ascii_digit).collect();

    let (number, international) = match digits.strip_prefix("00") {
        Some(rest) if !trimmed.starts_with('+') => (rest, true),
        _ => (digits.as_str(), trimmed.starts_with('+')),
    };

    match number.strip_prefix(HOME_COUNTRY_CODE) {
        Some(national) if national.len() == NATIONAL_DIGITS => format!("0{national}"),
        _ if international => format!("+{number}"),
        _ => number.to_string(),
    }
}

fn ascii_digit(c: char) -> Option<char> {
    match c {
        '0'..='9' => Some(c),
        '\u{0660}'..='\u{0669}' => char::from_digit(u32::from(c) - 0x0660, 10),
        '\u{06F0}'..='\u{06F9}' => char::from_digit(u32::from(c) - 0x06F0, 10),
        _ => None,
    }
}

/// Runs [`RateLimiter::cleanup_expired`] periodically until `cancel` fires.
///
/// Failures are logged and otherwise ignored; the next sweep tries again.
pub fn spawn_cleanup_sweep(limiter: Arc<RateLimiter>, cancel: CancellationToken) -> JoinHandle<()> {
    let period = limiter.policy().cleanup_interval();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            match limiter.cleanup_expired().await {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "expired rate limit records removed"),
                Err(err) => tracing::debug!(error = %err, "rate limit cleanup failed"),
            }
        }
    })
}
