//! Rate Limit Models

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Submission throttle settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitPolicy {
    /// Length of the trailing window
    pub window_minutes: u32,

    /// Orders allowed per phone number within the window
    pub max_submissions: u32,

    /// Allow orders when the counter cannot be read
    pub fail_open: bool,

    /// Records older than this are deleted by the cleanup sweep
    pub retention_hours: u32,

    /// How often the cleanup sweep runs
    pub cleanup_interval_minutes: u32,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            window_minutes: 30,
            max_submissions: 5,
            fail_open: true,
            retention_hours: 24,
            cleanup_interval_minutes: 60,
        }
    }
}

impl RateLimitPolicy {
    pub fn window(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.window_minutes))
    }

    pub fn retention(&self) -> TimeDelta {
        TimeDelta::hours(i64::from(self.retention_hours))
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.cleanup_interval_minutes.max(1)) * 60)
    }
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_minutes: Option<u32>,
}

impl RateLimitDecision {
    pub(crate) fn allow(remaining: u32) -> Self {
        Self {
            allowed: true,
            remaining,
            retry_after_minutes: None,
        }
    }

    pub(crate) fn refuse(retry_after_minutes: u32) -> Self {
        Self {
            allowed: false,
            remaining: 0,
            retry_after_minutes: Some(retry_after_minutes),
        }
    }
}

/// One accepted order, as stored in `order_rate_limits`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateLimitRecord {
    pub phone_number: String,
    pub created_at: String,
}

impl RateLimitRecord {
    pub fn new(phone_number: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            phone_number: phone_number.into(),
            created_at: timestamp(at),
        }
    }
}

/// The single timestamp format stored in the backend, so that string
/// comparison orders records chronologically.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
