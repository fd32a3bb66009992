//! Collection names and record filters understood by the data service.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

// =============================================================================
// Collections
// =============================================================================

/// Named backend collections consumed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Products,
    SpecialOffers,
    SpecialOfferProducts,
    GiftOffers,
    GiftOfferProducts,
    OrderRateLimits,
    Orders,
}

impl Collection {
    /// The backend table name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::SpecialOffers => "special_offers",
            Self::SpecialOfferProducts => "special_offer_products",
            Self::GiftOffers => "gift_offers",
            Self::GiftOfferProducts => "gift_offer_products",
            Self::OrderRateLimits => "order_rate_limits",
            Self::Orders => "orders",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Filters
// =============================================================================

/// A predicate on one field of a record.
///
/// Numbers compare numerically and strings lexicographically, so timestamps
/// must be stored in a single RFC 3339 UTC format to compare correctly.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    Gte(String, Value),
    Lt(String, Value),
    In(String, Vec<Value>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(field.into(), value.into())
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Gte(field.into(), value.into())
    }

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Lt(field.into(), value.into())
    }

    pub fn is_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::In(field.into(), values)
    }

    /// Whether `record` satisfies this filter. Missing fields never match.
    pub fn matches(&self, record: &Value) -> bool {
        match self {
            Self::Eq(field, expected) => record.get(field).is_some_and(|v| loosely_equal(v, expected)),
            Self::Gte(field, bound) => record
                .get(field)
                .and_then(|v| compare(v, bound))
                .is_some_and(Ordering::is_ge),
            Self::Lt(field, bound) => record
                .get(field)
                .and_then(|v| compare(v, bound))
                .is_some_and(Ordering::is_lt),
            Self::In(field, options) => record
                .get(field)
                .is_some_and(|v| options.iter().any(|o| loosely_equal(v, o))),
        }
    }
}

/// Equality that treats `1` and `1.0` as the same number.
fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => compare(a, b) == Some(Ordering::Equal),
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
