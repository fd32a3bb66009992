//! Checkout Models
//!
//! Customer input, the order record written to the `orders` collection, and
//! the receipt kept locally after a successful submission.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::aggregate::Cart;
use crate::cart::models::CartLine;
use crate::gift::SelectedGift;
use crate::ratelimit::models::timestamp;
use crate::ratelimit::normalize_phone;

/// Shortest and longest accepted phone numbers, in digits.
const PHONE_DIGITS: std::ops::RangeInclusive<usize> = 8..=15;

/// Delivery details entered at checkout (`POST /carts/:cart_id/checkout`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerDetails {
    pub name: String,
    pub phone: String,
    pub city: String,
    pub address: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CustomerDetails {
    /// The first field that is missing or malformed, if any.
    pub fn invalid_field(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            return Some("name");
        }
        let digits = normalize_phone(&self.phone)
            .chars()
            .filter(char::is_ascii_digit)
            .count();
        if !PHONE_DIGITS.contains(&digits) {
            return Some("phone");
        }
        if self.city.trim().is_empty() {
            return Some("city");
        }
        if self.address.trim().is_empty() {
            return Some("address");
        }
        None
    }
}

/// One line of a submitted order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLine {
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub is_bundle: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bundle_products: Vec<String>,
}

impl From<&CartLine> for OrderLine {
    fn from(line: &CartLine) -> Self {
        let options = line.selected_options.as_ref();
        Self {
            product_id: line.product_id.clone(),
            name: line.name.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
            line_total: line.line_total(),
            size: options.and_then(|o| o.size.clone()),
            color: options.and_then(|o| o.color.clone()),
            is_bundle: line.is_bundle,
            bundle_products: line
                .bundle_details
                .iter()
                .flat_map(|d| d.products.iter().map(|p| p.name.clone()))
                .collect(),
        }
    }
}

/// The free gift recorded on an order. It carries no charge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderGift {
    pub product_id: String,
    pub name: String,
    pub value: Decimal,
    pub mode: String,
}

impl From<&SelectedGift> for OrderGift {
    fn from(gift: &SelectedGift) -> Self {
        Self {
            product_id: gift.candidate.id.clone(),
            name: gift.candidate.name.clone(),
            value: gift.candidate.price,
            mode: gift.mode.to_string(),
        }
    }
}

/// Record inserted into the `orders` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderPayload {
    pub customer_name: String,
    pub customer_phone: String,
    pub city: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub items: Vec<OrderLine>,
    pub total: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gift: Option<OrderGift>,
    pub status: String,
    pub created_at: String,
}

impl OrderPayload {
    pub fn new(
        customer: &CustomerDetails,
        cart: &Cart,
        gift: Option<&SelectedGift>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            customer_name: customer.name.trim().to_string(),
            customer_phone: normalize_phone(&customer.phone),
            city: customer.city.trim().to_string(),
            address: customer.address.trim().to_string(),
            notes: customer
                .notes
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            items: cart.items().iter().map(OrderLine::from).collect(),
            total: cart.total(),
            gift: gift.map(OrderGift::from),
            status: "pending".into(),
            created_at: timestamp(at),
        }
    }
}

/// Proof of a placed order, kept per cart after checkout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Id assigned by the data service
    pub order_id: String,

    /// Locally generated delivery receipt id
    pub receipt_id: String,

    pub total: Decimal,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gift: Option<String>,

    pub placed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer() -> CustomerDetails {
        CustomerDetails {
            name: "نورة".into(),
            phone: "050 123 4567".into(),
            city: "الرياض".into(),
            address: "حي النرجس، شارع ١٢".into(),
            notes: Some("  ".into()),
        }
    }

    #[test]
    fn test_customer_validation() {
        assert_eq!(customer().invalid_field(), None);

        let mut short = customer();
        short.phone = "12345".into();
        assert_eq!(short.invalid_field(), Some("phone"));

        let mut nameless = customer();
        nameless.name = " ".into();
        assert_eq!(nameless.invalid_field(), Some("name"));

        let mut arabic_digits = customer();
        arabic_digits.phone = "٠٥٠١٢٣٤٥٦٧".into();
        assert_eq!(arabic_digits.invalid_field(), None);
    }

    #[test]
    fn test_payload_normalizes_customer_fields() {
        let payload = OrderPayload::new(&customer(), &Cart::new(), None, Utc::now());
        assert_eq!(payload.customer_phone, "0501234567");
        assert_eq!(payload.notes, None);
        assert_eq!(payload.status, "pending");
        assert_eq!(payload.total, Decimal::ZERO);
    }
}
