//! Demo catalog for the in-memory data service.
//!
//! Gives the standalone server something to sell and the tests a known
//! fixture: seven products, one three-perfume bundle offer and one random
//! gift promotion unlocked at 200.

use serde_json::json;

use crate::data::{Collection, MemoryDataService};

pub fn seed_catalog(data: &MemoryDataService) {
    data.seed(
        Collection::Products,
        vec![
            json!({ "id": "p-oud", "name": "عطر العود", "price": 180, "images": ["oud.webp"] }),
            json!({ "id": "p-musk", "name": "مسك الطهارة", "price": 95, "discount_percentage": 10 }),
            json!({ "id": "p-amber", "name": "عنبر ملكي", "price": 140 }),
            json!({ "id": "p-rose", "name": "ورد طائفي", "price": 160 }),
            json!({
                "id": "p-abaya",
                "name": "عباية كلوش",
                "price": 250,
                "discount_percentage": 20,
                "options": { "sizes": ["52", "54", "56"], "colors": ["أسود", "كحلي"] }
            }),
            json!({ "id": "p-keychain", "name": "ميدالية مفاتيح", "price": 25 }),
            json!({ "id": "p-mug", "name": "كوب قهوة", "price": 40 }),
        ],
    );

    data.seed(
        Collection::SpecialOffers,
        vec![json!({
            "id": "offer-perfume-trio",
            "name": "أي ٣ عطور بـ ٢٩٩",
            "required_quantity": 3,
            "bundle_price": 299,
            "is_active": true
        })],
    );
    data.seed(
        Collection::SpecialOfferProducts,
        ["p-oud", "p-musk", "p-amber", "p-rose"]
            .into_iter()
            .map(|id| json!({ "special_offer_id": "offer-perfume-trio", "product_id": id })),
    );

    data.seed(
        Collection::GiftOffers,
        vec![json!({
            "id": "gift-200",
            "minimum_amount": 200,
            "mode": "random",
            "is_active": true
        })],
    );
    data.seed(
        Collection::GiftOfferProducts,
        vec![
            json!({ "gift_offer_id": "gift-200", "product_id": "p-keychain", "weight": 75 }),
            json!({ "gift_offer_id": "gift-200", "product_id": "p-mug", "weight": 25 }),
        ],
    );
}
