//! Typed reads from the catalog collections.
//!
//! Every read goes through the retry wrapper; reads are safe to repeat.

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::models::Product;
use crate::bundle::BundleOffer;
use crate::data::{Collection, DataError, DataService, Filter};
use crate::gift::{GiftCandidate, GiftMode, GiftPromotion};
use crate::retry::{retry_with_backoff, RetryOptions};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("malformed {collection} record: {source}")]
    Malformed {
        collection: Collection,
        #[source]
        source: serde_json::Error,
    },
}

fn active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct SpecialOfferRecord {
    id: String,
    name: String,
    required_quantity: u32,
    #[serde(default)]
    bundle_price: Option<Decimal>,
    #[serde(default)]
    unit_price: Option<Decimal>,
    #[serde(default = "active")]
    is_active: bool,
}

#[derive(Debug, Deserialize)]
struct OfferProductLink {
    product_id: String,
}

#[derive(Debug, Deserialize)]
struct GiftOfferRecord {
    id: String,
    minimum_amount: Decimal,
    mode: GiftMode,
    #[serde(default = "active")]
    is_active: bool,
}

#[derive(Debug, Deserialize)]
struct GiftProductLink {
    product_id: String,
    #[serde(default)]
    weight: Option<u32>,
}

async fn read(
    data: &dyn DataService,
    retry: &RetryOptions,
    collection: Collection,
    filters: &[Filter],
) -> Result<Vec<Value>, DataError> {
    retry_with_backoff(|| data.query(collection, filters), retry).await
}

fn decode<T: DeserializeOwned>(
    collection: Collection,
    records: Vec<Value>,
) -> Result<Vec<T>, CatalogError> {
    records
        .into_iter()
        .map(|r| serde_json::from_value(r).map_err(|source| CatalogError::Malformed { collection, source }))
        .collect()
}

/// One product by id.
pub async fn fetch_product(
    data: &dyn DataService,
    retry: &RetryOptions,
    product_id: &str,
) -> Result<Option<Product>, CatalogError> {
    let records = read(data, retry, Collection::Products, &[Filter::eq("id", product_id)]).await?;
    Ok(decode(Collection::Products, records)?.into_iter().next())
}

/// Products by id, in the order of `ids`. Unknown ids are skipped.
pub async fn fetch_products(
    data: &dyn DataService,
    retry: &RetryOptions,
    ids: &[String],
) -> Result<Vec<Product>, CatalogError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let filter = Filter::is_in("id", ids.iter().map(|id| Value::from(id.as_str())).collect());
    let records = read(data, retry, Collection::Products, &[filter]).await?;
    let mut products: Vec<Product> = decode(Collection::Products, records)?;

    let mut ordered = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(pos) = products.iter().position(|p| &p.id == id) {
            ordered.push(products.swap_remove(pos));
        } else {
            tracing::warn!(product_id = %id, "linked product missing from catalog");
        }
    }
    Ok(ordered)
}

/// An active special offer with its candidate products. Offers that
/// require no products are treated as absent.
pub async fn fetch_bundle_offer(
    data: &dyn DataService,
    retry: &RetryOptions,
    offer_id: &str,
) -> Result<Option<BundleOffer>, CatalogError> {
    let records = read(data, retry, Collection::SpecialOffers, &[Filter::eq("id", offer_id)]).await?;
    let Some(offer) = decode::<SpecialOfferRecord>(Collection::SpecialOffers, records)?
        .into_iter()
        .find(|o| o.is_active)
    else {
        return Ok(None);
    };
    if offer.required_quantity == 0 {
        tracing::warn!(offer_id = %offer.id, "special offer requires no products, skipping");
        return Ok(None);
    }

    let links = read(
        data,
        retry,
        Collection::SpecialOfferProducts,
        &[Filter::eq("special_offer_id", offer_id)],
    )
    .await?;
    let ids: Vec<String> = decode::<OfferProductLink>(Collection::SpecialOfferProducts, links)?
        .into_iter()
        .map(|l| l.product_id)
        .collect();
    let candidate_products = fetch_products(data, retry, &ids).await?;

    Ok(Some(BundleOffer {
        id: offer.id,
        name: offer.name,
        required_quantity: offer.required_quantity,
        bundle_price: offer.bundle_price,
        unit_price: offer.unit_price,
        candidate_products,
    }))
}

/// The first active gift promotion that has at least one candidate.
pub async fn fetch_active_gift_promotion(
    data: &dyn DataService,
    retry: &RetryOptions,
) -> Result<Option<GiftPromotion>, CatalogError> {
    let records = read(data, retry, Collection::GiftOffers, &[]).await?;
    let offers: Vec<GiftOfferRecord> = decode(Collection::GiftOffers, records)?;

    for offer in offers.into_iter().filter(|o| o.is_active) {
        let links = read(
            data,
            retry,
            Collection::GiftOfferProducts,
            &[Filter::eq("gift_offer_id", offer.id.as_str())],
        )
        .await?;
        let links: Vec<GiftProductLink> = decode(Collection::GiftOfferProducts, links)?;
        let ids: Vec<String> = links.iter().map(|l| l.product_id.clone()).collect();
        let products = fetch_products(data, retry, &ids).await?;

        let candidates: Vec<GiftCandidate> = products
            .into_iter()
            .map(|p| {
                let weight = links
                    .iter()
                    .find(|l| l.product_id == p.id)
                    .and_then(|l| l.weight);
                GiftCandidate {
                    price: p.effective_price(),
                    id: p.id,
                    name: p.name,
                    weight,
                }
            })
            .collect();

        if candidates.is_empty() {
            tracing::warn!(gift_offer_id = %offer.id, "gift offer has no candidates, skipping");
            continue;
        }
        return Ok(Some(GiftPromotion {
            id: offer.id,
            minimum_amount: offer.minimum_amount,
            mode: offer.mode,
            candidates,
        }));
    }
    Ok(None)
}
