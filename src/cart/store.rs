//! Persistent cart mirror.
//!
//! Every cart mutation is written through to a [`CartStore`] so that a
//! restart does not lose carts. Writers are not coordinated: the last save
//! for a cart id wins.

use dashmap::DashMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

use super::aggregate::Cart;
use super::helpers::is_valid_cart_id;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid cart id '{0}'")]
    InvalidCartId(String),

    #[error("cart store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt cart data: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Durable storage for cart contents.
pub trait CartStore: Send + Sync {
    fn load(&self, cart_id: &str) -> Result<Option<Cart>, StoreError>;

    fn save(&self, cart_id: &str, cart: &Cart) -> Result<(), StoreError>;
}

// =============================================================================
// In-memory store
// =============================================================================

/// Keeps carts for the lifetime of the process only.
#[derive(Default)]
pub struct MemoryCartStore {
    carts: DashMap<String, Cart>,
}

impl MemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CartStore for MemoryCartStore {
    fn load(&self, cart_id: &str) -> Result<Option<Cart>, StoreError> {
        Ok(self.carts.get(cart_id).map(|c| c.value().clone()))
    }

    fn save(&self, cart_id: &str, cart: &Cart) -> Result<(), StoreError> {
        self.carts.insert(cart_id.to_string(), cart.clone());
        Ok(())
    }
}

// =============================================================================
// JSON file store
// =============================================================================

/// One `<cart_id>.json` file per cart under a directory.
///
/// Reads and writes use blocking `std::fs` calls on a single small file.
/// [`AppState`](super::state::AppState) issues them with no cart map entry
/// held, so a slow disk delays only the request doing the write.
pub struct JsonFileCartStore {
    dir: PathBuf,
}

impl JsonFileCartStore {
    /// Uses `dir`, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, cart_id: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_cart_id(cart_id) {
            return Err(StoreError::InvalidCartId(cart_id.to_string()));
        }
        Ok(self.dir.join(format!("{cart_id}.json")))
    }
}

impl CartStore for JsonFileCartStore {
    fn load(&self, cart_id: &str) -> Result<Option<Cart>, StoreError> {
        let path = self.path_for(cart_id)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, cart_id: &str, cart: &Cart) -> Result<(), StoreError> {
        let path = self.path_for(cart_id)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(cart)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::models::NewCartLine;
    use rust_decimal::Decimal;

    fn sample_cart() -> Cart {
        let mut cart = Cart::new();
        cart.add_item(NewCartLine {
            product_id: "p1".into(),
            name: "شماغ".into(),
            unit_price: Decimal::new(8950, 2),
            quantity: 2,
            selected_options: None,
        });
        cart
    }

    #[test]
    fn test_file_store_round_trip_and_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileCartStore::open(dir.path().join("carts")).unwrap();
        assert!(store.load("c1").unwrap().is_none());

        let cart = sample_cart();
        store.save("c1", &cart).unwrap();
        assert_eq!(store.load("c1").unwrap(), Some(cart));

        store.save("c1", &Cart::new()).unwrap();
        assert!(store.load("c1").unwrap().unwrap().is_empty());
    }

    #[test]
    fn test_file_store_rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileCartStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.save("../escape", &Cart::new()),
            Err(StoreError::InvalidCartId(_))
        ));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryCartStore::new();
        store.save("c1", &sample_cart()).unwrap();
        assert_eq!(store.load("c1").unwrap().unwrap().items().len(), 1);
    }
}
