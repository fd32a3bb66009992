//! Shopping Cart State Management
//!
//! This module manages the application state for shopping carts: the live
//! carts, their persistent mirror, the gift picked per cart, receipts of
//! placed orders, and the backend collaborators.

use super::aggregate::Cart;
use super::store::{CartStore, JsonFileCartStore, MemoryCartStore, StoreError};
use crate::checkout::models::Receipt;
use crate::config::AppConfig;
use crate::data::{DataService, MemoryDataService};
use crate::gift::SelectedGift;
use crate::ratelimit::RateLimiter;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state that can be safely passed between threads
pub type SharedState = Arc<AppState>;

/// Core application state containing carts and backend collaborators
pub struct AppState {
    /// Live carts, keyed by cart_id.
    /// DashMap allows concurrent access without external Mutexes; holding an
    /// entry serialises mutations of that cart.
    pub carts: DashMap<String, Cart>,

    /// Gift attached to each cart, if any.
    pub gifts: DashMap<String, SelectedGift>,

    /// Receipt of the last order placed from each cart.
    pub receipts: DashMap<String, Receipt>,

    /// Carts with an order submission in flight.
    pub checkouts: DashMap<String, ()>,

    /// Durable mirror of `carts`.
    pub store: Arc<dyn CartStore>,

    /// Backend collections.
    pub data: Arc<dyn DataService>,

    pub rate_limiter: Arc<RateLimiter>,

    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig, data: Arc<dyn DataService>, store: Arc<dyn CartStore>) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(
            Arc::clone(&data),
            config.rate_limit.clone(),
        ));
        Self {
            carts: DashMap::new(),
            gifts: DashMap::new(),
            receipts: DashMap::new(),
            checkouts: DashMap::new(),
            store,
            data,
            rate_limiter,
            config,
        }
    }

    /// Builds the state with the cart store named in `config`.
    pub fn from_config(config: AppConfig, data: Arc<dyn DataService>) -> Result<Self, StoreError> {
        let store: Arc<dyn CartStore> = match &config.cart_store.dir {
            Some(dir) => {
                tracing::info!(dir = %dir.display(), "mirroring carts to disk");
                Arc::new(JsonFileCartStore::open(dir)?)
            }
            None => Arc::new(MemoryCartStore::new()),
        };
        Ok(Self::new(config, data, store))
    }

    /// Default configuration over an empty in-memory backend.
    pub fn in_memory() -> Self {
        Self::new(
            AppConfig::default(),
            Arc::new(MemoryDataService::new()),
            Arc::new(MemoryCartStore::new()),
        )
    }

    /// Reads a cart. Unknown ids read as an empty cart without being
    /// stored; a persisted cart is restored on first access.
    pub fn with_cart<R>(&self, cart_id: &str, f: impl FnOnce(&Cart) -> R) -> R {
        if let Some(cart) = self.carts.get(cart_id) {
            return f(cart.value());
        }
        match self.restore(cart_id) {
            Some(cart) => {
                let entry = self.carts.entry(cart_id.to_string()).or_insert(cart);
                f(entry.value())
            }
            None => f(&Cart::new()),
        }
    }

    /// Applies a mutation to a cart and mirrors the result to the store.
    ///
    /// The mirror write happens after the map entry is released; a failed
    /// write is logged and the in-memory mutation stands. A cart left empty
    /// is dropped from memory.
    pub fn mutate_cart<R>(&self, cart_id: &str, f: impl FnOnce(&mut Cart) -> R) -> R {
        let restored = if self.carts.contains_key(cart_id) {
            None
        } else {
            self.restore(cart_id)
        };

        let (result, snapshot) = {
            let mut entry = self
                .carts
                .entry(cart_id.to_string())
                .or_insert_with(|| restored.unwrap_or_default());
            let result = f(entry.value_mut());
            (result, entry.value().clone())
        };

        if snapshot.is_empty() {
            self.carts.remove_if(cart_id, |_, cart| cart.is_empty());
        }
        if let Err(err) = self.store.save(cart_id, &snapshot) {
            tracing::warn!(cart_id, error = %err, "failed to mirror cart");
        }
        result
    }

    /// Marks `cart_id` as having an order in flight. `None` while another
    /// checkout of the same cart holds the claim.
    pub fn claim_checkout(&self, cart_id: &str) -> Option<CheckoutClaim<'_>> {
        match self.checkouts.entry(cart_id.to_string()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(());
                Some(CheckoutClaim {
                    state: self,
                    cart_id: cart_id.to_string(),
                })
            }
        }
    }

    pub fn selected_gift(&self, cart_id: &str) -> Option<SelectedGift> {
        self.gifts.get(cart_id).map(|g| g.value().clone())
    }

    pub fn receipt(&self, cart_id: &str) -> Option<Receipt> {
        self.receipts.get(cart_id).map(|r| r.value().clone())
    }

    /// Non-empty cart persisted for `cart_id`, if any.
    fn restore(&self, cart_id: &str) -> Option<Cart> {
        match self.store.load(cart_id) {
            Ok(Some(cart)) if !cart.is_empty() => {
                tracing::debug!(cart_id, lines = cart.items().len(), "cart restored");
                Some(cart)
            }
            Ok(_) => None,
            Err(err) => {
                tracing::warn!(cart_id, error = %err, "failed to restore cart, starting empty");
                None
            }
        }
    }
}

/// Held for the duration of one checkout; releases the cart when dropped.
pub struct CheckoutClaim<'a> {
    state: &'a AppState,
    cart_id: String,
}

impl Drop for CheckoutClaim<'_> {
    fn drop(&mut self) {
        self.state.checkouts.remove(&self.cart_id);
    }
}
