//! Data Service Module
//!
//! The backend is an opaque store of named collections. This module contains:
//! - The `DataService` trait (query, count, insert, update, delete)
//! - Collection names and record filters
//! - The backend error taxonomy
//! - An in-memory implementation used by the demo server and the tests

pub mod error;
pub mod memory;
pub mod models;

use async_trait::async_trait;
use serde_json::Value;

pub use error::DataError;
pub use memory::MemoryDataService;
pub use models::{Collection, Filter};

/// Asynchronous access to the storefront's backend collections.
///
/// Records are JSON objects. Every call is a suspension point and may fail
/// with a transient or non-transient [`DataError`].
#[async_trait]
pub trait DataService: Send + Sync {
    /// Returns every record of `collection` matching all `filters`, in
    /// insertion order.
    async fn query(&self, collection: Collection, filters: &[Filter])
        -> Result<Vec<Value>, DataError>;

    /// Counts the records of `collection` matching all `filters`.
    async fn count(&self, collection: Collection, filters: &[Filter]) -> Result<u64, DataError>;

    /// Appends a record and returns it as stored (with its `id`).
    async fn insert(&self, collection: Collection, record: Value) -> Result<Value, DataError>;

    /// Merges the fields of `patch` into the record with the given `id`.
    async fn update(&self, collection: Collection, id: &str, patch: Value)
        -> Result<Value, DataError>;

    /// Deletes the records matching all `filters`; returns how many went.
    async fn delete(&self, collection: Collection, filters: &[Filter]) -> Result<u64, DataError>;

    /// Cheap round trip used to test connectivity.
    async fn ping(&self) -> Result<(), DataError> {
        self.count(Collection::Products, &[]).await.map(|_| ())
    }
}
