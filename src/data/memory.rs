//! In-memory data service.
//!
//! Backs the demo server and the tests. Faults can be injected to exercise
//! the retry and fail-open paths: `set_offline` makes every call fail with a
//! network error, `fail_next` queues one-shot errors consumed in order.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

use super::{Collection, DataError, DataService, Filter};

/// Collections held in a concurrent map, one `Vec` of JSON records each.
#[derive(Default)]
pub struct MemoryDataService {
    collections: DashMap<Collection, Vec<Value>>,
    offline: AtomicBool,
    scripted_failures: Mutex<VecDeque<DataError>>,
    calls: AtomicU64,
}

impl MemoryDataService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends records directly, bypassing fault injection.
    pub fn seed(&self, collection: Collection, records: impl IntoIterator<Item = Value>) {
        self.collections
            .entry(collection)
            .or_default()
            .extend(records);
    }

    /// Copy of every record currently stored in `collection`.
    pub fn snapshot(&self, collection: Collection) -> Vec<Value> {
        self.collections
            .get(&collection)
            .map(|rows| rows.clone())
            .unwrap_or_default()
    }

    /// While set, every call fails with [`DataError::Network`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Queues an error returned by the next call that reaches the service.
    pub fn fail_next(&self, error: DataError) {
        if let Ok(mut queue) = self.scripted_failures.lock() {
            queue.push_back(error);
        }
    }

    /// Number of calls made through the [`DataService`] trait.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(DataError::Network("connection refused".into()));
        }
        let scripted = self
            .scripted_failures
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front());
        match scripted {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn matches_all(record: &Value, filters: &[Filter]) -> bool {
    filters.iter().all(|f| f.matches(record))
}

fn record_id(record: &Value) -> Option<String> {
    match record.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl DataService for MemoryDataService {
    async fn query(
        &self,
        collection: Collection,
        filters: &[Filter],
    ) -> Result<Vec<Value>, DataError> {
        self.check_available()?;
        Ok(self
            .collections
            .get(&collection)
            .map(|rows| {
                rows.iter()
                    .filter(|r| matches_all(r, filters))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn count(&self, collection: Collection, filters: &[Filter]) -> Result<u64, DataError> {
        self.check_available()?;
        let count = self
            .collections
            .get(&collection)
            .map(|rows| rows.iter().filter(|r| matches_all(r, filters)).count())
            .unwrap_or(0);
        Ok(count as u64)
    }

    async fn insert(&self, collection: Collection, record: Value) -> Result<Value, DataError> {
        self.check_available()?;
        let Value::Object(mut fields) = record else {
            return Err(DataError::status(400, "record must be a JSON object"));
        };
        fields
            .entry("id")
            .or_insert_with(|| Value::String(Uuid::new_v4().simple().to_string()));
        let stored = Value::Object(fields);
        self.collections
            .entry(collection)
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Value,
    ) -> Result<Value, DataError> {
        self.check_available()?;
        let Value::Object(patch) = patch else {
            return Err(DataError::status(400, "patch must be a JSON object"));
        };
        let not_found = || DataError::NotFound {
            collection,
            id: id.to_string(),
        };

        let mut rows = self.collections.get_mut(&collection).ok_or_else(not_found)?;
        let record = rows
            .iter_mut()
            .find(|r| record_id(r).as_deref() == Some(id))
            .ok_or_else(not_found)?;

        if let Value::Object(fields) = record {
            merge_fields(fields, patch);
        }
        Ok(record.clone())
    }

    async fn delete(&self, collection: Collection, filters: &[Filter]) -> Result<u64, DataError> {
        self.check_available()?;
        let Some(mut rows) = self.collections.get_mut(&collection) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|r| !matches_all(r, filters));
        Ok((before - rows.len()) as u64)
    }
}

fn merge_fields(target: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        target.insert(key, value);
    }
}
