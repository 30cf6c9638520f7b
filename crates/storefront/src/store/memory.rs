//! In-memory collection store.
//!
//! Backs tests, the seed command's tests, and local development without
//! a remote store. Semantics match the HTTP client: merge writes merge
//! top-level fields, added documents get sequential ids, deletes of
//! absent documents succeed.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::store::{CollectionStore, StoreError};

/// An in-process document store.
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<BTreeMap<String, Value>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the store holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Value>> {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CollectionStore for MemoryStore {
    async fn get_document(&self, path: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.lock().get(path).cloned())
    }

    async fn set_document(&self, path: &str, value: Value, merge: bool) -> Result<(), StoreError> {
        let mut documents = self.lock();

        if merge
            && let Some(Value::Object(existing)) = documents.get_mut(path)
            && let Value::Object(incoming) = &value
        {
            for (key, val) in incoming {
                existing.insert(key.clone(), val.clone());
            }
            return Ok(());
        }

        documents.insert(path.to_owned(), value);
        Ok(())
    }

    async fn add_document(&self, collection: &str, value: Value) -> Result<String, StoreError> {
        let id = format!("doc-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.lock().insert(format!("{collection}/{id}"), value);
        Ok(id)
    }

    async fn delete_document(&self, path: &str) -> Result<(), StoreError> {
        self.lock().remove(path);
        Ok(())
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError> {
        let prefix = format!("{collection}/");
        Ok(self
            .lock()
            .iter()
            .filter_map(|(path, value)| {
                let id = path.strip_prefix(&prefix)?;
                // Only direct children: sub-collection documents have
                // further slashes in their ids.
                if id.contains('/') {
                    return None;
                }
                Some((id.to_owned(), value.clone()))
            })
            .collect())
    }
}
