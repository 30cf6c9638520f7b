//! HTTP client for the remote collection store.
//!
//! The store exposes documents under `/v1/documents/{path}`:
//! - `GET` reads one document (404 when absent)
//! - `PUT` replaces it; `?merge=true` merges top-level fields instead
//! - `POST /v1/documents/{collection}` adds a document under a
//!   store-assigned id, returned as `{"id": "..."}`
//! - `DELETE` removes it (absent documents delete successfully)
//! - `GET /v1/documents/{collection}` lists a collection as
//!   `{"documents": [{"id": ..., "data": {...}}]}`

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use crate::config::StoreConfig;
use crate::store::{CollectionStore, StoreError};

/// Client for the remote collection store.
///
/// Cheaply cloneable; clones share one HTTP connection pool.
#[derive(Clone)]
pub struct HttpCollectionStore {
    inner: Arc<HttpStoreInner>,
}

struct HttpStoreInner {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct AddResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    documents: Vec<ListedDocument>,
}

#[derive(Debug, Deserialize)]
struct ListedDocument {
    id: String,
    data: Value,
}

impl HttpCollectionStore {
    /// Create a new store client.
    #[must_use]
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            inner: Arc::new(HttpStoreInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.as_str().trim_end_matches('/').to_owned(),
            }),
        }
    }

    fn document_url(&self, path: &str) -> String {
        format!("{}/v1/documents/{path}", self.inner.base_url)
    }

    /// Classify a non-success response.
    fn status_error(status: StatusCode) -> StoreError {
        StoreError::Backend(status.as_u16())
    }
}

#[async_trait]
impl CollectionStore for HttpCollectionStore {
    async fn get_document(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let response = self
            .inner
            .client
            .get(self.document_url(path))
            .send()
            .await
            .map_err(StoreError::BackendUnavailable)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::status_error(response.status()));
        }

        let value = response
            .json()
            .await
            .map_err(StoreError::BackendUnavailable)?;
        Ok(Some(value))
    }

    async fn set_document(&self, path: &str, value: Value, merge: bool) -> Result<(), StoreError> {
        let mut request = self.inner.client.put(self.document_url(path)).json(&value);
        if merge {
            request = request.query(&[("merge", "true")]);
        }

        let response = request
            .send()
            .await
            .map_err(StoreError::BackendUnavailable)?;

        if !response.status().is_success() {
            return Err(Self::status_error(response.status()));
        }
        Ok(())
    }

    async fn add_document(&self, collection: &str, value: Value) -> Result<String, StoreError> {
        let response = self
            .inner
            .client
            .post(self.document_url(collection))
            .json(&value)
            .send()
            .await
            .map_err(StoreError::BackendUnavailable)?;

        if !response.status().is_success() {
            return Err(Self::status_error(response.status()));
        }

        let added: AddResponse = response
            .json()
            .await
            .map_err(StoreError::BackendUnavailable)?;
        Ok(added.id)
    }

    async fn delete_document(&self, path: &str) -> Result<(), StoreError> {
        let response = self
            .inner
            .client
            .delete(self.document_url(path))
            .send()
            .await
            .map_err(StoreError::BackendUnavailable)?;

        // Deleting what is already gone is success.
        if response.status() == StatusCode::NOT_FOUND || response.status().is_success() {
            return Ok(());
        }
        Err(Self::status_error(response.status()))
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<(String, Value)>, StoreError> {
        let response = self
            .inner
            .client
            .get(self.document_url(collection))
            .send()
            .await
            .map_err(StoreError::BackendUnavailable)?;

        if !response.status().is_success() {
            return Err(Self::status_error(response.status()));
        }

        let listed: ListResponse = response
            .json()
            .await
            .map_err(StoreError::BackendUnavailable)?;
        Ok(listed
            .documents
            .into_iter()
            .map(|doc| (doc.id, doc.data))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn test_document_url_building() {
        let store = HttpCollectionStore::new(&StoreConfig {
            base_url: Url::parse("https://store.example.com/").unwrap(),
        });
        assert_eq!(
            store.document_url("users/u-42/cart"),
            "https://store.example.com/v1/documents/users/u-42/cart"
        );
    }
}
