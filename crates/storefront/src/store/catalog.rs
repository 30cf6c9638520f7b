//! Catalog reads: site settings and products.
//!
//! These documents change rarely and back every page render, so reads
//! go through a short-TTL in-memory cache. Only successful fetches are
//! cached; failures always retry the store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache;
use numa_core::{Price, ProductId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{CollectionStore, PRODUCTS_COLLECTION, SETTINGS_PATH, StoreError};

/// Cache TTL for catalog reads (5 minutes).
const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Cache capacity: the catalog is two entries, but leave headroom.
const CACHE_CAPACITY: u64 = 16;

/// Cache key for catalog documents.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Settings,
    Products,
}

/// Cached catalog values.
#[derive(Debug, Clone)]
enum CacheValue {
    Settings(Option<SiteSettings>),
    Products(Vec<Product>),
}

/// The site settings singleton document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    /// Storefront display name.
    pub site_name: String,
    /// Stamped by the seed command on every write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Any further settings fields pass through untyped.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// A product document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Store-assigned document id; filled in from the listing, not
    /// stored inside the document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ProductId>,
    /// Product title.
    pub title: String,
    /// Long-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Sale price.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Any further product fields pass through untyped.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Cached catalog reader.
#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn CollectionStore>,
    cache: Cache<CacheKey, CacheValue>,
}

impl Catalog {
    /// Create a catalog reader over a collection store.
    #[must_use]
    pub fn new(store: Arc<dyn CollectionStore>) -> Self {
        Self {
            store,
            cache: Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(CACHE_TTL)
                .build(),
        }
    }

    /// The site settings document, if seeded.
    ///
    /// # Errors
    ///
    /// Propagates store failures; nothing is cached on failure.
    pub async fn settings(&self) -> Result<Option<SiteSettings>, StoreError> {
        if let Some(CacheValue::Settings(settings)) = self.cache.get(&CacheKey::Settings).await {
            return Ok(settings);
        }

        let settings = match self.store.get_document(SETTINGS_PATH).await? {
            Some(value) => Some(serde_json::from_value(value).map_err(|source| {
                StoreError::Decode {
                    path: SETTINGS_PATH.to_owned(),
                    source,
                }
            })?),
            None => None,
        };

        self.cache
            .insert(CacheKey::Settings, CacheValue::Settings(settings.clone()))
            .await;
        Ok(settings)
    }

    /// All products in the catalog.
    ///
    /// Documents that fail to decode are logged and skipped rather than
    /// failing the whole listing.
    ///
    /// # Errors
    ///
    /// Propagates store failures; nothing is cached on failure.
    pub async fn products(&self) -> Result<Vec<Product>, StoreError> {
        if let Some(CacheValue::Products(products)) = self.cache.get(&CacheKey::Products).await {
            return Ok(products);
        }

        let documents = self.store.list_documents(PRODUCTS_COLLECTION).await?;
        let mut products = Vec::with_capacity(documents.len());
        for (id, value) in documents {
            match serde_json::from_value::<Product>(value) {
                Ok(mut product) => {
                    product.id = Some(ProductId::new(id));
                    products.push(product);
                }
                Err(e) => {
                    tracing::warn!(product = %id, error = %e, "skipping malformed product document");
                }
            }
        }

        self.cache
            .insert(CacheKey::Products, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }
}
