//! Seed the remote store with initial documents.
//!
//! Reads two static JSON fixtures - the site settings and one sample
//! product - stamps them with the current UTC time, and writes them into
//! the store: settings as a merge-write at the fixed singleton path,
//! the product as a new document under a store-assigned id.
//!
//! Any failure aborts the whole run; there is no retry policy.

use std::path::Path;

use chrono::Utc;
use serde_json::Value;
use tracing::info;

use numa_storefront::config::StoreConfig;
use numa_storefront::store::{
    CollectionStore, HttpCollectionStore, PRODUCTS_COLLECTION, SETTINGS_PATH,
};

/// Outcome of a completed seeding run.
#[derive(Debug)]
pub struct SeedSummary {
    /// Store-assigned id of the seeded product.
    pub product_id: String,
}

/// Seed the store configured via `NUMA_STORE_URL`.
///
/// # Errors
///
/// Returns an error if the environment variable is missing, a fixture
/// cannot be read or parsed, or a store write fails.
pub async fn run(
    settings_path: &Path,
    product_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let store_url = std::env::var("NUMA_STORE_URL").map_err(|_| "NUMA_STORE_URL not set")?;
    let store = HttpCollectionStore::new(&StoreConfig {
        base_url: url::Url::parse(&store_url)
            .map_err(|e| format!("invalid NUMA_STORE_URL: {e}"))?,
    });

    let summary = seed_store(&store, settings_path, product_path).await?;

    info!("Seeding complete!");
    info!("  Settings document: {SETTINGS_PATH}");
    info!("  Product document: {}/{}", PRODUCTS_COLLECTION, summary.product_id);

    Ok(())
}

/// Seed an arbitrary collection store from the two fixtures.
///
/// # Errors
///
/// Returns an error if a fixture is unreadable, is not a JSON object,
/// or a store write fails.
pub async fn seed_store(
    store: &dyn CollectionStore,
    settings_path: &Path,
    product_path: &Path,
) -> Result<SeedSummary, Box<dyn std::error::Error>> {
    // Read and validate both fixtures before writing anything
    let mut settings = read_fixture(settings_path).await?;
    let mut product = read_fixture(product_path).await?;

    let now = Value::String(Utc::now().to_rfc3339());

    stamp(&mut settings, &[("updatedAt", &now)])?;
    stamp(&mut product, &[("createdAt", &now), ("updatedAt", &now)])?;

    info!(path = %settings_path.display(), "Writing site settings");
    store.set_document(SETTINGS_PATH, settings, true).await?;

    info!(path = %product_path.display(), "Adding sample product");
    let product_id = store.add_document(PRODUCTS_COLLECTION, product).await?;

    Ok(SeedSummary { product_id })
}

/// Read a fixture file as a JSON value.
async fn read_fixture(path: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()).into());
    }

    let contents = tokio::fs::read_to_string(path).await?;
    let value: Value = serde_json::from_str(&contents)
        .map_err(|e| format!("malformed fixture {}: {e}", path.display()))?;
    Ok(value)
}

/// Set timestamp fields on a fixture, which must be a JSON object.
fn stamp(fixture: &mut Value, fields: &[(&str, &Value)]) -> Result<(), Box<dyn std::error::Error>> {
    let Value::Object(object) = fixture else {
        return Err("fixture must be a JSON object".into());
    };
    for (key, value) in fields {
        object.insert((*key).to_owned(), (*value).clone());
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use numa_storefront::store::MemoryStore;
    use std::path::PathBuf;

    fn write_fixture(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_seed_writes_settings_and_product() {
        let dir = tempfile::tempdir().unwrap();
        let settings = write_fixture(&dir, "site-settings.json", r#"{"siteName":"Numa"}"#);
        let product = write_fixture(&dir, "sample-product.json", r#"{"title":"Oud"}"#);
        let store = MemoryStore::new();

        let summary = seed_store(&store, &settings, &product).await.unwrap();

        // Settings document carries the fixture fields plus a timestamp
        let settings_doc = store.get_document(SETTINGS_PATH).await.unwrap().unwrap();
        assert_eq!(settings_doc.get("siteName").unwrap(), "Numa");
        assert!(settings_doc.get("updatedAt").is_some());

        // Exactly one product was added, stamped on both timestamps
        let products = store.list_documents(PRODUCTS_COLLECTION).await.unwrap();
        assert_eq!(products.len(), 1);
        let (id, product_doc) = products.into_iter().next().unwrap();
        assert_eq!(id, summary.product_id);
        assert_eq!(product_doc.get("title").unwrap(), "Oud");
        assert!(product_doc.get("createdAt").is_some());
        assert!(product_doc.get("updatedAt").is_some());
    }

    #[tokio::test]
    async fn test_seed_merges_into_existing_settings() {
        let dir = tempfile::tempdir().unwrap();
        let settings = write_fixture(&dir, "site-settings.json", r#"{"siteName":"Numa"}"#);
        let product = write_fixture(&dir, "sample-product.json", r#"{"title":"Oud"}"#);
        let store = MemoryStore::new();
        store
            .set_document(
                SETTINGS_PATH,
                serde_json::json!({"tagline": "parfüm evi"}),
                false,
            )
            .await
            .unwrap();

        seed_store(&store, &settings, &product).await.unwrap();

        let settings_doc = store.get_document(SETTINGS_PATH).await.unwrap().unwrap();
        assert_eq!(settings_doc.get("siteName").unwrap(), "Numa");
        assert_eq!(settings_doc.get("tagline").unwrap(), "parfüm evi");
    }

    #[tokio::test]
    async fn test_seed_fails_on_missing_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let product = write_fixture(&dir, "sample-product.json", r#"{"title":"Oud"}"#);
        let store = MemoryStore::new();

        let result = seed_store(&store, &dir.path().join("missing.json"), &product).await;
        assert!(result.is_err());
        assert!(store.is_empty(), "nothing is written when a fixture is missing");
    }

    #[tokio::test]
    async fn test_seed_fails_on_malformed_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let settings = write_fixture(&dir, "site-settings.json", "{not json");
        let product = write_fixture(&dir, "sample-product.json", r#"{"title":"Oud"}"#);
        let store = MemoryStore::new();

        let result = seed_store(&store, &settings, &product).await;
        assert!(result.is_err());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_seed_fails_on_non_object_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let settings = write_fixture(&dir, "site-settings.json", r#"["not", "an", "object"]"#);
        let product = write_fixture(&dir, "sample-product.json", r#"{"title":"Oud"}"#);
        let store = MemoryStore::new();

        let result = seed_store(&store, &settings, &product).await;
        assert!(result.is_err());
    }
}
