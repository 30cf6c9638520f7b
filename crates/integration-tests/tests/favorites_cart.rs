//! Integration tests for the favorites and cart façades plus catalog
//! reads, all over the in-memory collection store.

use std::sync::Arc;

use numa_core::{CartLine, Email, ProductId, UserId, cart_count};
use numa_storefront::store::{
    Catalog, CartStore, CollectionStore, FavoritesStore, MemoryStore, PRODUCTS_COLLECTION,
    SETTINGS_PATH,
};
use serde_json::json;

fn user_key() -> (UserId, Email) {
    (
        UserId::new("u-ayse"),
        Email::parse("ayse@x.com").expect("valid test email"),
    )
}

// =============================================================================
// Favorites
// =============================================================================

#[tokio::test]
async fn test_toggle_favorite_full_cycle() {
    let store: Arc<dyn CollectionStore> = Arc::new(MemoryStore::new());
    let favorites = FavoritesStore::new(store);
    let (user, email) = user_key();
    let oud = ProductId::new("oud-50ml");

    // toggle -> true, toggle -> false; contains reflects each step
    assert!(favorites.toggle(&user, &email, &oud).await.expect("toggle"));
    assert!(favorites.contains(&user, &email, &oud).await.expect("contains"));

    assert!(!favorites.toggle(&user, &email, &oud).await.expect("toggle"));
    assert!(!favorites.contains(&user, &email, &oud).await.expect("contains"));
}

#[tokio::test]
async fn test_favorites_survive_facade_recreation() {
    // Two façade instances over one store see the same documents, the
    // way two request handlers do.
    let store: Arc<dyn CollectionStore> = Arc::new(MemoryStore::new());
    let (user, email) = user_key();
    let oud = ProductId::new("oud-50ml");

    FavoritesStore::new(Arc::clone(&store))
        .toggle(&user, &email, &oud)
        .await
        .expect("toggle");

    let set = FavoritesStore::new(store)
        .get(&user, &email)
        .await
        .expect("get");
    assert!(set.contains(&oud));
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
async fn test_cart_count_invariant_over_operation_sequence() {
    let store: Arc<dyn CollectionStore> = Arc::new(MemoryStore::new());
    let cart = CartStore::new(store);
    let (user, email) = user_key();
    let oud = ProductId::new("oud-50ml");
    let amber = ProductId::new("amber-100ml");
    let musk = ProductId::new("musk-30ml");

    // After every mutation: count == sum of quantities of the returned
    // lines, and the store agrees on re-read.
    let lines = cart
        .add(&user, &email, CartLine::new(oud.clone(), 2))
        .await
        .expect("add");
    assert_eq!(cart_count(&lines), 2);

    let lines = cart
        .add(&user, &email, CartLine::new(amber.clone(), 3))
        .await
        .expect("add");
    assert_eq!(cart_count(&lines), 5);

    let lines = cart
        .add(&user, &email, CartLine::new(musk, 1))
        .await
        .expect("add");
    assert_eq!(cart_count(&lines), 6);

    let lines = cart
        .set_quantity(&user, &email, &amber, 1)
        .await
        .expect("set_quantity");
    assert_eq!(cart_count(&lines), 4);

    let lines = cart.remove(&user, &email, &oud).await.expect("remove");
    assert_eq!(cart_count(&lines), 2);
    assert_eq!(cart.count(&user, &email).await.expect("count"), 2);

    cart.clear(&user, &email).await.expect("clear");
    assert_eq!(cart.count(&user, &email).await.expect("count"), 0);
}

#[tokio::test]
async fn test_cart_unique_product_per_line() {
    let store: Arc<dyn CollectionStore> = Arc::new(MemoryStore::new());
    let cart = CartStore::new(store);
    let (user, email) = user_key();
    let oud = ProductId::new("oud-50ml");

    cart.add(&user, &email, CartLine::new(oud.clone(), 1))
        .await
        .expect("add");
    let lines = cart
        .add(&user, &email, CartLine::new(oud.clone(), 4))
        .await
        .expect("add");

    assert_eq!(lines, vec![CartLine::new(oud, 5)]);
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_catalog_reads_seeded_documents() {
    let store = Arc::new(MemoryStore::new());
    store
        .set_document(SETTINGS_PATH, json!({"siteName": "Numa"}), true)
        .await
        .expect("seed settings");
    store
        .add_document(
            PRODUCTS_COLLECTION,
            json!({"title": "Oud", "price": {"amount": "1250.00", "currency_code": "TRY"}}),
        )
        .await
        .expect("seed product");

    let catalog = Catalog::new(Arc::clone(&store) as Arc<dyn CollectionStore>);

    let settings = catalog
        .settings()
        .await
        .expect("settings read")
        .expect("settings present");
    assert_eq!(settings.site_name, "Numa");

    let products = catalog.products().await.expect("products read");
    assert_eq!(products.len(), 1);
    let product = products.first().expect("one product");
    assert_eq!(product.title, "Oud");
    assert!(product.id.is_some());
    assert_eq!(
        product.price.as_ref().map(numa_core::Price::display).as_deref(),
        Some("₺1250.00")
    );
}
