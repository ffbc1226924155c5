use super::*;
use crate::error::StorageError;
use crate::storage::MemoryStore;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use vitrine_client::TransportOptions;

/// Client pointed at a closed port: any network use fails fast.
fn offline_client() -> ApiClient {
    let options = TransportOptions {
        max_retries: 0,
        backoff_base_secs: 0,
        ..TransportOptions::default()
    };
    ApiClient::with_base_url("http://127.0.0.1:1/api", options).unwrap()
}

fn product(id: &str, price: f64) -> Product {
    serde_json::from_value(json!({"_id": id, "name": id, "price": price})).unwrap()
}

fn local_store(storage: Arc<dyn KeyValueStore>) -> CartStore {
    CartStore::new(offline_client(), storage, CartStoreOptions::default())
}

/// Store whose writes can be switched to fail.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io {
                path: key.into(),
                source: std::io::Error::other("disk full"),
            });
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key)
    }
}

#[tokio::test]
async fn adding_same_product_twice_merges_into_one_line() {
    let store = local_store(Arc::new(MemoryStore::new()));
    let a = product("A", 25.0);

    store.add_item(&a, 1, None, None).await.unwrap();
    store.add_item(&a, 2, None, None).await.unwrap();

    let cart = store.cart();
    assert_eq!(cart.item_count(), 1);
    assert_eq!(cart.items()[0].quantity, 3);
    assert!((cart.total_price() - 75.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn quantities_two_and_three_yield_five() {
    let store = local_store(Arc::new(MemoryStore::new()));
    let a = product("A", 10.0);
    store.add_item(&a, 2, Some("M"), Some("red")).await.unwrap();
    store.add_item(&a, 3, Some("M"), Some("red")).await.unwrap();

    let line = store.get_cart_item("A", Some("M"), Some("red")).unwrap();
    assert_eq!(line.quantity, 5);
    assert_eq!(store.cart().item_count(), 1);
}

#[tokio::test]
async fn local_mutations_are_persisted() {
    let storage = Arc::new(MemoryStore::new());
    let store = local_store(storage.clone());
    store
        .add_item(&product("A", 5.0), 2, Some("L"), None)
        .await
        .unwrap();

    let stored: Value = serde_json::from_str(&storage.get("cart").unwrap().unwrap()).unwrap();
    assert_eq!(stored[0]["product"]["_id"], "A");
    assert_eq!(stored[0]["quantity"], 2);
    assert_eq!(stored[0]["size"], "L");

    // A fresh store over the same storage sees the same cart.
    let reopened = local_store(storage);
    reopened.reload().await.unwrap();
    assert!(reopened.is_in_cart("A", Some("L"), None));
}

#[tokio::test]
async fn removing_unknown_key_is_a_silent_no_op() {
    let store = local_store(Arc::new(MemoryStore::new()));
    store
        .add_item(&product("A", 5.0), 1, Some("M"), None)
        .await
        .unwrap();
    let before = store.cart();

    store.remove_item("A", Some("L"), None).await.unwrap();
    store.remove_item("B", None, None).await.unwrap();

    assert_eq!(store.cart(), before);
    assert_eq!(store.status().error, None);
}

#[tokio::test]
async fn remove_requires_exact_variant() {
    let store = local_store(Arc::new(MemoryStore::new()));
    let a = product("A", 5.0);
    store.add_item(&a, 1, Some("M"), None).await.unwrap();
    store.add_item(&a, 1, Some("L"), None).await.unwrap();

    store.remove_item("A", Some("M"), None).await.unwrap();

    assert!(!store.is_in_cart("A", Some("M"), None));
    assert!(store.is_in_cart("A", Some("L"), None));
}

#[tokio::test]
async fn update_quantity_sets_rather_than_adds() {
    let store = local_store(Arc::new(MemoryStore::new()));
    store.add_item(&product("A", 5.0), 4, None, None).await.unwrap();

    store.update_quantity("A", 2, None, None).await.unwrap();

    assert_eq!(store.get_cart_item("A", None, None).unwrap().quantity, 2);
}

#[tokio::test]
async fn update_quantity_to_zero_or_below_removes_line() {
    let store = local_store(Arc::new(MemoryStore::new()));
    store.add_item(&product("A", 5.0), 4, None, None).await.unwrap();
    store.add_item(&product("B", 5.0), 1, None, None).await.unwrap();

    store.update_quantity("A", 0, None, None).await.unwrap();
    store.update_quantity("B", -3, None, None).await.unwrap();

    assert!(store.cart().is_empty());
}

#[tokio::test]
async fn update_quantity_for_absent_line_is_a_no_op() {
    let store = local_store(Arc::new(MemoryStore::new()));
    store.update_quantity("ghost", 3, None, None).await.unwrap();
    assert!(store.cart().is_empty());
}

#[tokio::test]
async fn zero_quantity_add_is_ignored() {
    let store = local_store(Arc::new(MemoryStore::new()));
    store.add_item(&product("A", 5.0), 0, None, None).await.unwrap();
    assert!(store.cart().is_empty());
}

#[tokio::test]
async fn clear_cart_empties_local_store() {
    let storage = Arc::new(MemoryStore::new());
    let store = local_store(storage.clone());
    store.add_item(&product("A", 5.0), 1, None, None).await.unwrap();

    store.clear_cart().await.unwrap();

    assert!(store.cart().is_empty());
    assert_eq!(storage.get("cart").unwrap().as_deref(), Some("[]"));
}

#[tokio::test]
async fn failed_local_write_keeps_last_good_cart_and_records_error() {
    let storage = Arc::new(FlakyStore::default());
    let store = local_store(storage.clone());
    let a = product("A", 5.0);
    store.add_item(&a, 1, None, None).await.unwrap();
    let before = store.cart();

    storage.fail_writes.store(true, Ordering::SeqCst);
    let err = store.add_item(&a, 5, None, None).await.unwrap_err();
    assert!(matches!(err, CartError::Storage(_)));
    assert_eq!(store.cart(), before);

    let status = store.status();
    assert!(!status.loading);
    assert_eq!(
        status.error.as_deref(),
        Some("could not save your cart on this device")
    );

    storage.fail_writes.store(false, Ordering::SeqCst);
    store.add_item(&a, 1, None, None).await.unwrap();
    assert_eq!(store.status().error, None);
    assert_eq!(store.get_cart_item("A", None, None).unwrap().quantity, 2);
}

#[tokio::test]
async fn corrupt_stored_cart_loads_as_empty() {
    let storage = Arc::new(MemoryStore::new());
    storage.set("cart", "{{{ definitely not json").unwrap();
    let store = local_store(storage);

    store.reload().await.unwrap();

    assert!(store.cart().is_empty());
    assert_eq!(store.status().error, None);
}

#[tokio::test]
async fn stored_cart_with_bad_line_keeps_the_good_ones() {
    let storage = Arc::new(MemoryStore::new());
    storage
        .set(
            "cart",
            &json!([
                {"product": {"_id": "A", "price": 3}, "quantity": 2},
                {"product": {"_id": "B", "price": 3}, "quantity": 0},
                {"product": {"_id": "A", "price": 3}, "quantity": 1}
            ])
            .to_string(),
        )
        .unwrap();
    let store = local_store(storage);

    store.reload().await.unwrap();

    let cart = store.cart();
    assert_eq!(cart.item_count(), 1);
    assert_eq!(cart.items()[0].quantity, 3);
}

#[tokio::test]
async fn initialize_offline_stays_local() {
    let storage = Arc::new(MemoryStore::new());
    storage
        .set(
            "cart",
            &json!([{"product": {"_id": "A", "price": 3}, "quantity": 2}]).to_string(),
        )
        .unwrap();
    let store = local_store(storage);

    let mode = store.initialize().await.unwrap();

    assert_eq!(mode, AuthMode::Unauthenticated);
    assert!(store.is_in_cart("A", None, None));
}

#[tokio::test]
async fn concurrent_mutations_apply_in_issue_order() {
    let store = Arc::new(local_store(Arc::new(MemoryStore::new())));
    let a = product("A", 1.0);

    let mut handles = Vec::new();
    for _ in 0..20 {
        let store = Arc::clone(&store);
        let a = a.clone();
        handles.push(tokio::spawn(async move {
            store.add_item(&a, 1, None, None).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.get_cart_item("A", None, None).unwrap().quantity, 20);
}
