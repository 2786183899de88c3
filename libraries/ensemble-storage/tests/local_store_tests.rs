//! Integration tests for the key/value collection store


use ensemble_core::{Backend, ClubError, Collection, CollectionStore};
use serde_json::{json, Value};
use std::sync::Arc;
use test_helpers::TestDb;

#[tokio::test]
async fn missing_collection_loads_as_none() {
    let db = TestDb::new().await;
    let store = db.local();
    assert_eq!(store.backend(), Backend::Local);
    assert!(store.load_raw(Collection::Songs).await.unwrap().is_none());
}

#[tokio::test]
async fn save_then_load_returns_value() {
    let db = TestDb::new().await;
    let store = db.local();
    let songs = json!([{ "id": "s1", "title": "Song A", "artist": "Band X" }]);

    store.save_raw(Collection::Songs, songs.clone()).await.unwrap();
    store
        .save_raw(Collection::Session, json!({ "name": "민수" }))
        .await
        .unwrap();

    assert_eq!(store.load_raw(Collection::Songs).await.unwrap(), Some(songs));
    assert_eq!(
        store.load_raw(Collection::Session).await.unwrap(),
        Some(json!({ "name": "민수" }))
    );
}

#[tokio::test]
async fn overwrite_replaces_previous_value() {
    let db = TestDb::new().await;
    let store = db.local();
    store.save_raw(Collection::Logs, json!([1, 2, 3])).await.unwrap();
    store.save_raw(Collection::Logs, json!([4])).await.unwrap();
    assert_eq!(store.load_raw(Collection::Logs).await.unwrap(), Some(json!([4])));
}

#[tokio::test]
async fn corrupt_value_falls_back_to_default() {
    let db = TestDb::new().await;
    sqlx::query("INSERT INTO collections (name, value, updated_at) VALUES (?, ?, 0)")
        .bind(Collection::Users.local_key())
        .bind("{not json")
        .execute(&db.pool)
        .await
        .unwrap();

    let store: Arc<dyn CollectionStore> = Arc::new(db.local());
    let users: Vec<Value> = store.load_or(Collection::Users, Vec::new()).await.unwrap();
    assert!(users.is_empty());
}

#[tokio::test]
async fn load_list_skips_undecodable_elements() {
    let db = TestDb::new().await;
    let store: Arc<dyn CollectionStore> = Arc::new(db.local());
    store
        .save_raw(Collection::Logs, json!([1, "x", 2]))
        .await
        .unwrap();
    let items: Vec<u32> = store.load_list(Collection::Logs).await.unwrap();
    assert_eq!(items, vec![1, 2]);
}

#[tokio::test]
async fn remove_deletes_collection() {
    let db = TestDb::new().await;
    let store = db.local();
    store.save_raw(Collection::Posts, json!([])).await.unwrap();
    store.remove(Collection::Posts).await.unwrap();
    assert!(store.load_raw(Collection::Posts).await.unwrap().is_none());
}

#[tokio::test]
async fn local_store_has_no_live_updates() {
    let db = TestDb::new().await;
    let err = db.local().subscribe(Collection::Songs, None).await.unwrap_err();
    assert!(matches!(err, ClubError::Unsupported(_)));
}

#[tokio::test]
async fn batch_writes_every_collection() {
    let db = TestDb::new().await;
    let store = db.local();
    store
        .save_batch(vec![
            (Collection::Users, json!([{ "id": "u1" }])),
            (Collection::Logs, json!([{ "id": "l1" }])),
        ])
        .await
        .unwrap();
    assert_eq!(
        store.load_raw(Collection::Users).await.unwrap(),
        Some(json!([{ "id": "u1" }]))
    );
    assert_eq!(
        store.load_raw(Collection::Logs).await.unwrap(),
        Some(json!([{ "id": "l1" }]))
    );
}

#[tokio::test]
async fn failed_batch_writes_nothing() {
    let db = TestDb::new().await;
    sqlx::query(
        "CREATE TRIGGER reject_logs BEFORE INSERT ON collections
         WHEN NEW.name = 'admin_logs_v1'
         BEGIN SELECT RAISE(ABORT, 'logs unavailable'); END",
    )
    .execute(&db.pool)
    .await
    .unwrap();

    let store = db.local();
    let result = store
        .save_batch(vec![
            (Collection::Users, json!([{ "id": "u1" }])),
            (Collection::Logs, json!([{ "id": "l1" }])),
        ])
        .await;
    assert!(result.is_err());
    assert!(store.load_raw(Collection::Users).await.unwrap().is_none());
}
