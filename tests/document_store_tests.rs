use shopping_list::store::models::{Item, ItemUpdate, Patch, Quantity};
use shopping_list::store::{DocumentStore, StoreError};

fn test_store() -> (tempfile::TempDir, DocumentStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = DocumentStore::open(dir.path().join("data")).unwrap();
    (dir, store)
}

fn sample_item(id: &str, name: &str) -> Item {
    Item {
        id: id.to_string(),
        name: name.to_string(),
        quantity: Quantity::Text("2".to_string()),
        category: Some("Dairy".to_string()),
        image: None,
    }
}

#[tokio::test]
async fn test_fresh_store_is_empty() {
    let (_dir, store) = test_store();
    assert!(store.load().await.unwrap().is_empty());
}

#[test]
fn test_open_initializes_collection_file() {
    let dir = tempfile::tempdir().unwrap();
    let store = DocumentStore::open(dir.path().join("data")).unwrap();
    assert_eq!(std::fs::read(store.path()).unwrap(), b"[]");
}

#[tokio::test]
async fn test_missing_file_loads_as_empty() {
    let (_dir, store) = test_store();
    std::fs::remove_file(store.path()).unwrap();
    assert!(store.load().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_append_and_load() {
    let (_dir, store) = test_store();
    store.append(sample_item("item-1", "Milk")).await.unwrap();

    let items = store.load().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, "item-1");
    assert_eq!(items[0].name, "Milk");
    assert_eq!(items[0].quantity, Quantity::Text("2".to_string()));
    assert_eq!(items[0].category, Some("Dairy".to_string()));
    assert_eq!(items[0].image, None);
}

#[tokio::test]
async fn test_append_preserves_insertion_order() {
    let (_dir, store) = test_store();
    store.append(sample_item("a", "Milk")).await.unwrap();
    store.append(sample_item("b", "Bread")).await.unwrap();
    store.append(sample_item("c", "Eggs")).await.unwrap();

    let ids: Vec<String> = store
        .load()
        .await
        .unwrap()
        .into_iter()
        .map(|item| item.id)
        .collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_update_merges_provided_fields() {
    let (_dir, store) = test_store();
    store.append(sample_item("item-2", "Milk")).await.unwrap();

    let outcome = store
        .update(
            "item-2",
            ItemUpdate {
                quantity: Some(Quantity::Text("3".to_string())),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("item should exist");

    // Untouched fields keep their previous values
    assert_eq!(outcome.item.name, "Milk");
    assert_eq!(outcome.item.quantity, Quantity::Text("3".to_string()));
    assert_eq!(outcome.item.category, Some("Dairy".to_string()));
    assert!(outcome.superseded_image.is_none());

    let items = store.load().await.unwrap();
    assert_eq!(items[0], outcome.item);
}

#[tokio::test]
async fn test_update_category_patch() {
    let (_dir, store) = test_store();
    store.append(sample_item("item-3", "Milk")).await.unwrap();

    // Absent leaves the category alone
    let outcome = store
        .update("item-3", ItemUpdate::default())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome.item.category, Some("Dairy".to_string()));

    // Null clears it
    let outcome = store
        .update(
            "item-3",
            ItemUpdate {
                category: Patch::Null,
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome.item.category, None);

    // Value sets a new one
    let outcome = store
        .update(
            "item-3",
            ItemUpdate {
                category: Patch::Value("Bakery".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outcome.item.category, Some("Bakery".to_string()));
}

#[tokio::test]
async fn test_update_reports_superseded_image() {
    let (_dir, store) = test_store();
    let mut item = sample_item("item-4", "Milk");
    item.image = Some("old.png".to_string());
    store.append(item).await.unwrap();

    let outcome = store
        .update(
            "item-4",
            ItemUpdate {
                image: Some("new.png".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.item.image, Some("new.png".to_string()));
    assert_eq!(outcome.superseded_image, Some("old.png".to_string()));
}

#[tokio::test]
async fn test_update_without_image_keeps_reference() {
    let (_dir, store) = test_store();
    let mut item = sample_item("item-5", "Milk");
    item.image = Some("keep.png".to_string());
    store.append(item).await.unwrap();

    let outcome = store
        .update(
            "item-5",
            ItemUpdate {
                name: Some("Oat milk".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.item.image, Some("keep.png".to_string()));
    assert!(outcome.superseded_image.is_none());
}

#[tokio::test]
async fn test_update_unknown_id_leaves_collection_unchanged() {
    let (_dir, store) = test_store();
    store.append(sample_item("item-6", "Milk")).await.unwrap();
    let before = store.load().await.unwrap();

    let outcome = store
        .update(
            "nonexistent",
            ItemUpdate {
                name: Some("Ghost".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(outcome.is_none());
    assert_eq!(store.load().await.unwrap(), before);
}

#[tokio::test]
async fn test_remove() {
    let (_dir, store) = test_store();
    store.append(sample_item("item-7", "Milk")).await.unwrap();
    store.append(sample_item("item-8", "Bread")).await.unwrap();

    let removed = store.remove("item-7").await.unwrap().expect("should remove");
    assert_eq!(removed.id, "item-7");

    let remaining = store.load().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, "item-8");
}

#[tokio::test]
async fn test_remove_unknown_id() {
    let (_dir, store) = test_store();
    store.append(sample_item("item-9", "Milk")).await.unwrap();

    assert!(store.remove("nonexistent").await.unwrap().is_none());
    assert_eq!(store.load().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_corrupt_file_is_an_error_not_a_reset() {
    let (_dir, store) = test_store();
    store.append(sample_item("item-10", "Milk")).await.unwrap();
    std::fs::write(store.path(), b"{ not json").unwrap();

    let err = store.load().await.expect_err("corrupt file must not load");
    assert!(matches!(err, StoreError::Decode(_)));

    // The broken file is left in place for inspection, never wiped
    assert_eq!(std::fs::read(store.path()).unwrap(), b"{ not json");
}

#[tokio::test]
async fn test_quantity_number_survives_round_trip() {
    let (_dir, store) = test_store();
    let mut item = sample_item("item-11", "Eggs");
    item.quantity = Quantity::Number(12.into());
    store.append(item).await.unwrap();

    let items = store.load().await.unwrap();
    assert_eq!(items[0].quantity, Quantity::Number(12.into()));
}

#[tokio::test]
async fn test_records_without_category_still_load() {
    let (_dir, store) = test_store();
    // An older record, written before the category field existed
    std::fs::write(
        store.path(),
        br#"[{"id": "legacy", "name": "Milk", "quantity": "1", "image": null}]"#,
    )
    .unwrap();

    let items = store.load().await.unwrap();
    assert_eq!(items[0].id, "legacy");
    assert_eq!(items[0].category, None);
}

#[tokio::test]
async fn test_interrupted_replace_never_corrupts_collection() {
    let (_dir, store) = test_store();
    store.append(sample_item("item-12", "Milk")).await.unwrap();

    // A crash between the temp-file write and the rename leaves only a stray
    // temp file behind; the collection itself never holds partial output
    let data_dir = store.path().parent().unwrap();
    std::fs::write(
        data_dir.join("shopping-list.deadbeef.tmp"),
        b"[{\"id\": \"trunca",
    )
    .unwrap();

    let items = store.load().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, "item-12");
}

#[tokio::test]
async fn test_failed_write_leaves_previous_state_intact() {
    let (_dir, store) = test_store();
    store.append(sample_item("item-13", "Milk")).await.unwrap();
    let saved = std::fs::read(store.path()).unwrap();

    // Swap the collection file for a directory so the write cycle fails
    std::fs::remove_file(store.path()).unwrap();
    std::fs::create_dir(store.path()).unwrap();

    let result = store.append(sample_item("item-14", "Bread")).await;
    assert!(result.is_err());

    std::fs::remove_dir(store.path()).unwrap();
    std::fs::write(store.path(), &saved).unwrap();

    // The collection still holds exactly the pre-write content
    let items = store.load().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, "item-13");
}
