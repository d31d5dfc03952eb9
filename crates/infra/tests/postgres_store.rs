//! Postgres store tests. Skipped unless `AGRISYNC_TEST_DATABASE_URL` points
//! at a scratch database (the schema is applied, existing rows are kept).

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use agrisync_crops::{InputUsedRequest, NewCrop, NewField};
use agrisync_infra::{
    CropStore, FieldStore, InputLedger, InputRecorder, InventoryStore, PostgresFarmStore,
    RecordError, StoreError,
};
use agrisync_inventory::{InventoryItemPatch, NewInventoryItem};

async fn store() -> Option<Arc<PostgresFarmStore>> {
    let url = std::env::var("AGRISYNC_TEST_DATABASE_URL").ok()?;
    let store = PostgresFarmStore::connect(&url, 8).await.expect("connect");
    store.migrate().await.expect("migrate");
    Some(Arc::new(store))
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()
}

#[tokio::test]
async fn migrate_is_idempotent() {
    let Some(store) = store().await else { return };
    store.migrate().await.unwrap();
}

#[tokio::test]
async fn recorder_scenario_against_postgres() {
    let Some(store) = store().await else { return };
    let field = store.create_field(NewField::new("North", None).unwrap()).await.unwrap();
    let crop = store
        .create_crop(NewCrop::new("Maize", field.id, date(), date(), None).unwrap())
        .await
        .unwrap();
    let item = store
        .create_item(NewInventoryItem::new("Urea", dec!(100)).unwrap())
        .await
        .unwrap();
    let recorder = InputRecorder::new(store.clone());

    let detail = recorder
        .record_input(crop.id, InputUsedRequest::new(item.id, dec!(40), date()).unwrap())
        .await
        .unwrap();
    assert_eq!(detail.inventory_item.unwrap().quantity.value(), dec!(60));

    let err = recorder
        .record_input(crop.id, InputUsedRequest::new(item.id, dec!(70), date()).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, RecordError::Validation(_)));
    assert_eq!(store.get_item(item.id).await.unwrap().quantity.value(), dec!(60));

    store.delete_item(item.id).await.unwrap();
    let entries = store.list_inputs_for_crop(crop.id).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].inventory_item.is_none());

    store.delete_field(field.id).await.unwrap();
    assert_eq!(store.get_crop(crop.id).await, Err(StoreError::NotFound));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_consumption_is_serialised() {
    let Some(store) = store().await else { return };
    let field = store.create_field(NewField::new("East", None).unwrap()).await.unwrap();
    let crop = store
        .create_crop(NewCrop::new("Beans", field.id, date(), date(), None).unwrap())
        .await
        .unwrap();
    let item = store
        .create_item(NewInventoryItem::new("Seed", dec!(50)).unwrap())
        .await
        .unwrap();
    let recorder = InputRecorder::new(store.clone());

    let mut handles = Vec::new();
    for _ in 0..10 {
        let recorder = recorder.clone();
        let (crop_id, item_id) = (crop.id, item.id);
        handles.push(tokio::spawn(async move {
            recorder
                .record_input(crop_id, InputUsedRequest::new(item_id, dec!(10), date()).unwrap())
                .await
        }));
    }

    let mut successes = 0i64;
    for h in handles {
        if h.await.unwrap().is_ok() {
            successes += 1;
        }
    }

    let remaining = store.get_item(item.id).await.unwrap().quantity.value();
    assert_eq!(remaining, dec!(50) - dec!(10) * Decimal::from(successes));
    assert!(remaining >= Decimal::ZERO);
    assert_eq!(
        store.list_inputs_for_crop(crop.id).await.unwrap().len() as i64,
        successes
    );
}

#[tokio::test]
async fn item_edits_never_undo_a_recorded_decrement() {
    let Some(store) = store().await else { return };
    let field = store.create_field(NewField::new("West", None).unwrap()).await.unwrap();
    let crop = store
        .create_crop(NewCrop::new("Sorghum", field.id, date(), date(), None).unwrap())
        .await
        .unwrap();
    let item = store
        .create_item(NewInventoryItem::new("Urea", dec!(100)).unwrap())
        .await
        .unwrap();
    let read = store.get_item(item.id).await.unwrap();

    InputRecorder::new(store.clone())
        .record_input(crop.id, InputUsedRequest::new(item.id, dec!(40), date()).unwrap())
        .await
        .unwrap();

    let rename = InventoryItemPatch {
        name: Some("Urea 46%".to_string()),
        quantity: None,
    };
    let renamed = store.update_item(rename.plan(&read).unwrap()).await.unwrap();
    assert_eq!(renamed.name, "Urea 46%");
    assert_eq!(renamed.quantity.value(), dec!(60));

    let stale = InventoryItemPatch {
        name: None,
        quantity: Some(dec!(100)),
    };
    let err = store.update_item(stale.plan(&read).unwrap()).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
    assert_eq!(store.get_item(item.id).await.unwrap().quantity.value(), dec!(60));
}
