use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use rewind_engine::{
    MemorySettingsStore, Record, Settings, SettingsChange, SettingsGate, SettingsStore,
    StorageArea, StorageChange, StoreError, KEY_ENABLED, KEY_NOTICE_DURATION,
};
use serde_json::{json, Value};

fn record(values: Value) -> Record {
    serde_json::from_value(values).expect("record")
}

fn change(area: StorageArea, key: &str, old: Option<Value>, new: Option<Value>) -> StorageChange {
    StorageChange {
        area,
        key: key.to_string(),
        old_value: old,
        new_value: new,
    }
}

#[test]
fn settings_coerce_wrong_types_to_defaults() {
    let settings = Settings::from_record(&record(json!({
        "enabled": "yes",
        "showToast": 1,
        "toastDurationMs": "slow",
    })));
    assert_eq!(settings, Settings::default());
}

#[test]
fn notice_duration_is_clamped() {
    let short = Settings::from_record(&record(json!({ "toastDurationMs": 10 })));
    assert_eq!(short.notice_duration, Duration::from_millis(1000));

    let long = Settings::from_record(&record(json!({ "toastDurationMs": 60_000 })));
    assert_eq!(long.notice_duration, Duration::from_millis(10_000));

    let fractional = Settings::from_record(&record(json!({ "toastDurationMs": 2500.4 })));
    assert_eq!(fractional.notice_duration, Duration::from_millis(2500));
}

#[test]
fn settings_read_explicit_values() {
    let settings = Settings::from_record(&record(json!({
        "enabled": false,
        "showToast": false,
        "toastDurationMs": 4000,
    })));
    assert!(!settings.enabled);
    assert!(!settings.show_notice);
    assert_eq!(settings.notice_duration, Duration::from_millis(4000));
}

#[tokio::test]
async fn gate_defaults_to_enabled() {
    let store = Arc::new(MemorySettingsStore::new(StorageArea::Sync));
    let gate = SettingsGate::new(store.clone());
    assert!(gate.is_enabled().await);

    store.write(KEY_ENABLED, json!(false));
    assert!(!gate.is_enabled().await);

    store.write(KEY_ENABLED, json!("off"));
    assert!(gate.is_enabled().await);
}

#[tokio::test]
async fn gate_fails_open_when_store_is_unreadable() {
    let store = Arc::new(MemorySettingsStore::with_values(
        StorageArea::Local,
        record(json!({ "enabled": false, "showToast": false })),
    ));
    store.set_failing(true);
    let gate = SettingsGate::new(store);

    assert!(gate.is_enabled().await);
    assert_eq!(gate.load().await, Settings::default());
    assert!(matches!(
        gate.try_load().await,
        Err(StoreError::Unavailable(_))
    ));
}

#[tokio::test]
async fn try_load_reads_stored_values() {
    let store = Arc::new(MemorySettingsStore::with_values(
        StorageArea::Sync,
        record(json!({ "showToast": false, "toastDurationMs": 4000 })),
    ));
    let gate = SettingsGate::new(store);

    let settings = gate.try_load().await.expect("readable store");
    assert!(!settings.show_notice);
    assert_eq!(settings.notice_duration, Duration::from_millis(4000));
}

#[tokio::test]
async fn store_reports_only_real_changes() {
    let store = MemorySettingsStore::new(StorageArea::Local);
    let mut changes = store.subscribe();

    store
        .set(record(json!({ "enabled": false, "toastDurationMs": 3000 })))
        .await
        .expect("set");
    store.write(KEY_ENABLED, json!(false));
    store.remove(KEY_NOTICE_DURATION);

    let mut seen = Vec::new();
    while let Ok(change) = changes.try_recv() {
        seen.push(change);
    }
    assert_eq!(
        seen,
        vec![
            change(StorageArea::Local, "enabled", None, Some(json!(false))),
            change(StorageArea::Local, "toastDurationMs", None, Some(json!(3000))),
            change(StorageArea::Local, "toastDurationMs", Some(json!(3000)), None),
        ]
    );
}

#[tokio::test]
async fn store_get_returns_only_requested_keys() {
    let store = MemorySettingsStore::with_values(
        StorageArea::Sync,
        record(json!({ "enabled": true, "customCss": "body {}" })),
    );
    let values = store.get(&[KEY_ENABLED, KEY_NOTICE_DURATION]).await.expect("get");
    assert_eq!(values, record(json!({ "enabled": true })));
}

#[test]
fn classify_treats_sync_and_local_alike() {
    for area in [StorageArea::Sync, StorageArea::Local] {
        assert_eq!(
            SettingsGate::classify(&change(area, "enabled", Some(json!(false)), Some(json!(true)))),
            Some(SettingsChange::Enabled {
                old: Some(false),
                new: Some(true)
            })
        );
    }
}

#[test]
fn classify_ignores_foreign_areas_and_keys() {
    assert_eq!(
        SettingsGate::classify(&change(StorageArea::Managed, "enabled", None, Some(json!(false)))),
        None
    );
    assert_eq!(
        SettingsGate::classify(&change(StorageArea::Sync, "customCss", None, Some(json!("a")))),
        None
    );
    assert_eq!(
        SettingsGate::classify(&change(StorageArea::Sync, "showToast", None, Some(json!(false)))),
        Some(SettingsChange::Notice)
    );
}

#[test]
fn classify_coerces_non_boolean_values_to_unknown() {
    assert_eq!(
        SettingsGate::classify(&change(StorageArea::Sync, "enabled", Some(json!(0)), None)),
        Some(SettingsChange::Enabled {
            old: None,
            new: None
        })
    );
}
