use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rewind_engine::{
    Record, SettingsStore, StorageArea, StorageChange, StoreError, KEY_ENABLED,
    KEY_NOTICE_DURATION, KEY_SHOW_NOTICE,
};
use rewind_logging::{rewind_info, rewind_warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;
use tokio::sync::mpsc;

const SETTINGS_FILENAME: &str = ".rewind_settings.ron";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct PersistedSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    show_toast: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    toast_duration_ms: Option<u64>,
}

impl PersistedSettings {
    fn to_record(&self) -> Record {
        let mut record = Record::new();
        if let Some(enabled) = self.enabled {
            record.insert(KEY_ENABLED.to_string(), Value::Bool(enabled));
        }
        if let Some(show) = self.show_toast {
            record.insert(KEY_SHOW_NOTICE.to_string(), Value::Bool(show));
        }
        if let Some(ms) = self.toast_duration_ms {
            record.insert(KEY_NOTICE_DURATION.to_string(), Value::from(ms));
        }
        record
    }

    /// Applies one key; `null` clears it.
    fn apply(&mut self, key: &str, value: &Value) -> Result<(), StoreError> {
        match key {
            KEY_ENABLED => self.enabled = bool_value(key, value)?,
            KEY_SHOW_NOTICE => self.show_toast = bool_value(key, value)?,
            KEY_NOTICE_DURATION => {
                self.toast_duration_ms = match value {
                    Value::Null => None,
                    other => Some(other.as_u64().ok_or_else(|| {
                        StoreError::Rejected(format!("{key} expects milliseconds, got {other}"))
                    })?),
                }
            }
            _ => return Err(StoreError::Rejected(format!("unknown key {key}"))),
        }
        Ok(())
    }
}

fn bool_value(key: &str, value: &Value) -> Result<Option<bool>, StoreError> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(flag) => Ok(Some(*flag)),
        other => Err(StoreError::Rejected(format!(
            "{key} expects a boolean, got {other}"
        ))),
    }
}

/// Settings persisted as a RON file, reported under [`StorageArea::Local`].
pub struct RonSettingsStore {
    path: PathBuf,
    inner: Mutex<StoreInner>,
}

struct StoreInner {
    current: PersistedSettings,
    subscribers: Vec<mpsc::UnboundedSender<StorageChange>>,
}

impl RonSettingsStore {
    /// Loads `{dir}/.rewind_settings.ron`. A missing or unparsable file starts empty.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        let path = dir.join(SETTINGS_FILENAME);
        let current = load(&path)?;
        Ok(Self {
            path,
            inner: Mutex::new(StoreInner {
                current,
                subscribers: Vec::new(),
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn load(path: &Path) -> Result<PersistedSettings, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Ok(PersistedSettings::default());
        }
        Err(err) => return Err(StoreError::Io(err)),
    };

    match ron::from_str(&content) {
        Ok(settings) => {
            rewind_info!("Loaded settings from {:?}", path);
            Ok(settings)
        }
        Err(err) => {
            rewind_warn!("Failed to parse settings from {:?}: {}", path, err);
            Ok(PersistedSettings::default())
        }
    }
}

/// Writes through a temp file in the same directory, then renames it over `path`.
fn save(path: &Path, settings: &PersistedSettings) -> Result<(), StoreError> {
    let dir = path
        .parent()
        .ok_or_else(|| StoreError::Unavailable(format!("{path:?} has no parent directory")))?;
    fs::create_dir_all(dir)?;

    let content = ron::ser::to_string_pretty(settings, ron::ser::PrettyConfig::new())
        .map_err(|err| StoreError::Corrupt(err.to_string()))?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path).map_err(|err| StoreError::Io(err.error))?;
    Ok(())
}

#[async_trait]
impl SettingsStore for RonSettingsStore {
    async fn get(&self, keys: &[&str]) -> Result<Record, StoreError> {
        let record = self.lock().current.to_record();
        Ok(record
            .into_iter()
            .filter(|(key, _)| keys.contains(&key.as_str()))
            .collect())
    }

    async fn set(&self, record: Record) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let mut next = inner.current.clone();
        for (key, value) in &record {
            next.apply(key, value)?;
        }
        if next == inner.current {
            return Ok(());
        }
        save(&self.path, &next)?;

        let before = inner.current.to_record();
        let after = next.to_record();
        inner.current = next;

        for key in [KEY_ENABLED, KEY_SHOW_NOTICE, KEY_NOTICE_DURATION] {
            let old_value = before.get(key).cloned();
            let new_value = after.get(key).cloned();
            if old_value == new_value {
                continue;
            }
            let change = StorageChange {
                area: StorageArea::Local,
                key: key.to_string(),
                old_value,
                new_value,
            };
            inner
                .subscribers
                .retain(|subscriber| subscriber.send(change.clone()).is_ok());
        }
        Ok(())
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<StorageChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().subscribers.push(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn record(values: Value) -> Record {
        serde_json::from_value(values).expect("record")
    }

    #[tokio::test]
    async fn missing_file_starts_empty() {
        let dir = TempDir::new().expect("tempdir");
        let store = RonSettingsStore::open(dir.path()).expect("open");
        let values = store.get(&[KEY_ENABLED]).await.expect("get");
        assert!(values.is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn values_survive_reopen() {
        let dir = TempDir::new().expect("tempdir");
        let store = RonSettingsStore::open(dir.path()).expect("open");
        store
            .set(record(json!({ "enabled": false, "toastDurationMs": 3000 })))
            .await
            .expect("set");
        drop(store);

        let reopened = RonSettingsStore::open(dir.path()).expect("reopen");
        let values = reopened
            .get(&[KEY_ENABLED, KEY_SHOW_NOTICE, KEY_NOTICE_DURATION])
            .await
            .expect("get");
        assert_eq!(
            values,
            record(json!({ "enabled": false, "toastDurationMs": 3000 }))
        );
    }

    #[tokio::test]
    async fn unparsable_file_is_ignored() {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join(SETTINGS_FILENAME), "not ron at all {").expect("write");

        let store = RonSettingsStore::open(dir.path()).expect("open");
        let values = store.get(&[KEY_ENABLED]).await.expect("get");
        assert!(values.is_empty());
    }

    #[tokio::test]
    async fn changes_are_reported_per_key_under_local_area() {
        let dir = TempDir::new().expect("tempdir");
        let store = RonSettingsStore::open(dir.path()).expect("open");
        let mut changes = store.subscribe();

        store
            .set(record(json!({ "enabled": true, "showToast": false })))
            .await
            .expect("set");
        store
            .set(record(json!({ "enabled": true })))
            .await
            .expect("set unchanged");
        store
            .set(record(json!({ "enabled": null })))
            .await
            .expect("clear");

        let mut seen = Vec::new();
        while let Ok(change) = changes.try_recv() {
            seen.push((change.area, change.key, change.old_value, change.new_value));
        }
        assert_eq!(
            seen,
            vec![
                (StorageArea::Local, KEY_ENABLED.to_string(), None, Some(json!(true))),
                (StorageArea::Local, KEY_SHOW_NOTICE.to_string(), None, Some(json!(false))),
                (StorageArea::Local, KEY_ENABLED.to_string(), Some(json!(true)), None),
            ]
        );
    }

    #[tokio::test]
    async fn wrong_typed_values_are_rejected_without_writing() {
        let dir = TempDir::new().expect("tempdir");
        let store = RonSettingsStore::open(dir.path()).expect("open");

        let err = store
            .set(record(json!({ "enabled": "yes" })))
            .await
            .expect_err("rejected");
        assert!(matches!(err, StoreError::Rejected(_)));

        let err = store
            .set(record(json!({ "customCss": "body {}" })))
            .await
            .expect_err("unknown key");
        assert!(matches!(err, StoreError::Rejected(_)));
        assert!(!store.path().exists());
    }
}
