use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rewind_logging::rewind_warn;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

/// Key/value record as stored by the settings surface.
pub type Record = serde_json::Map<String, Value>;

pub const KEY_ENABLED: &str = "enabled";
pub const KEY_SHOW_NOTICE: &str = "showToast";
pub const KEY_NOTICE_DURATION: &str = "toastDurationMs";

const MIN_NOTICE_MS: f64 = 1000.0;
const MAX_NOTICE_MS: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageArea {
    Sync,
    Local,
    Managed,
}

impl StorageArea {
    /// Sync and local are treated the same; anything else is ignored.
    pub fn is_observed(self) -> bool {
        matches!(self, StorageArea::Sync | StorageArea::Local)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    pub area: StorageArea,
    pub key: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("settings store unavailable: {0}")]
    Unavailable(String),
    #[error("settings store is corrupt: {0}")]
    Corrupt(String),
    #[error("value rejected: {0}")]
    Rejected(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Values for `keys`; absent keys are simply missing from the record.
    async fn get(&self, keys: &[&str]) -> Result<Record, StoreError>;
    async fn set(&self, record: Record) -> Result<(), StoreError>;
    /// One change per key whose persisted value changed.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<StorageChange>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub enabled: bool,
    pub show_notice: bool,
    pub notice_duration: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            show_notice: true,
            notice_duration: Duration::from_millis(2000),
        }
    }
}

impl Settings {
    pub const KEYS: [&'static str; 3] = [KEY_ENABLED, KEY_SHOW_NOTICE, KEY_NOTICE_DURATION];

    /// Coerces a raw record; wrong-typed or missing values keep their defaults.
    pub fn from_record(record: &Record) -> Self {
        let defaults = Self::default();
        Self {
            enabled: coerce_bool(record.get(KEY_ENABLED)).unwrap_or(defaults.enabled),
            show_notice: coerce_bool(record.get(KEY_SHOW_NOTICE)).unwrap_or(defaults.show_notice),
            notice_duration: coerce_duration_ms(record.get(KEY_NOTICE_DURATION))
                .unwrap_or(defaults.notice_duration),
        }
    }
}

pub(crate) fn coerce_bool(value: Option<&Value>) -> Option<bool> {
    value.and_then(Value::as_bool)
}

fn coerce_duration_ms(value: Option<&Value>) -> Option<Duration> {
    let ms = value.and_then(Value::as_f64).filter(|ms| ms.is_finite())?;
    let clamped = ms.clamp(MIN_NOTICE_MS, MAX_NOTICE_MS);
    Some(Duration::from_millis(clamped.round() as u64))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsChange {
    Enabled { old: Option<bool>, new: Option<bool> },
    Notice,
}

/// Read-only view of the settings store used by the scheduler.
#[derive(Clone)]
pub struct SettingsGate {
    store: Arc<dyn SettingsStore>,
}

impl SettingsGate {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    /// Fails open: an unreadable store counts as enabled.
    pub async fn is_enabled(&self) -> bool {
        match self.store.get(&[KEY_ENABLED]).await {
            Ok(record) => coerce_bool(record.get(KEY_ENABLED)).unwrap_or(true),
            Err(err) => {
                rewind_warn!("settings read failed, assuming enabled: {}", err);
                true
            }
        }
    }

    pub async fn load(&self) -> Settings {
        match self.try_load().await {
            Ok(settings) => settings,
            Err(err) => {
                rewind_warn!("settings read failed, using defaults: {}", err);
                Settings::default()
            }
        }
    }

    /// Like [`load`](Self::load) but reports an unreadable store to the caller.
    pub async fn try_load(&self) -> Result<Settings, StoreError> {
        let record = self.store.get(&Settings::KEYS).await?;
        Ok(Settings::from_record(&record))
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<StorageChange> {
        self.store.subscribe()
    }

    pub fn classify(change: &StorageChange) -> Option<SettingsChange> {
        if !change.area.is_observed() {
            return None;
        }
        match change.key.as_str() {
            KEY_ENABLED => Some(SettingsChange::Enabled {
                old: coerce_bool(change.old_value.as_ref()),
                new: coerce_bool(change.new_value.as_ref()),
            }),
            KEY_SHOW_NOTICE | KEY_NOTICE_DURATION => Some(SettingsChange::Notice),
            _ => None,
        }
    }
}

/// In-memory store reporting every change under a single area.
pub struct MemorySettingsStore {
    area: StorageArea,
    inner: Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    values: Record,
    subscribers: Vec<mpsc::UnboundedSender<StorageChange>>,
    failing: bool,
}

impl MemorySettingsStore {
    pub fn new(area: StorageArea) -> Self {
        Self::with_values(area, Record::new())
    }

    pub fn with_values(area: StorageArea, values: Record) -> Self {
        Self {
            area,
            inner: Mutex::new(MemoryInner {
                values,
                ..MemoryInner::default()
            }),
        }
    }

    /// Makes every read and write fail until switched back.
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    /// Writes one key, notifying subscribers when the value changed.
    pub fn write(&self, key: &str, value: Value) {
        self.apply(key, Some(value));
    }

    pub fn remove(&self, key: &str) {
        self.apply(key, None);
    }

    fn apply(&self, key: &str, value: Option<Value>) {
        let mut inner = self.lock();
        let old_value = match &value {
            Some(value) => inner.values.insert(key.to_string(), value.clone()),
            None => inner.values.remove(key),
        };
        if old_value == value {
            return;
        }
        let change = StorageChange {
            area: self.area,
            key: key.to_string(),
            old_value,
            new_value: value,
        };
        inner
            .subscribers
            .retain(|subscriber| subscriber.send(change.clone()).is_ok());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self, keys: &[&str]) -> Result<Record, StoreError> {
        let inner = self.lock();
        if inner.failing {
            return Err(StoreError::Unavailable("store switched off".into()));
        }
        Ok(keys
            .iter()
            .filter_map(|key| {
                inner
                    .values
                    .get(*key)
                    .map(|value| (key.to_string(), value.clone()))
            })
            .collect())
    }

    async fn set(&self, record: Record) -> Result<(), StoreError> {
        if self.lock().failing {
            return Err(StoreError::Unavailable("store switched off".into()));
        }
        for (key, value) in record {
            self.write(&key, value);
        }
        Ok(())
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<StorageChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().subscribers.push(tx);
        rx
    }
}
