//! Rewind engine: effect execution, timers and host adapters.
mod config;
mod engine;
mod notifier;
pub mod page;
mod settings;
mod signals;
pub mod sim;
mod waiter;

pub use config::EngineConfig;
pub use engine::{EngineHandle, Ports};
pub use notifier::Notifier;
pub use settings::{
    MemorySettingsStore, Record, Settings, SettingsChange, SettingsGate, SettingsStore,
    StorageArea, StorageChange, StoreError, KEY_ENABLED, KEY_NOTICE_DURATION, KEY_SHOW_NOTICE,
};
pub use signals::{
    install as install_signal_sources, ChannelSignalSink, InterceptedHistory, SignalSink,
    SignalSources,
};
pub use waiter::wait_for_video;
