//! Scripted browsing session against the in-memory page.

use std::sync::Arc;
use std::time::Duration;

use rewind_core::SchedulerView;
use rewind_engine::page::{MediaEvent, VideoElement};
use rewind_engine::sim::{SimNoticeSurface, SimPage, SimVideo};
use rewind_engine::{EngineConfig, EngineHandle, Ports, Record, SettingsStore, KEY_ENABLED};
use rewind_logging::rewind_info;
use serde_json::Value;

use super::persistence::RonSettingsStore;

const HOME: &str = "https://www.youtube.com/";
const FIRST: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
const SECOND: &str = "https://www.youtube.com/watch?v=9bZkp7q19f0";

/// Long enough for the debounce window plus one video poll.
const SETTLE: Duration = Duration::from_millis(300);

pub async fn run(store: Arc<RonSettingsStore>) -> anyhow::Result<()> {
    // Start from a known state so repeated runs behave the same.
    set_enabled(store.as_ref(), true).await?;

    let page = SimPage::new(HOME);
    let surface = SimNoticeSurface::new();
    let engine = EngineHandle::spawn(
        EngineConfig::default(),
        Ports {
            page: page.clone(),
            store: store.clone(),
            surface,
        },
    );
    settle("home page", &engine).await;

    // The host navigates, then renders the player a moment later.
    page.push_state(FIRST);
    let first = SimVideo::at(734.0);
    tokio::time::sleep(Duration::from_millis(20)).await;
    page.attach_video(first.clone());
    settle("first watch page", &engine).await;
    first.emit(MediaEvent::LoadedMetadata);
    first.emit(MediaEvent::Playing);
    settle("first video playing", &engine).await;
    rewind_info!("first video at {:.1}s", first.current_time());

    set_enabled(store.as_ref(), false).await?;
    page.detach_video();
    page.push_state(SECOND);
    let second = SimVideo::at(88.0);
    page.attach_video(second.clone());
    settle("second watch page while disabled", &engine).await;
    rewind_info!("second video at {:.1}s", second.current_time());

    // Re-enabling marks the displayed video as handled instead of resetting it.
    set_enabled(store.as_ref(), true).await?;
    page.mutate();
    settle("re-enabled", &engine).await;
    rewind_info!("second video at {:.1}s", second.current_time());

    page.go_back();
    settle("back to first watch page", &engine).await;
    rewind_info!("second video at {:.1}s", second.current_time());

    engine.shutdown().await;
    Ok(())
}

async fn set_enabled(store: &dyn SettingsStore, enabled: bool) -> anyhow::Result<()> {
    let mut record = Record::new();
    record.insert(KEY_ENABLED.to_string(), Value::Bool(enabled));
    store.set(record).await?;
    Ok(())
}

async fn settle(step: &str, engine: &EngineHandle) {
    tokio::time::sleep(SETTLE).await;
    log_view(step, &engine.view());
}

fn log_view(step: &str, view: &SchedulerView) {
    rewind_info!(
        "[{}] generation={} handled={} resets={} notices={} active_attempt={:?}",
        step,
        view.generation,
        view.handled_url.as_deref().unwrap_or("-"),
        view.resets_applied,
        view.notices_shown,
        view.active_attempt.as_ref().map(|attempt| attempt.id),
    );
}
