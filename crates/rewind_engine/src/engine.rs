use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use rewind_core::{
    update, AttemptId, Effect, Msg, NavigationReason, ResetState, SchedulerView, TaskId, Trigger,
};
use rewind_logging::{rewind_debug, rewind_info, rewind_trace, rewind_warn};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::notifier::Notifier;
use crate::page::{MediaEvent, NoticeSurface, Page, VideoElement};
use crate::settings::{Settings, SettingsChange, SettingsGate, SettingsStore, StorageChange};
use crate::signals::{self, ChannelSignalSink, SignalSink};
use crate::waiter::wait_for_video;

/// Host collaborators the engine runs against.
#[derive(Clone)]
pub struct Ports {
    pub page: Arc<dyn Page>,
    pub store: Arc<dyn SettingsStore>,
    pub surface: Arc<dyn NoticeSurface>,
}

enum EngineInput {
    Msg(Msg),
    VideoFound {
        attempt: AttemptId,
        video: Arc<dyn VideoElement>,
    },
    Preferences(Settings),
}

/// Resources held on behalf of one attempt.
struct LiveAttempt {
    cancel: CancellationToken,
    video: Option<Arc<dyn VideoElement>>,
}

pub struct EngineHandle {
    view_rx: watch::Receiver<SchedulerView>,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl EngineHandle {
    /// Installs the signal sources on the page and starts the event loop.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: EngineConfig, ports: Ports) -> Self {
        let gate = SettingsGate::new(ports.store.clone());
        let changes = gate.subscribe();

        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let sink: Arc<dyn SignalSink> = Arc::new(ChannelSignalSink::new(signal_tx));
        signals::install(ports.page.as_ref(), sink.clone(), &config.sources);
        sink.emit(NavigationReason::Initial);

        let state = ResetState::with_rule(config.watch_rule.clone());
        let (view_tx, view_rx) = watch::channel(state.view());
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let notifier = Notifier::new(
            ports.surface.clone(),
            config.notice_id.clone(),
            config.notice_duration,
        );

        let engine = Engine {
            state,
            config,
            page: ports.page,
            gate,
            notifier,
            input_tx,
            input_rx,
            signal_rx,
            changes,
            view_tx,
            debounce: None,
            attempts: HashMap::new(),
        };
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(engine.run(shutdown.clone()));

        Self {
            view_rx,
            shutdown,
            task,
        }
    }

    pub fn view(&self) -> SchedulerView {
        self.view_rx.borrow().clone()
    }

    /// Stops the event loop and abandons any outstanding work.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        let _ = self.task.await;
    }
}

struct Engine {
    state: ResetState,
    config: EngineConfig,
    page: Arc<dyn Page>,
    gate: SettingsGate,
    notifier: Notifier,
    input_tx: mpsc::UnboundedSender<EngineInput>,
    input_rx: mpsc::UnboundedReceiver<EngineInput>,
    signal_rx: mpsc::UnboundedReceiver<NavigationReason>,
    changes: mpsc::UnboundedReceiver<StorageChange>,
    view_tx: watch::Sender<SchedulerView>,
    debounce: Option<(TaskId, JoinHandle<()>)>,
    attempts: HashMap<AttemptId, LiveAttempt>,
}

impl Engine {
    async fn run(mut self, shutdown: CancellationToken) {
        let settings = self.gate.load().await;
        self.notifier.apply_settings(&settings);

        loop {
            tokio::select! {
                // Settings changes first: the generation advance must land
                // before any queued work checks staleness.
                biased;
                _ = shutdown.cancelled() => break,
                Some(change) = self.changes.recv() => self.on_storage_change(change),
                Some(reason) = self.signal_rx.recv() => self.dispatch(Msg::Navigation(reason)),
                Some(input) = self.input_rx.recv() => self.on_input(input),
            }
        }

        if let Some((_, timer)) = self.debounce.take() {
            timer.abort();
        }
        for (_, live) in self.attempts.drain() {
            live.cancel.cancel();
        }
        rewind_debug!("engine stopped");
    }

    fn on_storage_change(&mut self, change: StorageChange) {
        match SettingsGate::classify(&change) {
            Some(SettingsChange::Enabled { old, new }) => {
                let current_url = self.page.current_url();
                self.dispatch(Msg::EnabledChanged {
                    old,
                    new,
                    current_url,
                });
            }
            Some(SettingsChange::Notice) => {
                let gate = self.gate.clone();
                let tx = self.input_tx.clone();
                tokio::spawn(async move {
                    match gate.try_load().await {
                        Ok(settings) => {
                            let _ = tx.send(EngineInput::Preferences(settings));
                        }
                        Err(err) => {
                            rewind_warn!("notice settings reload failed, keeping current: {}", err);
                        }
                    }
                });
            }
            None => rewind_trace!("ignoring change of {} in {:?}", change.key, change.area),
        }
    }

    fn on_input(&mut self, input: EngineInput) {
        match input {
            EngineInput::Msg(msg) => self.dispatch(msg),
            EngineInput::VideoFound { attempt, video } => {
                if let Some(live) = self.attempts.get_mut(&attempt) {
                    live.video = Some(video);
                }
                self.dispatch(Msg::VideoReady { attempt });
            }
            EngineInput::Preferences(settings) => self.notifier.apply_settings(&settings),
        }
    }

    /// Runs `msg` and every synchronous reply it causes through the core.
    fn dispatch(&mut self, msg: Msg) {
        let mut inbox = VecDeque::from([msg]);
        while let Some(msg) = inbox.pop_front() {
            let state = std::mem::take(&mut self.state);
            let (state, effects) = update(state, msg);
            self.state = state;
            for effect in effects {
                if let Some(reply) = self.execute(effect) {
                    inbox.push_back(reply);
                }
            }
        }
        self.view_tx.send_replace(self.state.view());
    }

    fn execute(&mut self, effect: Effect) -> Option<Msg> {
        match effect {
            Effect::ArmDebounce { task } => {
                let tx = self.input_tx.clone();
                let delay = self.config.debounce;
                let timer = tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(EngineInput::Msg(Msg::DebounceElapsed { task }));
                });
                if let Some((_, previous)) = self.debounce.replace((task, timer)) {
                    previous.abort();
                }
                None
            }
            Effect::CancelDebounce { task } => {
                if self.debounce.as_ref().is_some_and(|(armed, _)| *armed == task) {
                    if let Some((_, timer)) = self.debounce.take() {
                        timer.abort();
                    }
                }
                None
            }
            Effect::EvaluateEntry { reason } => {
                let gate = self.gate.clone();
                let page = self.page.clone();
                let tx = self.input_tx.clone();
                tokio::spawn(async move {
                    let enabled = gate.is_enabled().await;
                    let url = page.current_url();
                    let _ = tx.send(EngineInput::Msg(Msg::AttemptRequested {
                        reason,
                        url,
                        enabled,
                    }));
                });
                None
            }
            Effect::WaitForVideo { attempt } => {
                let cancel = CancellationToken::new();
                self.attempts.insert(
                    attempt,
                    LiveAttempt {
                        cancel: cancel.clone(),
                        video: None,
                    },
                );
                let page = self.page.clone();
                let tx = self.input_tx.clone();
                let interval = self.config.poll_interval;
                let timeout = self.config.video_timeout;
                tokio::spawn(async move {
                    let found = tokio::select! {
                        _ = cancel.cancelled() => return,
                        found = wait_for_video(page.as_ref(), interval, timeout) => found,
                    };
                    let input = match found {
                        Some(video) => EngineInput::VideoFound { attempt, video },
                        None => EngineInput::Msg(Msg::VideoMissing { attempt }),
                    };
                    let _ = tx.send(input);
                });
                None
            }
            Effect::ArmTriggers { attempt } => {
                self.arm_triggers(attempt);
                None
            }
            Effect::SeekToStart { attempt, trigger } => {
                let video = self
                    .attempts
                    .get(&attempt)
                    .and_then(|live| live.video.clone());
                let result = match video {
                    Some(video) => video.set_current_time(0.0).map_err(|err| err.to_string()),
                    None => Err("video handle already released".to_string()),
                };
                Some(match result {
                    Ok(()) => Msg::SeekApplied { attempt, trigger },
                    Err(error) => Msg::SeekFailed {
                        attempt,
                        trigger,
                        error,
                    },
                })
            }
            Effect::ShowNotice { attempt } => {
                if self.notifier.show(&self.config.notice_message) {
                    rewind_info!("notice shown for attempt {}", attempt);
                }
                None
            }
            Effect::ReleaseAttempt { attempt } => {
                if let Some(live) = self.attempts.remove(&attempt) {
                    live.cancel.cancel();
                }
                None
            }
        }
    }

    /// Fires the immediate trigger and subscribes the two media-event triggers.
    fn arm_triggers(&mut self, attempt: AttemptId) {
        let Some(live) = self.attempts.get(&attempt) else {
            return;
        };
        let Some(video) = live.video.clone() else {
            rewind_debug!("attempt {} armed without a video", attempt);
            return;
        };
        let cancel = live.cancel.clone();

        self.spawn_trigger(attempt, Trigger::Immediate, None, cancel.clone());
        // Subscribe now so an event emitted right after arming is not missed.
        let metadata = video.once(MediaEvent::LoadedMetadata);
        self.spawn_trigger(attempt, Trigger::LoadedMetadata, Some(metadata), cancel.clone());
        let playing = video.once(MediaEvent::Playing);
        self.spawn_trigger(attempt, Trigger::Playing, Some(playing), cancel);
    }

    fn spawn_trigger(
        &self,
        attempt: AttemptId,
        trigger: Trigger,
        event: Option<oneshot::Receiver<()>>,
        cancel: CancellationToken,
    ) {
        let gate = self.gate.clone();
        let tx = self.input_tx.clone();
        tokio::spawn(async move {
            let fire = async {
                if let Some(event) = event {
                    // A dropped sender means the element went away without firing.
                    event.await.ok()?;
                }
                Some(gate.is_enabled().await)
            };
            let enabled = tokio::select! {
                _ = cancel.cancelled() => return,
                enabled = fire => enabled,
            };
            if let Some(enabled) = enabled {
                let _ = tx.send(EngineInput::Msg(Msg::TriggerFired {
                    attempt,
                    trigger,
                    enabled,
                }));
            }
        });
    }
}
