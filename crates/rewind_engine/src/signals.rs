//! Navigation signal sources.
//!
//! Each source is best-effort on its own; the debounce window downstream
//! absorbs duplicates and noise.

use std::sync::Arc;

use rewind_core::NavigationReason;
use rewind_logging::rewind_debug;
use tokio::sync::mpsc;

use crate::page::{HistoryApi, Page, PageEvent};

pub trait SignalSink: Send + Sync {
    fn emit(&self, reason: NavigationReason);
}

pub struct ChannelSignalSink {
    tx: mpsc::UnboundedSender<NavigationReason>,
}

impl ChannelSignalSink {
    pub fn new(tx: mpsc::UnboundedSender<NavigationReason>) -> Self {
        Self { tx }
    }
}

impl SignalSink for ChannelSignalSink {
    fn emit(&self, reason: NavigationReason) {
        let _ = self.tx.send(reason);
    }
}

/// Wraps the page's history object; emits after the wrapped call completes.
pub struct InterceptedHistory {
    inner: Arc<dyn HistoryApi>,
    sink: Arc<dyn SignalSink>,
}

impl InterceptedHistory {
    pub fn new(inner: Arc<dyn HistoryApi>, sink: Arc<dyn SignalSink>) -> Self {
        Self { inner, sink }
    }
}

impl HistoryApi for InterceptedHistory {
    fn push_state(&self, url: &str) {
        self.inner.push_state(url);
        self.sink.emit(NavigationReason::HistoryPush);
    }

    fn replace_state(&self, url: &str) {
        self.inner.replace_state(url);
        self.sink.emit(NavigationReason::HistoryReplace);
    }
}

/// Which sources get installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalSources {
    pub history: bool,
    pub pop_state: bool,
    pub navigate_finished: bool,
    /// Noisiest source; catches host code that bypasses the history API.
    pub mutations: bool,
}

impl Default for SignalSources {
    fn default() -> Self {
        Self {
            history: true,
            pop_state: true,
            navigate_finished: true,
            mutations: true,
        }
    }
}

/// Installs the enabled sources on `page`. Call once per page.
pub fn install(page: &dyn Page, sink: Arc<dyn SignalSink>, sources: &SignalSources) {
    if sources.history {
        let wrapped = InterceptedHistory::new(page.history(), sink.clone());
        page.set_history(Arc::new(wrapped));
    }
    if sources.pop_state {
        listen(page, PageEvent::PopState, NavigationReason::PopState, &sink);
    }
    if sources.navigate_finished {
        listen(
            page,
            PageEvent::NavigateFinished,
            NavigationReason::NavigateFinished,
            &sink,
        );
    }
    if sources.mutations {
        listen(
            page,
            PageEvent::SubtreeMutation,
            NavigationReason::Mutation,
            &sink,
        );
    }
    rewind_debug!("signal sources installed: {:?}", sources);
}

fn listen(page: &dyn Page, event: PageEvent, reason: NavigationReason, sink: &Arc<dyn SignalSink>) {
    let sink = sink.clone();
    page.add_listener(event, Arc::new(move || sink.emit(reason)));
}
