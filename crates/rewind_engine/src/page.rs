//! Adapter boundary between the scheduler and the host page.
//!
//! A browser build backs these traits with the DOM; tests and the demo host use
//! the in-memory implementations in [`crate::sim`].

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::oneshot;

/// Callback registered for a [`PageEvent`].
pub type Listener = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageEvent {
    /// Browser back/forward.
    PopState,
    /// The host application finished one of its own navigations.
    NavigateFinished,
    /// Nodes were added or removed anywhere in the document.
    SubtreeMutation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaEvent {
    LoadedMetadata,
    Playing,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    #[error("video element is detached from the document")]
    Detached,
    #[error("media error: {0}")]
    Other(String),
}

/// The two history-mutation entry points.
pub trait HistoryApi: Send + Sync {
    fn push_state(&self, url: &str);
    fn replace_state(&self, url: &str);
}

pub trait VideoElement: Send + Sync {
    fn current_time(&self) -> f64;
    fn set_current_time(&self, seconds: f64) -> Result<(), MediaError>;
    /// Subscribes to the next `event`. The listener detaches itself after the
    /// first delivery; dropping the receiver abandons it.
    fn once(&self, event: MediaEvent) -> oneshot::Receiver<()>;
}

pub trait NoticeNode: Send + Sync {
    fn set_text(&self, text: &str);
    fn set_visible(&self, visible: bool);
}

/// Where the confirmation notice lives.
pub trait NoticeSurface: Send + Sync {
    fn find(&self, id: &str) -> Option<Arc<dyn NoticeNode>>;
    fn create(&self, id: &str) -> Arc<dyn NoticeNode>;
}

pub trait Page: Send + Sync {
    fn current_url(&self) -> String;
    /// First video element in the document, if any.
    fn query_video(&self) -> Option<Arc<dyn VideoElement>>;
    fn history(&self) -> Arc<dyn HistoryApi>;
    /// Replaces the page's history object; later calls go through `history`.
    fn set_history(&self, history: Arc<dyn HistoryApi>);
    fn add_listener(&self, event: PageEvent, listener: Listener);
}
