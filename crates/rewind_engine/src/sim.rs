//! In-memory page, video and notice surface.
//!
//! Stands in for the browser in tests and in the headless demo host. Host-side
//! actions (navigating, attaching a video, emitting media events) are plain
//! methods; the engine only sees the traits in [`crate::page`].

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tokio::sync::oneshot;

use crate::page::{
    HistoryApi, Listener, MediaError, MediaEvent, NoticeNode, NoticeSurface, Page, PageEvent,
    VideoElement,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The page's own history implementation: it only moves the location.
struct SimHistory {
    location: Arc<Mutex<String>>,
    entries: Arc<Mutex<Vec<String>>>,
}

impl HistoryApi for SimHistory {
    fn push_state(&self, url: &str) {
        *lock(&self.location) = url.to_string();
        lock(&self.entries).push(url.to_string());
    }

    fn replace_state(&self, url: &str) {
        *lock(&self.location) = url.to_string();
        let mut entries = lock(&self.entries);
        entries.pop();
        entries.push(url.to_string());
    }
}

pub struct SimPage {
    location: Arc<Mutex<String>>,
    entries: Arc<Mutex<Vec<String>>>,
    history: RwLock<Arc<dyn HistoryApi>>,
    video: Mutex<Option<Arc<SimVideo>>>,
    listeners: Mutex<Vec<(PageEvent, Listener)>>,
}

impl SimPage {
    pub fn new(url: &str) -> Arc<Self> {
        let location = Arc::new(Mutex::new(url.to_string()));
        let entries = Arc::new(Mutex::new(vec![url.to_string()]));
        let history: Arc<dyn HistoryApi> = Arc::new(SimHistory {
            location: location.clone(),
            entries: entries.clone(),
        });
        Arc::new(Self {
            location,
            entries,
            history: RwLock::new(history),
            video: Mutex::new(None),
            listeners: Mutex::new(Vec::new()),
        })
    }

    /// Navigates the way host code does: through whatever history object is installed.
    pub fn push_state(&self, url: &str) {
        self.history().push_state(url);
    }

    pub fn replace_state(&self, url: &str) {
        self.history().replace_state(url);
    }

    /// Steps back one entry and fires popstate.
    pub fn go_back(&self) {
        let previous = {
            let mut entries = lock(&self.entries);
            if entries.len() > 1 {
                entries.pop();
            }
            entries.last().cloned()
        };
        if let Some(url) = previous {
            *lock(&self.location) = url;
        }
        self.fire(PageEvent::PopState);
    }

    /// Changes the location without touching history or firing anything.
    pub fn set_location_silently(&self, url: &str) {
        *lock(&self.location) = url.to_string();
    }

    pub fn finish_navigation(&self) {
        self.fire(PageEvent::NavigateFinished);
    }

    pub fn mutate(&self) {
        self.fire(PageEvent::SubtreeMutation);
    }

    /// Inserts the player's video element; counts as a DOM mutation.
    pub fn attach_video(&self, video: Arc<SimVideo>) {
        *lock(&self.video) = Some(video);
        self.fire(PageEvent::SubtreeMutation);
    }

    pub fn detach_video(&self) {
        if let Some(video) = lock(&self.video).take() {
            video.detach();
        }
        self.fire(PageEvent::SubtreeMutation);
    }

    pub fn listener_count(&self, event: PageEvent) -> usize {
        lock(&self.listeners)
            .iter()
            .filter(|(registered, _)| *registered == event)
            .count()
    }

    fn fire(&self, event: PageEvent) {
        let matching: Vec<Listener> = lock(&self.listeners)
            .iter()
            .filter(|(registered, _)| *registered == event)
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in matching {
            listener();
        }
    }
}

impl Page for SimPage {
    fn current_url(&self) -> String {
        lock(&self.location).clone()
    }

    fn query_video(&self) -> Option<Arc<dyn VideoElement>> {
        lock(&self.video)
            .clone()
            .map(|video| video as Arc<dyn VideoElement>)
    }

    fn history(&self) -> Arc<dyn HistoryApi> {
        self.history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_history(&self, history: Arc<dyn HistoryApi>) {
        *self.history.write().unwrap_or_else(PoisonError::into_inner) = history;
    }

    fn add_listener(&self, event: PageEvent, listener: Listener) {
        lock(&self.listeners).push((event, listener));
    }
}

#[derive(Default)]
struct SimVideoInner {
    current_time: f64,
    detached: bool,
    seeks: usize,
    failing_seeks: usize,
    waiters: Vec<(MediaEvent, oneshot::Sender<()>)>,
}

pub struct SimVideo {
    inner: Mutex<SimVideoInner>,
}

impl SimVideo {
    pub fn new() -> Arc<Self> {
        Self::at(0.0)
    }

    /// A video already positioned at `seconds`, e.g. a resumed watch position.
    pub fn at(seconds: f64) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(SimVideoInner {
                current_time: seconds,
                ..SimVideoInner::default()
            }),
        })
    }

    /// Delivers `event` to every one-shot subscriber and detaches them.
    pub fn emit(&self, event: MediaEvent) {
        let ready: Vec<oneshot::Sender<()>> = {
            let mut inner = lock(&self.inner);
            let (ready, waiting) = std::mem::take(&mut inner.waiters)
                .into_iter()
                .partition(|(registered, _)| *registered == event);
            inner.waiters = waiting;
            ready.into_iter().map(|(_, sender)| sender).collect()
        };
        for sender in ready {
            let _ = sender.send(());
        }
    }

    /// Simulates playback progress.
    pub fn advance_to(&self, seconds: f64) {
        lock(&self.inner).current_time = seconds;
    }

    /// The next `count` seeks fail as if the element were in a bad state.
    pub fn fail_next_seeks(&self, count: usize) {
        lock(&self.inner).failing_seeks = count;
    }

    pub fn detach(&self) {
        lock(&self.inner).detached = true;
    }

    /// Successful seeks so far.
    pub fn seek_count(&self) -> usize {
        lock(&self.inner).seeks
    }

    /// Subscribers whose receiver is still alive.
    pub fn pending_listeners(&self) -> usize {
        lock(&self.inner)
            .waiters
            .iter()
            .filter(|(_, sender)| !sender.is_closed())
            .count()
    }
}

impl VideoElement for SimVideo {
    fn current_time(&self) -> f64 {
        lock(&self.inner).current_time
    }

    fn set_current_time(&self, seconds: f64) -> Result<(), MediaError> {
        let mut inner = lock(&self.inner);
        if inner.detached {
            return Err(MediaError::Detached);
        }
        if inner.failing_seeks > 0 {
            inner.failing_seeks -= 1;
            return Err(MediaError::Other("seek rejected".into()));
        }
        inner.current_time = seconds;
        inner.seeks += 1;
        Ok(())
    }

    fn once(&self, event: MediaEvent) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        let mut inner = lock(&self.inner);
        inner.waiters.retain(|(_, sender)| !sender.is_closed());
        inner.waiters.push((event, tx));
        rx
    }
}

pub struct SimNoticeNode {
    id: String,
    text: Mutex<String>,
    visible: AtomicBool,
    shown: AtomicUsize,
}

impl SimNoticeNode {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn text(&self) -> String {
        lock(&self.text).clone()
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    /// How many times the node was made visible.
    pub fn show_count(&self) -> usize {
        self.shown.load(Ordering::SeqCst)
    }
}

impl NoticeNode for SimNoticeNode {
    fn set_text(&self, text: &str) {
        *lock(&self.text) = text.to_string();
    }

    fn set_visible(&self, visible: bool) {
        if visible {
            self.shown.fetch_add(1, Ordering::SeqCst);
        }
        self.visible.store(visible, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct SimNoticeSurface {
    nodes: Mutex<Vec<Arc<SimNoticeNode>>>,
}

impl SimNoticeSurface {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn node_count(&self) -> usize {
        lock(&self.nodes).len()
    }

    pub fn node(&self, id: &str) -> Option<Arc<SimNoticeNode>> {
        lock(&self.nodes).iter().find(|node| node.id == id).cloned()
    }
}

impl NoticeSurface for SimNoticeSurface {
    fn find(&self, id: &str) -> Option<Arc<dyn NoticeNode>> {
        self.node(id).map(|node| node as Arc<dyn NoticeNode>)
    }

    fn create(&self, id: &str) -> Arc<dyn NoticeNode> {
        let node = Arc::new(SimNoticeNode {
            id: id.to_string(),
            text: Mutex::new(String::new()),
            visible: AtomicBool::new(false),
            shown: AtomicUsize::new(0),
        });
        lock(&self.nodes).push(node.clone());
        node
    }
}
