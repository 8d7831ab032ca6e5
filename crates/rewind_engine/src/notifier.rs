use std::sync::Arc;
use std::time::Duration;

use rewind_logging::rewind_debug;
use tokio::task::JoinHandle;

use crate::page::{NoticeNode, NoticeSurface};
use crate::settings::Settings;

/// Shows the transient confirmation notice.
pub struct Notifier {
    surface: Arc<dyn NoticeSurface>,
    id: String,
    duration: Duration,
    show_notice: bool,
    hide_task: Option<JoinHandle<()>>,
}

impl Notifier {
    pub fn new(surface: Arc<dyn NoticeSurface>, id: impl Into<String>, duration: Duration) -> Self {
        Self {
            surface,
            id: id.into(),
            duration,
            show_notice: true,
            hide_task: None,
        }
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.show_notice = settings.show_notice;
        self.duration = settings.notice_duration;
    }

    /// Shows `message` and (re)starts the hide timer. Must run inside a tokio runtime.
    ///
    /// Returns `false` when notices are switched off in settings.
    pub fn show(&mut self, message: &str) -> bool {
        if !self.show_notice {
            rewind_debug!("notice suppressed by settings");
            return false;
        }

        let node = self.ensure_node();
        node.set_text(message);
        node.set_visible(true);

        if let Some(previous) = self.hide_task.take() {
            previous.abort();
        }
        let duration = self.duration;
        self.hide_task = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            node.set_visible(false);
        }));
        true
    }

    fn ensure_node(&self) -> Arc<dyn NoticeNode> {
        self.surface
            .find(&self.id)
            .unwrap_or_else(|| self.surface.create(&self.id))
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        if let Some(task) = self.hide_task.take() {
            task.abort();
        }
    }
}
