//! Rewind core: pure navigation/reset state machine and view-model helpers.
mod effect;
mod msg;
mod reason;
mod state;
mod update;
mod view_model;
mod watch_url;

pub use effect::Effect;
pub use msg::Msg;
pub use reason::NavigationReason;
pub use state::{
    Attempt, AttemptId, AttemptPhase, DebounceSlot, Generation, GenerationGuard, PendingTask,
    ResetState, TaskId, Trigger,
};
pub use update::update;
pub use view_model::{AttemptView, SchedulerView};
pub use watch_url::WatchUrlRule;
