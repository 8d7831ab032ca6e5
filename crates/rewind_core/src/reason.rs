use std::fmt;

/// Source that reported a possible in-page navigation.
///
/// Only used for diagnostics; every reason is scheduled the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationReason {
    /// Scheduled once when the engine starts.
    Initial,
    /// `history.pushState` completed.
    HistoryPush,
    /// `history.replaceState` completed.
    HistoryReplace,
    /// Browser back/forward.
    PopState,
    /// The host application announced that its own navigation finished.
    NavigateFinished,
    /// Structural change somewhere in the document.
    Mutation,
}

impl NavigationReason {
    pub fn label(self) -> &'static str {
        match self {
            NavigationReason::Initial => "initial",
            NavigationReason::HistoryPush => "history.pushState",
            NavigationReason::HistoryReplace => "history.replaceState",
            NavigationReason::PopState => "popstate",
            NavigationReason::NavigateFinished => "yt-navigate-finish",
            NavigationReason::Mutation => "mutation",
        }
    }
}

impl fmt::Display for NavigationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
