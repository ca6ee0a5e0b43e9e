use std::time::Duration;

pub const SERVER_ONLINE_MESSAGE: &str = "Server online.";
pub const SERVER_NOT_RESPONDING_MESSAGE: &str = "Server is not responding (retrying...)";
pub const INDEXING_FINISHED_MESSAGE: &str = "Indexing finished.";
pub const NO_RESULTS_MESSAGE: &str = "No results found";

const SHORT_TOAST: Duration = Duration::from_millis(2000);
const SERVER_DOWN_TOAST: Duration = Duration::from_millis(4000);
const SEARCH_ERROR_TOAST: Duration = Duration::from_millis(10_000);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToastLevel {
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
    /// `None` keeps the toast until the user dismisses it.
    pub auto_close: Option<Duration>,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            message: message.into(),
            auto_close: Some(SHORT_TOAST),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Warning,
            message: message.into(),
            auto_close: None,
        }
    }

    pub fn error(message: impl Into<String>, auto_close: Duration) -> Self {
        Self {
            level: ToastLevel::Error,
            message: message.into(),
            auto_close: Some(auto_close),
        }
    }

    pub fn server_online() -> Self {
        Self::success(SERVER_ONLINE_MESSAGE)
    }

    pub fn server_not_responding() -> Self {
        Self::error(SERVER_NOT_RESPONDING_MESSAGE, SERVER_DOWN_TOAST)
    }

    pub fn indexing_finished() -> Self {
        Self::success(INDEXING_FINISHED_MESSAGE)
    }

    pub fn search_failed(detail: &str) -> Self {
        Self::error(format!("Error searching: {detail}"), SEARCH_ERROR_TOAST)
    }

    pub fn no_results() -> Self {
        Self::warning(NO_RESULTS_MESSAGE)
    }
}

/// Side effect requested by a state transition. The coordinator decides how
/// each one is carried out; the state machine never touches a UI or storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    DismissAllToasts,
    ShowToast(Toast),
    ShowNotReadyBanner,
    HideNotReadyBanner,
    /// Remember the first connected source across reloads.
    PersistFirstTimeIndexing(String),
    ClearFirstTimeIndexingPersistent,
    RefreshConnectedSources,
    RefreshSourceTypes,
}

impl Intent {
    /// Intents that only a presentation layer can act on.
    pub fn is_presentational(&self) -> bool {
        matches!(
            self,
            Self::DismissAllToasts
                | Self::ShowToast(_)
                | Self::ShowNotReadyBanner
                | Self::HideNotReadyBanner
        )
    }
}
