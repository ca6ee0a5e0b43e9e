use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} returned {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },
}

impl ApiError {
    /// Short text suitable for a user-facing notification: the server's own
    /// error body when it sent one.
    pub fn detail(&self) -> String {
        match self {
            Self::Status { status, body, .. } if body.trim().is_empty() => {
                format!("server returned {status}")
            }
            Self::Status { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }
}

/// The session behind a [`crate::SessionHandle`] has stopped running.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("session is no longer running")]
pub struct SessionClosed;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("search query is empty")]
    EmptyQuery,

    #[error("search is unavailable until the first indexing run finishes")]
    NotReady,

    #[error("search request failed: {0}")]
    RequestFailed(#[from] ApiError),

    #[error(transparent)]
    Closed(#[from] SessionClosed),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
