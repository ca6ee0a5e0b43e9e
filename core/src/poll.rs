use precept_protocol::StatusSample;
use std::fmt;
use thiserror::Error;

/// Raw result of one status poll cycle.
pub type PollOutcome = Result<StatusSample, PollError>;

/// Why a status poll failed.
///
/// The state machine folds every variant into a single "poll failed" signal;
/// the distinction only matters for logs.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PollError {
    #[error("status request timed out")]
    Timeout,

    #[error("status request failed: {0}")]
    Network(String),

    #[error("status request returned {status}: {body}")]
    Server { status: u16, body: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PollErrorKind {
    Timeout,
    NetworkError,
    ServerError,
}

impl PollError {
    pub fn kind(&self) -> PollErrorKind {
        match self {
            Self::Timeout => PollErrorKind::Timeout,
            Self::Network(_) => PollErrorKind::NetworkError,
            Self::Server { .. } => PollErrorKind::ServerError,
        }
    }
}

impl fmt::Display for PollErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Timeout => "timeout",
            Self::NetworkError => "network_error",
            Self::ServerError => "server_error",
        };
        f.write_str(label)
    }
}
