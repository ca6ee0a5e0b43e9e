//! Background indexing state as seen from the client.

mod machine;
mod progress;

pub use machine::IndexingStateMachine;
pub use machine::MachineConfig;
pub use machine::Transition;
pub use machine::transition;
pub use progress::IndexingProgress;

use precept_protocol::StatusSample;
use std::time::Instant;

/// Indexing flags and the last observed counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexingState {
    pub is_indexing: bool,
    pub is_preparing_indexing: bool,
    /// Last time a sample showed indexing work. `None` means never.
    pub last_indexing_activity_at: Option<Instant>,
    /// Sticky flag raised when the very first source is connected; cleared
    /// once that initial indexing run completes.
    pub is_first_time_indexing: bool,
    pub docs_indexed: u32,
    pub docs_in_indexing: u32,
    pub docs_left_to_index: u32,
}

impl IndexingState {
    /// Coarse phase derived from the flag pair.
    pub fn phase(&self) -> IndexingPhase {
        if self.is_indexing {
            IndexingPhase::Active
        } else if self.is_preparing_indexing {
            IndexingPhase::Preparing
        } else {
            IndexingPhase::Idle
        }
    }

    /// Whether any indexing banner should be visible.
    pub fn in_indexing(&self) -> bool {
        self.is_preparing_indexing || self.is_indexing
    }

    pub(crate) fn record_counters(&mut self, sample: &StatusSample) {
        self.docs_indexed = sample.docs_indexed;
        self.docs_in_indexing = sample.docs_in_indexing;
        self.docs_left_to_index = sample.docs_left_to_index;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FailureState {
    /// Consecutive failed polls since the last success or the last alert.
    pub server_down_count: u32,
    pub is_server_down: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MachineState {
    pub indexing: IndexingState,
    pub failure: FailureState,
}

impl MachineState {
    pub fn phase(&self) -> IndexingPhase {
        self.indexing.phase()
    }

    pub fn is_server_down(&self) -> bool {
        self.failure.is_server_down
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexingPhase {
    Idle,
    Preparing,
    Active,
    /// The single transition where `Active` turned into `Idle` and the
    /// completion intents fired.
    FinishedTransition,
}
