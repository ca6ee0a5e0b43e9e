use std::time::Duration;
use std::time::Instant;

use precept_protocol::StatusSample;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::FailureState;
use super::IndexingPhase;
use super::IndexingState;
use super::MachineState;
use crate::intent::Intent;
use crate::intent::Toast;
use crate::poll::PollError;
use crate::poll::PollOutcome;

pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(10_000);
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MachineConfig {
    /// How long counters may stay flat before an active run counts as done.
    pub idle_timeout: Duration,
    /// Consecutive failures tolerated before the server is declared down;
    /// the alert fires on failure number `failure_threshold + 1`.
    pub failure_threshold: u32,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
        }
    }
}

/// Result of folding one event into the state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub next: MachineState,
    pub intents: Vec<Intent>,
    pub phase: IndexingPhase,
}

impl Transition {
    fn settled(next: MachineState, intents: Vec<Intent>) -> Self {
        let phase = next.phase();
        Self {
            next,
            intents,
            phase,
        }
    }
}

/// Pure transition function over [`MachineState`].
#[derive(Clone, Copy, Debug, Default)]
pub struct IndexingStateMachine {
    config: MachineConfig,
}

impl IndexingStateMachine {
    pub fn new(config: MachineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Fold one poll outcome observed at `now`. `visible` reports whether
    /// the host is in the foreground; user-facing alerts are held back
    /// otherwise.
    pub fn transition(
        &self,
        prev: &MachineState,
        outcome: &PollOutcome,
        now: Instant,
        visible: bool,
    ) -> Transition {
        match outcome {
            Ok(sample) => self.on_sample(prev, sample, now, visible),
            Err(err) => self.on_failure(prev, err, visible),
        }
    }

    /// A data source was just connected. Only the first source ever raises
    /// the sticky first-time flag.
    pub fn mark_indexing_started(
        &self,
        prev: &MachineState,
        source_name: &str,
        first_source: bool,
    ) -> Transition {
        let mut next = prev.clone();
        let mut intents = Vec::new();
        next.indexing.is_preparing_indexing = true;
        if first_source {
            next.indexing.is_first_time_indexing = true;
            intents.push(Intent::PersistFirstTimeIndexing(source_name.to_string()));
        }
        info!(source = source_name, first_source, "indexing requested");
        Transition::settled(next, intents)
    }

    fn on_sample(
        &self,
        prev: &MachineState,
        sample: &StatusSample,
        now: Instant,
        visible: bool,
    ) -> Transition {
        let mut next = prev.clone();
        let mut intents = Vec::new();

        if prev.failure.is_server_down {
            info!("status endpoint is reachable again");
            intents.push(Intent::DismissAllToasts);
            if visible {
                intents.push(Intent::ShowToast(Toast::server_online()));
            }
            intents.push(Intent::RefreshConnectedSources);
            intents.push(Intent::RefreshSourceTypes);
        }
        next.failure = FailureState::default();

        let prev_indexing = &prev.indexing;
        if sample.docs_indexed < prev_indexing.docs_indexed {
            debug!(
                previous = prev_indexing.docs_indexed,
                current = sample.docs_indexed,
                "indexed counter went backwards; treating as a server-side reset"
            );
        }

        let mut finished = false;
        if has_progress(prev_indexing, sample) {
            next.indexing.is_indexing = true;
            next.indexing.is_preparing_indexing = false;
            next.indexing.last_indexing_activity_at = Some(now);
        } else if prev_indexing.is_indexing && self.idle_elapsed(prev_indexing, now) {
            info!(docs_indexed = sample.docs_indexed, "indexing finished");
            next.indexing.is_indexing = false;
            next.indexing.is_first_time_indexing = false;
            intents.push(Intent::HideNotReadyBanner);
            intents.push(Intent::ClearFirstTimeIndexingPersistent);
            intents.push(Intent::ShowToast(Toast::indexing_finished()));
            finished = true;
        }
        next.indexing.record_counters(sample);

        if finished {
            Transition {
                next,
                intents,
                phase: IndexingPhase::FinishedTransition,
            }
        } else {
            Transition::settled(next, intents)
        }
    }

    fn on_failure(&self, prev: &MachineState, err: &PollError, visible: bool) -> Transition {
        let mut next = prev.clone();
        let mut intents = Vec::new();
        let count = prev.failure.server_down_count.saturating_add(1);
        next.failure.server_down_count = count;
        debug!(kind = %err.kind(), count, "status poll failed: {err}");

        if count > self.config.failure_threshold && visible {
            warn!(count, "server is not responding");
            intents.push(Intent::DismissAllToasts);
            intents.push(Intent::ShowToast(Toast::server_not_responding()));
            next.failure = FailureState {
                server_down_count: 0,
                is_server_down: true,
            };
        }
        Transition::settled(next, intents)
    }

    fn idle_elapsed(&self, state: &IndexingState, now: Instant) -> bool {
        match state.last_indexing_activity_at {
            Some(at) => now.saturating_duration_since(at) > self.config.idle_timeout,
            None => true,
        }
    }
}

/// Work is ongoing if the server reports queued or in-flight documents, or
/// if the indexed counter moved forward between two non-empty samples. The
/// last case covers the gap between batches where both queues read zero.
fn has_progress(prev: &IndexingState, sample: &StatusSample) -> bool {
    sample.has_pending_work()
        || (sample.docs_indexed > prev.docs_indexed && prev.docs_indexed > 0)
}

/// [`IndexingStateMachine::transition`] with the default thresholds.
pub fn transition(
    prev: &MachineState,
    outcome: &PollOutcome,
    now: Instant,
    visible: bool,
) -> Transition {
    IndexingStateMachine::default().transition(prev, outcome, now, visible)
}
