//! Perpetual `/status` polling loop.
//!
//! Cycles form a strict chain: request, deliver the outcome, wait, repeat.
//! A request is never issued while the previous one is in flight, so
//! consumers see samples in order and need no locking around the state they
//! fold them into.

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use precept_core::ClientConfig;
use precept_core::PollError;
use precept_core::PollOutcome;
use precept_protocol::StatusSample;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;

const EVENT_BUFFER: usize = 16;

/// Anything that can answer a status request.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self) -> Result<StatusSample, PollError>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Reads tokio's clock so paused test runtimes stay consistent.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollerConfig {
    pub timeout: Duration,
    pub success_interval: Duration,
    pub failure_interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

impl From<&ClientConfig> for PollerConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            timeout: config.status_timeout(),
            success_interval: config.success_interval(),
            failure_interval: config.failure_interval(),
        }
    }
}

/// One completed poll cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollEvent {
    pub outcome: PollOutcome,
    pub observed_at: Instant,
}

pub struct StatusPoller {
    source: Arc<dyn StatusSource>,
    clock: Arc<dyn Clock>,
    config: PollerConfig,
}

impl StatusPoller {
    pub fn new(source: Arc<dyn StatusSource>, config: PollerConfig) -> Self {
        Self {
            source,
            clock: Arc::new(TokioClock),
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// A single request, bounded by the configured timeout.
    pub async fn poll_once(&self) -> PollOutcome {
        match timeout(self.config.timeout, self.source.fetch_status()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(PollError::Timeout),
        }
    }

    /// Poll until `cancel` fires or the receiving side goes away. There is
    /// no retry limit: failures simply wait `failure_interval` and try again.
    pub async fn run(self, events: mpsc::Sender<PollEvent>, cancel: CancellationToken) {
        info!("status poller started");
        loop {
            if cancel.is_cancelled() {
                break;
            }
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                outcome = self.poll_once() => outcome,
            };
            let delay = match &outcome {
                Ok(_) => self.config.success_interval,
                Err(err) => {
                    debug!(kind = %err.kind(), "status poll failed: {err}");
                    self.config.failure_interval
                }
            };
            let event = PollEvent {
                outcome,
                observed_at: self.clock.now(),
            };
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                sent = events.send(event) => {
                    if sent.is_err() {
                        debug!("status event receiver dropped");
                        break;
                    }
                }
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = sleep(delay) => {}
            }
        }
        info!("status poller stopped");
    }

    /// Start [`StatusPoller::run`] on the current runtime.
    pub fn spawn(self, cancel: CancellationToken) -> (JoinHandle<()>, mpsc::Receiver<PollEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let handle = tokio::spawn(self.run(tx, cancel));
        (handle, rx)
    }
}
