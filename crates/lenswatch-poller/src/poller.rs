//! Bounded polling for lens scope changes

use std::time::Duration;

use lenswatch_core::{DiffEngine, DiffResult, UpdateRequest};
use lenswatch_store::{FetchError, GraphStore, StoreConnector};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Timing of a poll: total budget and pause between unsuccessful ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub deadline_ms: u64,
    pub interval_ms: u64,
}

impl PollConfig {
    pub fn new(deadline: Duration, interval: Duration) -> Self {
        Self {
            deadline_ms: deadline.as_millis() as u64,
            interval_ms: interval.as_millis() as u64,
        }
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            deadline_ms: 20_000,
            interval_ms: 750,
        }
    }
}

/// How a poll ended successfully.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// A tick found new, modified or removed nodes.
    Updated(DiffResult),
    /// The deadline passed without a change; the diff is empty.
    TimedOut(DiffResult),
}

impl PollOutcome {
    pub fn diff(&self) -> &DiffResult {
        match self {
            PollOutcome::Updated(diff) | PollOutcome::TimedOut(diff) => diff,
        }
    }

    pub fn into_diff(self) -> DiffResult {
        match self {
            PollOutcome::Updated(diff) | PollOutcome::TimedOut(diff) => diff,
        }
    }

    pub fn timed_out(&self) -> bool {
        matches!(self, PollOutcome::TimedOut(_))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PollError {
    /// The first tick, or the tick that reached the deadline, failed.
    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("poll cancelled")]
    Cancelled,
}

/// Sending half of a cancellation signal.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Receiving half of a cancellation signal, checked between ticks.
#[derive(Debug, Clone)]
pub struct Cancellation {
    rx: watch::Receiver<bool>,
}

impl Cancellation {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested; pends forever if the handle
    /// was dropped without cancelling.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Create a linked cancel handle and signal.
pub fn cancellation() -> (CancelHandle, Cancellation) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, Cancellation { rx })
}

/// Repeats fetch, filter, hash and diff until something changed or the
/// deadline passes.
///
/// Failure policy: a failed first tick is fatal, since nothing has been
/// observed yet. Later failures count as "no update this tick", except on
/// the tick that reaches the deadline, whose failure is returned.
#[derive(Debug, Clone, Default)]
pub struct Poller {
    config: PollConfig,
}

impl Poller {
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Open a session through `connector`, poll, and release the session.
    pub async fn poll_with(
        &self,
        connector: &dyn StoreConnector,
        request: &UpdateRequest,
        cancel: &mut Cancellation,
    ) -> Result<PollOutcome, PollError> {
        let session = connector.connect().await?;
        debug!("Polling lens {} via {}", request.lens, session.name());
        self.poll(session.as_ref(), request, cancel).await
    }

    pub async fn poll(
        &self,
        store: &dyn GraphStore,
        request: &UpdateRequest,
        cancel: &mut Cancellation,
    ) -> Result<PollOutcome, PollError> {
        let engine = DiffEngine::new(&request.lens);
        let deadline = self.config.deadline();
        let started = Instant::now();
        let mut tick: u32 = 0;

        loop {
            tick += 1;
            let fetched = store.fetch_scope(&request.lens).await;
            let elapsed = started.elapsed();
            let expired = elapsed >= deadline;

            match fetched {
                Ok(graph) => {
                    let diff = engine.evaluate(graph, &request.snapshot);
                    if !diff.is_empty() {
                        info!(
                            "Lens {} updated after {} tick(s): {} updated, {} removed",
                            request.lens,
                            tick,
                            diff.updated_nodes.len(),
                            diff.removed_nodes.len()
                        );
                        return Ok(PollOutcome::Updated(diff));
                    }
                    if expired {
                        info!("Lens {} unchanged after {} tick(s), giving up", request.lens, tick);
                        return Ok(PollOutcome::TimedOut(diff));
                    }
                    debug!("Lens {} unchanged at tick {}", request.lens, tick);
                }
                Err(e) if tick == 1 => {
                    warn!("First fetch of lens {} failed: {}", request.lens, e);
                    return Err(e.into());
                }
                Err(e) if expired => {
                    warn!("Fetch of lens {} still failing at deadline: {}", request.lens, e);
                    return Err(e.into());
                }
                Err(e) => {
                    warn!("Fetch of lens {} failed at tick {}, retrying: {}", request.lens, tick, e);
                }
            }

            let pause = self.config.interval().min(deadline - elapsed);
            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = cancel.cancelled() => {
                    info!("Poll of lens {} cancelled at tick {}", request.lens, tick);
                    return Err(PollError::Cancelled);
                }
            }
        }
    }
}
