// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Fixed-interval snapshot poller.
//!
//! One tokio task owns the ticker; every tick spawns one request task. Request
//! results are published through a `watch` channel tagged with the request's
//! sequence number, so:
//!
//! - a failure leaves the previous snapshot in place,
//! - a slow response that loses the race to a newer one is dropped,
//! - nothing is published once [`PollerHandle::stop`] has returned.

use crate::error::PollError;
use crate::snapshot::Snapshot;
use crate::source::SnapshotSource;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

/// Poll cadence used when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// What to do on a tick while an earlier request is still pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverlapPolicy {
    /// Start a fresh request anyway; the newest response wins.
    #[default]
    Allow,
    /// Skip the tick until the outstanding request resolves.
    SkipWhileInFlight,
}

/// Poller settings.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Time between poll ticks.
    pub interval: Duration,
    /// Overlap handling for slow requests.
    pub overlap: OverlapPolicy,
    /// Max failures queued for [`PollerHandle::drain_failures`]; extra ones are dropped.
    pub failure_backlog: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            overlap: OverlapPolicy::Allow,
            failure_backlog: 64,
        }
    }
}

/// Counters exposed for HUDs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    /// Requests issued.
    pub requests: u64,
    /// Snapshots published.
    pub successes: u64,
    /// Fetch/decode failures.
    pub failures: u64,
    /// Results dropped because they were stale or arrived after stop.
    pub discarded: u64,
    /// Ticks skipped under [`OverlapPolicy::SkipWhileInFlight`].
    pub skipped_ticks: u64,
    /// Requests currently pending.
    pub in_flight: u64,
}

/// One failed poll, as queued for the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollFailure {
    /// Sequence number of the failed request.
    pub seq: u64,
    /// Short category ("fetch failed" / "decode failed").
    pub label: &'static str,
    /// Full error text.
    pub message: String,
}

#[derive(Debug, Clone)]
struct Published {
    seq: u64,
    snapshot: Arc<Snapshot>,
}

struct Shared {
    stopped: AtomicBool,
    next_seq: AtomicU64,
    in_flight: AtomicU64,
    requests: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    discarded: AtomicU64,
    skipped: AtomicU64,
    latest: watch::Sender<Option<Published>>,
    failure_tx: mpsc::SyncSender<PollFailure>,
}

impl Shared {
    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Flip the stop flag under the watch lock so no publish can straddle it.
    /// Returns true on the first call.
    fn mark_stopped(&self) -> bool {
        let mut first = false;
        self.latest.send_if_modified(|_| {
            first = !self.stopped.swap(true, Ordering::AcqRel);
            false
        });
        first
    }

    fn complete(&self, seq: u64, result: Result<Snapshot, PollError>) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
        match result {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                let published = self.latest.send_if_modified(|current| {
                    if self.is_stopped() || current.as_ref().is_some_and(|p| p.seq > seq) {
                        return false;
                    }
                    *current = Some(Published { seq, snapshot });
                    true
                });
                if published {
                    self.successes.fetch_add(1, Ordering::Relaxed);
                    debug!(seq, "snapshot published");
                } else {
                    self.discarded.fetch_add(1, Ordering::Relaxed);
                    debug!(seq, stopped = self.is_stopped(), "response discarded");
                }
            }
            Err(_) if self.is_stopped() => {
                self.discarded.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                warn!(seq, error = %err, "{}", err.label());
                let _ = self.failure_tx.try_send(PollFailure {
                    seq,
                    label: err.label(),
                    message: err.to_string(),
                });
            }
        }
    }

    fn stats(&self) -> PollStats {
        PollStats {
            requests: self.requests.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            skipped_ticks: self.skipped.load(Ordering::Relaxed),
            in_flight: self.in_flight.load(Ordering::Relaxed),
        }
    }
}

/// Fixed-interval poller over a [`SnapshotSource`].
pub struct DataPoller<S> {
    source: Arc<S>,
    config: PollerConfig,
}

impl<S: SnapshotSource> DataPoller<S> {
    /// Create a poller; nothing runs until [`DataPoller::spawn`].
    pub fn new(source: S, config: PollerConfig) -> Self {
        Self {
            source: Arc::new(source),
            config,
        }
    }

    /// Start polling on the current tokio runtime.
    ///
    /// Must be called from within a runtime context.
    pub fn spawn(self) -> PollerHandle {
        self.spawn_on(&tokio::runtime::Handle::current())
    }

    /// Start polling on the given runtime.
    pub fn spawn_on(self, runtime: &tokio::runtime::Handle) -> PollerHandle {
        let (latest, rx) = watch::channel(None);
        let (failure_tx, failure_rx) = mpsc::sync_channel(self.config.failure_backlog.max(1));
        let shared = Arc::new(Shared {
            stopped: AtomicBool::new(false),
            next_seq: AtomicU64::new(0),
            in_flight: AtomicU64::new(0),
            requests: AtomicU64::new(0),
            successes: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            latest,
            failure_tx,
        });
        let task = runtime.spawn(run(
            self.source,
            Arc::clone(&shared),
            self.config,
            runtime.clone(),
        ));
        PollerHandle {
            shared,
            rx,
            failure_rx,
            task: Some(task),
        }
    }
}

#[instrument(skip_all, fields(target = %source.describe(), interval_ms = config.interval.as_millis()))]
async fn run<S: SnapshotSource>(
    source: Arc<S>,
    shared: Arc<Shared>,
    config: PollerConfig,
    runtime: tokio::runtime::Handle,
) {
    let mut ticker = time::interval(config.interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!("poller started");

    loop {
        ticker.tick().await;
        if shared.is_stopped() {
            break;
        }
        if config.overlap == OverlapPolicy::SkipWhileInFlight
            && shared.in_flight.load(Ordering::Acquire) > 0
        {
            shared.skipped.fetch_add(1, Ordering::Relaxed);
            debug!("previous request still in flight; tick skipped");
            continue;
        }

        let seq = shared.next_seq.fetch_add(1, Ordering::Relaxed) + 1;
        shared.requests.fetch_add(1, Ordering::Relaxed);
        shared.in_flight.fetch_add(1, Ordering::AcqRel);

        let source = Arc::clone(&source);
        let shared = Arc::clone(&shared);
        runtime.spawn(async move {
            let result = source.fetch().await;
            shared.complete(seq, result);
        });
    }

    info!("poller loop exited");
}

/// Consumer side of a running [`DataPoller`].
///
/// Dropping the handle stops the poller.
pub struct PollerHandle {
    shared: Arc<Shared>,
    rx: watch::Receiver<Option<Published>>,
    failure_rx: mpsc::Receiver<PollFailure>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Last successfully published snapshot, if any.
    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.rx.borrow().as_ref().map(|p| Arc::clone(&p.snapshot))
    }

    /// The newest snapshot if it has not been taken yet; `None` otherwise or once stopped.
    pub fn take_update(&mut self) -> Option<Arc<Snapshot>> {
        if self.shared.is_stopped() {
            return None;
        }
        match self.rx.has_changed() {
            Ok(true) => self
                .rx
                .borrow_and_update()
                .as_ref()
                .map(|p| Arc::clone(&p.snapshot)),
            _ => None,
        }
    }

    /// Wait until a new snapshot is published. Returns false once stopped.
    pub async fn changed(&mut self) -> bool {
        if self.shared.is_stopped() {
            return false;
        }
        self.rx.changed().await.is_ok() && !self.shared.is_stopped()
    }

    /// Current counters.
    pub fn stats(&self) -> PollStats {
        self.shared.stats()
    }

    /// Drain up to `max` queued failures.
    pub fn drain_failures(&mut self, max: usize) -> Vec<PollFailure> {
        self.failure_rx.try_iter().take(max).collect()
    }

    /// Stop polling. In-flight requests finish but their results are discarded.
    /// Idempotent.
    pub fn stop(&mut self) {
        if self.shared.mark_stopped() {
            info!("poller stopped");
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// True once [`PollerHandle::stop`] has been called.
    pub fn is_stopped(&self) -> bool {
        self.shared.is_stopped()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
