// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]
//! Poller timing and publication rules, driven by a scripted source on paused time.

use potato_telemetry::{
    DataPoller, DecodeError, FetchError, OverlapPolicy, PollError, PollerConfig, PollerHandle,
    Snapshot, SnapshotSource,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

enum Step {
    Ok { round: i64, delay_ms: u64 },
    FetchErr,
    DecodeErr,
}

/// Replays a fixed script; once exhausted every call fails to fetch.
#[derive(Clone)]
struct Scripted {
    steps: Arc<Mutex<VecDeque<Step>>>,
    calls: Arc<AtomicUsize>,
}

impl Scripted {
    fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Arc::new(Mutex::new(steps.into())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn snapshot(round: i64) -> Snapshot {
    let mut snap = Snapshot::default();
    snap.population.rounds = vec![round];
    snap
}

impl SnapshotSource for Scripted {
    async fn fetch(&self) -> Result<Snapshot, PollError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Ok { round, delay_ms }) => {
                sleep(Duration::from_millis(delay_ms)).await;
                Ok(snapshot(round))
            }
            Some(Step::DecodeErr) => Err(DecodeError::Shape("ragged".into()).into()),
            Some(Step::FetchErr) | None => Err(FetchError::Transport {
                url: "scripted".into(),
                message: "connection refused".into(),
            }
            .into()),
        }
    }

    fn describe(&self) -> String {
        "scripted".into()
    }
}

fn spawn(source: &Scripted, overlap: OverlapPolicy) -> PollerHandle {
    DataPoller::new(
        source.clone(),
        PollerConfig {
            overlap,
            ..PollerConfig::default()
        },
    )
    .spawn()
}

fn latest_round(handle: &PollerHandle) -> Option<i64> {
    handle.latest().and_then(|s| s.latest_round())
}

#[tokio::test(start_paused = true)]
async fn failures_keep_last_good_snapshot_and_polling_continues() {
    let source = Scripted::new(vec![Step::Ok {
        round: 1,
        delay_ms: 0,
    }]);
    let handle = spawn(&source, OverlapPolicy::Allow);

    sleep(Duration::from_millis(5500)).await;
    assert_eq!(source.calls(), 6);
    assert_eq!(latest_round(&handle), Some(1));
    let stats = handle.stats();
    assert_eq!(stats.successes, 1);
    assert_eq!(stats.failures, 5);

    sleep(Duration::from_millis(2000)).await;
    assert_eq!(source.calls(), 8);
    assert_eq!(latest_round(&handle), Some(1));
}

#[tokio::test(start_paused = true)]
async fn stale_overlapped_response_is_discarded() {
    let source = Scripted::new(vec![
        Step::Ok {
            round: 1,
            delay_ms: 1500,
        },
        Step::Ok {
            round: 2,
            delay_ms: 100,
        },
    ]);
    let handle = spawn(&source, OverlapPolicy::Allow);

    sleep(Duration::from_millis(1200)).await;
    assert_eq!(latest_round(&handle), Some(2));

    sleep(Duration::from_millis(600)).await;
    assert_eq!(latest_round(&handle), Some(2));
    let stats = handle.stats();
    assert_eq!(stats.discarded, 1);
    assert_eq!(stats.successes, 1);
}

#[tokio::test(start_paused = true)]
async fn nothing_is_published_after_stop() {
    let source = Scripted::new(vec![
        Step::Ok {
            round: 1,
            delay_ms: 0,
        },
        Step::Ok {
            round: 2,
            delay_ms: 800,
        },
    ]);
    let mut handle = spawn(&source, OverlapPolicy::Allow);

    sleep(Duration::from_millis(1200)).await;
    assert_eq!(latest_round(&handle), Some(1));
    handle.stop();
    handle.stop();
    assert!(handle.is_stopped());

    sleep(Duration::from_millis(1300)).await;
    assert_eq!(latest_round(&handle), Some(1));
    assert!(handle.take_update().is_none());
    assert!(!handle.changed().await);
    assert_eq!(source.calls(), 2);
    assert_eq!(handle.stats().discarded, 1);
    assert_eq!(handle.stats().in_flight, 0);
}

#[tokio::test(start_paused = true)]
async fn skip_policy_waits_for_outstanding_request() {
    let source = Scripted::new(vec![Step::Ok {
        round: 1,
        delay_ms: 2500,
    }]);
    let handle = spawn(&source, OverlapPolicy::SkipWhileInFlight);

    sleep(Duration::from_millis(3200)).await;
    let stats = handle.stats();
    assert_eq!(stats.requests, 2);
    assert_eq!(stats.skipped_ticks, 2);
    assert_eq!(latest_round(&handle), Some(1));
}

#[tokio::test(start_paused = true)]
async fn each_update_is_taken_once() {
    let source = Scripted::new(vec![
        Step::Ok {
            round: 1,
            delay_ms: 0,
        },
        Step::Ok {
            round: 2,
            delay_ms: 0,
        },
    ]);
    let mut handle = spawn(&source, OverlapPolicy::Allow);

    sleep(Duration::from_millis(100)).await;
    assert_eq!(handle.take_update().and_then(|s| s.latest_round()), Some(1));
    assert!(handle.take_update().is_none());

    sleep(Duration::from_millis(1000)).await;
    assert_eq!(handle.take_update().and_then(|s| s.latest_round()), Some(2));
    assert!(handle.take_update().is_none());
}

#[tokio::test(start_paused = true)]
async fn changed_wakes_on_first_publish() {
    let source = Scripted::new(vec![Step::Ok {
        round: 7,
        delay_ms: 300,
    }]);
    let mut handle = spawn(&source, OverlapPolicy::Allow);

    assert!(handle.latest().is_none());
    assert!(handle.changed().await);
    assert_eq!(latest_round(&handle), Some(7));
}

#[tokio::test(start_paused = true)]
async fn failures_are_queued_with_labels() {
    let source = Scripted::new(vec![Step::FetchErr, Step::DecodeErr, Step::FetchErr]);
    let mut handle = spawn(&source, OverlapPolicy::Allow);

    sleep(Duration::from_millis(2500)).await;
    let failures = handle.drain_failures(10);
    let labels: Vec<_> = failures.iter().map(|f| (f.seq, f.label)).collect();
    assert_eq!(
        labels,
        vec![(1, "fetch failed"), (2, "decode failed"), (3, "fetch failed")]
    );
    assert!(failures[1].message.contains("ragged"));
    assert!(handle.drain_failures(10).is_empty());
    assert!(handle.latest().is_none());
}

#[tokio::test(start_paused = true)]
async fn failure_backlog_is_bounded() {
    let source = Scripted::new(Vec::new());
    let mut handle = DataPoller::new(
        source.clone(),
        PollerConfig {
            failure_backlog: 2,
            ..PollerConfig::default()
        },
    )
    .spawn();

    sleep(Duration::from_millis(3500)).await;
    assert_eq!(handle.stats().failures, 4);
    assert_eq!(handle.drain_failures(10).len(), 2);
}
