// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]
//! A live `DataPoller` driving the dashboard through `PollerHandle`.

use potato_dashboard::{CloudSource, Dashboard};
use potato_scene::{HeadlessBackend, HeadlessTarget};
use potato_telemetry::{
    DataPoller, FetchError, PollError, PollerConfig, PollerHandle, Snapshot, SnapshotSource,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// Every odd call succeeds with a `calls x 10` grid, every even call fails.
#[derive(Clone, Default)]
struct Flaky {
    calls: Arc<AtomicU64>,
}

impl SnapshotSource for Flaky {
    async fn fetch(&self) -> Result<Snapshot, PollError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n % 2 == 0 {
            return Err(FetchError::Status {
                url: "flaky".into(),
                status: 503,
            }
            .into());
        }
        let mut snap = Snapshot::default();
        snap.population.rounds = vec![n as i64];
        snap.scalar_field = Some(vec![vec![100.0; 10]; n as usize]);
        Ok(snap)
    }

    fn describe(&self) -> String {
        "flaky".into()
    }
}

#[tokio::test(start_paused = true)]
async fn poller_output_lands_in_scene_and_stops_on_deactivate() {
    let source = Flaky::default();
    let calls = Arc::clone(&source.calls);
    let mut target = HeadlessTarget::new(320, 240);
    let counters = target.counters();
    let mut dashboard: Dashboard<HeadlessBackend, PollerHandle> =
        Dashboard::new(CloudSource::ScalarField);
    dashboard
        .activate(&mut target, || {
            DataPoller::new(source, PollerConfig::default()).spawn()
        })
        .unwrap();

    sleep(Duration::from_millis(100)).await;
    let report = dashboard.frame(Instant::now()).unwrap();
    assert!(report.applied_snapshot);
    assert_eq!(dashboard.scene().point_count(), 10);

    sleep(Duration::from_millis(1000)).await;
    let report = dashboard.frame(Instant::now()).unwrap();
    assert!(!report.applied_snapshot);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(dashboard.scene().point_count(), 10);

    sleep(Duration::from_millis(1000)).await;
    dashboard.frame(Instant::now()).unwrap();
    assert_eq!(dashboard.scene().point_count(), 30);
    assert_eq!(counters.live_points(), 1);

    dashboard.deactivate();
    let seen = calls.load(Ordering::SeqCst);
    sleep(Duration::from_millis(5000)).await;
    assert_eq!(calls.load(Ordering::SeqCst), seen);
    assert!(counters.released());
    assert_eq!(counters.live_points(), 0);
}
