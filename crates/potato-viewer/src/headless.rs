// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Windowless driver: the same dashboard wiring against the counting backend,
//! ticked at 60 Hz next to the poller on one current-thread runtime.

use crate::cli::poller_config;
use anyhow::Result;
use potato_app_core::prefs::DashboardPrefs;
use potato_dashboard::{CloudSource, Dashboard, DashboardError};
use potato_scene::{HeadlessBackend, HeadlessTarget};
use potato_telemetry::{DataPoller, PollerConfig, PollerHandle, SnapshotSource};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::{self, MissedTickBehavior};
use tracing::{info, instrument};

pub const FRAME_INTERVAL: Duration = Duration::from_micros(16_667);
const SURFACE: (u32, u32) = (1280, 720);

/// What a headless run did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessSummary {
    pub frames: u64,
    pub snapshots: u64,
    pub failures: u64,
    /// Points attached when the run ended.
    pub points: usize,
    pub uploads: u64,
    pub releases: u64,
}

/// Run until `frames` frames were rendered or Ctrl-C.
pub fn run<S: SnapshotSource>(
    source: S,
    prefs: &DashboardPrefs,
    frames: Option<u64>,
) -> Result<HeadlessSummary> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let config = poller_config(&prefs.poll);
    let cloud_source = CloudSource::from(prefs.cloud_source);
    let summary = runtime.block_on(async move {
        let interrupted = async {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        };
        drive(source, config, cloud_source, frames, interrupted).await
    })?;
    Ok(summary)
}

#[instrument(skip_all, fields(cloud_source = cloud_source.label(), frames = ?frames))]
pub async fn drive<S, F>(
    source: S,
    config: PollerConfig,
    cloud_source: CloudSource,
    frames: Option<u64>,
    shutdown: F,
) -> Result<HeadlessSummary, DashboardError>
where
    S: SnapshotSource,
    F: Future<Output = ()>,
{
    let mut target = HeadlessTarget::new(SURFACE.0, SURFACE.1);
    let counters = target.counters();
    let mut dashboard: Dashboard<HeadlessBackend, PollerHandle> = Dashboard::new(cloud_source);
    dashboard.activate(&mut target, || DataPoller::new(source, config).spawn())?;

    let mut summary = HeadlessSummary::default();
    let mut ticker = time::interval(FRAME_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    while frames.is_none_or(|limit| summary.frames < limit) {
        tokio::select! {
            _ = ticker.tick() => {
                let report = dashboard.frame(Instant::now())?;
                summary.frames += 1;
                summary.failures += report.failures.len() as u64;
                if report.applied_snapshot {
                    summary.snapshots += 1;
                    info!(
                        frame = summary.frames,
                        points = dashboard.scene().point_count(),
                        "snapshot applied"
                    );
                }
            }
            () = &mut shutdown => {
                info!("interrupted");
                break;
            }
        }
    }

    summary.points = dashboard.scene().point_count();
    dashboard.deactivate();
    summary.uploads = counters.uploads();
    summary.releases = counters.releases();
    info!("headless run finished");
    Ok(summary)
}
