// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Dashboard lifecycle and per-frame wiring.

use crate::cloud_source::CloudSource;
use crate::feed::SnapshotFeed;
use crate::panels::Panels;
use potato_app_core::toast::{ToastKind, ToastOrigin, ToastService};
use potato_scene::{
    build_point_cloud, MountTarget, RenderBackend, RenderLoop, SceneError, SceneManager,
    TickOutcome,
};
use potato_telemetry::{PollFailure, Snapshot};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// How long a poll-failure toast stays up after its last repeat.
pub const FAILURE_TOAST_TTL: Duration = Duration::from_secs(6);

const FAILURES_PER_FRAME: usize = 16;

/// Dashboard lifecycle misuse or a scene failure.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// `activate` called twice.
    #[error("dashboard is already active")]
    AlreadyActive,
    /// Operation attempted after deactivation.
    #[error("dashboard has been deactivated")]
    Deactivated,
    /// Operation needs an active dashboard.
    #[error("dashboard is not active")]
    NotActive,
    /// Scene error (lifecycle bug or backend failure).
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// What one [`Dashboard::frame`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameReport {
    /// Outcome of the render tick.
    pub outcome: TickOutcome,
    /// A new snapshot was applied before drawing.
    pub applied_snapshot: bool,
    /// Poll failures drained this frame.
    pub failures: Vec<PollFailure>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Active,
    Deactivated,
}

/// Wires a [`SnapshotFeed`] into chart panels and a [`SceneManager`].
///
/// Dropping an active dashboard deactivates it.
pub struct Dashboard<B: RenderBackend, F: SnapshotFeed> {
    phase: Phase,
    scene: SceneManager<B>,
    render_loop: Option<RenderLoop>,
    feed: Option<F>,
    snapshot: Option<Arc<Snapshot>>,
    panels: Option<Panels>,
    cloud_source: CloudSource,
    toasts: ToastService,
}

impl<B: RenderBackend, F: SnapshotFeed> Dashboard<B, F> {
    /// Idle dashboard rendering `cloud_source` as the point cloud.
    pub fn new(cloud_source: CloudSource) -> Self {
        Self {
            phase: Phase::Idle,
            scene: SceneManager::new(),
            render_loop: None,
            feed: None,
            snapshot: None,
            panels: None,
            cloud_source,
            toasts: ToastService::new(8),
        }
    }

    /// Start intake via `start_feed`, then mount the scene into `target`.
    ///
    /// If mounting fails the feed is stopped again before the error is returned.
    pub fn activate<T, S>(&mut self, target: &mut T, start_feed: S) -> Result<(), DashboardError>
    where
        T: MountTarget<Backend = B>,
        S: FnOnce() -> F,
    {
        match self.phase {
            Phase::Idle => {}
            Phase::Active => return Err(DashboardError::AlreadyActive),
            Phase::Deactivated => return Err(DashboardError::Deactivated),
        }
        let mut feed = start_feed();
        match self.scene.mount(target) {
            Ok(render_loop) => {
                self.render_loop = Some(render_loop);
                self.feed = Some(feed);
                self.phase = Phase::Active;
                info!(cloud_source = self.cloud_source.label(), "dashboard activated");
                Ok(())
            }
            Err(err) => {
                feed.stop();
                Err(err.into())
            }
        }
    }

    /// Pull the newest snapshot (if any) and queued failures from the feed.
    ///
    /// Failures become toasts stamped `now`. A snapshot that cannot be applied
    /// is logged and toasted rather than returned, so the previous frame keeps
    /// rendering. Returns whether a snapshot was applied plus the drained
    /// failures. Does nothing unless active.
    pub fn pump(&mut self, now: Instant) -> Result<(bool, Vec<PollFailure>), DashboardError> {
        if self.phase != Phase::Active {
            return Ok((false, Vec::new()));
        }
        let Some(feed) = self.feed.as_mut() else {
            return Ok((false, Vec::new()));
        };
        let update = feed.take_update();
        let failures = feed.drain_failures(FAILURES_PER_FRAME);

        for failure in &failures {
            self.toasts.push(
                ToastKind::Warn,
                ToastOrigin::Poller,
                failure.label,
                Some(failure.message.clone()),
                FAILURE_TOAST_TTL,
                now,
            );
        }

        let applied = match update {
            Some(snapshot) => match self.apply_snapshot(snapshot) {
                Ok(()) => true,
                Err(err) => {
                    warn!(error = %err, "snapshot not applied; keeping previous frame");
                    self.toasts.push(
                        ToastKind::Error,
                        ToastOrigin::Scene,
                        "Snapshot not applied",
                        Some(err.to_string()),
                        FAILURE_TOAST_TTL,
                        now,
                    );
                    false
                }
            },
            None => false,
        };
        Ok((applied, failures))
    }

    /// Swap the point cloud, then replace the held snapshot and panels.
    ///
    /// On error nothing is committed: panels, snapshot and scene geometry
    /// all still describe the previous snapshot.
    pub fn apply_snapshot(&mut self, snapshot: Arc<Snapshot>) -> Result<(), DashboardError> {
        self.ensure_active()?;
        let data = self.cloud_source.extract(&snapshot);
        self.scene.set_point_cloud(&build_point_cloud(&data))?;
        if snapshot.scalar_field.is_none() {
            debug!("snapshot has no scalar field; heatmap omitted");
        }
        self.panels = Some(Panels::from_snapshot(&snapshot));
        self.snapshot = Some(snapshot);
        Ok(())
    }

    /// Pump the feed, then run one render tick.
    pub fn frame(&mut self, now: Instant) -> Result<FrameReport, DashboardError> {
        let (applied_snapshot, failures) = self.pump(now)?;
        self.toasts.retain_visible(now);
        let outcome = match self.render_loop.as_mut() {
            Some(render_loop) => render_loop.tick(&mut self.scene)?,
            None => TickOutcome::Cancelled,
        };
        Ok(FrameReport {
            outcome,
            applied_snapshot,
            failures,
        })
    }

    /// Propagate a container resize to the scene.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), DashboardError> {
        self.ensure_active()?;
        self.scene.resize(width, height)?;
        Ok(())
    }

    /// Switch the point-cloud input, rebuilding from the held snapshot.
    pub fn set_cloud_source(&mut self, source: CloudSource) -> Result<(), DashboardError> {
        if source == self.cloud_source {
            return Ok(());
        }
        if let (Phase::Active, Some(snapshot)) = (self.phase, self.snapshot.as_ref()) {
            let data = source.extract(snapshot);
            self.scene.set_point_cloud(&build_point_cloud(&data))?;
        }
        self.cloud_source = source;
        info!(cloud_source = source.label(), "point-cloud source changed");
        Ok(())
    }

    /// Stop the feed, then dispose the scene. Idempotent.
    pub fn deactivate(&mut self) {
        if self.phase == Phase::Deactivated {
            return;
        }
        if let Some(mut feed) = self.feed.take() {
            feed.stop();
        }
        self.scene.dispose();
        if self.phase == Phase::Active {
            info!("dashboard deactivated");
        }
        self.phase = Phase::Deactivated;
    }

    /// True between `activate` and `deactivate`.
    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    /// Last applied snapshot.
    pub fn snapshot(&self) -> Option<&Arc<Snapshot>> {
        self.snapshot.as_ref()
    }

    /// Panel models; `None` until the first snapshot arrives.
    pub fn panels(&self) -> Option<&Panels> {
        self.panels.as_ref()
    }

    /// Current point-cloud input.
    pub fn cloud_source(&self) -> CloudSource {
        self.cloud_source
    }

    /// The scene.
    pub fn scene(&self) -> &SceneManager<B> {
        &self.scene
    }

    /// The scene, mutably (camera input, overlay passes).
    pub fn scene_mut(&mut self) -> &mut SceneManager<B> {
        &mut self.scene
    }

    /// Frames rendered since activation.
    pub fn ticks(&self) -> u64 {
        self.render_loop.as_ref().map_or(0, RenderLoop::ticks)
    }

    /// Toast queue.
    pub fn toasts(&self) -> &ToastService {
        &self.toasts
    }

    /// Toast queue, mutably (for non-poller notices).
    pub fn toasts_mut(&mut self) -> &mut ToastService {
        &mut self.toasts
    }

    fn ensure_active(&self) -> Result<(), DashboardError> {
        match self.phase {
            Phase::Active => Ok(()),
            Phase::Idle => Err(DashboardError::NotActive),
            Phase::Deactivated => Err(DashboardError::Deactivated),
        }
    }
}

impl<B: RenderBackend, F: SnapshotFeed> Drop for Dashboard<B, F> {
    fn drop(&mut self) {
        if self.phase == Phase::Active {
            warn!("dashboard dropped while active; deactivating");
        }
        self.deactivate();
    }
}
