// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Bookkeeping-only backend: no GPU, just counters.
//!
//! Used by tests to check resource pairing and by the viewer's `--headless`
//! driver.

use crate::backend::{FrameView, MountTarget, RenderBackend, SurfaceSize};
use crate::error::SceneError;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

/// Shared counters, readable after the backend has been moved into a scene.
#[derive(Debug, Default)]
pub struct HeadlessCounters {
    uploads: AtomicU64,
    releases: AtomicU64,
    draws: AtomicU64,
    drawn_points: AtomicU64,
    resizes: AtomicU64,
    width: AtomicU32,
    height: AtomicU32,
    created: AtomicBool,
    released: AtomicBool,
}

impl HeadlessCounters {
    /// Point clouds uploaded so far.
    pub fn uploads(&self) -> u64 {
        self.uploads.load(Ordering::Relaxed)
    }

    /// Point clouds released so far.
    pub fn releases(&self) -> u64 {
        self.releases.load(Ordering::Relaxed)
    }

    /// Uploaded but not yet released.
    pub fn live_points(&self) -> u64 {
        self.uploads().saturating_sub(self.releases())
    }

    /// Frames drawn.
    pub fn draws(&self) -> u64 {
        self.draws.load(Ordering::Relaxed)
    }

    /// Point count in the most recent frame.
    pub fn drawn_points(&self) -> u64 {
        self.drawn_points.load(Ordering::Relaxed)
    }

    /// Surface resizes applied.
    pub fn resizes(&self) -> u64 {
        self.resizes.load(Ordering::Relaxed)
    }

    /// Current surface size.
    pub fn surface(&self) -> SurfaceSize {
        SurfaceSize::new(
            self.width.load(Ordering::Relaxed),
            self.height.load(Ordering::Relaxed),
        )
    }

    /// True once a backend was created.
    pub fn created(&self) -> bool {
        self.created.load(Ordering::Relaxed)
    }

    /// True once the backend was released.
    pub fn released(&self) -> bool {
        self.released.load(Ordering::Relaxed)
    }
}

/// Handle to one headless "upload".
#[derive(Debug, PartialEq, Eq)]
pub struct HeadlessPoints {
    id: u64,
    count: usize,
}

impl HeadlessPoints {
    /// Upload ordinal (1-based).
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Number of points.
    pub fn count(&self) -> usize {
        self.count
    }
}

/// Counting [`RenderBackend`].
#[derive(Debug)]
pub struct HeadlessBackend {
    counters: Arc<HeadlessCounters>,
}

impl RenderBackend for HeadlessBackend {
    type Points = HeadlessPoints;

    fn upload_points(
        &mut self,
        positions: &[f32],
        _colors: &[f32],
    ) -> Result<Self::Points, SceneError> {
        let id = self.counters.uploads.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(HeadlessPoints {
            id,
            count: positions.len() / 3,
        })
    }

    fn release_points(&mut self, _points: Self::Points) {
        self.counters.releases.fetch_add(1, Ordering::Relaxed);
    }

    fn resize_surface(&mut self, size: SurfaceSize) {
        self.counters.resizes.fetch_add(1, Ordering::Relaxed);
        self.counters.width.store(size.width, Ordering::Relaxed);
        self.counters.height.store(size.height, Ordering::Relaxed);
    }

    fn draw(&mut self, frame: &FrameView<'_, Self::Points>) -> Result<(), SceneError> {
        self.counters.draws.fetch_add(1, Ordering::Relaxed);
        let n = frame.points.map_or(0, HeadlessPoints::count);
        self.counters.drawn_points.store(n as u64, Ordering::Relaxed);
        Ok(())
    }

    fn release(&mut self) {
        self.counters.released.store(true, Ordering::Relaxed);
    }
}

/// Fixed-size [`MountTarget`] producing [`HeadlessBackend`]s.
#[derive(Debug, Clone)]
pub struct HeadlessTarget {
    size: SurfaceSize,
    counters: Arc<HeadlessCounters>,
}

impl HeadlessTarget {
    /// Target with the given pixel size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: SurfaceSize::new(width, height),
            counters: Arc::new(HeadlessCounters::default()),
        }
    }

    /// Counters shared with every backend this target creates.
    pub fn counters(&self) -> Arc<HeadlessCounters> {
        Arc::clone(&self.counters)
    }

    /// Change the reported container size.
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.size = SurfaceSize::new(width, height);
    }
}

impl MountTarget for HeadlessTarget {
    type Backend = HeadlessBackend;

    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn create_backend(&mut self, size: SurfaceSize) -> Result<HeadlessBackend, SceneError> {
        self.counters.created.store(true, Ordering::Relaxed);
        self.counters.width.store(size.width, Ordering::Relaxed);
        self.counters.height.store(size.height, Ordering::Relaxed);
        Ok(HeadlessBackend {
            counters: Arc::clone(&self.counters),
        })
    }
}
