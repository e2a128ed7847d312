// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Render backend port.
//!
//! The scene owns every backend resource it creates: point handles are moved
//! into the scene on upload and moved back out on release, so no other
//! component can hold one.

use crate::error::SceneError;
use glam::{Mat4, Vec3};

/// Rendered point size in world units.
pub const POINT_SIZE: f32 = 0.01;
/// Background colour (black).
pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Drawable surface size in physical pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl SurfaceSize {
    /// Construct a size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either side is zero (minimised window, collapsed container).
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width / height, 1.0 for empty sizes.
    pub fn aspect(self) -> f32 {
        if self.is_empty() {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Everything a backend needs to draw one frame.
#[derive(Debug)]
pub struct FrameView<'a, P> {
    /// Projection × view.
    pub view_proj: Mat4,
    /// Camera right and up vectors, for camera-facing point sprites.
    pub billboard: (Vec3, Vec3),
    /// The attached point cloud, if any.
    pub points: Option<&'a P>,
    /// Point size in world units.
    pub point_size: f32,
    /// Background colour.
    pub clear_color: [f32; 4],
}

/// GPU-side half of the scene.
pub trait RenderBackend {
    /// Handle to one uploaded point cloud.
    type Points;

    /// Upload `n` points (`positions.len() == colors.len() == 3n`, `n > 0`).
    fn upload_points(&mut self, positions: &[f32], colors: &[f32])
        -> Result<Self::Points, SceneError>;

    /// Free a handle returned by [`RenderBackend::upload_points`].
    fn release_points(&mut self, points: Self::Points);

    /// Resize the output surface. Never called with an empty size.
    fn resize_surface(&mut self, size: SurfaceSize);

    /// Draw one frame.
    fn draw(&mut self, frame: &FrameView<'_, Self::Points>) -> Result<(), SceneError>;

    /// Release the renderer itself. Called exactly once, after every point
    /// handle has been released.
    fn release(&mut self);
}

/// A container the scene can be mounted into.
pub trait MountTarget {
    /// Backend produced for this target.
    type Backend: RenderBackend;

    /// Current pixel size of the container.
    fn size(&self) -> SurfaceSize;

    /// Create a renderer sized to `size`.
    fn create_backend(&mut self, size: SurfaceSize) -> Result<Self::Backend, SceneError>;
}
