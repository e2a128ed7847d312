// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Point-cloud scene for the potato monitor.
//!
//! - [`build_point_cloud`] maps a numeric array onto a 100-wide grid of
//!   coloured points.
//! - [`SceneManager`] owns the viewport (camera, orbit controls, backend, root
//!   node) through an explicit `Unmounted → Mounted → Disposed` lifecycle.
//! - [`RenderLoop`] is the per-frame tick, cancelled when the scene is disposed.
//!
//! Renderers plug in through [`RenderBackend`]; [`HeadlessBackend`] is the
//! bookkeeping-only implementation used by tests and the headless driver.

mod backend;
mod camera;
mod controls;
mod error;
mod headless;
mod point_cloud;
mod render_loop;
mod scene;

pub use backend::{FrameView, MountTarget, RenderBackend, SurfaceSize, CLEAR_COLOR, POINT_SIZE};
pub use camera::PerspectiveCamera;
pub use controls::{OrbitControls, OrbitPose};
pub use error::SceneError;
pub use headless::{HeadlessBackend, HeadlessCounters, HeadlessPoints, HeadlessTarget};
pub use point_cloud::{build_point_cloud, PointCloud, GRID_WIDTH, VALUE_MAX};
pub use render_loop::{CancelToken, RenderLoop, TickOutcome};
pub use scene::{PointsNode, SceneManager, SceneRoot, SceneState};
