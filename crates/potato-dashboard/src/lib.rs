// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Dashboard container for the potato monitor.
//!
//! [`Dashboard`] owns the activation lifecycle: it starts a [`SnapshotFeed`]
//! and mounts the scene, turns each new snapshot into chart panel models and a
//! point cloud, and on deactivation stops the feed before disposing the scene.

mod cloud_source;
mod colormap;
mod container;
mod feed;
mod panels;

pub use cloud_source::CloudSource;
pub use colormap::viridis;
pub use container::{Dashboard, DashboardError, FrameReport, FAILURE_TOAST_TTL};
pub use feed::SnapshotFeed;
pub use panels::{GpuPanel, Heatmap, Panels, PopulationPanel, Series};
