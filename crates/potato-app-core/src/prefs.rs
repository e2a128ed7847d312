// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Saved dashboard preferences (poll target, point-cloud source, camera, HUD).

use serde::{Deserialize, Serialize};

/// Default telemetry server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8050";
/// Default poll cadence in milliseconds.
pub const DEFAULT_INTERVAL_MS: u64 = 1000;

/// Saved preferences for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct DashboardPrefs {
    /// Where and how often to poll.
    pub poll: PollPrefs,
    /// Which snapshot array feeds the point cloud.
    pub cloud_source: CloudSourcePref,
    /// Orbit camera pose.
    pub camera: CameraPrefs,
    /// HUD toggles.
    pub hud: HudPrefs,
}

/// Poll target and cadence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PollPrefs {
    /// Base URL of the telemetry server (without the `/get-data` suffix).
    pub base_url: String,
    /// Poll interval in milliseconds.
    pub interval_ms: u64,
    /// Skip a tick while the previous request is still in flight.
    pub skip_while_in_flight: bool,
}

impl Default for PollPrefs {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            interval_ms: DEFAULT_INTERVAL_MS,
            skip_while_in_flight: false,
        }
    }
}

/// Snapshot array rendered as the point cloud.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CloudSourcePref {
    /// Row-major flattened scalar field.
    #[default]
    ScalarField,
    /// GPU utilization series.
    Utilization,
    /// GPU temperature series.
    Temperature,
}

/// Orbit camera pose in spherical coordinates around the target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraPrefs {
    /// Distance from the orbit target.
    pub distance: f32,
    /// Azimuth around +Y (radians).
    pub azimuth: f32,
    /// Polar angle from +Y (radians).
    pub polar: f32,
    /// Vertical field of view (degrees).
    pub fov_y_deg: f32,
}

impl Default for CameraPrefs {
    fn default() -> Self {
        Self {
            distance: 5.0,
            azimuth: 0.0,
            polar: std::f32::consts::FRAC_PI_2,
            fov_y_deg: 75.0,
        }
    }
}

/// HUD toggles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HudPrefs {
    /// Show the chart side panel.
    pub show_panels: bool,
    /// Present in vsync mode.
    pub vsync: bool,
}

impl Default for HudPrefs {
    fn default() -> Self {
        Self {
            show_panels: true,
            vsync: true,
        }
    }
}
