// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Damped orbit controls.
//!
//! Input accumulates into pending rotate/zoom/pan deltas; [`OrbitControls::update`]
//! applies a `damping_factor` share of them to the camera each frame and decays
//! the remainder, so motion eases out over several frames after input stops.

use crate::camera::PerspectiveCamera;
use glam::{Vec2, Vec3};
use std::f32::consts::{PI, TAU};

const EPS: f32 = 1e-6;
const POLAR_MARGIN: f32 = 1e-3;

/// Camera pose in spherical coordinates around the orbit target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitPose {
    /// Distance from the target.
    pub distance: f32,
    /// Angle around +Y, measured from +Z (radians).
    pub azimuth: f32,
    /// Angle from +Y (radians).
    pub polar: f32,
}

impl OrbitPose {
    fn offset(self) -> Vec3 {
        let (sp, cp) = self.polar.sin_cos();
        let (sa, ca) = self.azimuth.sin_cos();
        Vec3::new(sp * sa, cp, sp * ca) * self.distance
    }

    fn from_offset(offset: Vec3) -> Self {
        let distance = offset.length();
        if distance < EPS {
            return Self {
                distance: 0.0,
                azimuth: 0.0,
                polar: PI / 2.0,
            };
        }
        Self {
            distance,
            azimuth: offset.x.atan2(offset.z),
            polar: (offset.y / distance).clamp(-1.0, 1.0).acos(),
        }
    }
}

/// Orbit/zoom/pan camera controller.
#[derive(Clone, Debug)]
pub struct OrbitControls {
    /// Orbit centre.
    pub target: Vec3,
    /// Apply damping (ease-out) to motion.
    pub enable_damping: bool,
    /// Share of pending motion applied per update, in `(0, 1]`.
    pub damping_factor: f32,
    /// Rotation speed multiplier.
    pub rotate_speed: f32,
    /// Zoom speed multiplier.
    pub zoom_speed: f32,
    /// Closest allowed distance to the target.
    pub min_distance: f32,
    /// Farthest allowed distance from the target.
    pub max_distance: f32,
    delta_azimuth: f32,
    delta_polar: f32,
    scale: f32,
    pan_offset: Vec3,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.5,
            max_distance: 500.0,
            delta_azimuth: 0.0,
            delta_polar: 0.0,
            scale: 1.0,
            pan_offset: Vec3::ZERO,
        }
    }
}

impl OrbitControls {
    /// Controls orbiting the origin with default tuning.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a rotation from a pointer drag of `delta` pixels in a viewport
    /// `viewport_height` pixels tall. A full-height drag is one full turn.
    pub fn drag_rotate(&mut self, delta: Vec2, viewport_height: f32) {
        let h = viewport_height.max(1.0);
        self.rotate_left(TAU * delta.x / h * self.rotate_speed);
        self.rotate_up(TAU * delta.y / h * self.rotate_speed);
    }

    /// Queue an azimuth change.
    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_azimuth -= angle;
    }

    /// Queue a polar change.
    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_polar -= angle;
    }

    /// Queue a zoom from scroll `steps` (positive = towards the target).
    pub fn zoom(&mut self, steps: f32) {
        let factor = 0.95_f32.powf(self.zoom_speed * steps.abs());
        if steps > 0.0 {
            self.scale *= factor;
        } else if steps < 0.0 {
            self.scale /= factor;
        }
    }

    /// Queue a pan from a pointer drag of `delta` pixels, scaled so the point
    /// under the cursor at the target's depth follows the pointer.
    pub fn drag_pan(&mut self, delta: Vec2, viewport_height: f32, camera: &PerspectiveCamera) {
        let h = viewport_height.max(1.0);
        let distance = (camera.position - self.target).length();
        let half_height = distance * (camera.fov_y_deg.to_radians() * 0.5).tan();
        let (right, up) = camera.basis();
        self.pan_offset += right * (-2.0 * delta.x * half_height / h);
        self.pan_offset += up * (2.0 * delta.y * half_height / h);
    }

    /// Current pose of `camera` relative to the target.
    pub fn pose(&self, camera: &PerspectiveCamera) -> OrbitPose {
        OrbitPose::from_offset(camera.position - self.target)
    }

    /// Place `camera` at `pose` immediately, dropping pending motion.
    pub fn set_pose(&mut self, camera: &mut PerspectiveCamera, pose: OrbitPose) {
        let pose = OrbitPose {
            distance: pose.distance.clamp(self.min_distance, self.max_distance),
            azimuth: pose.azimuth,
            polar: pose.polar.clamp(POLAR_MARGIN, PI - POLAR_MARGIN),
        };
        self.reset_motion();
        camera.target = self.target;
        camera.position = self.target + pose.offset();
    }

    /// True while queued motion has not yet fully decayed.
    pub fn is_moving(&self) -> bool {
        self.delta_azimuth.abs() > EPS
            || self.delta_polar.abs() > EPS
            || (self.scale - 1.0).abs() > EPS
            || self.pan_offset.length_squared() > EPS * EPS
    }

    /// Apply pending motion to `camera`. Returns true when the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let before = (camera.position, camera.target);
        let mut pose = OrbitPose::from_offset(camera.position - self.target);
        let share = if self.enable_damping {
            self.damping_factor.clamp(EPS, 1.0)
        } else {
            1.0
        };

        pose.azimuth += self.delta_azimuth * share;
        pose.polar = (pose.polar + self.delta_polar * share).clamp(POLAR_MARGIN, PI - POLAR_MARGIN);
        pose.distance = (pose.distance * self.scale).clamp(self.min_distance, self.max_distance);
        self.target += self.pan_offset * share;

        camera.target = self.target;
        camera.position = self.target + pose.offset();

        if self.enable_damping {
            self.delta_azimuth *= 1.0 - share;
            self.delta_polar *= 1.0 - share;
            self.pan_offset *= 1.0 - share;
            if !self.is_moving() {
                self.reset_motion();
            }
        } else {
            self.reset_motion();
        }
        self.scale = 1.0;

        camera.position.distance_squared(before.0) > EPS * EPS
            || camera.target.distance_squared(before.1) > EPS * EPS
    }

    fn reset_motion(&mut self) {
        self.delta_azimuth = 0.0;
        self.delta_polar = 0.0;
        self.scale = 1.0;
        self.pan_offset = Vec3::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn idle_update_keeps_default_pose() {
        let mut cam = PerspectiveCamera::default();
        let mut controls = OrbitControls::new();
        assert!(!controls.update(&mut cam));
        assert_relative_eq!(cam.position.z, 5.0, epsilon = 1e-5);
        assert_relative_eq!(cam.position.x, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn damped_rotation_eases_out() {
        let mut cam = PerspectiveCamera::default();
        let mut controls = OrbitControls::new();
        controls.rotate_left(-1.0);

        assert!(controls.update(&mut cam));
        let first = controls.pose(&cam).azimuth;
        assert_relative_eq!(first, 0.05, epsilon = 1e-4);

        controls.update(&mut cam);
        let second = controls.pose(&cam).azimuth - first;
        assert!(second < 0.05 && second > 0.0);

        for _ in 0..2000 {
            controls.update(&mut cam);
        }
        assert!(!controls.is_moving());
        assert_relative_eq!(controls.pose(&cam).azimuth, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn undamped_rotation_applies_at_once() {
        let mut cam = PerspectiveCamera::default();
        let mut controls = OrbitControls {
            enable_damping: false,
            ..OrbitControls::default()
        };
        controls.rotate_left(-0.5);
        controls.update(&mut cam);
        assert_relative_eq!(controls.pose(&cam).azimuth, 0.5, epsilon = 1e-5);
        assert!(!controls.is_moving());
    }

    #[test]
    fn zoom_respects_distance_limits() {
        let mut cam = PerspectiveCamera::default();
        let mut controls = OrbitControls::new();
        for _ in 0..500 {
            controls.zoom(10.0);
            controls.update(&mut cam);
        }
        assert_relative_eq!(controls.pose(&cam).distance, controls.min_distance, epsilon = 1e-4);
        for _ in 0..2000 {
            controls.zoom(-10.0);
            controls.update(&mut cam);
        }
        assert_relative_eq!(controls.pose(&cam).distance, controls.max_distance, epsilon = 1e-2);
    }

    #[test]
    fn polar_angle_never_flips_over_the_pole() {
        let mut cam = PerspectiveCamera::default();
        let mut controls = OrbitControls {
            enable_damping: false,
            ..OrbitControls::default()
        };
        controls.rotate_up(10.0);
        controls.update(&mut cam);
        let pose = controls.pose(&cam);
        assert!(pose.polar >= POLAR_MARGIN * 0.5);
        assert!(cam.position.y > 0.0);
    }

    #[test]
    fn pan_moves_target_and_camera_together() {
        let mut cam = PerspectiveCamera::default();
        let mut controls = OrbitControls {
            enable_damping: false,
            ..OrbitControls::default()
        };
        controls.drag_pan(Vec2::new(-100.0, 0.0), 600.0, &cam);
        controls.update(&mut cam);
        assert!(controls.target.x > 0.0);
        assert_relative_eq!(cam.position.x, controls.target.x, epsilon = 1e-5);
        assert_relative_eq!(cam.position.z, 5.0, epsilon = 1e-4);
    }

    #[test]
    fn set_pose_round_trips_through_pose() {
        let mut cam = PerspectiveCamera::default();
        let mut controls = OrbitControls::new();
        let want = OrbitPose {
            distance: 8.0,
            azimuth: 0.7,
            polar: 1.1,
        };
        controls.set_pose(&mut cam, want);
        let got = controls.pose(&cam);
        assert_relative_eq!(got.distance, 8.0, epsilon = 1e-4);
        assert_relative_eq!(got.azimuth, 0.7, epsilon = 1e-4);
        assert_relative_eq!(got.polar, 1.1, epsilon = 1e-4);
    }
}
