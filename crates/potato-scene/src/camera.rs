// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Perspective camera math.

use glam::{Mat4, Vec3};

/// Look-at perspective camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PerspectiveCamera {
    /// Eye position.
    pub position: Vec3,
    /// Look-at point.
    pub target: Vec3,
    /// World up.
    pub up: Vec3,
    /// Vertical field of view (degrees).
    pub fov_y_deg: f32,
    /// Width / height of the viewport.
    pub aspect: f32,
    /// Near clip plane.
    pub near: f32,
    /// Far clip plane.
    pub far: f32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y_deg: 75.0,
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl PerspectiveCamera {
    /// Default camera for a viewport of the given aspect ratio.
    pub fn with_aspect(aspect: f32) -> Self {
        Self {
            aspect,
            ..Self::default()
        }
    }

    /// World → view transform.
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// View → clip transform (wgpu depth range).
    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_deg.to_radians(),
            self.aspect.max(0.1),
            self.near,
            self.far,
        )
    }

    /// `projection * view`.
    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Unit right / up vectors of the view plane.
    pub fn basis(&self) -> (Vec3, Vec3) {
        let forward = (self.target - self.position).normalize_or_zero();
        let right = forward.cross(self.up).normalize_or_zero();
        let up = right.cross(forward);
        (right, up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::Vec4;

    #[test]
    fn default_camera_sees_origin_at_screen_centre() {
        let cam = PerspectiveCamera::with_aspect(16.0 / 9.0);
        let clip = cam.view_proj() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip / clip.w;
        assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-6);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn points_beyond_far_plane_are_clipped() {
        let cam = PerspectiveCamera::default();
        let clip = cam.view_proj() * Vec4::new(0.0, 0.0, -2000.0, 1.0);
        assert!(clip.z / clip.w > 1.0);
    }

    #[test]
    fn basis_is_orthonormal() {
        let cam = PerspectiveCamera::default();
        let (right, up) = cam.basis();
        assert_relative_eq!(right.dot(up), 0.0, epsilon = 1e-6);
        assert_relative_eq!(right.length(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(right.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(up.y, 1.0, epsilon = 1e-6);
    }
}
