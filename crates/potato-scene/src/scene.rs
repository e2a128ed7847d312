// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scene lifecycle: `Unmounted → Mounted → Disposed`.

use crate::backend::{FrameView, MountTarget, RenderBackend, SurfaceSize, CLEAR_COLOR, POINT_SIZE};
use crate::camera::PerspectiveCamera;
use crate::controls::{OrbitControls, OrbitPose};
use crate::error::SceneError;
use crate::point_cloud::PointCloud;
use crate::render_loop::{CancelToken, RenderLoop};
use tracing::{debug, info};

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneState {
    /// Created, nothing allocated.
    Unmounted,
    /// Viewport allocated; geometry updates and draws allowed.
    Mounted,
    /// Everything released. Terminal.
    Disposed,
}

/// One attached point cloud.
#[derive(Debug)]
pub struct PointsNode<P> {
    handle: P,
    count: usize,
    generation: u64,
}

impl<P> PointsNode<P> {
    /// Backend handle.
    pub fn handle(&self) -> &P {
        &self.handle
    }

    /// Number of points.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Geometry generation this node was built for (1-based, per scene).
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Root of the scene graph. Holds at most one point cloud.
#[derive(Debug)]
pub struct SceneRoot<P> {
    points: Option<PointsNode<P>>,
}

impl<P> SceneRoot<P> {
    const fn empty() -> Self {
        Self { points: None }
    }

    /// The attached point cloud.
    pub fn points(&self) -> Option<&PointsNode<P>> {
        self.points.as_ref()
    }

    fn swap(&mut self, node: Option<PointsNode<P>>) -> Option<PointsNode<P>> {
        std::mem::replace(&mut self.points, node)
    }
}

struct Viewport<B: RenderBackend> {
    camera: PerspectiveCamera,
    controls: OrbitControls,
    backend: B,
    root: SceneRoot<B::Points>,
    size: SurfaceSize,
    cancel: CancelToken,
}

enum Lifecycle<B: RenderBackend> {
    Unmounted,
    Mounted(Box<Viewport<B>>),
    Disposed,
}

/// Owns the viewport (camera, controls, renderer, root node) for one mount.
///
/// Dropping a mounted manager disposes it.
pub struct SceneManager<B: RenderBackend> {
    state: Lifecycle<B>,
    generation: u64,
}

impl<B: RenderBackend> Default for SceneManager<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: RenderBackend> SceneManager<B> {
    /// Unmounted manager.
    pub const fn new() -> Self {
        Self {
            state: Lifecycle::Unmounted,
            generation: 0,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SceneState {
        match self.state {
            Lifecycle::Unmounted => SceneState::Unmounted,
            Lifecycle::Mounted(_) => SceneState::Mounted,
            Lifecycle::Disposed => SceneState::Disposed,
        }
    }

    /// Allocate camera, controls, renderer and an empty root inside `target`.
    ///
    /// Returns the render loop for this mount; it is cancelled by
    /// [`SceneManager::dispose`].
    pub fn mount<T>(&mut self, target: &mut T) -> Result<RenderLoop, SceneError>
    where
        T: MountTarget<Backend = B>,
    {
        match self.state {
            Lifecycle::Unmounted => {}
            Lifecycle::Mounted(_) => return Err(SceneError::AlreadyMounted),
            Lifecycle::Disposed => return Err(SceneError::Disposed),
        }

        let requested = target.size();
        let size = SurfaceSize::new(requested.width.max(1), requested.height.max(1));
        let backend = target.create_backend(size)?;
        let cancel = CancelToken::new();
        self.state = Lifecycle::Mounted(Box::new(Viewport {
            camera: PerspectiveCamera::with_aspect(size.aspect()),
            controls: OrbitControls::new(),
            backend,
            root: SceneRoot::empty(),
            size,
            cancel: cancel.clone(),
        }));
        info!(width = size.width, height = size.height, "scene mounted");
        Ok(RenderLoop::new(cancel))
    }

    /// Replace the point cloud with `n = positions.len() / 3` new points.
    ///
    /// The new geometry is uploaded first, then swapped into the root in one
    /// step, then the old geometry is released. Empty buffers detach the
    /// current cloud. On upload failure the current cloud stays attached.
    pub fn update_geometry(&mut self, positions: &[f32], colors: &[f32]) -> Result<(), SceneError> {
        let generation = self.generation + 1;
        let vp = self.viewport_mut()?;
        if positions.len() != colors.len() || positions.len() % 3 != 0 {
            return Err(SceneError::InvalidGeometry {
                positions: positions.len(),
                colors: colors.len(),
            });
        }

        let node = if positions.is_empty() {
            None
        } else {
            Some(PointsNode {
                handle: vp.backend.upload_points(positions, colors)?,
                count: positions.len() / 3,
                generation,
            })
        };
        let attached = node.as_ref().map_or(0, PointsNode::count);
        if let Some(old) = vp.root.swap(node) {
            vp.backend.release_points(old.handle);
        }
        self.generation = generation;
        debug!(generation, points = attached, "geometry swapped");
        Ok(())
    }

    /// [`SceneManager::update_geometry`] from a built cloud.
    pub fn set_point_cloud(&mut self, cloud: &PointCloud) -> Result<(), SceneError> {
        self.update_geometry(&cloud.positions, &cloud.colors)
    }

    /// Resize camera aspect and renderer surface. Zero sizes and repeats are ignored.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), SceneError> {
        let vp = self.viewport_mut()?;
        let size = SurfaceSize::new(width, height);
        if size.is_empty() || size == vp.size {
            return Ok(());
        }
        vp.size = size;
        vp.camera.aspect = size.aspect();
        vp.backend.resize_surface(size);
        debug!(width, height, "scene resized");
        Ok(())
    }

    /// Release geometry, controls and renderer; cancel the render loop.
    ///
    /// Idempotent. Disposing an unmounted manager just makes it terminal.
    pub fn dispose(&mut self) {
        match std::mem::replace(&mut self.state, Lifecycle::Disposed) {
            Lifecycle::Mounted(mut vp) => {
                vp.cancel.cancel();
                if let Some(node) = vp.root.swap(None) {
                    vp.backend.release_points(node.handle);
                }
                vp.backend.release();
                info!(generations = self.generation, "scene disposed");
            }
            Lifecycle::Unmounted | Lifecycle::Disposed => {}
        }
    }

    /// Points currently attached (0 when nothing is attached or not mounted).
    pub fn point_count(&self) -> usize {
        self.viewport()
            .and_then(|vp| vp.root.points())
            .map_or(0, PointsNode::count)
    }

    /// Geometry updates applied so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Scene-graph root while mounted.
    pub fn root(&self) -> Option<&SceneRoot<B::Points>> {
        self.viewport().map(|vp| &vp.root)
    }

    /// Camera while mounted.
    pub fn camera(&self) -> Option<&PerspectiveCamera> {
        self.viewport().map(|vp| &vp.camera)
    }

    /// Controls plus the camera they drive, while mounted.
    pub fn controls_mut(&mut self) -> Option<(&mut OrbitControls, &PerspectiveCamera)> {
        match &mut self.state {
            Lifecycle::Mounted(vp) => Some((&mut vp.controls, &vp.camera)),
            _ => None,
        }
    }

    /// Current orbit pose while mounted.
    pub fn camera_pose(&self) -> Option<OrbitPose> {
        self.viewport().map(|vp| vp.controls.pose(&vp.camera))
    }

    /// Jump the camera to `pose`.
    pub fn set_camera_pose(&mut self, pose: OrbitPose) -> Result<(), SceneError> {
        let vp = self.viewport_mut()?;
        vp.controls.set_pose(&mut vp.camera, pose);
        Ok(())
    }

    /// Set the vertical field of view, clamped to `[10, 120]` degrees.
    pub fn set_fov(&mut self, fov_y_deg: f32) -> Result<(), SceneError> {
        let vp = self.viewport_mut()?;
        vp.camera.fov_y_deg = fov_y_deg.clamp(10.0, 120.0);
        Ok(())
    }

    /// Surface size while mounted.
    pub fn size(&self) -> Option<SurfaceSize> {
        self.viewport().map(|vp| vp.size)
    }

    /// Backend while mounted.
    pub fn backend(&self) -> Option<&B> {
        self.viewport().map(|vp| &vp.backend)
    }

    /// Mutable backend while mounted (e.g. to composite an overlay pass).
    pub fn backend_mut(&mut self) -> Option<&mut B> {
        match &mut self.state {
            Lifecycle::Mounted(vp) => Some(&mut vp.backend),
            _ => None,
        }
    }

    pub(crate) fn render_frame(&mut self, token: &CancelToken) -> Result<(), SceneError> {
        let vp = self.viewport_mut()?;
        if !vp.cancel.same_as(token) {
            return Err(SceneError::NotMounted);
        }
        vp.controls.update(&mut vp.camera);
        let frame = FrameView {
            view_proj: vp.camera.view_proj(),
            billboard: vp.camera.basis(),
            points: vp.root.points().map(PointsNode::handle),
            point_size: POINT_SIZE,
            clear_color: CLEAR_COLOR,
        };
        vp.backend.draw(&frame)
    }

    fn viewport(&self) -> Option<&Viewport<B>> {
        match &self.state {
            Lifecycle::Mounted(vp) => Some(vp.as_ref()),
            _ => None,
        }
    }

    fn viewport_mut(&mut self) -> Result<&mut Viewport<B>, SceneError> {
        match &mut self.state {
            Lifecycle::Mounted(vp) => Ok(vp.as_mut()),
            Lifecycle::Unmounted => Err(SceneError::NotMounted),
            Lifecycle::Disposed => Err(SceneError::Disposed),
        }
    }
}

impl<B: RenderBackend> Drop for SceneManager<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::headless::{HeadlessBackend, HeadlessTarget};

    fn mounted() -> (SceneManager<HeadlessBackend>, HeadlessTarget, RenderLoop) {
        let mut target = HeadlessTarget::new(800, 600);
        let mut scene = SceneManager::new();
        let render_loop = scene.mount(&mut target).unwrap();
        (scene, target, render_loop)
    }

    #[test]
    fn mount_sizes_camera_and_renderer() {
        let (scene, target, _loop) = mounted();
        assert_eq!(scene.state(), SceneState::Mounted);
        assert_eq!(target.counters().surface(), SurfaceSize::new(800, 600));
        let cam = scene.camera().unwrap();
        assert!((cam.aspect - 800.0 / 600.0).abs() < 1e-6);
        assert_eq!(scene.point_count(), 0);
    }

    #[test]
    fn zero_sized_container_mounts_at_one_pixel() {
        let mut target = HeadlessTarget::new(0, 0);
        let mut scene: SceneManager<HeadlessBackend> = SceneManager::new();
        scene.mount(&mut target).unwrap();
        assert_eq!(scene.size(), Some(SurfaceSize::new(1, 1)));
    }

    #[test]
    fn mismatched_buffers_are_rejected() {
        let (mut scene, target, _loop) = mounted();
        let err = scene.update_geometry(&[0.0; 6], &[0.0; 3]).unwrap_err();
        assert_eq!(
            err,
            SceneError::InvalidGeometry {
                positions: 6,
                colors: 3
            }
        );
        let err = scene.update_geometry(&[0.0; 4], &[0.0; 4]).unwrap_err();
        assert!(matches!(err, SceneError::InvalidGeometry { .. }));
        assert_eq!(target.counters().uploads(), 0);
    }

    #[test]
    fn resize_ignores_zero_and_repeats() {
        let (mut scene, target, _loop) = mounted();
        scene.resize(0, 300).unwrap();
        scene.resize(800, 600).unwrap();
        assert_eq!(target.counters().resizes(), 0);
        scene.resize(1024, 512).unwrap();
        scene.resize(1024, 512).unwrap();
        assert_eq!(target.counters().resizes(), 1);
        assert!((scene.camera().unwrap().aspect - 2.0).abs() < 1e-6);
    }

    #[test]
    fn nodes_carry_generation() {
        let (mut scene, _target, _loop) = mounted();
        scene.update_geometry(&[0.0; 3], &[0.0; 3]).unwrap();
        scene.update_geometry(&[0.0; 6], &[0.0; 6]).unwrap();
        let node = scene.root().unwrap().points().unwrap();
        assert_eq!(node.generation(), 2);
        assert_eq!(node.count(), 2);
        assert_eq!(node.handle().id(), 2);
    }

    #[test]
    fn dispose_from_unmounted_is_terminal() {
        let mut scene: SceneManager<HeadlessBackend> = SceneManager::new();
        scene.dispose();
        assert_eq!(scene.state(), SceneState::Disposed);
        let mut target = HeadlessTarget::new(10, 10);
        assert_eq!(scene.mount(&mut target).unwrap_err(), SceneError::Disposed);
        assert!(!target.counters().created());
    }

    #[test]
    fn loop_from_another_mount_is_refused() {
        let (mut a, _ta, _la) = mounted();
        let (_b, _tb, mut lb) = mounted();
        assert_eq!(lb.tick(&mut a).unwrap_err(), SceneError::NotMounted);
        assert_eq!(lb.ticks(), 0);
    }

    #[test]
    fn fov_is_clamped() {
        let (mut scene, _target, _loop) = mounted();
        scene.set_fov(170.0).unwrap();
        assert!((scene.camera().unwrap().fov_y_deg - 120.0).abs() < f32::EPSILON);
        scene.set_fov(60.0).unwrap();
        assert!((scene.camera().unwrap().fov_y_deg - 60.0).abs() < f32::EPSILON);
    }
}
