// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Top-level application wiring and event loop handler.

use crate::cli::poller_config;
use crate::gpu::{GpuBackend, Overlay, WindowTarget};
use crate::input::{self, PointerSample};
use crate::settings::Settings;
use crate::ui::{self, DashboardView, FrameStats, HeatmapTexture, HudState, UiAction};
use anyhow::Result;
use egui_winit::winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::ActiveEventLoop,
    window::{Window, WindowAttributes, WindowId},
};
use egui_winit::State as EguiWinitState;
use potato_app_core::prefs::{CameraPrefs, DashboardPrefs, HudPrefs};
use potato_app_core::toast::{ToastKind, ToastOrigin};
use potato_config_fs::FsConfigStore;
use potato_dashboard::{CloudSource, Dashboard};
use potato_scene::{OrbitPose, PerspectiveCamera};
use potato_telemetry::{DataPoller, HttpSource, PollerHandle};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

const NOTICE_TTL: Duration = Duration::from_secs(8);

pub struct App {
    settings: Settings<FsConfigStore>,
    prefs: DashboardPrefs,
    source: Option<HttpSource>,
    dashboard: Dashboard<GpuBackend, PollerHandle>,
    runtime: tokio::runtime::Runtime,
    window: Option<&'static Window>,
    egui_ctx: egui::Context,
    egui_state: Option<EguiWinitState>,
    egui_renderer: Option<egui_wgpu::Renderer>,
    heatmap: HeatmapTexture,
    hud: HudState,
    notices: Vec<String>,
    last_frame: Instant,
    fps: f32,
}

impl App {
    pub fn new(
        settings: Settings<FsConfigStore>,
        prefs: DashboardPrefs,
        source: HttpSource,
        notices: Vec<String>,
    ) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("potato-poller")
            .enable_all()
            .build()?;
        let hud = HudState {
            show_panels: prefs.hud.show_panels,
            vsync: prefs.hud.vsync,
        };
        Ok(Self {
            settings,
            dashboard: Dashboard::new(CloudSource::from(prefs.cloud_source)),
            prefs,
            source: Some(source),
            runtime,
            window: None,
            egui_ctx: egui::Context::default(),
            egui_state: None,
            egui_renderer: None,
            heatmap: HeatmapTexture::default(),
            hud,
            notices,
            last_frame: Instant::now(),
            fps: 0.0,
        })
    }

    fn activate(&mut self, window: &'static Window) -> Result<(), String> {
        let Some(source) = self.source.take() else {
            return Err("telemetry source already consumed".into());
        };
        let config = poller_config(&self.prefs.poll);
        let runtime = self.runtime.handle().clone();
        let mut target = WindowTarget::new(window, self.hud.vsync);
        self.dashboard
            .activate(&mut target, || DataPoller::new(source, config).spawn_on(&runtime))
            .map_err(|err| err.to_string())?;

        let scene = self.dashboard.scene_mut();
        if let Err(err) = scene
            .set_camera_pose(pose_from_prefs(&self.prefs.camera))
            .and_then(|()| scene.set_fov(self.prefs.camera.fov_y_deg))
        {
            warn!(error = %err, "could not restore camera");
        }

        let now = Instant::now();
        for notice in self.notices.drain(..) {
            self.dashboard.toasts_mut().push(
                ToastKind::Warn,
                ToastOrigin::Config,
                "Preferences",
                Some(notice),
                NOTICE_TTL,
                now,
            );
        }
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        if let Err(err) = self.dashboard.resize(width, height) {
            warn!(error = %err, width, height, "resize ignored");
        }
    }

    fn frame(&mut self) {
        let (Some(win), Some(egui_state), Some(egui_renderer)) = (
            self.window,
            self.egui_state.as_mut(),
            self.egui_renderer.as_mut(),
        ) else {
            return;
        };

        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        if dt > 0.0 {
            self.fps = self.fps * 0.9 + 0.1 / dt;
        }

        let gesture = PointerSample::read(&self.egui_ctx).gesture(win.scale_factor() as f32);
        let viewport_height = win.inner_size().height as f32;
        if let Some((controls, camera)) = self.dashboard.scene_mut().controls_mut() {
            input::apply_gesture(controls, camera, gesture, viewport_height);
        }

        match self.dashboard.frame(now) {
            Ok(report) if report.applied_snapshot => {
                let heatmap = self.dashboard.panels().and_then(|p| p.heatmap.as_ref());
                self.heatmap.sync(&self.egui_ctx, heatmap);
            }
            Ok(_) => {}
            Err(err) => {
                error!(error = %err, "frame failed");
                self.dashboard.toasts_mut().push(
                    ToastKind::Error,
                    ToastOrigin::Scene,
                    "Render failed",
                    Some(err.to_string()),
                    NOTICE_TTL,
                    now,
                );
            }
        }

        let raw_input = egui_state.take_egui_input(win);
        let toasts = self.dashboard.toasts().visible(now);
        let scene = self.dashboard.scene();
        let view = DashboardView {
            panels: self.dashboard.panels(),
            heatmap: self.heatmap.handle(),
            cloud_source: self.dashboard.cloud_source(),
            stats: FrameStats {
                fps: self.fps,
                points: scene.point_count(),
                generation: scene.generation(),
                ticks: self.dashboard.ticks(),
            },
            toasts: &toasts,
            base_url: &self.prefs.poll.base_url,
        };
        let hud = &mut self.hud;
        let mut actions = Vec::new();
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            actions = ui::draw_dashboard(ctx, &view, hud);
        });
        egui_state.handle_platform_output(win, full_output.platform_output);

        let pixels_per_point = full_output.pixels_per_point;
        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, pixels_per_point);
        if let Some(backend) = self.dashboard.scene_mut().backend_mut() {
            let screen = egui_wgpu::ScreenDescriptor {
                size_in_pixels: backend.surface_size(),
                pixels_per_point,
            };
            backend.present(Overlay {
                renderer: egui_renderer,
                paint_jobs: &paint_jobs,
                textures_delta: &full_output.textures_delta,
                screen: &screen,
            });
        }

        self.apply_actions(actions);
        win.request_redraw();
    }

    fn apply_actions(&mut self, actions: Vec<UiAction>) {
        for action in actions {
            match action {
                UiAction::SetCloudSource(source) => {
                    if let Err(err) = self.dashboard.set_cloud_source(source) {
                        warn!(error = %err, "cloud source not switched");
                    }
                }
                UiAction::SetVsync(on) => {
                    if let Some(backend) = self.dashboard.scene_mut().backend_mut() {
                        backend.set_vsync(on);
                    }
                }
                UiAction::ResetCamera => {
                    let scene = self.dashboard.scene_mut();
                    let defaults = CameraPrefs::default();
                    if let Err(err) = scene
                        .set_camera_pose(pose_from_prefs(&defaults))
                        .and_then(|()| scene.set_fov(defaults.fov_y_deg))
                    {
                        warn!(error = %err, "camera reset ignored");
                    }
                }
            }
        }
    }

    /// Capture prefs, stop the poller, release the GPU, then persist.
    fn shutdown(&mut self) {
        if !self.dashboard.is_active() {
            return;
        }
        let scene = self.dashboard.scene();
        if let (Some(pose), Some(camera)) = (scene.camera_pose(), scene.camera()) {
            self.prefs.camera = camera_prefs(pose, camera);
        }
        self.prefs.cloud_source = self.dashboard.cloud_source().into();
        self.prefs.hud = HudPrefs {
            show_panels: self.hud.show_panels,
            vsync: self.hud.vsync,
        };
        self.dashboard.deactivate();
        self.settings.save(&self.prefs);
        info!("viewer shut down");
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window = match event_loop.create_window(
            WindowAttributes::default()
                .with_title("Potato Monitor")
                .with_inner_size(LogicalSize::new(1280.0, 800.0))
                .with_visible(true),
        ) {
            Ok(window) => window,
            Err(err) => {
                error!(error = %err, "failed to create window");
                event_loop.exit();
                return;
            }
        };
        let window: &'static Window = Box::leak(Box::new(window));
        self.window = Some(window);

        if let Err(err) = self.activate(window) {
            error!(error = %err, "dashboard failed to start");
            event_loop.exit();
            return;
        }
        let Some(backend) = self.dashboard.scene().backend() else {
            return;
        };
        self.egui_renderer = Some(egui_wgpu::Renderer::new(
            backend.device(),
            backend.format(),
            egui_wgpu::RendererOptions::default(),
        ));
        self.egui_state = Some(EguiWinitState::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            event_loop,
            None,
            None,
            None,
        ));
        window.request_redraw();
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(win) = self.window else { return };
        if win.id() != window_id {
            return;
        }

        match &event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
                return;
            }
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            WindowEvent::ScaleFactorChanged { .. } => {
                let size = win.inner_size();
                self.resize(size.width, size.height);
            }
            WindowEvent::MouseWheel { delta, .. } if !self.egui_ctx.is_pointer_over_area() => {
                if let Some((controls, _)) = self.dashboard.scene_mut().controls_mut() {
                    controls.zoom(input::scroll_steps(delta));
                }
            }
            _ => {}
        }

        if let Some(egui_state) = self.egui_state.as_mut() {
            let _ = egui_state.on_window_event(win, &event);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        self.frame();
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}

fn pose_from_prefs(camera: &CameraPrefs) -> OrbitPose {
    OrbitPose {
        distance: camera.distance,
        azimuth: camera.azimuth,
        polar: camera.polar,
    }
}

fn camera_prefs(pose: OrbitPose, camera: &PerspectiveCamera) -> CameraPrefs {
    CameraPrefs {
        distance: pose.distance,
        azimuth: pose.azimuth,
        polar: pose.polar,
        fov_y_deg: camera.fov_y_deg,
    }
}
