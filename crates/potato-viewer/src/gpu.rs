// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! wgpu render backend for the scene, plus the egui overlay pass.
//!
//! A frame is split in two: [`RenderBackend::draw`] acquires the surface
//! texture and encodes the point pass, then [`GpuBackend::present`] encodes
//! the egui pass on top and presents.

use anyhow::{Context as _, Result};
use egui_wgpu::wgpu;
use egui_winit::winit::window::Window;
use potato_scene::{FrameView, MountTarget, RenderBackend, SceneError, SurfaceSize};
use tracing::{debug, info, warn};
use wgpu::util::DeviceExt;

/// Per-point vertex; drawn once per instance as a 6-vertex quad.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointVertex {
    pub pos: [f32; 3],
    pub color: [f32; 3],
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct Globals {
    view_proj: [[f32; 4]; 4],
    right: [f32; 4],
    up: [f32; 4],
}

/// One uploaded point cloud.
pub struct GpuPoints {
    buf: wgpu::Buffer,
    count: u32,
}

struct PendingFrame {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    commands: wgpu::CommandBuffer,
}

/// egui output for one frame.
pub struct Overlay<'a> {
    pub renderer: &'a mut egui_wgpu::Renderer,
    pub paint_jobs: &'a [egui::ClippedPrimitive],
    pub textures_delta: &'a egui::TexturesDelta,
    pub screen: &'a egui_wgpu::ScreenDescriptor,
}

pub struct GpuBackend {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pmode_fast: wgpu::PresentMode,
    pmode_vsync: wgpu::PresentMode,
    max_tex: u32,
    depth: wgpu::TextureView,
    globals_buf: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
    pending: Option<PendingFrame>,
}

impl GpuBackend {
    pub async fn new(window: &'static Window, size: SurfaceSize, vsync: bool) -> Result<Self> {
        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(window)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no compatible GPU adapter")?;
        let limits = adapter.limits();
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("potato-viewer-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults()
                    .using_resolution(limits.clone()),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
            })
            .await?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(wgpu::TextureFormat::is_srgb)
            .or_else(|| caps.formats.first().copied())
            .context("surface reports no formats")?;
        let pmode_fast = caps
            .present_modes
            .iter()
            .copied()
            .find(|m| {
                matches!(
                    m,
                    wgpu::PresentMode::Immediate | wgpu::PresentMode::AutoNoVsync
                )
            })
            .unwrap_or(wgpu::PresentMode::Fifo);
        let pmode_vsync = caps
            .present_modes
            .iter()
            .copied()
            .find(|m| matches!(m, wgpu::PresentMode::Fifo))
            .unwrap_or(pmode_fast);
        let max_tex = limits.max_texture_dimension_2d;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.min(max_tex).max(1),
            height: size.height.min(max_tex).max(1),
            present_mode: if vsync { pmode_vsync } else { pmode_fast },
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        let depth = create_depth(&device, config.width, config.height);

        let globals_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("globals"),
            size: std::mem::size_of::<Globals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("globals_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("globals_bg"),
            layout: &globals_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: globals_buf.as_entire_binding(),
            }],
        });
        let pipeline = create_points_pipeline(&device, &globals_layout, format);

        info!(
            adapter = %adapter.get_info().name,
            ?format,
            width = config.width,
            height = config.height,
            "gpu backend ready"
        );
        Ok(Self {
            surface,
            device,
            queue,
            config,
            pmode_fast,
            pmode_vsync,
            max_tex,
            depth,
            globals_buf,
            bind_group,
            pipeline,
            pending: None,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Configured surface size in physical pixels.
    pub fn surface_size(&self) -> [u32; 2] {
        [self.config.width, self.config.height]
    }

    pub fn set_vsync(&mut self, on: bool) {
        let mode = if on {
            self.pmode_vsync
        } else {
            self.pmode_fast
        };
        if self.config.present_mode != mode {
            self.config.present_mode = mode;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Composite the egui overlay onto the frame started by `draw` and present it.
    ///
    /// Texture uploads and frees are applied even when no frame is pending.
    pub fn present(&mut self, overlay: Overlay<'_>) {
        let Overlay {
            renderer,
            paint_jobs,
            textures_delta,
            screen,
        } = overlay;
        for (id, delta) in &textures_delta.set {
            renderer.update_texture(&self.device, &self.queue, *id, delta);
        }

        if let Some(frame) = self.pending.take() {
            let mut encoder = self
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("egui-encoder"),
                });
            let callbacks =
                renderer.update_buffers(&self.device, &self.queue, &mut encoder, paint_jobs, screen);
            {
                let rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &frame.view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    occlusion_query_set: None,
                    timestamp_writes: None,
                });
                let mut rpass = rpass.forget_lifetime();
                renderer.render(&mut rpass, paint_jobs, screen);
            }
            self.queue
                .submit(callbacks.into_iter().chain([frame.commands, encoder.finish()]));
            frame.texture.present();
        }

        for id in &textures_delta.free {
            renderer.free_texture(id);
        }
    }
}

impl RenderBackend for GpuBackend {
    type Points = GpuPoints;

    fn upload_points(&mut self, positions: &[f32], colors: &[f32]) -> Result<GpuPoints, SceneError> {
        let count = u32::try_from(positions.len() / 3)
            .map_err(|_| SceneError::Backend(format!("{} points exceed u32", positions.len() / 3)))?;
        let vertices: Vec<PointVertex> = positions
            .chunks_exact(3)
            .zip(colors.chunks_exact(3))
            .map(|(p, c)| PointVertex {
                pos: [p[0], p[1], p[2]],
                color: [c[0], c[1], c[2]],
            })
            .collect();
        let buf = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("points"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        Ok(GpuPoints { buf, count })
    }

    fn release_points(&mut self, points: GpuPoints) {
        points.buf.destroy();
    }

    fn resize_surface(&mut self, size: SurfaceSize) {
        self.pending = None;
        self.config.width = size.width.min(self.max_tex).max(1);
        self.config.height = size.height.min(self.max_tex).max(1);
        self.surface.configure(&self.device, &self.config);
        self.depth = create_depth(&self.device, self.config.width, self.config.height);
    }

    fn draw(&mut self, frame: &FrameView<'_, GpuPoints>) -> Result<(), SceneError> {
        if let Some(stale) = self.pending.take() {
            self.queue.submit([stale.commands]);
            stale.texture.present();
        }

        let texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                debug!("surface lost; reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                debug!("surface timeout; frame skipped");
                return Ok(());
            }
            Err(err) => return Err(SceneError::Backend(err.to_string())),
        };
        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let (right, up) = frame.billboard;
        let globals = Globals {
            view_proj: frame.view_proj.to_cols_array_2d(),
            right: right.extend(frame.point_size).to_array(),
            up: up.extend(0.0).to_array(),
        };
        self.queue
            .write_buffer(&self.globals_buf, 0, bytemuck::bytes_of(&globals));

        let [r, g, b, a] = frame.clear_color.map(f64::from);
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("points-encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("points-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            if let Some(points) = frame.points {
                rpass.set_pipeline(&self.pipeline);
                rpass.set_bind_group(0, &self.bind_group, &[]);
                rpass.set_vertex_buffer(0, points.buf.slice(..));
                rpass.draw(0..6, 0..points.count);
            }
        }

        self.pending = Some(PendingFrame {
            texture,
            view,
            commands: encoder.finish(),
        });
        Ok(())
    }

    fn release(&mut self) {
        if self.pending.take().is_some() {
            warn!("dropping an unpresented frame on release");
        }
        info!("gpu backend released");
    }
}

/// A window the scene mounts into.
pub struct WindowTarget {
    window: &'static Window,
    vsync: bool,
}

impl WindowTarget {
    pub fn new(window: &'static Window, vsync: bool) -> Self {
        Self { window, vsync }
    }
}

impl MountTarget for WindowTarget {
    type Backend = GpuBackend;

    fn size(&self) -> SurfaceSize {
        let size = self.window.inner_size();
        SurfaceSize::new(size.width, size.height)
    }

    fn create_backend(&mut self, size: SurfaceSize) -> Result<GpuBackend, SceneError> {
        pollster::block_on(GpuBackend::new(self.window, size, self.vsync))
            .map_err(|err| SceneError::Backend(format!("{err:#}")))
    }
}

fn create_points_pipeline(
    device: &wgpu::Device,
    globals_layout: &wgpu::BindGroupLayout,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::include_wgsl!("points.wgsl"));
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("points_layout"),
        bind_group_layouts: &[globals_layout],
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("points_pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<PointVertex>() as u64,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3],
            }],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: wgpu::TextureFormat::Depth32Float,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn create_depth(device: &wgpu::Device, w: u32, h: u32) -> wgpu::TextureView {
    let tex = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth"),
        size: wgpu::Extent3d {
            width: w.max(1),
            height: h.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Depth32Float,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    tex.create_view(&wgpu::TextureViewDescriptor::default())
}
