// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Stateless egui helpers for the dashboard overlay: chart panel, HUD, toasts.
//!
//! Widgets never touch the dashboard directly; they return [`UiAction`]s that
//! the app applies after the egui pass.

use egui::{self, Color32, Context, TextureHandle, TextureOptions};
use egui_plot::{Legend, Line, Plot, PlotPoints};
use potato_app_core::toast::{ToastKind, ToastRender};
use potato_dashboard::{CloudSource, Heatmap, Panels, Series};

const PLOT_HEIGHT: f32 = 160.0;
const HEATMAP_SIDE: f32 = 320.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    SetCloudSource(CloudSource),
    SetVsync(bool),
    ResetCamera,
}

/// HUD toggles owned by the app.
#[derive(Debug, Clone, Copy)]
pub struct HudState {
    pub show_panels: bool,
    pub vsync: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FrameStats {
    pub fps: f32,
    pub points: usize,
    pub generation: u64,
    pub ticks: u64,
}

pub struct DashboardView<'a> {
    pub panels: Option<&'a Panels>,
    pub heatmap: Option<&'a TextureHandle>,
    pub cloud_source: CloudSource,
    pub stats: FrameStats,
    pub toasts: &'a [ToastRender],
    pub base_url: &'a str,
}

/// GPU texture mirroring the latest heatmap panel.
#[derive(Default)]
pub struct HeatmapTexture {
    handle: Option<TextureHandle>,
}

impl HeatmapTexture {
    pub fn sync(&mut self, ctx: &Context, heatmap: Option<&Heatmap>) {
        let Some(heatmap) = heatmap else {
            self.handle = None;
            return;
        };
        let image = heatmap_image(heatmap);
        match &mut self.handle {
            Some(handle) => handle.set(image, TextureOptions::NEAREST),
            None => {
                self.handle = Some(ctx.load_texture("heatmap", image, TextureOptions::NEAREST));
            }
        }
    }

    pub fn handle(&self) -> Option<&TextureHandle> {
        self.handle.as_ref()
    }
}

pub fn heatmap_image(heatmap: &Heatmap) -> egui::ColorImage {
    egui::ColorImage::from_rgba_unmultiplied(
        [heatmap.cols, heatmap.rows],
        heatmap.pixels.as_flattened(),
    )
}

pub fn draw_dashboard(ctx: &Context, view: &DashboardView<'_>, hud: &mut HudState) -> Vec<UiAction> {
    let mut actions = Vec::new();

    if hud.show_panels {
        egui::SidePanel::right("charts")
            .resizable(true)
            .default_width(HEATMAP_SIDE + 40.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| draw_panels(ui, view));
            });
    }

    egui::Area::new("hud".into())
        .anchor(egui::Align2::LEFT_TOP, egui::vec2(12.0, 12.0))
        .show(ctx, |ui| {
            egui::Frame::popup(ui.style()).show(ui, |ui| {
                draw_hud(ui, view, hud, &mut actions);
            });
        });

    egui::Area::new("toasts".into())
        .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(12.0, -12.0))
        .show(ctx, |ui| {
            for toast in view.toasts {
                draw_toast(ui, toast);
            }
        });

    actions
}

fn draw_hud(ui: &mut egui::Ui, view: &DashboardView<'_>, hud: &mut HudState, actions: &mut Vec<UiAction>) {
    ui.label(format!("FPS: {:.1}", view.stats.fps));
    ui.label(format!(
        "{} points | geometry #{} | frame {}",
        view.stats.points, view.stats.generation, view.stats.ticks
    ));
    ui.weak(view.base_url);

    let mut selected = view.cloud_source;
    egui::ComboBox::from_label("Point cloud")
        .selected_text(selected.label())
        .show_ui(ui, |ui| {
            for source in CloudSource::ALL {
                ui.selectable_value(&mut selected, source, source.label());
            }
        });
    if selected != view.cloud_source {
        actions.push(UiAction::SetCloudSource(selected));
    }

    if ui.checkbox(&mut hud.vsync, "VSync").changed() {
        actions.push(UiAction::SetVsync(hud.vsync));
    }
    ui.checkbox(&mut hud.show_panels, "Charts");
    if ui.button("Reset camera").clicked() {
        actions.push(UiAction::ResetCamera);
    }
    ui.weak("L-drag orbit, R-drag pan, wheel zoom");
}

fn draw_panels(ui: &mut egui::Ui, view: &DashboardView<'_>) {
    let Some(panels) = view.panels else {
        ui.heading("Telemetry");
        ui.add_space(8.0);
        ui.weak("Waiting for the first snapshot...");
        return;
    };

    ui.heading("GPU");
    ui.label(format!(
        "{} | {}",
        latest(&panels.gpu.temperature, "°C"),
        latest(&panels.gpu.utilization, "%")
    ));
    plot_series(
        ui,
        "gpu_stats",
        &[&panels.gpu.temperature, &panels.gpu.utilization],
    );

    ui.separator();
    ui.heading("Strategies");
    if let Some(round) = panels.population.latest_round {
        ui.label(format!("round {round}"));
    }
    plot_series(ui, "population", &panels.population.series());

    ui.separator();
    ui.heading("Scalar field");
    match (&panels.heatmap, view.heatmap) {
        (Some(heatmap), Some(texture)) => {
            ui.label(format!(
                "{}×{} | range {:.1} to {:.1}",
                heatmap.cols, heatmap.rows, heatmap.min, heatmap.max
            ));
            let aspect = heatmap.rows as f32 / heatmap.cols.max(1) as f32;
            ui.add(
                egui::Image::new((texture.id(), texture.size_vec2()))
                    .fit_to_exact_size(egui::vec2(HEATMAP_SIDE, HEATMAP_SIDE * aspect)),
            );
        }
        _ => {
            ui.weak("not present in this snapshot");
        }
    }
}

fn plot_series(ui: &mut egui::Ui, id: &str, series: &[&Series]) {
    Plot::new(id)
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for s in series {
                plot_ui.line(Line::new(s.name, PlotPoints::from(s.points.clone())));
            }
        });
}

fn latest(series: &Series, unit: &str) -> String {
    series.latest().map_or_else(
        || format!("{}: n/a", series.name),
        |v| format!("{}: {v:.1}{unit}", series.name),
    )
}

fn toast_color(kind: ToastKind) -> Color32 {
    match kind {
        ToastKind::Info => Color32::LIGHT_BLUE,
        ToastKind::Warn => Color32::from_rgb(230, 180, 60),
        ToastKind::Error => Color32::from_rgb(220, 80, 80),
    }
}

fn draw_toast(ui: &mut egui::Ui, toast: &ToastRender) {
    egui::Frame::popup(ui.style()).show(ui, |ui| {
        ui.set_max_width(360.0);
        let title = if toast.repeats > 0 {
            format!("{} (×{})", toast.title, toast.repeats + 1)
        } else {
            toast.title.clone()
        };
        ui.colored_label(toast_color(toast.kind), title);
        if let Some(body) = &toast.body {
            ui.small(body);
        }
        ui.add(egui::ProgressBar::new(toast.progress).desired_height(2.0));
    });
}
