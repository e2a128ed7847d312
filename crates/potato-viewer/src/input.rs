// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pointer and wheel input mapped onto the orbit controls.

use egui_winit::winit::event::MouseScrollDelta;
use glam::Vec2;
use potato_scene::{OrbitControls, PerspectiveCamera};

/// Pixels of trackpad scroll treated as one wheel notch.
const PIXELS_PER_STEP: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    Idle,
    /// Left drag, in physical pixels.
    Rotate(Vec2),
    /// Right or middle drag, in physical pixels.
    Pan(Vec2),
}

/// Pointer buttons and motion for one frame, as egui reported them.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerSample {
    pub primary: bool,
    pub secondary: bool,
    pub middle: bool,
    /// Motion since last frame, in egui points.
    pub delta: Vec2,
    /// egui is using the pointer (widget drag, hovering a panel).
    pub captured: bool,
}

impl PointerSample {
    pub fn read(ctx: &egui::Context) -> Self {
        let captured = ctx.is_using_pointer() || ctx.is_pointer_over_area();
        ctx.input(|i| {
            let d = i.pointer.delta();
            Self {
                primary: i.pointer.primary_down(),
                secondary: i.pointer.secondary_down(),
                middle: i.pointer.middle_down(),
                delta: Vec2::new(d.x, d.y),
                captured,
            }
        })
    }

    pub fn gesture(&self, pixels_per_point: f32) -> Gesture {
        if self.captured || self.delta == Vec2::ZERO {
            return Gesture::Idle;
        }
        let px = self.delta * pixels_per_point;
        if self.primary {
            Gesture::Rotate(px)
        } else if self.secondary || self.middle {
            Gesture::Pan(px)
        } else {
            Gesture::Idle
        }
    }
}

pub fn apply_gesture(
    controls: &mut OrbitControls,
    camera: &PerspectiveCamera,
    gesture: Gesture,
    viewport_height_px: f32,
) {
    match gesture {
        Gesture::Idle => {}
        Gesture::Rotate(delta) => controls.drag_rotate(delta, viewport_height_px),
        Gesture::Pan(delta) => controls.drag_pan(delta, viewport_height_px, camera),
    }
}

/// Wheel notches; positive zooms in.
pub fn scroll_steps(delta: &MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => *y,
        MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_STEP,
    }
}
