//! 2D text overlay (credit line, FPS readout) drawn with egui on top of the 3D pass.

use corelib::Color;
use egui::{Align2, Color32, FontId, LayerId, Order, pos2};
use winit::{event::WindowEvent, window::Window};

/// One string placed in logical window coordinates (top-left anchor).
#[derive(Clone, Debug, PartialEq)]
pub struct HudText {
    pub text: String,
    pub x: f32,
    pub y: f32,
    /// Glyph height in logical pixels.
    pub size: f32,
    pub color: Color,
}

impl HudText {
    pub fn new(text: impl Into<String>, x: f32, y: f32, size: f32, color: Color) -> Self {
        Self {
            text: text.into(),
            x,
            y,
            size,
            color,
        }
    }
}

pub struct Overlay {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

/// Tessellated overlay ready to be recorded into a pass.
pub(crate) struct OverlayFrame {
    pub paint_jobs: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub screen: egui_wgpu::ScreenDescriptor,
}

impl Overlay {
    pub(crate) fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        window: &Window,
    ) -> Self {
        let ctx = egui::Context::default();
        let state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let renderer = egui_wgpu::Renderer::new(device, format, None, 1, false);
        Self {
            ctx,
            state,
            renderer,
        }
    }

    /// Feed a window event so egui tracks size and scale factor.
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) {
        let _ = self.state.on_window_event(window, event);
    }

    pub(crate) fn build(&mut self, window: &Window, texts: &[HudText], size: [u32; 2]) -> OverlayFrame {
        let raw_input = self.state.take_egui_input(window);
        let output = self.ctx.run(raw_input, |ctx| {
            let painter = ctx.layer_painter(LayerId::new(Order::Foreground, egui::Id::new("hud")));
            for t in texts {
                let Color { r, g, b, a } = t.color;
                painter.text(
                    pos2(t.x, t.y),
                    Align2::LEFT_TOP,
                    &t.text,
                    FontId::proportional(t.size),
                    Color32::from_rgba_unmultiplied(r, g, b, a),
                );
            }
        });
        self.state
            .handle_platform_output(window, output.platform_output);

        OverlayFrame {
            paint_jobs: self.ctx.tessellate(output.shapes, output.pixels_per_point),
            textures_delta: output.textures_delta,
            screen: egui_wgpu::ScreenDescriptor {
                size_in_pixels: size,
                pixels_per_point: output.pixels_per_point,
            },
        }
    }

    /// Upload textures/buffers and record the overlay into `encoder` on top of `view`.
    pub(crate) fn record(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        frame: &OverlayFrame,
    ) -> Vec<wgpu::CommandBuffer> {
        for (id, delta) in &frame.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }
        let extra =
            self.renderer
                .update_buffers(device, queue, encoder, &frame.paint_jobs, &frame.screen);
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("OverlayPass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.renderer
                .render(&mut pass, &frame.paint_jobs, &frame.screen);
        }
        for id in &frame.textures_delta.free {
            self.renderer.free_texture(id);
        }
        extra
    }
}
