//! winit application handler driving `Initializing -> Running -> ShuttingDown
//! -> Terminated`.

use std::{sync::Arc, time::Instant};

use anyhow::{Context, Result, anyhow};
use corelib::{
    Camera, CameraController, Color, Key, Lifecycle, OrbitController,
    timing::{FpsCounter, FramePacer, readout_color},
};
use renderer::{FrameParams, GpuOptions, GpuState, HudText, ModelDraw, Overlay};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{StartCause, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow},
    window::{Window, WindowId},
};

use crate::RunOptions;
use crate::input::InputState;
use crate::scene::Scene;

/// Credit line anchor, measured from the bottom-right corner.
const CREDIT_OFFSET: (f32, f32) = (210.0, 20.0);
const CREDIT_SIZE: f32 = 10.0;
const FPS_POS: (f32, f32) = (10.0, 10.0);
const FPS_SIZE: f32 = 20.0;

/// Control flow to install when the loop wakes. A reached deadline is
/// replaced by a plain wait so a redraw the platform never delivers (minimized
/// or occluded window) cannot leave the loop spinning on a past deadline.
fn control_flow_on_wake(cause: &StartCause) -> Option<ControlFlow> {
    match cause {
        StartCause::ResumeTimeReached { .. } => Some(ControlFlow::Wait),
        _ => None,
    }
}

/// Everything that only exists while the loop is `Running`.
/// Fields drop top to bottom: scene, overlay, GPU, then the window.
struct Runtime {
    scene: Scene,
    overlay: Overlay,
    gpu: GpuState,
    window: Arc<Window>,
}

impl Runtime {
    fn open(event_loop: &ActiveEventLoop, options: &RunOptions) -> Result<Self> {
        let ws = &options.settings.window;
        let mut attrs = Window::default_attributes()
            .with_title(ws.title.as_str())
            .with_resizable(ws.resizable);
        attrs = if ws.high_dpi {
            attrs.with_inner_size(LogicalSize::new(ws.width, ws.height))
        } else {
            attrs.with_inner_size(PhysicalSize::new(ws.width, ws.height))
        };
        if ws.interlaced {
            log::debug!("Interlaced scan-out requested; not supported by any backend, ignored");
        }

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("Failed to create window")?,
        );
        let size = window.inner_size();
        log::info!(
            "Window created: {}x{} (scale factor {:.2})",
            size.width,
            size.height,
            window.scale_factor()
        );

        let gpu_options = GpuOptions {
            backends: options.backends,
            msaa_samples: ws.msaa_samples,
            grid: options.settings.grid,
        };
        let gpu = pollster::block_on(GpuState::new(window.clone(), gpu_options))?;
        if gpu.sample_count() != ws.msaa_samples {
            log::info!(
                "MSAA x{} requested, rendering with x{}",
                ws.msaa_samples,
                gpu.sample_count()
            );
        }
        let overlay = gpu.create_overlay(&window);
        let scene = Scene::load(&gpu, &options.manifest)?;

        Ok(Self {
            scene,
            overlay,
            gpu,
            window,
        })
    }

    /// Explicit teardown so the release order shows up in the log.
    fn close(self) {
        let Self {
            scene,
            overlay,
            gpu,
            window,
        } = self;
        drop(scene);
        drop(overlay);
        drop(gpu);
        log::info!("Window closed");
        drop(window);
    }
}

pub(crate) struct DemoApp {
    options: RunOptions,
    lifecycle: Lifecycle,
    runtime: Option<Runtime>,
    camera: Camera,
    controller: CameraController,
    orbit: OrbitController,
    input: InputState,
    pacer: FramePacer,
    fps: FpsCounter,
    exit_requested: bool,
    error: Option<anyhow::Error>,
}

impl DemoApp {
    pub fn new(options: RunOptions) -> Self {
        let settings = &options.settings;
        let pacer = FramePacer::new(settings.target_fps);
        match pacer.interval() {
            Some(interval) => log::info!(
                "Frame pacing: {} fps ({:.2} ms per frame)",
                settings.target_fps,
                interval.as_secs_f64() * 1000.0
            ),
            None => log::info!("Frame pacing disabled"),
        }
        Self {
            camera: settings.camera,
            controller: CameraController::new(settings.camera_step),
            orbit: OrbitController::default(),
            input: InputState::default(),
            pacer,
            fps: FpsCounter::default(),
            lifecycle: Lifecycle::default(),
            runtime: None,
            exit_requested: false,
            error: None,
            options,
        }
    }

    /// Outcome of the run once the event loop has returned.
    pub fn finish(mut self) -> Result<()> {
        if let Some(runtime) = self.runtime.take() {
            runtime.close();
        }
        match self.error.take() {
            Some(err) => Err(err),
            None if self.lifecycle.is_terminated() => Ok(()),
            None => Err(anyhow!(
                "Event loop ended while still {}",
                self.lifecycle
            )),
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if self.lifecycle.is_terminated() {
            return;
        }
        if self.lifecycle.is_running() {
            self.lifecycle.advance();
        } else {
            self.lifecycle.abort();
        }
        if let Some(runtime) = self.runtime.take() {
            log::info!("Last FPS readout: {}", self.fps.fps());
            runtime.close();
        }
        self.lifecycle.advance();
        event_loop.exit();
    }

    /// One pass of the Running state: input, camera, draw, pacing.
    fn tick(&mut self, event_loop: &ActiveEventLoop) {
        let Some(rt) = self.runtime.as_mut() else {
            return;
        };

        // Window size is re-read every frame; resize events can be coalesced.
        let size = rt.window.inner_size();
        if size.width > 0 && size.height > 0 && (size.width, size.height) != rt.gpu.size() {
            rt.gpu.resize(size.width, size.height);
        }

        self.orbit.update(&mut self.camera, &mut self.input.orbit);
        self.controller.update(&mut self.camera, &self.input.keys);

        let fps = self.fps.tick(Instant::now());
        let settings = &self.options.settings;
        let logical: LogicalSize<f32> = size.to_logical(rt.window.scale_factor());
        let texts = [
            HudText::new(
                settings.credit.as_str(),
                logical.width - CREDIT_OFFSET.0,
                logical.height - CREDIT_OFFSET.1,
                CREDIT_SIZE,
                Color::GRAY,
            ),
            HudText::new(
                format!("{fps} FPS"),
                FPS_POS.0,
                FPS_POS.1,
                FPS_SIZE,
                readout_color(fps),
            ),
        ];
        let draws = [ModelDraw {
            model: &rt.scene.model,
            transform: settings.model,
            tint: settings.tint,
        }];
        let params = FrameParams {
            camera: &self.camera,
            light: &settings.light,
            clear_color: settings.clear_color,
            models: &draws,
            draw_grid: true,
            texts: &texts,
        };

        match rt.gpu.render(&params, &mut rt.overlay, &rt.window) {
            Ok(()) => {}
            Err(err) if GpuState::is_surface_lost(&err) => {
                log::warn!("Surface lost ({err}); reconfiguring");
                rt.gpu.recreate_surface();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory; shutting down");
                self.exit_requested = true;
            }
            Err(err) => log::warn!("Frame skipped: {err}"),
        }

        match self.pacer.next_deadline(Instant::now()) {
            Some(deadline) => event_loop.set_control_flow(ControlFlow::WaitUntil(deadline)),
            None => rt.window.request_redraw(),
        }
    }
}

impl ApplicationHandler for DemoApp {
    fn new_events(&mut self, event_loop: &ActiveEventLoop, cause: StartCause) {
        let Some(flow) = control_flow_on_wake(&cause) else {
            return;
        };
        // The expired deadline is disarmed; only `tick` schedules the next one.
        event_loop.set_control_flow(flow);
        if let Some(rt) = &self.runtime {
            rt.window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.lifecycle != Lifecycle::Initializing {
            return;
        }
        match Runtime::open(event_loop, &self.options) {
            Ok(runtime) => {
                runtime.window.request_redraw();
                self.runtime = Some(runtime);
                self.lifecycle.advance();
            }
            Err(err) => {
                log::error!("Initialization failed: {err:#}");
                self.error = Some(err);
                self.shutdown(event_loop);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        let Some(rt) = self.runtime.as_mut() else {
            return;
        };
        if rt.window.id() != id {
            return;
        }
        rt.overlay.on_window_event(&rt.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested");
                self.exit_requested = true;
            }
            WindowEvent::Resized(new_size) => {
                log::debug!("Resized: {}x{}", new_size.width, new_size.height);
                if new_size.width > 0 && new_size.height > 0 {
                    rt.gpu.resize(new_size.width, new_size.height);
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                log::info!("Scale factor changed: {scale_factor:.3}");
            }
            WindowEvent::Focused(false) => self.input.release_all(),
            WindowEvent::KeyboardInput { event, .. } => {
                if self.input.on_key(&event) == Some(Key::Escape) {
                    log::info!("Escape pressed");
                    self.exit_requested = true;
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.input.on_mouse_button(button, state);
            }
            WindowEvent::CursorMoved { position, .. } => self.input.on_cursor_moved(position),
            WindowEvent::MouseWheel { delta, .. } => self.input.on_wheel(delta),
            WindowEvent::RedrawRequested => self.tick(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // Exit condition is sampled once per loop iteration.
        if self.exit_requested && self.lifecycle.is_running() {
            self.shutdown(event_loop);
        }
    }

    fn exiting(&mut self, event_loop: &ActiveEventLoop) {
        self.shutdown(event_loop);
    }
}
