//! Platform layer: window, event loop and the frame loop state machine.
//!
//! `run_with_renderer` owns the whole program lifetime: it opens the window,
//! loads the scene, ticks once per redraw until the user closes the window or
//! presses Escape, then releases everything in reverse order of acquisition.

mod app;
mod input;
mod scene;

use anyhow::{Result, anyhow};
use asset::SceneManifest;
use corelib::DemoSettings;
use winit::event_loop::EventLoop;

pub use input::map_key;

/// Everything the frame loop needs, fixed before the window opens.
#[derive(Clone, Debug)]
pub struct RunOptions {
    pub settings: DemoSettings,
    pub manifest: SceneManifest,
    pub backends: wgpu::Backends,
}

/// Run the demo until the window closes. Returns the initialization error,
/// if any, after everything acquired so far has been released.
pub fn run_with_renderer(options: RunOptions) -> Result<()> {
    let event_loop = EventLoop::new().map_err(|e| anyhow!("Event loop error: {e}"))?;
    let mut app = app::DemoApp::new(options);
    event_loop
        .run_app(&mut app)
        .map_err(|e| anyhow!("Event loop error: {e:?}"))?;
    app.finish()
}
