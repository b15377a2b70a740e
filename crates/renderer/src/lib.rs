//! Renderer: wgpu init, MSAA + depth targets, model/grid passes, text overlay.
//! wgpu = 24.x, winit = 0.30.x

mod grid;
mod overlay;
mod resources;
mod uniforms;

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use asset::{MeshData, ShaderSource, TextureData};
use bytemuck::Zeroable;
use corelib::settings::{GridSettings, LightSettings};
use corelib::{Camera, Color, Transform};
use wgpu::{
    BindGroup, Buffer, BufferUsages, CommandEncoderDescriptor, Device, DeviceDescriptor,
    Extent3d, Features, Instance, InstanceDescriptor, Limits, LoadOp, Operations, PowerPreference,
    PresentMode, Queue, RenderPassColorAttachment, RenderPassDescriptor, StoreOp, Surface,
    SurfaceConfiguration, SurfaceError, TextureDescriptor, TextureDimension, TextureFormat,
    TextureUsages, TextureView, TextureViewDescriptor, util::DeviceExt,
};
use winit::{dpi::PhysicalSize, window::Window};

pub use overlay::{HudText, Overlay};
pub use resources::{GpuModel, GpuTexture, Material, ShaderProgram};
pub use uniforms::{FrameUniform, ObjectUniform};

use grid::GridPass;
use resources::{DEPTH_FORMAT, Layouts, TargetInfo};

/// Device/surface choices made before the GPU is touched.
#[derive(Clone, Copy, Debug)]
pub struct GpuOptions {
    pub backends: wgpu::Backends,
    /// Requested MSAA sample count (1 or 4). Falls back to 1 if unsupported.
    pub msaa_samples: u32,
    pub grid: GridSettings,
}

/// Everything one frame needs besides the GPU state itself.
pub struct FrameParams<'a> {
    pub camera: &'a Camera,
    pub light: &'a LightSettings,
    pub clear_color: Color,
    pub models: &'a [ModelDraw<'a>],
    pub draw_grid: bool,
    pub texts: &'a [HudText],
}

/// `DrawModel(model, position, scale, tint)`.
pub struct ModelDraw<'a> {
    pub model: &'a GpuModel,
    pub transform: Transform,
    pub tint: Color,
}

pub struct GpuState {
    // Surface
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,

    // Device/queue
    device: Device,
    queue: Queue,

    // Pipelines
    layouts: Layouts,
    target: TargetInfo,
    grid: GridPass,
    default_shader: ShaderProgram,
    white: GpuTexture,

    // Frame uniforms
    frame_buf: Buffer,
    frame_bg: BindGroup,

    // Render targets
    msaa_view: Option<TextureView>,
    depth_view: TextureView,

    // Size cache
    width: u32,
    height: u32,
}

impl GpuState {
    /// Create GPU state bound to an Arc<Window>.
    pub async fn new(window: Arc<Window>, options: GpuOptions) -> Result<Self> {
        let PhysicalSize { width, height } = window.inner_size();
        let width = width.max(1);
        let height = height.max(1);

        // Instance & surface
        let instance = Instance::new(&InstanceDescriptor {
            backends: options.backends,
            ..Default::default()
        });
        let surface: Surface<'static> = instance
            .create_surface(window.clone())
            .context("create_surface failed")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow!("No suitable GPU adapter for {:?}", options.backends))?;
        let info = adapter.get_info();
        log::info!("Adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("ModelShader Device"),
                    required_features: Features::empty(),
                    required_limits: Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .context("request_device failed")?;

        // Surface format (prefer sRGB)
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| anyhow!("Surface reports no formats"))?;

        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let sample_count = pick_sample_count(&adapter, surface_format, options.msaa_samples);
        let target = TargetInfo {
            color_format: surface_format,
            sample_count,
        };
        log::info!(
            "Surface {}x{} {:?}, MSAA x{}",
            width,
            height,
            surface_format,
            sample_count
        );

        let layouts = Layouts::new(&device);

        let frame_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Frame UBO"),
            contents: bytemuck::bytes_of(&FrameUniform::zeroed()),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let frame_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame BG"),
            layout: &layouts.frame,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buf.as_entire_binding(),
            }],
        });

        let grid = GridPass::new(&device, &layouts, target, options.grid);
        let builtin = ShaderSource {
            label: "default".to_owned(),
            ..Default::default()
        };
        let default_shader = ShaderProgram::compile(&device, &layouts, target, &builtin)
            .context("Built-in shader failed to compile")?;
        let white = GpuTexture::upload(
            &device,
            &queue,
            &TextureData::solid(1, Color::WHITE),
            "default white",
        )
        .context("Default white texture failed to upload")?;

        let msaa_view = create_msaa_view(&device, &surface_config, sample_count);
        let depth_view = create_depth_view(&device, &surface_config, sample_count);

        Ok(Self {
            surface,
            surface_config,
            device,
            queue,
            layouts,
            target,
            grid,
            default_shader,
            white,
            frame_buf,
            frame_bg,
            msaa_view,
            depth_view,
            width,
            height,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn sample_count(&self) -> u32 {
        self.target.sample_count
    }

    /// Create the text overlay for this surface.
    pub fn create_overlay(&self, window: &Window) -> Overlay {
        Overlay::new(&self.device, self.surface_config.format, window)
    }

    /// `LoadTexture`: upload decoded pixels.
    /// Fails, without panicking, when the image exceeds the device limits.
    pub fn load_texture(&self, data: &TextureData, label: &str) -> Result<GpuTexture> {
        GpuTexture::upload(&self.device, &self.queue, data, label)
    }

    /// `LoadShader`: compile a program against the model pass layout.
    pub fn load_shader(&self, source: &ShaderSource) -> Result<ShaderProgram> {
        ShaderProgram::compile(&self.device, &self.layouts, self.target, source)
    }

    /// `LoadModel`: upload a mesh with the default material
    /// (built-in shader, 1x1 white diffuse).
    pub fn load_model(&self, mesh: &MeshData, label: &str) -> Result<GpuModel> {
        anyhow::ensure!(mesh.is_valid(), "Mesh '{label}' has no valid triangles");
        let material = Material::new(
            &self.device,
            &self.layouts,
            &self.default_shader,
            &self.white,
        );
        GpuModel::upload(&self.device, &self.layouts, mesh, material, label)
    }

    /// Put `texture` in the model's diffuse slot.
    pub fn bind_diffuse(&self, model: &mut GpuModel, texture: &GpuTexture) {
        model.bind_diffuse(&self.device, &self.layouts, texture);
    }

    /// Resize: reconfigure surface & recreate MSAA/depth targets.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.surface_config.width = self.width;
        self.surface_config.height = self.height;
        self.surface.configure(&self.device, &self.surface_config);
        let samples = self.target.sample_count;
        self.msaa_view = create_msaa_view(&self.device, &self.surface_config, samples);
        self.depth_view = create_depth_view(&self.device, &self.surface_config, samples);
    }

    /// Render one frame: 3D pass (models + grid), then the overlay, then present.
    pub fn render(
        &mut self,
        params: &FrameParams<'_>,
        overlay: &mut Overlay,
        window: &Window,
    ) -> Result<(), SurfaceError> {
        let aspect = self.width as f32 / self.height as f32;
        let frame_u = FrameUniform::new(params.camera, aspect, params.light);
        self.queue
            .write_buffer(&self.frame_buf, 0, bytemuck::bytes_of(&frame_u));
        for draw in params.models {
            draw.model
                .write_object(&self.queue, &ObjectUniform::new(&draw.transform, draw.tint));
        }

        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("MainEncoder"),
            });

        {
            let [r, g, b, a] = params.clear_color.to_linear_f32();
            let (color_view, resolve_target, store) = match &self.msaa_view {
                Some(msaa) => (msaa, Some(&view), StoreOp::Discard),
                None => (&view, None, StoreOp::Store),
            };
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("MainPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: color_view,
                    resolve_target,
                    ops: Operations {
                        load: LoadOp::Clear(wgpu::Color {
                            r: r as f64,
                            g: g as f64,
                            b: b as f64,
                            a: a as f64,
                        }),
                        store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            for draw in params.models {
                draw.model.draw(&mut rpass, &self.frame_bg);
            }
            if params.draw_grid {
                self.grid.draw(&mut rpass, &self.frame_bg);
            }
        }

        let hud = overlay.build(window, params.texts, [self.width, self.height]);
        let extra = overlay.record(&self.device, &self.queue, &mut encoder, &view, &hud);

        self.queue
            .submit(extra.into_iter().chain(Some(encoder.finish())));
        frame.present();
        Ok(())
    }

    pub fn is_surface_lost(err: &SurfaceError) -> bool {
        matches!(err, SurfaceError::Lost | SurfaceError::Outdated)
    }

    pub fn recreate_surface(&mut self) {
        self.resize(self.width, self.height);
    }
}

fn pick_sample_count(adapter: &wgpu::Adapter, format: TextureFormat, requested: u32) -> u32 {
    if requested <= 1 {
        return 1;
    }
    let flags = adapter.get_texture_format_features(format).flags;
    let depth_flags = adapter.get_texture_format_features(DEPTH_FORMAT).flags;
    if flags.sample_count_supported(requested) && depth_flags.sample_count_supported(requested) {
        requested
    } else {
        log::warn!("MSAA x{requested} unsupported for {format:?}, rendering without it");
        1
    }
}

/// Multisampled colour target; `None` when MSAA is off.
fn create_msaa_view(
    device: &Device,
    sc: &SurfaceConfiguration,
    sample_count: u32,
) -> Option<TextureView> {
    (sample_count > 1).then(|| {
        device
            .create_texture(&TextureDescriptor {
                label: Some("MsaaTex"),
                size: Extent3d {
                    width: sc.width.max(1),
                    height: sc.height.max(1),
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count,
                dimension: TextureDimension::D2,
                format: sc.format,
                usage: TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&TextureViewDescriptor::default())
    })
}

/// Create a depth texture view matching the surface config.
fn create_depth_view(device: &Device, sc: &SurfaceConfiguration, sample_count: u32) -> TextureView {
    let tex = device.create_texture(&TextureDescriptor {
        label: Some("DepthTex"),
        size: Extent3d {
            width: sc.width.max(1),
            height: sc.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    tex.create_view(&TextureViewDescriptor::default())
}
