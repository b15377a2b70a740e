//! GPU resource handles: textures, shader programs, models and their material slot.
//!
//! Each handle is released exactly once, when it is dropped. wgpu keeps the
//! underlying objects alive while a bind group or pipeline still refers to
//! them, so dropping a shader before the model that uses it is safe.

use anyhow::{Result, bail, ensure};
use asset::{MeshData, MeshVertex, ShaderSource, TextureData};
use wgpu::{
    BindGroup, BindGroupLayout, Buffer, BufferUsages, Device, Queue, RenderPipeline, Sampler,
    TextureFormat, TextureView, VertexBufferLayout, VertexStepMode, util::DeviceExt,
};

use crate::uniforms::ObjectUniform;

pub(crate) const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;
pub(crate) const DEFAULT_SHADER: &str = include_str!("shaders/default.wgsl");

pub(crate) const MESH_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: std::mem::size_of::<MeshVertex>() as u64,
    step_mode: VertexStepMode::Vertex,
    attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2],
};

/// Bind group layouts every model pipeline is built against.
pub(crate) struct Layouts {
    pub frame: BindGroupLayout,
    pub object: BindGroupLayout,
    pub material: BindGroupLayout,
}

impl Layouts {
    pub fn new(device: &Device) -> Self {
        let uniform = |label, visibility| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(label),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            })
        };
        let frame = uniform("Frame BGL", wgpu::ShaderStages::VERTEX_FRAGMENT);
        let object = uniform("Object BGL", wgpu::ShaderStages::VERTEX_FRAGMENT);

        let material = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material BGL"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        Self {
            frame,
            object,
            material,
        }
    }
}

/// Target description a pipeline is compiled for.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TargetInfo {
    pub color_format: TextureFormat,
    pub sample_count: u32,
}

impl TargetInfo {
    pub fn multisample(&self) -> wgpu::MultisampleState {
        wgpu::MultisampleState {
            count: self.sample_count,
            ..Default::default()
        }
    }

    pub fn depth_stencil(&self, write: bool) -> wgpu::DepthStencilState {
        wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: write,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }
    }
}

/// Sampled RGBA8 texture.
pub struct GpuTexture {
    label: String,
    #[allow(dead_code)]
    texture: wgpu::Texture,
    view: TextureView,
    sampler: Sampler,
    width: u32,
    height: u32,
}

impl GpuTexture {
    pub(crate) fn upload(
        device: &Device,
        queue: &Queue,
        data: &TextureData,
        label: &str,
    ) -> Result<Self> {
        ensure!(data.is_valid(), "Texture '{label}' has no pixels");
        check_texture_fits(data.width, data.height, &device.limits())
            .map_err(|e| e.context(format!("Texture '{label}' cannot be uploaded")))?;

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let size = wgpu::Extent3d {
            width: data.width,
            height: data.height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &data.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(data.bytes_per_pixel() * data.width),
                rows_per_image: Some(data.height),
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            bail!("Texture '{label}' upload failed: {err}");
        }

        log::info!("Texture '{}' uploaded ({}x{})", label, data.width, data.height);
        Ok(Self {
            label: label.to_owned(),
            texture,
            view,
            sampler,
            width: data.width,
            height: data.height,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn bind_group(&self, device: &Device, layout: &BindGroupLayout) -> BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&self.label),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&self.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }
}

impl Drop for GpuTexture {
    fn drop(&mut self) {
        log::info!("Texture '{}' unloaded", self.label);
    }
}

/// Compiled program: one render pipeline for the model pass.
pub struct ShaderProgram {
    label: String,
    pipeline: RenderPipeline,
}

impl ShaderProgram {
    /// Compile `source`, filling missing stages from the built-in default.
    /// Validation errors are returned instead of aborting.
    pub(crate) fn compile(
        device: &Device,
        layouts: &Layouts,
        target: TargetInfo,
        source: &ShaderSource,
    ) -> Result<Self> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let builtin = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Default WGSL"),
            source: wgpu::ShaderSource::Wgsl(DEFAULT_SHADER.into()),
        });
        let module = |stage: &Option<String>, name: &str| {
            stage.as_ref().map(|src| {
                device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(&format!("{} {}", source.label, name)),
                    source: wgpu::ShaderSource::Wgsl(src.as_str().into()),
                })
            })
        };
        let vs = module(&source.vertex, "vertex");
        let fs = module(&source.fragment, "fragment");

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Model PipelineLayout"),
            bind_group_layouts: &[&layouts.frame, &layouts.object, &layouts.material],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&source.label),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: vs.as_ref().unwrap_or(&builtin),
                entry_point: Some("vs_main"),
                buffers: &[MESH_LAYOUT],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: fs.as_ref().unwrap_or(&builtin),
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target.color_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(target.depth_stencil(true)),
            multisample: target.multisample(),
            multiview: None,
            cache: None,
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            bail!("Shader '{}' failed to compile: {}", source.label, err);
        }
        log::info!("Shader '{}' compiled", source.label);
        Ok(Self {
            label: source.label.clone(),
            pipeline,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        log::info!("Shader '{}' unloaded", self.label);
    }
}

/// The model's single material slot: which program draws it and which
/// diffuse map it samples.
pub struct Material {
    pub shader: String,
    pipeline: RenderPipeline,
    pub diffuse: String,
    diffuse_bg: BindGroup,
}

impl Material {
    pub(crate) fn new(
        device: &Device,
        layouts: &Layouts,
        shader: &ShaderProgram,
        diffuse: &GpuTexture,
    ) -> Self {
        Self {
            shader: shader.label.clone(),
            pipeline: shader.pipeline.clone(),
            diffuse: diffuse.label.clone(),
            diffuse_bg: diffuse.bind_group(device, &layouts.material),
        }
    }
}

/// Indexed mesh in GPU buffers plus its material and per-draw uniforms.
pub struct GpuModel {
    label: String,
    vertex_buf: Buffer,
    index_buf: Buffer,
    index_count: u32,
    object_buf: Buffer,
    object_bg: BindGroup,
    material: Material,
}

impl GpuModel {
    pub(crate) fn upload(
        device: &Device,
        layouts: &Layouts,
        mesh: &MeshData,
        material: Material,
        label: &str,
    ) -> Result<Self> {
        let limits = device.limits();
        check_buffer_fits(std::mem::size_of_val(mesh.vertices.as_slice()), &limits)
            .map_err(|e| e.context(format!("Model '{label}' vertex buffer")))?;
        check_buffer_fits(std::mem::size_of_val(mesh.indices.as_slice()), &limits)
            .map_err(|e| e.context(format!("Model '{label}' index buffer")))?;

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let vertex_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} VB")),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: BufferUsages::VERTEX,
        });
        let index_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} IB")),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: BufferUsages::INDEX,
        });
        let object_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Object UBO")),
            contents: bytemuck::bytes_of(&ObjectUniform::new(
                &corelib::Transform::identity(),
                corelib::Color::WHITE,
            )),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let object_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label} Object BG")),
            layout: &layouts.object,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: object_buf.as_entire_binding(),
            }],
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            bail!("Model '{label}' upload failed: {err}");
        }

        log::info!(
            "Model '{}' uploaded ({} vertices, {} triangles)",
            label,
            mesh.vertices.len(),
            mesh.triangle_count()
        );
        Ok(Self {
            label: label.to_owned(),
            vertex_buf,
            index_buf,
            index_count: mesh.indices.len() as u32,
            object_buf,
            object_bg,
            material,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    /// Swap the program in the material slot.
    pub fn bind_shader(&mut self, shader: &ShaderProgram) {
        log::info!("Model '{}': material shader = '{}'", self.label, shader.label);
        self.material.shader = shader.label.clone();
        self.material.pipeline = shader.pipeline.clone();
    }

    /// Swap the diffuse map in the material slot.
    pub(crate) fn bind_diffuse(&mut self, device: &Device, layouts: &Layouts, texture: &GpuTexture) {
        log::info!("Model '{}': material diffuse = '{}'", self.label, texture.label);
        self.material.diffuse = texture.label.clone();
        self.material.diffuse_bg = texture.bind_group(device, &layouts.material);
    }

    pub(crate) fn write_object(&self, queue: &Queue, object: &ObjectUniform) {
        queue.write_buffer(&self.object_buf, 0, bytemuck::bytes_of(object));
    }

    pub(crate) fn draw(&self, pass: &mut wgpu::RenderPass<'_>, frame_bg: &BindGroup) {
        pass.set_pipeline(&self.material.pipeline);
        pass.set_bind_group(0, frame_bg, &[]);
        pass.set_bind_group(1, &self.object_bg, &[]);
        pass.set_bind_group(2, &self.material.diffuse_bg, &[]);
        pass.set_vertex_buffer(0, self.vertex_buf.slice(..));
        pass.set_index_buffer(self.index_buf.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

impl Drop for GpuModel {
    fn drop(&mut self) {
        log::info!("Model '{}' unloaded", self.label);
    }
}

/// Reject textures the device cannot create instead of tripping validation.
pub(crate) fn check_texture_fits(width: u32, height: u32, limits: &wgpu::Limits) -> Result<()> {
    let max = limits.max_texture_dimension_2d;
    ensure!(
        width <= max && height <= max,
        "{width}x{height} exceeds the device limit of {max}x{max}"
    );
    Ok(())
}

pub(crate) fn check_buffer_fits(bytes: usize, limits: &wgpu::Limits) -> Result<()> {
    let max = limits.max_buffer_size;
    ensure!(
        bytes as u64 <= max,
        "{bytes} bytes exceeds the device buffer limit of {max} bytes"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> wgpu::Limits {
        wgpu::Limits {
            max_texture_dimension_2d: 4096,
            max_buffer_size: 1024,
            ..wgpu::Limits::downlevel_webgl2_defaults()
        }
    }

    #[test]
    fn texture_at_the_limit_fits() {
        assert!(check_texture_fits(4096, 4096, &limits()).is_ok());
        assert!(check_texture_fits(1, 4096, &limits()).is_ok());
    }

    #[test]
    fn oversized_texture_is_an_error_not_a_panic() {
        let err = check_texture_fits(4097, 16, &limits()).unwrap_err();
        assert!(err.to_string().contains("4097x16"), "{err}");
        assert!(check_texture_fits(16, 16385, &limits()).is_err());
    }

    #[test]
    fn oversized_buffer_is_rejected() {
        assert!(check_buffer_fits(1024, &limits()).is_ok());
        let err = check_buffer_fits(1025, &limits()).unwrap_err();
        assert!(err.to_string().contains("1025 bytes"), "{err}");
    }

    #[test]
    fn vertex_stride_matches_mesh_layout() {
        assert_eq!(MESH_LAYOUT.array_stride, 32);
    }
}
