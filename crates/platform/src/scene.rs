use anyhow::{Context, Result};
use asset::{SceneManifest, ShaderSource, TextureData, obj};
use renderer::{GpuModel, GpuState, GpuTexture, ShaderProgram};

/// GPU resources of the scene. Fields drop top to bottom, so release runs
/// shader, texture, model: the reverse of how they were acquired.
pub(crate) struct Scene {
    pub shader: ShaderProgram,
    pub texture: GpuTexture,
    pub model: GpuModel,
}

impl Scene {
    /// Load model, diffuse texture and lighting shader, then wire the texture
    /// and shader into the model's material slot. On failure anything
    /// already uploaded is dropped before the error is returned.
    pub fn load(gpu: &GpuState, manifest: &SceneManifest) -> Result<Self> {
        manifest.check()?;

        let model_path = manifest.model_path();
        let mesh = obj::load_obj_from_path(&model_path)?;
        let mut model = gpu
            .load_model(&mesh, "watermill")
            .with_context(|| format!("Failed to upload {}", model_path.display()))?;

        let diffuse_path = manifest.diffuse_path();
        let pixels = TextureData::load(&diffuse_path)?;
        let texture = gpu
            .load_texture(&pixels, "watermill_diffuse")
            .with_context(|| format!("Failed to upload {}", diffuse_path.display()))?;

        let shader_path = manifest.lighting_shader_path();
        let source = ShaderSource::load(None, Some(&shader_path))?;
        let shader = gpu
            .load_shader(&source)
            .with_context(|| format!("Failed to compile {}", shader_path.display()))?;

        gpu.bind_diffuse(&mut model, &texture);
        model.bind_shader(&shader);
        let (tex_w, tex_h) = texture.size();
        log::info!(
            "Scene ready: model '{}', shader '{}', diffuse '{}' ({}x{})",
            model.label(),
            shader.label(),
            model.material().diffuse,
            tex_w,
            tex_h
        );

        Ok(Self {
            shader,
            texture,
            model,
        })
    }
}
