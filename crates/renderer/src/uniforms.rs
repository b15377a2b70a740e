//! Uniform blocks shared by every shader program. Layout must match the
//! `Frame` / `Object` structs declared in the WGSL sources.

use bytemuck::{Pod, Zeroable};
use corelib::settings::LightSettings;
use corelib::{Camera, Color, Transform};

/// Group 0: per-frame camera and light.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub view_pos: [f32; 4],
    pub light_pos: [f32; 4],
    /// rgb = colour (linear), w = ambient.
    pub light_color: [f32; 4],
}

impl FrameUniform {
    pub fn new(camera: &Camera, aspect: f32, light: &LightSettings) -> Self {
        let [r, g, b, _] = light.color.to_linear_f32();
        Self {
            view_proj: camera.proj_view(aspect).to_cols_array_2d(),
            view_pos: camera.position.extend(1.0).to_array(),
            light_pos: light.position.extend(1.0).to_array(),
            light_color: [r, g, b, light.ambient],
        }
    }
}

/// Group 1: per-draw placement and tint.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    pub tint: [f32; 4],
}

impl ObjectUniform {
    pub fn new(transform: &Transform, tint: Color) -> Self {
        Self {
            model: transform.matrix().to_cols_array_2d(),
            normal: transform.normal_matrix().to_cols_array_2d(),
            tint: tint.to_linear_f32(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::{Vec3, vec3};

    #[test]
    fn sizes_are_16_byte_multiples() {
        assert_eq!(std::mem::size_of::<FrameUniform>(), 112);
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 144);
    }

    #[test]
    fn frame_uniform_carries_camera_and_light() {
        let cam = Camera::new_perspective(vec3(0.0, 0.0, -4.0), Vec3::ZERO, Vec3::Y, 45.0);
        let light = LightSettings::default();
        let u = FrameUniform::new(&cam, 16.0 / 9.0, &light);
        assert_eq!(u.view_pos, [0.0, 0.0, -4.0, 1.0]);
        assert_eq!(u.light_color[3], light.ambient);
        assert!(u.view_proj.iter().flatten().all(|f| f.is_finite()));
    }

    #[test]
    fn object_uniform_scales_model() {
        let u = ObjectUniform::new(&Transform::at(Vec3::ZERO, 0.2), Color::WHITE);
        assert!((u.model[0][0] - 0.2).abs() < 1e-6);
        assert!((u.normal[0][0] - 5.0).abs() < 1e-4);
        assert_eq!(u.tint, [1.0; 4]);
    }
}
