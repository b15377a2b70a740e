//! Core types: math re-exports, camera, controllers, lifecycle, timing, settings.

pub use glam::{Mat4, Quat, Vec2, Vec3, vec3};

pub mod camera;
pub mod color;
pub mod controller;
pub mod error;
pub mod grid;
pub mod lifecycle;
pub mod orbit;
pub mod settings;
pub mod timing;
pub mod transform;

pub use camera::{Camera, Projection};
pub use color::Color;
pub use controller::{CameraController, HeldKeys, Key, KeyState};
pub use error::{CoreError, CoreResult};
pub use lifecycle::Lifecycle;
pub use orbit::{OrbitController, OrbitInput};
pub use settings::DemoSettings;
pub use transform::Transform;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_transform_is_identity_matrix() {
        let t = Transform::identity();
        assert_eq!(t.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn translate_then_scale_matrix() {
        let t = Transform::at(vec3(1.0, 2.0, 3.0), 0.2);
        // Last column = translation, diagonal = scale (no rotation).
        let m = t.matrix().to_cols_array();
        assert!((m[12] - 1.0).abs() < 1e-6);
        assert!((m[13] - 2.0).abs() < 1e-6);
        assert!((m[14] - 3.0).abs() < 1e-6);
        assert!((m[0] - 0.2).abs() < 1e-6);
        assert!((m[5] - 0.2).abs() < 1e-6);
        assert!((m[10] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn camera_pv_is_finite() {
        let cam = Camera::new_perspective(vec3(0.0, 0.0, -4.0), Vec3::ZERO, Vec3::Y, 45.0);
        let pv = cam.proj_view(16.0 / 9.0);
        assert!(pv.to_cols_array().iter().all(|f| f.is_finite()));
    }

    #[test]
    fn camera_translate_keeps_offset() {
        let mut cam = Camera::new_perspective(vec3(0.0, 0.0, -4.0), Vec3::ZERO, Vec3::Y, 45.0);
        let offset = cam.offset();
        cam.translate(vec3(3.0, -1.0, 2.0));
        assert!(cam.offset().abs_diff_eq(offset, 1e-6));
        assert_eq!(cam.view(), Mat4::look_at_rh(cam.position, cam.target, Vec3::Y));
    }

    #[test]
    fn orthographic_projection_is_finite() {
        let mut cam = Camera::new_perspective(vec3(0.0, 0.0, -4.0), Vec3::ZERO, Vec3::Y, 10.0);
        cam.projection = Projection::Orthographic;
        assert!(cam.proj(2.0).to_cols_array().iter().all(|f| f.is_finite()));
    }
}
