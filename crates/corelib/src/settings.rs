//! Every tunable of the demo in one place. `Default` reproduces the stock scene.

use crate::color::Color;
use crate::controller::DEFAULT_STEP;
use crate::error::{CoreError, CoreResult};
use crate::{Camera, Transform, Vec3, vec3};

#[derive(Clone, Debug, PartialEq)]
pub struct WindowSettings {
    pub width: u32,
    pub height: u32,
    pub title: String,
    /// 1 (off) or 4.
    pub msaa_samples: u32,
    pub resizable: bool,
    /// Treat `width`/`height` as logical (scale-factor aware) pixels.
    pub high_dpi: bool,
    /// Interlaced scan-out hint. No backend honours it; logged and ignored.
    pub interlaced: bool,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 450,
            title: "modelshader - model shader".to_owned(),
            msaa_samples: 4,
            resizable: true,
            high_dpi: true,
            interlaced: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridSettings {
    pub slices: u32,
    pub spacing: f32,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            slices: 10,
            spacing: 1.0,
        }
    }
}

/// A single point light fed to the lighting shader.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightSettings {
    pub position: Vec3,
    pub color: Color,
    /// Ambient term, 0..1.
    pub ambient: f32,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            position: vec3(-2.0, 4.0, -3.0),
            color: Color::WHITE,
            ambient: 0.3,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DemoSettings {
    pub window: WindowSettings,
    pub target_fps: u32,
    pub camera_step: f32,
    pub camera: Camera,
    pub model: Transform,
    pub tint: Color,
    pub grid: GridSettings,
    pub light: LightSettings,
    pub clear_color: Color,
    pub credit: String,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            window: WindowSettings::default(),
            target_fps: 60,
            camera_step: DEFAULT_STEP,
            camera: Camera::new_perspective(vec3(0.0, 0.0, -4.0), Vec3::ZERO, Vec3::Y, 45.0),
            model: Transform::at(Vec3::ZERO, 0.2),
            tint: Color::WHITE,
            grid: GridSettings::default(),
            light: LightSettings::default(),
            clear_color: Color::RAYWHITE,
            credit: "(c) Watermill 3D model by Alberto Cano".to_owned(),
        }
    }
}

impl DemoSettings {
    pub fn validate(&self) -> CoreResult<()> {
        let WindowSettings { width, height, msaa_samples, .. } = self.window;
        if width == 0 || height == 0 {
            return Err(CoreError::ZeroWindowSize { width, height });
        }
        if !matches!(msaa_samples, 1 | 4) {
            return Err(CoreError::InvalidSampleCount(msaa_samples));
        }
        if !self.camera_step.is_finite() || self.camera_step <= 0.0 {
            return Err(CoreError::InvalidStep(self.camera_step));
        }
        let GridSettings { slices, spacing } = self.grid;
        if slices == 0 || !spacing.is_finite() || spacing <= 0.0 {
            return Err(CoreError::InvalidGrid { slices, spacing });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Projection;

    #[test]
    fn defaults_match_stock_scene() {
        let s = DemoSettings::default();
        assert_eq!((s.window.width, s.window.height), (800, 450));
        assert_eq!(s.window.msaa_samples, 4);
        assert!(s.window.resizable);
        assert_eq!(s.target_fps, 60);
        assert!((s.camera_step - 0.1).abs() < 1e-6);
        assert_eq!(s.camera.position, vec3(0.0, 0.0, -4.0));
        assert_eq!(s.camera.target, Vec3::ZERO);
        assert_eq!(s.camera.up, Vec3::Y);
        assert_eq!(s.camera.fovy_deg, 45.0);
        assert_eq!(s.camera.projection, Projection::Perspective);
        assert_eq!(s.model.scale, 0.2);
        assert_eq!(s.grid, GridSettings { slices: 10, spacing: 1.0 });
        assert_eq!(s.clear_color, Color::RAYWHITE);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        let mut s = DemoSettings::default();
        s.window.height = 0;
        assert_eq!(
            s.validate(),
            Err(CoreError::ZeroWindowSize { width: 800, height: 0 })
        );

        let mut s = DemoSettings::default();
        s.camera_step = f32::NAN;
        assert!(matches!(s.validate(), Err(CoreError::InvalidStep(_))));

        let mut s = DemoSettings::default();
        s.camera_step = -0.1;
        assert!(matches!(s.validate(), Err(CoreError::InvalidStep(_))));

        let mut s = DemoSettings::default();
        s.window.msaa_samples = 2;
        assert_eq!(s.validate(), Err(CoreError::InvalidSampleCount(2)));

        let mut s = DemoSettings::default();
        s.grid.slices = 0;
        assert!(matches!(s.validate(), Err(CoreError::InvalidGrid { .. })));
    }
}
