use crate::{Mat4, Vec3};

/// Projection mode. The demo only ever uses `Perspective`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Projection {
    Perspective,
    Orthographic,
}

/// Look-at camera (right-handed).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees (or view height for orthographic).
    pub fovy_deg: f32,
    pub projection: Projection,
}

pub const Z_NEAR: f32 = 0.01;
pub const Z_FAR: f32 = 1000.0;

impl Camera {
    pub fn new_perspective(position: Vec3, target: Vec3, up: Vec3, fovy_deg: f32) -> Self {
        Self {
            position,
            target,
            up,
            fovy_deg,
            projection: Projection::Perspective,
        }
    }

    /// Move eye and target by the same delta, keeping the look-at offset.
    #[inline]
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
        self.target += delta;
    }

    /// Vector from eye to target.
    #[inline]
    pub fn offset(&self) -> Vec3 {
        self.target - self.position
    }

    #[inline]
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// NOTE: glam's `perspective_rh` already maps depth to [0,1] as wgpu expects.
    pub fn proj(&self, aspect: f32) -> Mat4 {
        let aspect = aspect.max(1e-6);
        match self.projection {
            Projection::Perspective => {
                Mat4::perspective_rh(self.fovy_deg.to_radians(), aspect, Z_NEAR, Z_FAR)
            }
            Projection::Orthographic => {
                let top = self.fovy_deg * 0.5;
                let right = top * aspect;
                Mat4::orthographic_rh(-right, right, -top, top, Z_NEAR, Z_FAR)
            }
        }
    }

    #[inline]
    pub fn proj_view(&self, aspect: f32) -> Mat4 {
        self.proj(aspect) * self.view()
    }
}
