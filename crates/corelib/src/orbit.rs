//! Mouse-driven orbital camera update, run before the keyboard controller.

use crate::camera::Camera;
use crate::{Quat, Vec2, Vec3};

const MAX_PITCH: f32 = 89.0_f32 * std::f32::consts::PI / 180.0;

/// Mouse input accumulated between two ticks.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OrbitInput {
    /// Cursor delta in physical pixels while the orbit button was held.
    pub drag: Vec2,
    /// Wheel delta in lines; positive scrolls towards the target.
    pub wheel: f32,
}

impl OrbitInput {
    pub fn is_empty(&self) -> bool {
        self.drag == Vec2::ZERO && self.wheel == 0.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitController {
    /// Radians per pixel of drag.
    pub rotate_speed: f32,
    /// Fraction of the current distance moved per wheel line.
    pub zoom_speed: f32,
    pub min_distance: f32,
}

impl Default for OrbitController {
    fn default() -> Self {
        Self {
            rotate_speed: 0.005,
            zoom_speed: 0.1,
            min_distance: 0.1,
        }
    }
}

impl OrbitController {
    /// Consume `input` and rotate/dolly `camera.position` around `camera.target`.
    pub fn update(&self, camera: &mut Camera, input: &mut OrbitInput) {
        let OrbitInput { drag, wheel } = std::mem::take(input);
        if drag == Vec2::ZERO && wheel == 0.0 {
            return;
        }

        let arm = camera.position - camera.target;
        let mut distance = arm.length();
        if distance <= f32::EPSILON {
            return;
        }
        let mut dir = arm / distance;

        if drag != Vec2::ZERO {
            let up = camera.up.normalize_or(Vec3::Y);
            let yaw = Quat::from_axis_angle(up, -drag.x * self.rotate_speed);
            dir = yaw * dir;

            // Pitch about the camera's right axis, clamped short of the poles.
            let pitch_now = dir.dot(up).clamp(-1.0, 1.0).asin();
            let pitch_next = (pitch_now + drag.y * self.rotate_speed).clamp(-MAX_PITCH, MAX_PITCH);
            let right = up.cross(dir).normalize_or_zero();
            if right != Vec3::ZERO {
                dir = Quat::from_axis_angle(right, -(pitch_next - pitch_now)) * dir;
            }
        }

        if wheel != 0.0 {
            distance = (distance * (1.0 - wheel * self.zoom_speed)).max(self.min_distance);
        }

        camera.position = camera.target + dir.normalize() * distance;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec3;

    fn start() -> Camera {
        Camera::new_perspective(vec3(0.0, 0.0, -4.0), Vec3::ZERO, Vec3::Y, 45.0)
    }

    #[test]
    fn no_input_is_a_no_op() {
        let mut cam = start();
        let before = cam;
        OrbitController::default().update(&mut cam, &mut OrbitInput::default());
        assert_eq!(cam, before);
    }

    #[test]
    fn drag_keeps_distance_and_target() {
        let mut cam = start();
        let mut input = OrbitInput {
            drag: Vec2::new(120.0, -40.0),
            wheel: 0.0,
        };
        OrbitController::default().update(&mut cam, &mut input);
        assert!(input.is_empty(), "input must be consumed");
        assert_eq!(cam.target, Vec3::ZERO);
        assert!((cam.position.length() - 4.0).abs() < 1e-4);
        assert!(cam.position.x.abs() > 1e-3);
    }

    #[test]
    fn pitch_stops_short_of_the_pole() {
        let mut cam = start();
        let mut input = OrbitInput {
            drag: Vec2::new(0.0, 10_000.0),
            wheel: 0.0,
        };
        OrbitController::default().update(&mut cam, &mut input);
        let elevation = cam.position.normalize().dot(Vec3::Y).asin();
        assert!(elevation.abs() <= MAX_PITCH + 1e-4);
        assert!(cam.position.is_finite());
    }

    #[test]
    fn wheel_dollies_towards_target_but_not_through_it() {
        let mut cam = start();
        let ctrl = OrbitController::default();
        let mut input = OrbitInput {
            drag: Vec2::ZERO,
            wheel: 1.0,
        };
        ctrl.update(&mut cam, &mut input);
        assert!((cam.position.length() - 3.6).abs() < 1e-4);

        for _ in 0..500 {
            let mut input = OrbitInput {
                drag: Vec2::ZERO,
                wheel: 5.0,
            };
            ctrl.update(&mut cam, &mut input);
        }
        assert!((cam.position.length() - ctrl.min_distance).abs() < 1e-4);
    }
}
