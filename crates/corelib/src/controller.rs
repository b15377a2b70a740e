//! Keyboard camera controller.
//!
//! One adjustment per tick at most: the bindings are tried in table order and
//! the first held key wins. Holding two keys never moves along two axes.
//! Movement is a fixed step per call, not scaled by frame time.

use std::collections::HashSet;

use crate::Vec3;
use crate::camera::Camera;

/// Keys the demo reacts to. Everything else is ignored by the platform layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    /// Dolly towards -Z.
    O,
    /// Dolly towards +Z.
    P,
    Escape,
}

/// Source of "is this key held right now" answers.
pub trait KeyState {
    fn is_down(&self, key: Key) -> bool;
}

/// Set of currently held keys, fed from press/release events.
#[derive(Clone, Debug, Default)]
pub struct HeldKeys {
    held: HashSet<Key>,
}

impl HeldKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: Key) {
        self.held.insert(key);
    }

    pub fn release(&mut self, key: Key) {
        self.held.remove(&key);
    }

    /// Apply a press (`true`) or release (`false`).
    pub fn set(&mut self, key: Key, pressed: bool) {
        if pressed {
            self.press(key);
        } else {
            self.release(key);
        }
    }

    /// Drop everything, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        self.held.clear();
    }
}

impl KeyState for HeldKeys {
    fn is_down(&self, key: Key) -> bool {
        self.held.contains(&key)
    }
}

impl<const N: usize> KeyState for [Key; N] {
    fn is_down(&self, key: Key) -> bool {
        self.contains(&key)
    }
}

/// Priority-ordered (key, unit direction) pairs.
pub const BINDINGS: [(Key, Vec3); 6] = [
    (Key::Left, Vec3::NEG_X),
    (Key::Right, Vec3::X),
    (Key::Up, Vec3::Y),
    (Key::Down, Vec3::NEG_Y),
    (Key::O, Vec3::NEG_Z),
    (Key::P, Vec3::Z),
];

/// Default translation per tick, in world units.
pub const DEFAULT_STEP: f32 = 0.1;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraController {
    pub step: f32,
}

impl Default for CameraController {
    fn default() -> Self {
        Self { step: DEFAULT_STEP }
    }
}

impl CameraController {
    pub fn new(step: f32) -> Self {
        Self { step }
    }

    /// Translate `camera` along the first held binding. Returns the key that fired.
    pub fn update(&self, camera: &mut Camera, keys: &impl KeyState) -> Option<Key> {
        let (key, dir) = BINDINGS.iter().find(|(key, _)| keys.is_down(*key))?;
        camera.translate(*dir * self.step);
        log::debug!(
            "camera {:?}: position={:?} target={:?}",
            key,
            camera.position,
            camera.target
        );
        Some(*key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec3;

    fn start() -> Camera {
        Camera::new_perspective(vec3(0.0, 0.0, -4.0), Vec3::ZERO, Vec3::Y, 45.0)
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn left_moves_position_and_target_negative_x() {
        let mut cam = start();
        let fired = CameraController::default().update(&mut cam, &[Key::Left]);
        assert_eq!(fired, Some(Key::Left));
        assert!(close(cam.position.x, -0.1));
        assert!(close(cam.target.x, -0.1));
        assert!(close(cam.position.y, 0.0));
        assert!(close(cam.position.z, -4.0));
        assert!(close(cam.target.y, 0.0));
        assert!(close(cam.target.z, 0.0));
    }

    #[test]
    fn right_moves_positive_x() {
        let mut cam = start();
        CameraController::default().update(&mut cam, &[Key::Right]);
        assert!(close(cam.position.x, 0.1));
        assert!(close(cam.target.x, 0.1));
    }

    #[test]
    fn left_wins_over_right() {
        let mut cam = start();
        let fired = CameraController::default().update(&mut cam, &[Key::Right, Key::Left]);
        assert_eq!(fired, Some(Key::Left));
        assert!(close(cam.position.x, -0.1));
        assert!(close(cam.target.x, -0.1));
    }

    #[test]
    fn only_one_axis_per_call() {
        let mut cam = start();
        CameraController::default().update(&mut cam, &[Key::Up, Key::P]);
        assert!(close(cam.position.y, 0.1));
        assert!(close(cam.position.z, -4.0));
    }

    #[test]
    fn no_keys_is_a_fixed_point() {
        let mut cam = start();
        let before = cam;
        assert_eq!(CameraController::default().update(&mut cam, &HeldKeys::new()), None);
        assert_eq!(cam, before);
    }

    #[test]
    fn repeated_no_op_calls_leave_camera_unchanged() {
        let mut cam = start();
        let before = cam;
        let ctrl = CameraController::default();
        for _ in 0..1000 {
            ctrl.update(&mut cam, &HeldKeys::new());
        }
        assert_eq!(cam, before);
    }

    #[test]
    fn escape_is_not_a_movement_key() {
        let mut cam = start();
        let before = cam;
        assert_eq!(CameraController::default().update(&mut cam, &[Key::Escape]), None);
        assert_eq!(cam, before);
    }

    #[test]
    fn axis_mapping_matches_table() {
        let ctrl = CameraController::default();
        let cases = [
            (Key::Up, vec3(0.0, 0.1, -4.0)),
            (Key::Down, vec3(0.0, -0.1, -4.0)),
            (Key::O, vec3(0.0, 0.0, -4.1)),
            (Key::P, vec3(0.0, 0.0, -3.9)),
        ];
        for (key, expected) in cases {
            let mut cam = start();
            ctrl.update(&mut cam, &[key]);
            assert!(cam.position.abs_diff_eq(expected, 1e-6), "{key:?}: {:?}", cam.position);
            assert!(cam.offset().abs_diff_eq(vec3(0.0, 0.0, 4.0), 1e-6));
        }
    }

    #[test]
    fn priority_order_is_left_right_up_down_o_p() {
        let order: Vec<Key> = BINDINGS.iter().map(|(k, _)| *k).collect();
        assert_eq!(order, [Key::Left, Key::Right, Key::Up, Key::Down, Key::O, Key::P]);

        // Every key held: each time the highest remaining one fires.
        let mut held = HeldKeys::new();
        for key in order.iter().copied() {
            held.press(key);
        }
        let ctrl = CameraController::default();
        for expected in order {
            let mut cam = start();
            assert_eq!(ctrl.update(&mut cam, &held), Some(expected));
            held.release(expected);
        }
    }

    #[test]
    fn step_is_per_call_not_per_second() {
        // Ten ticks move exactly ten steps, however far apart they were.
        let mut cam = start();
        let ctrl = CameraController::default();
        for _ in 0..10 {
            ctrl.update(&mut cam, &[Key::Right]);
            std::thread::sleep(std::time::Duration::from_millis(1));
        }
        assert!((cam.position.x - 1.0).abs() < 1e-5);
    }

    #[test]
    fn custom_step_is_used() {
        let mut cam = start();
        CameraController::new(0.5).update(&mut cam, &[Key::Down]);
        assert!(close(cam.position.y, -0.5));
        assert!(close(cam.target.y, -0.5));
    }

    #[test]
    fn no_bounds_on_travel() {
        let mut cam = start();
        let ctrl = CameraController::new(1000.0);
        for _ in 0..1000 {
            ctrl.update(&mut cam, &[Key::Left]);
        }
        assert!(cam.position.x < -999_000.0);
    }

    #[test]
    fn held_keys_press_release() {
        let mut held = HeldKeys::new();
        held.set(Key::O, true);
        assert!(held.is_down(Key::O));
        held.set(Key::O, false);
        assert!(!held.is_down(Key::O));
        held.press(Key::Left);
        held.clear();
        assert!(!held.is_down(Key::Left));
    }
}
