//! Translation of winit input events into controller state.

use corelib::{HeldKeys, Key, OrbitInput, Vec2};
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta},
    keyboard::{KeyCode, PhysicalKey},
};

/// Pixels of trackpad scroll treated as one wheel line.
const PIXELS_PER_LINE: f32 = 40.0;

/// Physical key to controller key. Layout independent, so `O`/`P` sit in the
/// same place on every keyboard.
pub fn map_key(code: KeyCode) -> Option<Key> {
    Some(match code {
        KeyCode::ArrowLeft => Key::Left,
        KeyCode::ArrowRight => Key::Right,
        KeyCode::ArrowUp => Key::Up,
        KeyCode::ArrowDown => Key::Down,
        KeyCode::KeyO => Key::O,
        KeyCode::KeyP => Key::P,
        KeyCode::Escape => Key::Escape,
        _ => return None,
    })
}

/// Keyboard plus mouse state sampled once per tick.
#[derive(Debug, Default)]
pub(crate) struct InputState {
    pub keys: HeldKeys,
    pub orbit: OrbitInput,
    dragging: bool,
    cursor: Option<PhysicalPosition<f64>>,
}

impl InputState {
    /// Record a key transition. Returns the mapped key on a fresh press.
    pub fn on_key(&mut self, event: &KeyEvent) -> Option<Key> {
        let PhysicalKey::Code(code) = event.physical_key else {
            return None;
        };
        let key = map_key(code)?;
        let pressed = event.state == ElementState::Pressed;
        self.keys.set(key, pressed);
        (pressed && !event.repeat).then_some(key)
    }

    pub fn on_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left {
            self.dragging = state == ElementState::Pressed;
        }
    }

    pub fn on_cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        if let (true, Some(last)) = (self.dragging, self.cursor) {
            self.orbit.drag += Vec2::new(
                (position.x - last.x) as f32,
                (position.y - last.y) as f32,
            );
        }
        self.cursor = Some(position);
    }

    pub fn on_wheel(&mut self, delta: MouseScrollDelta) {
        self.orbit.wheel += match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_LINE,
        };
    }

    /// Drop everything held; used when the window loses focus so no key
    /// stays stuck down.
    pub fn release_all(&mut self) {
        self.keys.clear();
        self.dragging = false;
        self.cursor = None;
        self.orbit = OrbitInput::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::KeyState;

    #[test]
    fn maps_the_six_camera_keys_and_escape() {
        let table = [
            (KeyCode::ArrowLeft, Key::Left),
            (KeyCode::ArrowRight, Key::Right),
            (KeyCode::ArrowUp, Key::Up),
            (KeyCode::ArrowDown, Key::Down),
            (KeyCode::KeyO, Key::O),
            (KeyCode::KeyP, Key::P),
            (KeyCode::Escape, Key::Escape),
        ];
        for (code, key) in table {
            assert_eq!(map_key(code), Some(key), "{code:?}");
        }
    }

    #[test]
    fn unrelated_keys_are_ignored() {
        for code in [KeyCode::KeyW, KeyCode::Space, KeyCode::Enter, KeyCode::KeyA] {
            assert_eq!(map_key(code), None);
        }
    }

    #[test]
    fn drag_accumulates_only_while_left_button_held() {
        let mut input = InputState::default();
        input.on_cursor_moved(PhysicalPosition::new(10.0, 10.0));
        input.on_cursor_moved(PhysicalPosition::new(30.0, 10.0));
        assert_eq!(input.orbit.drag, Vec2::ZERO);

        input.on_mouse_button(MouseButton::Left, ElementState::Pressed);
        input.on_cursor_moved(PhysicalPosition::new(35.0, 4.0));
        input.on_cursor_moved(PhysicalPosition::new(40.0, 2.0));
        assert_eq!(input.orbit.drag, Vec2::new(10.0, -8.0));

        input.on_mouse_button(MouseButton::Left, ElementState::Released);
        input.on_cursor_moved(PhysicalPosition::new(90.0, 90.0));
        assert_eq!(input.orbit.drag, Vec2::new(10.0, -8.0));
    }

    #[test]
    fn wheel_lines_and_pixels_sum() {
        let mut input = InputState::default();
        input.on_wheel(MouseScrollDelta::LineDelta(0.0, 1.0));
        input.on_wheel(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 80.0)));
        assert!((input.orbit.wheel - 3.0).abs() < 1e-6);
    }

    #[test]
    fn release_all_clears_keys_and_pending_mouse() {
        let mut input = InputState::default();
        input.keys.press(Key::Left);
        input.on_wheel(MouseScrollDelta::LineDelta(0.0, 2.0));
        input.release_all();
        assert!(!input.keys.is_down(Key::Left));
        assert!(input.orbit.is_empty());
    }
}
