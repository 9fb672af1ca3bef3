//! Immutable per-frame view of the input devices.

use glam::Vec2;
use winit::keyboard::KeyCode;

use crate::{KeyboardState, MouseState};

/// Everything the frame update may know about input, captured once per frame.
#[derive(Debug, Clone, Default)]
pub struct InputSnapshot {
    keyboard: KeyboardState,
    look_delta: Vec2,
    scroll: f32,
}

impl InputSnapshot {
    #[must_use]
    pub fn capture(keyboard: &KeyboardState, mouse: &MouseState) -> Self {
        Self {
            keyboard: keyboard.clone(),
            look_delta: mouse.delta(),
            scroll: mouse.scroll(),
        }
    }

    #[must_use]
    pub fn is_held(&self, key: KeyCode) -> bool {
        self.keyboard.is_pressed(key)
    }

    /// Key went down this frame.
    #[must_use]
    pub fn was_pressed(&self, key: KeyCode) -> bool {
        self.keyboard.just_pressed(key)
    }

    #[must_use]
    pub fn look_delta(&self) -> Vec2 {
        self.look_delta
    }

    #[must_use]
    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    /// Builder for tests and scripted input.
    #[must_use]
    pub fn with_look(mut self, delta: Vec2, scroll: f32) -> Self {
        self.look_delta = delta;
        self.scroll = scroll;
        self
    }

    /// Builder for tests and scripted input: `key` is held and went down now.
    #[must_use]
    pub fn with_key_press(mut self, key: KeyCode) -> Self {
        self.keyboard.process_raw(crate::RawKeyEvent {
            key,
            state: winit::event::ElementState::Pressed,
            repeat: false,
        });
        self
    }
}
