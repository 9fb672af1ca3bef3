//! Frame-coherent keyboard state tracker.
//!
//! Keys are tracked by [`KeyCode`] (physical position), so WASD works the
//! same on every layout. Events for keys winit cannot identify are dropped.

use std::collections::HashSet;

use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Minimal description of a key event, independent of winit's event struct.
#[derive(Debug, Clone, Copy)]
pub struct RawKeyEvent {
    pub key: KeyCode,
    pub state: ElementState,
    /// OS auto-repeat; ignored so toggles fire once per physical press.
    pub repeat: bool,
}

/// Held keys plus the edges seen since the last [`clear_transients`](Self::clear_transients).
#[derive(Debug, Clone, Default)]
pub struct KeyboardState {
    held: HashSet<KeyCode>,
    pressed_edges: HashSet<KeyCode>,
    released_edges: HashSet<KeyCode>,
}

impl KeyboardState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a winit key event.
    pub fn process_event(&mut self, event: &KeyEvent) {
        let PhysicalKey::Code(key) = event.physical_key else {
            return;
        };
        self.process_raw(RawKeyEvent {
            key,
            state: event.state,
            repeat: event.repeat,
        });
    }

    pub fn process_raw(&mut self, event: RawKeyEvent) {
        if event.repeat {
            return;
        }
        match event.state {
            ElementState::Pressed => {
                if self.held.insert(event.key) {
                    self.pressed_edges.insert(event.key);
                }
            }
            ElementState::Released => {
                if self.held.remove(&event.key) {
                    self.released_edges.insert(event.key);
                }
            }
        }
    }

    /// `true` while the key is down.
    #[must_use]
    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.held.contains(&key)
    }

    /// `true` during the frame the key went down.
    #[must_use]
    pub fn just_pressed(&self, key: KeyCode) -> bool {
        self.pressed_edges.contains(&key)
    }

    /// `true` during the frame the key came up.
    #[must_use]
    pub fn just_released(&self, key: KeyCode) -> bool {
        self.released_edges.contains(&key)
    }

    /// Drop key state when the window loses focus; releases would be missed.
    pub fn release_all(&mut self) {
        self.released_edges.extend(self.held.drain());
    }

    /// Forget this frame's edges. Call once per frame after the update.
    pub fn clear_transients(&mut self) {
        self.pressed_edges.clear();
        self.released_edges.clear();
    }
}
