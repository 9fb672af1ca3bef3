//! Mouse look and scroll accumulation.
//!
//! While the cursor is captured, look deltas come from raw device motion;
//! otherwise from successive cursor positions. The first cursor position
//! after entering or capturing only seeds the tracker so the camera does
//! not jump.

use glam::Vec2;
use winit::event::MouseScrollDelta;
use winit::window::{CursorGrabMode, Window};

/// Pixels of a touchpad pixel-scroll treated as one wheel notch.
const PIXELS_PER_LINE: f64 = 40.0;

#[derive(Debug, Clone, Default)]
pub struct MouseState {
    last_position: Option<Vec2>,
    delta: Vec2,
    scroll: f32,
    captured: bool,
}

impl MouseState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_cursor_moved(&mut self, x: f64, y: f64) {
        let position = Vec2::new(x as f32, y as f32);
        if !self.captured
            && let Some(last) = self.last_position
        {
            self.delta += position - last;
        }
        self.last_position = Some(position);
    }

    pub fn on_cursor_left(&mut self) {
        self.last_position = None;
    }

    /// Raw `DeviceEvent::MouseMotion`, only counted while captured.
    pub fn on_raw_motion(&mut self, dx: f64, dy: f64) {
        if self.captured {
            self.delta += Vec2::new(dx as f32, dy as f32);
        }
    }

    pub fn on_scroll(&mut self, delta: MouseScrollDelta) {
        self.scroll += match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(pos) => (pos.y / PIXELS_PER_LINE) as f32,
        };
    }

    /// Grab and hide the cursor for mouse look, or release it.
    pub fn set_captured(&mut self, window: &Window, captured: bool) {
        if captured {
            let grabbed = window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
            if let Err(err) = grabbed {
                tracing::warn!("cursor grab unavailable, using cursor deltas: {err}");
            }
            window.set_cursor_visible(false);
        } else {
            let _ = window.set_cursor_grab(CursorGrabMode::None);
            window.set_cursor_visible(true);
        }
        self.set_captured_flag(captured);
    }

    pub(crate) fn set_captured_flag(&mut self, captured: bool) {
        self.captured = captured;
        self.last_position = None;
    }

    #[must_use]
    pub fn is_captured(&self) -> bool {
        self.captured
    }

    /// Look delta in pixels since the last clear; +y is downward.
    #[must_use]
    pub fn delta(&self) -> Vec2 {
        self.delta
    }

    /// Wheel notches since the last clear; positive scrolls away from the user.
    #[must_use]
    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    pub fn clear_transients(&mut self) {
        self.delta = Vec2::ZERO;
        self.scroll = 0.0;
    }
}
