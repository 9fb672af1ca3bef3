//! Fly-camera controls and the demo's key bindings.
//!
//! | Input | Effect |
//! |-------|--------|
//! | W/A/S/D | move along the view direction / strafe |
//! | mouse | look around |
//! | wheel | zoom (narrow the field of view) |
//! | 1 | look at the sun |
//! | Space | toggle shadows |
//! | O | toggle orbiting |
//! | Escape | quit |

use glam::Vec3;
use orrery_config::CameraConfig;
use orrery_input::InputSnapshot;
use orrery_render::Camera;
use winit::keyboard::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyControls {
    /// World units per second.
    pub speed: f32,
    /// Degrees per pixel of mouse motion.
    pub sensitivity: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
}

/// Toggles requested this frame. Each is edge-triggered: holding a key
/// fires once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlActions {
    pub toggle_shadows: bool,
    pub toggle_orbit: bool,
    pub exit: bool,
}

impl FlyControls {
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            speed: config.speed,
            sensitivity: config.sensitivity,
            min_zoom: config.min_zoom_degrees,
            max_zoom: config.max_zoom_degrees,
        }
    }

    /// Move and turn `camera` for one frame and report the toggles.
    pub fn apply(&self, camera: &mut Camera, input: &InputSnapshot, dt: f32) -> ControlActions {
        let step = self.speed * dt;
        let (forward, right) = (camera.forward(), camera.right());
        let mut motion = Vec3::ZERO;
        if input.is_held(KeyCode::KeyW) {
            motion += forward;
        }
        if input.is_held(KeyCode::KeyS) {
            motion -= forward;
        }
        if input.is_held(KeyCode::KeyD) {
            motion += right;
        }
        if input.is_held(KeyCode::KeyA) {
            motion -= right;
        }
        camera.position += motion * step;

        // Screen y grows downwards.
        let look = input.look_delta() * self.sensitivity;
        if look != glam::Vec2::ZERO {
            camera.rotate(look.x, -look.y);
        }
        if input.scroll() != 0.0 {
            camera.zoom_by(input.scroll(), self.min_zoom, self.max_zoom);
        }
        if input.is_held(KeyCode::Digit1) {
            camera.look_at(Vec3::ZERO);
        }

        ControlActions {
            toggle_shadows: input.was_pressed(KeyCode::Space),
            toggle_orbit: input.was_pressed(KeyCode::KeyO),
            exit: input.was_pressed(KeyCode::Escape),
        }
    }
}

impl Default for FlyControls {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}
