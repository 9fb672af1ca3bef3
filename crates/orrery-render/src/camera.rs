//! Free camera with yaw/pitch orientation and a perspective projection.

use glam::{Mat4, Vec3};

/// Pitch never quite reaches the poles, or `look_to_rh` degenerates.
pub const PITCH_LIMIT_DEGREES: f32 = 89.0;

/// A yaw/pitch camera. Angles are in degrees; a yaw of -90 looks down -Z.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    yaw: f32,
    pitch: f32,
    /// Vertical field of view in degrees; the mouse wheel narrows it.
    pub zoom: f32,
    /// Width / height.
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
    pub world_up: Vec3,
}

impl Camera {
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        Self {
            position,
            yaw,
            pitch: pitch.clamp(-PITCH_LIMIT_DEGREES, PITCH_LIMIT_DEGREES),
            ..Self::default()
        }
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Turn by the given angles. Pitch is clamped short of straight up/down.
    pub fn rotate(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.yaw += yaw_delta;
        self.pitch = (self.pitch + pitch_delta).clamp(-PITCH_LIMIT_DEGREES, PITCH_LIMIT_DEGREES);
    }

    /// Narrow (positive) or widen the field of view, staying within `min..=max`.
    pub fn zoom_by(&mut self, amount: f32, min: f32, max: f32) {
        self.zoom = (self.zoom - amount).clamp(min, max);
    }

    /// Face `target`. Does nothing when standing on it.
    pub fn look_at(&mut self, target: Vec3) {
        let Some(direction) = (target - self.position).try_normalize() else {
            return;
        };
        self.pitch = direction
            .y
            .asin()
            .to_degrees()
            .clamp(-PITCH_LIMIT_DEGREES, PITCH_LIMIT_DEGREES);
        // Straight up or down leaves yaw unchanged.
        if direction.x.abs() > f32::EPSILON || direction.z.abs() > f32::EPSILON {
            self.yaw = direction.z.atan2(direction.x).to_degrees();
        }
    }

    pub fn forward(&self) -> Vec3 {
        let (yaw, pitch) = (self.yaw.to_radians(), self.pitch.to_radians());
        Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.world_up).normalize()
    }

    pub fn up(&self) -> Vec3 {
        self.right().cross(self.forward()).normalize()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.forward(), self.up())
    }

    /// Standard depth: near maps to 0, far to 1.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.zoom.to_radians(),
            self.aspect_ratio,
            self.near,
            self.far,
        )
    }

    pub fn set_aspect_ratio(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect_ratio = width / height;
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: -90.0,
            pitch: 0.0,
            zoom: 45.0,
            aspect_ratio: 800.0 / 600.0,
            near: 0.1,
            far: 100.0,
            world_up: Vec3::Y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_default_camera_looks_down_neg_z() {
        let camera = Camera::default();
        assert!(approx(camera.forward(), Vec3::NEG_Z));
        assert!(approx(camera.right(), Vec3::X));
        assert!(approx(camera.up(), Vec3::Y));
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = Camera::default();
        camera.rotate(0.0, 500.0);
        assert_eq!(camera.pitch(), PITCH_LIMIT_DEGREES);
        camera.rotate(0.0, -1000.0);
        assert_eq!(camera.pitch(), -PITCH_LIMIT_DEGREES);
        assert_eq!(Camera::new(Vec3::ZERO, 0.0, 180.6).pitch(), PITCH_LIMIT_DEGREES);
    }

    #[test]
    fn test_zoom_stays_in_bounds() {
        let mut camera = Camera::default();
        camera.zoom_by(100.0, 1.0, 45.0);
        assert_eq!(camera.zoom, 1.0);
        camera.zoom_by(-100.0, 1.0, 45.0);
        assert_eq!(camera.zoom, 45.0);
    }

    #[test]
    fn test_look_at_faces_target() {
        let mut camera = Camera::new(Vec3::new(10.0, 5.0, 10.0), 0.0, 0.0);
        camera.look_at(Vec3::ZERO);
        let expected = (Vec3::ZERO - camera.position).normalize();
        assert!(approx(camera.forward(), expected));
    }

    #[test]
    fn test_look_at_from_above_clamps_pitch() {
        let mut camera = Camera::new(Vec3::new(0.0, 61.0, 0.0), -90.0, 0.0);
        camera.look_at(Vec3::ZERO);
        assert_eq!(camera.pitch(), -PITCH_LIMIT_DEGREES);
        assert_eq!(camera.yaw(), -90.0);
        assert!(camera.view_matrix().is_finite());
    }

    #[test]
    fn test_view_maps_forward_point_to_neg_z() {
        let camera = Camera::new(Vec3::new(1.0, 2.0, 3.0), 0.0, 0.0);
        let ahead = camera.position + camera.forward() * 5.0;
        let view_space = camera.view_matrix().transform_point3(ahead);
        assert!(approx(view_space, Vec3::new(0.0, 0.0, -5.0)));
    }

    #[test]
    fn test_projection_uses_standard_depth() {
        let camera = Camera::default();
        let proj = camera.projection_matrix();
        let near = proj.project_point3(Vec3::new(0.0, 0.0, -camera.near));
        let far = proj.project_point3(Vec3::new(0.0, 0.0, -camera.far));
        assert!(near.z.abs() < 1e-4);
        assert!((far.z - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_aspect_ignores_zero_size() {
        let mut camera = Camera::default();
        camera.set_aspect_ratio(1920.0, 1080.0);
        assert!((camera.aspect_ratio - 16.0 / 9.0).abs() < 1e-6);
        camera.set_aspect_ratio(0.0, 1080.0);
        assert!((camera.aspect_ratio - 16.0 / 9.0).abs() < 1e-6);
    }
}
