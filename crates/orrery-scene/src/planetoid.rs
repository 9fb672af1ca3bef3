//! A single body of the orbit scene graph.
//!
//! Each frame a planetoid first [`advance`](Planetoid::advance)s its
//! persistent matrices, then [`render`](Planetoid::render)s with the model
//! matrix those produce. The orbit step moves to the parent, turns about
//! the vertical axis and steps back out along local X by `radius`. Rotation
//! and translation do not commute, so that order is fixed.

use std::fmt;
use std::sync::Arc;

use glam::{Mat4, Vec3};

use crate::handle::TextureSet;
use crate::shader::{Drawable, ShaderContext, uniforms};

/// Shape and motion parameters, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitParams {
    /// Distance from the parent's position. Zero is legal (rings).
    pub radius: f32,
    /// Uniform scale.
    pub size: f32,
    /// Degrees per second around the parent.
    pub orbit_speed: f32,
    /// Degrees per second about the body's own vertical axis.
    pub rotation_speed: f32,
    /// Light source: spins in place and is not lit.
    pub luminous: bool,
}

impl OrbitParams {
    /// Orbits its parent at `radius`.
    pub fn satellite(radius: f32, size: f32, orbit_speed: f32, rotation_speed: f32) -> Self {
        Self {
            radius,
            size,
            orbit_speed,
            rotation_speed,
            luminous: false,
        }
    }

    /// A light source that spins in place.
    pub fn luminous(size: f32, rotation_speed: f32) -> Self {
        Self {
            radius: 0.0,
            size,
            orbit_speed: 0.0,
            rotation_speed,
            luminous: true,
        }
    }
}

/// A body in the scene: a drawable, its textures and its orbit.
/// 
/// The matrices are recomputed by [`advance`](Self::advance) every frame.
pub struct Planetoid {
    name: String,
    drawable: Arc<dyn Drawable>,
    textures: Arc<TextureSet>,
    params: OrbitParams,
    local_rotation: Mat4,
    local_transform: Mat4,
    scale: Mat4,
    world_position: Vec3,
}

impl Planetoid {
    /// Create a body at the origin with identity transforms.
    pub fn new(
        name: impl Into<String>,
        drawable: Arc<dyn Drawable>,
        textures: Arc<TextureSet>,
        params: OrbitParams,
    ) -> Self {
        Self {
            name: name.into(),
            drawable,
            textures,
            params,
            local_rotation: Mat4::IDENTITY,
            local_transform: Mat4::IDENTITY,
            scale: Mat4::from_scale(Vec3::splat(params.size)),
            world_position: Vec3::ZERO,
        }
    }

    /// Place the body before the first frame. Luminous bodies stay here.
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.local_transform.w_axis = position.extend(1.0);
        self.world_position = position;
        self
    }

    /// Step the persistent matrices by `dt` seconds and return the new
    /// world position, which children must use as their parent position.
    ///
    /// With `orbiting` off the body keeps spinning but holds its place.
    /// `dt` is not clamped.
    pub fn advance(&mut self, dt: f32, parent_position: Vec3, orbiting: bool) -> Vec3 {
        let spin = Mat4::from_rotation_y((self.params.rotation_speed * dt).to_radians());

        if !self.params.luminous {
            if orbiting {
                self.local_transform.w_axis = parent_position.extend(1.0);
                self.local_transform = self.local_transform
                    * Mat4::from_rotation_y((self.params.orbit_speed * dt).to_radians())
                    * Mat4::from_translation(Vec3::new(self.params.radius, 0.0, 0.0));
            }
            self.world_position = self.local_transform.w_axis.truncate();
        }
        self.local_rotation *= spin;

        self.world_position
    }

    /// Scale, then spin, then place.
    pub fn model_matrix(&self) -> Mat4 {
        self.local_transform * self.local_rotation * self.scale
    }

    /// Upload `isSun` and `model`, then let the drawable issue its draws.
    pub fn render(&self, shader: &mut dyn ShaderContext) {
        shader.set_bool(uniforms::IS_SUN, self.params.luminous);
        shader.set_mat4(uniforms::MODEL, self.model_matrix());
        self.drawable.draw(shader, &self.textures);
    }

    /// [`advance`](Self::advance) followed by [`render`](Self::render).
    pub fn draw(
        &mut self,
        shader: &mut dyn ShaderContext,
        dt: f32,
        parent_position: Vec3,
        orbiting: bool,
    ) -> Vec3 {
        let position = self.advance(dt, parent_position, orbiting);
        self.render(shader);
        position
    }

    /// Accumulated self-spin in radians, wrapped to (-PI, PI].
    pub fn spin_angle(&self) -> f32 {
        let x = self.local_rotation.x_axis;
        (-x.z).atan2(x.x)
    }

    /// Name used for lookups and atlas matching.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Orbit parameters given at construction.
    pub fn params(&self) -> &OrbitParams {
        &self.params
    }

    /// Whether this body is a light source.
    pub fn is_luminous(&self) -> bool {
        self.params.luminous
    }

    /// Position after the last advance.
    pub fn world_position(&self) -> Vec3 {
        self.world_position
    }

    /// Self-spin about the vertical axis.
    pub fn local_rotation(&self) -> Mat4 {
        self.local_rotation
    }

    /// Translation to the world position.
    pub fn local_transform(&self) -> Mat4 {
        self.local_transform
    }

    /// Textures bound when this body draws.
    pub fn textures(&self) -> &TextureSet {
        &self.textures
    }
}

impl fmt::Debug for Planetoid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Planetoid")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("world_position", &self.world_position)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::{MeshHandle, TextureHandle};
    use crate::shader::UniformValue;
    use std::f32::consts::{FRAC_PI_2, PI};

    const EPS: f32 = 1e-4;

    struct NoDraw;

    impl Drawable for NoDraw {
        fn draw(&self, _: &mut dyn ShaderContext, _: &TextureSet) {}
    }

    #[derive(Default)]
    struct Uniforms(Vec<(String, UniformValue)>);

    impl ShaderContext for Uniforms {
        fn set_uniform(&mut self, name: &str, value: UniformValue) {
            self.0.push((name.to_string(), value));
        }
        fn bind_texture(&mut self, _: u32, _: TextureHandle) {}
        fn unbind_texture(&mut self, _: u32) {}
        fn draw_indexed(&mut self, _: MeshHandle) {}
    }

    fn body(params: OrbitParams) -> Planetoid {
        Planetoid::new("body", Arc::new(NoDraw), Arc::new(TextureSet::new()), params)
    }

    #[test]
    fn test_basis_vectors_keep_size_across_frames() {
        let mut p = body(OrbitParams::satellite(7.0, 0.7, 15.0, 50.0));
        for dt in [0.016, 0.5, 3.0, 0.0, 12.7] {
            p.advance(dt, Vec3::new(1.0, 2.0, 3.0), true);
            let m = p.model_matrix();
            for axis in [m.x_axis, m.y_axis, m.z_axis] {
                assert!((axis.truncate().length() - 0.7).abs() < EPS);
            }
        }
    }

    #[test]
    fn test_orbit_radius_holds_for_any_step() {
        let parent = Vec3::new(-4.0, 1.0, 9.0);
        let mut p = body(OrbitParams::satellite(25.0, 1.0, 15.0, 0.0));
        for dt in [0.001, 0.25, 1.0, 40.0, 1000.0] {
            let pos = p.advance(dt, parent, true);
            assert!(((pos - parent).length() - 25.0).abs() < 1e-3, "dt={dt}");
        }
    }

    #[test]
    fn test_luminous_body_never_moves() {
        let start = Vec3::new(2.0, 0.0, -1.0);
        let mut sun = body(OrbitParams::luminous(3.0, 5.0)).with_position(start);
        for (i, dt) in [0.1, 5.0, 90.0].into_iter().enumerate() {
            let orbiting = i % 2 == 0;
            assert_eq!(sun.advance(dt, Vec3::new(50.0, 0.0, 0.0), orbiting), start);
        }
        assert_eq!(sun.world_position(), start);
    }

    #[test]
    fn test_spin_continues_while_orbit_paused() {
        let mut p = body(OrbitParams::satellite(10.0, 1.0, 30.0, 20.0));
        let placed = p.advance(1.0, Vec3::ZERO, true);
        let angle0 = p.spin_angle();

        let held = p.advance(1.0, Vec3::ZERO, false);
        assert_eq!(held, placed);
        assert!((p.spin_angle() - angle0 - 20f32.to_radians()).abs() < EPS);

        p.advance(0.5, Vec3::ZERO, false);
        assert_eq!(p.world_position(), placed);
        assert!((p.spin_angle() - angle0 - 30f32.to_radians()).abs() < EPS);
    }

    #[test]
    fn test_quarter_orbit_after_one_second_at_ninety_degrees() {
        let mut p = body(OrbitParams::satellite(10.0, 1.0, 90.0, 0.0));
        let first = p.advance(1.0, Vec3::ZERO, true);
        assert!((first - Vec3::new(0.0, 0.0, -10.0)).length() < EPS);

        let second = p.advance(1.0, Vec3::ZERO, true);
        assert!((second.length() - 10.0).abs() < EPS);
        assert!(first.dot(second).abs() < EPS, "consecutive positions are 90 degrees apart");
        assert!((second - Vec3::new(-10.0, 0.0, 0.0)).length() < EPS);
    }

    #[test]
    fn test_zero_radius_sits_on_parent() {
        let parent = Vec3::new(3.0, 0.0, 4.0);
        let mut ring = body(OrbitParams::satellite(0.0, 4.0, 0.0, 0.0));
        assert!((ring.advance(2.0, parent, true) - parent).length() < EPS);
    }

    #[test]
    fn test_model_matrix_is_place_spin_scale() {
        let mut p = body(OrbitParams::satellite(5.0, 2.0, 0.0, 90.0));
        p.advance(1.0, Vec3::ZERO, true);
        // Spin takes local +X to -Z, scale doubles it, then the body sits at +X*5.
        let tip = p.model_matrix().transform_point3(Vec3::X);
        assert!((tip - Vec3::new(5.0, 0.0, -2.0)).length() < EPS);
    }

    #[test]
    fn test_spin_angle_wraps() {
        let mut p = body(OrbitParams::satellite(0.0, 1.0, 0.0, 270.0));
        p.advance(1.0, Vec3::ZERO, false);
        assert!((p.spin_angle() + FRAC_PI_2).abs() < EPS);
        p.advance(1.0, Vec3::ZERO, false);
        assert!((p.spin_angle().abs() - PI).abs() < EPS);
    }

    #[test]
    fn test_render_sets_is_sun_then_model() {
        let mut sun = body(OrbitParams::luminous(3.0, 5.0));
        let mut shader = Uniforms::default();
        sun.draw(&mut shader, 1.0, Vec3::ZERO, true);

        assert_eq!(shader.0[0], (uniforms::IS_SUN.to_string(), UniformValue::Bool(true)));
        assert_eq!(
            shader.0[1],
            (uniforms::MODEL.to_string(), UniformValue::Mat4(sun.model_matrix()))
        );
    }
}
