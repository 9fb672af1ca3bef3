//! Seams between the scene and whatever executes draw calls.

use glam::{Mat4, Vec3};

use crate::handle::{MeshHandle, TextureHandle, TextureSet};

/// Uniform names shared by the scene, the frame driver and the programs.
pub mod uniforms {
    pub const MODEL: &str = "model";
    pub const VIEW: &str = "view";
    pub const PROJECTION: &str = "projection";
    pub const VIEW_POS: &str = "viewPos";
    pub const IS_SUN: &str = "isSun";
    pub const SHADOWS: &str = "shadows";
    pub const FAR_PLANE: &str = "far_plane";
    pub const LIGHT_POSITION: &str = "light.position";
    pub const LIGHT_AMBIENT: &str = "light.ambient";
    pub const LIGHT_DIFFUSE: &str = "light.diffuse";
    pub const LIGHT_CONSTANT: &str = "light.constant";
    pub const LIGHT_LINEAR: &str = "light.linear";
    pub const LIGHT_QUADRATIC: &str = "light.quadratic";
    pub const MATERIAL_SHININESS: &str = "material.shininess";
    /// One light-space view-projection per cubemap face, +X first.
    pub const SHADOW_MATRICES: [&str; 6] = [
        "shadowMatrices[0]",
        "shadowMatrices[1]",
        "shadowMatrices[2]",
        "shadowMatrices[3]",
        "shadowMatrices[4]",
        "shadowMatrices[5]",
    ];
}

/// A value for a named uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Mat4(Mat4),
    Vec3(Vec3),
    Float(f32),
    Bool(bool),
    Int(i32),
}

impl UniformValue {
    /// Booleans and integers are interchangeable as shader flags.
    pub fn as_flag(self) -> Option<bool> {
        match self {
            UniformValue::Bool(b) => Some(b),
            UniformValue::Int(i) => Some(i != 0),
            _ => None,
        }
    }
}

/// A shader program that is currently in use.
///
/// Obtaining a `ShaderContext` is what activates the program; uniforms set
/// through it persist for that program until overwritten.
pub trait ShaderContext {
    fn set_uniform(&mut self, name: &str, value: UniformValue);

    fn bind_texture(&mut self, slot: u32, texture: TextureHandle);

    /// Leave `slot` empty; the program samples its fallback texture there.
    fn unbind_texture(&mut self, slot: u32);

    /// Draw a registered mesh with the current uniforms and textures.
    fn draw_indexed(&mut self, mesh: MeshHandle);

    fn set_mat4(&mut self, name: &str, value: Mat4) {
        self.set_uniform(name, UniformValue::Mat4(value));
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.set_uniform(name, UniformValue::Vec3(value));
    }

    fn set_float(&mut self, name: &str, value: f32) {
        self.set_uniform(name, UniformValue::Float(value));
    }

    fn set_bool(&mut self, name: &str, value: bool) {
        self.set_uniform(name, UniformValue::Bool(value));
    }

    fn set_int(&mut self, name: &str, value: i32) {
        self.set_uniform(name, UniformValue::Int(value));
    }
}

/// Something that knows how to issue its own draw calls.
pub trait Drawable: Send + Sync {
    fn draw(&self, shader: &mut dyn ShaderContext, textures: &TextureSet);
}
