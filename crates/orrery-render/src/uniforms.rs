//! GPU uniform blocks and the mapping from named uniforms onto them.
//!
//! Recorded commands set uniforms by name. [`UniformStaging`] keeps the
//! current block for each program and writes each named value into its
//! field, so a draw uploads whatever was set last.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use orrery_scene::{UniformValue, uniforms};

use crate::command::ProgramId;

/// Mirrors `PlanetUniforms` in the planet program.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct PlanetUniform {
    pub model: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub view_pos: [f32; 4],
    pub light_position: [f32; 4],
    /// ambient, diffuse, constant, linear
    pub light: [f32; 4],
    /// quadratic, shininess, far_plane, unused
    pub material: [f32; 4],
    /// is_sun, shadows
    pub flags: [u32; 4],
}

/// Mirrors `ShadowUniforms` in the shadow depth program.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ShadowUniform {
    pub model: [[f32; 4]; 4],
    pub faces: [[[f32; 4]; 4]; 6],
    /// Light position in xyz, far plane in w.
    pub light: [f32; 4],
    /// is_sun
    pub flags: [u32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SkyboxUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniformError {
    #[error("{program:?} has no uniform named '{name}'")]
    Unknown { program: ProgramId, name: String },

    #[error("uniform '{name}' of {program:?} cannot hold {value:?}")]
    TypeMismatch {
        program: ProgramId,
        name: String,
        value: UniformValue,
    },
}

/// Current uniform values for every program.
#[derive(Debug, Clone, Copy)]
pub struct UniformStaging {
    planet: PlanetUniform,
    shadow: ShadowUniform,
    skybox: SkyboxUniform,
}

impl Default for UniformStaging {
    fn default() -> Self {
        let identity = Mat4::IDENTITY.to_cols_array_2d();
        Self {
            planet: PlanetUniform {
                model: identity,
                view: identity,
                projection: identity,
                ..Zeroable::zeroed()
            },
            shadow: ShadowUniform {
                model: identity,
                faces: [identity; 6],
                ..Zeroable::zeroed()
            },
            skybox: SkyboxUniform {
                view: identity,
                projection: identity,
            },
        }
    }
}

impl UniformStaging {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn planet(&self) -> &PlanetUniform {
        &self.planet
    }

    pub fn shadow(&self) -> &ShadowUniform {
        &self.shadow
    }

    pub fn skybox(&self) -> &SkyboxUniform {
        &self.skybox
    }

    /// Bytes of `program`'s block as it stands. Empty for programs that
    /// take no uniforms.
    pub fn bytes(&self, program: ProgramId) -> &[u8] {
        match program {
            ProgramId::Planet => bytemuck::bytes_of(&self.planet),
            ProgramId::ShadowDepth => bytemuck::bytes_of(&self.shadow),
            ProgramId::Skybox => bytemuck::bytes_of(&self.skybox),
            ProgramId::Composite => &[],
        }
    }

    /// Size of `program`'s block in bytes.
    pub fn block_size(program: ProgramId) -> u64 {
        match program {
            ProgramId::Planet => std::mem::size_of::<PlanetUniform>() as u64,
            ProgramId::ShadowDepth => std::mem::size_of::<ShadowUniform>() as u64,
            ProgramId::Skybox => std::mem::size_of::<SkyboxUniform>() as u64,
            ProgramId::Composite => 0,
        }
    }

    pub fn apply(
        &mut self,
        program: ProgramId,
        name: &str,
        value: UniformValue,
    ) -> Result<(), UniformError> {
        let applied = match program {
            ProgramId::Planet => apply_planet(&mut self.planet, name, value),
            ProgramId::ShadowDepth => apply_shadow(&mut self.shadow, name, value),
            ProgramId::Skybox => apply_skybox(&mut self.skybox, name, value),
            ProgramId::Composite => Slot::Unknown,
        };

        match applied {
            Slot::Written => Ok(()),
            Slot::Unknown => Err(UniformError::Unknown {
                program,
                name: name.to_string(),
            }),
            Slot::WrongType => Err(UniformError::TypeMismatch {
                program,
                name: name.to_string(),
                value,
            }),
        }
    }
}

enum Slot {
    Written,
    Unknown,
    WrongType,
}

fn write_mat4(slot: &mut [[f32; 4]; 4], value: UniformValue) -> Slot {
    match value {
        UniformValue::Mat4(m) => {
            *slot = m.to_cols_array_2d();
            Slot::Written
        }
        _ => Slot::WrongType,
    }
}

fn write_vec3(slot: &mut [f32; 4], value: UniformValue) -> Slot {
    match value {
        UniformValue::Vec3(v) => {
            slot[..3].copy_from_slice(&v.to_array());
            Slot::Written
        }
        _ => Slot::WrongType,
    }
}

fn write_float(slot: &mut f32, value: UniformValue) -> Slot {
    match value {
        UniformValue::Float(f) => {
            *slot = f;
            Slot::Written
        }
        _ => Slot::WrongType,
    }
}

fn write_flag(slot: &mut u32, value: UniformValue) -> Slot {
    match value.as_flag() {
        Some(flag) => {
            *slot = flag as u32;
            Slot::Written
        }
        None => Slot::WrongType,
    }
}

fn apply_planet(block: &mut PlanetUniform, name: &str, value: UniformValue) -> Slot {
    match name {
        uniforms::MODEL => write_mat4(&mut block.model, value),
        uniforms::VIEW => write_mat4(&mut block.view, value),
        uniforms::PROJECTION => write_mat4(&mut block.projection, value),
        uniforms::VIEW_POS => write_vec3(&mut block.view_pos, value),
        uniforms::LIGHT_POSITION => write_vec3(&mut block.light_position, value),
        uniforms::LIGHT_AMBIENT => write_float(&mut block.light[0], value),
        uniforms::LIGHT_DIFFUSE => write_float(&mut block.light[1], value),
        uniforms::LIGHT_CONSTANT => write_float(&mut block.light[2], value),
        uniforms::LIGHT_LINEAR => write_float(&mut block.light[3], value),
        uniforms::LIGHT_QUADRATIC => write_float(&mut block.material[0], value),
        uniforms::MATERIAL_SHININESS => write_float(&mut block.material[1], value),
        uniforms::FAR_PLANE => write_float(&mut block.material[2], value),
        uniforms::IS_SUN => write_flag(&mut block.flags[0], value),
        uniforms::SHADOWS => write_flag(&mut block.flags[1], value),
        _ => Slot::Unknown,
    }
}

fn apply_shadow(block: &mut ShadowUniform, name: &str, value: UniformValue) -> Slot {
    if let Some(face) = uniforms::SHADOW_MATRICES.iter().position(|n| *n == name) {
        return write_mat4(&mut block.faces[face], value);
    }
    match name {
        uniforms::MODEL => write_mat4(&mut block.model, value),
        uniforms::LIGHT_POSITION => write_vec3(&mut block.light, value),
        uniforms::FAR_PLANE => write_float(&mut block.light[3], value),
        uniforms::IS_SUN => write_flag(&mut block.flags[0], value),
        _ => Slot::Unknown,
    }
}

fn apply_skybox(block: &mut SkyboxUniform, name: &str, value: UniformValue) -> Slot {
    match name {
        uniforms::VIEW => write_mat4(&mut block.view, value),
        uniforms::PROJECTION => write_mat4(&mut block.projection, value),
        _ => Slot::Unknown,
    }
}
