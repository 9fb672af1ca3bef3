//! Cubemap skybox drawn behind everything else.
//!
//! The cube is drawn last in the scene pass with the translation stripped
//! from the view matrix, so it stays centred on the camera. Its shader
//! writes `z = w`, which puts every fragment on the far plane; with
//! `LessEqual` it only fills pixels nothing else has covered.

use std::path::PathBuf;

use glam::{Mat3, Mat4};
use orrery_scene::{MeshHandle, ShaderContext, TextureHandle, uniforms};

use crate::buffer::VertexLayoutKind;
use crate::command::{CommandList, DepthCompare, ProgramId};
use crate::error::ResourceError;
use crate::mesh::skybox_cube;
use crate::resources::{GpuResources, TextureBindingKind};
use crate::texture::load_cubemap_faces;

pub const SKYBOX_VERTEX_COUNT: u32 = 36;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Skybox {
    cubemap: TextureHandle,
    cube: MeshHandle,
}

impl Skybox {
    pub fn from_handles(cubemap: TextureHandle, cube: MeshHandle) -> Self {
        Self { cubemap, cube }
    }

    /// Upload the six faces (+X, -X, +Y, -Y, +Z, -Z) and the cube mesh.
    ///
    /// A face that fails to load or does not match the others leaves the
    /// skybox black, unless `strict` is set.
    pub fn load(
        resources: &mut GpuResources,
        faces: &[PathBuf; 6],
        strict: bool,
    ) -> Result<Self, ResourceError> {
        let cubemap = match load_cubemap_faces(faces) {
            Ok(images) => resources.upload_cubemap("skybox", &images),
            Err(err) if !strict => {
                log::error!("Cubemap failed to load: {err}");
                resources.fallback(TextureBindingKind::Cube)
            }
            Err(err) => return Err(err),
        };
        let cube = resources.upload_mesh("skybox-cube", &skybox_cube(), None, VertexLayoutKind::Position);
        Ok(Self { cubemap, cube })
    }

    pub fn cubemap(&self) -> TextureHandle {
        self.cubemap
    }

    pub fn cube(&self) -> MeshHandle {
        self.cube
    }

    /// Record the skybox draw. Leaves the depth function back at `Less`.
    pub fn draw(&self, list: &mut CommandList, view: Mat4, projection: Mat4) {
        let mut program = list.use_program(ProgramId::Skybox);
        program.set_mat4(uniforms::VIEW, rotation_only(view));
        program.set_mat4(uniforms::PROJECTION, projection);
        program.depth_func(DepthCompare::LessEqual);
        program.bind_texture(0, self.cubemap);
        program.draw_arrays(self.cube, 0, SKYBOX_VERTEX_COUNT);
        program.depth_func(DepthCompare::Less);
    }
}

/// The upper-left 3x3 of `view`, translation dropped.
pub fn rotation_only(view: Mat4) -> Mat4 {
    Mat4::from_mat3(Mat3::from_mat4(view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::GpuCommand;
    use glam::Vec3;
    use orrery_scene::UniformValue;

    #[test]
    fn test_rotation_only_strips_translation() {
        let view = Mat4::look_at_rh(Vec3::new(5.0, 3.0, -2.0), Vec3::ZERO, Vec3::Y);
        let stripped = rotation_only(view);
        assert_eq!(stripped.w_axis, glam::Vec4::W);
        assert_eq!(Mat3::from_mat4(stripped), Mat3::from_mat4(view));
        // Moving the camera doesn't move the sky.
        let moved = Mat4::look_at_rh(Vec3::new(50.0, 30.0, -20.0), Vec3::new(45.0, 27.0, -18.0), Vec3::Y);
        let dir = Vec3::new(1.0, 0.5, 0.25);
        assert!((rotation_only(moved).transform_point3(dir).length() - dir.length()).abs() < 1e-5);
    }

    #[test]
    fn test_draw_wraps_cube_in_less_equal() {
        let skybox = Skybox::from_handles(TextureHandle(4), MeshHandle(9));
        let view = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let projection = Mat4::perspective_rh(0.8, 1.5, 0.1, 100.0);

        let mut list = CommandList::new();
        skybox.draw(&mut list, view, projection);

        assert_eq!(
            list.commands(),
            &[
                GpuCommand::UseProgram(ProgramId::Skybox),
                GpuCommand::SetUniform {
                    name: uniforms::VIEW.to_string(),
                    value: UniformValue::Mat4(Mat4::IDENTITY),
                },
                GpuCommand::SetUniform {
                    name: uniforms::PROJECTION.to_string(),
                    value: UniformValue::Mat4(projection),
                },
                GpuCommand::DepthFunc(DepthCompare::LessEqual),
                GpuCommand::BindTexture {
                    slot: 0,
                    texture: TextureHandle(4),
                },
                GpuCommand::DrawArrays {
                    mesh: MeshHandle(9),
                    first: 0,
                    count: 36,
                },
                GpuCommand::DepthFunc(DepthCompare::Less),
            ]
        );
    }
}
