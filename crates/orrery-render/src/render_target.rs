//! Multi-pass frame sequencing: offscreen scene pass, optional shadow
//! cubemap pass, full-screen composite.
//!
//! [`RenderTargetManager`] records into a [`CommandList`] and tracks which
//! phase of the frame it is in, so calls made out of order are rejected
//! instead of silently drawing into the wrong target.

use glam::{Mat4, Vec3};
use orrery_scene::{MeshHandle, ShaderContext, TextureHandle, uniforms};

use crate::command::{BoundProgram, ClearOp, CommandList, DepthCompare, ProgramId, RenderTarget};

/// Screen clear before compositing; the quad covers every pixel.
const COMPOSITE_CLEAR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Vertex count of the full-screen quad (two triangles).
pub const SCREEN_QUAD_VERTICES: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSettings {
    /// Edge length of each cubemap face in texels.
    pub resolution: u32,
    pub near: f32,
    pub far_plane: f32,
}

/// Resources the manager refers to by handle. The GPU side owns them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetHandles {
    /// Color attachment of the offscreen target, sampled by the composite.
    pub color: TextureHandle,
    /// Depth cubemap, present only when shadows are supported.
    pub shadow_map: Option<TextureHandle>,
    pub screen_quad: MeshHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    /// Between frames.
    Idle,
    /// The offscreen target is bound and accepting scene draws.
    Scene,
    /// The offscreen image is on screen; only `present` may follow.
    Composited,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("{operation} called during {phase:?} phase")]
    OutOfOrder {
        operation: &'static str,
        phase: FramePhase,
    },

    #[error("shadow pass requested but no shadow cubemap was allocated")]
    ShadowsDisabled,
}

#[derive(Debug)]
/// Sequences one frame: scene pass, optional shadow pass, composite, present.
/// 
/// It records commands only. [`RenderTargets`](crate::RenderTargets) owns the
/// GPU attachments behind its handles.
pub struct RenderTargetManager {
    width: u32,
    height: u32,
    handles: TargetHandles,
    shadow: Option<ShadowSettings>,
    phase: FramePhase,
    shadow_matrices: Option<(Vec3, [Mat4; 6])>,
}

impl RenderTargetManager {
    /// Shadow settings are dropped when `handles` carries no shadow map.
    pub fn new(
        width: u32,
        height: u32,
        handles: TargetHandles,
        shadow: Option<ShadowSettings>,
    ) -> Self {
        let shadow = shadow.filter(|_| handles.shadow_map.is_some());
        Self {
            width,
            height,
            handles,
            shadow,
            phase: FramePhase::Idle,
            shadow_matrices: None,
        }
    }

    /// Offscreen target width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Offscreen target height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Where the current frame is.
    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    /// Handles of the offscreen target, shadow map and screen quad.
    pub fn handles(&self) -> &TargetHandles {
        &self.handles
    }

    /// Shadow cubemap settings, if shadows are supported.
    pub fn shadow_settings(&self) -> Option<&ShadowSettings> {
        self.shadow.as_ref()
    }

    /// Whether a shadow cubemap was allocated.
    pub fn supports_shadows(&self) -> bool {
        self.shadow.is_some()
    }

    /// Track a new window size. Only valid between frames; the GPU targets
    /// must be re-created to match before the next frame.
    pub fn resize(
        &mut self,
        width: u32,
        height: u32,
        handles: TargetHandles,
    ) -> Result<(), FrameError> {
        self.expect_phase("resize", FramePhase::Idle)?;
        self.width = width;
        self.height = height;
        self.handles = handles;
        if handles.shadow_map.is_none() {
            self.shadow = None;
        }
        Ok(())
    }

    /// Bind the offscreen target with depth testing on.
    pub fn begin_scene_pass(&mut self, list: &mut CommandList) -> Result<(), FrameError> {
        self.expect_phase("begin_scene_pass", FramePhase::Idle)?;
        list.bind_target(RenderTarget::Offscreen);
        list.viewport(self.width, self.height);
        list.depth_test(true);
        list.depth_func(DepthCompare::Less);
        self.phase = FramePhase::Scene;
        Ok(())
    }

    /// Record the depth-only pass into the shadow cubemap.
    ///
    /// `draw_casters` issues the depth-only draws with the shadow program
    /// already bound and its light uniforms set. The offscreen target is
    /// bound again afterwards.
    pub fn render_shadow_pass<F>(
        &mut self,
        list: &mut CommandList,
        light_position: Vec3,
        draw_casters: F,
    ) -> Result<(), FrameError>
    where
        F: FnOnce(&mut BoundProgram<'_>),
    {
        self.expect_phase("render_shadow_pass", FramePhase::Scene)?;
        let settings = self.shadow.ok_or(FrameError::ShadowsDisabled)?;
        let matrices = self.shadow_matrices_for(light_position, &settings);

        list.bind_target(RenderTarget::ShadowCubemap);
        list.viewport(settings.resolution, settings.resolution);
        list.depth_test(true);
        list.depth_func(DepthCompare::Less);
        list.clear_buffers(ClearOp::depth_only());
        {
            let mut program = list.use_program(ProgramId::ShadowDepth);
            for (name, matrix) in uniforms::SHADOW_MATRICES.iter().zip(matrices) {
                program.set_mat4(name, matrix);
            }
            program.set_float(uniforms::FAR_PLANE, settings.far_plane);
            program.set_vec3(uniforms::LIGHT_POSITION, light_position);
            draw_casters(&mut program);
        }

        list.bind_target(RenderTarget::Offscreen);
        list.viewport(self.width, self.height);
        Ok(())
    }

    /// Draw the offscreen color texture over the whole window.
    pub fn composite_to_screen(&mut self, list: &mut CommandList) -> Result<(), FrameError> {
        self.expect_phase("composite_to_screen", FramePhase::Scene)?;
        list.bind_target(RenderTarget::Screen);
        list.viewport(self.width, self.height);
        list.depth_test(false);
        list.clear_buffers(ClearOp::color_only(COMPOSITE_CLEAR));
        let mut program = list.use_program(ProgramId::Composite);
        program.bind_texture(0, self.handles.color);
        program.draw_arrays(self.handles.screen_quad, 0, SCREEN_QUAD_VERTICES);
        self.phase = FramePhase::Composited;
        Ok(())
    }

    /// Finish the frame and return to `Idle`.
    pub fn present(&mut self, list: &mut CommandList) -> Result<(), FrameError> {
        self.expect_phase("present", FramePhase::Composited)?;
        list.present();
        self.phase = FramePhase::Idle;
        Ok(())
    }

    /// Return to `Idle` after a failed frame. The caller discards whatever
    /// was recorded for it.
    pub fn abort_frame(&mut self) {
        if self.phase != FramePhase::Idle {
            log::warn!("Abandoning frame in {:?} phase", self.phase);
        }
        self.phase = FramePhase::Idle;
    }

    fn expect_phase(&self, operation: &'static str, expected: FramePhase) -> Result<(), FrameError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(FrameError::OutOfOrder {
                operation,
                phase: self.phase,
            })
        }
    }

    fn shadow_matrices_for(&mut self, light: Vec3, settings: &ShadowSettings) -> [Mat4; 6] {
        match self.shadow_matrices {
            Some((cached_light, matrices)) if cached_light == light => matrices,
            _ => {
                let matrices = cube_face_view_projections(light, settings.near, settings.far_plane);
                self.shadow_matrices = Some((light, matrices));
                matrices
            }
        }
    }
}

/// Light-space view-projections for the six cubemap faces, in
/// +X, −X, +Y, −Y, +Z, −Z order.
///
/// Each face uses a 90° square frustum. The Y flip maps the rendered rows
/// onto wgpu's top-down cube face layout so that sampling the cubemap with
/// a world-space direction finds the texel rendered for it.
pub fn cube_face_view_projections(light: Vec3, near: f32, far_plane: f32) -> [Mat4; 6] {
    const FACES: [(Vec3, Vec3); 6] = [
        (Vec3::X, Vec3::NEG_Y),
        (Vec3::NEG_X, Vec3::NEG_Y),
        (Vec3::Y, Vec3::Z),
        (Vec3::NEG_Y, Vec3::NEG_Z),
        (Vec3::Z, Vec3::NEG_Y),
        (Vec3::NEG_Z, Vec3::NEG_Y),
    ];

    let flip_y = Mat4::from_scale(Vec3::new(1.0, -1.0, 1.0));
    let projection = flip_y * Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, near, far_plane);
    FACES.map(|(dir, up)| projection * Mat4::look_at_rh(light, light + dir, up))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::GpuCommand;

    fn handles(shadow: bool) -> TargetHandles {
        TargetHandles {
            color: TextureHandle(1),
            shadow_map: shadow.then_some(TextureHandle(2)),
            screen_quad: MeshHandle(9),
        }
    }

    fn settings() -> ShadowSettings {
        ShadowSettings {
            resolution: 1024,
            near: 1.0,
            far_plane: 100.0,
        }
    }

    /// Face index and (s, t) texture coordinates that cubemap sampling
    /// selects for a direction.
    fn cube_lookup(d: Vec3) -> (usize, f32, f32) {
        let a = d.abs();
        let (face, sc, tc, ma) = if a.x >= a.y && a.x >= a.z {
            if d.x > 0.0 {
                (0, -d.z, -d.y, a.x)
            } else {
                (1, d.z, -d.y, a.x)
            }
        } else if a.y >= a.z {
            if d.y > 0.0 {
                (2, d.x, d.z, a.y)
            } else {
                (3, d.x, -d.z, a.y)
            }
        } else if d.z > 0.0 {
            (4, d.x, -d.y, a.z)
        } else {
            (5, -d.x, -d.y, a.z)
        };
        (face, (sc / ma + 1.0) / 2.0, (tc / ma + 1.0) / 2.0)
    }

    #[test]
    fn test_face_matrices_agree_with_cubemap_sampling() {
        let light = Vec3::new(1.0, 2.0, 3.0);
        let matrices = cube_face_view_projections(light, 1.0, 100.0);
        let directions = [
            Vec3::new(5.0, 1.0, 0.5),
            Vec3::new(-5.0, 1.0, 0.5),
            Vec3::new(1.0, 5.0, 0.5),
            Vec3::new(1.0, -5.0, 0.5),
            Vec3::new(1.0, 0.5, 5.0),
            Vec3::new(1.0, 0.5, -5.0),
        ];

        for (expected_face, dir) in directions.into_iter().enumerate() {
            let (face, s, t) = cube_lookup(dir);
            assert_eq!(face, expected_face);

            let clip = matrices[face] * (light + dir).extend(1.0);
            let ndc = clip.truncate() / clip.w;
            let column = (ndc.x + 1.0) / 2.0;
            let row = (1.0 - ndc.y) / 2.0;
            assert!((column - s).abs() < 1e-4, "face {face}: s {column} vs {s}");
            assert!((row - t).abs() < 1e-4, "face {face}: t {row} vs {t}");
            assert!(ndc.z > 0.0 && ndc.z < 1.0);
        }
    }

    #[test]
    fn test_frame_commands_follow_pass_order() {
        let mut manager = RenderTargetManager::new(800, 600, handles(false), None);
        let mut list = CommandList::new();

        manager.begin_scene_pass(&mut list).unwrap();
        list.use_program(ProgramId::Planet)
            .draw_indexed(MeshHandle(3));
        manager.composite_to_screen(&mut list).unwrap();
        manager.present(&mut list).unwrap();

        let commands = list.commands();
        let scene_draw = commands
            .iter()
            .position(|c| *c == GpuCommand::DrawIndexed { mesh: MeshHandle(3) })
            .unwrap();
        let screen_bind = commands
            .iter()
            .position(|c| *c == GpuCommand::BindTarget(RenderTarget::Screen))
            .unwrap();
        let present = commands.iter().position(|c| *c == GpuCommand::Present).unwrap();

        assert!(scene_draw < screen_bind);
        assert!(screen_bind < present);
        assert_eq!(present, commands.len() - 1);
        // The only draw after the screen bind is the quad itself.
        assert_eq!(
            commands[screen_bind..].iter().filter(|c| c.is_draw()).count(),
            1
        );
        assert_eq!(manager.phase(), FramePhase::Idle);
    }

    #[test]
    fn test_composite_samples_offscreen_color() {
        let mut manager = RenderTargetManager::new(640, 480, handles(false), None);
        let mut list = CommandList::new();
        manager.begin_scene_pass(&mut list).unwrap();
        let mark = list.len();
        manager.composite_to_screen(&mut list).unwrap();

        assert_eq!(
            &list.commands()[mark..],
            &[
                GpuCommand::BindTarget(RenderTarget::Screen),
                GpuCommand::Viewport {
                    width: 640,
                    height: 480
                },
                GpuCommand::DepthTest(false),
                GpuCommand::Clear(ClearOp::color_only([1.0; 4])),
                GpuCommand::UseProgram(ProgramId::Composite),
                GpuCommand::BindTexture {
                    slot: 0,
                    texture: TextureHandle(1)
                },
                GpuCommand::DrawArrays {
                    mesh: MeshHandle(9),
                    first: 0,
                    count: 6
                },
            ]
        );
    }

    #[test]
    fn test_shadow_pass_uploads_uniforms_then_restores_offscreen() {
        let mut manager = RenderTargetManager::new(800, 600, handles(true), Some(settings()));
        let mut list = CommandList::new();
        let light = Vec3::ZERO;

        manager.begin_scene_pass(&mut list).unwrap();
        let mark = list.len();
        manager
            .render_shadow_pass(&mut list, light, |program| {
                assert_eq!(program.program(), ProgramId::ShadowDepth);
                program.draw_indexed(MeshHandle(5));
            })
            .unwrap();

        let recorded = &list.commands()[mark..];
        assert_eq!(recorded[0], GpuCommand::BindTarget(RenderTarget::ShadowCubemap));
        assert_eq!(
            recorded[1],
            GpuCommand::Viewport {
                width: 1024,
                height: 1024
            }
        );
        assert!(recorded.contains(&GpuCommand::Clear(ClearOp::depth_only())));

        let names: Vec<&str> = recorded
            .iter()
            .filter_map(|c| match c {
                GpuCommand::SetUniform { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        let mut expected: Vec<&str> = uniforms::SHADOW_MATRICES.to_vec();
        expected.push(uniforms::FAR_PLANE);
        expected.push(uniforms::LIGHT_POSITION);
        assert_eq!(names, expected);

        let draw = recorded
            .iter()
            .position(|c| *c == GpuCommand::DrawIndexed { mesh: MeshHandle(5) })
            .unwrap();
        let restore = recorded
            .iter()
            .position(|c| *c == GpuCommand::BindTarget(RenderTarget::Offscreen))
            .unwrap();
        assert!(draw < restore);
        assert_eq!(
            recorded.last(),
            Some(&GpuCommand::Viewport {
                width: 800,
                height: 600
            })
        );
        assert_eq!(manager.phase(), FramePhase::Scene);
    }

    #[test]
    fn test_shadow_pass_without_cubemap_is_rejected() {
        let mut manager = RenderTargetManager::new(800, 600, handles(false), Some(settings()));
        assert!(!manager.supports_shadows());

        let mut list = CommandList::new();
        manager.begin_scene_pass(&mut list).unwrap();
        let mark = list.len();
        let result = manager.render_shadow_pass(&mut list, Vec3::ZERO, |_| {});
        assert_eq!(result, Err(FrameError::ShadowsDisabled));
        assert_eq!(list.len(), mark);
    }

    #[test]
    fn test_out_of_order_calls_are_rejected() {
        let mut manager = RenderTargetManager::new(800, 600, handles(true), Some(settings()));
        let mut list = CommandList::new();

        assert_eq!(
            manager.composite_to_screen(&mut list),
            Err(FrameError::OutOfOrder {
                operation: "composite_to_screen",
                phase: FramePhase::Idle
            })
        );
        assert!(manager.render_shadow_pass(&mut list, Vec3::ZERO, |_| {}).is_err());
        assert!(manager.present(&mut list).is_err());
        assert!(list.is_empty());

        manager.begin_scene_pass(&mut list).unwrap();
        assert!(manager.begin_scene_pass(&mut list).is_err());
        manager.composite_to_screen(&mut list).unwrap();
        assert!(manager.render_shadow_pass(&mut list, Vec3::ZERO, |_| {}).is_err());
        assert!(manager.resize(10, 10, handles(true)).is_err());
    }

    #[test]
    fn test_abort_frame_allows_a_fresh_frame() {
        let mut manager = RenderTargetManager::new(800, 600, handles(false), None);
        let mut list = CommandList::new();
        manager.begin_scene_pass(&mut list).unwrap();
        manager.abort_frame();
        list.clear();
        assert!(manager.begin_scene_pass(&mut list).is_ok());
    }

    #[test]
    fn test_resize_updates_viewport() {
        let mut manager = RenderTargetManager::new(800, 600, handles(true), Some(settings()));
        manager.resize(1280, 720, handles(true)).unwrap();
        let mut list = CommandList::new();
        manager.begin_scene_pass(&mut list).unwrap();
        assert!(list.commands().contains(&GpuCommand::Viewport {
            width: 1280,
            height: 720
        }));
        assert!(manager.supports_shadows());

        manager.abort_frame();
        manager.resize(1280, 720, handles(false)).unwrap();
        assert!(!manager.supports_shadows());
    }

    #[test]
    fn test_shadow_matrices_follow_the_light() {
        let mut manager = RenderTargetManager::new(8, 8, handles(true), Some(settings()));
        let first = manager.shadow_matrices_for(Vec3::ZERO, &settings());
        let same = manager.shadow_matrices_for(Vec3::ZERO, &settings());
        let moved = manager.shadow_matrices_for(Vec3::X, &settings());
        assert_eq!(first, same);
        assert_ne!(first, moved);
    }
}
