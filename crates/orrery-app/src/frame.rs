//! Records one frame of the solar system into a [`CommandList`].

use glam::{Mat4, Vec3};
use orrery_config::LightConfig;
use orrery_render::{ClearOp, CommandList, FrameError, ProgramId, RenderTargetManager, Skybox};
use orrery_scene::{NodeId, SceneGraph, ShaderContext, uniforms};

/// Texture slot the planet program reads the shadow cubemap from.
pub const SHADOW_MAP_SLOT: u32 = 1;

/// Per-frame inputs to [`record_frame`].
#[derive(Debug, Clone, Copy)]
pub struct FrameParams<'a> {
    pub dt: f32,
    pub view: Mat4,
    pub projection: Mat4,
    pub camera_position: Vec3,
    pub light: &'a LightConfig,
    /// The node whose position lights the scene.
    pub light_source: Option<NodeId>,
    pub shadows: bool,
    pub orbiting: bool,
    pub clear_color: [f32; 4],
    /// Shadow distance normalisation, used when no shadow map exists.
    pub far_plane: f32,
}

/// Advance the scene by `params.dt` and record its frame.
///
/// On failure nothing of this frame stays in `list` and `targets` is back in
/// its idle phase.
pub fn record_frame(
    list: &mut CommandList,
    targets: &mut RenderTargetManager,
    scene: &mut SceneGraph,
    skybox: &Skybox,
    params: &FrameParams<'_>,
) -> Result<(), FrameError> {
    let start = list.len();
    let result = record(list, targets, scene, skybox, params);
    if let Err(err) = &result {
        tracing::error!("Frame dropped: {err}");
        targets.abort_frame();
        list.truncate(start);
    }
    result
}

fn record(
    list: &mut CommandList,
    targets: &mut RenderTargetManager,
    scene: &mut SceneGraph,
    skybox: &Skybox,
    params: &FrameParams<'_>,
) -> Result<(), FrameError> {
    targets.begin_scene_pass(list)?;
    scene.advance(params.dt, Vec3::ZERO, params.orbiting);

    let light_position = params
        .light_source
        .and_then(|id| scene.get(id))
        .map_or(Vec3::ZERO, |light| light.world_position());

    let shadows = params.shadows && targets.supports_shadows();
    if shadows {
        targets.render_shadow_pass(list, light_position, |program| {
            scene.render_shadow_casters(program);
        })?;
    }

    list.clear_buffers(ClearOp::color_and_depth(params.clear_color));
    {
        let far_plane = targets
            .shadow_settings()
            .map_or(params.far_plane, |settings| settings.far_plane);
        let shadow_map = targets.handles().shadow_map;

        let mut program = list.use_program(ProgramId::Planet);
        program.set_mat4(uniforms::VIEW, params.view);
        program.set_mat4(uniforms::PROJECTION, params.projection);
        program.set_vec3(uniforms::VIEW_POS, params.camera_position);
        program.set_vec3(uniforms::LIGHT_POSITION, light_position);
        program.set_float(uniforms::LIGHT_AMBIENT, params.light.ambient);
        program.set_float(uniforms::LIGHT_DIFFUSE, params.light.diffuse);
        program.set_float(uniforms::LIGHT_CONSTANT, params.light.constant);
        program.set_float(uniforms::LIGHT_LINEAR, params.light.linear);
        program.set_float(uniforms::LIGHT_QUADRATIC, params.light.quadratic);
        program.set_float(uniforms::MATERIAL_SHININESS, params.light.shininess);
        program.set_bool(uniforms::SHADOWS, shadows);
        program.set_float(uniforms::FAR_PLANE, far_plane);
        if let Some(shadow_map) = shadow_map.filter(|_| shadows) {
            program.bind_texture(SHADOW_MAP_SLOT, shadow_map);
        }
        scene.render(&mut program);
    }

    skybox.draw(list, params.view, params.projection);
    targets.composite_to_screen(list)?;
    targets.present(list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use orrery_render::{
        DepthCompare, FramePhase, GpuCommand, RenderTarget, ShadowSettings, TargetHandles,
    };
    use orrery_scene::{MeshHandle, TextureHandle, TextureSet, UniformValue};

    use crate::solar_system::{BodyMeshes, SUN, build_solar_system};

    const SHADOW_MAP: TextureHandle = TextureHandle(2);

    fn targets(shadows: bool) -> RenderTargetManager {
        let handles = TargetHandles {
            color: TextureHandle(1),
            shadow_map: shadows.then_some(SHADOW_MAP),
            screen_quad: MeshHandle(10),
        };
        RenderTargetManager::new(
            800,
            600,
            handles,
            Some(ShadowSettings {
                resolution: 512,
                near: 1.0,
                far_plane: 100.0,
            }),
        )
    }

    fn scene() -> SceneGraph {
        let meshes = BodyMeshes {
            sphere: MeshHandle(0),
            rock: MeshHandle(1),
            ring: MeshHandle(2),
        };
        build_solar_system(&meshes, |_| Arc::new(TextureSet::new())).unwrap()
    }

    fn params<'a>(light: &'a LightConfig, scene: &SceneGraph, shadows: bool) -> FrameParams<'a> {
        FrameParams {
            dt: 0.016,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            camera_position: Vec3::new(0.0, 61.0, 0.0),
            light,
            light_source: scene.find(SUN),
            shadows,
            orbiting: true,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            far_plane: 100.0,
        }
    }

    fn position_of<F: Fn(&GpuCommand) -> bool>(list: &CommandList, pred: F) -> usize {
        list.commands().iter().position(pred).unwrap()
    }

    #[test]
    fn test_frame_without_shadows() {
        let light = LightConfig::default();
        let mut scene = scene();
        let mut targets = targets(false);
        let skybox = Skybox::from_handles(TextureHandle(3), MeshHandle(4));
        let mut list = CommandList::new();

        let params = params(&light, &scene, true);
        record_frame(&mut list, &mut targets, &mut scene, &skybox, &params).unwrap();

        let commands = list.commands();
        assert_eq!(commands.first(), Some(&GpuCommand::BindTarget(RenderTarget::Offscreen)));
        assert_eq!(commands.last(), Some(&GpuCommand::Present));
        assert!(!commands.contains(&GpuCommand::BindTarget(RenderTarget::ShadowCubemap)));
        assert!(commands.contains(&GpuCommand::SetUniform {
            name: uniforms::SHADOWS.to_string(),
            value: UniformValue::Bool(false),
        }));
        // One planet draw per body, after the clear.
        let draws = commands
            .iter()
            .filter(|c| matches!(c, GpuCommand::DrawIndexed { .. }))
            .count();
        assert_eq!(draws, 13);
        assert_eq!(targets.phase(), FramePhase::Idle);
    }

    #[test]
    fn test_shadow_pass_precedes_scene_draws() {
        let light = LightConfig::default();
        let mut scene = scene();
        let mut targets = targets(true);
        let skybox = Skybox::from_handles(TextureHandle(3), MeshHandle(4));
        let mut list = CommandList::new();

        let params = params(&light, &scene, true);
        record_frame(&mut list, &mut targets, &mut scene, &skybox, &params).unwrap();

        let shadow = position_of(&list, |c| *c == GpuCommand::BindTarget(RenderTarget::ShadowCubemap));
        let planet = position_of(&list, |c| *c == GpuCommand::UseProgram(ProgramId::Planet));
        let shadow_bind = position_of(&list, |c| {
            *c == GpuCommand::BindTexture {
                slot: SHADOW_MAP_SLOT,
                texture: SHADOW_MAP,
            }
        });
        let skybox_at = position_of(&list, |c| *c == GpuCommand::UseProgram(ProgramId::Skybox));
        let screen = position_of(&list, |c| *c == GpuCommand::BindTarget(RenderTarget::Screen));

        assert!(shadow < planet);
        assert!(planet < shadow_bind);
        assert!(shadow_bind < skybox_at);
        assert!(skybox_at < screen);

        // The sun casts no shadow: twelve casters.
        let caster_draws = list.commands()[shadow..planet]
            .iter()
            .filter(|c| c.is_draw())
            .count();
        assert_eq!(caster_draws, 12);
    }

    #[test]
    fn test_depth_func_is_less_after_skybox() {
        let light = LightConfig::default();
        let mut scene = scene();
        let mut targets = targets(false);
        let skybox = Skybox::from_handles(TextureHandle(3), MeshHandle(4));
        let mut list = CommandList::new();

        let params = params(&light, &scene, false);
        record_frame(&mut list, &mut targets, &mut scene, &skybox, &params).unwrap();

        let last_func = list
            .commands()
            .iter()
            .rev()
            .find_map(|c| match c {
                GpuCommand::DepthFunc(f) => Some(*f),
                _ => None,
            });
        assert_eq!(last_func, Some(DepthCompare::Less));
    }

    #[test]
    fn test_failed_frame_leaves_nothing_behind() {
        let light = LightConfig::default();
        let mut scene = scene();
        let mut targets = targets(false);
        let skybox = Skybox::from_handles(TextureHandle(3), MeshHandle(4));
        let mut list = CommandList::new();

        // A frame already in flight makes begin_scene_pass fail.
        targets.begin_scene_pass(&mut list).unwrap();
        let before = list.len();

        let params = params(&light, &scene, false);
        let err = record_frame(&mut list, &mut targets, &mut scene, &skybox, &params).unwrap_err();
        assert!(matches!(err, FrameError::OutOfOrder { .. }));
        assert_eq!(list.len(), before);
        assert_eq!(targets.phase(), FramePhase::Idle);
    }
}
