//! Several recorded frames of the full demo scene, without a GPU.

use std::sync::Arc;

use glam::{Mat4, Vec3};
use orrery_app::frame::{FrameParams, record_frame};
use orrery_app::solar_system::{BodyMeshes, SUN, build_solar_system};
use orrery_config::LightConfig;
use orrery_render::{
    CommandList, FramePhase, GpuCommand, RenderTarget, RenderTargetManager, ShadowSettings,
    Skybox, TargetHandles,
};
use orrery_scene::{MeshHandle, SceneGraph, TextureHandle, TextureSet};

fn scene() -> SceneGraph {
    let meshes = BodyMeshes {
        sphere: MeshHandle(0),
        rock: MeshHandle(1),
        ring: MeshHandle(2),
    };
    build_solar_system(&meshes, |_| Arc::new(TextureSet::new())).unwrap()
}

fn manager() -> RenderTargetManager {
    RenderTargetManager::new(
        1024,
        768,
        TargetHandles {
            color: TextureHandle(1),
            shadow_map: Some(TextureHandle(2)),
            screen_quad: MeshHandle(10),
        },
        Some(ShadowSettings {
            resolution: 1024,
            near: 1.0,
            far_plane: 100.0,
        }),
    )
}

fn position(scene: &SceneGraph, name: &str) -> Vec3 {
    scene.get(scene.find(name).unwrap()).unwrap().world_position()
}

fn run_frames(
    scene: &mut SceneGraph,
    targets: &mut RenderTargetManager,
    frames: usize,
    shadows: bool,
    orbiting: bool,
) -> CommandList {
    let light = LightConfig::default();
    let skybox = Skybox::from_handles(TextureHandle(3), MeshHandle(4));
    let mut list = CommandList::new();
    for _ in 0..frames {
        list.clear();
        let params = FrameParams {
            dt: 0.1,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            camera_position: Vec3::new(0.0, 61.0, 0.0),
            light: &light,
            light_source: scene.find(SUN),
            shadows,
            orbiting,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            far_plane: 100.0,
        };
        record_frame(&mut list, targets, scene, &skybox, &params).unwrap();
        assert_eq!(targets.phase(), FramePhase::Idle);
    }
    list
}

#[test]
fn test_bodies_move_between_frames_while_orbiting() {
    let mut scene = scene();
    let mut targets = manager();

    run_frames(&mut scene, &mut targets, 1, false, true);
    let earth = position(&scene, "earth");
    run_frames(&mut scene, &mut targets, 10, false, true);

    assert!(earth.distance(position(&scene, "earth")) > 1e-3);
    assert!((position(&scene, "earth").length() - 25.0).abs() < 1e-3);
}

#[test]
fn test_paused_orbits_hold_every_body_in_place() {
    let mut scene = scene();
    let mut targets = manager();

    run_frames(&mut scene, &mut targets, 3, false, true);
    let before: Vec<_> = ["earth", "moon", "phobos", "saturn_ring"]
        .iter()
        .map(|name| position(&scene, name))
        .collect();
    run_frames(&mut scene, &mut targets, 5, false, false);
    let after: Vec<_> = ["earth", "moon", "phobos", "saturn_ring"]
        .iter()
        .map(|name| position(&scene, name))
        .collect();

    assert_eq!(before, after);
}

#[test]
fn test_every_frame_binds_targets_in_order() {
    let mut scene = scene();
    let mut targets = manager();
    let list = run_frames(&mut scene, &mut targets, 2, true, true);

    let binds: Vec<_> = list
        .commands()
        .iter()
        .filter_map(|c| match c {
            GpuCommand::BindTarget(target) => Some(*target),
            _ => None,
        })
        .collect();
    assert_eq!(
        binds,
        vec![
            RenderTarget::Offscreen,
            RenderTarget::ShadowCubemap,
            RenderTarget::Offscreen,
            RenderTarget::Screen,
        ]
    );
    assert_eq!(list.commands().last(), Some(&GpuCommand::Present));
}
