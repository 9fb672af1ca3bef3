//! Frame traversal through the public API with a recording shader.

use std::sync::Arc;

use glam::{Mat4, Vec3};
use orrery_scene::{
    Drawable, IndexedMesh, MeshHandle, OrbitParams, Planetoid, SceneGraph, ShaderContext,
    TextureHandle, TextureKind, TextureSet, UniformValue, uniforms,
};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Uniform(String, UniformValue),
    Texture(u32, TextureHandle),
    Unbind(u32),
    Draw(MeshHandle),
}

#[derive(Default)]
struct Recorder {
    calls: Vec<Call>,
}

impl ShaderContext for Recorder {
    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.calls.push(Call::Uniform(name.to_string(), value));
    }

    fn bind_texture(&mut self, slot: u32, texture: TextureHandle) {
        self.calls.push(Call::Texture(slot, texture));
    }

    fn unbind_texture(&mut self, slot: u32) {
        self.calls.push(Call::Unbind(slot));
    }

    fn draw_indexed(&mut self, mesh: MeshHandle) {
        self.calls.push(Call::Draw(mesh));
    }
}

impl Recorder {
    /// Translation of every `model` upload, in call order.
    fn model_positions(&self) -> Vec<Vec3> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Uniform(name, UniformValue::Mat4(m)) if name == uniforms::MODEL => {
                    Some(m.w_axis.truncate())
                }
                _ => None,
            })
            .collect()
    }
}

fn sphere(mesh: u32) -> Arc<dyn Drawable> {
    Arc::new(IndexedMesh {
        mesh: MeshHandle(mesh),
    })
}

fn textured(diffuse: u32) -> Arc<TextureSet> {
    Arc::new(TextureSet::new().with(TextureKind::Diffuse, TextureHandle(diffuse)))
}

#[test]
fn test_single_step_end_to_end() {
    let mut scene = SceneGraph::new();
    let root = scene.insert(Planetoid::new(
        "root",
        sphere(0),
        textured(10),
        OrbitParams::luminous(1.0, 5.0),
    ));
    let child = scene
        .insert_child(
            root,
            Planetoid::new(
                "child",
                sphere(0),
                textured(11),
                OrbitParams::satellite(10.0, 1.0, 90.0, 0.0),
            ),
        )
        .unwrap();

    let before = Vec3::new(10.0, 0.0, 0.0);
    let mut shader = Recorder::default();
    scene.draw(&mut shader, 1.0, Vec3::ZERO, true);

    let after = scene.get(child).unwrap().world_position();
    assert!((after.length() - 10.0).abs() < 1e-4);
    let angle = before.angle_between(after).to_degrees();
    assert!((angle - 90.0).abs() < 1e-3, "turned {angle} degrees");
    assert!(after.y.abs() < 1e-4, "orbit stays in the horizontal plane");

    assert_eq!(
        shader.calls,
        vec![
            Call::Uniform(uniforms::IS_SUN.into(), UniformValue::Bool(true)),
            Call::Uniform(
                uniforms::MODEL.into(),
                UniformValue::Mat4(scene.get(root).unwrap().model_matrix())
            ),
            Call::Unbind(2),
            Call::Unbind(3),
            Call::Texture(0, TextureHandle(10)),
            Call::Draw(MeshHandle(0)),
            Call::Uniform(uniforms::IS_SUN.into(), UniformValue::Bool(false)),
            Call::Uniform(
                uniforms::MODEL.into(),
                UniformValue::Mat4(scene.get(child).unwrap().model_matrix())
            ),
            Call::Unbind(2),
            Call::Unbind(3),
            Call::Texture(0, TextureHandle(11)),
            Call::Draw(MeshHandle(0)),
        ]
    );
}

#[test]
fn test_children_see_post_update_parent_positions() {
    let mut scene = SceneGraph::new();
    let root = scene.insert(
        Planetoid::new(
            "root",
            sphere(0),
            textured(0),
            OrbitParams::luminous(3.0, 5.0),
        )
        .with_position(Vec3::new(5.0, 0.0, 0.0)),
    );
    let a = scene
        .insert_child(
            root,
            Planetoid::new("a", sphere(1), textured(1), OrbitParams::satellite(10.0, 1.0, 40.0, 0.0)),
        )
        .unwrap();
    let b = scene
        .insert_child(
            a,
            Planetoid::new("b", sphere(2), textured(2), OrbitParams::satellite(3.0, 1.0, 60.0, 0.0)),
        )
        .unwrap();

    for frame in 0..4 {
        let mut shader = Recorder::default();
        scene.draw(&mut shader, 0.5, Vec3::ZERO, true);

        let root_pos = scene.get(root).unwrap().world_position();
        let a_pos = scene.get(a).unwrap().world_position();
        let b_pos = scene.get(b).unwrap().world_position();
        assert_eq!(root_pos, Vec3::new(5.0, 0.0, 0.0));
        assert!(((a_pos - root_pos).length() - 10.0).abs() < 1e-3, "frame {frame}");
        assert!(((b_pos - a_pos).length() - 3.0).abs() < 1e-3, "frame {frame}");

        // Draws come out parent first, each at its freshly updated position.
        assert_eq!(shader.model_positions(), vec![root_pos, a_pos, b_pos]);
    }
}

#[test]
fn test_split_advance_render_matches_combined_draw() {
    fn build() -> SceneGraph {
        let mut scene = SceneGraph::new();
        let sun = scene.insert(Planetoid::new(
            "sun",
            sphere(0),
            textured(0),
            OrbitParams::luminous(3.0, 5.0),
        ));
        let earth = scene
            .insert_child(
                sun,
                Planetoid::new("earth", sphere(0), textured(1), OrbitParams::satellite(25.0, 0.7, 15.0, 50.0)),
            )
            .unwrap();
        scene
            .insert_child(
                earth,
                Planetoid::new("moon", sphere(0), textured(2), OrbitParams::satellite(10.0, 0.1, 20.0, 70.0)),
            )
            .unwrap();
        scene
    }

    let mut combined = build();
    let mut split = build();
    let mut a = Recorder::default();
    let mut b = Recorder::default();
    for dt in [0.016, 0.033, 2.0] {
        combined.draw(&mut a, dt, Vec3::ZERO, true);
        split.advance(dt, Vec3::ZERO, true);
        split.render(&mut b);
    }
    assert_eq!(a.calls, b.calls);
}

#[test]
fn test_shadow_casters_skip_light_but_not_its_children() {
    let mut scene = SceneGraph::new();
    let sun = scene.insert(Planetoid::new(
        "sun",
        sphere(0),
        textured(0),
        OrbitParams::luminous(3.0, 5.0),
    ));
    scene
        .insert_child(
            sun,
            Planetoid::new("venus", sphere(1), textured(1), OrbitParams::satellite(28.0, 0.4, 13.0, 80.0)),
        )
        .unwrap();
    scene.advance(1.0, Vec3::ZERO, true);

    let mut shader = Recorder::default();
    scene.render_shadow_casters(&mut shader);
    let draws: Vec<_> = shader
        .calls
        .iter()
        .filter(|c| matches!(c, Call::Draw(_)))
        .collect();
    assert_eq!(draws, vec![&Call::Draw(MeshHandle(1))]);
    assert!(!shader.calls.contains(&Call::Uniform(
        uniforms::IS_SUN.into(),
        UniformValue::Bool(true)
    )));
}

#[test]
fn test_paused_orbit_keeps_positions_but_model_still_spins() {
    let mut scene = SceneGraph::new();
    let sun = scene.insert(Planetoid::new(
        "sun",
        sphere(0),
        textured(0),
        OrbitParams::luminous(3.0, 5.0),
    ));
    let mars = scene
        .insert_child(
            sun,
            Planetoid::new("mars", sphere(0), textured(0), OrbitParams::satellite(40.0, 0.6, 23.0, 50.0)),
        )
        .unwrap();
    scene.advance(1.0, Vec3::ZERO, true);
    let placed = scene.get(mars).unwrap().world_position();
    let model_before: Mat4 = scene.get(mars).unwrap().model_matrix();

    scene.advance(1.0, Vec3::ZERO, false);
    assert_eq!(scene.get(mars).unwrap().world_position(), placed);
    assert_ne!(scene.get(mars).unwrap().model_matrix(), model_before);
}
