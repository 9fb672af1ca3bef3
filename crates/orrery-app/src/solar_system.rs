//! The demo scene: the sun, eight planets, four moons and Saturn's ring.

use std::collections::HashMap;
use std::sync::Arc;

use orrery_scene::{
    Drawable, IndexedMesh, MeshHandle, NodeId, OrbitParams, Planetoid, SceneError, SceneGraph,
    TextureSet,
};

pub const SUN: &str = "sun";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyShape {
    Sphere,
    /// Small irregular moons, drawn with a coarse sphere.
    Rock,
    Ring,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodySpec {
    /// Node name, and the texture atlas directory it reads from.
    pub name: &'static str,
    pub parent: Option<&'static str>,
    pub shape: BodyShape,
    pub params: OrbitParams,
}

/// Every body, parents before children.
pub fn bodies() -> Vec<BodySpec> {
    use BodyShape::{Ring, Rock, Sphere};
    let body = |name, parent, shape, (radius, size, orbit, spin)| BodySpec {
        name,
        parent: Some(parent),
        shape,
        params: OrbitParams::satellite(radius, size, orbit, spin),
    };

    vec![
        BodySpec {
            name: SUN,
            parent: None,
            shape: Sphere,
            params: OrbitParams::luminous(3.0, 5.0),
        },
        body("mercury", SUN, Sphere, (20.0, 0.3, 10.0, 90.0)),
        body("venus", SUN, Sphere, (28.0, 0.4, 13.0, 80.0)),
        body("earth", SUN, Sphere, (25.0, 0.7, 15.0, 50.0)),
        body("moon", "earth", Sphere, (10.0, 0.1, 20.0, 70.0)),
        body("mars", SUN, Sphere, (40.0, 0.6, 23.0, 50.0)),
        body("deimos", "mars", Rock, (10.0, 0.04, 30.0, 60.0)),
        body("phobos", "mars", Rock, (15.0, 0.03, 24.0, 35.0)),
        body("jupiter", SUN, Sphere, (20.0, 2.0, 8.0, 45.0)),
        body("saturn", SUN, Sphere, (25.0, 1.5, 6.0, 30.0)),
        body("saturn_ring", "saturn", Ring, (0.0, 4.0, 0.0, 0.0)),
        body("uranus", SUN, Sphere, (30.0, 1.4, 5.0, 20.0)),
        body("neptune", SUN, Sphere, (35.0, 1.5, 4.0, 25.0)),
    ]
}

/// Uploaded geometry for each [`BodyShape`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyMeshes {
    pub sphere: MeshHandle,
    pub rock: MeshHandle,
    pub ring: MeshHandle,
}

/// Assemble the scene. `textures_for` is asked once per body name.
pub fn build_solar_system(
    meshes: &BodyMeshes,
    mut textures_for: impl FnMut(&str) -> Arc<TextureSet>,
) -> Result<SceneGraph, SceneError> {
    let drawable = |mesh| -> Arc<dyn Drawable> { Arc::new(IndexedMesh { mesh }) };
    let sphere = drawable(meshes.sphere);
    let rock = drawable(meshes.rock);
    let ring = drawable(meshes.ring);

    let mut scene = SceneGraph::new();
    let mut ids: HashMap<&str, NodeId> = HashMap::new();
    for spec in bodies() {
        let shape = match spec.shape {
            BodyShape::Sphere => Arc::clone(&sphere),
            BodyShape::Rock => Arc::clone(&rock),
            BodyShape::Ring => Arc::clone(&ring),
        };
        let planetoid = Planetoid::new(spec.name, shape, textures_for(spec.name), spec.params);

        let id = match spec.parent {
            None => scene.insert(planetoid),
            Some(parent) => {
                let parent = *ids
                    .get(parent)
                    .ok_or_else(|| SceneError::UnknownName(parent.to_string()))?;
                scene.insert_child(parent, planetoid)?
            }
        };
        ids.insert(spec.name, id);
    }

    tracing::debug!("Solar system assembled with {} bodies", scene.len());
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use orrery_scene::{TextureHandle, TextureKind};

    const MESHES: BodyMeshes = BodyMeshes {
        sphere: MeshHandle(0),
        rock: MeshHandle(1),
        ring: MeshHandle(2),
    };

    fn untextured(_: &str) -> Arc<TextureSet> {
        Arc::new(TextureSet::new())
    }

    fn names(scene: &SceneGraph) -> Vec<&str> {
        scene
            .preorder()
            .into_iter()
            .filter_map(|id| scene.get(id).map(Planetoid::name))
            .collect()
    }

    #[test]
    fn test_table_lists_parents_first() {
        let specs = bodies();
        for (i, spec) in specs.iter().enumerate() {
            if let Some(parent) = spec.parent {
                assert!(
                    specs[..i].iter().any(|s| s.name == parent),
                    "{} listed before its parent {parent}",
                    spec.name
                );
            }
        }
    }

    #[test]
    fn test_only_the_sun_is_luminous() {
        let luminous: Vec<_> = bodies()
            .into_iter()
            .filter(|b| b.params.luminous)
            .map(|b| b.name)
            .collect();
        assert_eq!(luminous, vec![SUN]);
    }

    #[test]
    fn test_scene_shape() {
        let scene = build_solar_system(&MESHES, untextured).unwrap();
        assert_eq!(scene.len(), 13);
        assert_eq!(scene.roots().count(), 1);
        assert_eq!(
            names(&scene),
            vec![
                "sun", "mercury", "venus", "earth", "moon", "mars", "deimos", "phobos",
                "jupiter", "saturn", "saturn_ring", "uranus", "neptune",
            ]
        );

        let mars = scene.find("mars").unwrap();
        let moons: Vec<_> = scene
            .children(mars)
            .iter()
            .filter_map(|id| scene.get(*id).map(Planetoid::name))
            .collect();
        assert_eq!(moons, vec!["deimos", "phobos"]);
    }

    #[test]
    fn test_textures_requested_by_body_name() {
        let mut requested = Vec::new();
        let scene = build_solar_system(&MESHES, |name| {
            requested.push(name.to_string());
            Arc::new(TextureSet::new().with(TextureKind::Diffuse, TextureHandle(requested.len() as u32)))
        })
        .unwrap();

        assert_eq!(requested.len(), 13);
        let earth = scene.get(scene.find("earth").unwrap()).unwrap();
        assert_eq!(earth.textures().first(TextureKind::Diffuse), Some(TextureHandle(4)));
    }

    #[test]
    fn test_bodies_orbit_at_their_radius() {
        let mut scene = build_solar_system(&MESHES, untextured).unwrap();
        scene.advance(1.0, Vec3::ZERO, true);

        let position = |name| scene.get(scene.find(name).unwrap()).unwrap().world_position();
        assert!((position("earth").length() - 25.0).abs() < 1e-3);
        assert!((position("moon").distance(position("earth")) - 10.0).abs() < 1e-3);
        // The ring sits on Saturn.
        assert!(position("saturn_ring").distance(position("saturn")) < 1e-4);
        assert_eq!(position(SUN), Vec3::ZERO);
    }
}
