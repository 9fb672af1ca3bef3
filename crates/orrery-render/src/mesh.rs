//! Procedural geometry: bodies, rings, the sky cube and the screen quad.

use std::f32::consts::{PI, TAU};

use crate::buffer::{VertexPosition, VertexPositionNormalUv, VertexPositionUv};

/// Indexed triangle list.
pub struct MeshData<V> {
    pub vertices: Vec<V>,
    pub indices: Vec<u32>,
}

/// Unit-radius UV sphere centred on the origin.
///
/// `sectors` slices around the Y axis, `stacks` bands from pole to pole.
/// The seam column is duplicated so texture coordinates wrap cleanly.
pub fn uv_sphere(sectors: u32, stacks: u32) -> MeshData<VertexPositionNormalUv> {
    let sectors = sectors.max(3);
    let stacks = stacks.max(2);
    let mut vertices = Vec::with_capacity(((sectors + 1) * (stacks + 1)) as usize);

    for stack in 0..=stacks {
        let v = stack as f32 / stacks as f32;
        let polar = v * PI;
        let (ring_radius, y) = (polar.sin(), polar.cos());
        for sector in 0..=sectors {
            let u = sector as f32 / sectors as f32;
            let azimuth = u * TAU;
            let position = [ring_radius * azimuth.cos(), y, -ring_radius * azimuth.sin()];
            vertices.push(VertexPositionNormalUv {
                position,
                normal: position,
                uv: [u, v],
            });
        }
    }

    let row = sectors + 1;
    let mut indices = Vec::with_capacity((sectors * stacks * 6) as usize);
    for stack in 0..stacks {
        for sector in 0..sectors {
            let top = stack * row + sector;
            let bottom = top + row;
            if stack != 0 {
                indices.extend_from_slice(&[top, bottom, top + 1]);
            }
            if stack != stacks - 1 {
                indices.extend_from_slice(&[top + 1, bottom, bottom + 1]);
            }
        }
    }

    MeshData { vertices, indices }
}

/// Flat annulus in the XZ plane, visible from both sides.
///
/// Radii are in model units; the ring is scaled with its node like any
/// other body. `v` runs from 0 on the inner edge to 1 on the outer edge.
pub fn ring(inner: f32, outer: f32, segments: u32) -> MeshData<VertexPositionNormalUv> {
    let segments = segments.max(3);
    let mut vertices = Vec::with_capacity(((segments + 1) * 4) as usize);

    for normal_y in [1.0f32, -1.0] {
        for segment in 0..=segments {
            let u = segment as f32 / segments as f32;
            let (sin, cos) = (u * TAU).sin_cos();
            for (radius, v) in [(inner, 0.0), (outer, 1.0)] {
                vertices.push(VertexPositionNormalUv {
                    position: [radius * cos, 0.0, -radius * sin],
                    normal: [0.0, normal_y, 0.0],
                    uv: [u, v],
                });
            }
        }
    }

    let side = (segments + 1) * 2;
    let mut indices = Vec::with_capacity((segments * 12) as usize);
    for segment in 0..segments {
        let i = segment * 2;
        // Upper face winds counter-clockwise seen from +Y, lower face the
        // other way.
        indices.extend_from_slice(&[i, i + 1, i + 3, i, i + 3, i + 2]);
        let j = side + i;
        indices.extend_from_slice(&[j, j + 3, j + 1, j, j + 2, j + 3]);
    }

    MeshData { vertices, indices }
}

/// The 36 vertices of a unit cube, drawn without an index buffer.
pub fn skybox_cube() -> Vec<VertexPosition> {
    const CORNERS: [[f32; 3]; 8] = [
        [-1.0, -1.0, -1.0],
        [1.0, -1.0, -1.0],
        [1.0, 1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, -1.0, 1.0],
        [1.0, -1.0, 1.0],
        [1.0, 1.0, 1.0],
        [-1.0, 1.0, 1.0],
    ];
    // Two triangles per face, wound to face the cube's interior.
    const FACES: [[usize; 6]; 6] = [
        [1, 5, 6, 6, 2, 1], // +X
        [4, 0, 3, 3, 7, 4], // -X
        [3, 2, 6, 6, 7, 3], // +Y
        [4, 5, 1, 1, 0, 4], // -Y
        [5, 4, 7, 7, 6, 5], // +Z
        [0, 1, 2, 2, 3, 0], // -Z
    ];

    FACES
        .iter()
        .flatten()
        .map(|&corner| VertexPosition {
            position: CORNERS[corner],
        })
        .collect()
}

/// Two triangles covering clip space. Texture rows run top-down, so `v` is
/// 0 at the top edge.
pub fn screen_quad() -> [VertexPositionUv; 6] {
    const POSITIONS: [[f32; 2]; 6] = [
        [-1.0, 1.0],
        [-1.0, -1.0],
        [1.0, -1.0],
        [-1.0, 1.0],
        [1.0, -1.0],
        [1.0, 1.0],
    ];
    POSITIONS.map(|[x, y]| VertexPositionUv {
        position: [x, y],
        uv: [(x + 1.0) / 2.0, (1.0 - y) / 2.0],
    })
}
