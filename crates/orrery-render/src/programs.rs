//! WGSL sources for the four programs.
//!
//! Uniform block layouts mirror the structs in [`crate::uniforms`].

use crate::command::ProgramId;

pub fn source(program: ProgramId) -> &'static str {
    match program {
        ProgramId::Planet => PLANET_SHADER_SOURCE,
        ProgramId::ShadowDepth => SHADOW_SHADER_SOURCE,
        ProgramId::Skybox => SKYBOX_SHADER_SOURCE,
        ProgramId::Composite => COMPOSITE_SHADER_SOURCE,
    }
}

/// Blinn-Phong with a single attenuated point light at the sun.
///
/// Bind groups: 0 uniforms, 1 diffuse map, 2 shadow cubemap.
pub const PLANET_SHADER_SOURCE: &str = r#"
struct PlanetUniforms {
    model: mat4x4<f32>,
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    view_pos: vec4<f32>,
    light_position: vec4<f32>,
    // ambient, diffuse, constant, linear
    light: vec4<f32>,
    // quadratic, shininess, far_plane, unused
    material: vec4<f32>,
    // is_sun, shadows
    flags: vec4<u32>,
};

@group(0) @binding(0) var<uniform> u: PlanetUniforms;
@group(1) @binding(0) var diffuse_map: texture_2d<f32>;
@group(1) @binding(1) var diffuse_sampler: sampler;
@group(2) @binding(0) var shadow_map: texture_depth_cube;
@group(2) @binding(1) var shadow_sampler: sampler_comparison;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) world: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    let world = u.model * vec4<f32>(in.position, 1.0);
    var out: VertexOutput;
    out.clip = u.projection * u.view * world;
    out.world = world.xyz;
    // Bodies are scaled uniformly, so the model matrix keeps normals valid.
    out.normal = (u.model * vec4<f32>(in.normal, 0.0)).xyz;
    out.uv = in.uv;
    return out;
}

const SHADOW_BIAS: f32 = 0.005;
const SPECULAR_STRENGTH: f32 = 0.2;

fn lit_fraction(world: vec3<f32>) -> f32 {
    let from_light = world - u.light_position.xyz;
    let depth = length(from_light) / u.material.z;
    return textureSampleCompareLevel(shadow_map, shadow_sampler, from_light, depth - SHADOW_BIAS);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let albedo = textureSample(diffuse_map, diffuse_sampler, in.uv).rgb;
    if (u.flags.x != 0u) {
        return vec4<f32>(albedo, 1.0);
    }

    let to_light = u.light_position.xyz - in.world;
    let distance = length(to_light);
    let l = to_light / max(distance, 1e-4);
    let n = normalize(in.normal);
    let v = normalize(u.view_pos.xyz - in.world);
    let h = normalize(l + v);

    let attenuation = 1.0 / (u.light.z + u.light.w * distance + u.material.x * distance * distance);
    let diffuse = u.light.y * max(dot(n, l), 0.0);
    let specular = SPECULAR_STRENGTH * pow(max(dot(n, h), 0.0), u.material.y);

    var lit = 1.0;
    if (u.flags.y != 0u) {
        lit = lit_fraction(in.world);
    }

    let color = albedo * (u.light.x + lit * attenuation * diffuse) + vec3<f32>(lit * attenuation * specular);
    return vec4<f32>(color, 1.0);
}
"#;

/// Depth-only pass into one cubemap face per instance. Stores distance to
/// the light over the far plane.
pub const SHADOW_SHADER_SOURCE: &str = r#"
struct ShadowUniforms {
    model: mat4x4<f32>,
    faces: array<mat4x4<f32>, 6>,
    // xyz light position, w far plane
    light: vec4<f32>,
    // is_sun
    flags: vec4<u32>,
};

@group(0) @binding(0) var<uniform> u: ShadowUniforms;

struct VertexOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) world: vec3<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>, @builtin(instance_index) face: u32) -> VertexOutput {
    let world = u.model * vec4<f32>(position, 1.0);
    var out: VertexOutput;
    out.clip = u.faces[face] * world;
    out.world = world.xyz;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @builtin(frag_depth) f32 {
    if (u.flags.x != 0u) {
        discard;
    }
    return length(in.world - u.light.xyz) / u.light.w;
}
"#;

/// The sky cube, pinned to the far plane.
pub const SKYBOX_SHADER_SOURCE: &str = r#"
struct SkyboxUniforms {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
};

@group(0) @binding(0) var<uniform> u: SkyboxUniforms;
@group(1) @binding(0) var sky: texture_cube<f32>;
@group(1) @binding(1) var sky_sampler: sampler;

struct VertexOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) direction: vec3<f32>,
};

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> VertexOutput {
    let clip = u.projection * u.view * vec4<f32>(position, 1.0);
    var out: VertexOutput;
    // z = w puts every fragment at depth 1.0.
    out.clip = clip.xyww;
    out.direction = position;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(sky, sky_sampler, in.direction);
}
"#;

pub const COMPOSITE_SHADER_SOURCE: &str = r#"
@group(0) @binding(0) var scene: texture_2d<f32>;
@group(0) @binding(1) var scene_sampler: sampler;

struct VertexOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@location(0) position: vec2<f32>, @location(1) uv: vec2<f32>) -> VertexOutput {
    var out: VertexOutput;
    out.clip = vec4<f32>(position, 0.0, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(scene, scene_sampler, in.uv);
}
"#;
