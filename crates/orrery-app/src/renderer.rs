//! Everything that lives on the GPU: context, resources, targets, the scene
//! that references them, and the executor that draws it.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use orrery_config::Config;
use orrery_render::mesh::{MeshData, ring, uv_sphere};
use orrery_render::{
    CommandExecutor, CommandList, FrameEncoder, FrameSummary, GpuResources, IndexData,
    RenderContext, RenderTargetManager, RenderTargets, ResourceError, ShadowSettings, Skybox,
    SurfaceError, VertexLayoutKind, VertexPositionNormalUv, clamp_target_size,
    init_render_context_blocking, scan_texture_atlas, validate_target_size,
};
use orrery_scene::{MeshHandle, NodeId, SceneGraph, TextureSet};
use tracing::{debug, error, info, warn};
use winit::window::Window;

use crate::error::AppError;
use crate::solar_system::{BodyMeshes, SUN, build_solar_system};

const SPHERE_SECTORS: u32 = 48;
const SPHERE_STACKS: u32 = 24;
const ROCK_SECTORS: u32 = 8;
const ROCK_STACKS: u32 = 6;
/// Ring radii in model units, before the body's `size` scale.
const RING_INNER: f32 = 0.55;
const RING_OUTER: f32 = 1.0;
const RING_SEGMENTS: u32 = 96;

pub struct Renderer {
    pub context: RenderContext,
    pub resources: GpuResources,
    pub targets: RenderTargets,
    pub manager: RenderTargetManager,
    pub executor: CommandExecutor,
    pub scene: SceneGraph,
    pub skybox: Skybox,
    pub sun: Option<NodeId>,
    strict: bool,
}

impl Renderer {
    pub fn new(window: Arc<Window>, config: &Config) -> Result<Self, AppError> {
        let strict = config.render.strict_resources;
        let context = init_render_context_blocking(window, config.window.vsync)?;
        info!(
            "GPU ready: {} ({:?}), surface {:?}",
            context.adapter.get_info().name,
            context.adapter.get_info().backend,
            context.surface_format
        );

        let mut resources = GpuResources::new(context.device.clone(), context.queue.clone());
        let (width, height) = target_size(context.size(), context.max_texture_dimension(), strict)?;
        let shadow_resolution = shadow_resolution(
            config.render.shadows.then_some(config.render.shadow_resolution),
            context.max_texture_dimension(),
            strict,
        )?;
        let targets = RenderTargets::new(&mut resources, width, height, shadow_resolution)?;
        let manager = RenderTargetManager::new(
            width,
            height,
            targets.handles(),
            shadow_resolution.map(|resolution| ShadowSettings {
                resolution,
                near: config.render.shadow_near,
                far_plane: config.render.far_plane,
            }),
        );
        let executor = CommandExecutor::new(&resources, context.surface_format);

        let meshes = upload_body_meshes(&mut resources);
        let atlas = load_texture_atlas(&mut resources, &config.assets.planet_textures, strict)?;
        let scene = build_solar_system(&meshes, |name| {
            atlas.get(name).cloned().unwrap_or_else(|| {
                warn!("No textures for '{name}'");
                Arc::new(TextureSet::new())
            })
        })?;
        let skybox = Skybox::load(&mut resources, &config.assets.skybox_faces, strict)?;
        let sun = scene.find(SUN);

        Ok(Self {
            context,
            resources,
            targets,
            manager,
            executor,
            scene,
            skybox,
            sun,
            strict,
        })
    }

    /// Follow a new window size. A zero size (minimised) is ignored.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), AppError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.context.resize(width, height);
        let (width, height) =
            target_size((width, height), self.context.max_texture_dimension(), self.strict)?;
        self.targets.resize(&mut self.resources, width, height)?;
        if let Err(err) = self.manager.resize(width, height, self.targets.handles()) {
            warn!("Render target resize deferred: {err}");
        }
        debug!("Resized to {width}x{height}");
        Ok(())
    }

    /// Acquire the swapchain image and replay `commands` into it.
    pub fn submit(&mut self, commands: &CommandList) -> Option<FrameSummary> {
        let surface_texture = match self.context.get_current_texture() {
            Ok(texture) => texture,
            Err(SurfaceError::Timeout) => {
                debug!("Surface timeout, skipping frame");
                return None;
            }
            Err(err) => {
                error!("Cannot acquire surface texture: {err}");
                return None;
            }
        };
        let frame = FrameEncoder::new(
            &self.context.device,
            self.context.queue.clone(),
            surface_texture,
        );

        match self
            .executor
            .execute(&self.resources, &self.targets, frame, commands)
        {
            Ok(summary) => Some(summary),
            Err(err) => {
                error!("Frame execution failed: {err}");
                None
            }
        }
    }
}

/// The window size made usable as a render target, or the error if
/// `strict`.
fn target_size(size: (u32, u32), max: u32, strict: bool) -> Result<(u32, u32), ResourceError> {
    let (width, height) = size;
    match validate_target_size(width, height, max) {
        Ok(()) => Ok(size),
        Err(err) if strict => Err(err),
        Err(err) => {
            let clamped = clamp_target_size(width, height, max);
            warn!("{err}; using {}x{}", clamped.0, clamped.1);
            Ok(clamped)
        }
    }
}

/// The requested shadow cubemap edge, clamped to the device limit unless
/// `strict`.
fn shadow_resolution(
    requested: Option<u32>,
    max: u32,
    strict: bool,
) -> Result<Option<u32>, ResourceError> {
    requested
        .map(|resolution| target_size((resolution, resolution), max, strict).map(|(edge, _)| edge))
        .transpose()
}

fn upload_mesh(
    resources: &mut GpuResources,
    label: &str,
    mesh: &MeshData<VertexPositionNormalUv>,
) -> MeshHandle {
    resources.upload_mesh(
        label,
        &mesh.vertices,
        Some(IndexData::U32(&mesh.indices)),
        VertexLayoutKind::PositionNormalUv,
    )
}

fn upload_body_meshes(resources: &mut GpuResources) -> BodyMeshes {
    BodyMeshes {
        sphere: upload_mesh(resources, "sphere", &uv_sphere(SPHERE_SECTORS, SPHERE_STACKS)),
        rock: upload_mesh(resources, "rock", &uv_sphere(ROCK_SECTORS, ROCK_STACKS)),
        ring: upload_mesh(resources, "ring", &ring(RING_INNER, RING_OUTER, RING_SEGMENTS)),
    }
}

/// Upload every texture under `dir`, grouped by body name.
///
/// Textures that fail to decode are left out (the body then draws with the
/// white fallback), and an unreadable directory yields an empty atlas,
/// unless `strict`.
fn load_texture_atlas(
    resources: &mut GpuResources,
    dir: &Path,
    strict: bool,
) -> Result<HashMap<String, Arc<TextureSet>>, ResourceError> {
    let entries = match scan_texture_atlas(dir) {
        Ok(entries) => entries,
        Err(err) if !strict => {
            error!("Texture atlas failed to load: {err}");
            return Ok(HashMap::new());
        }
        Err(err) => return Err(err),
    };

    let mut atlas = HashMap::new();
    for entry in entries {
        let mut set = TextureSet::new();
        for (kind, path) in &entry.textures {
            match resources.load_texture_2d(path) {
                Ok(handle) => set.push(*kind, handle),
                Err(err) if !strict => error!("Texture failed to load: {err}"),
                Err(err) => return Err(err),
            }
        }
        debug!("Atlas '{}': {} textures", entry.name, set.len());
        atlas.insert(entry.name, Arc::new(set));
    }
    info!("Loaded textures for {} bodies from {}", atlas.len(), dir.display());
    Ok(atlas)
}
