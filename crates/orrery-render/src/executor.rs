//! Replays a [`CommandList`] with wgpu.
//!
//! Execution happens in two steps. Planning walks the commands the way a
//! stateful graphics API would (current target, depth state, program,
//! texture slots, uniforms) and produces a list of passes with fully
//! resolved draws. Encoding then turns each pass into a wgpu render pass.
//! Planning touches no GPU objects, so its rules are unit tested directly.

use std::collections::HashMap;
use std::num::NonZeroU64;

use orrery_scene::{MeshHandle, TextureHandle};

use crate::buffer::VertexLayoutKind;
use crate::command::{ClearOp, CommandList, DepthCompare, GpuCommand, ProgramId, RenderTarget};
use crate::error::ExecuteError;
use crate::pass::{FrameEncoder, RenderPassBuilder};
use crate::pipeline::{PipelineCache, PipelineKey, ProgramLayout};
use crate::resources::{GpuResources, TextureBindingKind};
use crate::targets::RenderTargets;
use crate::uniforms::UniformStaging;

const INITIAL_UNIFORM_CAPACITY: u64 = 64 * 1024;

/// What one call to [`CommandExecutor::execute`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameSummary {
    /// Render passes encoded; the shadow cubemap counts once per face.
    pub passes: usize,
    pub draws: usize,
    pub presented: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DrawCall {
    Indexed,
    Arrays { first: u32, count: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct DrawPlan {
    pub pipeline: PipelineKey,
    pub uniform_offset: Option<u32>,
    /// Bind group index, requested texture, and the kind the group expects.
    pub textures: Vec<(u32, Option<TextureHandle>, TextureBindingKind)>,
    pub mesh: MeshHandle,
    pub call: DrawCall,
    pub viewport: Option<(u32, u32)>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PassPlan {
    pub target: RenderTarget,
    pub clear: ClearOp,
    pub draws: Vec<DrawPlan>,
}

impl PassPlan {
    fn new(target: RenderTarget) -> Self {
        Self {
            target,
            clear: ClearOp::default(),
            draws: Vec::new(),
        }
    }

    fn is_noop(&self) -> bool {
        self.draws.is_empty() && self.clear == ClearOp::default()
    }
}

#[derive(Debug, Default)]
pub(crate) struct FramePlan {
    pub passes: Vec<PassPlan>,
    pub uniform_data: Vec<u8>,
    pub presented: bool,
}

impl FramePlan {
    pub fn draw_count(&self) -> usize {
        self.passes.iter().map(|pass| pass.draws.len()).sum()
    }
}

/// Everything planning needs to know about the GPU side.
pub(crate) struct PlanContext<'a> {
    pub uniform_alignment: u64,
    pub mesh_layout: &'a dyn Fn(MeshHandle) -> Option<VertexLayoutKind>,
    pub has_shadow_target: bool,
}

fn has_depth_attachment(target: RenderTarget) -> bool {
    !matches!(target, RenderTarget::Screen)
}

/// Walk `commands` and resolve every draw.
///
/// The screen is bound until the first `BindTarget`. A `Clear` before any
/// draw in a pass becomes that pass's load op; after a draw it starts a new
/// pass on the same target. Uniform values persist in `staging` across
/// frames, per program.
pub(crate) fn plan_frame(
    commands: &[GpuCommand],
    staging: &mut UniformStaging,
    ctx: &PlanContext<'_>,
) -> Result<FramePlan, ExecuteError> {
    let mut plan = FramePlan::default();
    let mut pass = PassPlan::new(RenderTarget::Screen);
    let mut depth_test = false;
    let mut depth_func = DepthCompare::Less;
    let mut viewport = None;
    let mut program: Option<ProgramId> = None;
    let mut slots: HashMap<u32, TextureHandle> = HashMap::new();

    for command in commands {
        match command {
            GpuCommand::BindTarget(target) => {
                if *target == RenderTarget::ShadowCubemap && !ctx.has_shadow_target {
                    return Err(ExecuteError::MissingTarget(*target));
                }
                let finished = std::mem::replace(&mut pass, PassPlan::new(*target));
                plan.passes.push(finished);
                viewport = None;
            }
            GpuCommand::Viewport { width, height } => viewport = Some((*width, *height)),
            GpuCommand::DepthTest(enabled) => depth_test = *enabled,
            GpuCommand::DepthFunc(compare) => depth_func = *compare,
            GpuCommand::Clear(op) => {
                if !pass.draws.is_empty() {
                    let target = pass.target;
                    let finished = std::mem::replace(&mut pass, PassPlan::new(target));
                    plan.passes.push(finished);
                }
                pass.clear.color = op.color.or(pass.clear.color);
                pass.clear.depth = op.depth.or(pass.clear.depth);
            }
            GpuCommand::UseProgram(id) => program = Some(*id),
            GpuCommand::SetUniform { name, value } => {
                let Some(id) = program else {
                    return Err(ExecuteError::NoProgram);
                };
                if let Err(err) = staging.apply(id, name, *value) {
                    log::warn!("Ignoring uniform: {err}");
                }
            }
            GpuCommand::BindTexture { slot, texture } => {
                slots.insert(*slot, *texture);
            }
            GpuCommand::UnbindTexture { slot } => {
                slots.remove(slot);
            }
            GpuCommand::DrawIndexed { mesh } | GpuCommand::DrawArrays { mesh, .. } => {
                let id = program.ok_or(ExecuteError::NoProgram)?;
                let layout = (ctx.mesh_layout)(*mesh).ok_or(ExecuteError::UnknownMesh(*mesh))?;
                if layout != VertexLayoutKind::for_program(id) {
                    return Err(ExecuteError::LayoutMismatch {
                        program: id,
                        mesh: *mesh,
                    });
                }

                let program_layout = ProgramLayout::of(id);
                let uniform_offset = program_layout
                    .uniforms
                    .then(|| push_uniforms(&mut plan.uniform_data, staging.bytes(id), ctx.uniform_alignment));
                let textures = program_layout
                    .textures
                    .iter()
                    .map(|input| (input.group, slots.get(&input.slot).copied(), input.kind))
                    .collect();
                let depth = (depth_test && has_depth_attachment(pass.target)).then_some(depth_func);
                let call = match command {
                    GpuCommand::DrawArrays { first, count, .. } => DrawCall::Arrays {
                        first: *first,
                        count: *count,
                    },
                    _ => DrawCall::Indexed,
                };

                pass.draws.push(DrawPlan {
                    pipeline: PipelineKey {
                        program: id,
                        target: pass.target,
                        depth,
                    },
                    uniform_offset,
                    textures,
                    mesh: *mesh,
                    call,
                    viewport,
                });
            }
            GpuCommand::Present => plan.presented = true,
        }
    }

    plan.passes.push(pass);
    plan.passes.retain(|pass| !pass.is_noop());
    Ok(plan)
}

/// Append `bytes` at the next aligned offset and return that offset.
fn push_uniforms(data: &mut Vec<u8>, bytes: &[u8], alignment: u64) -> u32 {
    let alignment = alignment.max(1) as usize;
    let offset = data.len().div_ceil(alignment) * alignment;
    data.resize(offset, 0);
    data.extend_from_slice(bytes);
    offset as u32
}

/// One uniform buffer shared by every draw of a frame, bound with dynamic
/// offsets.
struct UniformArena {
    buffer: wgpu::Buffer,
    capacity: u64,
    bind_groups: HashMap<ProgramId, wgpu::BindGroup>,
}

impl UniformArena {
    fn new(resources: &GpuResources, capacity: u64) -> Self {
        let buffer = resources.device().create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniform-arena"),
            size: capacity,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_groups = ProgramId::ALL
            .into_iter()
            .filter_map(|program| {
                let size = NonZeroU64::new(UniformStaging::block_size(program))?;
                let group = resources.device().create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(program.label()),
                    layout: resources.uniform_layout(),
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer: &buffer,
                            offset: 0,
                            size: Some(size),
                        }),
                    }],
                });
                Some((program, group))
            })
            .collect();

        Self {
            buffer,
            capacity,
            bind_groups,
        }
    }

    fn upload(&mut self, resources: &GpuResources, data: &[u8]) {
        let needed = data.len() as u64;
        if needed > self.capacity {
            let capacity = needed.next_power_of_two();
            log::debug!("Growing uniform arena to {capacity} bytes");
            *self = Self::new(resources, capacity);
        }
        if !data.is_empty() {
            resources.queue().write_buffer(&self.buffer, 0, data);
        }
    }
}

pub struct CommandExecutor {
    pipelines: PipelineCache,
    staging: UniformStaging,
    arena: UniformArena,
    uniform_alignment: u64,
}

impl CommandExecutor {
    pub fn new(resources: &GpuResources, surface_format: wgpu::TextureFormat) -> Self {
        let uniform_alignment =
            u64::from(resources.device().limits().min_uniform_buffer_offset_alignment);
        Self {
            pipelines: PipelineCache::new(resources, surface_format),
            staging: UniformStaging::new(),
            arena: UniformArena::new(resources, INITIAL_UNIFORM_CAPACITY),
            uniform_alignment,
        }
    }

    /// Encode `commands` into `frame`. The frame is submitted and presented
    /// if the list ends its frame with `Present`, and discarded otherwise
    /// or on error.
    pub fn execute(
        &mut self,
        resources: &GpuResources,
        targets: &RenderTargets,
        mut frame: FrameEncoder,
        commands: &CommandList,
    ) -> Result<FrameSummary, ExecuteError> {
        let mesh_layout = |mesh: MeshHandle| resources.mesh(mesh).map(|m| m.layout);
        let ctx = PlanContext {
            uniform_alignment: self.uniform_alignment,
            mesh_layout: &mesh_layout,
            has_shadow_target: targets.shadow_face_views().is_some(),
        };
        let plan = plan_frame(commands.commands(), &mut self.staging, &ctx)?;

        for pass in &plan.passes {
            for draw in &pass.draws {
                if let Err(err) = self.pipelines.prepare(resources.device(), draw.pipeline) {
                    log::error!("Cannot build pipeline {:?}: {err}", draw.pipeline);
                }
            }
        }
        self.arena.upload(resources, &plan.uniform_data);

        let mut summary = FrameSummary {
            draws: plan.draw_count(),
            ..FrameSummary::default()
        };
        let Some((encoder, screen_view)) = frame.parts() else {
            return Ok(summary);
        };

        for pass in &plan.passes {
            match pass.target {
                RenderTarget::Screen => {
                    let builder = pass_builder(pass, "screen", false);
                    let mut rpass = builder.begin(encoder, Some(screen_view), None);
                    let size = targets.size();
                    self.replay(&mut rpass, resources, &pass.draws, size, 0);
                    summary.passes += 1;
                }
                RenderTarget::Offscreen => {
                    let builder = pass_builder(pass, "offscreen", targets.depth().has_stencil());
                    let mut rpass = builder.begin(
                        encoder,
                        Some(targets.color_view()),
                        Some(&targets.depth().view),
                    );
                    self.replay(&mut rpass, resources, &pass.draws, targets.size(), 0);
                    summary.passes += 1;
                }
                RenderTarget::ShadowCubemap => {
                    let (Some(faces), Some(resolution)) =
                        (targets.shadow_face_views(), targets.shadow_resolution())
                    else {
                        return Err(ExecuteError::MissingTarget(RenderTarget::ShadowCubemap));
                    };
                    let builder = pass_builder(pass, "shadow-face", false);
                    for (face, view) in faces.iter().enumerate() {
                        let mut rpass = builder.begin(encoder, None, Some(view));
                        self.replay(
                            &mut rpass,
                            resources,
                            &pass.draws,
                            (resolution, resolution),
                            face as u32,
                        );
                        summary.passes += 1;
                    }
                }
            }
        }

        if plan.presented {
            frame.submit();
            summary.presented = true;
        }
        Ok(summary)
    }

    fn replay(
        &self,
        rpass: &mut wgpu::RenderPass<'_>,
        resources: &GpuResources,
        draws: &[DrawPlan],
        target_size: (u32, u32),
        instance: u32,
    ) {
        for draw in draws {
            let (Some(pipeline), Some(mesh)) =
                (self.pipelines.get(&draw.pipeline), resources.mesh(draw.mesh))
            else {
                continue;
            };

            let (width, height) = draw.viewport.unwrap_or(target_size);
            let width = width.clamp(1, target_size.0.max(1));
            let height = height.clamp(1, target_size.1.max(1));
            rpass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);

            rpass.set_pipeline(pipeline);
            if let (Some(offset), Some(group)) = (
                draw.uniform_offset,
                self.arena.bind_groups.get(&draw.pipeline.program),
            ) {
                rpass.set_bind_group(0, group, &[offset]);
            }
            for (group, texture, kind) in &draw.textures {
                rpass.set_bind_group(*group, resources.texture_bind_group(*texture, *kind), &[]);
            }

            mesh.bind(rpass);
            let instances = instance..instance + 1;
            match (draw.call, mesh.index_count()) {
                (DrawCall::Indexed, Some(count)) => rpass.draw_indexed(0..count, 0, instances),
                (DrawCall::Indexed, None) => rpass.draw(0..mesh.vertex_count, instances),
                (DrawCall::Arrays { first, count }, _) => {
                    let end = (first + count).min(mesh.vertex_count);
                    rpass.draw(first.min(end)..end, instances);
                }
            }
        }
    }
}

fn pass_builder(pass: &PassPlan, label: &'static str, stencil: bool) -> RenderPassBuilder {
    let mut builder = RenderPassBuilder::new().label(label).with_stencil(stencil);
    if let Some([r, g, b, a]) = pass.clear.color {
        builder = builder.clear_color(wgpu::Color {
            r: f64::from(r),
            g: f64::from(g),
            b: f64::from(b),
            a: f64::from(a),
        });
    }
    if let Some(depth) = pass.clear.depth {
        builder = builder.clear_depth(depth);
    }
    builder
}
