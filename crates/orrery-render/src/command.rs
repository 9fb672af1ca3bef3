//! Recorded GPU commands.
//!
//! Frame logic never talks to wgpu directly. It appends [`GpuCommand`]s to a
//! [`CommandList`], which the [`CommandExecutor`](crate::CommandExecutor)
//! later turns into render passes. Tests inspect the list instead of a GPU.

use orrery_scene::{MeshHandle, ShaderContext, TextureHandle, UniformValue};

/// Where subsequent draws land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderTarget {
    /// The window's surface.
    Screen,
    /// The offscreen color + depth target.
    Offscreen,
    /// All six faces of the shadow depth cubemap.
    ShadowCubemap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DepthCompare {
    #[default]
    Less,
    LessEqual,
}

impl DepthCompare {
    pub fn to_wgpu(self) -> wgpu::CompareFunction {
        match self {
            DepthCompare::Less => wgpu::CompareFunction::Less,
            DepthCompare::LessEqual => wgpu::CompareFunction::LessEqual,
        }
    }
}

/// The fixed set of programs the executor knows how to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramId {
    Planet,
    ShadowDepth,
    Skybox,
    Composite,
}

impl ProgramId {
    pub const ALL: [ProgramId; 4] = [
        ProgramId::Planet,
        ProgramId::ShadowDepth,
        ProgramId::Skybox,
        ProgramId::Composite,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ProgramId::Planet => "planet",
            ProgramId::ShadowDepth => "shadow-depth",
            ProgramId::Skybox => "skybox",
            ProgramId::Composite => "composite",
        }
    }
}

/// Buffers to clear. `None` leaves that buffer's contents alone.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClearOp {
    pub color: Option<[f32; 4]>,
    pub depth: Option<f32>,
}

impl ClearOp {
    pub fn color_and_depth(color: [f32; 4]) -> Self {
        Self {
            color: Some(color),
            depth: Some(1.0),
        }
    }

    pub fn depth_only() -> Self {
        Self {
            color: None,
            depth: Some(1.0),
        }
    }

    pub fn color_only(color: [f32; 4]) -> Self {
        Self {
            color: Some(color),
            depth: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GpuCommand {
    BindTarget(RenderTarget),
    Viewport { width: u32, height: u32 },
    DepthTest(bool),
    DepthFunc(DepthCompare),
    Clear(ClearOp),
    UseProgram(ProgramId),
    SetUniform { name: String, value: UniformValue },
    BindTexture { slot: u32, texture: TextureHandle },
    UnbindTexture { slot: u32 },
    DrawIndexed { mesh: MeshHandle },
    DrawArrays { mesh: MeshHandle, first: u32, count: u32 },
    Present,
}

impl GpuCommand {
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            GpuCommand::DrawIndexed { .. } | GpuCommand::DrawArrays { .. }
        )
    }
}

/// An append-only recording of one frame's GPU work.
#[derive(Debug, Default, Clone)]
pub struct CommandList {
    commands: Vec<GpuCommand>,
}

impl CommandList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, command: GpuCommand) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[GpuCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Drop everything recorded so far, keeping the allocation.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Drop everything recorded after `len` commands.
    pub fn truncate(&mut self, len: usize) {
        self.commands.truncate(len);
    }

    pub fn bind_target(&mut self, target: RenderTarget) {
        self.push(GpuCommand::BindTarget(target));
    }

    pub fn viewport(&mut self, width: u32, height: u32) {
        self.push(GpuCommand::Viewport { width, height });
    }

    pub fn depth_test(&mut self, enabled: bool) {
        self.push(GpuCommand::DepthTest(enabled));
    }

    pub fn depth_func(&mut self, compare: DepthCompare) {
        self.push(GpuCommand::DepthFunc(compare));
    }

    pub fn clear_buffers(&mut self, op: ClearOp) {
        self.push(GpuCommand::Clear(op));
    }

    /// Activate `program`; the returned context records uniforms and draws
    /// against it.
    pub fn use_program(&mut self, program: ProgramId) -> BoundProgram<'_> {
        self.push(GpuCommand::UseProgram(program));
        BoundProgram {
            list: self,
            program,
        }
    }

    pub fn present(&mut self) {
        self.push(GpuCommand::Present);
    }

    /// Index of the last draw command, if any.
    pub fn last_draw(&self) -> Option<usize> {
        self.commands.iter().rposition(GpuCommand::is_draw)
    }
}

/// A [`ShaderContext`] that records into a [`CommandList`].
pub struct BoundProgram<'a> {
    list: &'a mut CommandList,
    program: ProgramId,
}

impl BoundProgram<'_> {
    pub fn program(&self) -> ProgramId {
        self.program
    }

    /// Draw `count` vertices of a non-indexed mesh starting at `first`.
    pub fn draw_arrays(&mut self, mesh: MeshHandle, first: u32, count: u32) {
        self.list.push(GpuCommand::DrawArrays { mesh, first, count });
    }

    pub fn depth_func(&mut self, compare: DepthCompare) {
        self.list.depth_func(compare);
    }
}

impl ShaderContext for BoundProgram<'_> {
    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        self.list.push(GpuCommand::SetUniform {
            name: name.to_string(),
            value,
        });
    }

    fn bind_texture(&mut self, slot: u32, texture: TextureHandle) {
        self.list.push(GpuCommand::BindTexture { slot, texture });
    }

    fn unbind_texture(&mut self, slot: u32) {
        self.list.push(GpuCommand::UnbindTexture { slot });
    }

    fn draw_indexed(&mut self, mesh: MeshHandle) {
        self.list.push(GpuCommand::DrawIndexed { mesh });
    }
}
