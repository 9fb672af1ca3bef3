//! Rendering for the orrery: a recorded command model, the render target
//! sequencing built on it, and a wgpu executor that replays it.
//!
//! Frame logic only ever appends [`GpuCommand`]s to a [`CommandList`]. The
//! [`CommandExecutor`] turns that list into render passes, so the ordering
//! rules can be tested without a GPU.

pub mod buffer;
pub mod camera;
pub mod command;
pub mod depth;
pub mod error;
pub mod executor;
pub mod gpu;
pub mod mesh;
pub mod pass;
pub mod pipeline;
pub mod programs;
pub mod render_target;
pub mod resources;
pub mod shader;
pub mod skybox;
pub mod targets;
pub mod texture;
pub mod uniforms;

pub use buffer::{
    BufferAllocator, IndexData, MeshBuffer, VertexLayoutKind, VertexPosition,
    VertexPositionNormalUv, VertexPositionUv,
};
pub use camera::Camera;
pub use command::{
    BoundProgram, ClearOp, CommandList, DepthCompare, GpuCommand, ProgramId, RenderTarget,
};
pub use depth::DepthBuffer;
pub use error::{ExecuteError, ResourceError};
pub use executor::{CommandExecutor, FrameSummary};
pub use gpu::{RenderContext, RenderContextError, SurfaceError, init_render_context_blocking};
pub use pass::{FrameEncoder, RenderPassBuilder};
pub use render_target::{
    FrameError, FramePhase, RenderTargetManager, ShadowSettings, TargetHandles,
    cube_face_view_projections,
};
pub use resources::{GpuResources, TextureBindingKind};
pub use shader::{ShaderError, ShaderLibrary};
pub use skybox::Skybox;
pub use targets::{RenderTargets, clamp_target_size, validate_target_size};
pub use texture::{AtlasEntry, CubemapFaces, load_cubemap_faces, load_rgba, scan_texture_atlas};
