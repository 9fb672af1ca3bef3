//! Resource and execution errors.

use std::path::PathBuf;

use orrery_scene::MeshHandle;

use crate::command::{ProgramId, RenderTarget};

/// A GPU resource could not be created from its inputs.
///
/// Callers choose between aborting startup and degrading to a fallback;
/// nothing in this crate retries.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("failed to load image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cubemap face {face} ({path}) is {width}x{height}, expected {size}x{size}")]
    CubemapFaceSize {
        face: usize,
        path: PathBuf,
        width: u32,
        height: u32,
        size: u32,
    },

    #[error("render target {width}x{height} is incomplete (each side must be 1..={max})")]
    IncompleteTarget { width: u32, height: u32, max: u32 },
}

/// A recorded command list could not be replayed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecuteError {
    #[error("draw recorded with no program in use")]
    NoProgram,

    #[error("mesh {0:?} is not registered")]
    UnknownMesh(MeshHandle),

    #[error("{program:?} cannot draw mesh {mesh:?}: vertex layout mismatch")]
    LayoutMismatch { program: ProgramId, mesh: MeshHandle },

    #[error("{0:?} target is not allocated")]
    MissingTarget(RenderTarget),
}
