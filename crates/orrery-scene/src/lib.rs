//! Planetoid scene graph: orbit/spin transform composition and
//! parent-before-child traversal.
//!
//! Nothing here touches the GPU. Rendering goes through the
//! [`ShaderContext`] and [`Drawable`] seams, so the whole state machine can
//! be driven and inspected in tests.

pub mod error;
pub mod graph;
pub mod handle;
pub mod planetoid;
pub mod shader;

pub use error::SceneError;
pub use graph::{NodeId, SceneGraph};
pub use handle::{IndexedMesh, MeshHandle, Texture, TextureHandle, TextureKind, TextureSet};
pub use planetoid::{OrbitParams, Planetoid};
pub use shader::{Drawable, ShaderContext, UniformValue, uniforms};
