use orrery_config::ConfigError;
use orrery_render::{RenderContextError, ResourceError};
use orrery_scene::SceneError;

use crate::platform::PlatformError;

/// Anything that stops the demo from starting or keeps it from running.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("window creation failed: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("GPU initialization failed: {0}")]
    Gpu(#[from] RenderContextError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error("scene assembly failed: {0}")]
    Scene(#[from] SceneError),
}
