//! Configuration for the orrery demo.
//!
//! Settings persist to disk as a RON file next to the user's other
//! application config and can be overridden from the command line.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    AssetConfig, CameraConfig, Config, DebugConfig, LightConfig, RenderConfig, SceneConfig,
    WindowConfig,
};
pub use error::ConfigError;
