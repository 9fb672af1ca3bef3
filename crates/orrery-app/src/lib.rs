//! The orrery solar-system demo: scene assembly, per-frame recording, fly
//! controls and the winit application that ties them to the GPU.

pub mod controls;
pub mod error;
pub mod frame;
pub mod frame_clock;
pub mod hud;
pub mod platform;
pub mod renderer;
pub mod solar_system;
pub mod window;

pub use error::AppError;
pub use window::run;
