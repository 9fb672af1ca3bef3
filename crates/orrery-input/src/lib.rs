//! Keyboard and mouse state, and the per-frame [`InputSnapshot`] handed to
//! the frame update so nothing downstream reads window events directly.

pub mod keyboard;
pub mod mouse;
pub mod snapshot;

pub use keyboard::{KeyboardState, RawKeyEvent};
pub use mouse::MouseState;
pub use snapshot::InputSnapshot;
