//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! Runtime code translates platform events into `InputEvent`s and feeds the
//! normalised pointer to the pipeline controller.

mod pointer;
mod state;
mod types;

pub(crate) mod platform;

pub use pointer::normalize_pointer;
pub use state::InputState;
pub use types::{InputEvent, Key, KeyState, Modifiers};
