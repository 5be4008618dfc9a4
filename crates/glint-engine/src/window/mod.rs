//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, and drives a shader pipeline in it.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeControl, RuntimeHooks};
