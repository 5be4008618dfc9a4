//! Time subsystem.
//!
//! Frame timing without coupling to the runtime:
//! - one `FrameClock` per render loop, ticked once per host refresh, gives
//!   the monotonic timestamp handed to the controller
//! - `FrameScheduler` decides whether a refresh actually draws

mod frame_clock;
mod scheduler;

pub use frame_clock::{FrameClock, FrameTime};
pub use scheduler::{FrameRate, FrameScheduler};
