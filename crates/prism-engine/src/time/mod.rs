//! Frame timing for the window runtime.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
