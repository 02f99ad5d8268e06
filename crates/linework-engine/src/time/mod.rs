//! Frame timing.
//!
//! One `FrameClock` per render loop; call `tick()` once per frame to obtain
//! the clamped delta used by time-based input such as keyboard panning.

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTime};
