//! Linework engine crate.
//!
//! GPU rendering of layered 2D line documents: document model, CPU
//! tessellation, a double-buffered frame scheduler over wgpu, and the
//! single-window runtime that drives it.

pub mod core;
pub mod device;
pub mod document;
pub mod input;
pub mod logging;
pub mod render;
pub mod time;
pub mod window;
