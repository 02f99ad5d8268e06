//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - surface format / alpha mode / extent selection
//! - classifying acquisition failures

mod gpu;
mod surface;

pub use gpu::{Gpu, GpuInit};
pub use surface::{
    choose_alpha_mode, choose_surface_format, clamp_extent, classify_surface_error,
    SurfaceErrorAction,
};
