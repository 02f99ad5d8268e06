use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Unrecoverable rendering failures.
///
/// Stale or suboptimal surfaces are not errors; they are absorbed by swapchain
/// recreation inside the frame scheduler and never reach this type.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to read shader `{}`", path.display())]
    ShaderLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,

    #[error("vertex stream of {requested} bytes exceeds the device buffer limit of {limit} bytes")]
    BufferTooLarge { requested: u64, limit: u64 },

    #[error("waiting on GPU work failed (timeout {timeout:?})")]
    GpuWait {
        timeout: Duration,
        #[source]
        source: wgpu::PollError,
    },

    #[error("surface acquisition timed out {attempts} times in a row")]
    AcquireTimeout { attempts: u32 },

    #[error("surface error")]
    Surface(#[source] wgpu::SurfaceError),
}
