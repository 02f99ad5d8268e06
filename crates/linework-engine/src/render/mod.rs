//! GPU rendering subsystem.
//!
//! The document is tessellated into a line list on the CPU, uploaded when the
//! scene is dirty, and drawn through a camera transform pushed as immediate
//! data. Frame pacing lives in [`FrameScheduler`]; everything that touches
//! wgpu sits behind [`FrameBackend`].
//!
//! Convention:
//! - Document geometry is in world units, +Y up.
//! - Overlay geometry is in physical pixels, top-left origin, +Y down.

mod camera;
mod ctx;
mod dirty;
mod error;
mod overlay;
mod pipeline;
mod renderer;
mod scheduler;
mod swapchain;
mod tessellate;
mod vertex;
mod vertex_buffer;

pub use camera::{view_projection, Camera, MAX_ZOOM, MIN_ZOOM};
pub use ctx::RenderCtx;
pub use dirty::DirtyFlags;
pub use error::RenderError;
pub use overlay::{Overlay, QuadOverlay, ScreenRect};
pub use pipeline::{load_shader, LinePipeline, VIEW_PROJ_BYTES};
pub use renderer::{PendingPresent, Renderer, RendererConfig, WgpuBackend, WgpuFrame, SHADER_DIR_ENV};
pub use scheduler::{
    Acquire, DrawParams, FrameBackend, FrameOutcome, FrameScheduler, FrameState, PresentStatus,
    FRAME_COUNT,
};
pub use swapchain::{Swapchain, SwapchainState};
pub use tessellate::{Tessellator, ARC_COLOR, CIRCLE_SEGMENTS, LINE_COLOR};
pub use vertex::Vertex;
pub use vertex_buffer::VertexBuffer;
