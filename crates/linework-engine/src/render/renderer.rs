use std::path::{Path, PathBuf};
use std::time::Duration;

use glam::Vec2;
use winit::dpi::PhysicalSize;

use crate::device::{classify_surface_error, Gpu, GpuInit, SurfaceErrorAction};
use crate::document::Document;

use super::scheduler::{Acquire, DrawParams, FrameBackend, FrameOutcome, FrameScheduler, PresentStatus};
use super::swapchain::Swapchain;
use super::vertex_buffer::VertexBuffer;
use super::{Camera, DirtyFlags, Overlay, RenderCtx, RenderError, Vertex};

/// Environment variable that relocates the two line shaders.
pub const SHADER_DIR_ENV: &str = "LINEWORK_SHADER_DIR";

const VERTEX_SHADER_FILE: &str = "line.vert.wgsl";
const FRAGMENT_SHADER_FILE: &str = "line.frag.wgsl";

/// Renderer parameters.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
    pub clear_color: wgpu::Color,

    /// Upper bound on any blocking GPU wait; expiry is treated as device loss.
    pub fence_timeout: Duration,

    /// Consecutive acquire timeouts tolerated before giving up.
    pub max_acquire_timeouts: u32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self::with_shader_dir(concat!(env!("CARGO_MANIFEST_DIR"), "/shaders"))
    }
}

impl RendererConfig {
    /// Defaults with both shaders looked up in `dir`.
    pub fn with_shader_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            vertex_shader: dir.join(VERTEX_SHADER_FILE),
            fragment_shader: dir.join(FRAGMENT_SHADER_FILE),
            clear_color: wgpu::Color { r: 0.1, g: 0.1, b: 0.1, a: 1.0 },
            fence_timeout: Duration::from_secs(5),
            max_acquire_timeouts: 3,
        }
    }

    /// Defaults, honouring `LINEWORK_SHADER_DIR` when set.
    pub fn from_env() -> Self {
        match std::env::var_os(SHADER_DIR_ENV) {
            Some(dir) => Self::with_shader_dir(dir),
            None => Self::default(),
        }
    }
}

/// Acquired surface image with an open encoder.
pub struct WgpuFrame {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
}

/// Submitted surface image awaiting presentation.
pub struct PendingPresent {
    surface_texture: wgpu::SurfaceTexture,
}

/// [`FrameBackend`] over a wgpu device and surface.
///
/// Field order matters: GPU objects drop before the device that made them.
pub struct WgpuBackend<'w> {
    swapchain: Swapchain,
    vertices: VertexBuffer,
    config: RendererConfig,
    acquire_timeouts: u32,
    gpu: Gpu<'w>,
}

impl<'w> WgpuBackend<'w> {
    pub fn new(gpu: Gpu<'w>, init: GpuInit, config: RendererConfig) -> Result<Self, RenderError> {
        let swapchain = Swapchain::create(
            &gpu,
            init,
            config.vertex_shader.clone(),
            config.fragment_shader.clone(),
        )?;

        Ok(Self {
            swapchain,
            vertices: VertexBuffer::new(),
            config,
            acquire_timeouts: 0,
            gpu,
        })
    }

    pub fn gpu(&self) -> &Gpu<'w> {
        &self.gpu
    }

    pub fn swapchain(&self) -> &Swapchain {
        &self.swapchain
    }

    fn viewport(&self) -> Vec2 {
        let extent = self.swapchain.extent();
        Vec2::new(extent.width as f32, extent.height as f32)
    }
}

impl<'w> FrameBackend for WgpuBackend<'w> {
    type Fence = wgpu::SubmissionIndex;
    type Frame = WgpuFrame;
    type Presentable = PendingPresent;
    type Overlay = dyn Overlay;

    fn wait(&mut self, fence: wgpu::SubmissionIndex) -> Result<(), RenderError> {
        self.gpu.wait_for(fence, self.config.fence_timeout)
    }

    fn acquire(&mut self) -> Result<Acquire<WgpuFrame>, RenderError> {
        let surface_texture = match self.gpu.surface().get_current_texture() {
            Ok(t) => t,
            Err(err) => {
                if matches!(err, wgpu::SurfaceError::Timeout) {
                    self.acquire_timeouts += 1;
                }
                return match classify_surface_error(
                    &err,
                    self.acquire_timeouts,
                    self.config.max_acquire_timeouts,
                ) {
                    SurfaceErrorAction::Recreate => Ok(Acquire::Stale),
                    SurfaceErrorAction::Retry => {
                        log::warn!("surface acquire timed out ({} in a row)", self.acquire_timeouts);
                        Ok(Acquire::TimedOut)
                    }
                    SurfaceErrorAction::Fatal if matches!(err, wgpu::SurfaceError::Timeout) => {
                        Err(RenderError::AcquireTimeout { attempts: self.acquire_timeouts })
                    }
                    SurfaceErrorAction::Fatal => Err(RenderError::Surface(err)),
                };
            }
        };
        self.acquire_timeouts = 0;

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .gpu
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("linework frame encoder"),
            });

        Ok(Acquire::Ready(WgpuFrame {
            surface_texture,
            view,
            encoder,
        }))
    }

    fn upload(&mut self, vertices: &[Vertex]) -> Result<(), RenderError> {
        self.vertices
            .upload(self.gpu.device(), self.gpu.queue(), vertices)
    }

    fn record(
        &mut self,
        frame: &mut WgpuFrame,
        params: &DrawParams,
        mut overlay: Option<&mut Self::Overlay>,
    ) -> Result<(), RenderError> {
        if let (Some(overlay), Some(format)) = (overlay.as_deref_mut(), self.swapchain.format()) {
            let ctx = RenderCtx::new(self.gpu.device(), self.gpu.queue(), format, self.viewport());
            overlay.prepare(&ctx);
        }

        let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("linework document pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &frame.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.config.clear_color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        if let (Some(state), Some(buffer)) = (self.swapchain.state(), self.vertices.buffer()) {
            if params.vertex_count > 0 {
                rpass.set_pipeline(&state.line.pipeline);
                rpass.set_vertex_buffer(0, buffer.slice(..));
                rpass.set_immediates(0, bytemuck::bytes_of(&params.view_proj));
                rpass.draw(0..params.vertex_count, 0..1);
            }
        }

        if let Some(overlay) = overlay {
            overlay.paint(&mut rpass);
        }

        Ok(())
    }

    fn submit(&mut self, frame: WgpuFrame) -> Result<(wgpu::SubmissionIndex, PendingPresent), RenderError> {
        let WgpuFrame {
            surface_texture,
            view,
            encoder,
        } = frame;
        drop(view);

        let index = self.gpu.queue().submit(std::iter::once(encoder.finish()));
        Ok((index, PendingPresent { surface_texture }))
    }

    fn present(&mut self, image: PendingPresent) -> Result<PresentStatus, RenderError> {
        let suboptimal = image.surface_texture.suboptimal;
        self.gpu.window().pre_present_notify();
        image.surface_texture.present();

        Ok(if suboptimal {
            PresentStatus::Stale
        } else {
            PresentStatus::Presented
        })
    }

    fn recreate(&mut self) -> Result<(), RenderError> {
        self.swapchain.recreate(&self.gpu, self.config.fence_timeout)?;
        log::info!(
            "swapchain recreated: {}x{}",
            self.swapchain.extent().width,
            self.swapchain.extent().height
        );
        Ok(())
    }
}

/// What the next frame has to do before drawing.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum FrameGate {
    /// Zero-area surface: skip the frame without touching the GPU.
    Suspended,
    /// Rebuild the swapchain, then draw.
    Recreate,
    Render,
}

/// Tracks window size changes between frames.
///
/// A surface that went to zero area is always rebuilt once it comes back,
/// even at its previous extent.
#[derive(Debug, Default)]
pub(crate) struct ResizeState {
    suspended: bool,
    pending_recreate: bool,
}

impl ResizeState {
    pub(crate) fn on_resize(&mut self, size: PhysicalSize<u32>, extent: PhysicalSize<u32>) {
        if is_zero(size) {
            self.suspended = true;
            return;
        }
        if self.suspended || size != extent {
            self.suspended = false;
            self.pending_recreate = true;
        }
    }

    pub(crate) fn begin_frame(&mut self, framebuffer: PhysicalSize<u32>) -> FrameGate {
        if is_zero(framebuffer) {
            self.suspended = true;
            return FrameGate::Suspended;
        }
        if self.suspended {
            // Restored without a resize event.
            self.suspended = false;
            self.pending_recreate = true;
        }
        if std::mem::take(&mut self.pending_recreate) {
            FrameGate::Recreate
        } else {
            FrameGate::Render
        }
    }
}

fn is_zero(size: PhysicalSize<u32>) -> bool {
    size.width == 0 || size.height == 0
}

/// Window renderer: frame scheduler driving a [`WgpuBackend`].
pub struct Renderer<'w> {
    scheduler: FrameScheduler<wgpu::SubmissionIndex>,
    backend: WgpuBackend<'w>,
    resize: ResizeState,
}

impl<'w> Renderer<'w> {
    pub fn new(gpu: Gpu<'w>, init: GpuInit, config: RendererConfig) -> Result<Self, RenderError> {
        Ok(Self {
            scheduler: FrameScheduler::new(),
            backend: WgpuBackend::new(gpu, init, config)?,
            resize: ResizeState::default(),
        })
    }

    /// Renders `document` through `camera`, then `overlay` on top.
    ///
    /// Zero-sized windows are skipped without touching the GPU.
    pub fn render_frame(
        &mut self,
        document: &Document,
        camera: &Camera,
        overlay: Option<&mut (dyn Overlay + 'static)>,
    ) -> Result<FrameOutcome, RenderError> {
        match self.resize.begin_frame(self.backend.gpu().framebuffer_size()) {
            FrameGate::Suspended => return Ok(FrameOutcome::Suspended),
            FrameGate::Recreate => self.scheduler.recreate(&mut self.backend)?,
            FrameGate::Render => {}
        }

        self.scheduler
            .render_frame(&mut self.backend, document, camera, overlay)
    }

    /// Records a window resize.
    ///
    /// A zero size suspends rendering. The swapchain is rebuilt before the
    /// next frame when the extent changed or the window is coming back from
    /// zero size.
    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        if is_zero(size) {
            log::debug!("window minimized; rendering suspended");
        }
        self.resize.on_resize(size, self.backend.swapchain().extent());
    }

    pub fn dirty(&self) -> DirtyFlags {
        self.scheduler.dirty()
    }

    pub fn dirty_mut(&mut self) -> &mut DirtyFlags {
        self.scheduler.dirty_mut()
    }

    pub fn mark_scene_dirty(&mut self) {
        self.scheduler.dirty_mut().scene = true;
    }

    pub fn scheduler(&self) -> &FrameScheduler<wgpu::SubmissionIndex> {
        &self.scheduler
    }

    pub fn gpu(&self) -> &Gpu<'w> {
        self.backend.gpu()
    }

    /// Swapchain extent in physical pixels.
    pub fn viewport(&self) -> Vec2 {
        self.backend.viewport()
    }

    /// Blocks until all submitted GPU work has finished.
    pub fn wait_idle(&self) -> Result<(), RenderError> {
        self.backend.gpu().wait_idle(self.backend.config.fence_timeout)
    }
}

impl Drop for Renderer<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.wait_idle() {
            log::error!("GPU drain on shutdown failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HD: PhysicalSize<u32> = PhysicalSize::new(1280, 720);
    const ZERO: PhysicalSize<u32> = PhysicalSize::new(0, 0);

    #[test]
    fn restore_at_same_size_recreates() {
        let mut state = ResizeState::default();
        state.on_resize(ZERO, HD);
        assert_eq!(state.begin_frame(ZERO), FrameGate::Suspended);

        state.on_resize(HD, HD);
        assert_eq!(state.begin_frame(HD), FrameGate::Recreate);
        assert_eq!(state.begin_frame(HD), FrameGate::Render);
    }

    #[test]
    fn minimized_window_stays_suspended() {
        let mut state = ResizeState::default();
        state.on_resize(PhysicalSize::new(1280, 0), HD);
        assert_eq!(state.begin_frame(ZERO), FrameGate::Suspended);
        assert_eq!(state.begin_frame(ZERO), FrameGate::Suspended);
    }

    #[test]
    fn new_extent_recreates_once() {
        let mut state = ResizeState::default();
        state.on_resize(PhysicalSize::new(800, 600), HD);
        assert_eq!(state.begin_frame(PhysicalSize::new(800, 600)), FrameGate::Recreate);
        assert_eq!(state.begin_frame(PhysicalSize::new(800, 600)), FrameGate::Render);
    }

    #[test]
    fn same_extent_without_suspend_is_a_no_op() {
        let mut state = ResizeState::default();
        state.on_resize(HD, HD);
        assert_eq!(state.begin_frame(HD), FrameGate::Render);
    }

    #[test]
    fn restore_without_resize_event_recreates() {
        let mut state = ResizeState::default();
        assert_eq!(state.begin_frame(ZERO), FrameGate::Suspended);
        assert_eq!(state.begin_frame(HD), FrameGate::Recreate);
    }

    #[test]
    fn default_config_points_at_crate_shaders() {
        let config = RendererConfig::default();
        assert!(config.vertex_shader.ends_with("shaders/line.vert.wgsl"));
        assert!(config.fragment_shader.ends_with("shaders/line.frag.wgsl"));
        assert!(config.vertex_shader.exists());
        assert!(config.fragment_shader.exists());
    }

    #[test]
    fn shader_dir_relocates_both_files() {
        let config = RendererConfig::with_shader_dir("/opt/linework");
        assert_eq!(config.vertex_shader, Path::new("/opt/linework/line.vert.wgsl"));
        assert_eq!(config.fragment_shader, Path::new("/opt/linework/line.frag.wgsl"));
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = RendererConfig::default();
        assert_eq!(config.clear_color, wgpu::Color { r: 0.1, g: 0.1, b: 0.1, a: 1.0 });
        assert_eq!(config.fence_timeout, Duration::from_secs(5));
        assert_eq!(config.max_acquire_timeouts, 3);
    }
}
