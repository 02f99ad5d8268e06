use std::path::{Path, PathBuf};
use std::time::Duration;

use winit::dpi::PhysicalSize;

use crate::device::{choose_alpha_mode, choose_surface_format, clamp_extent, Gpu, GpuInit};

use super::pipeline::{load_shader, LinePipeline};
use super::RenderError;

/// Everything that embeds the surface format or extent.
///
/// Built and dropped as one unit; there is no partial rebuild.
pub struct SwapchainState {
    pub config: wgpu::SurfaceConfiguration,
    pub line: LinePipeline,
}

impl SwapchainState {
    fn create(
        gpu: &Gpu<'_>,
        init: &GpuInit,
        vertex_shader: &Path,
        fragment_shader: &Path,
    ) -> Result<Self, RenderError> {
        let device = gpu.device();
        let caps = gpu.capabilities();

        let format = choose_surface_format(&caps.formats, init.prefer_srgb)
            .ok_or(RenderError::NoSurfaceFormat)?;
        let extent = clamp_extent(gpu.framebuffer_size(), device.limits().max_texture_dimension_2d);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: extent.width,
            height: extent.height,
            present_mode: init.present_mode,
            alpha_mode: choose_alpha_mode(&caps.alpha_modes, init.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };
        gpu.surface().configure(device, &config);

        let vs = load_shader(device, vertex_shader)?;
        let fs = load_shader(device, fragment_shader)?;
        let line = LinePipeline::new(device, format, &vs, &fs);

        log::info!(
            "swapchain created: {}x{} {:?} {:?}",
            config.width,
            config.height,
            config.format,
            config.present_mode
        );

        Ok(Self { config, line })
    }
}

/// Owns the configured surface and its dependent pipeline.
pub struct Swapchain {
    init: GpuInit,
    vertex_shader: PathBuf,
    fragment_shader: PathBuf,
    state: Option<SwapchainState>,
}

impl Swapchain {
    /// Configures the surface at the current framebuffer size and builds the pipeline.
    pub fn create(
        gpu: &Gpu<'_>,
        init: GpuInit,
        vertex_shader: PathBuf,
        fragment_shader: PathBuf,
    ) -> Result<Self, RenderError> {
        let state = SwapchainState::create(gpu, &init, &vertex_shader, &fragment_shader)?;
        Ok(Self {
            init,
            vertex_shader,
            fragment_shader,
            state: Some(state),
        })
    }

    /// Drains the GPU, drops the whole bundle, then creates it again.
    ///
    /// On error the swapchain is left empty.
    pub fn recreate(&mut self, gpu: &Gpu<'_>, drain_timeout: Duration) -> Result<(), RenderError> {
        gpu.wait_idle(drain_timeout)?;

        self.state = None;
        let state =
            SwapchainState::create(gpu, &self.init, &self.vertex_shader, &self.fragment_shader)?;
        self.state = Some(state);

        Ok(())
    }

    pub fn state(&self) -> Option<&SwapchainState> {
        self.state.as_ref()
    }

    pub fn format(&self) -> Option<wgpu::TextureFormat> {
        self.state.as_ref().map(|s| s.config.format)
    }

    pub fn extent(&self) -> PhysicalSize<u32> {
        self.state
            .as_ref()
            .map_or(PhysicalSize::new(0, 0), |s| PhysicalSize::new(s.config.width, s.config.height))
    }
}
