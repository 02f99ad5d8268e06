use winit::dpi::PhysicalSize;

/// Response to a failed surface acquisition.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Image chain no longer matches the surface; rebuild it.
    Recreate,
    /// Transient; skip this frame and try again next tick.
    Retry,
    /// Unrecoverable.
    Fatal,
}

/// Maps an acquisition error to an action.
///
/// `consecutive_timeouts` counts this failure too; once it exceeds
/// `max_timeouts` a timeout is treated as device loss.
pub fn classify_surface_error(
    err: &wgpu::SurfaceError,
    consecutive_timeouts: u32,
    max_timeouts: u32,
) -> SurfaceErrorAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => SurfaceErrorAction::Recreate,
        wgpu::SurfaceError::Timeout if consecutive_timeouts <= max_timeouts => {
            SurfaceErrorAction::Retry
        }
        wgpu::SurfaceError::Timeout => SurfaceErrorAction::Fatal,
        wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        wgpu::SurfaceError::Other => SurfaceErrorAction::Fatal,
    }
}

/// First reported format, or an sRGB one when `prefer_srgb` is set and available.
pub fn choose_surface_format(
    formats: &[wgpu::TextureFormat],
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if prefer_srgb {
        let preferred = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        if let Some(f) = preferred.into_iter().find(|f| formats.contains(f)) {
            return Some(f);
        }
    }

    formats.first().copied()
}

pub fn choose_alpha_mode(
    supported: &[wgpu::CompositeAlphaMode],
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| supported.contains(m))
        .or_else(|| supported.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// Clamps the window framebuffer size into `[1, max_dimension]` on both axes.
///
/// wgpu surfaces never report a fixed current extent, so the framebuffer is
/// the only source of truth.
pub fn clamp_extent(size: PhysicalSize<u32>, max_dimension: u32) -> PhysicalSize<u32> {
    let max = max_dimension.max(1);
    PhysicalSize::new(size.width.clamp(1, max), size.height.clamp(1, max))
}
