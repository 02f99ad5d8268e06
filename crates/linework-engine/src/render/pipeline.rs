use std::path::Path;

use glam::Mat4;

use super::{RenderError, Vertex};

/// Bytes of immediate data reserved for the per-draw view-projection matrix.
pub const VIEW_PROJ_BYTES: u32 = std::mem::size_of::<Mat4>() as u32;

/// Reads a WGSL file from disk and compiles it into a shader module.
///
/// A missing or unreadable file is fatal.
pub fn load_shader(device: &wgpu::Device, path: &Path) -> Result<wgpu::ShaderModule, RenderError> {
    let source = read_shader_source(path)?;
    log::debug!("loaded shader {}", path.display());
    Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: path.file_name().and_then(|n| n.to_str()),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    }))
}

fn read_shader_source(path: &Path) -> Result<String, RenderError> {
    std::fs::read_to_string(path).map_err(|source| RenderError::ShaderLoad {
        path: path.to_path_buf(),
        source,
    })
}

/// Pipeline layout and line-list pipeline for one surface format.
pub struct LinePipeline {
    pub layout: wgpu::PipelineLayout,
    pub pipeline: wgpu::RenderPipeline,
}

impl LinePipeline {
    /// Builds the document pipeline.
    ///
    /// Line-list topology, no culling, no blending, single sample, and one
    /// immediate-data block holding the view-projection matrix.
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        vertex: &wgpu::ShaderModule,
        fragment: &wgpu::ShaderModule,
    ) -> Self {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("linework line pipeline layout"),
            bind_group_layouts: &[],
            immediate_size: VIEW_PROJ_BYTES,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("linework line pipeline"),
            layout: Some(&layout),

            vertex: wgpu::VertexState {
                module: vertex,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[Vertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: fragment,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Self { layout, pipeline }
    }
}
