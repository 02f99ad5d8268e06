use wgpu::util::DeviceExt;

use super::{RenderError, Vertex};

/// What an upload has to do with the existing buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) enum UploadPlan {
    /// Empty stream: drop the buffer, nothing is drawn.
    Release,
    /// Same byte length: overwrite in place.
    Rewrite,
    /// Length changed or no buffer yet: drop and allocate exactly `required` bytes.
    Reallocate,
}

pub(crate) fn plan_upload(current: Option<u64>, required: u64) -> UploadPlan {
    match current {
        _ if required == 0 => UploadPlan::Release,
        Some(size) if size == required => UploadPlan::Rewrite,
        _ => UploadPlan::Reallocate,
    }
}

/// Device vertex buffer sized exactly to the last uploaded stream.
///
/// A size change always destroys the old buffer before the new one is
/// created, so at most one generation exists at a time.
#[derive(Debug, Default)]
pub struct VertexBuffer {
    buffer: Option<wgpu::Buffer>,
}

impl VertexBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the buffer contents with `vertices`.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        vertices: &[Vertex],
    ) -> Result<(), RenderError> {
        let bytes: &[u8] = bytemuck::cast_slice(vertices);
        let required = bytes.len() as u64;

        match plan_upload(self.size(), required) {
            UploadPlan::Release => self.buffer = None,
            UploadPlan::Rewrite => {
                if let Some(buffer) = self.buffer.as_ref() {
                    queue.write_buffer(buffer, 0, bytes);
                }
            }
            UploadPlan::Reallocate => {
                let limit = device.limits().max_buffer_size;
                if required > limit {
                    return Err(RenderError::BufferTooLarge { requested: required, limit });
                }

                // wgpu keeps the old allocation alive until submissions using it retire.
                self.buffer = None;

                log::debug!("vertex buffer reallocated: {required} bytes");
                self.buffer = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("linework vertex buffer"),
                    contents: bytes,
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                }));
            }
        }

        Ok(())
    }

    /// Byte size of the live buffer, if any.
    pub fn size(&self) -> Option<u64> {
        self.buffer.as_ref().map(wgpu::Buffer::size)
    }

    pub fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_upload_allocates() {
        assert_eq!(plan_upload(None, 2600), UploadPlan::Reallocate);
    }

    #[test]
    fn same_size_rewrites_in_place() {
        assert_eq!(plan_upload(Some(2600), 2600), UploadPlan::Rewrite);
    }

    #[test]
    fn any_size_change_reallocates() {
        assert_eq!(plan_upload(Some(2600), 40), UploadPlan::Reallocate);
        assert_eq!(plan_upload(Some(40), 2600), UploadPlan::Reallocate);
    }

    #[test]
    fn empty_stream_releases() {
        assert_eq!(plan_upload(Some(2600), 0), UploadPlan::Release);
        assert_eq!(plan_upload(None, 0), UploadPlan::Release);
    }
}
