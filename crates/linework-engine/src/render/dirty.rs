/// Stale-state markers consumed by the frame scheduler.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct DirtyFlags {
    /// Geometry must be re-tessellated and re-uploaded.
    pub scene: bool,
    /// Reserved for a selection highlight pass; not read by the render path yet.
    pub selection: bool,
    /// View-projection changed since the last recorded frame.
    pub camera: bool,
}

impl DirtyFlags {
    #[inline]
    pub const fn all() -> Self {
        Self {
            scene: true,
            selection: true,
            camera: true,
        }
    }

    #[inline]
    pub fn mark_all(&mut self) {
        *self = Self::all();
    }

    #[inline]
    pub fn any(&self) -> bool {
        self.scene || self.selection || self.camera
    }
}
