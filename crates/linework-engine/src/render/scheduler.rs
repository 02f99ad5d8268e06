use glam::Mat4;

use crate::document::Document;

use super::{Camera, DirtyFlags, RenderError, Tessellator, Vertex};

/// Number of frames that may be in flight on the GPU at once.
pub const FRAME_COUNT: usize = 2;

/// Result of asking the presentation surface for its next image.
#[derive(Debug)]
pub enum Acquire<F> {
    /// Image acquired and a command recording begun.
    Ready(F),
    /// The image chain no longer matches the surface; it must be recreated.
    Stale,
    /// No image became available in time; the frame is skipped.
    TimedOut,
}

/// Result of queueing an image for presentation.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PresentStatus {
    Presented,
    /// Presented, but the image chain is out of date or suboptimal.
    Stale,
}

/// Per-slot progress through one frame.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum FrameState {
    #[default]
    Idle,
    Acquiring,
    Recording,
    Submitted,
    Presenting,
}

/// What happened during one [`FrameScheduler::render_frame`] call.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FrameOutcome {
    Presented,
    /// Presented, then the swapchain was recreated.
    PresentedStale,
    /// Acquire reported a stale swapchain; it was recreated and nothing was drawn.
    AcquireStale,
    /// Acquire timed out; nothing was drawn.
    TimedOut,
    /// The surface has zero area; nothing was attempted.
    Suspended,
}

/// Per-draw parameters handed to [`FrameBackend::record`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DrawParams {
    pub vertex_count: u32,
    pub view_proj: Mat4,
}

/// GPU-side operations driven by the frame scheduler, in call order.
///
/// The scheduler owns ordering and bookkeeping; implementors own the actual
/// device objects. Every method that returns `Err` reports an unrecoverable
/// condition.
pub trait FrameBackend {
    /// CPU-observable completion token for one submission.
    type Fence;
    /// Acquired image plus an open command recording.
    type Frame;
    /// Submitted image waiting to be presented.
    type Presentable;
    /// UI overlay painted into the same pass after the document.
    type Overlay: ?Sized;

    /// Blocks until the submission behind `fence` has completed.
    fn wait(&mut self, fence: Self::Fence) -> Result<(), RenderError>;

    fn acquire(&mut self) -> Result<Acquire<Self::Frame>, RenderError>;

    /// Replaces the vertex buffer contents with `vertices`.
    fn upload(&mut self, vertices: &[Vertex]) -> Result<(), RenderError>;

    /// Records the document pass: clear, draw `params`, then the overlay.
    fn record(
        &mut self,
        frame: &mut Self::Frame,
        params: &DrawParams,
        overlay: Option<&mut Self::Overlay>,
    ) -> Result<(), RenderError>;

    fn submit(&mut self, frame: Self::Frame) -> Result<(Self::Fence, Self::Presentable), RenderError>;

    fn present(&mut self, image: Self::Presentable) -> Result<PresentStatus, RenderError>;

    /// Drains the GPU and rebuilds the swapchain bundle.
    fn recreate(&mut self) -> Result<(), RenderError>;
}

/// One rotating set of per-frame synchronization state.
#[derive(Debug)]
struct FrameSlot<F> {
    /// Outstanding submission; `None` once waited on or never submitted.
    fence: Option<F>,
    state: FrameState,
}

impl<F> Default for FrameSlot<F> {
    fn default() -> Self {
        Self {
            fence: None,
            state: FrameState::Idle,
        }
    }
}

/// Drives wait → acquire → record → submit → present over a fixed ring of
/// [`FRAME_COUNT`] slots.
///
/// Single-threaded: one call per host tick, never re-entered.
#[derive(Debug)]
pub struct FrameScheduler<F> {
    slots: [FrameSlot<F>; FRAME_COUNT],
    frame_index: usize,
    dirty: DirtyFlags,
    tessellator: Tessellator,
}

impl<F> FrameScheduler<F> {
    /// Everything starts dirty so the first frame uploads geometry.
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| FrameSlot::default()),
            frame_index: 0,
            dirty: DirtyFlags::all(),
            tessellator: Tessellator::new(),
        }
    }

    #[inline]
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    #[inline]
    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    #[inline]
    pub fn dirty_mut(&mut self) -> &mut DirtyFlags {
        &mut self.dirty
    }

    pub fn slot_state(&self, slot: usize) -> Option<FrameState> {
        self.slots.get(slot).map(|s| s.state)
    }

    /// Slots holding a submission that has not been waited on yet.
    ///
    /// Upper bound on the number of frames the GPU may still be executing.
    pub fn in_flight(&self) -> usize {
        self.slots.iter().filter(|s| s.fence.is_some()).count()
    }

    /// Runs one full frame against `backend`.
    ///
    /// Stale swapchains are handled here and reported through the outcome;
    /// only fatal conditions come back as `Err`.
    pub fn render_frame<B>(
        &mut self,
        backend: &mut B,
        document: &Document,
        camera: &Camera,
        overlay: Option<&mut B::Overlay>,
    ) -> Result<FrameOutcome, RenderError>
    where
        B: FrameBackend<Fence = F>,
    {
        let index = self.frame_index;

        // Bounds the CPU to FRAME_COUNT frames ahead of the GPU.
        if let Some(fence) = self.slots[index].fence.take() {
            backend.wait(fence)?;
        }

        self.slots[index].state = FrameState::Acquiring;
        let mut frame = match backend.acquire()? {
            Acquire::Ready(frame) => frame,
            Acquire::Stale => {
                self.slots[index].state = FrameState::Idle;
                log::debug!("swapchain stale on acquire (slot {index})");
                self.recreate(backend)?;
                return Ok(FrameOutcome::AcquireStale);
            }
            Acquire::TimedOut => {
                self.slots[index].state = FrameState::Idle;
                return Ok(FrameOutcome::TimedOut);
            }
        };

        self.slots[index].state = FrameState::Recording;
        if self.dirty.scene {
            let vertices = self.tessellator.tessellate(document);
            log::trace!("re-tessellated {} vertices", vertices.len());
            backend.upload(vertices)?;
            self.dirty.scene = false;
        }
        self.dirty.camera = false;
        self.dirty.selection = false;

        let params = DrawParams {
            vertex_count: self.tessellator.vertex_count(),
            view_proj: camera.view_proj(),
        };
        backend.record(&mut frame, &params, overlay)?;

        let (fence, image) = backend.submit(frame)?;
        self.slots[index].fence = Some(fence);
        self.slots[index].state = FrameState::Submitted;

        self.slots[index].state = FrameState::Presenting;
        let status = backend.present(image)?;
        self.slots[index].state = FrameState::Idle;

        let outcome = match status {
            PresentStatus::Presented => FrameOutcome::Presented,
            PresentStatus::Stale => {
                log::debug!("swapchain stale on present (slot {index})");
                self.recreate(backend)?;
                FrameOutcome::PresentedStale
            }
        };

        self.frame_index = (index + 1) % FRAME_COUNT;
        Ok(outcome)
    }

    /// Rebuilds the swapchain bundle and marks every dirty flag.
    ///
    /// The frame index is left untouched.
    pub fn recreate<B>(&mut self, backend: &mut B) -> Result<(), RenderError>
    where
        B: FrameBackend<Fence = F>,
    {
        backend.recreate()?;
        self.dirty.mark_all();
        Ok(())
    }
}

impl<F> Default for FrameScheduler<F> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use glam::Vec2;

    use super::*;
    use crate::document::{Circle, LineSegment};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Wait(u64),
        Acquire,
        Upload(usize),
        Record { vertex_count: u32, overlay: bool },
        Submit(u64),
        Present,
        Recreate,
    }

    #[derive(Debug, Copy, Clone)]
    enum Scripted {
        Ready,
        Stale,
        TimedOut,
        Fail,
    }

    #[derive(Default)]
    struct MockOverlay {
        painted: u32,
    }

    #[derive(Default)]
    struct MockBackend {
        calls: Vec<Call>,
        acquire_script: VecDeque<Scripted>,
        present_script: VecDeque<PresentStatus>,
        next_fence: u64,
        outstanding: Vec<u64>,
        max_outstanding: usize,
    }

    impl MockBackend {
        fn uploads(&self) -> Vec<usize> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::Upload(n) => Some(*n),
                    _ => None,
                })
                .collect()
        }

        fn count(&self, wanted: &Call) -> usize {
            self.calls.iter().filter(|c| *c == wanted).count()
        }
    }

    impl FrameBackend for MockBackend {
        type Fence = u64;
        type Frame = ();
        type Presentable = ();
        type Overlay = MockOverlay;

        fn wait(&mut self, fence: u64) -> Result<(), RenderError> {
            self.outstanding.retain(|f| *f != fence);
            self.calls.push(Call::Wait(fence));
            Ok(())
        }

        fn acquire(&mut self) -> Result<Acquire<()>, RenderError> {
            self.calls.push(Call::Acquire);
            match self.acquire_script.pop_front().unwrap_or(Scripted::Ready) {
                Scripted::Ready => Ok(Acquire::Ready(())),
                Scripted::Stale => Ok(Acquire::Stale),
                Scripted::TimedOut => Ok(Acquire::TimedOut),
                Scripted::Fail => Err(RenderError::AcquireTimeout { attempts: 3 }),
            }
        }

        fn upload(&mut self, vertices: &[Vertex]) -> Result<(), RenderError> {
            self.calls.push(Call::Upload(vertices.len()));
            Ok(())
        }

        fn record(
            &mut self,
            _frame: &mut (),
            params: &DrawParams,
            overlay: Option<&mut MockOverlay>,
        ) -> Result<(), RenderError> {
            let has_overlay = overlay.is_some();
            if let Some(overlay) = overlay {
                overlay.painted += 1;
            }
            self.calls.push(Call::Record {
                vertex_count: params.vertex_count,
                overlay: has_overlay,
            });
            Ok(())
        }

        fn submit(&mut self, _frame: ()) -> Result<(u64, ()), RenderError> {
            let fence = self.next_fence;
            self.next_fence += 1;
            self.outstanding.push(fence);
            self.max_outstanding = self.max_outstanding.max(self.outstanding.len());
            self.calls.push(Call::Submit(fence));
            Ok((fence, ()))
        }

        fn present(&mut self, _image: ()) -> Result<PresentStatus, RenderError> {
            self.calls.push(Call::Present);
            Ok(self
                .present_script
                .pop_front()
                .unwrap_or(PresentStatus::Presented))
        }

        fn recreate(&mut self) -> Result<(), RenderError> {
            // Recreation drains the GPU.
            self.outstanding.clear();
            self.calls.push(Call::Recreate);
            Ok(())
        }
    }

    fn document() -> Document {
        let mut doc = Document::new();
        let base = doc.layer_ids().next().expect("default layer");
        doc.add_entity(base, LineSegment::new(Vec2::ZERO, Vec2::new(100.0, 100.0)));
        doc.add_entity(base, Circle::new(Vec2::new(50.0, 50.0), 25.0));
        doc
    }

    #[test]
    fn first_frame_runs_protocol_in_order() {
        let doc = document();
        let camera = Camera::default();
        let mut backend = MockBackend::default();
        let mut scheduler = FrameScheduler::new();

        let outcome = scheduler
            .render_frame(&mut backend, &doc, &camera, None)
            .unwrap();

        assert_eq!(outcome, FrameOutcome::Presented);
        assert_eq!(
            backend.calls,
            vec![
                Call::Acquire,
                Call::Upload(130),
                Call::Record { vertex_count: 130, overlay: false },
                Call::Submit(0),
                Call::Present,
            ]
        );
        assert_eq!(scheduler.frame_index(), 1);
        assert!(!scheduler.dirty().scene);
        assert!(!scheduler.dirty().camera);
    }

    #[test]
    fn clean_scene_skips_upload() {
        let doc = document();
        let camera = Camera::default();
        let mut backend = MockBackend::default();
        let mut scheduler = FrameScheduler::new();

        for _ in 0..5 {
            scheduler
                .render_frame(&mut backend, &doc, &camera, None)
                .unwrap();
        }

        assert_eq!(backend.uploads(), vec![130]);
        assert_eq!(backend.count(&Call::Record { vertex_count: 130, overlay: false }), 5);
    }

    #[test]
    fn scene_dirty_reuploads_current_geometry() {
        let mut doc = document();
        let camera = Camera::default();
        let mut backend = MockBackend::default();
        let mut scheduler = FrameScheduler::new();

        scheduler.render_frame(&mut backend, &doc, &camera, None).unwrap();

        let base = doc.layer_ids().next().expect("default layer");
        doc.set_layer_visible(base, false);
        scheduler.dirty_mut().scene = true;
        scheduler.render_frame(&mut backend, &doc, &camera, None).unwrap();

        assert_eq!(backend.uploads(), vec![130, 0]);
        assert_eq!(
            backend.calls.last(),
            Some(&Call::Present),
        );
        assert!(backend.calls.contains(&Call::Record { vertex_count: 0, overlay: false }));
    }

    #[test]
    fn in_flight_frames_never_exceed_frame_count() {
        let doc = document();
        let camera = Camera::default();
        let mut backend = MockBackend::default();
        let mut scheduler = FrameScheduler::new();

        for _ in 0..10 {
            scheduler.render_frame(&mut backend, &doc, &camera, None).unwrap();
            assert!(scheduler.in_flight() <= FRAME_COUNT);
        }

        assert_eq!(backend.max_outstanding, FRAME_COUNT);
        // Third frame reuses slot 0 and must wait on the first submission.
        let third_frame_start = backend
            .calls
            .iter()
            .position(|c| *c == Call::Wait(0))
            .expect("slot 0 fence waited");
        let second_submit = backend
            .calls
            .iter()
            .position(|c| *c == Call::Submit(1))
            .expect("second submit");
        assert!(third_frame_start > second_submit);
    }

    #[test]
    fn stale_acquire_recreates_and_aborts_frame() {
        let doc = document();
        let camera = Camera::default();
        let mut backend = MockBackend::default();
        let mut scheduler = FrameScheduler::new();

        scheduler.render_frame(&mut backend, &doc, &camera, None).unwrap();
        let index_before = scheduler.frame_index();

        backend.acquire_script.push_back(Scripted::Stale);
        let outcome = scheduler
            .render_frame(&mut backend, &doc, &camera, None)
            .unwrap();

        assert_eq!(outcome, FrameOutcome::AcquireStale);
        assert_eq!(scheduler.frame_index(), index_before);
        assert_eq!(scheduler.dirty(), DirtyFlags::all());
        assert_eq!(backend.count(&Call::Recreate), 1);
        assert_eq!(backend.count(&Call::Submit(1)), 0);
        assert_eq!(scheduler.slot_state(index_before), Some(FrameState::Idle));

        // Next pass re-uploads because recreation dirtied the scene.
        scheduler.render_frame(&mut backend, &doc, &camera, None).unwrap();
        assert_eq!(backend.uploads(), vec![130, 130]);
    }

    #[test]
    fn stale_present_recreates_after_presenting() {
        let doc = document();
        let camera = Camera::default();
        let mut backend = MockBackend::default();
        let mut scheduler = FrameScheduler::new();

        backend.present_script.push_back(PresentStatus::Stale);
        let outcome = scheduler
            .render_frame(&mut backend, &doc, &camera, None)
            .unwrap();

        assert_eq!(outcome, FrameOutcome::PresentedStale);
        assert_eq!(backend.calls.last(), Some(&Call::Recreate));
        assert_eq!(scheduler.dirty(), DirtyFlags::all());
        assert_eq!(scheduler.frame_index(), 1);
    }

    #[test]
    fn recreate_marks_all_dirty_and_keeps_index() {
        let doc = document();
        let camera = Camera::default();
        let mut backend = MockBackend::default();
        let mut scheduler = FrameScheduler::new();

        scheduler.render_frame(&mut backend, &doc, &camera, None).unwrap();
        assert!(!scheduler.dirty().scene);

        scheduler.recreate(&mut backend).unwrap();
        assert_eq!(scheduler.dirty(), DirtyFlags::all());
        assert_eq!(scheduler.frame_index(), 1);
    }

    #[test]
    fn timed_out_acquire_skips_without_recreating() {
        let doc = document();
        let camera = Camera::default();
        let mut backend = MockBackend::default();
        let mut scheduler = FrameScheduler::new();

        backend.acquire_script.push_back(Scripted::TimedOut);
        let outcome = scheduler
            .render_frame(&mut backend, &doc, &camera, None)
            .unwrap();

        assert_eq!(outcome, FrameOutcome::TimedOut);
        assert_eq!(scheduler.frame_index(), 0);
        assert_eq!(backend.count(&Call::Recreate), 0);
        assert!(backend.uploads().is_empty());
        assert!(scheduler.dirty().scene);
    }

    #[test]
    fn overlay_is_recorded_with_document_pass() {
        let doc = document();
        let camera = Camera::default();
        let mut backend = MockBackend::default();
        let mut scheduler = FrameScheduler::new();
        let mut overlay = MockOverlay::default();

        scheduler
            .render_frame(&mut backend, &doc, &camera, Some(&mut overlay))
            .unwrap();
        scheduler
            .render_frame(&mut backend, &doc, &camera, Some(&mut overlay))
            .unwrap();

        assert_eq!(overlay.painted, 2);
        assert_eq!(backend.count(&Call::Record { vertex_count: 130, overlay: true }), 2);
    }

    #[test]
    fn fatal_backend_error_propagates() {
        let doc = document();
        let camera = Camera::default();
        let mut backend = MockBackend::default();
        let mut scheduler = FrameScheduler::new();

        backend.acquire_script.push_back(Scripted::Fail);
        let err = scheduler
            .render_frame(&mut backend, &doc, &camera, None)
            .unwrap_err();

        assert!(matches!(err, RenderError::AcquireTimeout { attempts: 3 }));
        assert_eq!(scheduler.frame_index(), 0);
    }

    #[test]
    fn camera_transform_is_pushed_each_frame() {
        let doc = document();
        let mut camera = Camera::default();
        let mut backend = MockBackend::default();
        let mut scheduler = FrameScheduler::new();

        scheduler.render_frame(&mut backend, &doc, &camera, None).unwrap();
        camera.update(10.0, Vec2::new(3.0, 4.0), scheduler.dirty_mut());
        assert!(scheduler.dirty().camera);

        scheduler.render_frame(&mut backend, &doc, &camera, None).unwrap();
        assert!(!scheduler.dirty().camera);
        assert_eq!(backend.uploads().len(), 1);
    }
}
