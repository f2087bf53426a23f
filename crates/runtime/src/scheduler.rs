use foundation::time::Time;
use tracing::debug;

use crate::frame::Frame;

/// Identifies one started render loop. A new handle is issued on every start.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

/// Owns the single per-frame callback registration of a view.
///
/// The host calls [`FrameScheduler::tick`] once per animation frame; it yields a
/// [`Frame`] only while a handle is active. [`FrameScheduler::cancel`] is the
/// one way to stop the loop and takes effect before the next tick.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    next_handle: u64,
    active: Option<FrameHandle>,
    last: Option<Frame>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the loop, replacing any previous registration.
    pub fn start(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        if let Some(previous) = self.active.replace(handle) {
            debug!(?previous, "frame loop restarted");
        }
        self.last = None;
        handle
    }

    /// Cancels the active registration. Returns `false` if nothing was running.
    pub fn cancel(&mut self) -> bool {
        match self.active.take() {
            Some(handle) => {
                debug!(?handle, "frame loop cancelled");
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn handle(&self) -> Option<FrameHandle> {
        self.active
    }

    /// Advances to the next frame at host time `now`, or `None` when cancelled.
    pub fn tick(&mut self, now: Time) -> Option<Frame> {
        self.active?;
        let frame = match self.last {
            Some(prev) => prev.next(now),
            None => Frame::first(now),
        };
        self.last = Some(frame);
        Some(frame)
    }

    pub fn last_frame(&self) -> Option<Frame> {
        self.last
    }
}
