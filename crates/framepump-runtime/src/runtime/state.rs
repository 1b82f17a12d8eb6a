use std::sync::atomic::{AtomicBool, AtomicU64};

/// Flags shared between the handle and the pump thread. None of these guard
/// core state; that is the coordinator lock's job.
pub(crate) struct RuntimeState {
    pub(crate) stop: AtomicBool,
    pub(crate) paused: AtomicBool,
    pub(crate) running: AtomicBool,
    pub(crate) frame_seq: AtomicU64,
    pub(crate) render_failures: AtomicU64,
}

impl RuntimeState {
    pub(crate) fn new(start_paused: bool) -> Self {
        Self {
            stop: AtomicBool::new(false),
            paused: AtomicBool::new(start_paused),
            running: AtomicBool::new(true),
            frame_seq: AtomicU64::new(0),
            render_failures: AtomicU64::new(0),
        }
    }
}
