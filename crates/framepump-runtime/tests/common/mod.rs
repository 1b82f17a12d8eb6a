#![allow(dead_code)]

use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::Receiver;
use framepump_runtime::{CoreError, CoreOutcome, EmulatorCore, RuntimeNotification};
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Frame { surface: u32 },
    Resize { width: u32, height: u32 },
    Load(PathBuf),
}

/// Shared view into a [`RecordingCore`] that outlives the core itself.
#[derive(Default)]
pub struct Recorder {
    pub calls: Mutex<Vec<Call>>,
    pub fail_render: AtomicBool,
    pub reject_rom: AtomicBool,
    pub reject_resize: AtomicBool,
    in_core: AtomicBool,
    pub overlaps: AtomicUsize,
    pub dropped_on: Mutex<Option<String>>,
}

impl Recorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn frames(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, Call::Frame { .. }))
            .count()
    }

    fn enter(&self) {
        if self.in_core.swap(true, Ordering::AcqRel) {
            self.overlaps.fetch_add(1, Ordering::AcqRel);
        }
    }

    fn leave(&self) {
        self.in_core.store(false, Ordering::Release);
    }
}

/// Surface handle as the host would pass it (an opaque id here).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceId(pub u32);

/// Core that records every call and flags any overlapping entry.
pub struct RecordingCore {
    recorder: Arc<Recorder>,
    frame_time: Duration,
}

impl RecordingCore {
    pub fn new(recorder: Arc<Recorder>) -> Self {
        Self {
            recorder,
            frame_time: Duration::from_micros(200),
        }
    }

    pub fn with_frame_time(mut self, frame_time: Duration) -> Self {
        self.frame_time = frame_time;
        self
    }
}

impl EmulatorCore for RecordingCore {
    type Surface = SurfaceId;

    fn run_frame(&mut self, surface: &SurfaceId) -> CoreOutcome {
        self.recorder.enter();
        thread::sleep(self.frame_time);
        self.recorder
            .calls
            .lock()
            .push(Call::Frame { surface: surface.0 });
        self.recorder.leave();
        if self.recorder.fail_render.load(Ordering::Acquire) {
            return Err(CoreError::render("device lost"));
        }
        Ok(())
    }

    fn set_output_size(&mut self, width: u32, height: u32) -> CoreOutcome {
        self.recorder.enter();
        self.recorder.calls.lock().push(Call::Resize { width, height });
        self.recorder.leave();
        if self.recorder.reject_resize.load(Ordering::Acquire) {
            return Err(CoreError::resize(width, height, "swapchain busy"));
        }
        Ok(())
    }

    fn load_rom(&mut self, path: &Path) -> CoreOutcome {
        self.recorder.enter();
        thread::sleep(Duration::from_micros(50));
        self.recorder.calls.lock().push(Call::Load(path.to_path_buf()));
        self.recorder.leave();
        if self.recorder.reject_rom.load(Ordering::Acquire) {
            return Err(CoreError::load("not a valid ROM image"));
        }
        Ok(())
    }
}

impl Drop for RecordingCore {
    fn drop(&mut self) {
        *self.recorder.dropped_on.lock() = thread::current().name().map(str::to_string);
    }
}

pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    cond()
}

pub fn drain(rx: &Receiver<RuntimeNotification>) -> Vec<RuntimeNotification> {
    rx.try_iter().collect()
}

pub const TIMEOUT: Duration = Duration::from_secs(5);
