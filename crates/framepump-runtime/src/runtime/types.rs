use std::{path::PathBuf, time::Duration};

use super::emulator::CoreError;

/// How the pump spaces consecutive frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FramePacing {
    /// Run the next frame as soon as the previous one returns. The host's
    /// display callback (vsync-blocking `run_frame`) is the only limit.
    #[default]
    Unbounded,
    /// Start frames on a fixed cadence.
    Interval(Duration),
}

impl FramePacing {
    /// `0` maps to [`FramePacing::Unbounded`].
    pub fn from_fps(fps: u32) -> Self {
        if fps == 0 {
            Self::Unbounded
        } else {
            Self::Interval(Duration::from_nanos(1_000_000_000 / u64::from(fps)))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub pacing: FramePacing,
    /// Stop the pump after this many failed `run_frame` calls in a row.
    /// `None` keeps pumping forever.
    pub max_consecutive_render_failures: Option<u32>,
    pub start_paused: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            pacing: FramePacing::Unbounded,
            max_consecutive_render_failures: Some(DEFAULT_MAX_CONSECUTIVE_RENDER_FAILURES),
            start_paused: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `Runtime::stop`, `RuntimeHandle::request_stop` or `Runtime` dropped.
    Requested,
    CoreCreateFailed,
    RenderFailures { count: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeNotification {
    CoreCreated,
    CoreCreateFailed { error: CoreError },
    RomLoaded { path: PathBuf },
    RomLoadFailed { path: PathBuf, error: CoreError },
    OutputResized { width: u32, height: u32 },
    ResizeFailed { error: CoreError },
    RenderFailed { frame: u64, error: CoreError },
    PumpStopped { reason: StopReason },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    #[error("invalid drawable size {width}x{height}")]
    InvalidDrawableSize { width: u32, height: u32 },
    #[error("picked document has an empty path")]
    EmptyRomPath,
    #[error("failed to load ROM: {path}: {error}")]
    LoadRomFailed { path: PathBuf, error: CoreError },
    #[error("failed to spawn pump thread: {error}")]
    ThreadSpawn { error: String },
    #[error("frame pump has stopped")]
    AlreadyStopped,
}

pub const DEFAULT_MAX_CONSECUTIVE_RENDER_FAILURES: u32 = 120;

pub(crate) const PUMP_THREAD_NAME: &str = "framepump";
pub(crate) const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(10);
// Hybrid wait tuning for interval pacing:
// - Sleep in small chunks until we're close to the deadline.
// - Spin for the final window for tighter frame pacing.
pub(crate) const MAX_SLEEP_CHUNK: Duration = Duration::from_millis(4);
pub(crate) const SPIN_THRESHOLD: Duration = Duration::from_micros(300);
pub(crate) const SPIN_YIELD_EVERY: u32 = 512;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_fps_is_unbounded() {
        assert_eq!(FramePacing::from_fps(0), FramePacing::Unbounded);
    }

    #[test]
    fn sixty_fps_interval() {
        assert_eq!(
            FramePacing::from_fps(60),
            FramePacing::Interval(Duration::from_nanos(16_666_666))
        );
    }
}
