//! Call boundary to the opaque emulator core.
//!
//! The core is created once on the pump thread and then driven through the
//! three calls below. Every call reports success or failure; nothing assumes
//! the core accepted a request.

use std::path::Path;

pub type CoreOutcome = Result<(), CoreError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("core creation failed: {reason}")]
    CreateFailed { reason: String },
    #[error("ROM load failed: {reason}")]
    LoadFailed { reason: String },
    #[error("frame render failed: {reason}")]
    RenderFailed { reason: String },
    #[error("output resize to {width}x{height} failed: {reason}")]
    ResizeFailed {
        width: u32,
        height: u32,
        reason: String,
    },
    #[error("core does not implement `{operation}`")]
    Unsupported { operation: &'static str },
}

impl CoreError {
    pub fn create(reason: impl Into<String>) -> Self {
        Self::CreateFailed {
            reason: reason.into(),
        }
    }

    pub fn load(reason: impl Into<String>) -> Self {
        Self::LoadFailed {
            reason: reason.into(),
        }
    }

    pub fn render(reason: impl Into<String>) -> Self {
        Self::RenderFailed {
            reason: reason.into(),
        }
    }

    pub fn resize(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::ResizeFailed {
            width,
            height,
            reason: reason.into(),
        }
    }
}

/// An emulator core as seen by the host shell.
///
/// Implementations are only ever called with the coordinator lock held, so
/// `&mut self` is exclusive across the UI thread and the pump thread.
pub trait EmulatorCore: Send + 'static {
    /// Host render target handed to every [`run_frame`](Self::run_frame)
    /// call (e.g. a Metal layer pointer). Owned by the pump thread.
    type Surface: Send + 'static;

    /// Render exactly one frame into `surface`.
    fn run_frame(&mut self, surface: &Self::Surface) -> CoreOutcome;

    /// Change the target output resolution. Called before the next
    /// `run_frame` after the drawable was resized.
    fn set_output_size(&mut self, width: u32, height: u32) -> CoreOutcome;

    /// Replace the active ROM image.
    fn load_rom(&mut self, path: &Path) -> CoreOutcome;
}
