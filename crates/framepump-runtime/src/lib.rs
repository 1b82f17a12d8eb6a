//! framepump-runtime
//!
//! Drives an opaque emulator core from a host UI shell:
//! - the host view reports drawable sizes from the UI thread; sizes coalesce
//!   and reach the core right before the next frame;
//! - a dedicated pump thread creates the core and renders one frame per
//!   iteration into the host surface;
//! - document picks load ROMs under the same lock as frames, so a ROM is
//!   never swapped mid-frame.

pub mod runtime;

pub use runtime::{
    CoreError, CoreOutcome, DEFAULT_MAX_CONSECUTIVE_RENDER_FAILURES, DeferredLoad,
    DocumentPicker, DrawableSize, EmulatorCore, FramePacing, FrameReport, PickOutcome,
    PickResult, RenderCoordinator, Runtime, RuntimeConfig, RuntimeError, RuntimeEventSender,
    RuntimeHandle, RuntimeNotification, StopReason,
};
