mod coordinator;
mod drawable;
mod emulator;
mod handle;
mod notify;
mod picker;
mod runner;
mod state;
mod types;

pub use coordinator::{DeferredLoad, FrameReport, RenderCoordinator};
pub use drawable::DrawableSize;
pub use emulator::{CoreError, CoreOutcome, EmulatorCore};
pub use handle::{Runtime, RuntimeHandle};
pub use notify::RuntimeEventSender;
pub use picker::{DocumentPicker, PickOutcome, PickResult};
pub use types::{
    DEFAULT_MAX_CONSECUTIVE_RENDER_FAILURES, FramePacing, RuntimeConfig, RuntimeError,
    RuntimeNotification, StopReason,
};
