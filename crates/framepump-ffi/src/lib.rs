//! framepump-ffi
//!
//! C ABI for platform shells (SwiftUI/UIKit, Android, Qt) that embed an
//! emulator core as a dynamic library.
//! - The shell hands over its core entry points as a [`FramepumpCoreVTable`]
//!   and its render target as an opaque pointer.
//! - `framepump_start` spawns the pump thread, which creates the core and
//!   renders frames until `framepump_stop`.
//! - View resize and document-picker callbacks forward here from the UI
//!   thread.

mod vtable;

use std::{
    ffi::{CStr, c_char, c_void},
    panic::{AssertUnwindSafe, catch_unwind},
    path::PathBuf,
};

use framepump_runtime::{
    DocumentPicker, FramePacing, PickOutcome, PickResult, Runtime, RuntimeConfig, RuntimeHandle,
};
use parking_lot::Mutex;

pub use vtable::{
    CreateFn, DestroyFn, ForeignCore, ForeignSurface, FramepumpCoreVTable, LoadRomFn, RunFrameFn,
    SetOutputSizeFn,
};

static RUNTIME: Mutex<Option<Runtime<ForeignCore>>> = parking_lot::const_mutex(None);

fn runtime_handle() -> Option<RuntimeHandle<ForeignCore>> {
    RUNTIME.lock().as_ref().map(Runtime::handle)
}

/// Run `f`, logging and swallowing panics so they never unwind into the host.
fn guarded<R>(name: &str, fallback: R, f: impl FnOnce() -> R) -> R {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!("Panic in {name}: {:?}", e);
            fallback
        }
    }
}

// === C ABI exposed to platform runners ====================================

/// Start the frame pump. `target_fps == 0` renders as fast as `run_frame`
/// returns (the host's display link paces it).
///
/// Returns `false` if a pump is already running or the table is null. A
/// pump that exited on its own (core creation failure, render failure
/// limit) is joined and replaced.
///
/// # Safety
/// - `vtable` must be null or point to a valid table; it is copied.
/// - The entry points and `user_data` must stay valid until
///   `framepump_stop` returns.
/// - `surface` must stay valid until `framepump_stop` returns.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framepump_start(
    vtable: *const FramepumpCoreVTable,
    surface: *mut c_void,
    target_fps: u32,
) -> bool {
    let _ = tracing_subscriber::fmt::try_init();

    if vtable.is_null() {
        tracing::error!("framepump_start called with a null core vtable");
        return false;
    }
    // SAFETY: checked for null above; the caller guarantees validity.
    let vtable = unsafe { *vtable };

    guarded("framepump_start", false, || {
        let mut slot = RUNTIME.lock();
        if let Some(previous) = slot.as_ref() {
            if previous.handle().is_running() {
                tracing::warn!("frame pump already running");
                return false;
            }
            tracing::info!("replacing frame pump that has already exited");
            // Already past its pump loop, so the join is short.
            drop(slot.take());
        }

        let config = RuntimeConfig {
            pacing: FramePacing::from_fps(target_fps),
            ..RuntimeConfig::default()
        };
        // SAFETY: forwarded from this function's contract.
        let create = move || unsafe { ForeignCore::create(vtable) };
        match Runtime::start(config, ForeignSurface(surface), create) {
            Ok(runtime) => {
                *slot = Some(runtime);
                true
            }
            Err(e) => {
                tracing::error!("failed to start frame pump: {e}");
                false
            }
        }
    })
}

/// Stop the pump, wait for the in-flight frame, and destroy the core on the
/// pump thread. No-op when nothing is running.
#[unsafe(no_mangle)]
pub extern "C" fn framepump_stop() {
    guarded("framepump_stop", (), || {
        let runtime = RUNTIME.lock().take();
        // Joined outside the slot lock.
        drop(runtime);
    })
}

/// Forward the view's drawable size. Returns `true` if the core will be
/// resized before the next frame.
#[unsafe(no_mangle)]
pub extern "C" fn framepump_set_drawable_size(width: u32, height: u32) -> bool {
    guarded("framepump_set_drawable_size", false, || {
        let Some(handle) = runtime_handle() else {
            return false;
        };
        match handle.set_drawable_size(width, height) {
            Ok(changed) => changed,
            Err(e) => {
                tracing::debug!("ignoring drawable size: {e}");
                false
            }
        }
    })
}

/// Document picker completion with a file-system path (UTF-8, NUL
/// terminated). Returns `true` if the ROM was loaded or queued for the core.
///
/// # Safety
/// `path` must be null or a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn framepump_pick_document(path: *const c_char) -> bool {
    if path.is_null() {
        return false;
    }
    // SAFETY: non-null and NUL-terminated per contract.
    let path = unsafe { CStr::from_ptr(path) };
    let Ok(path) = path.to_str() else {
        tracing::warn!("picked document path is not valid UTF-8");
        return false;
    };
    let path = PathBuf::from(path);

    guarded("framepump_pick_document", false, || {
        let Some(handle) = runtime_handle() else {
            return false;
        };
        match DocumentPicker::new(handle).did_pick_document(PickResult::Picked(path)) {
            Ok(PickOutcome::Loaded | PickOutcome::Deferred) => true,
            Ok(PickOutcome::Cancelled) => false,
            Err(e) => {
                tracing::error!("{e}");
                false
            }
        }
    })
}

/// Document picker dismissed without a selection.
#[unsafe(no_mangle)]
pub extern "C" fn framepump_pick_cancelled() {
    guarded("framepump_pick_cancelled", (), || {
        if let Some(handle) = runtime_handle() {
            let _ = DocumentPicker::new(handle).did_pick_document(PickResult::Cancelled);
        }
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn framepump_set_paused(paused: bool) {
    guarded("framepump_set_paused", (), || {
        if let Some(handle) = runtime_handle() {
            handle.set_paused(paused);
        }
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn framepump_has_rom_loaded() -> bool {
    guarded("framepump_has_rom_loaded", false, || {
        runtime_handle().is_some_and(|handle| handle.has_rom_loaded())
    })
}

/// Frames rendered since `framepump_start`, or 0 when not running.
#[unsafe(no_mangle)]
pub extern "C" fn framepump_frame_seq() -> u64 {
    guarded("framepump_frame_seq", 0, || {
        runtime_handle().map_or(0, |handle| handle.frame_seq())
    })
}

/// `true` while the pump thread is alive (it exits on stop, on core
/// creation failure, or after repeated render failures).
#[unsafe(no_mangle)]
pub extern "C" fn framepump_is_running() -> bool {
    guarded("framepump_is_running", false, || {
        runtime_handle().is_some_and(|handle| handle.is_running())
    })
}
