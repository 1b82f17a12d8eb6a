use std::path::PathBuf;

use parking_lot::{Mutex, MutexGuard};

use super::{
    drawable::DrawableSize,
    emulator::{CoreError, CoreOutcome, EmulatorCore},
    picker::PickOutcome,
    types::RuntimeError,
};

/// Result of one pump iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameReport {
    /// Set when a pending resize was pushed (or attempted) before rendering.
    pub resize: Option<Result<(u32, u32), CoreError>>,
    pub render: CoreOutcome,
}

/// ROM that was parked before the core existed and loaded on install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeferredLoad {
    pub path: PathBuf,
    pub outcome: CoreOutcome,
}

struct Shared<C> {
    size: DrawableSize,
    core: Option<C>,
    pending_rom: Option<PathBuf>,
    rom_loaded: bool,
    // Set at teardown; nothing will create a core again.
    stopped: bool,
}

/// Owns the core handle and the drawable size behind a single lock.
///
/// Resize bookkeeping, ROM loads and frame renders are mutually exclusive:
/// the lock is held across a whole `run_frame` call, so a ROM is never
/// swapped under a frame in flight.
pub struct RenderCoordinator<C: EmulatorCore> {
    shared: Mutex<Shared<C>>,
}

impl<C: EmulatorCore> Default for RenderCoordinator<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: EmulatorCore> RenderCoordinator<C> {
    pub fn new() -> Self {
        Self {
            shared: Mutex::new(Shared {
                size: DrawableSize::new(),
                core: None,
                pending_rom: None,
                rom_loaded: false,
                stopped: false,
            }),
        }
    }

    /// UI thread: the host view reported a new drawable size.
    pub fn set_drawable_size(&self, width: u32, height: u32) -> bool {
        self.shared.lock().size.set(width, height)
    }

    pub fn drawable_size(&self) -> (u32, u32) {
        self.shared.lock().size.current()
    }

    pub fn has_core(&self) -> bool {
        self.shared.lock().core.is_some()
    }

    pub fn has_rom_loaded(&self) -> bool {
        self.shared.lock().rom_loaded
    }

    /// UI thread: load `path` into the core, or park it until the core has
    /// been created. A newer parked path replaces an older one. Fails with
    /// [`RuntimeError::AlreadyStopped`] after teardown.
    pub fn request_rom_load(&self, path: PathBuf) -> Result<PickOutcome, RuntimeError> {
        let mut shared = self.shared.lock();
        let shared = &mut *shared;
        if shared.stopped {
            return Err(RuntimeError::AlreadyStopped);
        }
        let Some(core) = shared.core.as_mut() else {
            shared.pending_rom = Some(path);
            return Ok(PickOutcome::Deferred);
        };

        let outcome = core.load_rom(&path);
        shared.rom_loaded = outcome.is_ok();
        outcome
            .map(|()| PickOutcome::Loaded)
            .map_err(|error| RuntimeError::LoadRomFailed { path, error })
    }

    /// Pump thread: hand over the freshly created core and apply a parked
    /// ROM, if any.
    pub fn install_core(&self, core: C) -> Option<DeferredLoad> {
        let mut shared = self.shared.lock();
        let shared = &mut *shared;
        let core = shared.core.insert(core);
        let path = shared.pending_rom.take()?;
        let outcome = core.load_rom(&path);
        shared.rom_loaded = outcome.is_ok();
        Some(DeferredLoad { path, outcome })
    }

    /// Pump thread: push a pending resize, then render one frame into
    /// `surface`. Returns `None` once the core has been taken.
    pub fn pump_once(&self, surface: &C::Surface) -> Option<FrameReport> {
        let mut guard = self.shared.lock();
        let shared = &mut *guard;
        let core = shared.core.as_mut()?;

        let resize = shared.size.consume().map(|(width, height)| {
            push_output_size(core, &mut shared.size, width, height).map(|()| (width, height))
        });
        let render = core.run_frame(surface);

        // Back-to-back frames would otherwise re-take the lock before a
        // waiting UI caller wakes up.
        MutexGuard::unlock_fair(guard);

        Some(FrameReport { resize, render })
    }

    /// Run `f` against the core under the coordinator lock (input events and
    /// other host calls that must not race a frame).
    pub fn with_core<R>(&self, f: impl FnOnce(&mut C) -> R) -> Option<R> {
        self.shared.lock().core.as_mut().map(f)
    }

    /// Remove the core for teardown, also when it was never created.
    /// Subsequent `pump_once` calls return `None`, ROM picks are refused and
    /// a still-parked ROM is discarded.
    pub fn take_core(&self) -> Option<C> {
        let mut shared = self.shared.lock();
        shared.stopped = true;
        shared.rom_loaded = false;
        if let Some(path) = shared.pending_rom.take() {
            tracing::warn!(path = %path.display(), "discarding ROM picked before the core existed");
        }
        shared.core.take()
    }
}

fn push_output_size<C: EmulatorCore>(
    core: &mut C,
    size: &mut DrawableSize,
    width: u32,
    height: u32,
) -> CoreOutcome {
    let outcome = core.set_output_size(width, height);
    if outcome.is_err() {
        // Core still has the old size; retry on the next frame.
        size.restore(width, height);
    }
    outcome
}
