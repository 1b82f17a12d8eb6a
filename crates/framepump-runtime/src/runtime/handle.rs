use std::{
    path::PathBuf,
    sync::{Arc, atomic::Ordering},
    thread::{self, JoinHandle},
};

use super::{
    coordinator::RenderCoordinator,
    emulator::{CoreError, EmulatorCore},
    notify::{Notifier, RuntimeEventSender},
    picker::{DocumentPicker, PickOutcome},
    runner::Runner,
    state::RuntimeState,
    types::{PUMP_THREAD_NAME, RuntimeConfig, RuntimeError, RuntimeNotification},
};

struct RuntimeInner<C: EmulatorCore> {
    coordinator: Arc<RenderCoordinator<C>>,
    state: Arc<RuntimeState>,
    notifier: Arc<Notifier>,
}

/// Owns the pump thread. Dropping it stops the pump and joins the thread.
pub struct Runtime<C: EmulatorCore> {
    inner: Arc<RuntimeInner<C>>,
    join: Option<JoinHandle<()>>,
}

/// Cheap, cloneable access for UI callbacks.
pub struct RuntimeHandle<C: EmulatorCore> {
    inner: Arc<RuntimeInner<C>>,
}

impl<C: EmulatorCore> Clone for RuntimeHandle<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: EmulatorCore> Runtime<C> {
    /// Spawn the pump thread. `create_core` runs on that thread before the
    /// first frame; `surface` moves there and is passed to every frame.
    pub fn start<F>(
        config: RuntimeConfig,
        surface: C::Surface,
        create_core: F,
    ) -> Result<Self, RuntimeError>
    where
        F: FnOnce() -> Result<C, CoreError> + Send + 'static,
    {
        Self::start_internal(config, surface, create_core, None)
    }

    pub fn start_with_sender<F>(
        config: RuntimeConfig,
        surface: C::Surface,
        create_core: F,
        sender: Box<dyn RuntimeEventSender>,
    ) -> Result<Self, RuntimeError>
    where
        F: FnOnce() -> Result<C, CoreError> + Send + 'static,
    {
        Self::start_internal(config, surface, create_core, Some(sender))
    }

    fn start_internal<F>(
        config: RuntimeConfig,
        surface: C::Surface,
        create_core: F,
        event_sender: Option<Box<dyn RuntimeEventSender>>,
    ) -> Result<Self, RuntimeError>
    where
        F: FnOnce() -> Result<C, CoreError> + Send + 'static,
    {
        let coordinator = Arc::new(RenderCoordinator::new());
        let state = Arc::new(RuntimeState::new(config.start_paused));
        let notifier = Arc::new(Notifier::new(event_sender));

        let runner = Runner::new(
            Arc::clone(&coordinator),
            surface,
            Arc::clone(&state),
            Arc::clone(&notifier),
            config,
        );

        let join = thread::Builder::new()
            .name(PUMP_THREAD_NAME.to_string())
            .spawn(move || runner.run(create_core))
            .map_err(|e| RuntimeError::ThreadSpawn {
                error: e.to_string(),
            })?;

        tracing::debug!(?config, "frame pump started");

        Ok(Self {
            inner: Arc::new(RuntimeInner {
                coordinator,
                state,
                notifier,
            }),
            join: Some(join),
        })
    }

    pub fn handle(&self) -> RuntimeHandle<C> {
        RuntimeHandle {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Signal the pump and wait for it to finish its current frame and drop
    /// the core. Idempotent.
    pub fn stop(&mut self) {
        self.inner.state.stop.store(true, Ordering::Release);
        if let Some(join) = self.join.take()
            && join.join().is_err()
        {
            tracing::error!("frame pump thread panicked");
        }
    }
}

impl<C: EmulatorCore> Drop for Runtime<C> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<C: EmulatorCore> RuntimeHandle<C> {
    /// Record the host view's drawable size. Returns whether the core will
    /// receive a resize before its next frame.
    pub fn set_drawable_size(&self, width: u32, height: u32) -> Result<bool, RuntimeError> {
        if width == 0 || height == 0 {
            return Err(RuntimeError::InvalidDrawableSize { width, height });
        }
        Ok(self.inner.coordinator.set_drawable_size(width, height))
    }

    pub fn drawable_size(&self) -> (u32, u32) {
        self.inner.coordinator.drawable_size()
    }

    /// Load a ROM under the coordinator lock, or defer it until the core
    /// exists. Refused once the pump has stopped.
    pub fn load_rom(&self, path: impl Into<PathBuf>) -> Result<PickOutcome, RuntimeError> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(RuntimeError::EmptyRomPath);
        }

        tracing::info!(path = %path.display(), "loading ROM");
        let result = self.inner.coordinator.request_rom_load(path.clone());
        match &result {
            Ok(PickOutcome::Loaded) => {
                self.inner
                    .notifier
                    .broadcast(RuntimeNotification::RomLoaded { path });
            }
            Ok(PickOutcome::Deferred) => {
                tracing::debug!("core not created yet, ROM load deferred");
            }
            Ok(PickOutcome::Cancelled) => {}
            Err(RuntimeError::LoadRomFailed { error, .. }) => {
                tracing::warn!("{error}");
                self.inner
                    .notifier
                    .broadcast(RuntimeNotification::RomLoadFailed {
                        path,
                        error: error.clone(),
                    });
            }
            Err(RuntimeError::AlreadyStopped) => {
                tracing::warn!(path = %path.display(), "ROM picked after the frame pump stopped");
            }
            Err(_) => {}
        }
        result
    }

    pub fn document_picker(&self) -> DocumentPicker<C> {
        DocumentPicker::new(self.clone())
    }

    pub fn has_rom_loaded(&self) -> bool {
        self.inner.coordinator.has_rom_loaded()
    }

    /// Run `f` against the core under the same lock as frames and loads.
    /// `None` if the core has not been created or was already torn down.
    pub fn with_core<R>(&self, f: impl FnOnce(&mut C) -> R) -> Option<R> {
        self.inner.coordinator.with_core(f)
    }

    pub fn set_paused(&self, paused: bool) {
        self.inner.state.paused.store(paused, Ordering::Release);
    }

    pub fn paused(&self) -> bool {
        self.inner.state.paused.load(Ordering::Acquire)
    }

    /// Frames rendered successfully so far.
    pub fn frame_seq(&self) -> u64 {
        self.inner.state.frame_seq.load(Ordering::Acquire)
    }

    pub fn render_failures(&self) -> u64 {
        self.inner.state.render_failures.load(Ordering::Acquire)
    }

    /// `false` once the pump thread has exited for any reason.
    pub fn is_running(&self) -> bool {
        self.inner.state.running.load(Ordering::Acquire)
    }

    /// Ask the pump to stop after its current frame without waiting for it.
    pub fn request_stop(&self) {
        self.inner.state.stop.store(true, Ordering::Release);
    }

    pub fn subscribe_event(&self, sender: Box<dyn RuntimeEventSender>) {
        self.inner.notifier.subscribe(sender);
    }

    pub fn unsubscribe_event(&self) {
        self.inner.notifier.unsubscribe();
    }
}
