use std::{
    sync::{Arc, atomic::Ordering},
    thread,
    time::{Duration, Instant},
};

use super::{
    coordinator::{FrameReport, RenderCoordinator},
    emulator::{CoreError, EmulatorCore},
    notify::Notifier,
    state::RuntimeState,
    types::{
        FramePacing, MAX_SLEEP_CHUNK, PAUSE_POLL_INTERVAL, RuntimeConfig, RuntimeNotification,
        SPIN_THRESHOLD, SPIN_YIELD_EVERY, StopReason,
    },
};

enum WaitOutcome {
    /// Stop was requested while waiting.
    Exit,
    /// The target deadline has been reached.
    DeadlineReached,
}

/// Body of the pump thread.
pub(crate) struct Runner<C: EmulatorCore> {
    coordinator: Arc<RenderCoordinator<C>>,
    surface: C::Surface,
    state: Arc<RuntimeState>,
    notifier: Arc<Notifier>,
    config: RuntimeConfig,
    next_frame_deadline: Instant,
    consecutive_failures: u32,
}

impl<C: EmulatorCore> Runner<C> {
    pub(crate) fn new(
        coordinator: Arc<RenderCoordinator<C>>,
        surface: C::Surface,
        state: Arc<RuntimeState>,
        notifier: Arc<Notifier>,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            coordinator,
            surface,
            state,
            notifier,
            config,
            next_frame_deadline: Instant::now(),
            consecutive_failures: 0,
        }
    }

    pub(crate) fn run<F>(mut self, create_core: F)
    where
        F: FnOnce() -> Result<C, CoreError>,
    {
        let reason = match create_core() {
            Ok(core) => {
                self.install(core);
                self.pump()
            }
            Err(error) => {
                tracing::error!("emulator core creation failed: {error}");
                self.notifier
                    .broadcast(RuntimeNotification::CoreCreateFailed { error });
                StopReason::CoreCreateFailed
            }
        };
        // Tear the core down here so it is destroyed on the thread that
        // created it. Picks after this point are refused.
        drop(self.coordinator.take_core());

        tracing::info!(?reason, "frame pump stopped");
        self.state.running.store(false, Ordering::Release);
        self.notifier
            .broadcast(RuntimeNotification::PumpStopped { reason });
    }

    fn install(&mut self, core: C) {
        let deferred = self.coordinator.install_core(core);
        tracing::info!("emulator core created");
        self.notifier.broadcast(RuntimeNotification::CoreCreated);

        let Some(load) = deferred else {
            return;
        };
        match load.outcome {
            Ok(()) => {
                tracing::info!(path = %load.path.display(), "loaded deferred ROM");
                self.notifier
                    .broadcast(RuntimeNotification::RomLoaded { path: load.path });
            }
            Err(error) => {
                tracing::warn!(path = %load.path.display(), "deferred ROM load failed: {error}");
                self.notifier.broadcast(RuntimeNotification::RomLoadFailed {
                    path: load.path,
                    error,
                });
            }
        }
    }

    fn pump(&mut self) -> StopReason {
        let mut last_paused = self.state.paused.load(Ordering::Acquire);

        loop {
            if self.state.stop.load(Ordering::Acquire) {
                return StopReason::Requested;
            }

            let paused = self.state.paused.load(Ordering::Acquire);
            if paused != last_paused && !paused {
                self.next_frame_deadline = Instant::now();
            }
            last_paused = paused;

            if paused {
                thread::sleep(PAUSE_POLL_INTERVAL);
                continue;
            }

            if let FramePacing::Interval(interval) = self.config.pacing {
                if let WaitOutcome::Exit = self.wait_until_next_deadline() {
                    return StopReason::Requested;
                }
                self.advance_deadline(interval);
            }

            let Some(report) = self.coordinator.pump_once(&self.surface) else {
                // Core was taken out from under us.
                return StopReason::Requested;
            };
            if let Some(reason) = self.handle_report(report) {
                return reason;
            }
        }
    }

    fn handle_report(&mut self, report: FrameReport) -> Option<StopReason> {
        match report.resize {
            Some(Ok((width, height))) => {
                tracing::debug!(width, height, "pushed output size to core");
                self.notifier
                    .broadcast(RuntimeNotification::OutputResized { width, height });
            }
            Some(Err(error)) => {
                tracing::warn!("output resize failed: {error}");
                self.notifier
                    .broadcast(RuntimeNotification::ResizeFailed { error });
            }
            None => {}
        }

        let frame = self.state.frame_seq.load(Ordering::Relaxed);
        match report.render {
            Ok(()) => {
                self.consecutive_failures = 0;
                self.state.frame_seq.fetch_add(1, Ordering::AcqRel);
                None
            }
            Err(error) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                self.state.render_failures.fetch_add(1, Ordering::AcqRel);
                tracing::warn!(frame, consecutive = self.consecutive_failures, "{error}");
                self.notifier
                    .broadcast(RuntimeNotification::RenderFailed { frame, error });

                let limit = self.config.max_consecutive_render_failures?;
                (self.consecutive_failures >= limit).then(|| {
                    tracing::error!(
                        count = self.consecutive_failures,
                        "too many consecutive render failures, stopping pump"
                    );
                    StopReason::RenderFailures {
                        count: self.consecutive_failures,
                    }
                })
            }
        }
    }

    fn advance_deadline(&mut self, interval: Duration) {
        self.next_frame_deadline += interval;
        let now = Instant::now();
        // Resync instead of bursting after a long stall.
        if now > self.next_frame_deadline
            && now.duration_since(self.next_frame_deadline) > interval * 2
        {
            self.next_frame_deadline = now;
        }
    }

    fn wait_until_next_deadline(&self) -> WaitOutcome {
        loop {
            if self.state.stop.load(Ordering::Acquire) {
                return WaitOutcome::Exit;
            }

            let now = Instant::now();
            if now >= self.next_frame_deadline {
                return WaitOutcome::DeadlineReached;
            }

            let remaining = self.next_frame_deadline - now;

            // Coarse phase: sleep in chunks while still far from the deadline,
            // but always keep a final spin window.
            if remaining > SPIN_THRESHOLD {
                thread::sleep((remaining - SPIN_THRESHOLD).min(MAX_SLEEP_CHUNK));
                continue;
            }

            let mut spins: u32 = 0;
            while Instant::now() < self.next_frame_deadline {
                std::hint::spin_loop();
                spins = spins.wrapping_add(1);
                if spins.is_multiple_of(SPIN_YIELD_EVERY) {
                    thread::yield_now();
                }
            }

            return WaitOutcome::DeadlineReached;
        }
    }
}
