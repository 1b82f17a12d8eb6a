use std::{
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, Result, bail};
use crossbeam_channel::{Receiver, unbounded};
use framepump_runtime::{
    FramePacing, PickResult, Runtime, RuntimeConfig, RuntimeNotification, StopReason,
};

use crate::{
    args::Args,
    software_core::{FrameSink, SoftwareCore},
};

const UI_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Default)]
pub struct RunReport {
    pub frames: u64,
    pub render_failures: u64,
    pub elapsed: Duration,
    pub resizes_pushed: usize,
    pub roms_loaded: usize,
    pub stop_reason: Option<StopReason>,
    pub final_size: (u32, u32),
    pub checksum: u32,
}

impl RunReport {
    pub fn fps(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.frames as f64 / secs
        } else {
            0.0
        }
    }
}

/// Plays the role of the host UI thread.
pub struct App {
    args: Args,
    sink: FrameSink,
    runtime: Runtime<SoftwareCore>,
    events: Receiver<RuntimeNotification>,
    report: RunReport,
}

impl App {
    pub fn new(args: Args) -> Result<Self> {
        let config = RuntimeConfig {
            pacing: args.fps.map_or(FramePacing::Unbounded, FramePacing::from_fps),
            max_consecutive_render_failures: (args.max_render_failures > 0)
                .then_some(args.max_render_failures),
            start_paused: false,
        };

        let (tx, rx) = unbounded();
        let sink = FrameSink::new();
        let fail_every = args.fail_render_every;
        let runtime = Runtime::start_with_sender(
            config,
            sink.clone(),
            move || SoftwareCore::new(fail_every),
            Box::new(tx),
        )
        .context("Failed to start frame pump")?;

        Ok(Self {
            args,
            sink,
            runtime,
            events: rx,
            report: RunReport::default(),
        })
    }

    pub fn run(mut self) -> Result<RunReport> {
        let handle = self.runtime.handle();
        let started = Instant::now();

        let (w, h) = self.args.size;
        handle.set_drawable_size(w, h)?;
        // A size set now reaches the core before the frame after next.
        let mut settled_at = handle.frame_seq() + 2;

        let picker = handle.document_picker();
        if self.args.cancel_pick {
            picker.did_pick_document(PickResult::Cancelled)?;
        }
        for rom in &self.args.roms {
            match picker.did_pick_document(PickResult::Picked(rom.clone())) {
                Ok(outcome) => tracing::info!(path = %rom.display(), ?outcome, "picked ROM"),
                Err(e) => tracing::warn!("{e}"),
            }
        }

        let target = self.args.frames;
        let resizes = self.args.resizes.clone();
        let mut next_resize = 0;
        loop {
            self.drain_events();
            if !handle.is_running() {
                break;
            }

            let frames = handle.frame_seq();

            // Resize points are spread evenly across the run; each one is
            // rendered before the next is applied or the run ends.
            if let Some(&(w, h)) = resizes.get(next_resize)
                && frames >= settled_at
                && frames >= target * (next_resize as u64 + 1) / (resizes.len() as u64 + 1)
            {
                let changed = handle.set_drawable_size(w, h)?;
                tracing::debug!(w, h, changed, frame = frames, "host view resized");
                next_resize += 1;
                settled_at = frames + 2;
            } else if frames >= target && frames >= settled_at && next_resize == resizes.len() {
                break;
            }

            thread::sleep(UI_POLL_INTERVAL);
        }

        self.runtime.stop();
        self.drain_events();

        self.report.elapsed = started.elapsed();
        self.report.frames = handle.frame_seq();
        self.report.render_failures = handle.render_failures();
        self.report.final_size = handle.drawable_size();
        self.report.checksum = self.sink.snapshot().2;

        if let Some(StopReason::CoreCreateFailed) = self.report.stop_reason {
            bail!("emulator core could not be created");
        }
        Ok(self.report)
    }

    fn drain_events(&mut self) {
        for event in self.events.try_iter() {
            match &event {
                RuntimeNotification::RomLoaded { .. } => self.report.roms_loaded += 1,
                RuntimeNotification::OutputResized { .. } => self.report.resizes_pushed += 1,
                RuntimeNotification::PumpStopped { reason } => {
                    self.report.stop_reason = Some(*reason)
                }
                _ => {}
            }
            tracing::debug!(?event, "runtime notification");
        }
    }
}
