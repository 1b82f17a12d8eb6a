mod app;
mod args;
mod software_core;

use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::{app::App, args::Args};

fn init_tracing(args: &Args) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_new(&args.log).context("invalid --log filter")?;

    let Some(path) = &args.log_file else {
        let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
        tracing::subscriber::set_global_default(subscriber)
            .context("failed to install tracing subscriber")?;
        return Ok(None);
    };

    // Start every run with a fresh log file.
    let _ = fs::remove_file(path);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
    let file_name = path
        .file_name()
        .context("--log-file must name a file")?;
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking::NonBlockingBuilder::default()
        .lossy(false)
        .finish(file_appender);

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_thread_names(true)
        .with_writer(writer)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install tracing subscriber")?;
    Ok(Some(guard))
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = init_tracing(&args)?;

    let report = App::new(args)?.run()?;

    println!(
        "Rendered {} frame(s) in {:.2?} ({:.1} fps)",
        report.frames,
        report.elapsed,
        report.fps()
    );
    println!(
        "Render failures: {}, ROMs loaded: {}, resizes pushed: {}",
        report.render_failures, report.roms_loaded, report.resizes_pushed
    );
    println!(
        "Final drawable {}x{}, frame checksum {:08X}",
        report.final_size.0, report.final_size.1, report.checksum
    );
    if let Some(reason) = report.stop_reason {
        println!("Pump stopped: {reason:?}");
    }

    Ok(())
}
