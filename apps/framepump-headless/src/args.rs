use std::path::PathBuf;

use clap::Parser;

/// Drive the frame pump against a built-in software core, simulating a host
/// view that resizes and a user picking ROM files.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// ROM files to pick, in order
    #[arg(long = "rom")]
    pub roms: Vec<PathBuf>,

    /// Stop after this many rendered frames
    #[arg(long, default_value_t = 600)]
    pub frames: u64,

    /// Target frame rate; omit to render as fast as the core allows
    #[arg(long)]
    pub fps: Option<u32>,

    /// Initial drawable size
    #[arg(long, value_parser = parse_size, default_value = "400x480")]
    pub size: (u32, u32),

    /// Drawable sizes applied while running, spread evenly over the run
    #[arg(long = "resize", value_parser = parse_size)]
    pub resizes: Vec<(u32, u32)>,

    /// Also dismiss the picker once without choosing a file
    #[arg(long)]
    pub cancel_pick: bool,

    /// Make the software core fail every Nth frame
    #[arg(long)]
    pub fail_render_every: Option<u64>,

    /// Stop after this many failed frames in a row (0 = never)
    #[arg(long, default_value_t = framepump_runtime::DEFAULT_MAX_CONSECUTIVE_RENDER_FAILURES)]
    pub max_render_failures: u32,

    /// tracing filter directive, e.g. `framepump_runtime=debug`
    #[arg(long, default_value = "info")]
    pub log: String,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{value}`"))?;
    let w: u32 = w.trim().parse().map_err(|e| format!("bad width `{w}`: {e}"))?;
    let h: u32 = h.trim().parse().map_err(|e| format!("bad height `{h}`: {e}"))?;
    if w == 0 || h == 0 {
        return Err(format!("size must be non-zero, got {w}x{h}"));
    }
    Ok((w, h))
}
