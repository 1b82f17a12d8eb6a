use std::{fs, path::Path, sync::Arc};

use framepump_runtime::{CoreError, CoreOutcome, EmulatorCore};
use parking_lot::Mutex;
use sha1::{Digest, Sha1};

/// CPU-side stand-in for a GPU drawable.
#[derive(Debug, Default)]
pub struct Framebuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u32>,
}

impl Framebuffer {
    /// Cheap content fingerprint for the run report.
    pub fn checksum(&self) -> u32 {
        self.pixels
            .iter()
            .fold(0x811C_9DC5u32, |acc, px| (acc ^ px).wrapping_mul(0x0100_0193))
    }
}

#[derive(Clone, Default)]
pub struct FrameSink(Arc<Mutex<Framebuffer>>);

impl FrameSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> (u32, u32, u32) {
        let fb = self.0.lock();
        (fb.width, fb.height, fb.checksum())
    }
}

// Top-screen resolution, used until the host pushes a drawable size.
const NATIVE_WIDTH: u32 = 400;
const NATIVE_HEIGHT: u32 = 240;

/// Renders a test pattern seeded by the loaded ROM's SHA-1.
pub struct SoftwareCore {
    width: u32,
    height: u32,
    seed: u32,
    frame: u64,
    fail_every: Option<u64>,
}

impl SoftwareCore {
    pub fn new(fail_every: Option<u64>) -> Result<Self, CoreError> {
        if fail_every == Some(0) {
            return Err(CoreError::create("fail-render-every must be at least 1"));
        }
        Ok(Self {
            width: NATIVE_WIDTH,
            height: NATIVE_HEIGHT,
            seed: 0,
            frame: 0,
            fail_every,
        })
    }
}

impl EmulatorCore for SoftwareCore {
    type Surface = FrameSink;

    fn run_frame(&mut self, surface: &FrameSink) -> CoreOutcome {
        self.frame += 1;
        if let Some(every) = self.fail_every
            && self.frame.is_multiple_of(every)
        {
            return Err(CoreError::render(format!("injected failure at frame {}", self.frame)));
        }

        let mut fb = surface.0.lock();
        fb.width = self.width;
        fb.height = self.height;
        fb.pixels
            .resize(self.width as usize * self.height as usize, 0);
        let tick = self.frame as u32;
        for (y, row) in fb.pixels.chunks_exact_mut(self.width as usize).enumerate() {
            for (x, px) in row.iter_mut().enumerate() {
                *px = (x as u32 ^ y as u32).wrapping_add(tick) ^ self.seed;
            }
        }
        Ok(())
    }

    fn set_output_size(&mut self, width: u32, height: u32) -> CoreOutcome {
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn load_rom(&mut self, path: &Path) -> CoreOutcome {
        let bytes = fs::read(path).map_err(|e| CoreError::load(e.to_string()))?;
        if bytes.is_empty() {
            return Err(CoreError::load("ROM image is empty"));
        }
        let digest = Sha1::digest(&bytes);
        tracing::info!(
            path = %path.display(),
            size = bytes.len(),
            sha1 = %hex::encode(digest),
            "software core loaded ROM"
        );
        self.seed = u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]);
        self.frame = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn renders_at_pushed_size() {
        let sink = FrameSink::new();
        let mut core = SoftwareCore::new(None).unwrap();
        core.run_frame(&sink).unwrap();
        assert_eq!(sink.snapshot().0, NATIVE_WIDTH);

        core.set_output_size(8, 4).unwrap();
        core.run_frame(&sink).unwrap();
        let (w, h, first) = sink.snapshot();
        assert_eq!((w, h), (8, 4));

        core.run_frame(&sink).unwrap();
        assert_ne!(sink.snapshot().2, first);
    }

    #[test]
    fn injected_failures() {
        let sink = FrameSink::new();
        let mut core = SoftwareCore::new(Some(3)).unwrap();
        core.set_output_size(2, 2).unwrap();
        let results: Vec<bool> = (0..6).map(|_| core.run_frame(&sink).is_ok()).collect();
        assert_eq!(results, [true, true, false, true, true, false]);
        assert!(SoftwareCore::new(Some(0)).is_err());
    }

    #[test]
    fn rom_seed_changes_output() {
        let mut rom = tempfile::NamedTempFile::new().unwrap();
        rom.write_all(b"NCSD not really a cartridge").unwrap();

        let sink = FrameSink::new();
        let mut core = SoftwareCore::new(None).unwrap();
        core.set_output_size(4, 4).unwrap();
        core.run_frame(&sink).unwrap();
        let unseeded = sink.snapshot().2;

        core.load_rom(rom.path()).unwrap();
        core.run_frame(&sink).unwrap();
        assert_ne!(sink.snapshot().2, unseeded);
    }

    #[test]
    fn missing_or_empty_rom_is_rejected() {
        let mut core = SoftwareCore::new(None).unwrap();
        assert!(matches!(
            core.load_rom(Path::new("/definitely/not/here.3ds")),
            Err(CoreError::LoadFailed { .. })
        ));

        let empty = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(
            core.load_rom(empty.path()),
            Err(CoreError::load("ROM image is empty"))
        );
    }
}
