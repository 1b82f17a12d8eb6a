use std::path::PathBuf;

use super::{emulator::EmulatorCore, handle::RuntimeHandle, types::RuntimeError};

/// What the host's document picker reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickResult {
    Picked(PathBuf),
    Cancelled,
}

impl PickResult {
    /// Pickers may hand back several URLs; only the first one is used.
    pub fn first_of<I>(paths: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<PathBuf>,
    {
        paths
            .into_iter()
            .next()
            .map_or(Self::Cancelled, |path| Self::Picked(path.into()))
    }
}

impl From<Option<PathBuf>> for PickResult {
    fn from(value: Option<PathBuf>) -> Self {
        value.map_or(Self::Cancelled, Self::Picked)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickOutcome {
    /// The core accepted the ROM.
    Loaded,
    /// The core does not exist yet; the ROM loads as soon as it does.
    Deferred,
    /// The user dismissed the picker. The core was not touched.
    Cancelled,
}

/// UI-thread delegate for the host's file picker.
pub struct DocumentPicker<C: EmulatorCore> {
    runtime: RuntimeHandle<C>,
}

impl<C: EmulatorCore> DocumentPicker<C> {
    pub fn new(runtime: RuntimeHandle<C>) -> Self {
        Self { runtime }
    }

    /// Picker completion callback.
    ///
    /// Blocks for at most one in-flight frame while waiting for the
    /// coordinator lock.
    pub fn did_pick_document(&self, result: PickResult) -> Result<PickOutcome, RuntimeError> {
        match result {
            PickResult::Cancelled => {
                tracing::debug!("document picker cancelled");
                Ok(PickOutcome::Cancelled)
            }
            PickResult::Picked(path) => self.runtime.load_rom(path),
        }
    }
}
