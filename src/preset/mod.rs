// Presets - Settings records saved in numbered slots
//
// Each slot is one JSON file holding a flat `SettingsRecord`. A missing or
// unreadable file is simply an empty slot.

use std::fs;
use std::path::{Path, PathBuf};

use crate::sequencer::settings::SettingsRecord;
use crate::sequencer::subdivision::Subdivision;

pub const SLOT_COUNT: u8 = 5;

/// Preset error types
#[derive(Debug, thiserror::Error)]
pub enum PresetError {
    #[error("Invalid preset slot {0} (expected 1-5)")]
    InvalidSlot(u8),

    #[error("No preset directory available")]
    NoPresetDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct PresetStore {
    dir: PathBuf,
}

impl PresetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store under the user data directory
    pub fn open_default() -> Result<Self, PresetError> {
        default_preset_dir()
            .map(Self::new)
            .ok_or(PresetError::NoPresetDir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn slot_path(&self, slot: u8) -> Result<PathBuf, PresetError> {
        check_slot(slot)?;
        Ok(self.dir.join(format!("metronome_preset_{}.json", slot)))
    }

    pub fn save(&self, slot: u8, record: &SettingsRecord) -> Result<(), PresetError> {
        let path = self.slot_path(slot)?;
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&path, json)?;
        tracing::info!("Saved preset {} to {}", slot, path.display());
        Ok(())
    }

    /// The record in `slot`, or `None` when empty or malformed
    pub fn load(&self, slot: u8) -> Option<SettingsRecord> {
        let path = self.slot_path(slot).ok()?;
        let data = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&data) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Ignoring malformed preset {} ({}): {}", slot, path.display(), e);
                None
            }
        }
    }

    pub fn delete(&self, slot: u8) -> Result<bool, PresetError> {
        let path = self.slot_path(slot)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// One-line description of a slot, `None` when empty
    pub fn summary(&self, slot: u8) -> Option<String> {
        self.load(slot).map(|record| summarize(&record))
    }

    /// Summaries of every slot, in slot order
    pub fn list(&self) -> Vec<(u8, Option<String>)> {
        (1..=SLOT_COUNT).map(|slot| (slot, self.summary(slot))).collect()
    }
}

/// "<tempo> BPM, <n>/<d>, <subdivision label>"
pub fn summarize(record: &SettingsRecord) -> String {
    let label = Subdivision::from_id(&record.subdivision)
        .map(|s| s.label())
        .unwrap_or(record.subdivision.as_str());
    format!(
        "{} BPM, {}/{}, {}",
        record.tempo.round(),
        record.beats_per_measure,
        record.note_value,
        label
    )
}

pub fn default_preset_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("pulse_metronome").join("presets"))
}

fn check_slot(slot: u8) -> Result<(), PresetError> {
    if (1..=SLOT_COUNT).contains(&slot) {
        Ok(())
    } else {
        Err(PresetError::InvalidSlot(slot))
    }
}
