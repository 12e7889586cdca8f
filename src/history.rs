//! Shot history
//!
//! Keeps the most recent stored shots, newest first, so late joiners can
//! replay what they missed.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::persistence::ShotEnvelope;
use crate::sim::shot::ShotResult;

/// Maximum number of shots to keep
pub const MAX_HISTORY_ENTRIES: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShotHistory {
    pub entries: Vec<ShotEnvelope>,
}

impl ShotHistory {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a stored shot; returns false if its id is already present
    pub fn add(&mut self, envelope: ShotEnvelope) -> bool {
        if self.get(envelope.shot_id()).is_some() {
            return false;
        }

        // Newest first by save time
        let pos = self
            .entries
            .iter()
            .position(|e| envelope.saved_at > e.saved_at)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, envelope);
        self.entries.truncate(MAX_HISTORY_ENTRIES);
        true
    }

    /// Store a freshly fired shot
    pub fn record(&mut self, shot: ShotResult, saved_at: u64) -> bool {
        self.add(ShotEnvelope::new(shot, saved_at))
    }

    pub fn get(&self, shot_id: &str) -> Option<&ShotEnvelope> {
        self.entries.iter().find(|e| e.shot_id() == shot_id)
    }

    pub fn latest(&self) -> Option<&ShotEnvelope> {
        self.entries.first()
    }

    pub fn by_shooter<'a>(&'a self, shooter_ref: &'a str) -> impl Iterator<Item = &'a ShotEnvelope> {
        self.entries
            .iter()
            .filter(move |e| e.shot.shooter_ref() == shooter_ref)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load history from a JSON file (empty if missing)
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No shot history found, starting fresh");
            return Ok(Self::new());
        }
        let json = std::fs::read_to_string(path)?;
        let history: Self = serde_json::from_str(&json)?;
        for entry in &history.entries {
            entry.check_version()?;
        }
        log::info!("Loaded {} stored shots", history.entries.len());
        Ok(history)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Shot history saved ({} entries)", self.entries.len());
        Ok(())
    }
}
