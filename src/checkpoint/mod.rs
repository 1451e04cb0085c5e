//! Checkpoint and resume for calculator sessions.
//!
//! A checkpoint captures the builder state and the history ledger so a
//! session survives a restart. History listeners and in-flight
//! evaluations are not serializable and are not captured.

use crate::core::{BuilderState, HistoryEntry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;
use uuid::Uuid;

pub mod error;

pub use error::CheckpointError;

/// Version identifier for checkpoint format
pub const CHECKPOINT_VERSION: u32 = 1;

/// Serializable snapshot of a [`Session`](crate::session::Session).
///
/// # Example
///
/// ```rust
/// use tally::checkpoint::SessionCheckpoint;
/// use tally::session::{Action, Session};
/// use tally::config::CalculatorConfig;
///
/// let mut session = Session::default();
/// session.apply(Action::Digit('7')).unwrap();
///
/// let json = session.checkpoint().to_json().unwrap();
/// let restored = Session::restore(
///     SessionCheckpoint::from_json(&json).unwrap(),
///     &CalculatorConfig::default(),
/// )
/// .unwrap();
///
/// assert_eq!(restored.id(), session.id());
/// assert_eq!(restored.frame().primary, "7");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionCheckpoint {
    /// Checkpoint format version
    pub version: u32,

    /// Session the checkpoint was taken from
    pub id: Uuid,

    /// When checkpoint was created
    pub timestamp: DateTime<Utc>,

    pub builder: BuilderState,

    /// History entries, most recent first
    pub history: Vec<HistoryEntry>,
}

impl SessionCheckpoint {
    pub fn new(id: Uuid, builder: BuilderState, history: Vec<HistoryEntry>) -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            id,
            timestamp: Utc::now(),
            builder,
            history,
        }
    }

    /// Reject checkpoints written by an incompatible format version.
    pub fn ensure_supported(&self) -> Result<(), CheckpointError> {
        if self.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion {
                found: self.version,
                supported: CHECKPOINT_VERSION,
            });
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, CheckpointError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let checkpoint: Self = serde_json::from_str(json)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.ensure_supported()?;
        Ok(checkpoint)
    }

    /// Compact binary encoding.
    pub fn to_binary(&self) -> Result<Vec<u8>, CheckpointError> {
        bincode::serialize(self).map_err(|e| CheckpointError::SerializationFailed(e.to_string()))
    }

    pub fn from_binary(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let checkpoint: Self = bincode::deserialize(bytes)
            .map_err(|e| CheckpointError::DeserializationFailed(e.to_string()))?;
        checkpoint.ensure_supported()?;
        Ok(checkpoint)
    }

    /// Write as JSON. The file is written to a sibling temp path first and
    /// renamed into place, so a crash never leaves a torn checkpoint.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CheckpointError> {
        let path = path.as_ref();
        let temp_path = path.with_extension("tmp");

        fs::write(&temp_path, self.to_json()?).map_err(|source| CheckpointError::Io {
            path: temp_path.clone(),
            source,
        })?;
        fs::rename(&temp_path, path).map_err(|source| CheckpointError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(session = %self.id, path = %path.display(), "Checkpoint saved");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CheckpointError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| CheckpointError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}
