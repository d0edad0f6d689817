//! Sink trait for persisting completed laps

use serde::Serialize;

use crate::Result;
use crate::types::LapRecord;

/// Where and what a successful write persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct LapArtifact {
    pub lap: u32,
    /// File path or store key
    pub location: String,
    pub samples: usize,
    pub lap_time_ms: Option<u32>,
}

impl LapArtifact {
    pub fn for_record(record: &LapRecord, location: impl Into<String>) -> Self {
        Self {
            lap: record.lap(),
            location: location.into(),
            samples: record.len(),
            lap_time_ms: record.lap_time_ms(),
        }
    }
}

/// Trait for lap record destinations
///
/// Sinks receive each record by value exactly once, after its lap boundary
/// has been confirmed. They own no state shared with ingestion.
#[async_trait::async_trait]
pub trait LapSink: Send + 'static {
    /// Persist one lap record
    ///
    /// Returns:
    /// - `Ok(artifact)` - Record stored durably
    /// - `Err(RecorderError::DuplicateArtifact)` - A record for this lap already exists
    /// - `Err(RecorderError::PersistenceFailure)` - Storage failed; the record is lost
    ///
    /// Implementations must never replace an existing artifact and must not
    /// retry silently.
    async fn write(&mut self, record: LapRecord) -> Result<LapArtifact>;
}
