//! In-memory keyed lap store

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::sink::{LapArtifact, LapSink};
use crate::types::LapRecord;
use crate::{RecorderError, Result};

/// Lap store keyed by ordinal. Clones share the same store, so a handle can
/// be kept for inspection after the sink is moved into a coordinator.
#[derive(Debug, Clone, Default)]
pub struct MemoryLapSink {
    laps: Arc<Mutex<BTreeMap<u32, LapRecord>>>,
}

impl MemoryLapSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> MutexGuard<'_, BTreeMap<u32, LapRecord>> {
        // A panic while holding the lock cannot leave a half-inserted record
        self.laps.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, lap: u32) -> Option<LapRecord> {
        self.store().get(&lap).cloned()
    }

    /// Stored ordinals, ascending
    pub fn laps(&self) -> Vec<u32> {
        self.store().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.store().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store().is_empty()
    }
}

#[async_trait::async_trait]
impl LapSink for MemoryLapSink {
    async fn write(&mut self, record: LapRecord) -> Result<LapArtifact> {
        let lap = record.lap();
        let location = format!("memory://lap/{lap}");
        let mut store = self.store();
        if store.contains_key(&lap) {
            return Err(RecorderError::DuplicateArtifact { lap, path: location.into() });
        }
        let artifact = LapArtifact::for_record(&record, location);
        store.insert(lap, record);
        debug!(lap, samples = artifact.samples, "Lap stored in memory");
        Ok(artifact)
    }
}
