//! Test utilities: synthetic sessions, sample builders and a failing sink
//!
//! Shared by unit tests and the benchmarks.

#![cfg(any(test, feature = "benchmark"))]

use std::collections::BTreeSet;

use crate::sink::{LapArtifact, LapSink};
use crate::sinks::MemoryLapSink;
use crate::types::{LapRecord, PacketEvent, Sample, SamplePayload};
use crate::{RecorderError, Result};

/// Install a test-friendly tracing subscriber, honouring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs it.
#[cfg(test)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn position_sample(frame: u32, x: f32, y: f32) -> Sample {
    Sample::new(frame, SamplePayload::Position { x, y })
}

pub fn progress_sample(frame: u32, distance: f32) -> Sample {
    Sample::new(frame, SamplePayload::Progress { distance })
}

/// Synthetic session: `laps` laps of `frames_per_lap` frames each.
///
/// Every frame emits a motion packet followed by a lap progress packet, and
/// the first progress packet of each new lap reports the previous lap time.
pub fn synthetic_session(laps: u32, frames_per_lap: u32) -> Vec<PacketEvent> {
    let mut events = Vec::with_capacity((laps * frames_per_lap * 2) as usize);
    let mut frame = 0u32;
    for lap in 1..=laps {
        for i in 0..frames_per_lap {
            let angle = i as f32 / frames_per_lap as f32 * std::f32::consts::TAU;
            events.push(PacketEvent::motion(frame, 500.0 * angle.cos(), 300.0 * angle.sin()));

            let mut progress = PacketEvent::lap_progress(frame, lap, i as f32 * 10.0);
            if i == 0 && lap > 1 {
                progress = progress.with_last_lap_time(90_000 + lap * 125);
            }
            events.push(progress);
            frame += 1;
        }
    }
    events
}

/// Sink that fails with a persistence error for selected laps and stores the rest
#[derive(Debug, Clone, Default)]
pub struct FailingSink {
    failing: BTreeSet<u32>,
    stored: MemoryLapSink,
}

impl FailingSink {
    pub fn failing_laps(laps: impl IntoIterator<Item = u32>) -> Self {
        Self { failing: laps.into_iter().collect(), stored: MemoryLapSink::new() }
    }

    /// Handle to the laps that were written successfully
    pub fn stored(&self) -> MemoryLapSink {
        self.stored.clone()
    }
}

#[async_trait::async_trait]
impl LapSink for FailingSink {
    async fn write(&mut self, record: LapRecord) -> Result<LapArtifact> {
        if self.failing.contains(&record.lap()) {
            return Err(RecorderError::persistence_failure(
                format!("failing://lap/{}", record.lap()).into(),
                std::io::Error::new(std::io::ErrorKind::StorageFull, "storage unavailable"),
            ));
        }
        self.stored.write(record).await
    }
}
