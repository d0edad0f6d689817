//! Ingestion coordinator: routes packets, detects boundaries, flushes laps
//!
//! The coordinator is the only owner of the session state. Packets are
//! handled one at a time, so appending, lap comparison and draining never
//! interleave.
//!
//! ## Dispatch
//!
//! - motion packets append a position sample
//! - lap progress packets are checked against the current lap first; on a
//!   boundary the buffer is drained into a [`LapRecord`] for the lap that
//!   ended, then the progress sample is appended to the new lap
//! - telemetry packets append a sample only when `record_telemetry` is set
//!
//! ```rust
//! use lapsink::{IngestionCoordinator, MemoryLapSink, PacketEvent, RecorderConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> lapsink::Result<()> {
//! let store = MemoryLapSink::new();
//! let mut coordinator = IngestionCoordinator::new(store.clone(), &RecorderConfig::default());
//!
//! coordinator.handle(PacketEvent::lap_progress(1, 1, 10.0)).await?;
//! coordinator.handle(PacketEvent::motion(2, 1.0, 2.0)).await?;
//! coordinator.handle(PacketEvent::lap_progress(3, 2, 0.0)).await?;
//!
//! assert_eq!(store.get(1).map(|lap| lap.len()), Some(2));
//! # Ok(())
//! # }
//! ```

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::accumulator::LapAccumulator;
use crate::config::{RecorderConfig, ShutdownPolicy, WriteErrorPolicy};
use crate::detector::LapBoundaryDetector;
use crate::sink::{LapArtifact, LapSink};
use crate::types::{LapRecord, Packet, PacketEvent, Sample};
use crate::{RecorderError, Result};

/// Lifecycle of an ingestion run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum CoordinatorState {
    /// No packet seen yet
    #[default]
    Idle,
    Recording,
    /// Source closed or stopped; no more packets are accepted
    Terminated,
}

/// Something that happened to a lap record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum LapEvent {
    Written(LapArtifact),
    WriteFailed { lap: u32, reason: String, data_loss: bool },
    Discarded { lap: u32, samples: usize },
}

/// A lap that could not be persisted
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct WriteFailure {
    pub lap: u32,
    pub samples: usize,
    pub reason: String,
}

/// Counters and outcomes of an ingestion run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct IngestionReport {
    pub packets: u64,
    pub samples: u64,
    pub malformed: u64,
    pub out_of_order_boundaries: u64,
    pub laps_written: Vec<LapArtifact>,
    pub laps_discarded: Vec<u32>,
    pub write_failures: Vec<WriteFailure>,
}

/// Snapshot published after every handled packet
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct IngestionStatus {
    pub state: CoordinatorState,
    pub current_lap: u32,
    pub buffered_samples: usize,
    pub packets: u64,
    pub malformed: u64,
    pub laps_written: usize,
    pub write_failures: usize,
    pub last_event: Option<LapEvent>,
}

/// Active lap ordinal and its sample buffer
#[derive(Debug, Default)]
pub struct SessionState {
    accumulator: LapAccumulator,
    detector: LapBoundaryDetector,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lap currently being recorded
    pub fn current_lap(&self) -> u32 {
        self.detector.current_lap()
    }

    /// Samples buffered for the current lap
    pub fn buffered(&self) -> &[Sample] {
        self.accumulator.samples()
    }
}

/// Drives one recording session over a packet stream
pub struct IngestionCoordinator<S: LapSink> {
    sink: S,
    session: SessionState,
    state: CoordinatorState,
    config: RecorderConfig,
    report: IngestionReport,
    last_event: Option<LapEvent>,
    status: Option<watch::Sender<IngestionStatus>>,
}

impl<S: LapSink> IngestionCoordinator<S> {
    pub fn new(sink: S, config: &RecorderConfig) -> Self {
        Self {
            sink,
            session: SessionState::new(),
            state: CoordinatorState::Idle,
            config: config.clone(),
            report: IngestionReport::default(),
            last_event: None,
            status: None,
        }
    }

    /// Publish an [`IngestionStatus`] after every packet and lap event
    pub fn with_status(mut self, status: watch::Sender<IngestionStatus>) -> Self {
        self.status = Some(status);
        self.publish();
        self
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn report(&self) -> &IngestionReport {
        &self.report
    }

    pub fn into_report(self) -> IngestionReport {
        self.report
    }

    /// Current status snapshot
    pub fn status(&self) -> IngestionStatus {
        IngestionStatus {
            state: self.state,
            current_lap: self.session.current_lap(),
            buffered_samples: self.session.accumulator.len(),
            packets: self.report.packets,
            malformed: self.report.malformed,
            laps_written: self.report.laps_written.len(),
            write_failures: self.report.write_failures.len(),
            last_event: self.last_event.clone(),
        }
    }

    fn publish(&self) {
        if let Some(status) = &self.status {
            status.send_replace(self.status());
        }
    }

    fn append(&mut self, sample: Sample) {
        self.session.accumulator.append(sample);
        self.report.samples += 1;
    }

    /// Handle one packet.
    ///
    /// Returns the lap event produced by a boundary, if any. Malformed packets
    /// are counted and skipped. With [`WriteErrorPolicy::FailFast`] a failed
    /// write is returned as an error; the session state has already moved to
    /// the next lap at that point.
    pub async fn handle(&mut self, event: PacketEvent) -> Result<Option<LapEvent>> {
        match self.state {
            CoordinatorState::Terminated => return Err(RecorderError::Terminated),
            CoordinatorState::Idle => {
                info!("First packet received (frame {}), recording", event.frame);
                self.state = CoordinatorState::Recording;
            }
            CoordinatorState::Recording => {}
        }
        self.report.packets += 1;

        let packet = match Packet::try_from(event) {
            Ok(packet) => packet,
            Err(e) => {
                warn!("Skipping packet: {}", e);
                self.report.malformed += 1;
                self.publish();
                return Ok(None);
            }
        };

        let completed = match packet {
            Packet::Motion(_) => {
                self.append(packet.sample());
                None
            }
            Packet::Progress(progress) => {
                let completed = self
                    .session
                    .detector
                    .observe(progress.lap_number, progress.last_lap_time_ms)
                    .map(|boundary| {
                        if boundary.out_of_order {
                            self.report.out_of_order_boundaries += 1;
                        }
                        LapRecord::new(
                            boundary.completed_lap,
                            self.session.accumulator.drain(),
                            boundary.lap_time_ms,
                        )
                    });
                // The triggering sample belongs to the lap it reports
                self.append(packet.sample());
                completed
            }
            Packet::Telemetry(_) => {
                if self.config.record_telemetry {
                    self.append(packet.sample());
                } else {
                    trace!(frame = packet.frame(), "Telemetry packet not recorded");
                }
                None
            }
        };

        let outcome = match completed {
            Some(record) => self.persist(record).await,
            None => Ok(None),
        };
        self.publish();
        outcome
    }

    async fn persist(&mut self, record: LapRecord) -> Result<Option<LapEvent>> {
        if record.is_empty() {
            debug!(lap = record.lap(), "Lap has no samples, nothing to write");
            return Ok(None);
        }

        let lap = record.lap();
        let samples = record.len();
        let timeout = self.config.write_timeout();
        let result = match tokio::time::timeout(timeout, self.sink.write(record)).await {
            Ok(result) => result,
            Err(_) => Err(RecorderError::Timeout { duration: timeout }),
        };

        match result {
            Ok(artifact) => {
                self.report.laps_written.push(artifact.clone());
                let event = LapEvent::Written(artifact);
                self.last_event = Some(event.clone());
                Ok(Some(event))
            }
            Err(e) => {
                error!("Lap {} was not persisted ({} samples lost): {}", lap, samples, e);
                self.report.write_failures.push(WriteFailure {
                    lap,
                    samples,
                    reason: e.to_string(),
                });
                let event = LapEvent::WriteFailed {
                    lap,
                    reason: e.to_string(),
                    data_loss: e.is_data_loss(),
                };
                self.last_event = Some(event.clone());
                match self.config.write_error_policy {
                    WriteErrorPolicy::FailFast => Err(e),
                    WriteErrorPolicy::Continue => Ok(Some(event)),
                }
            }
        }
    }

    /// Stop accepting packets and apply the shutdown policy to the partial lap.
    ///
    /// Calling it again is a no-op.
    pub async fn terminate(&mut self) -> Result<Option<LapEvent>> {
        if self.state == CoordinatorState::Terminated {
            return Ok(None);
        }
        self.state = CoordinatorState::Terminated;

        let lap = self.session.current_lap();
        let samples = self.session.accumulator.drain();
        let outcome = match self.config.shutdown_policy {
            ShutdownPolicy::Flush => {
                info!("Terminating, flushing partial lap {} ({} samples)", lap, samples.len());
                self.persist(LapRecord::new(lap, samples, None)).await
            }
            ShutdownPolicy::Discard if samples.is_empty() => Ok(None),
            ShutdownPolicy::Discard => {
                info!("Terminating, discarding partial lap {} ({} samples)", lap, samples.len());
                self.report.laps_discarded.push(lap);
                let event = LapEvent::Discarded { lap, samples: samples.len() };
                self.last_event = Some(event.clone());
                Ok(Some(event))
            }
        };
        self.publish();
        outcome
    }

    /// Single-consumer processing loop.
    ///
    /// Runs until the queue closes or `cancel` fires, then terminates the
    /// session. Returns the run report, or the first write error under
    /// [`WriteErrorPolicy::FailFast`].
    pub async fn run(
        mut self,
        mut packets: mpsc::Receiver<PacketEvent>,
        cancel: CancellationToken,
    ) -> Result<IngestionReport> {
        info!(
            "Ingestion started, writing laps (shutdown policy: {:?})",
            self.config.shutdown_policy
        );

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Ingestion stopped");
                    None
                }
                event = packets.recv() => event,
            };
            let Some(event) = next else { break };

            if let Err(e) = self.handle(event).await {
                error!("Ingestion aborted: {}", e);
                self.state = CoordinatorState::Terminated;
                self.publish();
                return Err(e);
            }
        }

        self.terminate().await?;
        info!(
            "Ingestion finished: {} packets, {} laps written, {} failed",
            self.report.packets,
            self.report.laps_written.len(),
            self.report.write_failures.len()
        );
        Ok(self.into_report())
    }
}
