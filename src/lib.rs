//! Records a live racing telemetry feed into one dataset per completed lap.
//!
//! Lapsink consumes already-decoded telemetry packets (motion, lap progress,
//! subsystem telemetry), buffers per-frame samples for the lap being driven,
//! detects lap boundaries from the reported lap number and persists every
//! completed lap as its own artifact.
//!
//! # Features
//!
//! - **Serialized ingestion**: one reader task, one single-consumer queue, one coordinator
//! - **Explicit session state**: lap ordinal and sample buffer owned by the coordinator
//! - **No silent overwrites**: a second artifact for the same lap is an error
//! - **Configurable shutdown**: flush or discard the partial lap when the feed stops
//!
//! ## Example (packet dump replay)
//!
//! ```rust,no_run
//! use lapsink::{Lapsink, RecorderConfig};
//!
//! #[tokio::main]
//! async fn main() -> lapsink::Result<()> {
//!     let config = RecorderConfig::from_file("recorder.yaml")?;
//!     let recorder = Lapsink::replay("session.jsonl", &config).await?;
//!     let report = recorder.finish().await?;
//!     println!("{} laps written", report.laps_written.len());
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod config;
mod error;
#[cfg_attr(any(test, feature = "benchmark"), path = "test_utils.rs")]
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Lap state
pub mod accumulator;
pub mod detector;

// Stream-based ingestion architecture
pub mod coordinator;
pub mod driver;
pub mod recorder;
pub mod source;
pub mod sources;

// Persistence
pub mod sink;
pub mod sinks;

// Core exports
pub use config::*;
pub use error::*;
pub use types::*;

pub use accumulator::LapAccumulator;
pub use coordinator::{
    CoordinatorState, IngestionCoordinator, IngestionReport, IngestionStatus, LapEvent,
    SessionState, WriteFailure,
};
pub use detector::{LapBoundary, LapBoundaryDetector};
pub use recorder::Recorder;
pub use sink::{LapArtifact, LapSink};
pub use sinks::{JsonLapWriter, MemoryLapSink};
pub use source::PacketSource;
pub use sources::{ChannelSource, ReplaySource, StreamSource};

/// Unified entry point for recording sessions.
///
/// Both constructors write JSON artifacts to `config.output_dir`.
pub struct Lapsink;

impl Lapsink {
    /// Record packets from any source.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use lapsink::{ChannelSource, Lapsink, RecorderConfig};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> lapsink::Result<()> {
    /// let (decoder_tx, source) = ChannelSource::channel(1024);
    /// let recorder = Lapsink::record(source, &RecorderConfig::default())?;
    /// // hand decoder_tx to the feed decoder...
    /// # drop(decoder_tx);
    /// recorder.finish().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn record<P: PacketSource>(source: P, config: &RecorderConfig) -> Result<Recorder> {
        let writer = JsonLapWriter::from_config(config)?;
        Recorder::start(source, writer, config)
    }

    /// Record a JSON-lines packet dump.
    ///
    /// # Errors
    ///
    /// Returns an error if the dump cannot be opened or the configuration is
    /// invalid.
    pub async fn replay<P: AsRef<std::path::Path>>(
        path: P,
        config: &RecorderConfig,
    ) -> Result<Recorder> {
        let source = ReplaySource::open(path).await?;
        Self::record(source, config)
    }
}
