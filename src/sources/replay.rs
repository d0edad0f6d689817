//! Replay source for recorded packet dumps
//!
//! A dump holds one JSON-encoded [`PacketEvent`] per line, as written by a
//! decoder capturing a live session. Blank lines are skipped.

use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::time::{Duration, Interval, MissedTickBehavior, interval};
use tracing::{debug, info, trace, warn};

use crate::source::PacketSource;
use crate::types::PacketEvent;
use crate::{RecorderError, Result};

/// Replay source reading a JSON-lines packet dump
pub struct ReplaySource {
    path: PathBuf,

    lines: Lines<BufReader<File>>,

    /// Line number of the last line read, for error context
    line: usize,

    /// Packet pacing; `None` replays as fast as the consumer reads
    interval: Option<Interval>,
}

impl ReplaySource {
    /// Open a dump for unpaced replay
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).await.map_err(|e| {
            RecorderError::source_failed_with_source(
                format!("cannot open replay {}", path.display()),
                Box::new(e),
            )
        })?;
        info!("Opened packet replay: {}", path.display());
        Ok(Self { path, lines: BufReader::new(file).lines(), line: 0, interval: None })
    }

    /// Pace packets at a fixed rate, as the live feed would deliver them.
    ///
    /// A rate that is not a positive finite number leaves replay unpaced.
    pub fn with_rate(mut self, packets_per_second: f64) -> Self {
        if !packets_per_second.is_finite() || packets_per_second <= 0.0 {
            warn!("Ignoring replay rate {}; replaying unpaced", packets_per_second);
            self.interval = None;
            return self;
        }
        let rate = packets_per_second.clamp(0.1, 10_000.0);
        let mut pacing = interval(Duration::from_secs_f64(1.0 / rate));
        pacing.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(pacing);
        debug!("Replay paced at {} packets/s", rate);
        self
    }

    /// Lines consumed so far
    pub fn lines_read(&self) -> usize {
        self.line
    }
}

#[async_trait::async_trait]
impl PacketSource for ReplaySource {
    async fn next_packet(&mut self) -> Result<Option<PacketEvent>> {
        loop {
            let line = self.lines.next_line().await.map_err(|e| {
                RecorderError::source_failed_with_source(
                    format!("read error in {}", self.path.display()),
                    Box::new(e),
                )
            })?;

            let Some(line) = line else {
                debug!("Reached end of replay after {} lines", self.line);
                return Ok(None);
            };
            self.line += 1;

            if line.trim().is_empty() {
                continue;
            }

            let event: PacketEvent =
                serde_json::from_str(&line).map_err(|e| RecorderError::Parse {
                    context: format!("{}:{}", self.path.display(), self.line),
                    details: e.to_string(),
                })?;

            if let Some(pacing) = self.interval.as_mut() {
                pacing.tick().await;
            }

            trace!(line = self.line, frame = event.frame, "Replayed packet");
            return Ok(Some(event));
        }
    }
}
