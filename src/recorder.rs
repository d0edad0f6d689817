//! Recording handle tying a source, the driver and a sink together

use futures::Stream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::RecorderConfig;
use crate::coordinator::{IngestionCoordinator, IngestionReport, IngestionStatus};
use crate::driver::Driver;
use crate::sink::LapSink;
use crate::source::PacketSource;
use crate::{RecorderError, Result};

/// A running recording session.
///
/// Dropping the handle stops ingestion; the shutdown policy still applies to
/// the partial lap.
pub struct Recorder {
    /// Status watch receiver
    status: watch::Receiver<IngestionStatus>,

    /// Cancellation token shared by the reader and coordinator tasks
    cancel: CancellationToken,

    /// Coordinator task, taken by [`Recorder::finish`]
    task: Option<JoinHandle<Result<IngestionReport>>>,
}

impl Recorder {
    /// Start recording packets from `source` into `sink`
    pub fn start<P, S>(source: P, sink: S, config: &RecorderConfig) -> Result<Self>
    where
        P: PacketSource,
        S: LapSink,
    {
        config.validate()?;

        let channels = Driver::spawn(source, config.channel_capacity);
        let (status_tx, status_rx) = watch::channel(IngestionStatus::default());
        let coordinator = IngestionCoordinator::new(sink, config).with_status(status_tx);

        let task = tokio::spawn(coordinator.run(channels.packets, channels.cancel.clone()));
        info!("Recorder started");

        Ok(Self { status: status_rx, cancel: channels.cancel, task: Some(task) })
    }

    /// Latest status snapshot
    pub fn status(&self) -> IngestionStatus {
        self.status.borrow().clone()
    }

    /// Status snapshots as they change (latest wins)
    pub fn status_updates(&self) -> impl Stream<Item = IngestionStatus> + 'static {
        WatchStream::new(self.status.clone())
    }

    /// Stop ingestion; pending packets are not processed
    pub fn stop(&self) {
        debug!("Stopping recorder");
        self.cancel.cancel();
    }

    /// Wait for the session to end and return its report
    pub async fn finish(mut self) -> Result<IngestionReport> {
        let Some(task) = self.task.take() else {
            return Err(RecorderError::Terminated);
        };
        task.await.map_err(|e| {
            RecorderError::source_failed_with_source("coordinator task failed", Box::new(e))
        })?
    }

    /// Stop ingestion and wait for the shutdown policy to be applied
    pub async fn stop_and_finish(self) -> Result<IngestionReport> {
        self.stop();
        self.finish().await
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if self.task.is_some() {
            debug!("Dropping recorder");
            self.cancel.cancel();
        }
    }
}
