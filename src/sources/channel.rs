//! Channel and stream backed sources

use futures::{Stream, StreamExt};
use std::pin::Pin;
use tokio::sync::mpsc;

use crate::Result;
use crate::source::PacketSource;
use crate::types::PacketEvent;

/// Source fed by an external decoder through an mpsc channel.
///
/// The source ends once every sender has been dropped.
pub struct ChannelSource {
    rx: mpsc::Receiver<PacketEvent>,
}

impl ChannelSource {
    /// Create a bounded channel and the source reading from it
    pub fn channel(capacity: usize) -> (mpsc::Sender<PacketEvent>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx })
    }

    pub fn new(rx: mpsc::Receiver<PacketEvent>) -> Self {
        Self { rx }
    }
}

#[async_trait::async_trait]
impl PacketSource for ChannelSource {
    async fn next_packet(&mut self) -> Result<Option<PacketEvent>> {
        Ok(self.rx.recv().await)
    }
}

/// Source adapting any stream of packet events
pub struct StreamSource {
    stream: Pin<Box<dyn Stream<Item = PacketEvent> + Send>>,
}

impl StreamSource {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = PacketEvent> + Send + 'static,
    {
        Self { stream: stream.boxed() }
    }
}

#[async_trait::async_trait]
impl PacketSource for StreamSource {
    async fn next_packet(&mut self) -> Result<Option<PacketEvent>> {
        Ok(self.stream.next().await)
    }
}
