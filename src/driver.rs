//! Driver spawns and manages the packet reader task

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::RecorderError;
use crate::source::PacketSource;
use crate::types::PacketEvent;

/// Consecutive source errors tolerated before the reader gives up
const MAX_ERRORS: u32 = 10;

/// Result of spawning the driver task
pub struct DriverChannels {
    /// Single-consumer queue of packets in arrival order
    pub packets: mpsc::Receiver<PacketEvent>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
}

/// Driver spawns and manages the packet reader task
///
/// The reader task owns the source and serializes every packet into one
/// bounded queue, so the coordinator sees packets one at a time and in order.
pub struct Driver;

impl Driver {
    /// Spawn the reader task for the given source
    ///
    /// The queue closes when the source ends, gives up after repeated errors,
    /// or the token is cancelled.
    pub fn spawn<S>(source: S, capacity: usize) -> DriverChannels
    where
        S: PacketSource,
    {
        let (packet_tx, packet_rx) = mpsc::channel(capacity.max(1));
        let cancel = CancellationToken::new();
        let cancel_reader = cancel.clone();

        tokio::spawn(async move {
            Self::packet_reader_task(source, packet_tx, cancel_reader).await;
        });

        DriverChannels { packets: packet_rx, cancel }
    }

    /// Packet reader task - pulls from the source and forwards into the queue
    async fn packet_reader_task<S>(
        mut source: S,
        packet_tx: mpsc::Sender<PacketEvent>,
        cancel: CancellationToken,
    ) where
        S: PacketSource,
    {
        info!("Packet reader task started");
        let mut packet_count = 0u64;
        let mut error_count = 0u32;

        loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Packet reader cancelled");
                    break;
                }
                result = source.next_packet() => result,
            };

            match result {
                Ok(Some(event)) => {
                    packet_count += 1;
                    error_count = 0;
                    trace!("Packet {}: kind={:?}, frame={}", packet_count, event.kind, event.frame);

                    let sent = tokio::select! {
                        _ = cancel.cancelled() => {
                            info!("Packet reader cancelled while queue was full");
                            break;
                        }
                        sent = packet_tx.send(event) => sent,
                    };
                    if sent.is_err() {
                        debug!("Packet receiver dropped, shutting down");
                        break;
                    }
                }
                Ok(None) => {
                    info!("Packet source ended after {} packets", packet_count);
                    break;
                }
                // A bad record in a dump is not a reason to back off
                Err(e @ RecorderError::Parse { .. }) => {
                    warn!("Skipping undecodable packet: {}", e);
                }
                Err(e) => {
                    error_count += 1;
                    error!("Packet source error ({}/{}): {}", error_count, MAX_ERRORS, e);

                    if error_count >= MAX_ERRORS {
                        error!("Too many packet source errors, shutting down");
                        break;
                    }

                    // Exponential backoff: 100ms, 200ms, 400ms, ...
                    let backoff = std::time::Duration::from_millis(50 * (1 << error_count.min(5)));
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
            }
        }

        info!("Packet reader task ended (forwarded {} packets)", packet_count);
    }
}
