//! Source trait for decoded packet events

use crate::Result;
use crate::types::PacketEvent;

/// Trait for decoded telemetry packet sources
///
/// Sources abstract over where packets come from (a live decoder feeding a
/// channel, a recorded dump, any async stream) and handle their own pacing.
/// Wire decoding happens before this boundary.
#[async_trait::async_trait]
pub trait PacketSource: Send + 'static {
    /// Get the next decoded packet
    ///
    /// Returns:
    /// - `Ok(Some(event))` - Packet available
    /// - `Ok(None)` - Source ended (normal termination)
    /// - `Err(e)` - Error occurred; the driver may call again after backing off
    async fn next_packet(&mut self) -> Result<Option<PacketEvent>>;
}
