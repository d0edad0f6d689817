//! Core types for lap recording.
//!
//! ## Architecture
//!
//! - [`PacketEvent`] is the decoder-facing shape: a kind discriminator, a frame
//!   identifier and optional kind-specific fields
//! - [`Packet`] is the validated, tagged form the coordinator dispatches on
//! - [`Sample`] is one observation extracted from a packet
//! - [`LapRecord`] is the ordered set of samples for one completed lap
//!
//! ## Usage Example
//!
//! ```rust
//! use lapsink::types::{Packet, PacketEvent, SamplePayload};
//!
//! let packet = Packet::try_from(PacketEvent::lap_progress(120, 1, 250.5)).unwrap();
//! let sample = packet.sample();
//! assert_eq!(sample.frame(), 120);
//! assert_eq!(*sample.payload(), SamplePayload::Progress { distance: 250.5 });
//! ```

mod lap;
mod packet;
mod sample;

pub use lap::LapRecord;
pub use packet::{MotionPacket, Packet, PacketEvent, PacketKind, ProgressPacket, TelemetryPacket};
pub use sample::{Sample, SamplePayload, TelemetrySample};
