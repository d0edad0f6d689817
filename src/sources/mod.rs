//! Packet source implementations

pub mod channel;
pub mod replay;

pub use channel::{ChannelSource, StreamSource};
pub use replay::ReplaySource;
