//! Lap sink implementations

pub mod format;
pub mod json;
pub mod memory;

pub use json::JsonLapWriter;
pub use memory::MemoryLapSink;
