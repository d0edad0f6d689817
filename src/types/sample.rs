//! Samples extracted from packets

use serde::{Deserialize, Serialize};

/// Subsystem metrics for one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct TelemetrySample {
    pub speed_kph: u16,
    /// Throttle application, 0.0 to 1.0
    pub throttle: f32,
    /// Brake application, 0.0 to 1.0
    pub brake: f32,
    /// -1 reverse, 0 neutral
    pub gear: i8,
    pub engine_rpm: u16,
    /// RL, RR, FL, FR in degrees celsius
    pub brakes_temperature: Option<[u16; 4]>,
}

/// Kind-specific value carried by a [`Sample`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplePayload {
    Position { x: f32, y: f32 },
    Progress { distance: f32 },
    Telemetry(TelemetrySample),
}

/// One observation attached to a frame identifier.
///
/// Samples cannot be changed after construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    frame: u32,
    payload: SamplePayload,
}

impl Sample {
    pub fn new(frame: u32, payload: SamplePayload) -> Self {
        Self { frame, payload }
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn payload(&self) -> &SamplePayload {
        &self.payload
    }
}
