//! Decoded packet events and their typed form

use serde::{Deserialize, Serialize};

use super::sample::{Sample, SamplePayload, TelemetrySample};
use crate::{RecorderError, Result};

/// Packet kind discriminator as reported by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum PacketKind {
    /// Vehicle motion (world position)
    Motion,
    /// Lap progress (lap number, distance, timing)
    LapProgress,
    /// Vehicle subsystem metrics (speed, pedals, engine, brakes)
    Telemetry,
}

/// One decoded packet as handed over by the feed decoder.
///
/// Kind-specific fields are optional at this layer; [`Packet::try_from`]
/// checks that the fields required by `kind` are present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub struct PacketEvent {
    pub kind: PacketKind,

    /// Feed frame identifier
    pub frame: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_y: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lap_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lap_distance: Option<f32>,
    /// Completion time of the previous lap, if the feed reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_lap_time_ms: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_kph: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throttle: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brake: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gear: Option<i8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_rpm: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brakes_temperature: Option<[u16; 4]>,
}

impl PacketEvent {
    fn empty(kind: PacketKind, frame: u32) -> Self {
        Self {
            kind,
            frame,
            position_x: None,
            position_y: None,
            lap_number: None,
            lap_distance: None,
            last_lap_time_ms: None,
            speed_kph: None,
            throttle: None,
            brake: None,
            gear: None,
            engine_rpm: None,
            brakes_temperature: None,
        }
    }

    /// Motion event carrying a world position
    pub fn motion(frame: u32, x: f32, y: f32) -> Self {
        Self { position_x: Some(x), position_y: Some(y), ..Self::empty(PacketKind::Motion, frame) }
    }

    /// Lap progress event
    pub fn lap_progress(frame: u32, lap_number: u32, lap_distance: f32) -> Self {
        Self {
            lap_number: Some(lap_number),
            lap_distance: Some(lap_distance),
            ..Self::empty(PacketKind::LapProgress, frame)
        }
    }

    /// Attach the previous lap's completion time
    pub fn with_last_lap_time(mut self, last_lap_time_ms: u32) -> Self {
        self.last_lap_time_ms = Some(last_lap_time_ms);
        self
    }

    /// Subsystem telemetry event
    pub fn telemetry(frame: u32, sample: TelemetrySample) -> Self {
        Self {
            speed_kph: Some(sample.speed_kph),
            throttle: Some(sample.throttle),
            brake: Some(sample.brake),
            gear: Some(sample.gear),
            engine_rpm: Some(sample.engine_rpm),
            brakes_temperature: sample.brakes_temperature,
            ..Self::empty(PacketKind::Telemetry, frame)
        }
    }
}

/// Motion packet: vehicle world position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionPacket {
    pub frame: u32,
    pub x: f32,
    pub y: f32,
}

/// Lap progress packet: the only packet kind carrying an authoritative lap number
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressPacket {
    pub frame: u32,
    pub lap_number: u32,
    pub lap_distance: f32,
    pub last_lap_time_ms: Option<u32>,
}

/// Subsystem telemetry packet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryPacket {
    pub frame: u32,
    pub sample: TelemetrySample,
}

/// Validated packet, dispatched by the coordinator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Packet {
    Motion(MotionPacket),
    Progress(ProgressPacket),
    Telemetry(TelemetryPacket),
}

impl Packet {
    /// Frame identifier of the packet
    pub fn frame(&self) -> u32 {
        match self {
            Packet::Motion(p) => p.frame,
            Packet::Progress(p) => p.frame,
            Packet::Telemetry(p) => p.frame,
        }
    }

    /// Extract the sample this packet contributes to a lap
    pub fn sample(&self) -> Sample {
        match *self {
            Packet::Motion(p) => Sample::new(p.frame, SamplePayload::Position { x: p.x, y: p.y }),
            Packet::Progress(p) => {
                Sample::new(p.frame, SamplePayload::Progress { distance: p.lap_distance })
            }
            Packet::Telemetry(p) => Sample::new(p.frame, SamplePayload::Telemetry(p.sample)),
        }
    }
}

fn required<T>(value: Option<T>, frame: u32, field: &str) -> Result<T> {
    value.ok_or_else(|| RecorderError::malformed_packet(frame, field))
}

fn finite(value: Option<f32>, frame: u32, field: &str) -> Result<f32> {
    let value = required(value, frame, field)?;
    if value.is_finite() { Ok(value) } else { Err(RecorderError::malformed_packet(frame, field)) }
}

impl TryFrom<PacketEvent> for Packet {
    type Error = RecorderError;

    fn try_from(event: PacketEvent) -> Result<Self> {
        let frame = event.frame;
        match event.kind {
            PacketKind::Motion => Ok(Packet::Motion(MotionPacket {
                frame,
                x: finite(event.position_x, frame, "position_x")?,
                y: finite(event.position_y, frame, "position_y")?,
            })),
            PacketKind::LapProgress => {
                let lap_number = required(event.lap_number, frame, "lap_number")?;
                // Lap ordinals start at 1
                if lap_number == 0 {
                    return Err(RecorderError::malformed_packet(frame, "lap_number"));
                }
                Ok(Packet::Progress(ProgressPacket {
                    frame,
                    lap_number,
                    lap_distance: finite(event.lap_distance, frame, "lap_distance")?,
                    last_lap_time_ms: event.last_lap_time_ms,
                }))
            }
            PacketKind::Telemetry => Ok(Packet::Telemetry(TelemetryPacket {
                frame,
                sample: TelemetrySample {
                    speed_kph: required(event.speed_kph, frame, "speed_kph")?,
                    throttle: finite(event.throttle, frame, "throttle")?,
                    brake: finite(event.brake, frame, "brake")?,
                    gear: required(event.gear, frame, "gear")?,
                    engine_rpm: required(event.engine_rpm, frame, "engine_rpm")?,
                    brakes_temperature: event.brakes_temperature,
                },
            })),
        }
    }
}
