//! JSON row encoding of lap samples

use serde::Serialize;
use serde_json::Value;

use crate::config::ValueFormat;
use crate::types::{LapRecord, Sample, SamplePayload};
use crate::{RecorderError, Result};

/// One artifact row, keys in the order the rows are read back
#[derive(Serialize)]
#[serde(untagged)]
enum Row {
    Position {
        frame: u32,
        #[serde(rename = "X")]
        x: Value,
        #[serde(rename = "Y")]
        y: Value,
    },
    Progress {
        frame: u32,
        distance: Value,
    },
    Telemetry {
        frame: u32,
        speed: u16,
        throttle: Value,
        brake: Value,
        gear: i8,
        #[serde(rename = "engineRPM")]
        engine_rpm: u16,
        #[serde(rename = "brakesTemperature", skip_serializing_if = "Option::is_none")]
        brakes_temperature: Option<[u16; 4]>,
    },
}

fn value(v: f32, format: ValueFormat) -> Value {
    match format {
        ValueFormat::Fixed { decimals } => Value::String(format!("{:.*}", decimals as usize, v)),
        ValueFormat::Raw => Value::from(v),
    }
}

fn row(sample: &Sample, format: ValueFormat) -> Row {
    let frame = sample.frame();
    match *sample.payload() {
        SamplePayload::Position { x, y } => {
            Row::Position { frame, x: value(x, format), y: value(y, format) }
        }
        SamplePayload::Progress { distance } => {
            Row::Progress { frame, distance: value(distance, format) }
        }
        SamplePayload::Telemetry(t) => Row::Telemetry {
            frame,
            speed: t.speed_kph,
            throttle: value(t.throttle, format),
            brake: value(t.brake, format),
            gear: t.gear,
            engine_rpm: t.engine_rpm,
            brakes_temperature: t.brakes_temperature,
        },
    }
}

/// Encode a record as a JSON array of rows in sample order.
///
/// Identical records always encode to identical bytes.
pub fn encode_record(record: &LapRecord, format: ValueFormat) -> Result<Vec<u8>> {
    let rows: Vec<Row> = record.samples().iter().map(|s| row(s, format)).collect();
    serde_json::to_vec(&rows).map_err(|e| RecorderError::Parse {
        context: format!("lap {} encoding", record.lap()),
        details: e.to_string(),
    })
}
