//! Recorder configuration
//!
//! Every field has a default, so an empty document is a valid configuration.
//!
//! ```rust
//! use lapsink::{RecorderConfig, ShutdownPolicy};
//!
//! let config = RecorderConfig::from_yaml(
//!     "output_dir: /var/lib/laps\nshutdown_policy: discard\n",
//! ).unwrap();
//! assert_eq!(config.shutdown_policy, ShutdownPolicy::Discard);
//! assert_eq!(config.file_name_template, "lap-{lap}-position.json");
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::{RecorderError, Result};

/// Placeholder replaced by the lap ordinal in artifact file names
pub const LAP_PLACEHOLDER: &str = "{lap}";

/// What happens to the partial lap when the packet source ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum ShutdownPolicy {
    /// Persist the partial lap as its own artifact
    #[default]
    Flush,
    /// Drop the partial lap
    Discard,
}

/// How the coordinator reacts when a lap cannot be written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum WriteErrorPolicy {
    /// Report the failure and keep ingesting
    #[default]
    Continue,
    /// Stop ingestion and return the error
    FailFast,
}

/// Formatting of floating point values in artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
#[cfg_attr(feature = "tauri", derive(specta::Type))]
pub enum ValueFormat {
    /// Strings with a fixed number of decimals, e.g. `"12.50"`
    Fixed { decimals: u8 },
    /// Plain JSON numbers
    Raw,
}

impl Default for ValueFormat {
    fn default() -> Self {
        ValueFormat::Fixed { decimals: 2 }
    }
}

/// Configuration for a recording session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecorderConfig {
    /// Directory receiving one artifact per lap
    pub output_dir: PathBuf,
    /// Artifact file name, `{lap}` is replaced by the ordinal
    pub file_name_template: String,
    pub value_format: ValueFormat,
    pub shutdown_policy: ShutdownPolicy,
    pub write_error_policy: WriteErrorPolicy,
    /// Also persist subsystem telemetry samples
    pub record_telemetry: bool,
    /// Upper bound for a single lap write
    pub write_timeout_ms: u64,
    /// Capacity of the queue between source and coordinator
    pub channel_capacity: usize,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data"),
            file_name_template: format!("lap-{LAP_PLACEHOLDER}-position.json"),
            value_format: ValueFormat::default(),
            shutdown_policy: ShutdownPolicy::default(),
            write_error_policy: WriteErrorPolicy::default(),
            record_telemetry: false,
            write_timeout_ms: 5_000,
            channel_capacity: 1_024,
        }
    }
}

impl RecorderConfig {
    /// Parse and validate a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: RecorderConfig = serde_yaml_ng::from_str(yaml).map_err(|e| {
            RecorderError::Parse { context: "recorder config".to_string(), details: e.to_string() }
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading recorder config from {}", path.display());
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            RecorderError::invalid_config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&yaml)
    }

    /// Check values that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if !self.file_name_template.contains(LAP_PLACEHOLDER) {
            return Err(RecorderError::invalid_config(format!(
                "file_name_template '{}' must contain {}",
                self.file_name_template, LAP_PLACEHOLDER
            )));
        }
        if self.file_name_template.contains(['/', '\\']) {
            return Err(RecorderError::invalid_config(
                "file_name_template must be a file name, not a path",
            ));
        }
        if self.channel_capacity == 0 {
            return Err(RecorderError::invalid_config("channel_capacity must be at least 1"));
        }
        if self.write_timeout_ms == 0 {
            return Err(RecorderError::invalid_config("write_timeout_ms must be at least 1"));
        }
        if let ValueFormat::Fixed { decimals } = self.value_format {
            if decimals > 9 {
                return Err(RecorderError::invalid_config("value_format decimals must be 0..=9"));
            }
        }
        Ok(())
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    /// File name of the artifact for a lap
    pub fn file_name(&self, lap: u32) -> String {
        self.file_name_template.replace(LAP_PLACEHOLDER, &lap.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = RecorderConfig::from_yaml("{}").unwrap();
        assert_eq!(config, RecorderConfig::default());
        assert_eq!(config.file_name(3), "lap-3-position.json");
        assert_eq!(config.write_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn full_document_parses() {
        let yaml = r#"
output_dir: /tmp/laps
file_name_template: "session-a-lap-{lap}.json"
value_format:
  style: raw
shutdown_policy: discard
write_error_policy: fail_fast
record_telemetry: true
write_timeout_ms: 250
channel_capacity: 16
"#;
        let config = RecorderConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/tmp/laps"));
        assert_eq!(config.value_format, ValueFormat::Raw);
        assert_eq!(config.shutdown_policy, ShutdownPolicy::Discard);
        assert_eq!(config.write_error_policy, WriteErrorPolicy::FailFast);
        assert!(config.record_telemetry);
        assert_eq!(config.channel_capacity, 16);
        assert_eq!(config.file_name(12), "session-a-lap-12.json");
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            RecorderConfig::from_yaml("file_name_template: lap.json"),
            Err(RecorderError::Config { .. })
        ));
        assert!(matches!(
            RecorderConfig::from_yaml("file_name_template: \"dir/lap-{lap}.json\""),
            Err(RecorderError::Config { .. })
        ));
        assert!(matches!(
            RecorderConfig::from_yaml("channel_capacity: 0"),
            Err(RecorderError::Config { .. })
        ));
        assert!(matches!(
            RecorderConfig::from_yaml("value_format:\n  style: fixed\n  decimals: 12\n"),
            Err(RecorderError::Config { .. })
        ));
        assert!(matches!(
            RecorderConfig::from_yaml("shutdown_policy: maybe"),
            Err(RecorderError::Parse { .. })
        ));
    }

    #[test]
    fn from_file_reads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recorder.yaml");
        std::fs::write(&path, "record_telemetry: true\n").unwrap();
        assert!(RecorderConfig::from_file(&path).unwrap().record_telemetry);
        assert!(RecorderConfig::from_file(dir.path().join("missing.yaml")).is_err());
    }
}
