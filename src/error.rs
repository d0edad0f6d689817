//! Error types for lap recording.
//!
//! Every fallible operation in the crate returns [`RecorderError`]. The variants
//! separate conditions that only cost a single packet (a malformed packet is
//! skipped and ingestion continues) from conditions that lose data and need an
//! operator (a lap that could not be persisted).
//!
//! ## Error Categories
//!
//! - **Ingestion Errors**: malformed packets, source failures, use after termination
//! - **Persistence Errors**: I/O failures and duplicate artifacts
//! - **Query Errors**: missing or unreadable artifacts when reading laps back
//! - **Configuration Errors**: invalid or unparseable recorder configuration
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use lapsink::RecorderError;
//!
//! let error = RecorderError::source_failed("decoder disconnected");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```
//!
//! ## Helper Constructors
//!
//! ```rust
//! use lapsink::RecorderError;
//! use std::path::PathBuf;
//!
//! let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
//! let path = PathBuf::from("data/lap-3-position.json");
//! let failure = RecorderError::persistence_failure(path, io_err);
//! assert!(failure.is_data_loss());
//!
//! let malformed = RecorderError::malformed_packet(42, "lap_distance");
//! assert!(!malformed.is_data_loss());
//! ```

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for recorder operations.
pub type Result<T, E = RecorderError> = std::result::Result<T, E>;

/// Main error type for lap recording.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RecorderError {
    #[error("Malformed packet at frame {frame}: missing or invalid field '{field}'")]
    MalformedPacket { frame: u32, field: String },

    #[error("Failed to persist lap artifact: {path}")]
    PersistenceFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Artifact for lap {lap} already exists at {path}")]
    DuplicateArtifact { lap: u32, path: PathBuf },

    #[error("No artifact for lap {lap} at {path}")]
    ArtifactNotFound { lap: u32, path: PathBuf },

    #[error("Failed to read lap artifact: {path}")]
    ArtifactRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Packet source failed: {reason}")]
    Source {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("Ingestion already terminated")]
    Terminated,
}

impl RecorderError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            RecorderError::Source { .. } => true,
            RecorderError::Timeout { .. } => true,
            RecorderError::PersistenceFailure { .. } => true,
            RecorderError::ArtifactRead { .. } => true,
            RecorderError::ArtifactNotFound { .. } => false,
            RecorderError::MalformedPacket { .. } => false,
            RecorderError::DuplicateArtifact { .. } => false,
            RecorderError::Parse { .. } => false,
            RecorderError::Config { .. } => false,
            RecorderError::Terminated => false,
        }
    }

    /// Returns whether this error means a lap record was not stored.
    pub fn is_data_loss(&self) -> bool {
        matches!(
            self,
            RecorderError::PersistenceFailure { .. }
                | RecorderError::DuplicateArtifact { .. }
                | RecorderError::Timeout { .. }
        )
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            RecorderError::MalformedPacket { .. } => vec![
                "Check the decoder emits every field for the packet kind",
                "Verify the feed's packet format version",
            ],
            RecorderError::PersistenceFailure { .. } => vec![
                "Check the output directory exists and is writable",
                "Ensure sufficient disk space",
                "Check file permissions",
            ],
            RecorderError::DuplicateArtifact { .. } => vec![
                "Move previous session artifacts out of the output directory",
                "Use a fresh output directory when re-processing a replay",
            ],
            RecorderError::ArtifactNotFound { .. } => vec![
                "List recorded laps before reading one back",
                "Check the output directory and file name template match the recording",
            ],
            RecorderError::ArtifactRead { .. } => vec![
                "Check the output directory is readable",
                "Check file permissions",
            ],
            RecorderError::Source { .. } => vec![
                "Check the telemetry feed is still running",
                "Verify the decoder is connected",
                "Restart the packet source",
            ],
            RecorderError::Parse { .. } => vec![
                "Check data format compatibility",
                "Verify source data integrity",
            ],
            RecorderError::Timeout { .. } => vec![
                "Increase the write timeout",
                "Check storage latency",
            ],
            RecorderError::Config { .. } => vec![
                "Check configuration values against the documented defaults",
                "Ensure the file name template contains {lap}",
            ],
            RecorderError::Terminated => vec!["Start a new recorder for a new session"],
        }
    }

    /// Helper constructor for malformed packet errors.
    pub fn malformed_packet(frame: u32, field: impl Into<String>) -> Self {
        RecorderError::MalformedPacket { frame, field: field.into() }
    }

    /// Helper constructor for persistence failures with path context.
    pub fn persistence_failure(path: PathBuf, source: std::io::Error) -> Self {
        RecorderError::PersistenceFailure { path, source }
    }

    /// Helper constructor for packet source errors.
    pub fn source_failed(reason: impl Into<String>) -> Self {
        RecorderError::Source { reason: reason.into(), source: None }
    }

    /// Helper constructor for packet source errors with source.
    pub fn source_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        RecorderError::Source { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for configuration errors.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        RecorderError::Config { reason: reason.into() }
    }
}

impl From<std::io::Error> for RecorderError {
    fn from(err: std::io::Error) -> Self {
        RecorderError::PersistenceFailure { path: PathBuf::from("<unknown>"), source: err }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
          #[test]
          fn error_messages_carry_their_context(
            frame in 0u32..1_000_000u32,
            field in "\\w+",
            lap in 1u32..200u32,
            reason in ".*"
          ) {
            let malformed = RecorderError::malformed_packet(frame, field.clone());
            let malformed_msg = malformed.to_string();
            prop_assert!(malformed_msg.contains(&field));
            prop_assert!(malformed_msg.contains(&frame.to_string()));

            let duplicate = RecorderError::DuplicateArtifact {
              lap,
              path: PathBuf::from(format!("lap-{}-position.json", lap)),
            };
            prop_assert!(duplicate.to_string().contains(&lap.to_string()));

            let source = RecorderError::source_failed(reason.clone());
            prop_assert!(source.to_string().contains(&reason));
          }

          #[test]
          fn io_errors_convert_to_persistence_failures(reason in ".*") {
            let io_err = std::io::Error::other(reason.clone());
            let converted: RecorderError = io_err.into();
            match converted {
              RecorderError::PersistenceFailure { source, .. } => {
                prop_assert_eq!(source.to_string(), reason);
              }
              _ => prop_assert!(false, "Expected PersistenceFailure from io::Error conversion"),
            }
          }
        }
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<RecorderError>();

        let error = RecorderError::source_failed("test");
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn data_loss_is_distinguished_from_skippable_errors() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(RecorderError::persistence_failure(PathBuf::from("/x"), io_err).is_data_loss());
        assert!(
            RecorderError::DuplicateArtifact { lap: 1, path: PathBuf::from("/x") }.is_data_loss()
        );
        assert!(!RecorderError::malformed_packet(1, "lap_number").is_data_loss());
        assert!(!RecorderError::Terminated.is_data_loss());
    }

    #[test]
    fn recovery_methods_work() {
        let source = RecorderError::source_failed("gone");
        let duplicate = RecorderError::DuplicateArtifact { lap: 2, path: PathBuf::from("/x") };

        assert!(source.is_retryable());
        assert!(!duplicate.is_retryable());

        let suggestions = source.recovery_suggestions();
        for suggestion in suggestions.iter().chain(&duplicate.recovery_suggestions()) {
            assert!(suggestion.len() > 5);
        }
    }

    #[test]
    fn read_errors_are_not_reported_as_persistence_failures() {
        let missing =
            RecorderError::ArtifactNotFound { lap: 7, path: PathBuf::from("data/lap-7.json") };
        assert_eq!(missing.to_string(), "No artifact for lap 7 at data/lap-7.json");
        assert!(!missing.is_retryable());
        assert!(!missing.is_data_loss());

        let unreadable = RecorderError::ArtifactRead {
            path: PathBuf::from("data/lap-7.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(unreadable.to_string().starts_with("Failed to read lap artifact"));
        assert!(unreadable.is_retryable());
        assert!(!unreadable.is_data_loss());
        assert!(!unreadable.recovery_suggestions().is_empty());
    }

    #[test]
    fn source_chain_is_preserved() {
        let inner = std::io::Error::other("socket closed");
        let error = RecorderError::source_failed_with_source("decoder", Box::new(inner));
        let source = std::error::Error::source(&error).expect("source should be chained");
        assert!(source.to_string().contains("socket closed"));
    }
}
