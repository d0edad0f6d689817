//! JSON file sink, one artifact per lap
//!
//! An artifact only ever appears under its final name fully written and
//! synced: rows go to a hidden staging file first, which is then hard-linked
//! to the lap's name. Linking fails instead of replacing an existing file.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::format::encode_record;
use crate::config::{LAP_PLACEHOLDER, RecorderConfig, ValueFormat};
use crate::sink::{LapArtifact, LapSink};
use crate::types::LapRecord;
use crate::{RecorderError, Result};

/// Writes each lap to `<dir>/<template with {lap} replaced>`
#[derive(Debug, Clone)]
pub struct JsonLapWriter {
    dir: PathBuf,
    template: String,
    format: ValueFormat,
}

impl JsonLapWriter {
    /// Create a writer using the default file name template and format
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        let defaults = RecorderConfig::default();
        Self {
            dir: dir.as_ref().to_path_buf(),
            template: defaults.file_name_template,
            format: defaults.value_format,
        }
    }

    /// Create a writer from a validated configuration
    pub fn from_config(config: &RecorderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            dir: config.output_dir.clone(),
            template: config.file_name_template.clone(),
            format: config.value_format,
        })
    }

    /// Artifact path for a lap
    pub fn path_for(&self, lap: u32) -> PathBuf {
        self.dir.join(self.template.replace(LAP_PLACEHOLDER, &lap.to_string()))
    }

    /// Read back the rows persisted for a lap
    pub async fn read_lap(&self, lap: u32) -> Result<Vec<serde_json::Value>> {
        let path = self.path_for(lap);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RecorderError::ArtifactNotFound { lap, path });
            }
            Err(e) => return Err(RecorderError::ArtifactRead { path, source: e }),
        };
        serde_json::from_slice(&bytes).map_err(|e| RecorderError::Parse {
            context: path.display().to_string(),
            details: e.to_string(),
        })
    }

    /// Lap ordinals with an artifact in the output directory, ascending
    pub async fn list_laps(&self) -> Result<Vec<u32>> {
        let read_error =
            |e: std::io::Error| RecorderError::ArtifactRead { path: self.dir.clone(), source: e };

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(read_error(e)),
        };

        let (prefix, suffix) =
            self.template.split_once(LAP_PLACEHOLDER).unwrap_or((self.template.as_str(), ""));

        let mut laps = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(read_error)? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let lap = name
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_suffix(suffix))
                .and_then(|n| n.parse::<u32>().ok());
            if let Some(lap) = lap {
                laps.push(lap);
            }
        }
        laps.sort_unstable();
        Ok(laps)
    }
}

/// Hidden sibling of an artifact used while its rows are written
fn staging_path(path: &Path) -> PathBuf {
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    path.with_file_name(format!(".{name}.partial"))
}

fn write_staged(staging: &Path, body: &[u8]) -> std::io::Result<()> {
    use std::io::Write;

    let mut file = std::fs::File::create(staging)?;
    file.write_all(body)?;
    file.sync_all()
}

fn remove_staged(staging: &Path) {
    match std::fs::remove_file(staging) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove staging file {}: {}", staging.display(), e),
    }
}

/// Stage, sync and link one artifact.
///
/// Runs on the blocking pool, so it completes (or cleans up after itself)
/// even when the task awaiting it is dropped by a write timeout.
fn place_artifact(lap: u32, dir: &Path, path: &Path, body: &[u8]) -> Result<()> {
    std::fs::create_dir_all(dir)
        .map_err(|e| RecorderError::persistence_failure(dir.to_path_buf(), e))?;

    let staging = staging_path(path);
    if let Err(e) = write_staged(&staging, body) {
        remove_staged(&staging);
        return Err(RecorderError::persistence_failure(staging, e));
    }

    let linked = std::fs::hard_link(&staging, path);
    remove_staged(&staging);
    match linked {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            Err(RecorderError::DuplicateArtifact { lap, path: path.to_path_buf() })
        }
        Err(e) => Err(RecorderError::persistence_failure(path.to_path_buf(), e)),
    }
}

#[async_trait::async_trait]
impl LapSink for JsonLapWriter {
    async fn write(&mut self, record: LapRecord) -> Result<LapArtifact> {
        let lap = record.lap();
        let path = self.path_for(lap);
        let body = encode_record(&record, self.format)?;
        let bytes = body.len();

        let dir = self.dir.clone();
        let target = path.clone();
        tokio::task::spawn_blocking(move || place_artifact(lap, &dir, &target, &body))
            .await
            .map_err(|e| {
                RecorderError::persistence_failure(path.clone(), std::io::Error::other(e))
            })??;

        debug!(lap, bytes, "Artifact synced");
        info!("Lap {} written to {} ({} samples)", lap, path.display(), record.len());
        Ok(LapArtifact::for_record(&record, path.display().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Sample, SamplePayload};
    use std::time::Duration;

    fn staged_files(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|entry| entry.unwrap().file_name().into_string().ok())
            .filter(|name| name.ends_with(".partial"))
            .collect()
    }

    fn record(lap: u32) -> LapRecord {
        LapRecord::new(
            lap,
            vec![
                Sample::new(10, SamplePayload::Progress { distance: 1.0 }),
                Sample::new(11, SamplePayload::Position { x: 3.0, y: 4.0 }),
            ],
            Some(88_000),
        )
    }

    #[tokio::test]
    async fn writes_and_reads_back_a_lap() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = JsonLapWriter::new(dir.path().join("data"));

        let artifact = writer.write(record(1)).await.unwrap();
        assert_eq!(artifact.lap, 1);
        assert_eq!(artifact.samples, 2);
        assert_eq!(artifact.lap_time_ms, Some(88_000));
        assert!(artifact.location.ends_with("lap-1-position.json"));

        let rows = writer.read_lap(1).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["X"], "3.00");
    }

    #[tokio::test]
    async fn duplicate_lap_is_rejected_and_original_kept() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = JsonLapWriter::new(dir.path());
        writer.write(record(2)).await.unwrap();
        let before = tokio::fs::read(writer.path_for(2)).await.unwrap();

        let err = writer.write(LapRecord::new(2, Vec::new(), None)).await.unwrap_err();
        assert!(matches!(err, RecorderError::DuplicateArtifact { lap: 2, .. }));
        assert_eq!(tokio::fs::read(writer.path_for(2)).await.unwrap(), before);
    }

    #[tokio::test]
    async fn unusable_directory_is_a_persistence_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();

        let mut writer = JsonLapWriter::new(&blocker);
        let err = writer.write(record(1)).await.unwrap_err();
        assert!(matches!(err, RecorderError::PersistenceFailure { .. }));
        assert!(err.is_data_loss());
    }

    #[tokio::test]
    async fn list_laps_follows_template() {
        let dir = tempfile::tempdir().unwrap();
        let config = RecorderConfig {
            output_dir: dir.path().to_path_buf(),
            file_name_template: "run-{lap}.json".to_string(),
            ..RecorderConfig::default()
        };
        let mut writer = JsonLapWriter::from_config(&config).unwrap();
        assert!(writer.list_laps().await.unwrap().is_empty());

        for lap in [3, 1, 12] {
            writer.write(record(lap)).await.unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), b"ignore me").unwrap();
        assert_eq!(writer.list_laps().await.unwrap(), vec![1, 3, 12]);
    }

    #[tokio::test]
    async fn duplicate_lap_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = JsonLapWriter::new(dir.path());
        writer.write(record(4)).await.unwrap();
        writer.write(record(4)).await.unwrap_err();

        assert!(staged_files(dir.path()).is_empty());
        assert_eq!(writer.list_laps().await.unwrap(), vec![4]);
    }

    #[tokio::test]
    async fn abandoned_write_never_exposes_a_partial_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = JsonLapWriter::new(dir.path());
        let samples: Vec<Sample> = (0..200_000u32)
            .map(|frame| Sample::new(frame, SamplePayload::Position { x: 1.5, y: -2.5 }))
            .collect();
        let record = LapRecord::new(1, samples, None);

        // The awaiting future is dropped as soon as the write yields.
        let _ = tokio::time::timeout(Duration::ZERO, writer.write(record)).await;

        let path = writer.path_for(1);
        for _ in 0..500 {
            if let Ok(bytes) = std::fs::read(&path) {
                let rows: Vec<serde_json::Value> = serde_json::from_slice(&bytes).unwrap();
                assert_eq!(rows.len(), 200_000);
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(path.exists());

        for _ in 0..500 {
            if staged_files(dir.path()).is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(staged_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn reading_a_missing_lap_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let writer = JsonLapWriter::new(dir.path());

        let err = writer.read_lap(9).await.unwrap_err();
        assert!(matches!(err, RecorderError::ArtifactNotFound { lap: 9, .. }));
        assert!(err.to_string().contains("No artifact for lap 9"));
        assert!(!err.is_data_loss());
    }

    #[tokio::test]
    async fn unreadable_artifact_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let writer = JsonLapWriter::new(dir.path());
        std::fs::create_dir(writer.path_for(2)).unwrap();

        let err = writer.read_lap(2).await.unwrap_err();
        assert!(matches!(err, RecorderError::ArtifactRead { .. }));
        assert!(err.to_string().starts_with("Failed to read lap artifact"));
    }
}
