use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::config::CaptureConfig;
use super::crop::CropRange;

/// Which single-slot file an artifact occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TakeKind {
    Original,
    Trimmed,
}

/// A persisted take: file reference plus duration.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioArtifact {
    pub path: PathBuf,
    pub duration_secs: f64,
    pub kind: TakeKind,
}

impl AudioArtifact {
    pub fn new(path: impl Into<PathBuf>, duration_secs: f64, kind: TakeKind) -> Self {
        Self {
            path: path.into(),
            duration_secs,
            kind,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Provenance stored in a JSON sidecar next to an adopted take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub id: String,
    pub kind: TakeKind,
    pub duration_secs: f64,
    pub file_path: String,
    pub checksum: String,
    pub created_at: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub codec: String,
    /// Source range for trimmed takes, `[left, right]` in seconds.
    pub source_range: Option<(f64, f64)>,
}

impl ArtifactMetadata {
    pub fn new(
        artifact: &AudioArtifact,
        checksum: &str,
        capture: &CaptureConfig,
        source_range: Option<CropRange>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind: artifact.kind,
            duration_secs: artifact.duration_secs,
            file_path: artifact.path.to_string_lossy().to_string(),
            checksum: checksum.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            sample_rate: capture.sample_rate,
            channels: capture.channels,
            codec: capture.codec.file_extension().to_string(),
            source_range: source_range.map(|r| (r.left(), r.right())),
        }
    }
}
