use std::path::PathBuf;

use super::artifact::AudioArtifact;
use super::crop::CropRange;

/// Lifecycle of a trim export job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl TrimStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

/// A single export of `range` from `source` into `output`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimJob {
    pub id: u64,
    pub source: PathBuf,
    pub output: PathBuf,
    pub range: CropRange,
    pub status: TrimStatus,
}

/// How a trim job ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TrimOutcome {
    Succeeded(AudioArtifact),
    Failed(String),
    Cancelled,
}

/// Completion message sent from the export worker to the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimCompletion {
    pub job_id: u64,
    pub range: CropRange,
    pub outcome: TrimOutcome,
}
