use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::artifact::{ArtifactMetadata, AudioArtifact};
use crate::models::config::CaptureConfig;
use crate::models::crop::CropRange;
use crate::models::error::RecorderError;

/// Sidecar location for a take: `{take}.metadata.json`.
pub fn sidecar_path(take_path: &Path) -> PathBuf {
    take_path.with_extension("metadata.json")
}

/// Write take metadata as a JSON sidecar file.
pub fn write_metadata(metadata: &ArtifactMetadata, take_path: &Path) -> Result<(), RecorderError> {
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| RecorderError::Storage(format!("failed to serialize metadata: {}", e)))?;
    fs::write(sidecar_path(take_path), json)
        .map_err(|e| RecorderError::Storage(format!("failed to write metadata: {}", e)))?;
    Ok(())
}

/// Read take metadata from its JSON sidecar file.
pub fn read_metadata(take_path: &Path) -> Result<ArtifactMetadata, RecorderError> {
    let json = fs::read_to_string(sidecar_path(take_path))
        .map_err(|e| RecorderError::Storage(format!("failed to read metadata: {}", e)))?;
    serde_json::from_str(&json).map_err(|e| RecorderError::Storage(format!("failed to parse metadata: {}", e)))
}

/// Remove a take's sidecar. Returns whether one existed.
pub fn remove_metadata(take_path: &Path) -> Result<bool, RecorderError> {
    match fs::remove_file(sidecar_path(take_path)) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(RecorderError::Storage(format!("failed to remove metadata: {}", e))),
    }
}

/// Checksum `artifact` and write its sidecar.
pub fn record_take(
    artifact: &AudioArtifact,
    capture: &CaptureConfig,
    source_range: Option<CropRange>,
) -> Result<ArtifactMetadata, RecorderError> {
    let checksum = checksum_file(artifact.path())?;
    let metadata = ArtifactMetadata::new(artifact, &checksum, capture, source_range);
    write_metadata(&metadata, artifact.path())?;
    Ok(metadata)
}

/// SHA-256 hex digest of a file.
pub fn checksum_file(path: &Path) -> Result<String, RecorderError> {
    let data = fs::read(path)
        .map_err(|e| RecorderError::Storage(format!("failed to read file for checksum: {}", e)))?;
    let digest = Sha256::digest(&data);
    Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
}
