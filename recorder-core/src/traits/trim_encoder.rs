use std::path::Path;
use std::sync::atomic::AtomicBool;

use crate::models::crop::CropRange;
use crate::models::error::RecorderError;

/// Encodes a time window of one take into a new file.
///
/// Runs on the trim worker thread, never on the interactive path.
/// Implementations should check `cancel` between chunks and return
/// promptly once it is set; the pipeline removes whatever was written.
pub trait TrimEncoder: Send + Sync {
    fn export(
        &self,
        source: &Path,
        output: &Path,
        range: CropRange,
        cancel: &AtomicBool,
    ) -> Result<(), RecorderError>;
}
