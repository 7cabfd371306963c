use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;

use crate::models::artifact::{AudioArtifact, TakeKind};
use crate::models::crop::CropRange;
use crate::models::error::RecorderError;
use crate::models::trim::{TrimCompletion, TrimJob, TrimOutcome, TrimStatus};
use crate::storage::slot::SingleSlot;
use crate::traits::trim_encoder::TrimEncoder;

/// Invoked on the worker thread after a job finishes. Hosts use it to
/// schedule `poll_trim` on their primary context.
pub type WakeCallback = Arc<dyn Fn() + Send + Sync + 'static>;

/// Raw result sent from the export worker.
struct WorkerReport {
    job_id: u64,
    result: Result<(), RecorderError>,
}

struct RunningJob {
    job: TrimJob,
    cancel: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl RunningJob {
    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Trim worker for job {} panicked", self.job.id);
            }
        }
    }
}

/// Exports crop ranges into the trimmed-take slot, one job at a time.
///
/// The worker only writes the slot's partial file. Moving it over the slot
/// happens in `poll`, on the caller's thread, so a cancelled job can never
/// replace the take.
pub struct TrimPipeline {
    encoder: Arc<dyn TrimEncoder>,
    slot: SingleSlot,
    next_id: u64,
    current: Option<RunningJob>,
    last: Option<TrimJob>,
    tx: Sender<WorkerReport>,
    rx: Receiver<WorkerReport>,
    wake: Option<WakeCallback>,
}

impl TrimPipeline {
    pub fn new(encoder: Arc<dyn TrimEncoder>, slot: SingleSlot) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            encoder,
            slot,
            next_id: 1,
            current: None,
            last: None,
            tx,
            rx,
            wake: None,
        }
    }

    pub fn set_encoder(&mut self, encoder: Arc<dyn TrimEncoder>) {
        self.encoder = encoder;
    }

    pub fn set_wake_callback(&mut self, wake: WakeCallback) {
        self.wake = Some(wake);
    }

    pub fn slot(&self) -> &SingleSlot {
        &self.slot
    }

    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_job(&self) -> Option<&TrimJob> {
        self.current.as_ref().map(|r| &r.job)
    }

    /// The most recently finished job, with its final status.
    pub fn last_job(&self) -> Option<&TrimJob> {
        self.last.as_ref()
    }

    /// Start exporting `range` of `source`. Returns the job id.
    pub fn launch(&mut self, source: &AudioArtifact, range: CropRange) -> Result<u64, RecorderError> {
        if let Some(running) = &self.current {
            return Err(RecorderError::ExportFailed(format!(
                "trim job {} is still running",
                running.job.id
            )));
        }

        // Trimming the trimmed take reads the slot, so it survives until the rename.
        if source.path() != self.slot.path() {
            if let Err(e) = self.slot.clear() {
                log::warn!("Could not remove stale trimmed take: {}", e);
            }
        }
        if let Err(e) = self.slot.clear_partial() {
            log::warn!("Could not remove stale partial export: {}", e);
        }

        let id = self.next_id;
        self.next_id += 1;

        let output = self.slot.partial_path();
        let cancel = Arc::new(AtomicBool::new(false));
        let mut job = TrimJob {
            id,
            source: source.path.clone(),
            output: output.clone(),
            range,
            status: TrimStatus::Pending,
        };

        let encoder = Arc::clone(&self.encoder);
        let flag = Arc::clone(&cancel);
        let tx = self.tx.clone();
        let wake = self.wake.clone();
        let source_path = source.path.clone();

        let handle = thread::Builder::new()
            .name("trim-export".into())
            .spawn(move || {
                let result = encoder.export(&source_path, &output, range, &flag);
                // The receiver is gone only when the pipeline was dropped.
                let _ = tx.send(WorkerReport { job_id: id, result });
                if let Some(wake) = wake {
                    wake();
                }
            })
            .map_err(|e| RecorderError::ExportFailed(format!("failed to spawn export worker: {}", e)))?;

        job.status = TrimStatus::Running;
        log::info!(
            "Trim job {} started: {:.2}s..{:.2}s of {}",
            id,
            range.left(),
            range.right(),
            source.path.display()
        );
        self.current = Some(RunningJob {
            job,
            cancel,
            handle: Some(handle),
        });
        Ok(id)
    }

    /// Cancel the running job, wait for its worker and delete its partial output.
    pub fn cancel(&mut self) -> bool {
        let Some(mut running) = self.current.take() else {
            return false;
        };
        running.cancel.store(true, Ordering::SeqCst);
        running.join();
        running.job.status = TrimStatus::Cancelled;
        self.remove_partial();
        log::info!("Trim job {} cancelled", running.job.id);
        self.last = Some(running.job);
        true
    }

    /// Collect the current job's completion, if it finished.
    ///
    /// Reports from jobs that are no longer current are dropped.
    pub fn poll(&mut self) -> Option<TrimCompletion> {
        loop {
            let report = match self.rx.try_recv() {
                Ok(report) => report,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return None,
            };

            let is_current = self.current.as_ref().is_some_and(|r| r.job.id == report.job_id);
            if !is_current {
                log::debug!("Discarding stale report from trim job {}", report.job_id);
                continue;
            }
            let mut running = self.current.take()?;
            running.join();
            return Some(self.complete(running, report.result));
        }
    }

    fn complete(&mut self, mut running: RunningJob, result: Result<(), RecorderError>) -> TrimCompletion {
        let job_id = running.job.id;
        let range = running.job.range;

        let outcome = if running.cancel.load(Ordering::SeqCst) {
            self.remove_partial();
            TrimOutcome::Cancelled
        } else {
            match result.and_then(|_| self.slot.replace_with(&running.job.output)) {
                Ok(()) => {
                    let artifact = AudioArtifact::new(self.slot.path(), range.length(), TakeKind::Trimmed);
                    log::info!("Trim job {} produced {:.2}s take", job_id, artifact.duration_secs);
                    TrimOutcome::Succeeded(artifact)
                }
                Err(e) => {
                    log::warn!("Trim job {} failed: {}", job_id, e);
                    self.remove_partial();
                    TrimOutcome::Failed(e.to_string())
                }
            }
        };

        running.job.status = match &outcome {
            TrimOutcome::Succeeded(_) => TrimStatus::Succeeded,
            TrimOutcome::Failed(_) => TrimStatus::Failed,
            TrimOutcome::Cancelled => TrimStatus::Cancelled,
        };
        debug_assert!(running.job.status.is_finished());
        self.last = Some(running.job);

        TrimCompletion { job_id, range, outcome }
    }

    fn remove_partial(&self) {
        if let Err(e) = self.slot.clear_partial() {
            log::warn!("Could not remove partial export: {}", e);
        }
    }

    /// Where the running job writes, if any.
    pub fn partial_output(&self) -> Option<PathBuf> {
        self.current.as_ref().map(|r| r.job.output.clone())
    }
}

impl Drop for TrimPipeline {
    fn drop(&mut self) {
        self.cancel();
    }
}
