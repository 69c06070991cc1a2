// crates/overdub-media/src/export.rs
//
// Output-path lifecycle and the status polling loop that maps engine
// observations onto channel updates.
//
// The loop is the job's state machine: waiting → exporting → one of
// {completed, failed, cancelled}, with `unknown` accepted at any point as a
// non-actionable observation. Exactly one terminal update is sent per job,
// and a terminal status that carries no engine error gets a synthesized
// diagnostic so the caller is never left without a completion.

use std::path::{Path, PathBuf};

use crossbeam_channel::Sender;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use overdub_core::error::MergeError;
use overdub_core::job::{ExportJob, JobState, MergeUpdate};

use crate::engine::{ExportSession, ExportStatus};

/// Destination file for one job: `merged-<job-id>.mp4` under `dir`, unless
/// the caller pinned a fixed file name.
pub(crate) fn output_path_for(dir: &Path, file_name: Option<&str>, job_id: Uuid) -> PathBuf {
    match file_name {
        Some(name) => dir.join(name),
        None => dir.join(format!("merged-{job_id}.mp4")),
    }
}

/// Best-effort removal of a leftover file at `path`. Failure is logged and
/// the export proceeds; a genuinely unusable path surfaces from the encoder.
pub(crate) fn remove_stale_output(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "removed stale output file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "could not remove stale output file"),
    }
}

/// Poll `session` until a terminal status, forwarding progress and the
/// final result over `tx`. Blocking — runs on the job's export thread.
pub(crate) fn run_export_loop<S: ExportSession>(
    job: &mut ExportJob,
    session: &mut S,
    tx: &Sender<MergeUpdate>,
) {
    loop {
        match session.next_status() {
            ExportStatus::Waiting => {
                job.state = JobState::Waiting;
                trace!(job = %job.id, "export waiting");
            }
            ExportStatus::Unknown => {
                // Non-actionable observation: no state change, no update.
                debug!(job = %job.id, "export reported an unknown status");
            }
            ExportStatus::Exporting { progress } => {
                job.state = JobState::Exporting;
                let _ = tx.send(MergeUpdate::Progress { job_id: job.id, fraction: progress });
            }
            ExportStatus::Completed => {
                job.state = JobState::Completed;
                debug!(job = %job.id, output = %job.output.display(), "export completed");
                let _ = tx.send(MergeUpdate::Done {
                    job_id: job.id,
                    output: job.output.clone(),
                });
                return;
            }
            ExportStatus::Failed { error } => {
                job.state = JobState::Failed;
                let error = error.unwrap_or_else(|| {
                    anyhow::anyhow!("encoder terminated without diagnostic")
                });
                debug!(job = %job.id, error = %error, "export failed");
                let _ = tx.send(MergeUpdate::Failed {
                    job_id: job.id,
                    error: MergeError::Encode(error),
                });
                return;
            }
            ExportStatus::Cancelled { error } => {
                job.state = JobState::Cancelled;
                let error = error.unwrap_or_else(|| {
                    anyhow::anyhow!("encoder terminated without diagnostic")
                });
                debug!(job = %job.id, "export cancelled");
                let _ = tx.send(MergeUpdate::Failed {
                    job_id: job.id,
                    error: MergeError::Cancelled(error),
                });
                return;
            }
        }
    }
}
