// crates/overdub-core/src/job.rs
//
// Types that flow across the channel between overdub-media and its callers.
// No engine handles — just plain data keyed by job id.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::MergeError;

/// Lifecycle of one export job.
///
/// `Unknown` is a defensive catch-all for status observations the engine
/// could not classify; it is never terminal and never produces an update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Waiting,
    Exporting,
    Completed,
    Failed,
    Cancelled,
    Unknown,
}

impl JobState {
    /// Terminal states end the job; nothing is reported after them.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed | JobState::Cancelled)
    }
}

/// One export job: created per merge call, never reused.
#[derive(Debug)]
pub struct ExportJob {
    pub id:     Uuid,
    /// Destination file the encoder writes into.
    pub output: PathBuf,
    pub state:  JobState,
}

impl ExportJob {
    pub fn new(id: Uuid, output: PathBuf) -> Self {
        Self { id, output, state: JobState::Waiting }
    }
}

/// Updates sent from the export thread to whichever thread drains the
/// worker channel. Every job produces any number of `Progress` updates
/// followed by exactly one `Done` or `Failed`.
#[derive(Debug)]
pub enum MergeUpdate {
    Progress { job_id: Uuid, fraction: f32 },
    Done     { job_id: Uuid, output: PathBuf },
    Failed   { job_id: Uuid, error: MergeError },
}

impl MergeUpdate {
    pub fn job_id(&self) -> Uuid {
        match self {
            MergeUpdate::Progress { job_id, .. }
            | MergeUpdate::Done { job_id, .. }
            | MergeUpdate::Failed { job_id, .. } => *job_id,
        }
    }

    /// `true` for the update that ends a job.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, MergeUpdate::Progress { .. })
    }
}
