// crates/overdub-media/src/worker.rs
//
// MergeWorker: owns the update channel and the per-job export threads.
// All public API that callers drive lives here.
//
// One merge call = one job. Composition and mix build run synchronously on
// the calling thread; only the export stage is asynchronous. Jobs share
// nothing — each gets its own timeline, mix, output path and thread — so
// concurrent merges need no locking anywhere in this crate.

use std::path::PathBuf;
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, info};
use uuid::Uuid;

use overdub_core::clip::SourceClip;
use overdub_core::error::{MergeError, MergeResult};
use overdub_core::helpers::time::format_duration;
use overdub_core::job::{ExportJob, MergeUpdate};

use crate::engine::{ExportSettings, MediaEngine};
use crate::export::{output_path_for, remove_stale_output, run_export_loop};
use crate::mix::build_mix;
use crate::timeline::compose;

/// Per-merge configuration.
#[derive(Clone, Debug)]
pub struct MergeOptions {
    /// Directory the output file is written into.
    pub output_dir: PathBuf,
    /// Pin a fixed output file name instead of the default
    /// `merged-<job-id>.mp4`. With a pinned name, concurrent merges into the
    /// same directory will collide — the per-job default never does.
    pub file_name:  Option<String>,
    pub settings:   ExportSettings,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            output_dir: std::env::temp_dir(),
            file_name:  None,
            settings:   ExportSettings::default(),
        }
    }
}

/// Handle for one started merge. The terminal update for `id` arrives on
/// the worker channel exactly once.
#[derive(Clone, Debug)]
pub struct MergeJob {
    pub id:     Uuid,
    pub output: PathBuf,
}

pub struct MergeWorker {
    /// Shared update channel: progress, completions, failures — tagged by
    /// job id. Whichever thread drains this is the callback context.
    pub rx: Receiver<MergeUpdate>,
    tx:     Sender<MergeUpdate>,
}

impl MergeWorker {
    pub fn new() -> Self {
        let (tx, rx) = bounded(512);
        Self { rx, tx }
    }

    /// Merge `video` with `audios` into one output file.
    ///
    /// The timeline and mix are built here, on the calling thread; any
    /// composition failure returns synchronously and no export is started.
    /// On success the encode proceeds on its own thread and the job handle
    /// returns immediately.
    pub fn merge<E: MediaEngine>(
        &self,
        engine: &E,
        video:  &SourceClip,
        audios: &[SourceClip],
        opts:   &MergeOptions,
    ) -> MergeResult<MergeJob> {
        let job_id = Uuid::new_v4();

        let timeline = compose(engine, video, audios)?;
        let mix = build_mix(&timeline.placed);

        let output = output_path_for(&opts.output_dir, opts.file_name.as_deref(), job_id);
        remove_stale_output(&output);

        let session = engine
            .export(timeline.composition, mix, &output, opts.settings)
            .map_err(MergeError::Encode)?;

        info!(
            job = %job_id,
            output = %output.display(),
            length = %format_duration(timeline.duration),
            audio_tracks = timeline.audio_tracks.len(),
            "starting export"
        );

        let tx = self.tx.clone();
        let mut job = ExportJob::new(job_id, output.clone());
        thread::spawn(move || {
            let mut session = session;
            run_export_loop(&mut job, &mut session, &tx);
        });

        Ok(MergeJob { id: job_id, output })
    }

    /// Drain updates on the calling thread, forwarding them to callbacks
    /// until `job`'s terminal update arrives. The calling thread is the
    /// callback context — progress and completion never fire from the
    /// export thread. Updates for other jobs are dropped; use `rx` directly
    /// when several jobs run against one worker.
    pub fn drive(
        &self,
        job: &MergeJob,
        mut on_progress: impl FnMut(f32),
        on_complete: impl FnOnce(Result<PathBuf, MergeError>),
    ) {
        loop {
            let update = match self.rx.recv() {
                Ok(update) => update,
                Err(_) => return,
            };
            if update.job_id() != job.id {
                debug!(job = %update.job_id(), "dropping update for a different job");
                continue;
            }
            match update {
                MergeUpdate::Progress { fraction, .. } => on_progress(fraction),
                MergeUpdate::Done { output, .. } => {
                    on_complete(Ok(output));
                    return;
                }
                MergeUpdate::Failed { error, .. } => {
                    on_complete(Err(error));
                    return;
                }
            }
        }
    }
}

impl Default for MergeWorker {
    fn default() -> Self {
        Self::new()
    }
}
