// crates/overdub-media/src/lib.rs
//
// No UI dependency — communicates with callers via channels only.
//
// To merge through a new media backend:
//   1. Implement MediaEngine (and ExportSession for its export task)
//   2. Hand the engine to MergeWorker::merge

pub mod engine;
pub mod export;
pub mod memory;
pub mod mix;
pub mod timeline;
pub mod worker;

// Re-export the main public API so caller imports are simple.
pub use engine::{ExportSession, ExportSettings, ExportStatus, MediaEngine, TrackId, TrackKind};
pub use worker::{MergeJob, MergeOptions, MergeWorker};

// Re-export the core types so callers need only one crate in scope.
pub use overdub_core::{JobState, MergeError, MergeResult, MergeUpdate, SourceClip, TimeRange};
