// crates/overdub-core/src/lib.rs
//
// Pure merge data — no engine handles, no channels, no I/O.
// Serializable via serde. Used by overdub-media and by anything that
// persists or replays merge requests.

pub mod clip;
pub mod error;
pub mod helpers;
pub mod job;

// Re-export the main types so downstream imports are simple.
pub use clip::{SourceClip, TimeRange};
pub use error::{MergeError, MergeResult};
pub use job::{ExportJob, JobState, MergeUpdate};
