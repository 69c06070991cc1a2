// crates/overdub-core/src/error.rs
//
// Typed failure surface for one merge call. Composition-stage variants
// abort before any export starts; the encode variants wrap whatever the
// engine reported for its terminal state.

use std::path::PathBuf;

/// Convenience result type used across overdub.
pub type MergeResult<T> = Result<T, MergeError>;

#[derive(thiserror::Error, Debug)]
pub enum MergeError {
    /// Invalid caller-provided clip data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A source file could not be opened by the engine.
    #[error("could not open source '{}'", .path.display())]
    OpenSource {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// The video source exposes no usable audio track.
    #[error("no audio track in video source '{}'", .path.display())]
    MissingAudioInVideo { path: PathBuf },

    /// The video source exposes no video track.
    #[error("no video track in source '{}'", .path.display())]
    MissingVideoTrack { path: PathBuf },

    /// Fewer audio source tracks resolved than audio clips supplied.
    /// Raised before any insertion so no partial timeline is ever built.
    #[error("resolved {resolved} audio tracks for {requested} audio clips")]
    TrackCountMismatch { requested: usize, resolved: usize },

    /// The engine rejected a time-range insertion.
    #[error("failed to insert '{}' into the timeline", .path.display())]
    Insertion {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// The encoder reported a terminal failure.
    #[error("export failed")]
    Encode(#[source] anyhow::Error),

    /// The encoder's export task was cancelled externally.
    #[error("export cancelled")]
    Cancelled(#[source] anyhow::Error),
}

impl MergeError {
    /// Build a [`MergeError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
