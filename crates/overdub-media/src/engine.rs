// crates/overdub-media/src/engine.rs
//
// The media-engine boundary. overdub drives any backend that can open local
// assets, splice time ranges into a multi-track composition, apply per-track
// gain, and encode asynchronously while reporting status.
//
// The output flavor is fixed: one MP4 container at the engine's
// highest-quality preset. Only the network-start optimization flag is
// carried explicitly.

use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use overdub_core::clip::TimeRange;

use crate::mix::MixPlan;

/// Media stream kind inside a source asset or a composition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackKind {
    Video,
    Audio,
}

/// Stable identity of one composition track. Gain ramps are keyed by this.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackId(pub Uuid);

impl TrackId {
    pub fn fresh() -> Self {
        TrackId(Uuid::new_v4())
    }
}

/// Settings handed to the engine when an export starts.
#[derive(Clone, Copy, Debug)]
pub struct ExportSettings {
    /// Lay the container out for progressive network playback
    /// (the `+faststart` / moov-first treatment).
    pub optimize_for_network: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self { optimize_for_network: true }
    }
}

/// One status observation from the engine's export task.
///
/// `Waiting`, `Exporting` and `Unknown` are transient; `Completed`,
/// `Failed` and `Cancelled` are terminal and end the status stream.
#[derive(Debug)]
pub enum ExportStatus {
    Waiting,
    Exporting { progress: f32 },
    Completed,
    Failed    { error: Option<anyhow::Error> },
    Cancelled { error: Option<anyhow::Error> },
    Unknown,
}

/// An engine-owned export task.
///
/// `next_status()` blocks until the engine has a new observation. After a
/// terminal status the stream is over and the task must not be polled again.
pub trait ExportSession: Send {
    fn next_status(&mut self) -> ExportStatus;
}

/// The black-box engine overdub composes and exports through.
///
/// Implementations own their worker context: `export` returns immediately
/// with a running session, and the encode proceeds on whatever internal
/// machinery the engine schedules it on.
pub trait MediaEngine {
    /// An opened source asset.
    type Asset;
    /// A readable track inside an opened asset.
    type Track;
    /// An in-memory multi-track timeline under assembly.
    type Composition;
    /// A running asynchronous export task.
    type Session: ExportSession + 'static;

    /// Open a local media file.
    fn open(&self, path: &Path) -> anyhow::Result<Self::Asset>;

    /// Natural duration of the asset in seconds.
    fn duration(&self, asset: &Self::Asset) -> f64;

    /// Tracks of `kind` inside `asset`, in container order.
    fn tracks(&self, asset: &Self::Asset, kind: TrackKind) -> Vec<Self::Track>;

    /// Allocate an empty composition.
    fn new_composition(&self) -> Self::Composition;

    /// Allocate a fresh track of `kind` inside `comp`.
    fn add_track(&self, comp: &mut Self::Composition, kind: TrackKind) -> TrackId;

    /// Splice `range` of `source` into composition track `dst`, placed at
    /// `at` seconds on the output timeline.
    fn insert(
        &self,
        comp: &mut Self::Composition,
        dst: TrackId,
        source: &Self::Track,
        range: TimeRange,
        at: f64,
    ) -> anyhow::Result<()>;

    /// Start encoding `comp` with `mix` into `output`. Returns the running
    /// session; any file already at `output` has been removed by the caller.
    fn export(
        &self,
        comp: Self::Composition,
        mix: MixPlan,
        output: &Path,
        settings: ExportSettings,
    ) -> anyhow::Result<Self::Session>;
}
