// crates/overdub-media/src/memory.rs
//
// In-memory engine used by unit tests and as a reference MediaEngine
// implementation: assets are declared programmatically, compositions record
// every splice, and export sessions replay a scripted status sequence. On a
// scripted completion the session writes a JSON manifest of the composed
// tracks and mix to the output path, so end-to-end tests can assert against
// the artifact itself.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

use overdub_core::clip::TimeRange;

use crate::engine::{ExportSession, ExportSettings, ExportStatus, MediaEngine, TrackId, TrackKind};
use crate::mix::MixPlan;

/// One registered source file.
#[derive(Clone, Debug)]
pub struct MemoryAsset {
    pub path:         PathBuf,
    pub duration:     f64,
    pub video_tracks: usize,
    pub audio_tracks: usize,
}

/// A readable track inside a registered asset.
#[derive(Clone, Debug)]
pub struct MemoryTrack {
    pub path:  PathBuf,
    pub kind:  TrackKind,
    pub index: usize,
}

/// One recorded splice: `range` of `source` placed at `at` seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub source: PathBuf,
    pub range:  TimeRange,
    pub at:     f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComposedTrack {
    pub id:       TrackId,
    pub kind:     TrackKind,
    pub segments: Vec<Segment>,
}

/// A composition under assembly: every allocated track with its splices.
#[derive(Clone, Debug, Default)]
pub struct MemoryComposition {
    pub tracks: Vec<ComposedTrack>,
}

/// One step of a scripted status stream.
#[derive(Clone, Debug)]
pub enum ScriptStep {
    Waiting,
    Unknown,
    Progress(f32),
    Complete,
    Fail(Option<String>),
    Cancel(Option<String>),
}

/// What a completed export leaves at the output path.
#[derive(Debug, Serialize, Deserialize)]
pub struct Manifest {
    pub duration:             f64,
    pub tracks:               Vec<ComposedTrack>,
    pub ramps:                MixPlan,
    pub optimize_for_network: bool,
}

impl Manifest {
    /// Read a manifest back from an exported file.
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read manifest '{}'", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parse manifest '{}'", path.display()))
    }
}

/// Programmable in-memory engine.
pub struct MemoryEngine {
    assets:          HashMap<PathBuf, MemoryAsset>,
    fail_inserts:    HashSet<PathBuf>,
    script:          Vec<ScriptStep>,
    insert_calls:    AtomicUsize,
    exports_started: AtomicUsize,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self {
            assets:          HashMap::new(),
            fail_inserts:    HashSet::new(),
            script:          default_script(),
            insert_calls:    AtomicUsize::new(0),
            exports_started: AtomicUsize::new(0),
        }
    }

    /// Declare a source file with its natural duration and track counts.
    pub fn register(
        &mut self,
        path: impl Into<PathBuf>,
        duration: f64,
        video_tracks: usize,
        audio_tracks: usize,
    ) {
        let path = path.into();
        self.assets.insert(
            path.clone(),
            MemoryAsset { path, duration, video_tracks, audio_tracks },
        );
    }

    /// Make every insertion sourced from `path` fail.
    pub fn fail_insert_for(&mut self, path: impl Into<PathBuf>) {
        self.fail_inserts.insert(path.into());
    }

    /// Replace the status sequence every new export session replays.
    pub fn set_script(&mut self, script: Vec<ScriptStep>) {
        self.script = script;
    }

    /// Insertions attempted so far, across all compositions.
    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::Relaxed)
    }

    /// Export sessions started so far.
    pub fn exports_started(&self) -> usize {
        self.exports_started.load(Ordering::Relaxed)
    }

    /// Nominal duration of a composition: the furthest end among its video
    /// track segments. Audio past that point does not count.
    pub fn composed_duration(&self, comp: &MemoryComposition) -> f64 {
        composed_duration(comp)
    }

    /// The recorded splices of one composition track.
    pub fn segments_for(&self, comp: &MemoryComposition, id: TrackId) -> Vec<Segment> {
        comp.tracks
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.segments.clone())
            .unwrap_or_default()
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn default_script() -> Vec<ScriptStep> {
    vec![
        ScriptStep::Waiting,
        ScriptStep::Progress(0.25),
        ScriptStep::Progress(0.5),
        ScriptStep::Progress(0.75),
        ScriptStep::Progress(1.0),
        ScriptStep::Complete,
    ]
}

fn composed_duration(comp: &MemoryComposition) -> f64 {
    comp.tracks
        .iter()
        .filter(|t| t.kind == TrackKind::Video)
        .flat_map(|t| t.segments.iter())
        .map(|s| s.at + s.range.duration)
        .fold(0.0_f64, f64::max)
}

impl MediaEngine for MemoryEngine {
    type Asset = MemoryAsset;
    type Track = MemoryTrack;
    type Composition = MemoryComposition;
    type Session = MemorySession;

    fn open(&self, path: &Path) -> anyhow::Result<Self::Asset> {
        self.assets
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("no such asset: '{}'", path.display()))
    }

    fn duration(&self, asset: &Self::Asset) -> f64 {
        asset.duration
    }

    fn tracks(&self, asset: &Self::Asset, kind: TrackKind) -> Vec<Self::Track> {
        let count = match kind {
            TrackKind::Video => asset.video_tracks,
            TrackKind::Audio => asset.audio_tracks,
        };
        (0..count)
            .map(|index| MemoryTrack { path: asset.path.clone(), kind, index })
            .collect()
    }

    fn new_composition(&self) -> Self::Composition {
        MemoryComposition::default()
    }

    fn add_track(&self, comp: &mut Self::Composition, kind: TrackKind) -> TrackId {
        let id = TrackId::fresh();
        comp.tracks.push(ComposedTrack { id, kind, segments: Vec::new() });
        id
    }

    fn insert(
        &self,
        comp: &mut Self::Composition,
        dst: TrackId,
        source: &Self::Track,
        range: TimeRange,
        at: f64,
    ) -> anyhow::Result<()> {
        self.insert_calls.fetch_add(1, Ordering::Relaxed);

        if self.fail_inserts.contains(&source.path) {
            return Err(anyhow!("insertion rejected for '{}'", source.path.display()));
        }
        let track = comp
            .tracks
            .iter_mut()
            .find(|t| t.id == dst)
            .ok_or_else(|| anyhow!("unknown composition track"))?;
        if track.kind != source.kind {
            return Err(anyhow!(
                "cannot splice a {:?} source into a {:?} track",
                source.kind,
                track.kind
            ));
        }
        track.segments.push(Segment { source: source.path.clone(), range, at });
        Ok(())
    }

    fn export(
        &self,
        comp: Self::Composition,
        mix: MixPlan,
        output: &Path,
        settings: ExportSettings,
    ) -> anyhow::Result<Self::Session> {
        self.exports_started.fetch_add(1, Ordering::Relaxed);

        let manifest = Manifest {
            duration:             composed_duration(&comp),
            tracks:               comp.tracks,
            ramps:                mix,
            optimize_for_network: settings.optimize_for_network,
        };
        Ok(MemorySession {
            steps:    self.script.clone().into_iter(),
            output:   output.to_path_buf(),
            manifest: serde_json::to_string_pretty(&manifest)?,
        })
    }
}

/// Scripted export session. The manifest is written on `Complete`.
pub struct MemorySession {
    steps:    std::vec::IntoIter<ScriptStep>,
    output:   PathBuf,
    manifest: String,
}

impl ExportSession for MemorySession {
    fn next_status(&mut self) -> ExportStatus {
        match self.steps.next() {
            Some(ScriptStep::Waiting) => ExportStatus::Waiting,
            Some(ScriptStep::Unknown) => ExportStatus::Unknown,
            Some(ScriptStep::Progress(p)) => ExportStatus::Exporting { progress: p },
            Some(ScriptStep::Complete) => match std::fs::write(&self.output, &self.manifest) {
                Ok(()) => ExportStatus::Completed,
                Err(e) => ExportStatus::Failed {
                    error: Some(anyhow::Error::new(e).context(format!(
                        "write output '{}'",
                        self.output.display()
                    ))),
                },
            },
            Some(ScriptStep::Fail(msg)) => ExportStatus::Failed { error: msg.map(|m| anyhow!(m)) },
            Some(ScriptStep::Cancel(msg)) => {
                ExportStatus::Cancelled { error: msg.map(|m| anyhow!(m)) }
            }
            // A script that runs dry without a terminal step is a test bug;
            // fail loudly instead of letting the driver poll forever.
            None => ExportStatus::Failed {
                error: Some(anyhow!("status script exhausted without a terminal state")),
            },
        }
    }
}
