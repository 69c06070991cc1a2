// crates/overdub-core/src/clip.rs
//
// Source-clip descriptors and the time ranges derived from them.
// One SourceClip describes one input file's contribution to a merge;
// it is built by the caller and never mutated after the merge starts.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Half-open span `[start, start + duration)` in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start:    f64,
    pub duration: f64,
}

impl TimeRange {
    pub fn new(start: f64, duration: f64) -> Self {
        Self { start, duration }
    }

    /// Exclusive end of the span.
    pub fn end(self) -> f64 {
        self.start + self.duration
    }

    pub fn contains(self, t: f64) -> bool {
        self.start <= t && t < self.end()
    }

    pub fn is_empty(self) -> bool {
        self.duration <= 0.0
    }
}

/// One source file's contribution to the merged output.
///
/// For the video clip, `start_time`/`duration` select the source-side trim
/// range, and that range's length is the output's nominal length. For audio
/// clips the source is always read from its beginning (`[0, duration)`) and
/// `start_time` is where that slice lands on the output timeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceClip {
    /// Absolute path to the source media file.
    pub path:       PathBuf,
    /// Linear gain applied to this clip's audio in the final mix (1.0 = unchanged).
    #[serde(default = "default_clip_volume")]
    pub volume:     f32,
    /// Seconds; see the type-level note for video vs. audio semantics.
    #[serde(default)]
    pub start_time: f64,
    /// Seconds of source material to use. `None` = the source's full natural
    /// duration, resolved when the clip is opened.
    #[serde(default)]
    pub duration:   Option<f64>,
}

fn default_clip_volume() -> f32 { 1.0 }

impl SourceClip {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path:       path.into(),
            volume:     1.0,
            start_time: 0.0,
            duration:   None,
        }
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }

    pub fn with_start_time(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }

    /// The clip's time range once its duration is known. `natural` is the
    /// source's probed duration, used when no explicit duration was set.
    pub fn time_range(&self, natural: f64) -> TimeRange {
        TimeRange::new(self.start_time, self.duration.unwrap_or(natural))
    }

    /// Seconds this clip contributes, falling back to `natural`.
    pub fn effective_duration(&self, natural: f64) -> f64 {
        self.duration.unwrap_or(natural)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_source() {
        let clip = SourceClip::new("/media/take.mp4");
        assert_eq!(clip.volume, 1.0);
        assert_eq!(clip.start_time, 0.0);
        assert_eq!(clip.duration, None);
        assert_eq!(clip.time_range(12.5), TimeRange::new(0.0, 12.5));
    }

    #[test]
    fn explicit_duration_wins_over_natural() {
        let clip = SourceClip::new("/media/music.m4a")
            .with_start_time(2.0)
            .with_duration(5.0);
        let range = clip.time_range(180.0);
        assert_eq!(range, TimeRange::new(2.0, 5.0));
        assert_eq!(range.end(), 7.0);
    }

    #[test]
    fn time_range_is_half_open() {
        let range = TimeRange::new(2.0, 5.0);
        assert!(range.contains(2.0));
        assert!(range.contains(6.999));
        assert!(!range.contains(7.0));
        assert!(!range.contains(1.999));
    }

    #[test]
    fn serde_round_trip_keeps_all_fields() {
        let clip = SourceClip::new("/media/music.m4a")
            .with_volume(0.5)
            .with_start_time(2.0)
            .with_duration(5.0);
        let json = serde_json::to_string(&clip).unwrap();
        let back: SourceClip = serde_json::from_str(&json).unwrap();
        assert_eq!(back.path, clip.path);
        assert_eq!(back.volume, 0.5);
        assert_eq!(back.start_time, 2.0);
        assert_eq!(back.duration, Some(5.0));
    }

    #[test]
    fn serde_fills_defaults_for_missing_fields() {
        let back: SourceClip =
            serde_json::from_str(r#"{"path":"/media/take.mp4"}"#).unwrap();
        assert_eq!(back.volume, 1.0);
        assert_eq!(back.start_time, 0.0);
        assert_eq!(back.duration, None);
    }
}
