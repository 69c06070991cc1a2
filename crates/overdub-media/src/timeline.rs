// crates/overdub-media/src/timeline.rs
//
// Timeline assembly: one video source plus N audio sources spliced into a
// fresh engine composition. All sources are opened and their tracks
// resolved before the first insertion — an unresolvable track aborts the
// whole build and no partial timeline is ever handed to the exporter.

use tracing::debug;

use overdub_core::clip::{SourceClip, TimeRange};
use overdub_core::error::{MergeError, MergeResult};
use overdub_core::helpers::time::format_duration;

use crate::engine::{MediaEngine, TrackId, TrackKind};

/// One audio track's placement in the output, recorded for gain
/// construction. `range` is in output-timeline coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedAudio {
    pub track:  TrackId,
    pub range:  TimeRange,
    pub volume: f32,
}

/// The assembled timeline plus everything the export stage needs.
#[derive(Debug)]
pub struct ComposedTimeline<C> {
    pub composition:  C,
    pub video_track:  TrackId,
    /// Slot 0 is the video's own audio, then one track per audio clip.
    pub audio_tracks: Vec<TrackId>,
    /// Gain inputs, in the same order as `audio_tracks`.
    pub placed:       Vec<PlacedAudio>,
    /// Nominal output length in seconds, defined by the video range.
    pub duration:     f64,
}

impl<C> ComposedTimeline<C> {
    /// Total composition tracks: the video plus every audio slot.
    pub fn track_count(&self) -> usize {
        1 + self.audio_tracks.len()
    }
}

/// Build the composition for one merge call. Synchronous; runs entirely on
/// the caller's thread.
pub fn compose<E: MediaEngine>(
    engine: &E,
    video:  &SourceClip,
    audios: &[SourceClip],
) -> MergeResult<ComposedTimeline<E::Composition>> {
    validate_clip(video, "video")?;
    for (i, clip) in audios.iter().enumerate() {
        validate_clip(clip, &format!("audio[{i}]"))?;
    }

    // ── Resolve the video source ──────────────────────────────────────────
    let video_asset = engine.open(&video.path).map_err(|e| MergeError::OpenSource {
        path: video.path.clone(),
        source: e,
    })?;

    // The video must carry an embedded audio track; without one there is
    // nothing to lay the supplied audio against.
    let video_audio_src = engine
        .tracks(&video_asset, TrackKind::Audio)
        .into_iter()
        .next()
        .ok_or_else(|| MergeError::MissingAudioInVideo { path: video.path.clone() })?;

    let video_video_src = engine
        .tracks(&video_asset, TrackKind::Video)
        .into_iter()
        .next()
        .ok_or_else(|| MergeError::MissingVideoTrack { path: video.path.clone() })?;

    let video_range = video.time_range(engine.duration(&video_asset));
    if video_range.is_empty() {
        return Err(MergeError::validation(format!(
            "video '{}' resolves to an empty time range",
            video.path.display()
        )));
    }

    // ── Resolve every audio source before touching the composition ────────
    // Sources without an audio track drop out of `resolved`; the count
    // check below turns any drop into a hard stop before insertion.
    let mut resolved = Vec::with_capacity(audios.len());
    for clip in audios {
        let asset = engine.open(&clip.path).map_err(|e| MergeError::OpenSource {
            path: clip.path.clone(),
            source: e,
        })?;
        let natural = engine.duration(&asset);
        if let Some(track) = engine.tracks(&asset, TrackKind::Audio).into_iter().next() {
            resolved.push((clip, track, natural));
        } else {
            debug!(path = %clip.path.display(), "audio source has no audio track");
        }
    }
    if resolved.len() != audios.len() {
        return Err(MergeError::TrackCountMismatch {
            requested: audios.len(),
            resolved:  resolved.len(),
        });
    }

    // ── Allocate output slots ─────────────────────────────────────────────
    let mut composition = engine.new_composition();
    let video_track = engine.add_track(&mut composition, TrackKind::Video);
    let mut audio_tracks = Vec::with_capacity(1 + audios.len());
    audio_tracks.push(engine.add_track(&mut composition, TrackKind::Audio));
    for _ in audios {
        audio_tracks.push(engine.add_track(&mut composition, TrackKind::Audio));
    }
    debug_assert_eq!(audio_tracks.len(), 1 + resolved.len());

    // ── Video first: this insertion defines the canonical output length ───
    engine
        .insert(&mut composition, video_track, &video_video_src, video_range, 0.0)
        .map_err(|e| MergeError::Insertion { path: video.path.clone(), source: e })?;

    // The video's own audio mirrors the video range at offset zero.
    engine
        .insert(&mut composition, audio_tracks[0], &video_audio_src, video_range, 0.0)
        .map_err(|e| MergeError::Insertion { path: video.path.clone(), source: e })?;

    let mut placed = Vec::with_capacity(1 + resolved.len());
    placed.push(PlacedAudio {
        track:  audio_tracks[0],
        range:  TimeRange::new(0.0, video_range.duration),
        volume: video.volume,
    });

    // ── Supplied audio: source head `[0, duration)` placed at start_time ──
    for (i, (clip, track, natural)) in resolved.iter().enumerate() {
        let src_range = TimeRange::new(0.0, clip.effective_duration(*natural));
        let slot = audio_tracks[i + 1];
        engine
            .insert(&mut composition, slot, track, src_range, clip.start_time)
            .map_err(|e| MergeError::Insertion { path: clip.path.clone(), source: e })?;
        placed.push(PlacedAudio {
            track:  slot,
            range:  TimeRange::new(clip.start_time, src_range.duration),
            volume: clip.volume,
        });
    }

    let track_count = 1 + audio_tracks.len();
    debug!(
        tracks = track_count,
        length = %format_duration(video_range.duration),
        "composed timeline"
    );

    Ok(ComposedTimeline {
        composition,
        video_track,
        audio_tracks,
        placed,
        duration: video_range.duration,
    })
}

fn validate_clip(clip: &SourceClip, role: &str) -> MergeResult<()> {
    if !clip.start_time.is_finite() || clip.start_time < 0.0 {
        return Err(MergeError::validation(format!(
            "{role} clip '{}': start_time must be >= 0",
            clip.path.display()
        )));
    }
    if let Some(d) = clip.duration {
        if !d.is_finite() || d <= 0.0 {
            return Err(MergeError::validation(format!(
                "{role} clip '{}': duration must be > 0",
                clip.path.display()
            )));
        }
    }
    if !clip.volume.is_finite() || clip.volume < 0.0 {
        return Err(MergeError::validation(format!(
            "{role} clip '{}': volume must be a finite gain >= 0",
            clip.path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryEngine;

    fn engine_with_defaults() -> MemoryEngine {
        let mut engine = MemoryEngine::new();
        engine.register("/media/take.mp4", 10.0, 1, 1);
        engine.register("/media/music.m4a", 180.0, 0, 1);
        engine.register("/media/voice.wav", 42.0, 0, 1);
        engine
    }

    #[test]
    fn track_count_is_two_plus_audio_clips() {
        let engine = engine_with_defaults();
        let video = SourceClip::new("/media/take.mp4");
        let audios = [
            SourceClip::new("/media/music.m4a").with_duration(5.0),
            SourceClip::new("/media/voice.wav").with_duration(3.0),
        ];

        let timeline = compose(&engine, &video, &audios).unwrap();
        assert_eq!(timeline.track_count(), 2 + audios.len());
        assert_eq!(timeline.audio_tracks.len(), 1 + audios.len());
        assert_eq!(timeline.placed.len(), 1 + audios.len());
    }

    #[test]
    fn video_range_defines_output_duration() {
        let engine = engine_with_defaults();
        let video = SourceClip::new("/media/take.mp4");
        // Placed well past the video's end; must not stretch the output.
        let audios = [SourceClip::new("/media/music.m4a")
            .with_start_time(60.0)
            .with_duration(30.0)];

        let timeline = compose(&engine, &video, &audios).unwrap();
        assert_eq!(timeline.duration, 10.0);
        assert_eq!(engine.composed_duration(&timeline.composition), 10.0);
    }

    #[test]
    fn video_without_audio_track_aborts_before_composition() {
        let mut engine = MemoryEngine::new();
        engine.register("/media/silent.mp4", 10.0, 1, 0);

        let err = compose(&engine, &SourceClip::new("/media/silent.mp4"), &[]).unwrap_err();
        assert!(matches!(err, MergeError::MissingAudioInVideo { .. }));
        assert_eq!(engine.insert_calls(), 0);
    }

    #[test]
    fn source_without_video_track_is_rejected() {
        let mut engine = MemoryEngine::new();
        engine.register("/media/podcast.m4a", 10.0, 0, 1);

        let err = compose(&engine, &SourceClip::new("/media/podcast.m4a"), &[]).unwrap_err();
        assert!(matches!(err, MergeError::MissingVideoTrack { .. }));
    }

    #[test]
    fn audio_source_without_audio_track_stops_before_any_insertion() {
        let mut engine = engine_with_defaults();
        engine.register("/media/broken.m4a", 5.0, 0, 0);

        let video = SourceClip::new("/media/take.mp4");
        let audios = [
            SourceClip::new("/media/music.m4a"),
            SourceClip::new("/media/broken.m4a"),
        ];

        let err = compose(&engine, &video, &audios).unwrap_err();
        match err {
            MergeError::TrackCountMismatch { requested, resolved } => {
                assert_eq!(requested, 2);
                assert_eq!(resolved, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(engine.insert_calls(), 0);
    }

    #[test]
    fn insertion_failure_aborts_the_build() {
        let mut engine = engine_with_defaults();
        engine.fail_insert_for("/media/music.m4a");

        let video = SourceClip::new("/media/take.mp4");
        let audios = [SourceClip::new("/media/music.m4a").with_duration(5.0)];

        let err = compose(&engine, &video, &audios).unwrap_err();
        assert!(matches!(err, MergeError::Insertion { .. }));
    }

    #[test]
    fn audio_reads_source_head_and_places_at_start_time() {
        let engine = engine_with_defaults();
        let video = SourceClip::new("/media/take.mp4");
        let audios = [SourceClip::new("/media/music.m4a")
            .with_start_time(2.0)
            .with_duration(5.0)];

        let timeline = compose(&engine, &video, &audios).unwrap();

        // Source side: always the head of the file.
        let seg = engine.segments_for(&timeline.composition, timeline.audio_tracks[1]);
        assert_eq!(seg.len(), 1);
        assert_eq!(seg[0].range, TimeRange::new(0.0, 5.0));
        assert_eq!(seg[0].at, 2.0);

        // Output side: the placed range starts at the clip's offset.
        assert_eq!(timeline.placed[1].range, TimeRange::new(2.0, 5.0));
    }

    #[test]
    fn video_trim_range_is_read_from_the_source() {
        let engine = engine_with_defaults();
        let video = SourceClip::new("/media/take.mp4")
            .with_start_time(3.0)
            .with_duration(4.0);

        let timeline = compose(&engine, &video, &[]).unwrap();

        let seg = engine.segments_for(&timeline.composition, timeline.video_track);
        assert_eq!(seg[0].range, TimeRange::new(3.0, 4.0));
        assert_eq!(seg[0].at, 0.0);
        assert_eq!(timeline.duration, 4.0);
        // The embedded audio mirrors the same trim at offset zero.
        assert_eq!(timeline.placed[0].range, TimeRange::new(0.0, 4.0));
    }

    #[test]
    fn missing_duration_falls_back_to_the_probed_length() {
        let engine = engine_with_defaults();
        let video = SourceClip::new("/media/take.mp4");
        let audios = [SourceClip::new("/media/voice.wav")];

        let timeline = compose(&engine, &video, &audios).unwrap();
        assert_eq!(timeline.placed[1].range, TimeRange::new(0.0, 42.0));
    }

    #[test]
    fn invalid_clip_data_is_rejected_up_front() {
        let engine = engine_with_defaults();
        let video = SourceClip::new("/media/take.mp4");

        let negative_start = [SourceClip::new("/media/music.m4a").with_start_time(-1.0)];
        assert!(matches!(
            compose(&engine, &video, &negative_start).unwrap_err(),
            MergeError::Validation(_)
        ));

        let zero_duration = [SourceClip::new("/media/music.m4a").with_duration(0.0)];
        assert!(matches!(
            compose(&engine, &video, &zero_duration).unwrap_err(),
            MergeError::Validation(_)
        ));

        let bad_volume = [SourceClip::new("/media/music.m4a").with_volume(-0.5)];
        assert!(matches!(
            compose(&engine, &video, &bad_volume).unwrap_err(),
            MergeError::Validation(_)
        ));
    }
}
