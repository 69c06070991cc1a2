// crates/overdub-media/src/mix.rs
//
// Gain automation: one flat level segment per composed audio track, keyed
// by the track's identity and covering exactly its placed output range.

use serde::{Deserialize, Serialize};

use overdub_core::clip::TimeRange;

use crate::engine::TrackId;
use crate::timeline::PlacedAudio;

/// Constant-level gain over one track's placed range.
///
/// `start_level` and `end_level` are always equal here — a level, not a
/// fade — but the ramp shape keeps the engine interface general.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GainRamp {
    pub track:       TrackId,
    pub range:       TimeRange,
    pub start_level: f32,
    pub end_level:   f32,
}

impl GainRamp {
    /// Flat ramp at `level` across `range`.
    pub fn level(track: TrackId, range: TimeRange, level: f32) -> Self {
        Self { track, range, start_level: level, end_level: level }
    }
}

/// All gain parameters for one export, in track insertion order.
///
/// Order does not affect correctness — each ramp is keyed by track
/// identity — but it is kept stable for reproducibility.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MixPlan {
    pub ramps: Vec<GainRamp>,
}

impl MixPlan {
    /// The ramp bound to `track`, if any.
    pub fn ramp_for(&self, track: TrackId) -> Option<&GainRamp> {
        self.ramps.iter().find(|r| r.track == track)
    }
}

/// Translate each placed audio track into a flat gain segment at its clip's
/// configured volume. The i-th segment reads the i-th placed entry — every
/// track keeps its own level.
pub fn build_mix(placed: &[PlacedAudio]) -> MixPlan {
    let ramps = placed
        .iter()
        .map(|p| GainRamp::level(p.track, p.range, p.volume))
        .collect();
    MixPlan { ramps }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placed(volume: f32, start: f64, duration: f64) -> PlacedAudio {
        PlacedAudio {
            track:  TrackId::fresh(),
            range:  TimeRange::new(start, duration),
            volume,
        }
    }

    #[test]
    fn each_track_keeps_its_own_volume() {
        // Guards against the classic constant-index slip where every ramp
        // reads the first clip's volume.
        let inputs = [placed(1.0, 0.0, 10.0), placed(0.2, 2.0, 5.0), placed(0.9, 4.0, 3.0)];
        let mix = build_mix(&inputs);

        assert_eq!(mix.ramps.len(), 3);
        for (ramp, input) in mix.ramps.iter().zip(&inputs) {
            assert_eq!(ramp.track, input.track);
            assert_eq!(ramp.start_level, input.volume);
            assert_eq!(ramp.end_level, input.volume);
        }
        assert_eq!(mix.ramps[1].end_level, 0.2);
        assert_eq!(mix.ramps[2].end_level, 0.9);
    }

    #[test]
    fn ramps_are_flat_and_cover_the_placed_range() {
        let input = placed(0.0, 2.0, 5.0);
        let mix = build_mix(&[input]);

        let ramp = mix.ramp_for(input.track).unwrap();
        assert_eq!(ramp.start_level, 0.0);
        assert_eq!(ramp.end_level, 0.0);
        assert_eq!(ramp.range, TimeRange::new(2.0, 5.0));
    }

    #[test]
    fn order_matches_insertion_order() {
        let inputs = [placed(0.3, 0.0, 1.0), placed(0.7, 1.0, 1.0)];
        let mix = build_mix(&inputs);
        let tracks: Vec<_> = mix.ramps.iter().map(|r| r.track).collect();
        assert_eq!(tracks, vec![inputs[0].track, inputs[1].track]);
    }
}
