//! Tolerance-window matching of mood parameters against prior generations.

use serde::{Deserialize, Serialize};

use super::models::GenerationRecord;
use crate::mood::ParameterSet;

/// Maximum absolute slider distance at which two parameter sets are
/// considered close enough to share a track. Toggles must always be equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tolerances {
    pub tempo: u8,
    pub style: u8,
    pub energy: u8,
    pub drums: u8,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            tempo: 5,
            style: 10,
            energy: 10,
            drums: 10,
        }
    }
}

/// Inclusive `[low, high]` window around `value`, not clamped to the slider range.
pub fn window(value: u8, tolerance: u8) -> (i64, i64) {
    let value = value as i64;
    let tolerance = tolerance as i64;
    (value - tolerance, value + tolerance)
}

impl Tolerances {
    pub fn accepts(&self, candidate: &ParameterSet, stored: &ParameterSet) -> bool {
        candidate.tempo.abs_diff(stored.tempo) <= self.tempo
            && candidate.style.abs_diff(stored.style) <= self.style
            && candidate.energy.abs_diff(stored.energy) <= self.energy
            && candidate.drums.abs_diff(stored.drums) <= self.drums
            && candidate.bass_boost == stored.bass_boost
            && candidate.distortion == stored.distortion
    }
}

/// Returns the most recent record inside every tolerance window.
///
/// Records sharing the newest timestamp resolve to the one that comes first
/// in `history`.
pub fn find_match<'a, I>(
    candidate: &ParameterSet,
    history: I,
    tolerances: &Tolerances,
) -> Option<&'a GenerationRecord>
where
    I: IntoIterator<Item = &'a GenerationRecord>,
{
    history
        .into_iter()
        .filter(|record| tolerances.accepts(candidate, &record.params))
        .fold(None, |best: Option<&GenerationRecord>, record| match best {
            Some(best) if best.created_at >= record.created_at => Some(best),
            _ => Some(record),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mood::DescriptorBundle;

    fn record(id: i64, params: ParameterSet, created_at: i64) -> GenerationRecord {
        GenerationRecord {
            id,
            params,
            descriptors: DescriptorBundle::from_params(&params),
            audio_url: format!("/tracks/{}.mp3", id),
            public_url: format!("https://cdn.example/{}.mp3", id),
            created_at,
        }
    }

    #[test]
    fn matches_within_all_windows() {
        let history = vec![record(1, ParameterSet::new(100, 50, 50, 50, false, false), 1)];
        let candidate = ParameterSet::new(100, 55, 58, 45, false, false);

        let found = find_match(&candidate, &history, &Tolerances::default());
        assert_eq!(found.map(|r| r.id), Some(1));
    }

    #[test]
    fn tempo_window_is_on_slider_scale() {
        let history = vec![record(1, ParameterSet::new(95, 50, 50, 50, false, false), 1)];
        let tolerances = Tolerances::default();

        let inside = ParameterSet::new(100, 50, 50, 50, false, false);
        assert!(find_match(&inside, &history, &tolerances).is_some());

        let outside = ParameterSet::new(89, 50, 50, 50, false, false);
        assert!(find_match(&outside, &history, &tolerances).is_none());
    }

    #[test]
    fn toggles_must_match_exactly() {
        let history = vec![record(1, ParameterSet::new(100, 50, 50, 50, false, false), 1)];
        let tolerances = Tolerances::default();

        let distorted = ParameterSet::new(100, 55, 58, 45, false, true);
        assert!(find_match(&distorted, &history, &tolerances).is_none());

        let boosted = ParameterSet::new(100, 50, 50, 50, true, false);
        assert!(find_match(&boosted, &history, &tolerances).is_none());
    }

    #[test]
    fn window_edges_are_inclusive() {
        let stored = ParameterSet::new(50, 50, 50, 50, true, true);
        let tolerances = Tolerances::default();

        assert!(tolerances.accepts(&ParameterSet::new(55, 60, 40, 60, true, true), &stored));
        assert!(!tolerances.accepts(&ParameterSet::new(56, 50, 50, 50, true, true), &stored));
        assert!(!tolerances.accepts(&ParameterSet::new(50, 61, 50, 50, true, true), &stored));
        assert!(!tolerances.accepts(&ParameterSet::new(50, 50, 39, 50, true, true), &stored));
        assert!(!tolerances.accepts(&ParameterSet::new(50, 50, 50, 61, true, true), &stored));
    }

    #[test]
    fn prefers_most_recent_match() {
        let params = ParameterSet::new(40, 40, 40, 40, false, false);
        let history = vec![
            record(1, params, 10),
            record(2, params, 30),
            record(3, ParameterSet::new(90, 40, 40, 40, false, false), 50),
            record(4, params, 20),
        ];

        let found = find_match(&params, &history, &Tolerances::default());
        assert_eq!(found.map(|r| r.id), Some(2));
    }

    #[test]
    fn equal_timestamps_resolve_to_first_in_order() {
        let params = ParameterSet::new(40, 40, 40, 40, false, false);
        let history = vec![record(7, params, 10), record(8, params, 10)];

        let found = find_match(&params, &history, &Tolerances::default());
        assert_eq!(found.map(|r| r.id), Some(7));
    }

    #[test]
    fn empty_history_has_no_match() {
        let history: Vec<GenerationRecord> = vec![];
        let params = ParameterSet::default();
        assert!(find_match(&params, &history, &Tolerances::default()).is_none());
    }

    #[test]
    fn window_is_symmetric_and_unclamped() {
        assert_eq!(window(3, 5), (-2, 8));
        assert_eq!(window(100, 10), (90, 110));
    }
}
