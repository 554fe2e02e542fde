//! Phase gating over journey progress.
//!
//! The journey is split into four phases, each unlocked at a fixed progress
//! floor. Gating is pure arithmetic over [`Progress`]: no stored state, no
//! clock. A phase counts as complete once progress reaches the next phase's
//! floor, so completion and the following unlock always agree.

use serde::{Deserialize, Serialize};

use crate::Progress;

/// One phase of the founder journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Foundation,
    Growth,
    Hero,
    Scaling,
}

impl Phase {
    /// All phases in journey order.
    pub const ALL: [Phase; 4] = [Phase::Foundation, Phase::Growth, Phase::Hero, Phase::Scaling];

    /// Progress floor at which this phase unlocks.
    #[must_use]
    pub const fn threshold(self) -> u8 {
        match self {
            Phase::Foundation => 0,
            Phase::Growth => 25,
            Phase::Hero => 50,
            Phase::Scaling => 75,
        }
    }

    /// Progress at which this phase counts as complete.
    ///
    /// This is the next phase's floor; the final phase completes at 100.
    #[must_use]
    pub const fn completion(self) -> u8 {
        match self.next() {
            Some(next) => next.threshold(),
            None => 100,
        }
    }

    /// The phase after this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Phase> {
        match self {
            Phase::Foundation => Some(Phase::Growth),
            Phase::Growth => Some(Phase::Hero),
            Phase::Hero => Some(Phase::Scaling),
            Phase::Scaling => None,
        }
    }

    #[must_use]
    pub fn is_unlocked(self, progress: Progress) -> bool {
        progress.value() >= self.threshold()
    }

    #[must_use]
    pub fn is_complete(self, progress: Progress) -> bool {
        progress.value() >= self.completion()
    }

    /// The furthest phase unlocked at `progress`.
    #[must_use]
    pub fn current(progress: Progress) -> Phase {
        let mut current = Phase::Foundation;
        for phase in Phase::ALL {
            if phase.is_unlocked(progress) {
                current = phase;
            }
        }
        current
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Phase::Foundation => "foundation",
            Phase::Growth => "growth",
            Phase::Hero => "hero",
            Phase::Scaling => "scaling",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Phase::Foundation => "Foundation",
            Phase::Growth => "Growth",
            Phase::Hero => "Hero",
            Phase::Scaling => "Scaling",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gate evaluation for one phase at a given progress value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseStatus {
    pub phase: Phase,
    pub unlocked: bool,
    pub complete: bool,
}

/// Evaluate every phase gate at `progress`, in journey order.
#[must_use]
pub fn phase_statuses(progress: Progress) -> [PhaseStatus; 4] {
    Phase::ALL.map(|phase| PhaseStatus {
        phase,
        unlocked: phase.is_unlocked(progress),
        complete: phase.is_complete(progress),
    })
}

#[cfg(test)]
mod tests {
    use super::{Phase, phase_statuses};
    use crate::Progress;

    fn at(value: u8) -> Progress {
        Progress::new(value).unwrap()
    }

    #[test]
    fn foundation_is_always_unlocked() {
        assert!(Phase::Foundation.is_unlocked(at(0)));
        assert!(Phase::Foundation.is_unlocked(at(100)));
    }

    #[test]
    fn phases_unlock_exactly_at_their_floor() {
        assert!(!Phase::Growth.is_unlocked(at(24)));
        assert!(Phase::Growth.is_unlocked(at(25)));
        assert!(!Phase::Hero.is_unlocked(at(49)));
        assert!(Phase::Hero.is_unlocked(at(50)));
        assert!(!Phase::Scaling.is_unlocked(at(74)));
        assert!(Phase::Scaling.is_unlocked(at(75)));
    }

    #[test]
    fn completion_matches_the_next_unlock() {
        for phase in Phase::ALL {
            if let Some(next) = phase.next() {
                let boundary = at(next.threshold());
                assert!(phase.is_complete(boundary));
                assert!(next.is_unlocked(boundary));
            }
        }
    }

    #[test]
    fn scaling_completes_only_at_one_hundred() {
        assert!(!Phase::Scaling.is_complete(at(99)));
        assert!(Phase::Scaling.is_complete(at(100)));
    }

    #[test]
    fn current_phase_tracks_progress() {
        assert_eq!(Phase::current(at(0)), Phase::Foundation);
        assert_eq!(Phase::current(at(24)), Phase::Foundation);
        assert_eq!(Phase::current(at(25)), Phase::Growth);
        assert_eq!(Phase::current(at(60)), Phase::Hero);
        assert_eq!(Phase::current(at(100)), Phase::Scaling);
    }

    #[test]
    fn statuses_cover_all_phases_in_order() {
        let statuses = phase_statuses(at(50));
        assert_eq!(statuses.len(), 4);
        assert_eq!(statuses[0].phase, Phase::Foundation);
        assert!(statuses[0].complete);
        assert!(statuses[1].unlocked && statuses[1].complete);
        assert!(statuses[2].unlocked && !statuses[2].complete);
        assert!(!statuses[3].unlocked);
    }

    #[test]
    fn a_full_journey_never_locks_a_phase_back() {
        let mut unlocked_so_far = 0;
        for value in 0..=100 {
            let count = phase_statuses(at(value))
                .iter()
                .filter(|status| status.unlocked)
                .count();
            assert!(count >= unlocked_so_far, "unlock count regressed at {value}");
            unlocked_so_far = count;
        }
    }
}
