//! Scoring and leveling policy
//!
//! Pure functions of score and current pace; the tick applies the result.

use crate::tuning::Tuning;

/// Level reached at `score`: one level per `threshold` points, starting at 1
pub fn level_for_score(score: u64, threshold: u64) -> u32 {
    (score / threshold.max(1)) as u32 + 1
}

/// Pace after one or more level-ups
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelChange {
    pub from: u32,
    pub to: u32,
    pub game_speed: f32,
    pub spawn_interval_ms: f64,
}

impl LevelChange {
    /// Each level in `from+1..=to` gets its own level-up cue
    pub fn levels_gained(&self) -> std::ops::RangeInclusive<u32> {
        (self.from + 1)..=self.to
    }
}

/// Compute the new pace if `score` has crossed into a higher level.
///
/// Every level gained adds `speed_increment` and shortens the spawn
/// interval by `spawn_interval_decrement_ms`, floored at
/// `min_spawn_interval_ms`.
pub fn evaluate(
    score: u64,
    level: u32,
    game_speed: f32,
    spawn_interval_ms: f64,
    tuning: &Tuning,
) -> Option<LevelChange> {
    let target = level_for_score(score, tuning.level_threshold);
    if target <= level {
        return None;
    }

    let mut speed = game_speed;
    let mut interval = spawn_interval_ms;
    for _ in level..target {
        speed += tuning.speed_increment;
        interval = (interval - tuning.spawn_interval_decrement_ms).max(tuning.min_spawn_interval_ms);
    }

    Some(LevelChange {
        from: level,
        to: target,
        game_speed: speed,
        spawn_interval_ms: interval,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_level_for_score() {
        assert_eq!(level_for_score(0, 1000), 1);
        assert_eq!(level_for_score(999, 1000), 1);
        assert_eq!(level_for_score(1000, 1000), 2);
        assert_eq!(level_for_score(2000, 1000), 3);
    }

    #[test]
    fn test_no_change_within_level() {
        let tuning = Tuning::default();
        assert_eq!(evaluate(998, 1, 3.0, 2500.0, &tuning), None);
    }

    #[test]
    fn test_level_up_adjusts_pace() {
        let tuning = Tuning::default();
        let change = evaluate(1000, 1, 3.0, 2500.0, &tuning).expect("level up");
        assert_eq!(change.to, 2);
        assert!((change.game_speed - 3.5).abs() < f32::EPSILON);
        assert_eq!(change.spawn_interval_ms, 2350.0);
        assert_eq!(change.levels_gained().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_spawn_interval_floor() {
        let tuning = Tuning::default();
        let change = evaluate(1000, 1, 3.0, 1250.0, &tuning).expect("level up");
        assert_eq!(change.spawn_interval_ms, tuning.min_spawn_interval_ms);
    }

    #[test]
    fn test_multi_level_jump_reports_each_level() {
        let tuning = Tuning::default();
        let change = evaluate(3500, 1, 3.0, 2500.0, &tuning).expect("level up");
        assert_eq!(change.levels_gained().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert!((change.game_speed - 4.5).abs() < 1e-5);
    }

    proptest! {
        #[test]
        fn prop_level_is_monotonic(a in 0u64..1_000_000, b in 0u64..1_000_000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(level_for_score(lo, 1000) <= level_for_score(hi, 1000));
        }

        #[test]
        fn prop_interval_never_below_floor(score in 0u64..100_000) {
            let tuning = Tuning::default();
            if let Some(change) = evaluate(score, 1, tuning.base_speed, tuning.spawn_interval_ms, &tuning) {
                prop_assert!(change.spawn_interval_ms >= tuning.min_spawn_interval_ms);
                prop_assert!(change.game_speed > tuning.base_speed);
            }
        }
    }
}
