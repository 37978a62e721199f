//! Per-round acceptance thresholds

use super::config::RelaxationSchedule;

/// Acceptance thresholds in effect for one relaxation round.
///
/// Liquid avoidance is absent on purpose: it is a hard gate in every round.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    pub round: u32,
    pub max_height_variance: i32,
    pub min_solid_ratio: f64,
    pub max_obstruction_ratio: f64,
    pub min_terrain_match: f64,
    pub require_flat: bool,
}

impl Thresholds {
    /// Thresholds for round `round`; every bound loosens as the round grows.
    pub fn for_round(schedule: &RelaxationSchedule, require_flat: bool, round: u32) -> Self {
        let r = round as i64;

        let variance = schedule.max_height_variance as i64 + r * schedule.height_variance_step as i64;
        let max_height_variance = variance
            .min(schedule.height_variance_cap as i64)
            .max(schedule.max_height_variance as i64) as i32;

        let min_solid_ratio = (schedule.min_solid_ratio - round as f64 * schedule.solid_ratio_step).max(0.0);

        let max_obstruction_ratio = (schedule.max_obstruction_ratio + round as f64 * schedule.obstruction_step)
            .min(schedule.obstruction_cap)
            .max(schedule.max_obstruction_ratio);

        let min_terrain_match = if round >= 1 { 0.0 } else { schedule.min_terrain_match };

        Self {
            round,
            max_height_variance,
            min_solid_ratio,
            max_obstruction_ratio,
            min_terrain_match,
            require_flat: require_flat && round == 0,
        }
    }
}
