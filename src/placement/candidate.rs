//! Candidate sites, composite scoring and rejection bookkeeping

use std::fmt;

use glam::IVec3;

use super::config::ScoreWeights;
use super::footprint::FootprintAnalysis;
use super::thresholds::Thresholds;

/// A scored candidate site. Kept in memory only.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub height_variance: i32,
    pub solid_ratio: f64,
    pub obstruction_ratio: f64,
    pub terrain_match_ratio: f64,
    /// Composite badness, lower is better
    pub score: f64,
    /// Round the candidate was drawn in
    pub round: u32,
}

impl Candidate {
    pub fn new(
        origin: IVec3,
        analysis: &FootprintAnalysis,
        obstruction_ratio: f64,
        weights: &ScoreWeights,
        round: u32,
    ) -> Self {
        let height_variance = analysis.variance();
        Self {
            x: origin.x,
            y: origin.y,
            z: origin.z,
            height_variance,
            solid_ratio: analysis.solid_ratio,
            obstruction_ratio,
            terrain_match_ratio: analysis.terrain_match_ratio,
            score: composite_score(
                height_variance,
                analysis.solid_ratio,
                obstruction_ratio,
                analysis.terrain_match_ratio,
                weights,
            ),
            round,
        }
    }

    pub fn position(&self) -> IVec3 {
        IVec3::new(self.x, self.y, self.z)
    }

    /// Whether this candidate beats `other` (or there is no other)
    pub fn improves_on(&self, other: Option<&Candidate>) -> bool {
        other.is_none_or(|best| self.score < best.score)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{},{}) score={:.1} var={} solid={:.0}% obstruct={:.0}% biome={:.0}%",
            self.x,
            self.y,
            self.z,
            self.score,
            self.height_variance,
            self.solid_ratio * 100.0,
            self.obstruction_ratio * 100.0,
            self.terrain_match_ratio * 100.0
        )
    }
}

/// Weighted sum of height variance and the solidity, obstruction and biome deficits.
pub fn composite_score(
    height_variance: i32,
    solid_ratio: f64,
    obstruction_ratio: f64,
    terrain_match_ratio: f64,
    weights: &ScoreWeights,
) -> f64 {
    height_variance as f64 * weights.variance
        + (1.0 - solid_ratio) * weights.solidity
        + obstruction_ratio * weights.obstruction
        + (1.0 - terrain_match_ratio) * weights.terrain
}

/// Why a candidate was not accepted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// Footprint regions not resident and loading disabled
    RegionUnloaded,
    /// Footprint regions still missing after a load attempt
    RegionLoadTimeout,
    Liquid,
    /// Outside the vertical bounds or the world border
    Boundary,
    TerrainMismatch,
    Flatness,
    Obstruction,
}

impl Rejection {
    pub const ALL: [Rejection; 7] = [
        Rejection::RegionUnloaded,
        Rejection::RegionLoadTimeout,
        Rejection::Liquid,
        Rejection::Boundary,
        Rejection::TerrainMismatch,
        Rejection::Flatness,
        Rejection::Obstruction,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Rejection::RegionUnloaded => "unloaded",
            Rejection::RegionLoadTimeout => "load_timeout",
            Rejection::Liquid => "liquid",
            Rejection::Boundary => "border",
            Rejection::TerrainMismatch => "biome",
            Rejection::Flatness => "flatness",
            Rejection::Obstruction => "volume",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

/// A named threshold check over a scored candidate
pub type SiteCheck = fn(&Candidate, &Thresholds) -> Option<Rejection>;

fn check_terrain_match(c: &Candidate, t: &Thresholds) -> Option<Rejection> {
    (c.terrain_match_ratio < t.min_terrain_match).then_some(Rejection::TerrainMismatch)
}

fn check_flatness(c: &Candidate, t: &Thresholds) -> Option<Rejection> {
    let too_rough = c.height_variance > t.max_height_variance || c.solid_ratio < t.min_solid_ratio;
    (t.require_flat && too_rough).then_some(Rejection::Flatness)
}

fn check_obstruction(c: &Candidate, t: &Thresholds) -> Option<Rejection> {
    (c.obstruction_ratio > t.max_obstruction_ratio).then_some(Rejection::Obstruction)
}

/// Threshold checks in evaluation order
pub const SITE_CHECKS: [SiteCheck; 3] = [check_terrain_match, check_flatness, check_obstruction];

/// First failing threshold check, or `None` when the candidate is acceptable
pub fn first_failure(candidate: &Candidate, thresholds: &Thresholds) -> Option<Rejection> {
    SITE_CHECKS.iter().find_map(|check| check(candidate, thresholds))
}

/// Per-reason rejection counters for one round
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RejectionStats {
    counts: [u32; Rejection::ALL.len()],
}

impl RejectionStats {
    pub fn record(&mut self, reason: Rejection) {
        self.counts[reason.index()] += 1;
    }

    pub fn count(&self, reason: Rejection) -> u32 {
        self.counts[reason.index()]
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Region misses make up more than half of all rejections
    pub fn region_misses_dominate(&self) -> bool {
        let misses = self.count(Rejection::RegionUnloaded);
        misses > 0 && misses * 2 > self.total()
    }
}

impl fmt::Display for RejectionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, reason) in Rejection::ALL.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", reason.name(), self.count(*reason))?;
        }
        Ok(())
    }
}
