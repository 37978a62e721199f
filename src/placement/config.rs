//! Placement configuration snapshot

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// Extra clearance kept between the footprint and the world border
pub const BORDER_SAFETY_MARGIN: i32 = 8;

/// Which ground height in the footprint the structure's base rests on
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroundAnchor {
    /// One above the lowest true ground; may leave the structure partly buried
    #[default]
    Lowest,
    /// One above the highest true ground; may leave the structure overhanging
    Highest,
}

/// Base values and per-round steps for the acceptance thresholds
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaxationSchedule {
    pub max_height_variance: i32,
    pub height_variance_step: i32,
    pub height_variance_cap: i32,
    pub min_solid_ratio: f64,
    pub solid_ratio_step: f64,
    pub max_obstruction_ratio: f64,
    pub obstruction_step: f64,
    pub obstruction_cap: f64,
    /// Only enforced in round 0
    pub min_terrain_match: f64,
}

impl Default for RelaxationSchedule {
    fn default() -> Self {
        Self {
            max_height_variance: 1,
            height_variance_step: 2,
            height_variance_cap: 5,
            min_solid_ratio: 0.9,
            solid_ratio_step: 0.15,
            max_obstruction_ratio: 0.0,
            obstruction_step: 0.05,
            obstruction_cap: 0.15,
            min_terrain_match: 0.8,
        }
    }
}

/// Weights of the composite badness score (lower is better)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub variance: f64,
    pub solidity: f64,
    pub obstruction: f64,
    pub terrain: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            variance: 10.0,
            solidity: 40.0,
            obstruction: 30.0,
            terrain: 20.0,
        }
    }
}

/// Everything one placement attempt needs to know.
///
/// Taken as an immutable snapshot at the start of an attempt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Name of the world to place into
    pub world: String,
    /// Structure template identifier
    pub template: String,
    pub min_distance: i32,
    pub max_distance: i32,
    /// Candidates drawn per round
    pub attempts: u32,
    /// Highest relaxation round index; rounds run `0..=max_relax_rounds`
    pub max_relax_rounds: u32,
    pub y_offset: i32,
    pub ground_anchor: GroundAnchor,
    /// Flatness checks in round 0; always dropped from round 1 on
    pub require_flat: bool,
    /// Hard-reject sites in or near liquid. Never relaxed.
    pub avoid_liquids: bool,
    /// Horizontal scan radius around each column for nearby liquid
    pub liquid_radius: i32,
    /// Vertical band around ground level scanned for nearby liquid
    pub liquid_band: i32,
    /// Empty means any biome
    pub allowed_biomes: Vec<String>,
    /// Cells below the base also cleared of decoration
    pub clear_depth: i32,
    /// Load unloaded regions from the first round instead of escalating later
    pub region_loading: bool,
    pub round_delay_ticks: u32,
    pub escalation_delay_ticks: u32,
    /// Fixed sampling seed; random when absent
    pub seed: Option<u64>,
    pub relaxation: RelaxationSchedule,
    pub weights: ScoreWeights,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            world: "world".to_string(),
            template: "landmark".to_string(),
            min_distance: 2500,
            max_distance: 4000,
            attempts: 128,
            max_relax_rounds: 3,
            y_offset: 0,
            ground_anchor: GroundAnchor::Lowest,
            require_flat: true,
            avoid_liquids: true,
            liquid_radius: 8,
            liquid_band: 4,
            allowed_biomes: Vec::new(),
            clear_depth: 0,
            region_loading: false,
            round_delay_ticks: 40,
            escalation_delay_ticks: 20,
            seed: None,
            relaxation: RelaxationSchedule::default(),
            weights: ScoreWeights::default(),
        }
    }
}

impl PlacementConfig {
    /// Parse a JSON configuration; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load from a JSON file (sync)
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Save to a JSON file (sync)
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Normalise user input into a usable snapshot.
    ///
    /// Out-of-range values are clamped; values that would break the
    /// relaxation order or the score are rejected.
    pub fn validated(&self) -> Result<Self> {
        if self.template.trim().is_empty() {
            return Err(Error::InvalidConfig("template identifier is empty".into()));
        }

        let r = &self.relaxation;
        if r.height_variance_step < 0 || r.solid_ratio_step < 0.0 || r.obstruction_step < 0.0 {
            return Err(Error::InvalidConfig("relaxation steps must not be negative".into()));
        }
        let ratios = [
            r.min_solid_ratio,
            r.solid_ratio_step,
            r.max_obstruction_ratio,
            r.obstruction_step,
            r.obstruction_cap,
            r.min_terrain_match,
        ];
        if ratios.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidConfig("relaxation ratios must be finite".into()));
        }
        let w = &self.weights;
        if [w.variance, w.solidity, w.obstruction, w.terrain]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(Error::InvalidConfig("score weights must be finite and non-negative".into()));
        }

        let mut out = self.clone();
        out.min_distance = self.min_distance.max(0);
        out.max_distance = self.max_distance.max(out.min_distance);
        out.attempts = self.attempts.max(1);
        out.liquid_radius = self.liquid_radius.max(0);
        out.liquid_band = self.liquid_band.max(0);
        out.clear_depth = self.clear_depth.max(0);

        let r = &mut out.relaxation;
        r.max_height_variance = r.max_height_variance.max(0);
        r.height_variance_cap = r.height_variance_cap.max(r.max_height_variance);
        r.min_solid_ratio = r.min_solid_ratio.clamp(0.0, 1.0);
        r.obstruction_cap = r.obstruction_cap.clamp(0.0, 1.0);
        r.max_obstruction_ratio = r.max_obstruction_ratio.clamp(0.0, r.obstruction_cap);
        r.min_terrain_match = r.min_terrain_match.clamp(0.0, 1.0);
        Ok(out)
    }

    /// Sampling ring `[min, max]` pulled inside the world border.
    ///
    /// `footprint` is the larger horizontal side of the structure.
    pub fn distance_range(&self, border_half_extent: f64, footprint: i32) -> (i32, i32) {
        let mut max = self.max_distance.max(self.min_distance);
        if border_half_extent.is_finite() {
            let limit = (border_half_extent - footprint as f64 - BORDER_SAFETY_MARGIN as f64)
                .floor()
                .max(0.0);
            max = max.min(limit as i32);
        }
        let min = self.min_distance.clamp(0, max.max(0));
        (min, max.max(min))
    }
}
