//! Ground analysis over the horizontal footprint of a structure

use std::collections::HashSet;

use glam::IVec3;

use crate::terrain::{Biome, Terrain};

/// Where to look for liquid around each footprint column
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LiquidScan {
    /// Horizontal radius around the column
    pub radius: i32,
    /// Cells above and below ground level
    pub band: i32,
}

impl Default for LiquidScan {
    fn default() -> Self {
        Self { radius: 8, band: 4 }
    }
}

/// Ground statistics for one candidate footprint
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FootprintAnalysis {
    pub min_ground_y: i32,
    pub max_ground_y: i32,
    /// Fraction of columns standing on solid, non-liquid ground
    pub solid_ratio: f64,
    /// Fraction of columns in an allowed biome; 1.0 when any biome is allowed
    pub terrain_match_ratio: f64,
    /// Liquid in or near the footprint. Rejects the site in every round.
    pub has_liquid: bool,
}

impl FootprintAnalysis {
    pub fn variance(&self) -> i32 {
        self.max_ground_y - self.min_ground_y
    }
}

/// Scans footprint columns for ground height, solidity, biome and liquid.
#[derive(Clone, Debug, Default)]
pub struct FootprintAnalyzer {
    allowed: HashSet<Biome>,
    liquid_scan: Option<LiquidScan>,
}

impl FootprintAnalyzer {
    /// `liquid_scan` of `None` skips liquid detection entirely.
    pub fn new(allowed: HashSet<Biome>, liquid_scan: Option<LiquidScan>) -> Self {
        Self { allowed, liquid_scan }
    }

    pub fn allowed(&self) -> &HashSet<Biome> {
        &self.allowed
    }

    /// Columns read outside the footprint on each side
    pub fn halo(&self) -> i32 {
        self.liquid_scan.map_or(0, |scan| scan.radius.max(0))
    }

    /// Analyze the `width` x `depth` columns starting at `(origin_x, origin_z)`.
    ///
    /// Every column is visited even after liquid is found, so the height and
    /// biome statistics stay complete.
    pub fn analyze<W: Terrain + ?Sized>(
        &self,
        world: &W,
        origin_x: i32,
        origin_z: i32,
        width: i32,
        depth: i32,
    ) -> FootprintAnalysis {
        let (world_min_y, _) = world.vertical_bounds();
        let mut min_ground = i32::MAX;
        let mut max_ground = i32::MIN;
        let mut total = 0u32;
        let mut solid = 0u32;
        let mut matched = 0u32;
        let mut has_liquid = false;

        for dx in 0..width {
            for dz in 0..depth {
                let (x, z) = (origin_x + dx, origin_z + dz);
                let ground_y = true_ground_y(world, x, z);
                total += 1;

                min_ground = min_ground.min(ground_y);
                max_ground = max_ground.max(ground_y);

                let ground = world.material_at(IVec3::new(x, ground_y, z));
                if ground.is_liquid() {
                    has_liquid = true;
                } else if ground.is_solid() {
                    solid += 1;
                }

                if let Some(scan) = self.liquid_scan {
                    if !has_liquid
                        && (liquid_above(world, x, ground_y, z) || liquid_nearby(world, x, ground_y, z, scan))
                    {
                        has_liquid = true;
                    }
                }

                if !self.allowed.is_empty()
                    && self.allowed.contains(&world.biome_at(IVec3::new(x, ground_y, z)))
                {
                    matched += 1;
                }
            }
        }

        if total == 0 {
            return FootprintAnalysis {
                min_ground_y: world_min_y,
                max_ground_y: world_min_y,
                solid_ratio: 0.0,
                terrain_match_ratio: 1.0,
                has_liquid,
            };
        }

        FootprintAnalysis {
            min_ground_y: min_ground,
            max_ground_y: max_ground,
            solid_ratio: solid as f64 / total as f64,
            terrain_match_ratio: if self.allowed.is_empty() {
                1.0
            } else {
                matched as f64 / total as f64
            },
            has_liquid,
        }
    }
}

/// Descend from the reported surface past air, liquid and vegetation.
///
/// Returns the world's minimum height when the column has no ground at all.
pub fn true_ground_y<W: Terrain + ?Sized>(world: &W, x: i32, z: i32) -> i32 {
    let (min_y, _) = world.vertical_bounds();
    let mut y = world.surface_height(x, z);
    while y >= min_y {
        if !world.material_at(IVec3::new(x, y, z)).is_ground_skippable() {
            return y;
        }
        y -= 1;
    }
    min_y
}

/// Liquid sitting on top of the ground, possibly with air between.
fn liquid_above<W: Terrain + ?Sized>(world: &W, x: i32, ground_y: i32, z: i32) -> bool {
    let (_, max_y) = world.vertical_bounds();
    for y in ground_y + 1..max_y {
        let m = world.material_at(IVec3::new(x, y, z));
        if m.is_liquid() {
            return true;
        }
        if !m.is_air() {
            break;
        }
    }
    false
}

/// Liquid in neighbouring columns near this column's ground level.
fn liquid_nearby<W: Terrain + ?Sized>(world: &W, x: i32, ground_y: i32, z: i32, scan: LiquidScan) -> bool {
    let (min_y, max_y) = world.vertical_bounds();
    let lo = (ground_y - scan.band).max(min_y);
    let hi = (ground_y + scan.band).min(max_y - 1);
    for dx in -scan.radius..=scan.radius {
        for dz in -scan.radius..=scan.radius {
            for y in lo..=hi {
                if world.material_at(IVec3::new(x + dx, y, z + dz)).is_liquid() {
                    return true;
                }
            }
        }
    }
    false
}
