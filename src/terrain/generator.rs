//! Region generators: noise-based terrain and flat test worlds

use glam::IVec3;
use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use super::biome::{Biome, BiomeMap};
use super::material::Material;
use crate::voxel::region::{REGION_SIZE, Region, RegionCoord};

/// Produces the resident contents of a region tile.
///
/// Called from background load tasks, so implementations must be thread-safe
/// and deterministic per coordinate.
pub trait RegionGenerator: Send + Sync {
    fn generate(&self, coord: RegionCoord, min_y: i32, max_y: i32) -> Region;
}

/// Parameters controlling terrain generation
#[derive(Clone, Debug)]
pub struct TerrainParams {
    pub seed: u32,
    pub scale: f64,         // Horizontal scale (larger = smoother)
    pub base_height: i32,   // Height of the noise midpoint
    pub height_scale: f64,  // Vertical amplitude
    pub octaves: u32,       // FBM octaves (detail levels)
    pub persistence: f64,   // FBM persistence (0.5 typical)
    pub lacunarity: f64,    // FBM lacunarity (2.0 typical)
    pub sea_level: i32,     // Columns below this are flooded
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            seed: 12345,
            scale: 180.0,
            base_height: 68,
            height_scale: 28.0,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            sea_level: 62,
        }
    }
}

/// Procedural terrain generator using fractal Brownian motion (FBM)
pub struct TerrainGenerator {
    params: TerrainParams,
    noise: Fbm<Perlin>,
    biome_map: BiomeMap,
}

impl TerrainGenerator {
    /// Create a new terrain generator with the given parameters
    pub fn new(params: TerrainParams) -> Self {
        let noise = Fbm::<Perlin>::new(params.seed)
            .set_octaves(params.octaves as usize)
            .set_persistence(params.persistence)
            .set_lacunarity(params.lacunarity);
        let biome_map = BiomeMap::new(params.seed);

        Self { params, noise, biome_map }
    }

    /// Get terrain parameters
    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    /// Terrain height at a world column
    pub fn height_at(&self, x: i32, z: i32) -> i32 {
        let nx = x as f64 / self.params.scale;
        let nz = z as f64 / self.params.scale;
        let value = self.noise.get([nx, nz]);
        self.params.base_height + (value * self.params.height_scale).round() as i32
    }

    pub fn biome_at(&self, x: i32, z: i32) -> Biome {
        let height = self.height_at(x, z);
        self.biome_map.biome_at(x, z, height, self.params.sea_level)
    }

    fn place_tree(region: &mut Region, x: i32, z: i32, ground: i32, trunk: i32, max_y: i32) {
        let top = ground + trunk;
        if top + 2 >= max_y {
            return;
        }
        region.fill_column(x, z, ground + 1, top, Material::Log);
        for dx in -2..=2 {
            for dz in -2..=2 {
                let (lx, lz) = (x + dx, z + dz);
                // Canopy is clipped to this tile
                if !region.contains_column(lx, lz) {
                    continue;
                }
                for y in top - 1..=top + 1 {
                    if dx.abs() + dz.abs() > 3 {
                        continue;
                    }
                    let pos = IVec3::new(lx, y, lz);
                    if region.get(pos).is_air() {
                        region.set(pos, Material::Leaves);
                    }
                }
            }
        }
    }
}

impl RegionGenerator for TerrainGenerator {
    fn generate(&self, coord: RegionCoord, min_y: i32, max_y: i32) -> Region {
        let mut region = Region::new(coord, min_y, max_y);
        let (ox, oz) = coord.origin();
        let sea_level = self.params.sea_level;
        let mut trees = Vec::new();

        for lx in 0..REGION_SIZE {
            for lz in 0..REGION_SIZE {
                let (x, z) = (ox + lx, oz + lz);
                let height = self.height_at(x, z).clamp(min_y, max_y - 1);
                let biome = self.biome_map.biome_at(x, z, height, sea_level);
                region.set_biome(x, z, biome);

                region.fill_column(x, z, min_y, height - 4, Material::Stone);
                region.fill_column(x, z, height - 3, height - 1, biome.underground_material());
                let surface = if height < sea_level && biome.surface_material() == Material::GrassBlock {
                    Material::Dirt
                } else {
                    biome.surface_material()
                };
                region.set(IVec3::new(x, height, z), surface);

                if height < sea_level {
                    region.fill_column(x, z, height + 1, sea_level, Material::Water);
                    if column_roll(self.params.seed, x, z, 3) < 0.2 {
                        region.set(IVec3::new(x, height + 1, z), Material::Seagrass);
                    }
                    continue;
                }

                let roll = column_roll(self.params.seed, x, z, 1);
                if roll < biome.tree_density() {
                    trees.push((x, z, height, 4 + (column_roll(self.params.seed, x, z, 2) * 3.0) as i32));
                } else if roll < biome.vegetation_density() {
                    let plant = if roll < biome.vegetation_density() * 0.15 {
                        Material::Flower
                    } else if biome == Biome::SnowyPlains {
                        Material::Snow
                    } else {
                        Material::ShortGrass
                    };
                    region.set(IVec3::new(x, height + 1, z), plant);
                } else if biome == Biome::Desert && roll > 0.995 {
                    region.fill_column(x, z, height + 1, height + 2, Material::Cactus);
                }
            }
        }

        for (x, z, ground, trunk) in trees {
            Self::place_tree(&mut region, x, z, ground, trunk, max_y);
        }
        region
    }
}

/// Deterministic per-column random value in `[0, 1)`
fn column_roll(seed: u32, x: i32, z: i32, salt: u32) -> f32 {
    let mut h = (seed as u64) ^ ((salt as u64) << 32);
    h = h.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ (x as u32 as u64);
    h = h.wrapping_mul(0xBF58_476D_1CE4_E5B9) ^ ((z as u32 as u64) << 16);
    h ^= h >> 31;
    h = h.wrapping_mul(0x94D0_49BB_1331_11EB);
    h ^= h >> 29;
    (h >> 40) as f32 / (1u64 << 24) as f32
}

/// Uniform terrain: stone below a single ground level, optional flooding.
#[derive(Clone, Debug)]
pub struct FlatGenerator {
    pub ground_y: i32,
    pub surface: Material,
    pub biome: Biome,
    /// Water fills every column up to this height when set
    pub water_level: Option<i32>,
}

impl FlatGenerator {
    pub fn new(ground_y: i32) -> Self {
        Self {
            ground_y,
            surface: Material::GrassBlock,
            biome: Biome::Plains,
            water_level: None,
        }
    }

    pub fn with_biome(mut self, biome: Biome) -> Self {
        self.biome = biome;
        self
    }

    pub fn flooded(mut self, water_level: i32) -> Self {
        self.water_level = Some(water_level);
        self
    }
}

impl RegionGenerator for FlatGenerator {
    fn generate(&self, coord: RegionCoord, min_y: i32, max_y: i32) -> Region {
        let mut region = Region::new(coord, min_y, max_y);
        let (ox, oz) = coord.origin();
        let ground = self.ground_y.clamp(min_y, max_y - 1);
        for lx in 0..REGION_SIZE {
            for lz in 0..REGION_SIZE {
                let (x, z) = (ox + lx, oz + lz);
                region.set_biome(x, z, self.biome);
                region.fill_column(x, z, min_y, ground - 1, Material::Stone);
                region.set(IVec3::new(x, ground, z), self.surface);
                if let Some(level) = self.water_level {
                    region.fill_column(x, z, ground + 1, level.min(max_y - 1), Material::Water);
                }
            }
        }
        region
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terrain_params_default() {
        let params = TerrainParams::default();
        assert_eq!(params.seed, 12345);
        assert_eq!(params.octaves, 4);
        assert_eq!(params.sea_level, 62);
    }

    #[test]
    fn test_height_at_consistency() {
        let generator = TerrainGenerator::new(TerrainParams::default());
        for (x, z) in [(0, 0), (50, 50), (100, 100), (-50, -50)] {
            let h1 = generator.height_at(x, z);
            let h2 = generator.height_at(x, z);
            assert_eq!(h1, h2, "Height should be consistent at ({}, {})", x, z);
            assert!((20..=120).contains(&h1));
        }
    }

    #[test]
    fn test_different_seeds() {
        let gen1 = TerrainGenerator::new(TerrainParams { seed: 1, ..Default::default() });
        let gen2 = TerrainGenerator::new(TerrainParams { seed: 2, ..Default::default() });
        let differs = (0..32).any(|i| gen1.height_at(i * 37, i * 11) != gen2.height_at(i * 37, i * 11));
        assert!(differs);
    }

    #[test]
    fn test_generated_surface_matches_height() {
        let generator = TerrainGenerator::new(TerrainParams::default());
        let region = generator.generate(RegionCoord::new(2, -3), -64, 320);
        let (ox, oz) = region.coord.origin();
        for (x, z) in [(ox, oz), (ox + 7, oz + 9), (ox + 15, oz + 15)] {
            let height = generator.height_at(x, z);
            let ground = region.get(IVec3::new(x, height, z));
            assert!(!ground.is_ground_skippable(), "ground at ({}, {}) was {:?}", x, z, ground);
            assert!(region.surface_height(x, z) >= height);
        }
    }

    #[test]
    fn test_flooded_columns_below_sea_level() {
        let generator = TerrainGenerator::new(TerrainParams {
            base_height: 40,
            height_scale: 1.0,
            sea_level: 62,
            ..Default::default()
        });
        let region = generator.generate(RegionCoord::new(0, 0), 0, 128);
        assert_eq!(region.get(IVec3::new(3, 62, 3)), Material::Water);
        assert_eq!(region.biome(3, 3), Biome::Ocean);
    }

    #[test]
    fn test_flat_generator() {
        let generator = FlatGenerator::new(64).with_biome(Biome::Meadow);
        let region = generator.generate(RegionCoord::new(-1, 0), 0, 128);
        assert_eq!(region.get(IVec3::new(-5, 64, 3)), Material::GrassBlock);
        assert_eq!(region.get(IVec3::new(-5, 63, 3)), Material::Stone);
        assert_eq!(region.get(IVec3::new(-5, 65, 3)), Material::Air);
        assert_eq!(region.surface_height(-5, 3), 64);
        assert_eq!(region.biome(-5, 3), Biome::Meadow);

        let flooded = FlatGenerator::new(64).flooded(70).generate(RegionCoord::new(0, 0), 0, 128);
        assert_eq!(flooded.get(IVec3::new(1, 70, 1)), Material::Water);
        assert_eq!(flooded.surface_height(1, 1), 70);
    }

    #[test]
    fn test_column_roll_range() {
        for i in -50..50 {
            let r = column_roll(7, i * 13, -i * 7, 1);
            assert!((0.0..1.0).contains(&r));
        }
    }
}
