//! Biome classification used as the terrain class tag

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use noise::{NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use super::material::Material;

/// Biome types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Biome {
    Ocean,
    Beach,
    Swamp,
    Desert,
    Plains,
    SunflowerPlains,
    Savanna,
    Meadow,
    Forest,
    Taiga,
    SnowyPlains,
    Mountains,
}

impl Biome {
    pub const ALL: [Biome; 12] = [
        Biome::Ocean,
        Biome::Beach,
        Biome::Swamp,
        Biome::Desert,
        Biome::Plains,
        Biome::SunflowerPlains,
        Biome::Savanna,
        Biome::Meadow,
        Biome::Forest,
        Biome::Taiga,
        Biome::SnowyPlains,
        Biome::Mountains,
    ];

    /// Canonical snake_case name
    pub fn name(&self) -> &'static str {
        match self {
            Biome::Ocean => "ocean",
            Biome::Beach => "beach",
            Biome::Swamp => "swamp",
            Biome::Desert => "desert",
            Biome::Plains => "plains",
            Biome::SunflowerPlains => "sunflower_plains",
            Biome::Savanna => "savanna",
            Biome::Meadow => "meadow",
            Biome::Forest => "forest",
            Biome::Taiga => "taiga",
            Biome::SnowyPlains => "snowy_plains",
            Biome::Mountains => "mountains",
        }
    }

    /// Block placed at the surface of a column in this biome
    pub fn surface_material(&self) -> Material {
        match self {
            Biome::Ocean => Material::Gravel,
            Biome::Beach | Biome::Desert => Material::Sand,
            Biome::Mountains => Material::Stone,
            _ => Material::GrassBlock,
        }
    }

    /// Block a few cells below the surface
    pub fn underground_material(&self) -> Material {
        match self {
            Biome::Beach => Material::Sand,
            Biome::Desert => Material::Sandstone,
            Biome::Ocean | Biome::Mountains => Material::Stone,
            _ => Material::Dirt,
        }
    }

    /// Whether this biome can have vegetation
    pub fn has_vegetation(&self) -> bool {
        self.vegetation_density() > 0.0
    }

    /// Vegetation density (0.0-1.0)
    pub fn vegetation_density(&self) -> f32 {
        match self {
            Biome::Forest => 0.8,
            Biome::Swamp => 0.6,
            Biome::Taiga => 0.5,
            Biome::Meadow => 0.5,
            Biome::Plains | Biome::SunflowerPlains => 0.3,
            Biome::Savanna => 0.2,
            _ => 0.0,
        }
    }

    /// Chance per column of a tree trunk
    pub fn tree_density(&self) -> f32 {
        match self {
            Biome::Forest => 0.04,
            Biome::Taiga => 0.03,
            Biome::Swamp => 0.015,
            Biome::Savanna => 0.004,
            _ => 0.0,
        }
    }
}

impl fmt::Display for Biome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for unrecognised biome names
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown biome: {0}")]
pub struct UnknownBiome(pub String);

impl FromStr for Biome {
    type Err = UnknownBiome;

    /// Accepts `plains`, `Sunflower Plains` and namespaced `minecraft:plains`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let key = trimmed
            .rsplit_once(':')
            .map(|(_, name)| name)
            .unwrap_or(trimmed)
            .to_lowercase()
            .replace([' ', '-'], "_");

        Biome::ALL
            .into_iter()
            .find(|b| b.name() == key)
            .ok_or_else(|| UnknownBiome(raw.to_string()))
    }
}

/// Resolve configured biome names, skipping unknown entries with a warning.
///
/// An empty result disables the terrain-class filter.
pub fn resolve_biomes<S: AsRef<str>>(names: &[S]) -> HashSet<Biome> {
    let mut resolved = HashSet::new();
    for name in names {
        match name.as_ref().parse::<Biome>() {
            Ok(biome) => {
                resolved.insert(biome);
            }
            Err(e) => log::warn!("Skipping allowed biome entry: {}", e),
        }
    }
    if !names.is_empty() && resolved.is_empty() {
        log::warn!("No allowed biomes resolved; biome filter disabled");
    }
    resolved
}

/// Biome map generator
pub struct BiomeMap {
    temperature_noise: Perlin,
    moisture_noise: Perlin,
    temp_scale: f64,
    moisture_scale: f64,
}

impl BiomeMap {
    /// Create new biome map with given seed
    pub fn new(seed: u32) -> Self {
        Self {
            temperature_noise: Perlin::new(seed),
            moisture_noise: Perlin::new(seed.wrapping_add(1000)),
            temp_scale: 0.0008,    // Large-scale temperature zones
            moisture_scale: 0.0012, // Medium-scale moisture patterns
        }
    }

    /// Get temperature at world position (-1 to 1, cold to hot)
    pub fn temperature_at(&self, x: i32, z: i32) -> f32 {
        let temp = self
            .temperature_noise
            .get([x as f64 * self.temp_scale, z as f64 * self.temp_scale]) as f32;

        // Gets colder far from the origin
        let latitude_factor = (z as f32 * 0.0002).abs().min(1.0);
        temp - latitude_factor * 0.5
    }

    /// Get moisture at world position (0 to 1, dry to wet)
    pub fn moisture_at(&self, x: i32, z: i32) -> f32 {
        let moisture = self
            .moisture_noise
            .get([x as f64 * self.moisture_scale, z as f64 * self.moisture_scale]) as f32;

        (moisture + 1.0) * 0.5
    }

    /// Get biome at world position based on temp, moisture, and height
    pub fn biome_at(&self, x: i32, z: i32, height: i32, sea_level: i32) -> Biome {
        if height < sea_level - 2 {
            return Biome::Ocean;
        }
        if height <= sea_level + 1 {
            return Biome::Beach;
        }
        if height - sea_level > 60 {
            return Biome::Mountains;
        }

        let temp = self.temperature_at(x, z);
        let moisture = self.moisture_at(x, z);

        match (temp, moisture) {
            (t, m) if t < -0.3 => {
                if m > 0.5 { Biome::Taiga } else { Biome::SnowyPlains }
            }
            (t, m) if t > 0.3 => {
                if m > 0.7 {
                    Biome::Swamp
                } else if m > 0.4 {
                    Biome::Savanna
                } else {
                    Biome::Desert
                }
            }
            (_, m) => {
                if m > 0.65 {
                    Biome::Forest
                } else if m > 0.5 {
                    Biome::Meadow
                } else if m > 0.45 {
                    Biome::SunflowerPlains
                } else {
                    Biome::Plains
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variants() {
        assert_eq!("plains".parse::<Biome>().unwrap(), Biome::Plains);
        assert_eq!("minecraft:snowy_plains".parse::<Biome>().unwrap(), Biome::SnowyPlains);
        assert_eq!("Sunflower Plains".parse::<Biome>().unwrap(), Biome::SunflowerPlains);
        assert!("nether_wastes".parse::<Biome>().is_err());
    }

    #[test]
    fn test_name_roundtrip() {
        for biome in Biome::ALL {
            assert_eq!(biome.name().parse::<Biome>().unwrap(), biome);
        }
    }

    #[test]
    fn test_resolve_skips_unknown() {
        let set = resolve_biomes(&["plains", "bogus", "minecraft:meadow"]);
        assert_eq!(set.len(), 2);
        assert!(set.contains(&Biome::Plains));
        assert!(set.contains(&Biome::Meadow));

        let empty: [&str; 0] = [];
        assert!(resolve_biomes(&empty).is_empty());
    }

    #[test]
    fn test_surface_materials_are_ground() {
        for biome in Biome::ALL {
            assert!(!biome.surface_material().is_ground_skippable());
            assert!(!biome.underground_material().is_ground_skippable());
        }
    }

    #[test]
    fn test_vegetation() {
        assert!(Biome::Forest.has_vegetation());
        assert!(Biome::Plains.has_vegetation());
        assert!(!Biome::Desert.has_vegetation());
        assert!(!Biome::Ocean.has_vegetation());
        assert_eq!(Biome::Forest.vegetation_density(), 0.8);
    }

    #[test]
    fn test_moisture_range() {
        let biome_map = BiomeMap::new(12345);
        for x in [-1000, 0, 1000] {
            for z in [-1000, 0, 1000] {
                let moisture = biome_map.moisture_at(x, z);
                assert!((0.0..=1.0).contains(&moisture), "moisture {} out of range", moisture);
            }
        }
    }

    #[test]
    fn test_water_and_altitude_biomes() {
        let biome_map = BiomeMap::new(12345);
        let sea_level = 62;
        assert_eq!(biome_map.biome_at(0, 0, sea_level - 10, sea_level), Biome::Ocean);
        assert_eq!(biome_map.biome_at(0, 0, sea_level, sea_level), Biome::Beach);
        assert_eq!(biome_map.biome_at(0, 0, sea_level + 80, sea_level), Biome::Mountains);
    }

    #[test]
    fn test_biome_determinism() {
        let biome_map = BiomeMap::new(12345);
        let a = biome_map.biome_at(100, 200, 72, 62);
        let b = biome_map.biome_at(100, 200, 72, 62);
        assert_eq!(a, b);
    }
}
