//! Terrain classification, queries and procedural generation

pub mod material;
pub use material::Material;

pub mod biome;
pub use biome::{Biome, BiomeMap, resolve_biomes};

pub mod query;
pub use query::{RegionLoad, SharedWorld, Terrain, WorldRegistry};

pub mod generator;
pub use generator::{FlatGenerator, RegionGenerator, TerrainGenerator, TerrainParams};
