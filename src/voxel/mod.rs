//! Voxel world storage

pub mod region;
pub mod world;

pub use region::{REGION_SIZE, Region, RegionCoord};
pub use world::VoxelWorld;
