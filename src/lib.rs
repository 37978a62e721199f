//! Landmark - single-structure site selection and placement for voxel terrain

pub mod core;
pub mod terrain;
pub mod voxel;
pub mod streaming;
pub mod placement;
