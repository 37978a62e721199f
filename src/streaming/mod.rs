//! Region tile streaming

pub mod region_loader;

pub use region_loader::{FootprintBounds, LoadResult, RegionLoader};
