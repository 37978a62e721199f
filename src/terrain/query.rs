//! Terrain query interface consumed by the placement engine

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use glam::{IVec2, IVec3};

use super::biome::Biome;
use super::material::Material;
use crate::core::{Error, Result};
use crate::voxel::region::RegionCoord;

/// Background load of a single region tile.
///
/// Runs off the cooperative context and must not touch terrain state; the
/// loaded data is folded in by [`Terrain::integrate_loaded_regions`].
pub type RegionLoad = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// A world shared with the host. Borrowed only on the cooperative context.
pub type SharedWorld<W> = Rc<RefCell<W>>;

/// Read access (plus cooperative-context writes) to a voxel world.
///
/// All methods except the future returned by `request_region_load` run on
/// the single cooperative context.
pub trait Terrain {
    /// Identifier persisted in the placement record
    fn world_id(&self) -> &str;

    /// Y of the highest non-air cell in the column, or the minimum height
    fn surface_height(&self, x: i32, z: i32) -> i32;

    fn material_at(&self, pos: IVec3) -> Material;

    fn set_material(&mut self, pos: IVec3, material: Material);

    /// Terrain classification tag at a cell
    fn biome_at(&self, pos: IVec3) -> Biome;

    fn is_region_loaded(&self, region: RegionCoord) -> bool;

    /// Start loading a region tile in the background.
    fn request_region_load(&mut self, region: RegionCoord) -> RegionLoad;

    /// Fold completed background loads into the resident set.
    fn integrate_loaded_regions(&mut self) {}

    /// `(min_y, max_y)`, min inclusive, max exclusive
    fn vertical_bounds(&self) -> (i32, i32);

    /// Whether a cell lies inside the horizontal world boundary
    fn boundary_contains(&self, pos: IVec3) -> bool;

    /// Center the sampling ring is measured from
    fn reference_center(&self) -> IVec2;

    /// Half the side length of the square world boundary
    fn boundary_half_extent(&self) -> f64 {
        f64::INFINITY
    }
}

/// Lookup of loaded worlds by name
pub trait WorldRegistry<W> {
    fn world(&self, name: &str) -> Option<SharedWorld<W>>;

    fn resolve(&self, name: &str) -> Result<SharedWorld<W>> {
        self.world(name)
            .ok_or_else(|| Error::WorldNotFound(name.to_string()))
    }
}

impl<W> WorldRegistry<W> for HashMap<String, SharedWorld<W>> {
    fn world(&self, name: &str) -> Option<SharedWorld<W>> {
        self.get(name).cloned()
    }
}
