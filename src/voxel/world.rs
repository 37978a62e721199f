//! In-memory voxel world made of lazily generated region tiles

use std::collections::HashMap;
use std::sync::Arc;

use glam::{IVec2, IVec3};
use tokio::sync::mpsc;

use super::region::{Region, RegionCoord};
use crate::terrain::{Biome, Material, RegionGenerator, RegionLoad, Terrain};

/// Default vertical range, min inclusive, max exclusive
pub const DEFAULT_MIN_Y: i32 = -64;
pub const DEFAULT_MAX_Y: i32 = 320;

/// Container for a world composed of region tiles.
///
/// Tiles become resident either synchronously through [`VoxelWorld::preload_area`]
/// or in the background through [`Terrain::request_region_load`]; background
/// results are only inserted by [`Terrain::integrate_loaded_regions`].
pub struct VoxelWorld {
    id: String,
    min_y: i32,
    max_y: i32,
    border_center: IVec2,
    border_half_extent: f64,
    regions: HashMap<RegionCoord, Region>,
    generator: Arc<dyn RegionGenerator>,
    loaded_tx: mpsc::UnboundedSender<Region>,
    loaded_rx: mpsc::UnboundedReceiver<Region>,
}

impl VoxelWorld {
    /// Create an empty world with an unbounded border
    pub fn new(id: impl Into<String>, generator: Arc<dyn RegionGenerator>) -> Self {
        let (loaded_tx, loaded_rx) = mpsc::unbounded_channel();
        Self {
            id: id.into(),
            min_y: DEFAULT_MIN_Y,
            max_y: DEFAULT_MAX_Y,
            border_center: IVec2::ZERO,
            border_half_extent: f64::INFINITY,
            regions: HashMap::new(),
            generator,
            loaded_tx,
            loaded_rx,
        }
    }

    pub fn with_vertical_bounds(mut self, min_y: i32, max_y: i32) -> Self {
        self.min_y = min_y;
        self.max_y = max_y.max(min_y + 1);
        self
    }

    /// Square world border of side `2 * half_extent` around `center`
    pub fn with_border(mut self, center: IVec2, half_extent: f64) -> Self {
        self.border_center = center;
        self.border_half_extent = half_extent.max(0.0);
        self
    }

    /// Generate every tile intersecting the inclusive column box, synchronously.
    pub fn preload_area(&mut self, min_x: i32, min_z: i32, max_x: i32, max_z: i32) {
        for coord in RegionCoord::covering(min_x, min_z, max_x, max_z) {
            if !self.regions.contains_key(&coord) {
                let region = self.generator.generate(coord, self.min_y, self.max_y);
                self.regions.insert(coord, region);
            }
        }
    }

    /// Drop a tile from the resident set
    pub fn unload_region(&mut self, coord: RegionCoord) -> Option<Region> {
        self.regions.remove(&coord)
    }

    /// Get the number of resident tiles
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    fn region_at(&self, x: i32, z: i32) -> Option<&Region> {
        self.regions.get(&RegionCoord::from_block(x, z))
    }
}

impl Terrain for VoxelWorld {
    fn world_id(&self) -> &str {
        &self.id
    }

    fn surface_height(&self, x: i32, z: i32) -> i32 {
        self.region_at(x, z)
            .map(|r| r.surface_height(x, z))
            .unwrap_or(self.min_y)
    }

    fn material_at(&self, pos: IVec3) -> Material {
        match self.region_at(pos.x, pos.z) {
            Some(region) => region.get(pos),
            None => Material::VoidAir,
        }
    }

    fn set_material(&mut self, pos: IVec3, material: Material) {
        let coord = RegionCoord::from_block(pos.x, pos.z);
        match self.regions.get_mut(&coord) {
            Some(region) => {
                region.set(pos, material);
            }
            None => log::warn!("Ignoring write to unloaded region {:?} at {}", coord, pos),
        }
    }

    fn biome_at(&self, pos: IVec3) -> Biome {
        self.region_at(pos.x, pos.z)
            .map(|r| r.biome(pos.x, pos.z))
            .unwrap_or(Biome::Ocean)
    }

    fn is_region_loaded(&self, region: RegionCoord) -> bool {
        self.regions.contains_key(&region)
    }

    fn request_region_load(&mut self, region: RegionCoord) -> RegionLoad {
        let generator = Arc::clone(&self.generator);
        let tx = self.loaded_tx.clone();
        let (min_y, max_y) = (self.min_y, self.max_y);
        Box::pin(async move {
            let generated =
                tokio::task::spawn_blocking(move || generator.generate(region, min_y, max_y)).await;
            match generated {
                Ok(data) => {
                    // Receiver lives as long as the world; a closed channel means it is gone
                    let _ = tx.send(data);
                }
                Err(e) => log::error!("Region {:?} generation task failed: {}", region, e),
            }
        })
    }

    fn integrate_loaded_regions(&mut self) {
        while let Ok(region) = self.loaded_rx.try_recv() {
            // Tiles that became resident meanwhile keep their (possibly edited) state
            self.regions.entry(region.coord).or_insert(region);
        }
    }

    fn vertical_bounds(&self) -> (i32, i32) {
        (self.min_y, self.max_y)
    }

    fn boundary_contains(&self, pos: IVec3) -> bool {
        let dx = (pos.x - self.border_center.x) as f64 + 0.5;
        let dz = (pos.z - self.border_center.y) as f64 + 0.5;
        dx.abs() < self.border_half_extent && dz.abs() < self.border_half_extent
    }

    fn reference_center(&self) -> IVec2 {
        self.border_center
    }

    fn boundary_half_extent(&self) -> f64 {
        self.border_half_extent
    }
}
