//! The placement transaction: clear, place, commit

use glam::IVec3;

use super::record::{PlacementRecord, RecordStore};
use super::template::StructureTemplate;
use crate::core::{Error, Result};
use crate::terrain::{Material, Terrain};

/// Clears surface decoration, places the template and commits the record.
///
/// Runs once per attempt with no retry. On failure nothing is committed.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlacementExecutor {
    clear_depth: i32,
}

impl PlacementExecutor {
    /// `clear_depth` extra layers below the base are cleared too
    pub fn new(clear_depth: i32) -> Self {
        Self {
            clear_depth: clear_depth.max(0),
        }
    }

    pub fn execute<W: Terrain>(
        &self,
        world: &mut W,
        template: &dyn StructureTemplate<W>,
        origin: IVec3,
        seed: u64,
        store: &dyn RecordStore,
    ) -> Result<PlacementRecord> {
        let size = template.size();
        let cleared = clear_decoration(world, origin - IVec3::Y * self.clear_depth, size + IVec3::Y * self.clear_depth);
        log::debug!("Cleared {} decoration cells at {}", cleared, origin);

        template
            .place_at(world, origin, seed)
            .map_err(|source| Error::Placement {
                x: origin.x,
                y: origin.y,
                z: origin.z,
                source,
            })?;

        let record = PlacementRecord::at(world.world_id(), origin);
        store.write(&record)?;
        Ok(record)
    }
}

/// Replace surface decoration inside `[origin, origin + size)` with air.
///
/// Solid terrain, logs and leaves are left alone. Returns the number of
/// cells cleared.
pub fn clear_decoration<W: Terrain + ?Sized>(world: &mut W, origin: IVec3, size: IVec3) -> usize {
    let (min_y, max_y) = world.vertical_bounds();
    let lo = origin.y.max(min_y);
    let hi = (origin.y + size.y).min(max_y);

    let mut cleared = 0;
    for dx in 0..size.x {
        for dz in 0..size.z {
            for y in lo..hi {
                let pos = IVec3::new(origin.x + dx, y, origin.z + dz);
                if world.material_at(pos).is_surface_decoration() {
                    world.set_material(pos, Material::Air);
                    cleared += 1;
                }
            }
        }
    }
    cleared
}
