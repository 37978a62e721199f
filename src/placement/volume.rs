//! Obstruction of the structure's 3D bounding box

use glam::IVec3;

use crate::terrain::Terrain;

/// Fraction of cells in `[origin, origin + size)` holding non-passable material.
///
/// Catches sites where a flat-looking surface hides a hillside that would
/// bury the structure.
pub fn obstruction_ratio<W: Terrain + ?Sized>(world: &W, origin: IVec3, size: IVec3) -> f64 {
    let total = size.x.max(0) as u64 * size.y.max(0) as u64 * size.z.max(0) as u64;
    if total == 0 {
        return 0.0;
    }

    let mut occupied = 0u64;
    for dx in 0..size.x {
        for dz in 0..size.z {
            for dy in 0..size.y {
                let m = world.material_at(origin + IVec3::new(dx, dy, dz));
                if !m.is_passable() {
                    occupied += 1;
                }
            }
        }
    }
    occupied as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::terrain::{FlatGenerator, Material};
    use crate::voxel::VoxelWorld;

    fn flat_world() -> VoxelWorld {
        let mut world = VoxelWorld::new("world", Arc::new(FlatGenerator::new(64)))
            .with_vertical_bounds(0, 128);
        world.preload_area(0, 0, 31, 31);
        world
    }

    #[test]
    fn test_clear_above_ground() {
        let world = flat_world();
        let ratio = obstruction_ratio(&world, IVec3::new(0, 65, 0), IVec3::new(4, 4, 4));
        assert_eq!(ratio, 0.0);
    }

    #[test]
    fn test_buried_box() {
        let world = flat_world();
        // Bottom layer sits in the ground: 1 of 4 layers obstructed
        let ratio = obstruction_ratio(&world, IVec3::new(0, 64, 0), IVec3::new(4, 4, 4));
        assert!((ratio - 0.25).abs() < 1e-9);

        let ratio = obstruction_ratio(&world, IVec3::new(0, 10, 0), IVec3::new(4, 4, 4));
        assert_eq!(ratio, 1.0);
    }

    #[test]
    fn test_vegetation_and_trees_pass() {
        let mut world = flat_world();
        world.set_material(IVec3::new(1, 65, 1), Material::TallGrass);
        world.set_material(IVec3::new(2, 65, 2), Material::Log);
        world.set_material(IVec3::new(2, 66, 2), Material::Leaves);
        world.set_material(IVec3::new(3, 65, 3), Material::Cobblestone);

        let ratio = obstruction_ratio(&world, IVec3::new(0, 65, 0), IVec3::new(4, 2, 4));
        assert!((ratio - 1.0 / 32.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_box() {
        let world = flat_world();
        assert_eq!(obstruction_ratio(&world, IVec3::ZERO, IVec3::new(0, 3, 3)), 0.0);
    }
}
