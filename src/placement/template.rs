//! Structure templates and where they come from

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use glam::IVec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{Error, Result};
use crate::streaming::{FootprintBounds, RegionLoader};
use crate::terrain::{Material, Terrain};

/// File extension of templates stored in a [`TemplateLibrary`] directory
pub const TEMPLATE_FILE_EXTENSION: &str = "json";

/// Failure of the template placement primitive
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("structure does not fit inside the world's vertical bounds")]
    OutOfBounds,

    #[error("region tiles under the structure are not loaded")]
    RegionNotLoaded,

    #[error("{0}")]
    Rejected(String),
}

/// A prefabricated structure of fixed size.
pub trait StructureTemplate<W: ?Sized> {
    /// `(width, height, depth)`
    fn size(&self) -> IVec3;

    /// Write the structure with its minimum corner at `origin`.
    fn place_at(&self, world: &mut W, origin: IVec3, seed: u64) -> std::result::Result<(), PlacementError>;
}

/// Loads templates by identifier
pub trait TemplateSource<W: ?Sized> {
    /// Fails with [`Error::TemplateNotFound`] or [`Error::InvalidTemplate`].
    fn load(&self, id: &str) -> Result<Box<dyn StructureTemplate<W>>>;
}

/// Dense block template.
///
/// Cells are stored x-fastest, then z, then y. `None` cells are structure
/// void and leave the terrain untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockTemplate {
    size: [i32; 3],
    cells: Vec<Option<Material>>,
}

impl BlockTemplate {
    /// Template of `size` filled with `material`
    pub fn filled(size: IVec3, material: Material) -> Result<Self> {
        Self::from_cells(size, vec![Some(material); cell_count(size)])
    }

    pub fn from_cells(size: IVec3, cells: Vec<Option<Material>>) -> Result<Self> {
        let template = Self { size: size.to_array(), cells };
        template.validate("<inline>")?;
        Ok(template)
    }

    /// Parse and validate a JSON template
    pub fn from_json_str(id: &str, json: &str) -> Result<Self> {
        let template: Self = serde_json::from_str(json).map_err(|e| Error::InvalidTemplate {
            id: id.to_string(),
            reason: e.to_string(),
        })?;
        template.validate(id)?;
        Ok(template)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Hollow shell of `wall` with a `floor`, interior left as void
    pub fn hollow_box(size: IVec3, wall: Material, floor: Material) -> Result<Self> {
        let mut template = Self::from_cells(size, vec![None; cell_count(size)])?;
        for y in 0..size.y {
            for z in 0..size.z {
                for x in 0..size.x {
                    let edge = x == 0 || z == 0 || x == size.x - 1 || z == size.z - 1;
                    let cell = if y == 0 {
                        Some(floor)
                    } else if edge {
                        Some(wall)
                    } else {
                        Some(Material::Air)
                    };
                    template.set(IVec3::new(x, y, z), cell);
                }
            }
        }
        Ok(template)
    }

    pub fn get(&self, local: IVec3) -> Option<Material> {
        self.index(local).and_then(|i| self.cells[i])
    }

    pub fn set(&mut self, local: IVec3, cell: Option<Material>) {
        if let Some(i) = self.index(local) {
            self.cells[i] = cell;
        }
    }

    fn index(&self, local: IVec3) -> Option<usize> {
        let size = IVec3::from_array(self.size);
        if local.cmplt(IVec3::ZERO).any() || local.cmpge(size).any() {
            return None;
        }
        Some(((local.y * size.z + local.z) * size.x + local.x) as usize)
    }

    fn validate(&self, id: &str) -> Result<()> {
        let size = IVec3::from_array(self.size);
        if size.cmple(IVec3::ZERO).any() {
            return Err(Error::InvalidTemplate {
                id: id.to_string(),
                reason: format!("size {:?} has an empty dimension", self.size),
            });
        }
        if self.cells.len() != cell_count(size) {
            return Err(Error::InvalidTemplate {
                id: id.to_string(),
                reason: format!("expected {} cells, found {}", cell_count(size), self.cells.len()),
            });
        }
        Ok(())
    }
}

fn cell_count(size: IVec3) -> usize {
    size.x.max(0) as usize * size.y.max(0) as usize * size.z.max(0) as usize
}

impl<W: Terrain + ?Sized> StructureTemplate<W> for BlockTemplate {
    fn size(&self) -> IVec3 {
        IVec3::from_array(self.size)
    }

    /// Checks bounds and residency before writing anything, so a failed
    /// placement leaves the terrain as it was.
    fn place_at(&self, world: &mut W, origin: IVec3, _seed: u64) -> std::result::Result<(), PlacementError> {
        let size = IVec3::from_array(self.size);
        let (min_y, max_y) = world.vertical_bounds();
        if origin.y < min_y || origin.y + size.y > max_y {
            return Err(PlacementError::OutOfBounds);
        }
        let bounds = FootprintBounds::from_origin(origin.x, origin.z, size.x, size.z);
        if !RegionLoader::all_loaded(&*world, bounds) {
            return Err(PlacementError::RegionNotLoaded);
        }

        for y in 0..size.y {
            for z in 0..size.z {
                for x in 0..size.x {
                    let local = IVec3::new(x, y, z);
                    if let Some(material) = self.get(local) {
                        world.set_material(origin + local, material);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Template source backed by in-memory registrations and a directory of
/// `<id>.json` files. Registrations win over files.
#[derive(Clone, Debug, Default)]
pub struct TemplateLibrary {
    dir: Option<PathBuf>,
    registered: HashMap<String, BlockTemplate>,
}

impl TemplateLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            registered: HashMap::new(),
        }
    }

    /// Library with no backing directory
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn register(&mut self, id: impl Into<String>, template: BlockTemplate) {
        self.registered.insert(id.into(), template);
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Where the file for `id` would live
    pub fn template_path(&self, id: &str) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.{}", id, TEMPLATE_FILE_EXTENSION)))
    }

    /// Save a template into the backing directory
    pub fn save(&self, id: &str, template: &BlockTemplate) -> Result<PathBuf> {
        check_id(id)?;
        let path = self
            .template_path(id)
            .ok_or_else(|| Error::InvalidConfig("template library has no directory".into()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, template.to_json_string()?)?;
        Ok(path)
    }

    /// Resolve `id` to a concrete template
    pub fn find(&self, id: &str) -> Result<BlockTemplate> {
        check_id(id)?;
        if let Some(template) = self.registered.get(id) {
            return Ok(template.clone());
        }

        let path = self
            .template_path(id)
            .filter(|path| path.is_file())
            .ok_or_else(|| Error::TemplateNotFound(id.to_string()))?;
        log::debug!("Loading structure template {} from {}", id, path.display());
        let json = std::fs::read_to_string(&path)?;
        BlockTemplate::from_json_str(id, &json)
    }
}

fn check_id(id: &str) -> Result<()> {
    if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
        return Err(Error::InvalidTemplate {
            id: id.to_string(),
            reason: "identifier must be a plain name".into(),
        });
    }
    Ok(())
}

impl<W: Terrain + ?Sized> TemplateSource<W> for TemplateLibrary {
    fn load(&self, id: &str) -> Result<Box<dyn StructureTemplate<W>>> {
        Ok(Box::new(self.find(id)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::terrain::FlatGenerator;
    use crate::voxel::VoxelWorld;

    fn world() -> VoxelWorld {
        let mut world = VoxelWorld::new("world", Arc::new(FlatGenerator::new(64)))
            .with_vertical_bounds(0, 128);
        world.preload_area(0, 0, 31, 31);
        world
    }

    #[test]
    fn test_zero_size_rejected() {
        let err = BlockTemplate::filled(IVec3::new(4, 0, 4), Material::Stone).unwrap_err();
        assert!(matches!(err, Error::InvalidTemplate { .. }));
    }

    #[test]
    fn test_cell_count_mismatch_rejected() {
        let json = r#"{ "size": [2, 1, 2], "cells": ["stone", null] }"#;
        let err = BlockTemplate::from_json_str("bad", json).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_json_cells() {
        let json = r#"{ "size": [2, 1, 1], "cells": ["cobblestone", null] }"#;
        let template = BlockTemplate::from_json_str("t", json).unwrap();
        assert_eq!(template.get(IVec3::ZERO), Some(Material::Cobblestone));
        assert_eq!(template.get(IVec3::new(1, 0, 0)), None);
        assert_eq!(template.get(IVec3::new(5, 0, 0)), None);
    }

    #[test]
    fn test_place_writes_cells_and_skips_void() {
        let mut world = world();
        world.set_material(IVec3::new(2, 66, 2), Material::TallGrass);
        world.set_material(IVec3::new(2, 67, 2), Material::Flower);
        let template = BlockTemplate::hollow_box(IVec3::new(5, 3, 5), Material::Cobblestone, Material::Planks).unwrap();
        let mut cells = template.cells.clone();
        // Void in the middle of the top layer
        cells[(2 * 5 + 2) * 5 + 2] = None;
        let template = BlockTemplate::from_cells(IVec3::new(5, 3, 5), cells).unwrap();

        template.place_at(&mut world, IVec3::new(0, 65, 0), 1).unwrap();
        assert_eq!(world.material_at(IVec3::new(0, 65, 0)), Material::Planks);
        assert_eq!(world.material_at(IVec3::new(0, 66, 0)), Material::Cobblestone);
        assert_eq!(world.material_at(IVec3::new(2, 66, 2)), Material::Air);
        assert_eq!(world.material_at(IVec3::new(2, 67, 2)), Material::Flower);
        // Outside the box is untouched
        assert_eq!(world.material_at(IVec3::new(5, 65, 0)), Material::Air);
        assert_eq!(world.material_at(IVec3::new(0, 64, 0)), Material::GrassBlock);
    }

    #[test]
    fn test_place_out_of_bounds_leaves_world() {
        let mut world = world();
        let template = BlockTemplate::filled(IVec3::new(2, 10, 2), Material::Stone).unwrap();
        let err = template.place_at(&mut world, IVec3::new(0, 125, 0), 0).unwrap_err();
        assert!(matches!(err, PlacementError::OutOfBounds));
        assert_eq!(world.material_at(IVec3::new(0, 125, 0)), Material::Air);

        let err = template.place_at(&mut world, IVec3::new(100, 65, 100), 0).unwrap_err();
        assert!(matches!(err, PlacementError::RegionNotLoaded));
    }

    #[test]
    fn test_library_lookup_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut library = TemplateLibrary::new(dir.path());

        let from_file = BlockTemplate::filled(IVec3::new(3, 3, 3), Material::Stone).unwrap();
        library.save("tower", &from_file).unwrap();
        assert_eq!(library.find("tower").unwrap(), from_file);

        let registered = BlockTemplate::filled(IVec3::new(1, 1, 1), Material::Planks).unwrap();
        library.register("tower", registered.clone());
        assert_eq!(library.find("tower").unwrap(), registered);
    }

    #[test]
    fn test_library_missing_and_bad_ids() {
        let dir = tempfile::tempdir().unwrap();
        let library = TemplateLibrary::new(dir.path());
        assert!(matches!(library.find("nope"), Err(Error::TemplateNotFound(_))));
        assert!(matches!(library.find("../etc"), Err(Error::InvalidTemplate { .. })));

        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
        assert!(matches!(library.find("broken"), Err(Error::InvalidTemplate { .. })));

        assert!(matches!(TemplateLibrary::in_memory().find("x"), Err(Error::TemplateNotFound(_))));
    }

    #[test]
    fn test_source_reports_size() {
        let mut library = TemplateLibrary::in_memory();
        library.register("hut", BlockTemplate::filled(IVec3::new(16, 10, 19), Material::Planks).unwrap());
        let template = TemplateSource::<VoxelWorld>::load(&library, "hut").unwrap();
        assert_eq!(template.size(), IVec3::new(16, 10, 19));
    }
}
