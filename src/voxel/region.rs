//! Region tiles: fixed-size column blocks of terrain that load as a unit

use glam::IVec3;

use crate::terrain::{Biome, Material};

/// Side length of a region tile in cells
pub const REGION_SIZE: i32 = 16;

/// Number of columns in a region tile
const REGION_COLUMNS: usize = (REGION_SIZE * REGION_SIZE) as usize;

/// Integer coordinate identifying a region tile in the world grid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionCoord {
    pub x: i32,
    pub z: i32,
}

impl RegionCoord {
    /// Create a new region coordinate
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Region tile containing the given cell column
    pub fn from_block(x: i32, z: i32) -> Self {
        Self {
            x: x.div_euclid(REGION_SIZE),
            z: z.div_euclid(REGION_SIZE),
        }
    }

    /// Minimum cell column of this tile
    pub fn origin(&self) -> (i32, i32) {
        (self.x * REGION_SIZE, self.z * REGION_SIZE)
    }

    /// All tiles intersecting the inclusive column box `[min, max]`, row-major.
    pub fn covering(min_x: i32, min_z: i32, max_x: i32, max_z: i32) -> Vec<RegionCoord> {
        let lo = Self::from_block(min_x.min(max_x), min_z.min(max_z));
        let hi = Self::from_block(min_x.max(max_x), min_z.max(max_z));
        let mut tiles = Vec::with_capacity(((hi.x - lo.x + 1) * (hi.z - lo.z + 1)) as usize);
        for x in lo.x..=hi.x {
            for z in lo.z..=hi.z {
                tiles.push(RegionCoord::new(x, z));
            }
        }
        tiles
    }
}

/// Resident terrain for one region tile.
///
/// Cells are stored column by column over the world's vertical range, with a
/// per-column biome tag and a cached surface height.
#[derive(Clone, Debug)]
pub struct Region {
    pub coord: RegionCoord,
    min_y: i32,
    height: usize,
    cells: Vec<Material>,
    biomes: Vec<Biome>,
    surface: Vec<i32>,
}

impl Region {
    /// Create an all-air region spanning `[min_y, max_y)`
    pub fn new(coord: RegionCoord, min_y: i32, max_y: i32) -> Self {
        let height = (max_y - min_y).max(0) as usize;
        Self {
            coord,
            min_y,
            height,
            cells: vec![Material::Air; REGION_COLUMNS * height],
            biomes: vec![Biome::Plains; REGION_COLUMNS],
            surface: vec![min_y; REGION_COLUMNS],
        }
    }

    fn column_index(&self, x: i32, z: i32) -> usize {
        let (ox, oz) = self.coord.origin();
        let lx = (x - ox).clamp(0, REGION_SIZE - 1);
        let lz = (z - oz).clamp(0, REGION_SIZE - 1);
        (lz * REGION_SIZE + lx) as usize
    }

    fn cell_index(&self, column: usize, y: i32) -> Option<usize> {
        let dy = y - self.min_y;
        if dy < 0 || dy as usize >= self.height {
            return None;
        }
        Some(column * self.height + dy as usize)
    }

    /// Whether a world column lies in this tile
    pub fn contains_column(&self, x: i32, z: i32) -> bool {
        RegionCoord::from_block(x, z) == self.coord
    }

    /// Material at a world position; air outside the vertical range.
    pub fn get(&self, pos: IVec3) -> Material {
        let column = self.column_index(pos.x, pos.z);
        match self.cell_index(column, pos.y) {
            Some(i) => self.cells[i],
            None if pos.y < self.min_y => Material::VoidAir,
            None => Material::Air,
        }
    }

    /// Set material at a world position. Returns false outside the vertical range.
    pub fn set(&mut self, pos: IVec3, material: Material) -> bool {
        let column = self.column_index(pos.x, pos.z);
        let Some(i) = self.cell_index(column, pos.y) else {
            return false;
        };
        self.cells[i] = material;

        let top = self.surface[column];
        if !material.is_air() && pos.y > top {
            self.surface[column] = pos.y;
        } else if material.is_air() && pos.y == top {
            self.surface[column] = self.scan_surface(column, pos.y);
        }
        true
    }

    fn scan_surface(&self, column: usize, from_y: i32) -> i32 {
        let mut y = from_y;
        while y > self.min_y {
            if let Some(i) = self.cell_index(column, y) {
                if !self.cells[i].is_air() {
                    return y;
                }
            }
            y -= 1;
        }
        self.min_y
    }

    /// Fill the inclusive vertical span `[from_y, to_y]` of one column
    pub fn fill_column(&mut self, x: i32, z: i32, from_y: i32, to_y: i32, material: Material) {
        for y in from_y..=to_y {
            self.set(IVec3::new(x, y, z), material);
        }
    }

    /// Highest non-air cell in a column
    pub fn surface_height(&self, x: i32, z: i32) -> i32 {
        self.surface[self.column_index(x, z)]
    }

    pub fn biome(&self, x: i32, z: i32) -> Biome {
        self.biomes[self.column_index(x, z)]
    }

    pub fn set_biome(&mut self, x: i32, z: i32, biome: Biome) {
        let column = self.column_index(x, z);
        self.biomes[column] = biome;
    }
}
