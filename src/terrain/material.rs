//! Block material tags and their placement-relevant classes

use serde::{Deserialize, Serialize};

/// Material occupying a single terrain cell
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    #[default]
    Air,
    CaveAir,
    VoidAir,

    Water,
    Lava,

    // Low vegetation and surface cover
    ShortGrass,
    TallGrass,
    Fern,
    LargeFern,
    DeadBush,
    Vine,
    Snow,
    Cactus,
    SugarCane,
    Flower,
    Sapling,

    // Aquatic plants
    Seagrass,
    TallSeagrass,
    Kelp,

    // Trees
    Leaves,
    Log,

    // Solid terrain
    Stone,
    Dirt,
    GrassBlock,
    Sand,
    Gravel,
    Sandstone,
    Ice,

    // Building blocks
    Planks,
    Cobblestone,
}

impl Material {
    /// Any of the air variants
    pub fn is_air(self) -> bool {
        matches!(self, Material::Air | Material::CaveAir | Material::VoidAir)
    }

    /// Water or lava
    pub fn is_liquid(self) -> bool {
        matches!(self, Material::Water | Material::Lava)
    }

    /// Foliage, logs and plants that never count as ground.
    fn is_vegetation(self) -> bool {
        matches!(
            self,
            Material::ShortGrass
                | Material::TallGrass
                | Material::Fern
                | Material::LargeFern
                | Material::DeadBush
                | Material::Vine
                | Material::Snow
                | Material::Cactus
                | Material::SugarCane
                | Material::Flower
                | Material::Sapling
                | Material::Seagrass
                | Material::TallSeagrass
                | Material::Kelp
                | Material::Leaves
                | Material::Log
        )
    }

    /// Skipped when descending from the reported surface to true ground.
    pub fn is_ground_skippable(self) -> bool {
        self.is_air() || self.is_liquid() || self.is_vegetation()
    }

    /// Allowed inside the structure's volume without counting as obstruction.
    ///
    /// Liquids are passable here; liquid sites are rejected earlier.
    pub fn is_passable(self) -> bool {
        self.is_ground_skippable()
    }

    /// Cleared before placement. Logs and leaves are left alone.
    pub fn is_surface_decoration(self) -> bool {
        matches!(
            self,
            Material::ShortGrass
                | Material::TallGrass
                | Material::Fern
                | Material::LargeFern
                | Material::DeadBush
                | Material::Vine
                | Material::Snow
                | Material::Cactus
                | Material::SugarCane
                | Material::Flower
                | Material::Sapling
        )
    }

    /// Full solid block
    pub fn is_solid(self) -> bool {
        matches!(
            self,
            Material::Stone
                | Material::Dirt
                | Material::GrassBlock
                | Material::Sand
                | Material::Gravel
                | Material::Sandstone
                | Material::Ice
                | Material::Planks
                | Material::Cobblestone
                | Material::Cactus
                | Material::Leaves
                | Material::Log
        )
    }
}
