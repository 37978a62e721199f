#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use glam::{IVec2, IVec3};

use landmark::core::Result;
use landmark::placement::{
    BlockTemplate, MemoryRecordStore, PlacementConfig, PlacementEngine, PlacementError, StructureTemplate,
    TemplateLibrary, TemplateSource, TickScheduler,
};
use landmark::terrain::{Biome, Material, RegionLoad, SharedWorld, Terrain};
use landmark::voxel::RegionCoord;

pub const MIN_Y: i32 = -64;
pub const MAX_Y: i32 = 320;

/// Unbounded terrain computed from a formula, with query counting.
///
/// Ground height is `ground_y + (x + z) mod roughness`. Every region is
/// resident unless `loaded` is set.
pub struct AnalyticTerrain {
    pub ground_y: i32,
    pub roughness: i32,
    pub water_level: Option<i32>,
    pub biome: Biome,
    pub center: IVec2,
    pub border_half: f64,
    pub loaded: Option<HashSet<RegionCoord>>,
    pub stall_loads: bool,
    pub edits: HashMap<IVec3, Material>,
    pub queries: Cell<usize>,
    pub load_requests: usize,
    arrived: Arc<Mutex<Vec<RegionCoord>>>,
}

impl AnalyticTerrain {
    pub fn flat(ground_y: i32) -> Self {
        Self {
            ground_y,
            roughness: 1,
            water_level: None,
            biome: Biome::Plains,
            center: IVec2::ZERO,
            border_half: f64::INFINITY,
            loaded: None,
            stall_loads: false,
            edits: HashMap::new(),
            queries: Cell::new(0),
            load_requests: 0,
            arrived: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn flooded(mut self, water_level: i32) -> Self {
        self.water_level = Some(water_level);
        self
    }

    pub fn rough(mut self, roughness: i32) -> Self {
        self.roughness = roughness.max(1);
        self
    }

    pub fn with_border(mut self, center: IVec2, half: f64) -> Self {
        self.center = center;
        self.border_half = half;
        self
    }

    /// Nothing resident; loads never finish
    pub fn unloaded_stalling(mut self) -> Self {
        self.loaded = Some(HashSet::new());
        self.stall_loads = true;
        self
    }

    pub fn shared(self) -> SharedWorld<Self> {
        Rc::new(RefCell::new(self))
    }

    pub fn ground_at(&self, x: i32, z: i32) -> i32 {
        self.ground_y + (x + z).rem_euclid(self.roughness)
    }

    fn count(&self) {
        self.queries.set(self.queries.get() + 1);
    }

    fn resident(&self, x: i32, z: i32) -> bool {
        self.loaded
            .as_ref()
            .is_none_or(|set| set.contains(&RegionCoord::from_block(x, z)))
    }

    fn base_material(&self, pos: IVec3) -> Material {
        let ground = self.ground_at(pos.x, pos.z);
        if pos.y < MIN_Y || pos.y >= MAX_Y {
            Material::VoidAir
        } else if pos.y < ground {
            Material::Stone
        } else if pos.y == ground {
            Material::GrassBlock
        } else if self.water_level.is_some_and(|level| pos.y <= level) {
            Material::Water
        } else {
            Material::Air
        }
    }
}

impl Terrain for AnalyticTerrain {
    fn world_id(&self) -> &str {
        "analytic"
    }

    fn surface_height(&self, x: i32, z: i32) -> i32 {
        self.count();
        let base = self.water_level.unwrap_or(i32::MIN).max(self.ground_at(x, z));
        self.edits
            .iter()
            .filter(|(pos, m)| pos.x == x && pos.z == z && !m.is_air())
            .map(|(pos, _)| pos.y)
            .fold(base, i32::max)
    }

    fn material_at(&self, pos: IVec3) -> Material {
        self.count();
        if !self.resident(pos.x, pos.z) {
            return Material::VoidAir;
        }
        self.edits.get(&pos).copied().unwrap_or_else(|| self.base_material(pos))
    }

    fn set_material(&mut self, pos: IVec3, material: Material) {
        self.edits.insert(pos, material);
    }

    fn biome_at(&self, _pos: IVec3) -> Biome {
        self.count();
        self.biome
    }

    fn is_region_loaded(&self, region: RegionCoord) -> bool {
        self.count();
        self.loaded.as_ref().is_none_or(|set| set.contains(&region))
    }

    fn request_region_load(&mut self, region: RegionCoord) -> RegionLoad {
        self.load_requests += 1;
        let arrived = Arc::clone(&self.arrived);
        let stall = self.stall_loads;
        Box::pin(async move {
            if stall {
                std::future::pending::<()>().await;
            }
            if let Ok(mut arrived) = arrived.lock() {
                arrived.push(region);
            }
        })
    }

    fn integrate_loaded_regions(&mut self) {
        let arrived: Vec<_> = self.arrived.lock().map(|mut a| a.drain(..).collect()).unwrap_or_default();
        if let Some(loaded) = self.loaded.as_mut() {
            loaded.extend(arrived);
        }
    }

    fn vertical_bounds(&self) -> (i32, i32) {
        self.count();
        (MIN_Y, MAX_Y)
    }

    fn boundary_contains(&self, pos: IVec3) -> bool {
        self.count();
        let dx = (pos.x - self.center.x) as f64 + 0.5;
        let dz = (pos.z - self.center.y) as f64 + 0.5;
        dx.abs() < self.border_half && dz.abs() < self.border_half
    }

    fn reference_center(&self) -> IVec2 {
        self.count();
        self.center
    }

    fn boundary_half_extent(&self) -> f64 {
        self.border_half
    }
}

/// Template whose placement primitive always fails
pub struct FailingTemplate;

impl<W: Terrain + ?Sized> StructureTemplate<W> for FailingTemplate {
    fn size(&self) -> IVec3 {
        IVec3::new(4, 4, 4)
    }

    fn place_at(&self, _world: &mut W, _origin: IVec3, _seed: u64) -> std::result::Result<(), PlacementError> {
        Err(PlacementError::Rejected("template palette is incomplete".into()))
    }
}

pub struct FailingTemplates;

impl<W: Terrain + ?Sized> TemplateSource<W> for FailingTemplates {
    fn load(&self, _id: &str) -> Result<Box<dyn StructureTemplate<W>>> {
        Ok(Box::new(FailingTemplate))
    }
}

/// Library holding a `16 x 10 x 19` planks block as "landmark"
pub fn landmark_library() -> TemplateLibrary {
    let mut library = TemplateLibrary::in_memory();
    let template = BlockTemplate::filled(IVec3::new(16, 10, 19), Material::Planks)
        .expect("valid template size");
    library.register("landmark", template);
    library
}

pub fn engine<W: Terrain + 'static>(
    store: Arc<MemoryRecordStore>,
    templates: Arc<dyn TemplateSource<W>>,
) -> PlacementEngine<W, TickScheduler> {
    PlacementEngine::with_scheduler(store, templates, TickScheduler::immediate())
}

/// Default ring, fixed seed
pub fn seeded_config(seed: u64) -> PlacementConfig {
    PlacementConfig {
        seed: Some(seed),
        attempts: 32,
        ..Default::default()
    }
}
