//! Best-effort async loading of the region tiles under a footprint

use std::time::Duration;

use tokio::task::JoinSet;

use crate::terrain::{RegionLoad, SharedWorld, Terrain};
use crate::voxel::region::RegionCoord;

/// Inclusive horizontal bounding box of a footprint, in cell columns
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FootprintBounds {
    pub min_x: i32,
    pub min_z: i32,
    pub max_x: i32,
    pub max_z: i32,
}

impl FootprintBounds {
    /// Box covering `width` x `depth` columns starting at `(x, z)`
    pub fn from_origin(x: i32, z: i32, width: i32, depth: i32) -> Self {
        Self {
            min_x: x,
            min_z: z,
            max_x: x + width.max(1) - 1,
            max_z: z + depth.max(1) - 1,
        }
    }

    /// The same box grown by `margin` columns on every side
    pub fn expanded(&self, margin: i32) -> Self {
        let margin = margin.max(0);
        Self {
            min_x: self.min_x - margin,
            min_z: self.min_z - margin,
            max_x: self.max_x + margin,
            max_z: self.max_z + margin,
        }
    }

    /// Region tiles covering this box
    pub fn regions(&self) -> Vec<RegionCoord> {
        RegionCoord::covering(self.min_x, self.min_z, self.max_x, self.max_z)
    }
}

/// Outcome of [`RegionLoader::ensure_loaded`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadResult {
    /// Every tile was already resident; nothing was requested
    AlreadyLoaded,
    /// All requested loads finished within the timeout
    Loaded { requested: usize },
    /// The timeout elapsed first; remaining loads were abandoned
    TimedOut { requested: usize, completed: usize },
}

impl LoadResult {
    pub fn timed_out(&self) -> bool {
        matches!(self, LoadResult::TimedOut { .. })
    }
}

/// Requests missing region tiles and waits, bounded, for them to arrive.
#[derive(Clone, Debug)]
pub struct RegionLoader {
    timeout: Duration,
}

impl Default for RegionLoader {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TIMEOUT)
    }
}

impl RegionLoader {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Tiles under the footprint that are not resident yet
    pub fn missing<W: Terrain + ?Sized>(world: &W, bounds: FootprintBounds) -> Vec<RegionCoord> {
        bounds
            .regions()
            .into_iter()
            .filter(|coord| !world.is_region_loaded(*coord))
            .collect()
    }

    /// Whether every tile under the footprint is resident
    pub fn all_loaded<W: Terrain + ?Sized>(world: &W, bounds: FootprintBounds) -> bool {
        bounds
            .regions()
            .into_iter()
            .all(|coord| world.is_region_loaded(coord))
    }

    /// Load every missing tile under `bounds`.
    ///
    /// The world is not borrowed while the loads are in flight. Completion is
    /// rejoined here, on the caller's context, where finished tiles are folded
    /// into the world. A timeout is logged and reported, never raised.
    pub async fn ensure_loaded<W: Terrain>(
        &self,
        world: &SharedWorld<W>,
        bounds: FootprintBounds,
    ) -> LoadResult {
        let loads: Vec<(RegionCoord, RegionLoad)> = {
            let mut terrain = world.borrow_mut();
            let missing = Self::missing(&*terrain, bounds);
            missing
                .into_iter()
                .map(|coord| (coord, terrain.request_region_load(coord)))
                .collect()
        };
        if loads.is_empty() {
            return LoadResult::AlreadyLoaded;
        }

        let requested = loads.len();
        log::debug!("Requesting {} region tiles for {:?}", requested, bounds);

        let mut tasks = JoinSet::new();
        for (_, load) in loads {
            tasks.spawn(load);
        }

        let mut completed = 0usize;
        let finished = tokio::time::timeout(self.timeout, async {
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(()) => completed += 1,
                    Err(e) => log::warn!("Region load task failed: {}", e),
                }
            }
        })
        .await;

        world.borrow_mut().integrate_loaded_regions();

        match finished {
            Ok(()) => LoadResult::Loaded { requested },
            Err(_) => {
                tasks.abort_all();
                log::warn!(
                    "Region load timed out after {:?} ({} of {} tiles completed)",
                    self.timeout,
                    completed,
                    requested
                );
                LoadResult::TimedOut { requested, completed }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;
    use std::sync::{Arc, Mutex};

    use glam::{IVec2, IVec3};

    use crate::terrain::{Biome, Material};

    /// Terrain whose loads either finish at once or never finish
    struct StubTerrain {
        loaded: HashSet<RegionCoord>,
        arrived: Arc<Mutex<Vec<RegionCoord>>>,
        stall: bool,
        requests: usize,
    }

    impl StubTerrain {
        fn new(stall: bool) -> Self {
            Self {
                loaded: HashSet::new(),
                arrived: Arc::new(Mutex::new(Vec::new())),
                stall,
                requests: 0,
            }
        }
    }

    impl Terrain for StubTerrain {
        fn world_id(&self) -> &str {
            "stub"
        }
        fn surface_height(&self, _x: i32, _z: i32) -> i32 {
            0
        }
        fn material_at(&self, _pos: IVec3) -> Material {
            Material::Air
        }
        fn set_material(&mut self, _pos: IVec3, _material: Material) {}
        fn biome_at(&self, _pos: IVec3) -> Biome {
            Biome::Plains
        }
        fn is_region_loaded(&self, region: RegionCoord) -> bool {
            self.loaded.contains(&region)
        }
        fn request_region_load(&mut self, region: RegionCoord) -> RegionLoad {
            self.requests += 1;
            let arrived = Arc::clone(&self.arrived);
            let stall = self.stall;
            Box::pin(async move {
                if stall {
                    std::future::pending::<()>().await;
                }
                arrived.lock().unwrap().push(region);
            })
        }
        fn integrate_loaded_regions(&mut self) {
            let arrived: Vec<_> = self.arrived.lock().unwrap().drain(..).collect();
            self.loaded.extend(arrived);
        }
        fn vertical_bounds(&self) -> (i32, i32) {
            (0, 256)
        }
        fn boundary_contains(&self, _pos: IVec3) -> bool {
            true
        }
        fn reference_center(&self) -> IVec2 {
            IVec2::ZERO
        }
    }

    #[test]
    fn test_bounds_from_origin() {
        let bounds = FootprintBounds::from_origin(10, -5, 16, 19);
        assert_eq!(bounds.max_x, 25);
        assert_eq!(bounds.max_z, 13);
        assert_eq!(bounds.regions().len(), 4);
    }

    #[test]
    fn test_bounds_expanded_reaches_neighbour_tiles() {
        let bounds = FootprintBounds::from_origin(0, 0, 12, 12);
        assert_eq!(bounds.regions(), vec![RegionCoord::new(0, 0)]);

        let halo = bounds.expanded(8);
        assert_eq!((halo.min_x, halo.min_z, halo.max_x, halo.max_z), (-8, -8, 19, 19));
        assert_eq!(halo.regions().len(), 9);
        assert_eq!(bounds.expanded(-3), bounds);
    }

    #[tokio::test]
    async fn test_already_loaded_requests_nothing() {
        let mut terrain = StubTerrain::new(false);
        terrain.loaded.insert(RegionCoord::new(0, 0));
        let world = Rc::new(RefCell::new(terrain));

        let loader = RegionLoader::default();
        let result = loader
            .ensure_loaded(&world, FootprintBounds::from_origin(0, 0, 4, 4))
            .await;
        assert_eq!(result, LoadResult::AlreadyLoaded);
        assert_eq!(world.borrow().requests, 0);
    }

    #[tokio::test]
    async fn test_loads_missing_tiles() {
        let world = Rc::new(RefCell::new(StubTerrain::new(false)));
        let bounds = FootprintBounds::from_origin(8, 8, 16, 16);

        let result = RegionLoader::default().ensure_loaded(&world, bounds).await;
        assert_eq!(result, LoadResult::Loaded { requested: 4 });
        assert!(RegionLoader::all_loaded(&*world.borrow(), bounds));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_resolves_anyway() {
        let world = Rc::new(RefCell::new(StubTerrain::new(true)));
        let bounds = FootprintBounds::from_origin(0, 0, 4, 4);

        let loader = RegionLoader::new(Duration::from_secs(30));
        let started = tokio::time::Instant::now();
        let result = loader.ensure_loaded(&world, bounds).await;

        assert!(result.timed_out());
        assert_eq!(result, LoadResult::TimedOut { requested: 1, completed: 0 });
        assert!(started.elapsed() >= Duration::from_secs(30));
        assert!(!RegionLoader::all_loaded(&*world.borrow(), bounds));
    }
}
