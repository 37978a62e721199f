//! Round-based candidate search with progressive relaxation

use std::sync::Arc;

use glam::{IVec2, IVec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::candidate::{Candidate, Rejection, RejectionStats, first_failure};
use super::config::{GroundAnchor, PlacementConfig};
use super::executor::PlacementExecutor;
use super::footprint::{FootprintAnalysis, FootprintAnalyzer, LiquidScan};
use super::record::{PlacementRecord, RecordStore};
use super::scheduler::Scheduler;
use super::template::StructureTemplate;
use super::thresholds::Thresholds;
use super::volume::obstruction_ratio;
use crate::core::{Error, Result};
use crate::streaming::{FootprintBounds, RegionLoader};
use crate::terrain::{SharedWorld, Terrain, resolve_biomes};

/// Where the search currently is
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    Sampling { round: u32 },
    RoundExhausted { round: u32 },
    Placed,
    GaveUp,
}

/// Summary of one exhausted round
#[derive(Clone, Debug, PartialEq)]
pub struct RoundReport {
    pub round: u32,
    pub attempts: u32,
    pub stats: RejectionStats,
    /// Best candidate scored during this round
    pub best: Option<Candidate>,
    pub region_loading: bool,
}

/// How a search ended
#[derive(Clone, Debug, PartialEq)]
pub enum SearchOutcome {
    /// `fallback` is set when the best-scoring candidate was placed after all
    /// rounds were exhausted
    Placed {
        record: PlacementRecord,
        round: u32,
        fallback: bool,
    },
    /// The record turned placed while the search was running
    AlreadyPlaced(PlacementRecord),
    /// Nothing could be scored; carries the final round's report
    GaveUp(RoundReport),
}

impl SearchOutcome {
    /// The committed record, or [`Error::RoundsExhausted`]
    pub fn into_record(self) -> Result<PlacementRecord> {
        match self {
            SearchOutcome::Placed { record, .. } | SearchOutcome::AlreadyPlaced(record) => Ok(record),
            SearchOutcome::GaveUp(report) => Err(Error::RoundsExhausted {
                rounds: report.round + 1,
            }),
        }
    }
}

enum RoundResult {
    Accepted(Candidate),
    Exhausted(RoundReport),
}

enum Evaluation {
    Accepted(Candidate),
    /// Soft rejections still carry the scored candidate
    Rejected(Rejection, Option<Candidate>),
}

/// Drives the sampling rounds for one placement attempt.
///
/// Terrain is only borrowed between suspension points; the one suspension
/// inside a round is waiting for region loads.
pub struct RoundController<W: Terrain, S: Scheduler> {
    world: SharedWorld<W>,
    config: PlacementConfig,
    template: Box<dyn StructureTemplate<W>>,
    size: IVec3,
    store: Arc<dyn RecordStore>,
    scheduler: S,
    loader: RegionLoader,
    analyzer: FootprintAnalyzer,
    executor: PlacementExecutor,
    rng: ChaCha8Rng,
    state: SearchState,
    best: Option<Candidate>,
    region_loading: bool,
}

impl<W: Terrain, S: Scheduler> RoundController<W, S> {
    /// `config` is validated here and frozen for the attempt.
    pub fn new(
        world: SharedWorld<W>,
        config: &PlacementConfig,
        template: Box<dyn StructureTemplate<W>>,
        store: Arc<dyn RecordStore>,
        scheduler: S,
    ) -> Result<Self> {
        let config = config.validated()?;
        let size = template.size();
        if size.cmple(IVec3::ZERO).any() {
            return Err(Error::InvalidTemplate {
                id: config.template.clone(),
                reason: format!("size {} has an empty dimension", size),
            });
        }

        let liquid_scan = config.avoid_liquids.then_some(LiquidScan {
            radius: config.liquid_radius,
            band: config.liquid_band,
        });
        let analyzer = FootprintAnalyzer::new(resolve_biomes(&config.allowed_biomes), liquid_scan);
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };

        Ok(Self {
            world,
            executor: PlacementExecutor::new(config.clear_depth),
            region_loading: config.region_loading,
            config,
            template,
            size,
            store,
            scheduler,
            loader: RegionLoader::default(),
            analyzer,
            rng,
            state: SearchState::Idle,
            best: None,
        })
    }

    pub fn with_loader(mut self, loader: RegionLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    /// Best candidate scored so far, across all rounds
    pub fn best(&self) -> Option<&Candidate> {
        self.best.as_ref()
    }

    /// Run rounds until a site is accepted or the rounds run out.
    pub async fn run(&mut self) -> Result<SearchOutcome> {
        let max_round = self.config.max_relax_rounds;
        let mut round = 0;
        let mut escalated = false;

        let report = loop {
            let record = self.store.read()?;
            if record.placed {
                log::info!("Structure was placed meanwhile at {}; stopping search", record.position());
                self.state = SearchState::Idle;
                return Ok(SearchOutcome::AlreadyPlaced(record));
            }

            self.state = SearchState::Sampling { round };
            let thresholds = Thresholds::for_round(&self.config.relaxation, self.config.require_flat, round);
            log::info!(
                "Placement round {}/{}: {} attempts (variance <= {}, solid >= {:.2}, obstruction <= {:.2}, biome >= {:.2}, flat: {}, loading: {})",
                round,
                max_round,
                self.config.attempts,
                thresholds.max_height_variance,
                thresholds.min_solid_ratio,
                thresholds.max_obstruction_ratio,
                thresholds.min_terrain_match,
                thresholds.require_flat,
                self.region_loading
            );

            let report = match self.sample_round(&thresholds).await {
                RoundResult::Accepted(candidate) => return self.place(candidate, false).await,
                RoundResult::Exhausted(report) => report,
            };

            self.state = SearchState::RoundExhausted { round };
            log::warn!(
                "Placement round {} exhausted after {} attempts: {}",
                round,
                report.attempts,
                report.stats
            );

            if !self.region_loading && !escalated && report.stats.region_misses_dominate() {
                log::info!("Mostly unloaded regions in round {}; retrying with region loading", round);
                self.region_loading = true;
                escalated = true;
                self.scheduler.delay(self.config.escalation_delay_ticks).await;
                continue;
            }

            if round >= max_round {
                break report;
            }
            round += 1;
            escalated = false;
            self.scheduler.delay(self.config.round_delay_ticks).await;
        };

        match self.best {
            Some(best) => {
                log::warn!(
                    "No site passed after {} rounds; falling back to best candidate {}",
                    max_round + 1,
                    best
                );
                self.place(best, true).await
            }
            None => {
                self.state = SearchState::GaveUp;
                log::error!(
                    "Structure placement gave up after {} rounds: no candidate could be scored ({})",
                    max_round + 1,
                    report.stats
                );
                Ok(SearchOutcome::GaveUp(report))
            }
        }
    }

    async fn sample_round(&mut self, thresholds: &Thresholds) -> RoundResult {
        let (center, (min_dist, max_dist)) = {
            let world = self.world.borrow();
            let footprint = self.size.x.max(self.size.z);
            (
                world.reference_center(),
                self.config.distance_range(world.boundary_half_extent(), footprint),
            )
        };

        let mut stats = RejectionStats::default();
        let mut round_best: Option<Candidate> = None;

        for _ in 0..self.config.attempts {
            let (x, z) = self.sample_origin(center, min_dist, max_dist);
            match self.evaluate(x, z, thresholds).await {
                Evaluation::Accepted(candidate) => {
                    log::debug!("Accepted candidate {}", candidate);
                    return RoundResult::Accepted(candidate);
                }
                Evaluation::Rejected(reason, scored) => {
                    stats.record(reason);
                    if let Some(candidate) = scored {
                        if candidate.improves_on(round_best.as_ref()) {
                            round_best = Some(candidate);
                        }
                        if candidate.improves_on(self.best.as_ref()) {
                            self.best = Some(candidate);
                        }
                    }
                }
            }
        }

        RoundResult::Exhausted(RoundReport {
            round: thresholds.round,
            attempts: self.config.attempts,
            stats,
            best: round_best,
            region_loading: self.region_loading,
        })
    }

    /// Uniform angle and uniform distance around `center`
    fn sample_origin(&mut self, center: IVec2, min_dist: i32, max_dist: i32) -> (i32, i32) {
        let angle = self.rng.random_range(0.0..std::f64::consts::TAU);
        let distance = self.rng.random_range(min_dist..=max_dist) as f64;
        (
            center.x + (angle.cos() * distance).round() as i32,
            center.y + (angle.sin() * distance).round() as i32,
        )
    }

    async fn evaluate(&mut self, x: i32, z: i32, thresholds: &Thresholds) -> Evaluation {
        // Liquid detection reads past the footprint edge, so those tiles must be resident too
        let bounds = FootprintBounds::from_origin(x, z, self.size.x, self.size.z).expanded(self.analyzer.halo());

        if !RegionLoader::all_loaded(&*self.world.borrow(), bounds) {
            if !self.region_loading {
                return Evaluation::Rejected(Rejection::RegionUnloaded, None);
            }
            let result = self.loader.ensure_loaded(&self.world, bounds).await;
            if !RegionLoader::all_loaded(&*self.world.borrow(), bounds) {
                let reason = if result.timed_out() {
                    Rejection::RegionLoadTimeout
                } else {
                    Rejection::RegionUnloaded
                };
                return Evaluation::Rejected(reason, None);
            }
        }

        let world = self.world.borrow();
        let analysis = self.analyzer.analyze(&*world, x, z, self.size.x, self.size.z);
        if self.config.avoid_liquids && analysis.has_liquid {
            return Evaluation::Rejected(Rejection::Liquid, None);
        }

        let Some(y) = self.resolve_y(&analysis, world.vertical_bounds()) else {
            return Evaluation::Rejected(Rejection::Boundary, None);
        };
        if !corners_inside(&*world, x, y, z, self.size) {
            return Evaluation::Rejected(Rejection::Boundary, None);
        }

        let origin = IVec3::new(x, y, z);
        let obstruction = obstruction_ratio(&*world, origin, self.size);
        let candidate = Candidate::new(origin, &analysis, obstruction, &self.config.weights, thresholds.round);

        match first_failure(&candidate, thresholds) {
            Some(reason) => Evaluation::Rejected(reason, Some(candidate)),
            None => Evaluation::Accepted(candidate),
        }
    }

    /// Base height for the structure, or `None` when it cannot fit vertically
    fn resolve_y(&self, analysis: &FootprintAnalysis, (min_y, max_y): (i32, i32)) -> Option<i32> {
        let ground = match self.config.ground_anchor {
            GroundAnchor::Lowest => analysis.min_ground_y,
            GroundAnchor::Highest => analysis.max_ground_y,
        };
        let y = (ground + 1 + self.config.y_offset).min(max_y - self.size.y).max(min_y);
        (y >= min_y && y + self.size.y <= max_y).then_some(y)
    }

    async fn place(&mut self, candidate: Candidate, fallback: bool) -> Result<SearchOutcome> {
        let origin = candidate.position();
        let seed = self.rng.random::<u64>();
        let placed = {
            let mut world = self.world.borrow_mut();
            self.executor
                .execute(&mut *world, self.template.as_ref(), origin, seed, self.store.as_ref())
        };

        match placed {
            Ok(record) => {
                self.state = SearchState::Placed;
                log::info!(
                    "Placed structure {} in {} at {} (round {}{}, score {:.1})",
                    self.config.template,
                    record.world,
                    origin,
                    candidate.round,
                    if fallback { ", fallback" } else { "" },
                    candidate.score
                );
                Ok(SearchOutcome::Placed {
                    record,
                    round: candidate.round,
                    fallback,
                })
            }
            Err(e) => {
                self.state = SearchState::GaveUp;
                log::error!("Structure placement at {} failed: {}", origin, e);
                Err(e)
            }
        }
    }
}

/// All four footprint corners inside the world boundary
fn corners_inside<W: Terrain + ?Sized>(world: &W, x: i32, y: i32, z: i32, size: IVec3) -> bool {
    let (x1, z1) = (x + size.x - 1, z + size.z - 1);
    [(x, z), (x1, z), (x, z1), (x1, z1)]
        .into_iter()
        .all(|(cx, cz)| world.boundary_contains(IVec3::new(cx, y, cz)))
}
