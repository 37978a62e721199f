//! Entry point: at-most-once structure placement

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinHandle;

use super::config::PlacementConfig;
use super::controller::{RoundController, SearchOutcome};
use super::record::{PlacementRecord, RecordStore};
use super::scheduler::{Scheduler, TickScheduler};
use super::template::TemplateSource;
use crate::core::Result;
use crate::streaming::RegionLoader;
use crate::terrain::{SharedWorld, Terrain, WorldRegistry};

/// Single atomic "search in progress" flag. Not a queue.
#[derive(Clone, Debug, Default)]
pub struct RunningFlag {
    running: Arc<AtomicBool>,
}

impl RunningFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag if it is clear; the guard clears it again when dropped.
    pub fn try_acquire(&self) -> Option<RunningGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunningGuard {
                running: Arc::clone(&self.running),
            })
    }

    pub fn is_set(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Holds the running flag until dropped
#[derive(Debug)]
pub struct RunningGuard {
    running: Arc<AtomicBool>,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

/// Result of [`PlacementEngine::ensure_structure_placed`]
#[derive(Debug)]
pub enum Trigger {
    /// The record says the structure exists; nothing was sampled
    AlreadyPlaced(PlacementRecord),
    /// Another search holds the running flag
    AlreadyRunning,
    /// A search was started on the cooperative context
    Started(JoinHandle<Result<SearchOutcome>>),
}

/// Places one structure per record store, at most once.
pub struct PlacementEngine<W, S = TickScheduler> {
    running: RunningFlag,
    store: Arc<dyn RecordStore>,
    templates: Arc<dyn TemplateSource<W>>,
    scheduler: S,
    loader: RegionLoader,
}

impl<W: Terrain + 'static> PlacementEngine<W, TickScheduler> {
    pub fn new(store: Arc<dyn RecordStore>, templates: Arc<dyn TemplateSource<W>>) -> Self {
        Self::with_scheduler(store, templates, TickScheduler::default())
    }
}

impl<W: Terrain + 'static, S: Scheduler + Clone + 'static> PlacementEngine<W, S> {
    pub fn with_scheduler(store: Arc<dyn RecordStore>, templates: Arc<dyn TemplateSource<W>>, scheduler: S) -> Self {
        Self {
            running: RunningFlag::new(),
            store,
            templates,
            scheduler,
            loader: RegionLoader::default(),
        }
    }

    pub fn with_loader(mut self, loader: RegionLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn is_running(&self) -> bool {
        self.running.is_set()
    }

    pub fn record(&self) -> Result<PlacementRecord> {
        self.store.read()
    }

    /// Start a placement search unless the structure exists or a search is running.
    ///
    /// Returns immediately. Configuration errors (bad config, missing or
    /// invalid template) are returned here and release the flag.
    pub fn ensure_structure_placed(&self, world: SharedWorld<W>, config: &PlacementConfig) -> Result<Trigger> {
        let Some(guard) = self.running.try_acquire() else {
            log::debug!("Structure placement already running; ignoring request");
            return Ok(Trigger::AlreadyRunning);
        };

        let record = self.store.read()?;
        if record.placed {
            log::debug!("Structure already placed in {} at {}", record.world, record.position());
            return Ok(Trigger::AlreadyPlaced(record));
        }

        let mut controller = self.prepare(world, config).inspect_err(|e| {
            log::error!("Structure placement not started: {}", e);
        })?;

        log::info!("Starting structure placement for {}", config.template);
        let handle = self.scheduler.run_now(async move {
            let _guard = guard;
            controller.run().await
        });
        Ok(Trigger::Started(handle))
    }

    /// Like [`ensure_structure_placed`](Self::ensure_structure_placed), with
    /// the world looked up by `config.world`.
    pub fn ensure_structure_placed_in<R: WorldRegistry<W> + ?Sized>(
        &self,
        registry: &R,
        config: &PlacementConfig,
    ) -> Result<Trigger> {
        let world = registry.resolve(&config.world).inspect_err(|e| {
            log::error!("Structure placement not started: {}", e);
        })?;
        self.ensure_structure_placed(world, config)
    }

    /// Clear the record so the next trigger searches again.
    ///
    /// Refused (returns `false`) while a search is running.
    pub fn force_reset(&self) -> Result<bool> {
        let Some(_guard) = self.running.try_acquire() else {
            log::warn!("Refusing to reset the placement record while a search is running");
            return Ok(false);
        };
        self.store.write(&PlacementRecord::unplaced())?;
        log::info!("Placement record reset");
        Ok(true)
    }

    fn prepare(&self, world: SharedWorld<W>, config: &PlacementConfig) -> Result<RoundController<W, S>> {
        let config = config.validated()?;
        let template = self.templates.load(&config.template)?;
        Ok(RoundController::new(world, &config, template, Arc::clone(&self.store), self.scheduler.clone())?
            .with_loader(self.loader.clone()))
    }
}
