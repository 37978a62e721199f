//! Site selection and at-most-once placement of a single structure
//!
//! The search samples candidate sites on a ring around the world's reference
//! center, analyses their footprint and volume, and relaxes its thresholds
//! round by round. Liquid is never tolerated.

pub mod config;
pub mod thresholds;
pub mod footprint;
pub mod volume;
pub mod candidate;
pub mod template;
pub mod record;
pub mod scheduler;
pub mod executor;
pub mod controller;
pub mod engine;

pub use candidate::{Candidate, Rejection, RejectionStats};
pub use config::{GroundAnchor, PlacementConfig, RelaxationSchedule, ScoreWeights};
pub use controller::{RoundController, RoundReport, SearchOutcome, SearchState};
pub use engine::{PlacementEngine, RunningFlag, RunningGuard, Trigger};
pub use executor::PlacementExecutor;
pub use footprint::{FootprintAnalysis, FootprintAnalyzer, LiquidScan};
pub use record::{JsonRecordStore, MemoryRecordStore, PlacementRecord, RecordStore};
pub use scheduler::{Scheduler, TickScheduler};
pub use template::{BlockTemplate, PlacementError, StructureTemplate, TemplateLibrary, TemplateSource};
pub use thresholds::Thresholds;
