//! Structure placement demo: picks a site in a generated world and places the landmark.
//!
//! Usage: cargo run --release --bin place_structure -- [OPTIONS]
//!
//! Options:
//!   --config <PATH>     Placement config JSON (default: built-in defaults)
//!   --record <PATH>     Placement record file (default: "landmark.json")
//!   --templates <DIR>   Template directory with <id>.json files (default: "templates")
//!   --seed <SEED>       Terrain seed (default: 12345)
//!   --border <HALF>     Half side of the square world border (default: 6000)
//!   --reset             Clear the placement record before triggering

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use glam::{IVec2, IVec3};
use tokio::task::LocalSet;

use landmark::core::{Result, logging};
use landmark::placement::{
    BlockTemplate, JsonRecordStore, PlacementConfig, PlacementEngine, SearchOutcome, TemplateLibrary, TemplateSource,
    Trigger,
};
use landmark::terrain::{Material, TerrainGenerator, TerrainParams};
use landmark::voxel::VoxelWorld;

fn main() {
    logging::init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let record_path = parse_str_arg(&args, "--record").unwrap_or_else(|| "landmark.json".to_string());
    let template_dir = parse_str_arg(&args, "--templates").unwrap_or_else(|| "templates".to_string());
    let seed = parse_u32_arg(&args, "--seed").unwrap_or(12345);
    let border = parse_f64_arg(&args, "--border").unwrap_or(6000.0);
    let reset = args.iter().any(|a| a == "--reset");

    let config = match parse_str_arg(&args, "--config") {
        Some(path) => PlacementConfig::load(&PathBuf::from(path))?,
        None => PlacementConfig::default(),
    };

    println!("=== Landmark Placement ===");
    println!("World:     {} (seed {}, border {})", config.world, seed, border);
    println!("Template:  {}", config.template);
    println!("Ring:      {}..{}", config.min_distance, config.max_distance);
    println!("Record:    {}", record_path);
    println!();

    let mut templates = TemplateLibrary::new(&template_dir);
    if templates.find(&config.template).is_err() {
        log::info!(
            "No template {} in {}; using the built-in hut",
            config.template,
            template_dir
        );
        templates.register(config.template.clone(), builtin_hut()?);
    }

    let generator = TerrainGenerator::new(TerrainParams {
        seed,
        ..Default::default()
    });
    let world = VoxelWorld::new(config.world.clone(), Arc::new(generator)).with_border(IVec2::ZERO, border);
    let world = Rc::new(RefCell::new(world));

    let store = Arc::new(JsonRecordStore::new(&record_path));
    let templates: Arc<dyn TemplateSource<VoxelWorld>> = Arc::new(templates);
    let engine = PlacementEngine::new(store, templates);

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let local = LocalSet::new();
    local.block_on(&runtime, async {
        if reset {
            engine.force_reset()?;
        }

        match engine.ensure_structure_placed(world.clone(), &config)? {
            Trigger::AlreadyPlaced(record) => {
                println!("Already placed in {} at {}", record.world, record.position());
            }
            Trigger::AlreadyRunning => println!("A search is already running"),
            Trigger::Started(handle) => {
                let outcome = handle.await??;
                report(&outcome);
                println!("Resident regions: {}", world.borrow().region_count());
                outcome.into_record()?;
            }
        }
        Ok(())
    })
}

fn report(outcome: &SearchOutcome) {
    match outcome {
        SearchOutcome::Placed { record, round, fallback } => {
            let kind = if *fallback { "best-effort fallback" } else { "accepted" };
            println!(
                "Placed at {} {} {} in {} (round {}, {})",
                record.x, record.y, record.z, record.world, round, kind
            );
        }
        SearchOutcome::AlreadyPlaced(record) => {
            println!("Placed meanwhile at {}", record.position());
        }
        SearchOutcome::GaveUp(report) => {
            println!("Gave up after round {}: {}", report.round, report.stats);
        }
    }
}

/// Small cobblestone hut with a plank floor and a doorway
fn builtin_hut() -> Result<BlockTemplate> {
    let size = IVec3::new(7, 5, 7);
    let mut hut = BlockTemplate::hollow_box(size, Material::Cobblestone, Material::Planks)?;
    hut.set(IVec3::new(3, 1, 0), Some(Material::Air));
    hut.set(IVec3::new(3, 2, 0), Some(Material::Air));
    for x in 0..size.x {
        for z in 0..size.z {
            hut.set(IVec3::new(x, size.y - 1, z), Some(Material::Planks));
        }
    }
    Ok(hut)
}

fn parse_u32_arg(args: &[String], flag: &str) -> Option<u32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_f64_arg(args: &[String], flag: &str) -> Option<f64> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
