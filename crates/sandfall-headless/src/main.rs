//! Sandfall headless - run a scenario and print ASCII frames

use anyhow::Context;
use clap::Parser;
use sandfall_core::simulation::MaterialType;
use sandfall_core::world::{TickStats, World};
use sandfall_headless::{HeadlessConfig, Scenario, render_ascii};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scenario to run: pile, pour, bridge, mixed
    #[arg(long)]
    scenario: Option<String>,

    /// Maximum number of ticks to simulate
    #[arg(long)]
    ticks: Option<u64>,

    /// World seed
    #[arg(long)]
    seed: Option<u64>,

    /// Print a frame every N ticks (0 = final frame only)
    #[arg(long)]
    frame_interval: Option<u64>,

    /// Keep running after the world goes idle
    #[arg(long)]
    no_idle_stop: bool,

    /// Compute proposals on a single thread
    #[arg(long)]
    serial: bool,

    /// List available scenarios
    #[arg(long)]
    list_scenarios: bool,

    /// Print the effective configuration as RON and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.list_scenarios {
        for scenario in Scenario::ALL {
            println!("{:<8} {}", scenario.name(), scenario.description());
        }
        return Ok(());
    }

    let mut config = HeadlessConfig::load()?;
    if let Some(scenario) = args.scenario {
        config.run.scenario = scenario;
    }
    if let Some(ticks) = args.ticks {
        config.run.ticks = ticks;
    }
    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }
    if let Some(interval) = args.frame_interval {
        config.run.frame_interval = interval;
    }
    if args.no_idle_stop {
        config.run.stop_when_idle = false;
    }
    if args.serial {
        config.simulation.parallel = false;
    }

    if args.print_config {
        println!("{}", config.to_ron()?);
        return Ok(());
    }

    run(&config)
}

fn run(config: &HeadlessConfig) -> anyhow::Result<()> {
    let scenario: Scenario = config.run.scenario.parse()?;
    let mut world = World::new(config.simulation.clone()).context("Failed to create world")?;

    log::info!(
        "Starting Sandfall headless: scenario '{}', seed {}, {} resolve rounds max",
        scenario,
        world.config().seed,
        world.config().max_resolve_rounds
    );
    scenario.setup(&mut world);

    let mut stats = TickStats::default();
    let mut last_tick = 0;
    for tick in 1..=config.run.ticks {
        let feeding = scenario.feed(&mut world, tick);
        let report = world.step_with_stats(&mut stats);
        last_tick = report.tick;

        if config.run.frame_interval > 0 && report.tick % config.run.frame_interval == 0 {
            print_frame(&world, report.tick);
        }

        if config.run.stop_when_idle && !feeding && world.active_chunk_count() == 0 {
            log::info!("World went idle after {} ticks", report.tick);
            break;
        }
    }

    print_frame(&world, last_tick);
    println!(
        "ticks: {}  proposals: {}  commits: {}  conflicts: {}  forced: {}",
        last_tick, stats.proposals, stats.commits, stats.conflicts, stats.forced_commits
    );
    for material in MaterialType::ALL {
        if material != MaterialType::Empty {
            println!("{:<12} {}", material.name(), world.count_material(material));
        }
    }
    Ok(())
}

fn print_frame(world: &World, tick: u64) {
    println!("--- tick {} ({} active chunks) ---", tick, world.active_chunk_count());
    print!("{}", render_ascii(world));
}
