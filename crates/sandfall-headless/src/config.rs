//! Headless run configuration with layered loading
//!
//! Configuration is loaded from multiple sources (lowest to highest priority):
//! 1. Compiled defaults
//! 2. `sandfall.ron` file (if exists)
//! 3. Environment variables prefixed with `SANDFALL_`
//!
//! Example environment variable: `SANDFALL_SIMULATION__SEED=42`

use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use sandfall_core::world::SimulationConfig;
use serde::{Deserialize, Serialize};

/// File looked up in the working directory by [`HeadlessConfig::load`]
pub const CONFIG_FILE: &str = "sandfall.ron";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HeadlessConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,

    #[serde(default)]
    pub run: RunConfig,
}

/// What to run and how to report it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Scenario name (pile, pour, bridge, mixed)
    pub scenario: String,
    /// Maximum ticks to simulate
    pub ticks: u64,
    /// Print an ASCII frame every this many ticks (0 = only the final frame)
    pub frame_interval: u64,
    /// Stop early once every chunk has gone to sleep
    pub stop_when_idle: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            scenario: "pile".to_string(),
            ticks: 300,
            frame_interval: 50,
            stop_when_idle: true,
        }
    }
}

impl HeadlessConfig {
    /// Load configuration with layered priority:
    /// 1. Compiled defaults (lowest priority)
    /// 2. `sandfall.ron` file (if exists)
    /// 3. Environment variables prefixed with `SANDFALL_` (highest priority)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Same layering as [`HeadlessConfig::load`] with an explicit file path
    pub fn load_from(path: &Path) -> Result<Self> {
        let sim = SimulationConfig::default();
        let run = RunConfig::default();

        let builder = Config::builder()
            // Layer 1: Compiled defaults
            .set_default("simulation.chunks_x", sim.chunks_x as i64)?
            .set_default("simulation.chunks_y", sim.chunks_y as i64)?
            .set_default("simulation.chunk_width", sim.chunk_width as i64)?
            .set_default("simulation.chunk_height", sim.chunk_height as i64)?
            .set_default("simulation.seed", sim.seed as i64)?
            .set_default("simulation.max_resolve_rounds", sim.max_resolve_rounds as i64)?
            .set_default("simulation.parallel", sim.parallel)?
            .set_default(
                "simulation.scaffolding.max_vertical_chain",
                sim.scaffolding.max_vertical_chain as i64,
            )?
            .set_default(
                "simulation.scaffolding.max_horizontal_chain",
                sim.scaffolding.max_horizontal_chain as i64,
            )?
            .set_default("run.scenario", run.scenario)?
            .set_default("run.ticks", run.ticks as i64)?
            .set_default("run.frame_interval", run.frame_interval as i64)?
            .set_default("run.stop_when_idle", run.stop_when_idle)?
            // Layer 2: Config file (optional, won't error if missing)
            .add_source(File::from(path).format(FileFormat::Ron).required(false))
            // Layer 3: Environment variables (SANDFALL_RUN__TICKS, etc.)
            .add_source(
                Environment::with_prefix("SANDFALL")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Effective configuration as RON, in the same shape `sandfall.ron` takes
    pub fn to_ron(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .context("Failed to serialize configuration")
    }
}
