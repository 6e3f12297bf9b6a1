//! Simulation parameters

use serde::{Deserialize, Serialize};

use super::error::WorldError;

/// Everything needed to build a world
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of chunks across
    pub chunks_x: u32,
    /// Number of chunks down
    pub chunks_y: u32,
    /// Cells per chunk row
    pub chunk_width: u32,
    /// Cells per chunk column
    pub chunk_height: u32,
    /// Seed for the world RNG (shuffles, per-cell streams, cell shades)
    pub seed: u64,
    /// Upper bound on conflict resolution rounds per tick
    pub max_resolve_rounds: u32,
    /// Compute proposals on the rayon pool (ignored on wasm)
    pub parallel: bool,
    #[serde(default)]
    pub scaffolding: ScaffoldingConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            chunks_x: 5,
            chunks_y: 5,
            chunk_width: 32,
            chunk_height: 18,
            seed: 0x5A4D_FA11,
            max_resolve_rounds: 64,
            parallel: true,
            scaffolding: ScaffoldingConfig::default(),
        }
    }
}

/// Reach of scaffolding support chains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaffoldingConfig {
    /// Longest column of scaffold a single anchor can hold up
    pub max_vertical_chain: u32,
    /// Furthest a strut can reach sideways from its support
    pub max_horizontal_chain: u32,
}

impl Default for ScaffoldingConfig {
    fn default() -> Self {
        Self {
            max_vertical_chain: 10,
            max_horizontal_chain: 5,
        }
    }
}

impl SimulationConfig {
    /// Config for a single-chunk world of `width x height` cells, handy in tests
    pub fn single_chunk(width: u32, height: u32) -> Self {
        Self {
            chunks_x: 1,
            chunks_y: 1,
            chunk_width: width,
            chunk_height: height,
            ..Self::default()
        }
    }

    /// World width in cells
    pub fn world_width(&self) -> u64 {
        self.chunks_x as u64 * self.chunk_width as u64
    }

    /// World height in cells
    pub fn world_height(&self) -> u64 {
        self.chunks_y as u64 * self.chunk_height as u64
    }

    pub fn validate(&self) -> Result<(), WorldError> {
        if self.chunks_x == 0 || self.chunks_y == 0 {
            return Err(WorldError::EmptyChunkGrid {
                chunks_x: self.chunks_x,
                chunks_y: self.chunks_y,
            });
        }
        if self.chunk_width == 0 || self.chunk_height == 0 {
            return Err(WorldError::EmptyChunk {
                width: self.chunk_width,
                height: self.chunk_height,
            });
        }
        let (width, height) = (self.world_width(), self.world_height());
        if width > i32::MAX as u64 || height > i32::MAX as u64 {
            return Err(WorldError::TooLarge { width, height });
        }
        let count = self.chunks_x as u64 * self.chunks_y as u64;
        if count > i32::MAX as u64 {
            return Err(WorldError::TooManyChunks { count });
        }
        if self.scaffolding.max_vertical_chain == 0 || self.scaffolding.max_horizontal_chain == 0 {
            return Err(WorldError::InvalidChainLimits {
                vertical: self.scaffolding.max_vertical_chain,
                horizontal: self.scaffolding.max_horizontal_chain,
            });
        }
        if self.max_resolve_rounds == 0 {
            return Err(WorldError::NoResolveRounds);
        }
        Ok(())
    }
}
