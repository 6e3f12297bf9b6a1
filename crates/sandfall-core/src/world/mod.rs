//! World management - chunks, proposals, conflict resolution, ticks

mod brush;
mod chunk;
mod chunk_manager;
mod conflict_resolver;
mod error;
mod neighbor_queries;
mod proposal;
pub mod rng_trait;
mod sim_config;
pub mod stats;
#[allow(clippy::module_inception)]
mod world;

pub use brush::{BrushShape, MAX_BRUSH_RADIUS};
pub use chunk::{Chunk, ChunkPlan};
pub use chunk_manager::ChunkManager;
pub use conflict_resolver::{ConflictResolver, Resolution, ResolveParams};
pub use error::WorldError;
pub use neighbor_queries::{EIGHT_NEIGHBORS, NeighborQueries, ORTHOGONAL_NEIGHBORS};
pub use proposal::{Effect, Effects, Evaluation, Proposal, cell_seed, evaluate_cell};
pub use rng_trait::WorldRng;
pub use sim_config::{ScaffoldingConfig, SimulationConfig};
pub use stats::{NoopStats, SimStats, TickStats};
pub use world::{DirtyCell, StepReport, World};
