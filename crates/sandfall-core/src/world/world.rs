//! World - owns the chunk grid and runs simulation ticks

use ahash::{AHashMap, AHashSet};
use glam::IVec2;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use sandfall_simulation::{Cell, MaterialType};

use super::brush::BrushShape;
use super::chunk::ChunkPlan;
use super::chunk_manager::ChunkManager;
use super::conflict_resolver::{ConflictResolver, ResolveParams};
use super::error::WorldError;
use super::proposal::Proposal;
use super::{NeighborQueries, NoopStats, SimStats, SimulationConfig, WorldRng};
use crate::behavior::{BehaviorSet, MaterialBehavior, ScaffoldingBehavior};

/// A cell whose color changed, addressed the way a chunked renderer wants it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DirtyCell {
    pub chunk: IVec2,
    pub local_x: usize,
    pub local_y: usize,
}

/// Summary of one tick
#[derive(Debug, Clone, Default)]
pub struct StepReport {
    /// Tick number this report belongs to (first tick is 1)
    pub tick: u64,
    /// Chunks evaluated during the tick
    pub active_chunks: usize,
    pub proposals: usize,
    pub commits: usize,
    pub rounds: u32,
    pub forced: usize,
    pub dropped: usize,
    /// Cells whose color changed since the previous report, sorted by chunk then row
    pub dirty: Vec<DirtyCell>,
}

impl StepReport {
    /// Nothing moved or was repainted
    pub fn is_quiet(&self) -> bool {
        self.commits == 0 && self.dirty.is_empty()
    }
}

/// The simulated grid plus everything needed to advance it
pub struct World {
    config: SimulationConfig,
    chunk_manager: ChunkManager,
    behaviors: BehaviorSet,
    rng: Xoshiro256StarStar,
    tick: u64,
    /// Positions repainted since the last step, reported with its dirty set
    pending_dirty: AHashSet<IVec2>,
}

impl World {
    pub fn new(config: SimulationConfig) -> Result<Self, WorldError> {
        config.validate()?;

        let chunk_manager = ChunkManager::new(
            config.chunks_x,
            config.chunks_y,
            config.chunk_width,
            config.chunk_height,
        );
        let behaviors = BehaviorSet::new(&config.scaffolding);
        let rng = Xoshiro256StarStar::seed_from_u64(config.seed);

        log::info!(
            "World created: {}x{} cells in {}x{} chunks of {}x{} (seed {:#x})",
            chunk_manager.width(),
            chunk_manager.height(),
            config.chunks_x,
            config.chunks_y,
            config.chunk_width,
            config.chunk_height,
            config.seed
        );

        Ok(Self {
            config,
            chunk_manager,
            behaviors,
            rng,
            tick: 0,
            pending_dirty: AHashSet::new(),
        })
    }

    /// Fresh cell of `material` with default physics and a random shade
    pub fn create_cell(&mut self, material: MaterialType) -> Cell {
        let shade = [
            self.rng.gen_f32(),
            self.rng.gen_f32(),
            self.rng.gen_f32(),
        ];
        let mut cell = Cell::shaded(material, shade);
        self.behaviors.initialize_physics(&mut cell);
        cell
    }

    /// Place a new cell of `material` at `pos`
    ///
    /// Wakes the surrounding chunks and releases resting neighbors so they can
    /// react. Returns false when `pos` is outside the world.
    pub fn paint_cell(&mut self, pos: IVec2, material: MaterialType) -> bool {
        if !self.chunk_manager.in_bounds(pos) {
            return false;
        }

        let cell = self.create_cell(material);
        let Some(old) = self.chunk_manager.set_cell(pos, cell) else {
            return false;
        };
        if old.color != cell.color {
            self.pending_dirty.insert(pos);
        }

        for neighbor in NeighborQueries::orthogonal_positions(&self.chunk_manager, pos) {
            if let Some(n) = self.chunk_manager.get_cell_mut(neighbor)
                && !n.is_empty()
            {
                n.physics.unlock();
            }
        }

        let (chunk_pos, local_x, local_y) = self.chunk_manager.world_to_chunk_coords(pos);
        self.chunk_manager.activate_chunk_and_neighbors(chunk_pos);

        if old.material != material {
            log::trace!(
                "[PAINT] Chunk ({}, {}) at local ({}, {}) world ({}, {}) set to {} (was {})",
                chunk_pos.x,
                chunk_pos.y,
                local_x,
                local_y,
                pos.x,
                pos.y,
                material.name(),
                old.material.name()
            );
        }
        true
    }

    /// Replace the cell at `pos` with Empty
    pub fn erase_cell(&mut self, pos: IVec2) -> bool {
        self.paint_cell(pos, MaterialType::Empty)
    }

    /// Paint every in-bounds cell of a brush footprint, returning how many were painted
    pub fn paint_area(
        &mut self,
        center: IVec2,
        radius: i32,
        shape: BrushShape,
        material: MaterialType,
    ) -> usize {
        let (chunk_pos, _, _) = self.chunk_manager.world_to_chunk_coords(center);
        log::debug!(
            "[PAINT] {} {} brush r={} at world ({}, {}) in chunk ({}, {})",
            material.name(),
            shape.name(),
            radius,
            center.x,
            center.y,
            chunk_pos.x,
            chunk_pos.y
        );

        let painted = shape
            .footprint(radius)
            .filter(|&offset| self.paint_cell(center + offset, material))
            .count();

        log::debug!("[PAINT] Painted {} cells", painted);
        painted
    }

    /// Advance one tick using the world's own RNG
    pub fn step_simulation(&mut self) -> StepReport {
        self.step_with_stats(&mut NoopStats)
    }

    /// Advance one tick using the world's own RNG, reporting into `stats`
    pub fn step_with_stats(&mut self, stats: &mut dyn SimStats) -> StepReport {
        let mut rng = self.rng.clone();
        let report = self.step_with(&mut rng, stats);
        self.rng = rng;
        report
    }

    /// Advance one tick with a caller-supplied RNG and stats sink
    #[cfg_attr(
        all(feature = "detailed_profiling", not(target_arch = "wasm32")),
        tracing::instrument(skip_all)
    )]
    pub fn step_with<R: WorldRng>(&mut self, rng: &mut R, stats: &mut dyn SimStats) -> StepReport {
        self.tick += 1;
        let active = self.chunk_manager.active_chunk_positions();

        // 1. Settle scaffolding support bottom-up so whole structures resolve in one tick
        let settled = self.settle_scaffolding(&active);

        // 2. Read-only proposal pass over active chunks
        let tick_seed = rng.gen_u64();
        let plans = self.compute_plans(&active, tick_seed);

        // 3. Apply own-state updates, then deferred effects
        let mut next_active: AHashSet<IVec2> = AHashSet::new();
        let mut wake: Vec<IVec2> = settled;
        let mut proposals: Vec<Proposal> = Vec::new();
        for plan in &plans {
            if !plan.is_idle() {
                next_active.insert(plan.chunk);
            }
            for &(pos, state) in &plan.state_updates {
                self.chunk_manager.set_cell(pos, state);
            }
        }
        for plan in plans {
            for effect in &plan.effects {
                if let Some(target) = effect.apply(&mut self.chunk_manager) {
                    wake.push(target);
                }
            }
            for proposal in plan.proposals {
                stats.record_proposal();
                proposals.push(proposal);
            }
        }
        let proposal_count = proposals.len();

        // 4. Serial commit
        let params = ResolveParams {
            tick_seed,
            max_rounds: self.config.max_resolve_rounds,
        };
        let resolution = ConflictResolver::resolve(
            &mut self.chunk_manager,
            &self.behaviors,
            proposals,
            params,
            rng,
            stats,
        );

        // 5. Next tick's active set
        self.chunk_manager.set_active_chunks(next_active);
        for pos in wake.into_iter().chain(resolution.touched.iter().copied()) {
            self.chunk_manager.activate_around(pos);
        }
        for proposal in &resolution.committed {
            self.chunk_manager.activate_around(proposal.current);
            self.chunk_manager.activate_around(proposal.next);
        }

        // 6. Dirty cells for the renderer
        let moved = self.recolored_by(&resolution.committed);
        self.pending_dirty.extend(moved);
        let dirty = self.drain_dirty();

        let report = StepReport {
            tick: self.tick,
            active_chunks: active.len(),
            proposals: proposal_count,
            commits: resolution.committed.len(),
            rounds: resolution.rounds,
            forced: resolution.forced,
            dropped: resolution.dropped,
            dirty,
        };

        log::debug!(
            "[STEP] tick {}: {} active chunks, {} proposals, {} commits in {} rounds ({} forced, {} dropped), {} dirty, {} chunks active next",
            report.tick,
            report.active_chunks,
            report.proposals,
            report.commits,
            report.rounds,
            report.forced,
            report.dropped,
            report.dirty.len(),
            self.chunk_manager.active_chunk_count()
        );

        report
    }

    /// Propagate scaffolding support through the active chunks
    ///
    /// Rows are visited bottom-up so a column settles in one pass. Each row is
    /// swept left-to-right and then right-to-left so struts reach both ways.
    /// Returns the positions whose support changed.
    fn settle_scaffolding(&mut self, active: &[IVec2]) -> Vec<IVec2> {
        let mut rows: AHashMap<i32, Vec<i32>> = AHashMap::new();
        for &chunk_pos in active {
            let Some(chunk) = self.chunk_manager.chunk(chunk_pos) else {
                continue;
            };
            let origin = chunk.origin();
            let width = chunk.width();
            for (idx, cell) in chunk.cells().iter().enumerate() {
                if cell.material == MaterialType::Scaffolding {
                    let pos = origin + IVec2::new((idx % width) as i32, (idx / width) as i32);
                    rows.entry(pos.y).or_default().push(pos.x);
                }
            }
        }
        if rows.is_empty() {
            return Vec::new();
        }

        let mut order: Vec<i32> = rows.keys().copied().collect();
        order.sort_unstable_by(|a, b| b.cmp(a));

        let scaffolding = *self.behaviors.scaffolding();
        let mut changed = Vec::new();
        for y in order {
            let Some(mut xs) = rows.remove(&y) else {
                continue;
            };
            xs.sort_unstable();
            let sweep = xs.iter().chain(xs.iter().rev());
            for &x in sweep {
                let pos = IVec2::new(x, y);
                if self.settle_cell(&scaffolding, pos) {
                    changed.push(pos);
                }
            }
        }
        changed
    }

    fn settle_cell(&mut self, scaffolding: &ScaffoldingBehavior, pos: IVec2) -> bool {
        let Some(&cell) = self.chunk_manager.get_cell(pos) else {
            return false;
        };
        let support = scaffolding.evaluate_support(&self.chunk_manager, pos, &cell);
        let mut settled = cell;
        ScaffoldingBehavior::apply_support(&mut settled, support);
        if settled == cell {
            return false;
        }
        self.chunk_manager.set_cell(pos, settled);
        true
    }

    fn compute_plans(&self, active: &[IVec2], tick_seed: u64) -> Vec<ChunkPlan> {
        let grid = &self.chunk_manager;
        let behaviors = &self.behaviors;
        let parallel = self.config.parallel;
        let plan_for = |chunk_pos: &IVec2| {
            grid.chunk(*chunk_pos)
                .map(|chunk| chunk.compute_proposals(grid, behaviors, tick_seed, parallel))
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            if parallel {
                use rayon::prelude::*;
                return active.par_iter().filter_map(plan_for).collect();
            }
        }

        active.iter().filter_map(plan_for).collect()
    }

    /// Endpoints of this tick's swaps whose color differs from before the tick
    fn recolored_by(&self, committed: &[Proposal]) -> Vec<IVec2> {
        let mut before: AHashMap<IVec2, [u8; 4]> = AHashMap::new();
        for proposal in committed {
            for pos in [proposal.current, proposal.next] {
                if let Some(cell) = self.chunk_manager.get_cell(pos) {
                    before.insert(pos, cell.color);
                }
            }
        }
        // Undo the swaps on the color map to recover the starting colors
        for proposal in committed.iter().rev() {
            let a = before.get(&proposal.current).copied();
            let b = before.get(&proposal.next).copied();
            if let (Some(a), Some(b)) = (a, b) {
                before.insert(proposal.current, b);
                before.insert(proposal.next, a);
            }
        }

        before
            .into_iter()
            .filter(|(pos, color)| {
                self.chunk_manager
                    .get_cell(*pos)
                    .is_some_and(|cell| cell.color != *color)
            })
            .map(|(pos, _)| pos)
            .collect()
    }

    fn drain_dirty(&mut self) -> Vec<DirtyCell> {
        let mut dirty: Vec<DirtyCell> = self
            .pending_dirty
            .drain()
            .map(|pos| {
                let (chunk, local_x, local_y) = self.chunk_manager.world_to_chunk_coords(pos);
                DirtyCell {
                    chunk,
                    local_x,
                    local_y,
                }
            })
            .collect();
        dirty.sort_unstable_by_key(|d| (d.chunk.y, d.chunk.x, d.local_y, d.local_x));
        dirty
    }

    /// Cell at `pos`, or None outside the world
    pub fn get_cell_at(&self, pos: IVec2) -> Option<&Cell> {
        self.chunk_manager.get_cell(pos)
    }

    pub fn width(&self) -> i32 {
        self.chunk_manager.width()
    }

    pub fn height(&self) -> i32 {
        self.chunk_manager.height()
    }

    /// Ticks simulated so far
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn chunk_count(&self) -> usize {
        let size = self.chunk_manager.chunk_grid_size();
        size.x as usize * size.y as usize
    }

    pub fn is_chunk_active(&self, chunk_pos: IVec2) -> bool {
        self.chunk_manager.is_chunk_active(chunk_pos)
    }

    pub fn active_chunk_count(&self) -> usize {
        self.chunk_manager.active_chunk_count()
    }

    /// Number of cells of `material` across the whole world
    pub fn count_material(&self, material: MaterialType) -> usize {
        self.chunk_manager
            .chunks()
            .map(|chunk| chunk.count_material(material))
            .sum()
    }

    pub fn world_to_chunk_coords(&self, pos: IVec2) -> (IVec2, usize, usize) {
        self.chunk_manager.world_to_chunk_coords(pos)
    }

    pub fn chunk_to_world(&self, chunk_pos: IVec2, local_x: usize, local_y: usize) -> IVec2 {
        self.chunk_manager.chunk_to_world(chunk_pos, local_x, local_y)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }
}
