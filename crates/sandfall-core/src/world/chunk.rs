//! Chunk - rectangular region of cells and its proposal pass

use glam::IVec2;
use sandfall_simulation::{Cell, MaterialType};

use super::chunk_manager::ChunkManager;
use super::proposal::{Effect, Evaluation, Proposal, cell_seed, evaluate_cell};
use crate::behavior::BehaviorSet;

/// A `width x height` region of the world
#[derive(Clone)]
pub struct Chunk {
    /// Chunk coordinates (in chunk space, not cell space)
    pub x: i32,
    pub y: i32,

    width: usize,
    height: usize,

    /// Cell data, row-major order
    /// Index = y * width + x
    cells: Vec<Cell>,

    /// Whether the chunk is evaluated next tick
    active: bool,
}

/// Everything a chunk's proposal pass produced
#[derive(Debug, Default)]
pub struct ChunkPlan {
    pub chunk: IVec2,
    /// Cells whose own state changed during evaluation, in world coordinates
    pub state_updates: Vec<(IVec2, Cell)>,
    pub proposals: Vec<Proposal>,
    pub effects: Vec<Effect>,
}

impl ChunkPlan {
    /// Nothing moved and nothing changed, so the chunk may go to sleep
    pub fn is_idle(&self) -> bool {
        self.state_updates.is_empty() && self.proposals.is_empty()
    }

    fn absorb(&mut self, evaluation: Evaluation) {
        if let Some(state) = evaluation.state {
            self.state_updates.push((evaluation.origin, state));
        }
        if let Some(proposal) = evaluation.proposal {
            self.proposals.push(proposal);
        }
        self.effects.extend(evaluation.effects);
    }
}

impl Chunk {
    pub fn new(x: i32, y: i32, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            cells: vec![Cell::EMPTY; width * height],
            active: false,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Chunk coordinates as a vector
    pub fn position(&self) -> IVec2 {
        IVec2::new(self.x, self.y)
    }

    /// World position of this chunk's top-left cell
    pub fn origin(&self) -> IVec2 {
        IVec2::new(self.x * self.width as i32, self.y * self.height as i32)
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    /// Get cell at local coordinates
    #[inline]
    pub fn get_cell(&self, x: usize, y: usize) -> &Cell {
        &self.cells[self.index(x, y)]
    }

    #[inline]
    pub fn get_cell_mut(&mut self, x: usize, y: usize) -> &mut Cell {
        let idx = self.index(x, y);
        &mut self.cells[idx]
    }

    /// Set cell at local coordinates, returning the previous occupant
    #[inline]
    pub fn set_cell(&mut self, x: usize, y: usize, cell: Cell) -> Cell {
        let idx = self.index(x, y);
        std::mem::replace(&mut self.cells[idx], cell)
    }

    /// Swap two cells inside this chunk
    #[inline]
    pub fn swap_cells(&mut self, x1: usize, y1: usize, x2: usize, y2: usize) {
        let idx1 = self.index(x1, y1);
        let idx2 = self.index(x2, y2);
        self.cells.swap(idx1, idx2);
    }

    /// Raw cell slice for rendering
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn count_material(&self, material: MaterialType) -> usize {
        self.cells.iter().filter(|c| c.material == material).count()
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Evaluate every cell against the read-only grid
    ///
    /// Each cell works on a copy of itself and draws from its own random
    /// stream derived from `tick_seed` and its position, so the result is the
    /// same whether cells run in parallel or in order.
    pub fn compute_proposals(
        &self,
        grid: &ChunkManager,
        behaviors: &BehaviorSet,
        tick_seed: u64,
        parallel: bool,
    ) -> ChunkPlan {
        let origin = self.origin();
        let width = self.width;
        let evaluate = |idx: usize| -> Option<Evaluation> {
            let cell = &self.cells[idx];
            if cell.material == MaterialType::Empty && cell.physics.cancel_horizontal_motion() {
                return None;
            }
            let pos = origin + IVec2::new((idx % width) as i32, (idx / width) as i32);
            let evaluation = evaluate_cell(grid, behaviors, pos, cell_seed(tick_seed, 0, pos));
            (!evaluation.is_trivial()).then_some(evaluation)
        };

        let mut plan = ChunkPlan {
            chunk: self.position(),
            ..ChunkPlan::default()
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            if parallel {
                use rayon::prelude::*;
                let evaluations: Vec<Evaluation> = (0..self.cells.len())
                    .into_par_iter()
                    .filter_map(evaluate)
                    .collect();
                for evaluation in evaluations {
                    plan.absorb(evaluation);
                }
                return plan;
            }
        }

        #[cfg(target_arch = "wasm32")]
        let _ = parallel;

        for evaluation in (0..self.cells.len()).filter_map(evaluate) {
            plan.absorb(evaluation);
        }
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::SimulationConfig;

    #[test]
    fn test_cell_access() {
        let mut chunk = Chunk::new(0, 0, 8, 4);

        chunk.set_cell(3, 2, Cell::new(MaterialType::Solid));
        assert_eq!(chunk.get_cell(3, 2).material, MaterialType::Solid);

        chunk.set_cell(0, 0, Cell::new(MaterialType::Liquid));
        chunk.set_cell(7, 3, Cell::new(MaterialType::Scaffolding));
        assert_eq!(chunk.get_cell(0, 0).material, MaterialType::Liquid);
        assert_eq!(chunk.get_cell(7, 3).material, MaterialType::Scaffolding);
        assert_eq!(chunk.count_material(MaterialType::Empty), 29);
    }

    #[test]
    fn test_swap_cells_exchanges_full_state() {
        let mut chunk = Chunk::new(0, 0, 4, 4);
        let mut sand = Cell::new(MaterialType::Solid);
        sand.physics.momentum = 1.5;
        chunk.set_cell(1, 1, sand);

        chunk.swap_cells(1, 1, 1, 2);

        assert!(chunk.get_cell(1, 1).is_empty());
        assert_eq!(chunk.get_cell(1, 2).physics.momentum, 1.5);
    }

    #[test]
    fn test_origin_uses_chunk_dimensions() {
        let chunk = Chunk::new(2, 3, 32, 18);
        assert_eq!(chunk.origin(), IVec2::new(64, 54));
    }

    #[test]
    fn test_empty_chunk_is_idle() {
        let grid = ChunkManager::new(1, 1, 6, 6);
        let behaviors = BehaviorSet::new(&SimulationConfig::default().scaffolding);
        let chunk = grid.chunk(IVec2::ZERO).expect("chunk exists");

        let plan = chunk.compute_proposals(&grid, &behaviors, 1, false);
        assert!(plan.is_idle());
        assert!(plan.effects.is_empty());
    }

    #[test]
    fn test_parallel_and_serial_plans_match() {
        let mut grid = ChunkManager::new(1, 1, 12, 12);
        for x in 0..12 {
            grid.set_cell(IVec2::new(x, x % 5), Cell::new(MaterialType::Solid));
            grid.set_cell(IVec2::new(x, 6 + x % 3), Cell::new(MaterialType::Liquid));
        }
        let behaviors = BehaviorSet::new(&SimulationConfig::default().scaffolding);
        let chunk = grid.chunk(IVec2::ZERO).expect("chunk exists");

        let serial = chunk.compute_proposals(&grid, &behaviors, 77, false);
        let parallel = chunk.compute_proposals(&grid, &behaviors, 77, true);

        assert!(!serial.proposals.is_empty());
        assert_eq!(serial.proposals, parallel.proposals);
        assert_eq!(serial.state_updates, parallel.state_updates);
    }

    #[test]
    fn test_proposal_pass_does_not_mutate_grid() {
        let mut grid = ChunkManager::new(1, 1, 5, 5);
        grid.set_cell(IVec2::new(2, 0), Cell::new(MaterialType::Solid));
        let before: Vec<Cell> = grid.chunk(IVec2::ZERO).expect("chunk").cells().to_vec();
        let behaviors = BehaviorSet::new(&SimulationConfig::default().scaffolding);

        let plan = grid
            .chunk(IVec2::ZERO)
            .expect("chunk")
            .compute_proposals(&grid, &behaviors, 3, false);

        assert_eq!(plan.proposals.len(), 1);
        assert_eq!(grid.chunk(IVec2::ZERO).expect("chunk").cells(), &before[..]);
    }
}
