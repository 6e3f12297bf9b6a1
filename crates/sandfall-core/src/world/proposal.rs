//! Move proposals and the deferred effects a cell evaluation may produce

use glam::IVec2;
use rand::SeedableRng;
use rand_xoshiro::SplitMix64;
use sandfall_simulation::{Cell, MaterialType};
use smallvec::SmallVec;

use super::chunk_manager::ChunkManager;
use crate::behavior::{BehaviorSet, MaterialBehavior};

/// A request to swap the cell at `current` with the cell at `next`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Proposal {
    pub current: IVec2,
    pub next: IVec2,
}

impl Proposal {
    pub fn new(current: IVec2, next: IVec2) -> Self {
        Self { current, next }
    }

    /// A cell that stays put
    pub fn is_trivial(&self) -> bool {
        self.current == self.next
    }
}

/// A mutation of some other cell, recorded during the read-only pass and
/// applied serially before moves are committed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Clear the vertical lock of the cell about to be displaced
    UnlockVertical(IVec2),
    /// Clear both locks of a resting movable cell
    Unlock(IVec2),
    /// Make sure the chunk holding this position is evaluated next tick
    Wake(IVec2),
}

impl Effect {
    pub fn target(&self) -> IVec2 {
        match *self {
            Effect::UnlockVertical(pos) | Effect::Unlock(pos) | Effect::Wake(pos) => pos,
        }
    }

    /// Apply to the grid. Returns the position whose chunk should be activated
    pub fn apply(&self, grid: &mut ChunkManager) -> Option<IVec2> {
        let target = self.target();
        let cell = grid.get_cell_mut(target)?;
        match self {
            Effect::UnlockVertical(_) => {
                if cell.material != MaterialType::Empty {
                    cell.physics.set_cancel_vertical_motion(false);
                }
            }
            Effect::Unlock(_) => {
                if cell.material.is_movable() {
                    cell.physics.unlock();
                }
            }
            Effect::Wake(_) => {}
        }
        Some(target)
    }
}

/// Effects produced by one cell; most cells produce none or one
pub type Effects = SmallVec<[Effect; 4]>;

/// Outcome of evaluating one cell
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub origin: IVec2,
    /// New state for the cell at `origin`, if evaluation changed it
    pub state: Option<Cell>,
    pub proposal: Option<Proposal>,
    pub effects: Effects,
}

impl Evaluation {
    pub fn is_trivial(&self) -> bool {
        self.state.is_none() && self.proposal.is_none() && self.effects.is_empty()
    }
}

/// Seed for one cell's random stream in one resolution round
pub fn cell_seed(tick_seed: u64, round: u32, pos: IVec2) -> u64 {
    let mut z = tick_seed
        ^ (pos.x as u32 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (pos.y as u32 as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F)
        ^ (round as u64).wrapping_mul(0x1656_67B1_9E37_79F9);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Run one cell's behavior against a read-only grid
///
/// Works on a copy of the stored cell: physics update first, then the swap
/// decision. Nothing in `grid` is touched.
pub fn evaluate_cell(
    grid: &ChunkManager,
    behaviors: &BehaviorSet,
    origin: IVec2,
    seed: u64,
) -> Evaluation {
    let mut effects = Effects::new();
    let Some(stored) = grid.get_cell(origin) else {
        return Evaluation {
            origin,
            state: None,
            proposal: None,
            effects,
        };
    };

    let mut cell = *stored;
    let mut rng = SplitMix64::seed_from_u64(seed);
    behaviors.update_physics(&mut cell);
    let next = behaviors.get_swap_position(grid, &mut cell, origin, &mut rng, &mut effects);

    Evaluation {
        origin,
        state: (cell != *stored).then_some(cell),
        proposal: (next != origin).then(|| Proposal::new(origin, next)),
        effects,
    }
}
