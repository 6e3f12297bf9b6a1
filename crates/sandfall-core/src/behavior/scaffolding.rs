//! Scaffolding: rigid structure held up by bounded support chains
//!
//! A scaffold cell is stable when one of these holds, checked in order:
//! - it is an anchor (Solid or the world floor directly below; sticky),
//! - the cell below is a stable scaffold less than `max_vertical_chain` from
//!   its anchor,
//! - within `max_horizontal_chain` cells to either side, through contiguous
//!   scaffolding, there is a stable scaffold that is itself standing on
//!   something (a strut).
//!
//! Anything else falls like a solid until it lands.

use glam::IVec2;
use sandfall_simulation::{Cell, MaterialType, Physics, Support};

use super::{MaterialBehavior, is_open_for};
use crate::world::{ChunkManager, Effect, Effects, ScaffoldingConfig, WorldRng};

#[derive(Debug, Clone, Copy)]
pub struct ScaffoldingBehavior {
    max_vertical_chain: u32,
    max_horizontal_chain: u32,
}

impl Default for ScaffoldingBehavior {
    fn default() -> Self {
        Self::new(&ScaffoldingConfig::default())
    }
}

impl ScaffoldingBehavior {
    pub fn new(config: &ScaffoldingConfig) -> Self {
        Self {
            max_vertical_chain: config.max_vertical_chain,
            max_horizontal_chain: config.max_horizontal_chain,
        }
    }

    /// Work out the support record `cell` would have at `origin` given the
    /// current neighbors
    pub fn evaluate_support(&self, grid: &ChunkManager, origin: IVec2, cell: &Cell) -> Support {
        if cell.support.anchored {
            return cell.support;
        }

        match grid.get_cell(origin + IVec2::Y) {
            None => return Support::anchor(),
            Some(below) if below.material == MaterialType::Solid => return Support::anchor(),
            Some(below)
                if below.material == MaterialType::Scaffolding
                    && below.support.vertical_stable
                    && below.support.vertical_chain < self.max_vertical_chain =>
            {
                return Support {
                    anchored: false,
                    vertical_stable: true,
                    horizontal_stable: false,
                    vertical_chain: below.support.vertical_chain + 1,
                    horizontal_chain: 0,
                };
            }
            Some(_) => {}
        }

        // Strut search: nearest supported column on either side
        let mut best: Option<(u32, u32)> = None;
        for dir in [-1, 1] {
            for offset in 1..=self.max_horizontal_chain {
                let pos = origin + IVec2::new(dir * offset as i32, 0);
                let Some(neighbor) = grid.get_cell(pos) else {
                    break;
                };
                if neighbor.material != MaterialType::Scaffolding {
                    break;
                }
                if neighbor.support.vertical_stable && self.is_standing(grid, pos) {
                    if best.is_none_or(|(found, _)| offset < found) {
                        best = Some((offset, neighbor.support.vertical_chain));
                    }
                    break;
                }
            }
        }

        match best {
            Some((offset, chain)) => Support {
                anchored: false,
                vertical_stable: true,
                horizontal_stable: true,
                vertical_chain: chain,
                horizontal_chain: offset,
            },
            None => Support::default(),
        }
    }

    /// Whether the cell at `pos` rests on ground, the floor or stable scaffold
    fn is_standing(&self, grid: &ChunkManager, pos: IVec2) -> bool {
        match grid.get_cell(pos + IVec2::Y) {
            None => true,
            Some(below) => {
                below.material == MaterialType::Solid
                    || (below.material == MaterialType::Scaffolding && below.support.vertical_stable)
            }
        }
    }

    /// Store a support record and lock or release the cell accordingly
    pub fn apply_support(cell: &mut Cell, support: Support) {
        cell.support = support;
        if support.vertical_stable {
            cell.physics.set_cancel_vertical_motion(true);
            cell.physics.set_cancel_horizontal_motion(true);
        } else {
            cell.physics.unlock();
        }
    }
}

impl MaterialBehavior for ScaffoldingBehavior {
    fn initialize_physics(&self, cell: &mut Cell) {
        cell.physics = Physics::for_material(MaterialType::Scaffolding);
        cell.support = Support::default();
    }

    fn update_physics(&self, cell: &mut Cell) {
        cell.physics.reset_momentum();
    }

    fn should_fall(&self, cell: &Cell) -> bool {
        !cell.support.vertical_stable
    }

    fn get_swap_position<R: WorldRng>(
        &self,
        grid: &ChunkManager,
        cell: &mut Cell,
        origin: IVec2,
        _rng: &mut R,
        effects: &mut Effects,
    ) -> IVec2 {
        let was_stable = cell.support.vertical_stable;
        let support = self.evaluate_support(grid, origin, cell);
        Self::apply_support(cell, support);

        if !self.should_fall(cell) {
            return origin;
        }

        // Whatever rested on this cell has lost its support too
        if was_stable {
            effects.push(Effect::Wake(origin - IVec2::Y));
        }

        let below = origin + IVec2::Y;
        if is_open_for(grid, below, cell) {
            cell.physics.set_falling(true);
            effects.push(Effect::UnlockVertical(below));
            return below;
        }
        cell.physics.set_falling(false);
        origin
    }
}
