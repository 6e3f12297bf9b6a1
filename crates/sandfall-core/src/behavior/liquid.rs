//! Liquids: fall, then spread sideways up to their viscosity

use glam::IVec2;
use sandfall_simulation::{Cell, MaterialType, Physics, Support};

use super::{MaterialBehavior, begin_fall, drag_neighbors, is_open_for, update_movable_physics};
use crate::world::{ChunkManager, Effects, WorldRng};

#[derive(Debug, Clone, Copy, Default)]
pub struct LiquidBehavior;

impl LiquidBehavior {
    /// First cell in direction `dir` (within viscosity) this liquid may enter
    ///
    /// The scan looks through other liquid and stops at anything else that
    /// blocks, or at the world edge.
    fn scan_lateral(&self, grid: &ChunkManager, cell: &Cell, origin: IVec2, dir: i32) -> Option<IVec2> {
        for step in 1..=cell.physics.viscosity {
            let target = origin + IVec2::new(dir * step, 0);
            let occupant = grid.get_cell(target)?;
            if occupant.is_empty_for(cell) {
                return Some(target);
            }
            if occupant.material != MaterialType::Liquid {
                return None;
            }
        }
        None
    }
}

impl MaterialBehavior for LiquidBehavior {
    fn initialize_physics(&self, cell: &mut Cell) {
        cell.physics = Physics::for_material(MaterialType::Liquid);
        cell.support = Support::default();
    }

    fn update_physics(&self, cell: &mut Cell) {
        update_movable_physics(self, cell);
    }

    fn should_fall(&self, cell: &Cell) -> bool {
        !cell.physics.cancel_horizontal_motion() && cell.physics.mass > 0.0
    }

    fn get_swap_position<R: WorldRng>(
        &self,
        grid: &ChunkManager,
        cell: &mut Cell,
        origin: IVec2,
        rng: &mut R,
        effects: &mut Effects,
    ) -> IVec2 {
        let below = origin + IVec2::Y;
        if is_open_for(grid, below, cell) {
            begin_fall(cell, below, effects);
            drag_neighbors(grid, origin, rng, effects, |n| {
                n.material == MaterialType::Liquid
            });
            return below;
        }

        cell.physics.set_falling(false);
        if cell.physics.cancel_horizontal_motion() {
            cell.physics.reset_momentum();
            return origin;
        }

        // Liquids settle far less readily than solids
        let halt_chance = cell.physics.horizontal_stability * cell.physics.halt_threshold;
        if cell.physics.halt_threshold > 0.0 && rng.check_probability(halt_chance) {
            cell.physics.halt();
            return origin;
        }

        let first = if rng.gen_bool() { 1 } else { -1 };
        for dir in [first, -first] {
            if let Some(target) = self.scan_lateral(grid, cell, origin, dir) {
                return target;
            }
        }

        // Level with nowhere to go
        cell.physics.halt();
        origin
    }
}
