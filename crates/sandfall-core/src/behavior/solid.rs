//! Granular solids: fall, pile, slide off momentum, stop on friction

use glam::IVec2;
use sandfall_simulation::{Cell, MaterialType, Physics, Support};

use super::{MaterialBehavior, begin_fall, drag_neighbors, is_open_for, update_movable_physics};
use crate::world::{ChunkManager, Effects, WorldRng};

#[derive(Debug, Clone, Copy, Default)]
pub struct SolidBehavior;

impl SolidBehavior {
    /// Landed with residual momentum: keep sliding one cell per tick
    fn slide(&self, grid: &ChunkManager, cell: &mut Cell, origin: IVec2, last_dx: i32) -> IVec2 {
        if cell.physics.momentum_direction == IVec2::ZERO {
            cell.physics.momentum_direction = IVec2::new(last_dx, 0);
        }
        let target = origin + cell.physics.momentum_direction;
        let open = grid
            .get_cell(target)
            .is_some_and(|t| t.is_empty_for(cell) && !t.physics.is_falling());
        if open {
            cell.physics.consume_momentum();
            return target;
        }
        cell.physics.reset_momentum();
        origin
    }
}

impl MaterialBehavior for SolidBehavior {
    fn initialize_physics(&self, cell: &mut Cell) {
        cell.physics = Physics::for_material(MaterialType::Solid);
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
        // 1. Straight down, even when halted
        let below = origin + IVec2::Y;
        if is_open_for(grid, below, cell) {
            begin_fall(cell, below, effects);
            drag_neighbors(grid, origin, rng, effects, |n| n.material.is_movable());
            return below;
        }

        // 2. Sudden stop
        if cell.physics.cancel_horizontal_motion() {
            cell.physics.set_falling(false);
            cell.physics.reset_momentum();
            return origin;
        }
        if cell.physics.halt_threshold > 0.0
            && rng.check_probability(cell.physics.horizontal_stability)
        {
            cell.physics.halt();
            return origin;
        }

        // 3. Diagonals in random order
        let first = if rng.gen_bool() { 1 } else { -1 };
        for dx in [first, -first] {
            let target = origin + IVec2::new(dx, 1);
            if is_open_for(grid, target, cell) {
                begin_fall(cell, target, effects);
                return target;
            }
        }

        // 4. Landed
        cell.physics.set_falling(false);
        if cell.physics.momentum > 0.0 {
            return self.slide(grid, cell, origin, -first);
        }
        origin
    }
}
