use glam::IVec2;
use sandfall_simulation::{Cell, Physics, Support};

use super::MaterialBehavior;
use crate::world::{ChunkManager, Effects, WorldRng};

/// Air: never moves, never falls, always locked
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyBehavior;

impl MaterialBehavior for EmptyBehavior {
    fn initialize_physics(&self, cell: &mut Cell) {
        cell.physics = Physics::EMPTY;
        cell.support = Support::default();
    }

    fn update_physics(&self, cell: &mut Cell) {
        cell.physics.lock();
    }

    fn should_fall(&self, _cell: &Cell) -> bool {
        false
    }

    fn get_swap_position<R: WorldRng>(
        &self,
        _grid: &ChunkManager,
        _cell: &mut Cell,
        origin: IVec2,
        _rng: &mut R,
        _effects: &mut Effects,
    ) -> IVec2 {
        origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::test_support::*;
    use sandfall_simulation::MaterialType;

    #[test]
    fn test_update_relocks_and_clears_momentum() {
        let mut cell = Cell::new(MaterialType::Empty);
        cell.physics.unlock();
        cell.physics.momentum = 2.0;
        cell.physics.momentum_direction = IVec2::X;

        EmptyBehavior.update_physics(&mut cell);

        assert_eq!(cell, Cell::new(MaterialType::Empty));
    }

    #[test]
    fn test_never_moves() {
        let grid = grid_with(3, 3, &[]);
        let mut cell = Cell::new(MaterialType::Empty);
        let mut effects = Effects::new();
        let mut rng = TestRng::never_halt(true);

        let next = EmptyBehavior.get_swap_position(
            &grid,
            &mut cell,
            IVec2::new(1, 0),
            &mut rng,
            &mut effects,
        );

        assert_eq!(next, IVec2::new(1, 0));
        assert!(effects.is_empty());
    }
}
