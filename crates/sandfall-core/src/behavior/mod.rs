//! Per-material movement rules
//!
//! Every material implements [`MaterialBehavior`]. The engine never calls the
//! individual behaviors directly; it goes through [`BehaviorSet`], which picks
//! the rule set from the cell's material tag.

mod empty;
mod liquid;
mod scaffolding;
mod solid;

pub use empty::EmptyBehavior;
pub use liquid::LiquidBehavior;
pub use scaffolding::ScaffoldingBehavior;
pub use solid::SolidBehavior;

use glam::IVec2;
use sandfall_simulation::{Cell, MaterialType};

use crate::world::{ChunkManager, Effect, Effects, NeighborQueries, ScaffoldingConfig, WorldRng};

/// The four operations every material implements
pub trait MaterialBehavior {
    /// Reset the cell's parameters to the material defaults
    fn initialize_physics(&self, cell: &mut Cell);

    /// Continuous effects that do not depend on moving (gravity, momentum)
    fn update_physics(&self, cell: &mut Cell);

    fn should_fall(&self, cell: &Cell) -> bool;

    /// Decide where the cell at `origin` wants to go this tick
    ///
    /// Returns `origin` when the cell stays. Only `cell` (a copy of the stored
    /// cell) may be mutated; changes to other cells go into `effects`.
    fn get_swap_position<R: WorldRng>(
        &self,
        grid: &ChunkManager,
        cell: &mut Cell,
        origin: IVec2,
        rng: &mut R,
        effects: &mut Effects,
    ) -> IVec2;
}

/// Dispatches to the right behavior by material tag
#[derive(Debug, Clone)]
pub struct BehaviorSet {
    empty: EmptyBehavior,
    solid: SolidBehavior,
    liquid: LiquidBehavior,
    scaffolding: ScaffoldingBehavior,
}

impl BehaviorSet {
    pub fn new(scaffolding: &ScaffoldingConfig) -> Self {
        Self {
            empty: EmptyBehavior,
            solid: SolidBehavior,
            liquid: LiquidBehavior,
            scaffolding: ScaffoldingBehavior::new(scaffolding),
        }
    }

    pub fn scaffolding(&self) -> &ScaffoldingBehavior {
        &self.scaffolding
    }
}

impl MaterialBehavior for BehaviorSet {
    fn initialize_physics(&self, cell: &mut Cell) {
        match cell.material {
            MaterialType::Empty => self.empty.initialize_physics(cell),
            MaterialType::Solid => self.solid.initialize_physics(cell),
            MaterialType::Liquid => self.liquid.initialize_physics(cell),
            MaterialType::Scaffolding => self.scaffolding.initialize_physics(cell),
        }
    }

    fn update_physics(&self, cell: &mut Cell) {
        match cell.material {
            MaterialType::Empty => self.empty.update_physics(cell),
            MaterialType::Solid => self.solid.update_physics(cell),
            MaterialType::Liquid => self.liquid.update_physics(cell),
            MaterialType::Scaffolding => self.scaffolding.update_physics(cell),
        }
    }

    fn should_fall(&self, cell: &Cell) -> bool {
        match cell.material {
            MaterialType::Empty => self.empty.should_fall(cell),
            MaterialType::Solid => self.solid.should_fall(cell),
            MaterialType::Liquid => self.liquid.should_fall(cell),
            MaterialType::Scaffolding => self.scaffolding.should_fall(cell),
        }
    }

    fn get_swap_position<R: WorldRng>(
        &self,
        grid: &ChunkManager,
        cell: &mut Cell,
        origin: IVec2,
        rng: &mut R,
        effects: &mut Effects,
    ) -> IVec2 {
        match cell.material {
            MaterialType::Empty => self
                .empty
                .get_swap_position(grid, cell, origin, rng, effects),
            MaterialType::Solid => self
                .solid
                .get_swap_position(grid, cell, origin, rng, effects),
            MaterialType::Liquid => self
                .liquid
                .get_swap_position(grid, cell, origin, rng, effects),
            MaterialType::Scaffolding => self
                .scaffolding
                .get_swap_position(grid, cell, origin, rng, effects),
        }
    }
}

/// Gravity activation and momentum accrual shared by solids and liquids
fn update_movable_physics<B: MaterialBehavior>(behavior: &B, cell: &mut Cell) {
    let falling = behavior.should_fall(cell);
    cell.physics.set_falling(falling);
    if falling {
        cell.physics.accrue_momentum();
    }
}

/// Whether the cell at `target` can be displaced by `cell`
fn is_open_for(grid: &ChunkManager, target: IVec2, cell: &Cell) -> bool {
    grid.get_cell(target).is_some_and(|t| t.is_empty_for(cell))
}

/// Bookkeeping for any downward move into `target`
fn begin_fall(cell: &mut Cell, target: IVec2, effects: &mut Effects) {
    if !cell.physics.is_falling() {
        cell.physics.accrue_momentum();
    }
    cell.physics.set_falling(true);
    effects.push(Effect::UnlockVertical(target));
}

/// Probabilistically shake loose resting neighbors of a falling cell
///
/// Each locked neighbor accepted by `filter` is unlocked with a chance equal to
/// its own horizontal stability.
fn drag_neighbors<R, F>(
    grid: &ChunkManager,
    origin: IVec2,
    rng: &mut R,
    effects: &mut Effects,
    filter: F,
) where
    R: WorldRng,
    F: Fn(&Cell) -> bool,
{
    NeighborQueries::for_each_neighbor(grid, origin, |pos, neighbor| {
        if filter(neighbor)
            && neighbor.physics.cancel_horizontal_motion()
            && rng.check_probability(neighbor.physics.horizontal_stability)
        {
            effects.push(Effect::Unlock(pos));
        }
    });
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_dispatch_matches_material() {
        let set = BehaviorSet::new(&ScaffoldingConfig::default());
        let grid = grid_with(3, 3, &[]);
        let mut effects = Effects::new();
        let mut rng = TestRng::never_halt(true);

        let mut empty = Cell::new(MaterialType::Empty);
        let next = set.get_swap_position(&grid, &mut empty, IVec2::ZERO, &mut rng, &mut effects);
        assert_eq!(next, IVec2::ZERO);

        let mut sand = Cell::new(MaterialType::Solid);
        set.update_physics(&mut sand);
        let next = set.get_swap_position(&grid, &mut sand, IVec2::ZERO, &mut rng, &mut effects);
        assert_eq!(next, IVec2::new(0, 1));
    }

    #[test]
    fn test_initialize_physics_restores_defaults() {
        let set = BehaviorSet::new(&ScaffoldingConfig::default());
        for material in MaterialType::ALL {
            let mut cell = Cell::new(material);
            cell.physics.mass = 99.0;
            cell.physics.momentum = 2.0;
            set.initialize_physics(&mut cell);
            assert_eq!(cell, Cell::new(material));
        }
    }

    #[test]
    fn test_should_fall_by_material() {
        let set = BehaviorSet::new(&ScaffoldingConfig::default());
        assert!(!set.should_fall(&Cell::new(MaterialType::Empty)));
        assert!(set.should_fall(&Cell::new(MaterialType::Solid)));
        assert!(set.should_fall(&Cell::new(MaterialType::Liquid)));
        assert!(set.should_fall(&Cell::new(MaterialType::Scaffolding)));

        let mut halted = Cell::new(MaterialType::Solid);
        halted.physics.halt();
        assert!(!set.should_fall(&halted));
    }

    #[test]
    fn test_drag_neighbors_only_unlocks_locked_cells() {
        let mut grid = grid_with(3, 3, &[(IVec2::new(0, 1), MaterialType::Solid)]);
        let mut halted = Cell::new(MaterialType::Solid);
        halted.physics.halt();
        grid.set_cell(IVec2::new(2, 1), halted);

        let mut effects = Effects::new();
        let mut rng = TestRng::always_halt();
        drag_neighbors(&grid, IVec2::new(1, 1), &mut rng, &mut effects, |c| {
            c.material.is_movable()
        });

        assert_eq!(effects.as_slice(), &[Effect::Unlock(IVec2::new(2, 1))]);
    }
}
