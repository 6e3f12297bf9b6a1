//! Neighbor cell collection utilities

use glam::IVec2;
use sandfall_simulation::Cell;

use super::chunk_manager::ChunkManager;

/// Offsets of all 8 neighbors (cardinal + diagonal)
///
/// Order: NW, N, NE, W, E, SW, S, SE (y grows downward)
pub const EIGHT_NEIGHBORS: [IVec2; 8] = [
    IVec2::new(-1, -1),
    IVec2::new(0, -1),
    IVec2::new(1, -1),
    IVec2::new(-1, 0),
    IVec2::new(1, 0),
    IVec2::new(-1, 1),
    IVec2::new(0, 1),
    IVec2::new(1, 1),
];

/// Offsets of the 4 orthogonal neighbors
///
/// Order: S, E, N, W
pub const ORTHOGONAL_NEIGHBORS: [IVec2; 4] = [
    IVec2::new(0, 1),
    IVec2::new(1, 0),
    IVec2::new(0, -1),
    IVec2::new(-1, 0),
];

/// Neighbor collection utilities - stateless methods for querying neighboring cells
pub struct NeighborQueries;

impl NeighborQueries {
    /// Call `callback` for each in-bounds neighbor among the 8 surrounding cells
    pub fn for_each_neighbor<F>(chunk_manager: &ChunkManager, center: IVec2, mut callback: F)
    where
        F: FnMut(IVec2, &Cell),
    {
        for offset in EIGHT_NEIGHBORS {
            let pos = center + offset;
            if let Some(cell) = chunk_manager.get_cell(pos) {
                callback(pos, cell);
            }
        }
    }

    /// Positions of the in-bounds orthogonal neighbors
    pub fn orthogonal_positions(chunk_manager: &ChunkManager, center: IVec2) -> Vec<IVec2> {
        ORTHOGONAL_NEIGHBORS
            .iter()
            .map(|offset| center + *offset)
            .filter(|pos| chunk_manager.in_bounds(*pos))
            .collect()
    }
}
