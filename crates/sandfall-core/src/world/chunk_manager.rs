//! Fixed chunk grid, coordinate translation and active chunk tracking

use glam::IVec2;
use sandfall_simulation::Cell;

use super::Chunk;

/// Owns every chunk of the world in a fixed `chunks_x x chunks_y` grid
pub struct ChunkManager {
    /// Chunks in row-major chunk order
    chunks: Vec<Chunk>,
    chunks_x: i32,
    chunks_y: i32,
    chunk_width: i32,
    chunk_height: i32,
}

impl ChunkManager {
    /// Create an all-Empty grid. Dimensions must be non-zero
    pub fn new(chunks_x: u32, chunks_y: u32, chunk_width: u32, chunk_height: u32) -> Self {
        debug_assert!(chunks_x > 0 && chunks_y > 0 && chunk_width > 0 && chunk_height > 0);
        let mut chunks = Vec::with_capacity(chunks_x as usize * chunks_y as usize);
        for cy in 0..chunks_y as i32 {
            for cx in 0..chunks_x as i32 {
                chunks.push(Chunk::new(
                    cx,
                    cy,
                    chunk_width as usize,
                    chunk_height as usize,
                ));
            }
        }
        Self {
            chunks,
            chunks_x: chunks_x as i32,
            chunks_y: chunks_y as i32,
            chunk_width: chunk_width as i32,
            chunk_height: chunk_height as i32,
        }
    }

    /// World width in cells
    pub fn width(&self) -> i32 {
        self.chunks_x * self.chunk_width
    }

    /// World height in cells
    pub fn height(&self) -> i32 {
        self.chunks_y * self.chunk_height
    }

    /// Chunk grid size as (columns, rows)
    pub fn chunk_grid_size(&self) -> IVec2 {
        IVec2::new(self.chunks_x, self.chunks_y)
    }

    #[inline]
    pub fn in_bounds(&self, pos: IVec2) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width() && pos.y < self.height()
    }

    #[inline]
    fn chunk_in_bounds(&self, chunk_pos: IVec2) -> bool {
        chunk_pos.x >= 0
            && chunk_pos.y >= 0
            && chunk_pos.x < self.chunks_x
            && chunk_pos.y < self.chunks_y
    }

    #[inline]
    fn chunk_index(&self, chunk_pos: IVec2) -> Option<usize> {
        self.chunk_in_bounds(chunk_pos)
            .then(|| (chunk_pos.y * self.chunks_x + chunk_pos.x) as usize)
    }

    /// Convert world coordinates to chunk coordinates + local offset
    ///
    /// Works for any position; pair with `in_bounds` before indexing.
    pub fn world_to_chunk_coords(&self, pos: IVec2) -> (IVec2, usize, usize) {
        let chunk_x = pos.x.div_euclid(self.chunk_width);
        let chunk_y = pos.y.div_euclid(self.chunk_height);
        let local_x = pos.x.rem_euclid(self.chunk_width) as usize;
        let local_y = pos.y.rem_euclid(self.chunk_height) as usize;
        (IVec2::new(chunk_x, chunk_y), local_x, local_y)
    }

    /// Convert chunk coordinates + local offset back to a world position
    pub fn chunk_to_world(&self, chunk_pos: IVec2, local_x: usize, local_y: usize) -> IVec2 {
        IVec2::new(
            chunk_pos.x * self.chunk_width + local_x as i32,
            chunk_pos.y * self.chunk_height + local_y as i32,
        )
    }

    /// Chunk containing `pos`, if in bounds
    pub fn chunk_of(&self, pos: IVec2) -> Option<IVec2> {
        self.in_bounds(pos)
            .then(|| self.world_to_chunk_coords(pos).0)
    }

    pub fn chunk(&self, chunk_pos: IVec2) -> Option<&Chunk> {
        self.chunk_index(chunk_pos).map(|idx| &self.chunks[idx])
    }

    pub fn chunk_mut(&mut self, chunk_pos: IVec2) -> Option<&mut Chunk> {
        self.chunk_index(chunk_pos).map(|idx| &mut self.chunks[idx])
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter()
    }

    #[inline]
    pub fn get_cell(&self, pos: IVec2) -> Option<&Cell> {
        if !self.in_bounds(pos) {
            return None;
        }
        let (chunk_pos, local_x, local_y) = self.world_to_chunk_coords(pos);
        self.chunk(chunk_pos)
            .map(|chunk| chunk.get_cell(local_x, local_y))
    }

    #[inline]
    pub fn get_cell_mut(&mut self, pos: IVec2) -> Option<&mut Cell> {
        if !self.in_bounds(pos) {
            return None;
        }
        let (chunk_pos, local_x, local_y) = self.world_to_chunk_coords(pos);
        self.chunk_mut(chunk_pos)
            .map(|chunk| chunk.get_cell_mut(local_x, local_y))
    }

    /// Replace the cell at `pos`, returning the previous occupant
    pub fn set_cell(&mut self, pos: IVec2, cell: Cell) -> Option<Cell> {
        if !self.in_bounds(pos) {
            return None;
        }
        let (chunk_pos, local_x, local_y) = self.world_to_chunk_coords(pos);
        self.chunk_mut(chunk_pos)
            .map(|chunk| chunk.set_cell(local_x, local_y, cell))
    }

    /// Exchange the complete contents of two cells, possibly across chunks
    ///
    /// Returns false (and changes nothing) if either position is out of bounds.
    pub fn swap_cells(&mut self, a: IVec2, b: IVec2) -> bool {
        if !self.in_bounds(a) || !self.in_bounds(b) {
            return false;
        }
        let (chunk_a, ax, ay) = self.world_to_chunk_coords(a);
        let (chunk_b, bx, by) = self.world_to_chunk_coords(b);

        if chunk_a == chunk_b {
            if let Some(chunk) = self.chunk_mut(chunk_a) {
                chunk.swap_cells(ax, ay, bx, by);
                return true;
            }
            return false;
        }

        let (Some(&cell_a), Some(&cell_b)) = (self.get_cell(a), self.get_cell(b)) else {
            return false;
        };
        self.set_cell(a, cell_b);
        self.set_cell(b, cell_a);
        true
    }

    /// Positions of all active chunks, in row-major order
    pub fn active_chunk_positions(&self) -> Vec<IVec2> {
        self.chunks
            .iter()
            .filter(|c| c.is_active())
            .map(|c| c.position())
            .collect()
    }

    pub fn active_chunk_count(&self) -> usize {
        self.chunks.iter().filter(|c| c.is_active()).count()
    }

    pub fn is_chunk_active(&self, chunk_pos: IVec2) -> bool {
        self.chunk(chunk_pos).is_some_and(|c| c.is_active())
    }

    /// Activate a chunk; out-of-range chunk coordinates are ignored
    pub fn activate_chunk(&mut self, chunk_pos: IVec2) {
        if let Some(chunk) = self.chunk_mut(chunk_pos) {
            chunk.set_active(true);
        }
    }

    /// Activate a chunk and its 8 neighboring chunks
    pub fn activate_chunk_and_neighbors(&mut self, chunk_pos: IVec2) {
        for dy in -1..=1 {
            for dx in -1..=1 {
                self.activate_chunk(chunk_pos + IVec2::new(dx, dy));
            }
        }
    }

    /// Activate every chunk holding a cell within one cell of `pos`
    pub fn activate_around(&mut self, pos: IVec2) {
        for dy in -1..=1 {
            for dx in -1..=1 {
                if let Some(chunk_pos) = self.chunk_of(pos + IVec2::new(dx, dy)) {
                    self.activate_chunk(chunk_pos);
                }
            }
        }
    }

    /// Replace the active set wholesale
    pub fn set_active_chunks<I>(&mut self, active: I)
    where
        I: IntoIterator<Item = IVec2>,
    {
        for chunk in &mut self.chunks {
            chunk.set_active(false);
        }
        for chunk_pos in active {
            self.activate_chunk(chunk_pos);
        }
    }
}
