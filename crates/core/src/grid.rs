use std::hash::Hasher;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::Xxh3;

use crate::types::Pos;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub blocked: bool,
    pub blocks_sight: bool,
    pub explored: bool,
}

impl Cell {
    pub const FLOOR: Self = Self { blocked: false, blocks_sight: false, explored: false };
    pub const WALL: Self = Self { blocked: true, blocks_sight: true, explored: false };
    /// Impassable but see-through.
    pub const CHASM: Self = Self { blocked: true, blocks_sight: false, explored: false };
    /// Walkable but opaque.
    pub const GLASS: Self = Self { blocked: false, blocks_sight: true, explored: false };
}

/// Read access to the occupancy grid plus the single write the core performs:
/// marking cells explored during a field-of-view cast.
///
/// Every query must be O(1). Out-of-bounds positions read as `None`.
pub trait Grid {
    fn width(&self) -> usize;
    fn height(&self) -> usize;
    fn cell_at(&self, pos: Pos) -> Option<Cell>;
    fn mark_explored(&mut self, pos: Pos);

    fn in_bounds(&self, pos: Pos) -> bool {
        pos.x >= 0
            && pos.y >= 0
            && (pos.x as usize) < self.width()
            && (pos.y as usize) < self.height()
    }

    /// Out-of-bounds counts as blocked.
    fn is_blocked(&self, pos: Pos) -> bool {
        self.cell_at(pos).is_none_or(|cell| cell.blocked)
    }

    /// Out-of-bounds counts as opaque.
    fn blocks_sight(&self, pos: Pos) -> bool {
        self.cell_at(pos).is_none_or(|cell| cell.blocks_sight)
    }
}

/// Dense row-major grid used by the tools, the scenario loader, and the tests.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Map {
    pub internal_width: usize,
    pub internal_height: usize,
    pub cells: Vec<Cell>,
}

impl Map {
    /// An open map: every cell is floor.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            internal_width: width,
            internal_height: height,
            cells: vec![Cell::FLOOR; width * height],
        }
    }

    /// An open map enclosed by a one-cell wall border.
    pub fn walled(width: usize, height: usize) -> Self {
        let mut map = Self::new(width, height);
        for x in 0..width {
            map.cells[x] = Cell::WALL;
            map.cells[(height - 1) * width + x] = Cell::WALL;
        }
        for y in 0..height {
            map.cells[y * width] = Cell::WALL;
            map.cells[y * width + (width - 1)] = Cell::WALL;
        }
        map
    }

    pub fn set_cell(&mut self, pos: Pos, cell: Cell) {
        if !self.in_bounds(pos) {
            return;
        }
        let idx = self.index(pos);
        let explored = self.cells[idx].explored;
        self.cells[idx] = Cell { explored, ..cell };
    }

    pub fn set_wall(&mut self, pos: Pos) {
        self.set_cell(pos, Cell::WALL);
    }

    pub fn is_explored(&self, pos: Pos) -> bool {
        self.cell_at(pos).is_some_and(|cell| cell.explored)
    }

    pub fn explored_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.explored).count()
    }

    pub fn clear_explored(&mut self) {
        for cell in &mut self.cells {
            cell.explored = false;
        }
    }

    /// Stable fingerprint of the layout and explored state, used by determinism checks.
    pub fn digest(&self) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.write_u64(self.internal_width as u64);
        hasher.write_u64(self.internal_height as u64);
        for cell in &self.cells {
            let bits = u8::from(cell.blocked)
                | (u8::from(cell.blocks_sight) << 1)
                | (u8::from(cell.explored) << 2);
            hasher.write_u8(bits);
        }
        hasher.finish()
    }

    fn index(&self, pos: Pos) -> usize {
        (pos.y as usize) * self.internal_width + (pos.x as usize)
    }
}

impl Grid for Map {
    fn width(&self) -> usize {
        self.internal_width
    }

    fn height(&self) -> usize {
        self.internal_height
    }

    fn cell_at(&self, pos: Pos) -> Option<Cell> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some(self.cells[self.index(pos)])
    }

    fn mark_explored(&mut self, pos: Pos) {
        if !self.in_bounds(pos) {
            return;
        }
        let idx = self.index(pos);
        self.cells[idx].explored = true;
    }
}
