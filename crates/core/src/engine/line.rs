//! Straight-line vectors between two cells: rasterization, projectile
//! validation against tiles and entities, and extrapolation past the target.
//! Used by targeting to rank clear shots and by ranged combat to resolve where
//! a missed shot lands.

use super::*;

/// A rasterized line from `start` to `target`.
///
/// `passable[i]` describes `tiles[i]`. Once computed, `tiles` holds both
/// endpoints in start→target order and the two sequences have equal length.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vector {
    pub start: Pos,
    pub target: Pos,
    pub tiles: Vec<Pos>,
    pub passable: Vec<bool>,
}

/// Outcome of [`Vector::validate`]. At most one blocker is recorded: the first
/// one in path order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Validation {
    pub is_clear: bool,
    pub blocking_tile: Option<Pos>,
    pub blocking_entity: Option<EntityId>,
    pub blocking_object: Option<EntityId>,
}

impl Vector {
    pub fn new<G: Grid + ?Sized>(grid: &G, start: Pos, target: Pos) -> Result<Self, SpatialError> {
        for pos in [start, target] {
            if !grid.in_bounds(pos) {
                return Err(SpatialError::OutOfBounds {
                    pos,
                    width: grid.width(),
                    height: grid.height(),
                });
            }
        }
        Ok(Self {
            start,
            target,
            tiles: Vec::new(),
            passable: vec![false; distance(start, target) as usize + 1],
        })
    }

    /// Rasterizes the line and returns its cell count, endpoints included.
    pub fn compute(&mut self) -> usize {
        self.tiles = rasterize(self.start, self.target);
        self.passable = vec![false; self.tiles.len()];
        self.tiles.len()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Whether the last validation reached the final cell.
    pub fn is_clear(&self) -> bool {
        self.passable.last().copied().unwrap_or(false)
    }

    /// Walks the line after the start cell and stops at the first blocked
    /// tile, blocking living creature, or blocking object.
    ///
    /// Cells up to and including a creature or object hit are marked passable;
    /// a blocked tile is not. The start cell is always passable.
    pub fn validate<G: Grid + ?Sized>(&mut self, grid: &G, entities: &Entities) -> Validation {
        if self.tiles.is_empty() {
            self.compute();
        }
        self.passable.iter_mut().for_each(|p| *p = false);
        self.passable[0] = true;

        let mut validation = Validation::default();
        for (i, &tile) in self.tiles.iter().enumerate().skip(1) {
            if grid.is_blocked(tile) {
                validation.blocking_tile = Some(tile);
                break;
            }
            self.passable[i] = true;
            if let Some(id) = entities.blocking_creature_at(tile) {
                validation.blocking_entity = Some(id);
                break;
            }
            if let Some(id) = entities.blocking_object_at(tile) {
                validation.blocking_object = Some(id);
                break;
            }
        }
        validation.is_clear = self.is_clear();
        validation
    }

    /// Per-step unit deltas between consecutive cells.
    pub fn find_direction_pattern(&self) -> (Vec<i32>, Vec<i32>) {
        self.tiles.windows(2).map(|w| (w[1].x - w[0].x, w[1].y - w[0].y)).unzip()
    }

    /// Continues the line past `target` by cycling the direction pattern until
    /// the next cell would leave the grid.
    ///
    /// The returned vector starts at this vector's target, is already laid out,
    /// and can be validated directly.
    pub fn extrapolate<G: Grid + ?Sized>(
        &self,
        grid: &G,
        dx_pattern: &[i32],
        dy_pattern: &[i32],
    ) -> Vector {
        let steps: Vec<(i32, i32)> =
            dx_pattern.iter().copied().zip(dy_pattern.iter().copied()).collect();
        let mut tiles = vec![self.target];
        let mut current = self.target;

        // A pattern whose cycle nets out to zero would never reach the edge.
        let net = steps.iter().fold((0, 0), |(sx, sy), &(dx, dy)| (sx + dx, sy + dy));
        if net != (0, 0) {
            for &(dx, dy) in steps.iter().cycle() {
                let next = current.offset(dx, dy);
                if !grid.in_bounds(next) {
                    break;
                }
                if next != current {
                    tiles.push(next);
                    current = next;
                }
            }
        }

        Vector { start: self.target, target: current, passable: vec![false; tiles.len()], tiles }
    }
}

/// Integer Bresenham line, endpoints inclusive, in `start`→`target` order.
///
/// Lines are always generated from the lower to the higher major-axis
/// coordinate and reversed afterwards, so swapping the endpoints yields the
/// same cells in reverse order.
pub fn rasterize(start: Pos, target: Pos) -> Vec<Pos> {
    let (mut x0, mut y0, mut x1, mut y1) = (start.x, start.y, target.x, target.y);
    let steep = (y1 - y0).abs() > (x1 - x0).abs();
    if steep {
        (x0, y0) = (y0, x0);
        (x1, y1) = (y1, x1);
    }
    let reversed = x0 > x1;
    if reversed {
        (x0, x1) = (x1, x0);
        (y0, y1) = (y1, y0);
    }

    let dx = x1 - x0;
    let dy = (y1 - y0).abs();
    let y_step = if y0 < y1 { 1 } else { -1 };
    let mut error = dx / 2;
    let mut y = y0;

    let mut cells = Vec::with_capacity((dx + 1) as usize);
    for x in x0..=x1 {
        cells.push(if steep { Pos { y: x, x: y } } else { Pos { y, x } });
        error -= dy;
        if error < 0 {
            y += y_step;
            error += dx;
        }
    }
    if reversed {
        cells.reverse();
    }
    cells
}
