//! Distance, rounding, and direction helpers shared by every engine.
//!
//! Range checks across the crate use [`distance`]: the Euclidean distance rounded
//! half-up to the nearest integer (`2.5 -> 3`, `7.07 -> 7`). Raw rasterized cell
//! counts are only used where a call site says so explicitly.

use crate::types::Pos;

/// Rounds half-up: `x.5` always goes to the next integer toward positive infinity.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

pub fn euclidean(a: Pos, b: Pos) -> f64 {
    let dx = f64::from(b.x - a.x);
    let dy = f64::from(b.y - a.y);
    (dx * dx + dy * dy).sqrt()
}

/// Euclidean distance rounded half-up.
pub fn distance(a: Pos, b: Pos) -> u32 {
    u32::try_from(round_half_up(euclidean(a, b))).unwrap_or(u32::MAX)
}

pub fn chebyshev(a: Pos, b: Pos) -> u32 {
    a.x.abs_diff(b.x).max(a.y.abs_diff(b.y))
}

pub fn manhattan(a: Pos, b: Pos) -> u32 {
    a.x.abs_diff(b.x) + a.y.abs_diff(b.y)
}

pub fn sign(value: i32) -> i32 {
    value.signum()
}

/// Unit step `(sign(dx), sign(dy))` from `from` toward `to`.
pub fn step_towards(from: Pos, to: Pos) -> (i32, i32) {
    (sign(to.x - from.x), sign(to.y - from.y))
}

/// The eight neighbours of `p` in row-major order (`dy` outer, `dx` inner).
///
/// This order is the tie-break for every neighbourhood scan in pathfinding.
pub fn neighbors8(p: Pos) -> [Pos; 8] {
    [
        Pos { y: p.y - 1, x: p.x - 1 },
        Pos { y: p.y - 1, x: p.x },
        Pos { y: p.y - 1, x: p.x + 1 },
        Pos { y: p.y, x: p.x - 1 },
        Pos { y: p.y, x: p.x + 1 },
        Pos { y: p.y + 1, x: p.x - 1 },
        Pos { y: p.y + 1, x: p.x },
        Pos { y: p.y + 1, x: p.x + 1 },
    ]
}
