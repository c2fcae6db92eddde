//! Ray-cast field of view over a precomputed table of unit directions.
//! Rays step one cell-length at a time from the centre of the source cell, so
//! visibility is angle-sampled rather than cell-exact and may be asymmetric.
//! This module does not decide who is a valid target; see `targeting`.

use std::collections::BTreeSet;
use std::f64::consts::PI;
use std::sync::OnceLock;

use super::*;

pub const STANDARD_RAY_SAMPLES: usize = 360;

/// Unit direction vectors stored as `(sin, cos)` pairs, evenly spaced over 360°.
#[derive(Clone, Debug, PartialEq)]
pub struct RayTable {
    rays: Vec<(f64, f64)>,
}

impl RayTable {
    /// With the standard 360 samples, sample `i` points at `i` degrees.
    pub fn build(sample_count: usize) -> Self {
        let rays = (0..sample_count)
            .map(|i| {
                let degrees = i as f64 * 360.0 / sample_count as f64;
                let angle = degrees * PI / 180.0;
                (angle.sin(), angle.cos())
            })
            .collect();
        Self { rays }
    }

    /// The process-wide 360-sample table, built on first use.
    pub fn standard() -> &'static RayTable {
        static TABLE: OnceLock<RayTable> = OnceLock::new();
        TABLE.get_or_init(|| RayTable::build(STANDARD_RAY_SAMPLES))
    }

    pub fn len(&self) -> usize {
        self.rays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rays.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<(f64, f64)> {
        self.rays.get(index).copied()
    }

    fn stepped(&self, step: usize) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.rays.iter().copied().step_by(step.max(1))
    }
}

/// Walks one ray outward. `visit` sees every in-bounds cell in order and returns
/// `true` to end the whole scan; the walk itself ends after an opaque cell or at
/// the grid edge. Returns whether `visit` ended the scan.
fn walk_ray<G: Grid + ?Sized>(
    grid: &G,
    source: Pos,
    (sin, cos): (f64, f64),
    max_range: u32,
    mut visit: impl FnMut(Pos) -> bool,
) -> bool {
    let mut fx = f64::from(source.x) + 0.5;
    let mut fy = f64::from(source.y) + 0.5;
    for _ in 0..max_range {
        fx += cos;
        fy += sin;
        let p = Pos { y: fy.floor() as i32, x: fx.floor() as i32 };
        if !grid.in_bounds(p) {
            return false;
        }
        if visit(p) {
            return true;
        }
        if grid.blocks_sight(p) {
            return false;
        }
    }
    false
}

/// Casts every `step`-th ray from `source`, marks each touched cell explored,
/// and returns the touched set (the source included).
///
/// Opaque cells are marked and end their ray; cells past them are not.
pub fn cast_rays<G: Grid + ?Sized>(
    grid: &mut G,
    rays: &RayTable,
    source: Pos,
    max_range: u32,
    step: usize,
) -> BTreeSet<Pos> {
    let mut visible = BTreeSet::new();
    if grid.in_bounds(source) {
        visible.insert(source);
    }
    for ray in rays.stepped(step) {
        walk_ray(&*grid, source, ray, max_range, |p| {
            visible.insert(p);
            false
        });
    }
    for &p in &visible {
        grid.mark_explored(p);
    }
    tracing::trace!(%source, max_range, step, cells = visible.len(), "cast rays");
    visible
}

/// Whether any sampled ray from `source` reaches `target` within `max_range`.
///
/// Targets outside the `max_range` box around `source` are rejected before any
/// ray is cast.
pub fn is_in_fov<G: Grid + ?Sized>(
    grid: &G,
    rays: &RayTable,
    source: Pos,
    target: Pos,
    max_range: u32,
    step: usize,
) -> bool {
    if source == target {
        return true;
    }
    if chebyshev(source, target) > max_range {
        return false;
    }
    rays.stepped(step).any(|ray| walk_ray(grid, source, ray, max_range, |p| p == target))
}
