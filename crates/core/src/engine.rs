//! The spatial engines: visibility, line vectors, pathfinding, targeting, and
//! the AI dispatch that composes them.
//!
//! Every query here runs to completion inside one caller turn. The ray table is
//! the only state that outlives a call.

pub mod ai;
pub mod fov;
pub mod line;
pub mod pathfinding;
pub mod targeting;

#[cfg(test)]
mod test_support;

use crate::entity::{Entities, Entity};
use crate::error::SpatialError;
use crate::geometry::*;
use crate::grid::Grid;
use crate::types::*;
