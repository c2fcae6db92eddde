pub mod config;
pub mod engine;
pub mod entity;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod scenario;
pub mod types;

pub use config::{ConfigError, Tunables};
pub use engine::ai::{AiContext, Decision, decide, notices};
pub use engine::fov::{RayTable, STANDARD_RAY_SAMPLES, cast_rays, is_in_fov};
pub use engine::line::{Validation, Vector, rasterize};
pub use engine::pathfinding::{
    Movement, NodeGraph, backtrack, find_step, flood_fill, move_towards,
};
pub use engine::targeting::{
    Impact, Shot, Targeting, find_targets, next_target, overshoot, trace_shot,
};
pub use entity::{Entities, Entity};
pub use error::{ErrorSeverity, SpatialError};
pub use geometry::distance;
pub use grid::{Cell, Grid, Map};
pub use scenario::{Scenario, ScenarioError};
pub use types::*;
