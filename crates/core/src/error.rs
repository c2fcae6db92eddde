//! Error taxonomy for spatial queries.
//!
//! None of these abort a turn: callers degrade to "no movement" or "no action".
//! Construction-time problems (bad tunables, malformed scenarios) have their own
//! error types in [`crate::config`] and [`crate::scenario`].

use crate::types::{EntityId, Pos};

/// How a caller is expected to react to a [`SpatialError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorSeverity {
    /// Handled locally by a fallback, e.g. holding position.
    Recoverable,
    /// Bad input from the caller; the request must not proceed.
    Validation,
    /// A broken contract elsewhere in the program. Log it and surface it.
    Internal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SpatialError {
    /// A vector endpoint lies outside the grid.
    #[error("position {pos} is outside the {width}x{height} grid")]
    OutOfBounds { pos: Pos, width: usize, height: usize },

    /// Backtracking from `start` found no descending neighbour.
    #[error("no path from {start} to {goal}")]
    NoPathFound { start: Pos, goal: Pos },

    /// Not even the acting entity could be produced as a target.
    #[error("no target available for {actor:?}")]
    NoTargetFound { actor: EntityId },

    /// An entity id did not resolve in entity storage.
    #[error("entity {id:?} not found")]
    IndexNotFound { id: EntityId },
}

impl SpatialError {
    pub const fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NoPathFound { .. } => ErrorSeverity::Recoverable,
            Self::OutOfBounds { .. } | Self::IndexNotFound { .. } => ErrorSeverity::Validation,
            Self::NoTargetFound { .. } => ErrorSeverity::Internal,
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self.severity(), ErrorSeverity::Recoverable)
    }
}
