use std::fmt;

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    pub struct EntityId;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub y: i32,
    pub x: i32,
}

impl Pos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { y, x }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self { y: self.y + dy, x: self.x + dx }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Creature,
    Object,
}

/// How an actor closes distance to a destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveStyle {
    /// Straight-line stepping with horizontal/vertical partial steps as the only fallback.
    Direct,
    /// Straight-line stepping that falls back to the flood-fill graph when obstructed.
    Pather,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackStyle {
    Melee,
    Ranged { range: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AiStyle {
    pub movement: MoveStyle,
    pub attack: AttackStyle,
}

impl AiStyle {
    pub const DUMB_MELEE: Self = Self { movement: MoveStyle::Direct, attack: AttackStyle::Melee };
    pub const PATHER_MELEE: Self = Self { movement: MoveStyle::Pather, attack: AttackStyle::Melee };
}
