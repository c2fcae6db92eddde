//! Shared fixtures for the engine test suites.
//! It does not own production logic.

use super::*;
use crate::grid::Map;

/// One-row corridor with a wall at x = 3; the source stands at the west end.
pub(super) fn corridor_fixture() -> (Map, Pos) {
    let mut map = Map::new(8, 1);
    map.set_wall(Pos::new(3, 0));
    (map, Pos::new(0, 0))
}

/// Walled 12x12 room with a few interior pillars around the source.
pub(super) fn pillar_room_fixture() -> (Map, Pos) {
    let mut map = Map::walled(12, 12);
    for p in [Pos::new(3, 3), Pos::new(8, 3), Pos::new(3, 8), Pos::new(8, 8), Pos::new(7, 5)] {
        map.set_wall(p);
    }
    (map, Pos::new(5, 5))
}

/// The source cell boxed in by walls on all eight sides.
pub(super) fn enclosed_fixture() -> (Map, Pos) {
    let mut map = Map::new(7, 7);
    let source = Pos::new(3, 3);
    for p in neighbors8(source) {
        map.set_wall(p);
    }
    (map, source)
}

/// Open 10x10 grid with one wall at (3, 0) between (0, 0) and (5, 0).
pub(super) fn wall_between_fixture() -> (Map, Pos, Pos) {
    let mut map = Map::new(10, 10);
    map.set_wall(Pos::new(3, 0));
    (map, Pos::new(0, 0), Pos::new(5, 0))
}

pub(super) fn spawn(entities: &mut Entities, pos: Pos) -> EntityId {
    entities.spawn_creature("creature", pos)
}
