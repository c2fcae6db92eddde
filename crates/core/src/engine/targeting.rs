//! Target ranking and selection for AI and player ranged combat.
//! Candidates are living creatures in range and in view, ranked clear shots
//! first, then obstructed ones, each nearest first. Selection is sticky toward
//! the previously chosen target until that target dies or leaves the list.

use super::fov::{RayTable, is_in_fov};
use super::line::{Validation, Vector};
use super::*;

/// Ranks every living creature other than `source` that is within `max_range`
/// (rounded Euclidean) and inside `source`'s field of view.
///
/// Clear-line targets come first, then obstructed ones; each group is ordered by
/// ascending distance, ties broken by storage order.
pub fn find_targets<G: Grid + ?Sized>(
    grid: &G,
    entities: &Entities,
    rays: &RayTable,
    source: EntityId,
    max_range: u32,
    step: usize,
) -> Result<Vec<EntityId>, SpatialError> {
    let origin = entities.require(source)?.pos;
    let mut clear = Vec::new();
    let mut obstructed = Vec::new();

    for candidate in entities.living_creatures() {
        if candidate.id == source || distance(origin, candidate.pos) > max_range {
            continue;
        }
        if !is_in_fov(grid, rays, origin, candidate.pos, max_range, step) {
            continue;
        }
        let mut vector = Vector::new(grid, origin, candidate.pos)?;
        vector.compute();
        let key = squared_distance(origin, candidate.pos);
        if vector.validate(grid, entities).is_clear {
            clear.push((key, candidate.id));
        } else {
            obstructed.push((key, candidate.id));
        }
    }

    clear.sort_by_key(|&(key, _)| key);
    obstructed.sort_by_key(|&(key, _)| key);
    tracing::trace!(clear = clear.len(), obstructed = obstructed.len(), "ranked targets");
    Ok(clear.into_iter().chain(obstructed).map(|(_, id)| id).collect())
}

fn squared_distance(a: Pos, b: Pos) -> i64 {
    let dx = i64::from(b.x - a.x);
    let dy = i64::from(b.y - a.y);
    dx * dx + dy * dy
}

/// The entity after `current` in `ranked`, wrapping to the head.
///
/// Returns `current` for an empty list and the head when `current` is absent.
pub fn next_target(current: EntityId, ranked: &[EntityId]) -> EntityId {
    let Some(&head) = ranked.first() else {
        return current;
    };
    match ranked.iter().position(|&id| id == current) {
        Some(i) => ranked.get(i + 1).copied().unwrap_or(head),
        None => head,
    }
}

/// Owns the remembered last target.
#[derive(Clone, Debug, Default)]
pub struct Targeting {
    last_target: Option<EntityId>,
}

impl Targeting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_target(&self) -> Option<EntityId> {
        self.last_target
    }

    /// Records an explicit choice, e.g. after the player cycles with [`next_target`].
    pub fn remember(&mut self, target: EntityId) {
        self.last_target = Some(target);
    }

    /// Picks the remembered target if it is still ranked, otherwise the head of
    /// `ranked` (and remembers it), otherwise `source` itself.
    ///
    /// Callers must check for a self-target. Fails only when `source` is not in
    /// storage, which is a broken contract upstream.
    pub fn select_target(
        &mut self,
        entities: &Entities,
        source: EntityId,
        ranked: &[EntityId],
    ) -> Result<EntityId, SpatialError> {
        if let Some(last) = self.last_target
            && ranked.contains(&last)
            && entities.get(last).is_some_and(Entity::is_living_creature)
        {
            return Ok(last);
        }
        if let Some(&head) = ranked.first() {
            tracing::debug!(?head, previous = ?self.last_target, "selected new target");
            self.last_target = Some(head);
            return Ok(head);
        }
        if entities.get(source).is_some() {
            return Ok(source);
        }
        tracing::error!(?source, "acting entity is missing from storage");
        Err(SpatialError::NoTargetFound { actor: source })
    }

    /// Forgets the remembered target if it is `entity`. Call on death or removal.
    pub fn invalidate(&mut self, entity: EntityId) {
        if self.last_target == Some(entity) {
            self.last_target = None;
        }
    }
}

/// First thing a projectile along a vector runs into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Impact {
    Creature(EntityId),
    Object(EntityId),
    Tile(Pos),
    /// Nothing stopped the projectile before the vector's last cell.
    Clear,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shot {
    pub vector: Vector,
    pub validation: Validation,
}

impl Shot {
    pub fn impact(&self) -> Impact {
        let v = &self.validation;
        if let Some(id) = v.blocking_entity {
            Impact::Creature(id)
        } else if let Some(id) = v.blocking_object {
            Impact::Object(id)
        } else if let Some(tile) = v.blocking_tile {
            Impact::Tile(tile)
        } else {
            Impact::Clear
        }
    }

    pub fn is_clear(&self) -> bool {
        self.validation.is_clear
    }
}

/// Builds, rasterizes, and validates the line from `from` to `to`.
pub fn trace_shot<G: Grid + ?Sized>(
    grid: &G,
    entities: &Entities,
    from: Pos,
    to: Pos,
) -> Result<Shot, SpatialError> {
    let mut vector = Vector::new(grid, from, to)?;
    vector.compute();
    let validation = vector.validate(grid, entities);
    Ok(Shot { vector, validation })
}

/// Continues a shot past its intended target along the same line pattern.
///
/// Meant for shots that reached their target cell and missed; the result
/// reports what the projectile hits further on, or [`Impact::Clear`] when it
/// flies off the map.
pub fn overshoot<G: Grid + ?Sized>(grid: &G, entities: &Entities, shot: &Shot) -> Shot {
    let (dx, dy) = shot.vector.find_direction_pattern();
    let mut vector = shot.vector.extrapolate(grid, &dx, &dy);
    let validation = vector.validate(grid, entities);
    Shot { vector, validation }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::*;
    use crate::grid::Map;

    fn rank(map: &Map, entities: &Entities, source: EntityId, range: u32) -> Vec<EntityId> {
        find_targets(map, entities, RayTable::standard(), source, range, 1).expect("ranked")
    }

    #[test]
    fn clear_targets_rank_before_obstructed_ones() {
        let map = Map::new(12, 12);
        let mut entities = Entities::new();
        let source = spawn(&mut entities, Pos::new(0, 0));
        let near = spawn(&mut entities, Pos::new(2, 0));
        let covered = spawn(&mut entities, Pos::new(0, 4));
        let far = spawn(&mut entities, Pos::new(5, 5));
        entities.spawn_object("crate", Pos::new(0, 2), true);

        assert_eq!(rank(&map, &entities, source, 10), vec![near, far, covered]);
    }

    #[test]
    fn ranking_skips_self_dead_and_out_of_range() {
        let map = Map::new(20, 20);
        let mut entities = Entities::new();
        let source = spawn(&mut entities, Pos::new(5, 5));
        let corpse = spawn(&mut entities, Pos::new(6, 5));
        entities.kill(corpse).expect("kill");
        spawn(&mut entities, Pos::new(15, 5));
        let visible = spawn(&mut entities, Pos::new(5, 8));
        entities.spawn_object("barrel", Pos::new(7, 7), true);

        assert_eq!(rank(&map, &entities, source, 5), vec![visible]);
    }

    #[test]
    fn ranking_skips_creatures_behind_walls() {
        let (map, origin, hidden_at) = wall_between_fixture();
        let mut entities = Entities::new();
        let source = spawn(&mut entities, origin);
        spawn(&mut entities, hidden_at);
        assert!(rank(&map, &entities, source, 10).is_empty());
    }

    #[test]
    fn ranking_requires_a_stored_source() {
        let map = Map::new(5, 5);
        let mut entities = Entities::new();
        let source = spawn(&mut entities, Pos::new(1, 1));
        entities.remove(source);
        let err = find_targets(&map, &entities, RayTable::standard(), source, 5, 1).unwrap_err();
        assert_eq!(err, SpatialError::IndexNotFound { id: source });
    }

    #[test]
    fn selection_sticks_to_the_last_target() {
        let map = Map::new(12, 12);
        let mut entities = Entities::new();
        let source = spawn(&mut entities, Pos::new(0, 0));
        let first = spawn(&mut entities, Pos::new(4, 0));
        let mut targeting = Targeting::new();

        let ranked = rank(&map, &entities, source, 10);
        assert_eq!(targeting.select_target(&entities, source, &ranked), Ok(first));

        let closer = spawn(&mut entities, Pos::new(1, 1));
        let ranked = rank(&map, &entities, source, 10);
        assert_eq!(ranked[0], closer);
        assert_eq!(targeting.select_target(&entities, source, &ranked), Ok(first));
        assert_eq!(targeting.last_target(), Some(first));
    }

    #[test]
    fn invalidated_target_is_replaced_by_the_head() {
        let mut entities = Entities::new();
        let source = spawn(&mut entities, Pos::new(0, 0));
        let a = spawn(&mut entities, Pos::new(1, 0));
        let b = spawn(&mut entities, Pos::new(2, 0));
        let mut targeting = Targeting::new();
        targeting.remember(b);

        targeting.invalidate(a);
        assert_eq!(targeting.last_target(), Some(b));
        targeting.invalidate(b);
        assert_eq!(targeting.last_target(), None);
        assert_eq!(targeting.select_target(&entities, source, &[a, b]), Ok(a));
        assert_eq!(targeting.last_target(), Some(a));
    }

    #[test]
    fn dead_last_target_is_not_reselected() {
        let mut entities = Entities::new();
        let source = spawn(&mut entities, Pos::new(0, 0));
        let a = spawn(&mut entities, Pos::new(1, 0));
        let b = spawn(&mut entities, Pos::new(2, 0));
        let mut targeting = Targeting::new();
        targeting.remember(b);
        entities.kill(b).expect("kill");

        assert_eq!(targeting.select_target(&entities, source, &[a, b]), Ok(a));
    }

    #[test]
    fn empty_ranking_targets_self() {
        let mut entities = Entities::new();
        let source = spawn(&mut entities, Pos::new(0, 0));
        let mut targeting = Targeting::new();
        assert_eq!(targeting.select_target(&entities, source, &[]), Ok(source));
        assert_eq!(targeting.last_target(), None);
    }

    #[test]
    fn missing_source_with_empty_ranking_is_an_internal_error() {
        let mut entities = Entities::new();
        let source = spawn(&mut entities, Pos::new(0, 0));
        entities.remove(source);
        let err = Targeting::new().select_target(&entities, source, &[]).unwrap_err();
        assert_eq!(err, SpatialError::NoTargetFound { actor: source });
        assert!(!err.is_recoverable());
    }

    #[test]
    fn next_target_cycles_and_wraps() {
        let mut entities = Entities::new();
        let a = spawn(&mut entities, Pos::new(0, 0));
        let b = spawn(&mut entities, Pos::new(1, 0));
        let c = spawn(&mut entities, Pos::new(2, 0));
        let stranger = spawn(&mut entities, Pos::new(3, 0));
        let ranked = [a, b, c];

        assert_eq!(next_target(a, &ranked), b);
        assert_eq!(next_target(b, &ranked), c);
        assert_eq!(next_target(c, &ranked), a);
        assert_eq!(next_target(stranger, &ranked), a);
        assert_eq!(next_target(b, &[]), b);
    }

    #[test]
    fn shot_reports_first_impact() {
        let mut map = Map::new(10, 10);
        let mut entities = Entities::new();
        let target = spawn(&mut entities, Pos::new(6, 0));

        let shot = trace_shot(&map, &entities, Pos::new(0, 0), Pos::new(6, 0)).expect("shot");
        assert!(shot.is_clear());
        assert_eq!(shot.impact(), Impact::Creature(target));

        map.set_wall(Pos::new(4, 0));
        let shot = trace_shot(&map, &entities, Pos::new(0, 0), Pos::new(6, 0)).expect("shot");
        assert!(!shot.is_clear());
        assert_eq!(shot.impact(), Impact::Tile(Pos::new(4, 0)));

        assert!(trace_shot(&map, &entities, Pos::new(0, 0), Pos::new(0, 10)).is_err());
    }

    #[test]
    fn missed_shot_overshoots_into_the_next_creature() {
        let map = Map::new(12, 12);
        let mut entities = Entities::new();
        spawn(&mut entities, Pos::new(3, 3));
        let unlucky = spawn(&mut entities, Pos::new(6, 6));

        let shot = trace_shot(&map, &entities, Pos::new(0, 0), Pos::new(3, 3)).expect("shot");
        let stray = overshoot(&map, &entities, &shot);
        assert_eq!(stray.vector.start, Pos::new(3, 3));
        assert_eq!(stray.impact(), Impact::Creature(unlucky));
    }

    #[test]
    fn overshoot_into_open_ground_flies_off_the_map() {
        let map = Map::new(8, 8);
        let entities = Entities::new();
        let shot = trace_shot(&map, &entities, Pos::new(1, 1), Pos::new(3, 1)).expect("shot");
        let stray = overshoot(&map, &entities, &shot);
        assert_eq!(stray.vector.target, Pos::new(7, 1));
        assert_eq!(stray.impact(), Impact::Clear);
        assert!(stray.is_clear());
    }
}
