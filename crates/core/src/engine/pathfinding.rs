//! Movement toward a destination: direct stepping plus a weighted flood-fill
//! graph for movers that can path around obstacles.
//!
//! The flood fill labels cells outward from the goal, one level per round, and
//! stops the moment it touches the start cell. The mover then steps to the
//! first neighbour (row-major 3x3 order) with a lower label. That scan order is
//! the tie-break between equally short routes and must stay fixed for
//! reproducible movement.

use super::*;

/// Per-query arena of flood-fill labels, one slot per grid cell.
///
/// `None` marks a cell the flood never reached.
#[derive(Clone, Debug)]
pub struct NodeGraph {
    width: usize,
    height: usize,
    weights: Vec<Option<u32>>,
    start: Pos,
    goal: Pos,
    start_found: bool,
    rounds: u32,
}

impl NodeGraph {
    fn new(width: usize, height: usize, start: Pos, goal: Pos) -> Self {
        Self {
            width,
            height,
            weights: vec![None; width * height],
            start,
            goal,
            start_found: false,
            rounds: 0,
        }
    }

    fn index(&self, pos: Pos) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 {
            return None;
        }
        let (x, y) = (pos.x as usize, pos.y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y * self.width + x)
    }

    fn set_weight(&mut self, pos: Pos, weight: u32) {
        if let Some(idx) = self.index(pos) {
            self.weights[idx] = Some(weight);
        }
    }

    pub fn weight(&self, pos: Pos) -> Option<u32> {
        self.index(pos).and_then(|idx| self.weights[idx])
    }

    pub fn start(&self) -> Pos {
        self.start
    }

    pub fn goal(&self) -> Pos {
        self.goal
    }

    pub fn start_found(&self) -> bool {
        self.start_found
    }

    /// Expansion rounds performed before the flood stopped.
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn labelled_count(&self) -> usize {
        self.weights.iter().filter(|w| w.is_some()).count()
    }

    /// First neighbour of `pos`, in row-major order, whose label is strictly lower.
    pub fn descend(&self, pos: Pos) -> Option<Pos> {
        let weight = self.weight(pos)?;
        neighbors8(pos).into_iter().find(|&n| self.weight(n).is_some_and(|w| w < weight))
    }

    /// Cells visited when repeatedly descending from `from`, ending on the goal.
    /// Empty when `from` was never labelled.
    pub fn trace(&self, from: Pos) -> Vec<Pos> {
        let mut route = Vec::new();
        let mut current = from;
        while let Some(next) = self.descend(current) {
            route.push(next);
            current = next;
        }
        route
    }
}

/// Labels cells outward from `goal` until `start` is touched or the flood runs dry.
///
/// Cells that are out of bounds, already labelled, blocked, opaque, or occupied
/// by a blocking living creature are never labelled. `start` itself is exempt
/// from those checks because the mover usually stands on it.
pub fn flood_fill<G: Grid + ?Sized>(
    grid: &G,
    entities: &Entities,
    start: Pos,
    goal: Pos,
) -> NodeGraph {
    let mut graph = NodeGraph::new(grid.width(), grid.height(), start, goal);
    if !grid.in_bounds(goal) || !grid.in_bounds(start) {
        return graph;
    }
    graph.set_weight(goal, 0);
    if start == goal {
        graph.start_found = true;
        return graph;
    }

    let mut frontier = vec![goal];
    let mut level = 0;
    'expand: while !frontier.is_empty() {
        let mut next = Vec::new();
        for &node in &frontier {
            for n in neighbors8(node) {
                if !grid.in_bounds(n) {
                    continue;
                }
                if n == start {
                    graph.set_weight(n, level + 1);
                    graph.start_found = true;
                    break 'expand;
                }
                if graph.weight(n).is_some()
                    || grid.is_blocked(n)
                    || grid.blocks_sight(n)
                    || entities.is_occupied(n)
                {
                    continue;
                }
                graph.set_weight(n, level + 1);
                next.push(n);
            }
        }
        frontier = next;
        level += 1;
    }
    graph.rounds = level + u32::from(graph.start_found);

    tracing::trace!(
        %start,
        %goal,
        rounds = graph.rounds,
        labelled = graph.labelled_count(),
        found = graph.start_found,
        "flood fill"
    );
    graph
}

/// Offset of the first descending neighbour of the graph's start cell.
pub fn backtrack(graph: &NodeGraph) -> Result<(i32, i32), SpatialError> {
    let start = graph.start();
    graph
        .descend(start)
        .map(|next| (next.x - start.x, next.y - start.y))
        .ok_or(SpatialError::NoPathFound { start, goal: graph.goal() })
}

/// Flood-fills toward `goal` and returns the one-step offset for a mover on `start`.
///
/// `(0, 0)` when already on the goal.
pub fn find_step<G: Grid + ?Sized>(
    grid: &G,
    entities: &Entities,
    start: Pos,
    goal: Pos,
) -> Result<(i32, i32), SpatialError> {
    if start == goal {
        return Ok((0, 0));
    }
    backtrack(&flood_fill(grid, entities, start, goal))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Movement {
    Step(Pos),
    Hold,
}

impl Movement {
    pub fn destination(self, from: Pos) -> Pos {
        match self {
            Movement::Step(to) => to,
            Movement::Hold => from,
        }
    }
}

fn is_free<G: Grid + ?Sized>(grid: &G, entities: &Entities, pos: Pos) -> bool {
    grid.in_bounds(pos) && !grid.is_blocked(pos) && !entities.is_occupied(pos)
}

/// One move from `from` toward `to` for the given movement style.
///
/// The diagonal-or-straight unit step is taken when free. Otherwise
/// [`MoveStyle::Direct`] tries the horizontal then the vertical component and
/// [`MoveStyle::Pather`] consults the flood-fill graph. A failed search holds
/// position.
pub fn move_towards<G: Grid + ?Sized>(
    grid: &G,
    entities: &Entities,
    from: Pos,
    to: Pos,
    style: MoveStyle,
) -> Movement {
    if from == to {
        return Movement::Hold;
    }
    let (dx, dy) = step_towards(from, to);
    let direct = from.offset(dx, dy);
    if is_free(grid, entities, direct) {
        return Movement::Step(direct);
    }

    match style {
        MoveStyle::Direct => [from.offset(dx, 0), from.offset(0, dy)]
            .into_iter()
            .find(|&partial| {
                partial != from && partial != direct && is_free(grid, entities, partial)
            })
            .map_or(Movement::Hold, Movement::Step),
        MoveStyle::Pather => match find_step(grid, entities, from, to) {
            Ok((0, 0)) => Movement::Hold,
            Ok((sx, sy)) => {
                let next = from.offset(sx, sy);
                if is_free(grid, entities, next) { Movement::Step(next) } else { Movement::Hold }
            }
            Err(err) => {
                tracing::debug!(%err, "holding position");
                Movement::Hold
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::*;
    use crate::grid::{Cell, Map};

    #[test]
    fn route_around_wall_follows_row_major_tie_break() {
        let (map, start, goal) = wall_between_fixture();
        let graph = flood_fill(&map, &Entities::new(), start, goal);

        assert!(graph.start_found());
        assert_eq!(graph.weight(goal), Some(0));
        assert_eq!(graph.weight(start), Some(5));
        assert_eq!(backtrack(&graph), Ok((1, 0)));
        assert_eq!(
            graph.trace(start),
            vec![Pos::new(1, 0), Pos::new(2, 0), Pos::new(3, 1), Pos::new(4, 0), Pos::new(5, 0)]
        );
    }

    #[test]
    fn labels_descend_by_one_along_the_route() {
        let (map, start) = pillar_room_fixture();
        let goal = Pos::new(9, 9);
        let graph = flood_fill(&map, &Entities::new(), start, goal);
        let route = graph.trace(start);

        assert_eq!(route.last(), Some(&goal));
        let mut previous = graph.weight(start).expect("start labelled");
        let mut at = start;
        for step in route {
            assert_eq!(chebyshev(at, step), 1, "route must move one cell at a time");
            let weight = graph.weight(step).expect("route cell labelled");
            assert_eq!(weight + 1, previous);
            previous = weight;
            at = step;
        }
        assert_eq!(previous, 0);
    }

    #[test]
    fn enclosed_start_has_no_path() {
        let (map, start) = enclosed_fixture();
        let goal = Pos::new(0, 0);
        let err = find_step(&map, &Entities::new(), start, goal).unwrap_err();
        assert_eq!(err, SpatialError::NoPathFound { start, goal });
        assert!(err.is_recoverable());
        assert_eq!(
            move_towards(&map, &Entities::new(), start, goal, MoveStyle::Pather),
            Movement::Hold
        );
    }

    #[test]
    fn unreachable_goal_floods_everything_reachable_then_stops() {
        let (map, start) = enclosed_fixture();
        let graph = flood_fill(&map, &Entities::new(), Pos::new(0, 0), start);
        assert!(!graph.start_found());
        assert_eq!(graph.labelled_count(), 1);
        assert!(graph.trace(Pos::new(0, 0)).is_empty());
    }

    #[test]
    fn standing_on_the_goal_is_a_zero_step() {
        let map = Map::new(5, 5);
        assert_eq!(find_step(&map, &Entities::new(), Pos::new(2, 2), Pos::new(2, 2)), Ok((0, 0)));
        assert_eq!(
            move_towards(&map, &Entities::new(), Pos::new(2, 2), Pos::new(2, 2), MoveStyle::Pather),
            Movement::Hold
        );
    }

    #[test]
    fn mover_on_start_does_not_block_its_own_search() {
        let map = Map::new(8, 8);
        let mut entities = Entities::new();
        let start = Pos::new(1, 1);
        let goal = Pos::new(6, 1);
        spawn(&mut entities, start);
        spawn(&mut entities, goal);
        assert!(find_step(&map, &entities, start, goal).is_ok());
    }

    #[test]
    fn blocking_creatures_close_corridors() {
        let mut map = Map::new(9, 3);
        for x in 0..9 {
            map.set_wall(Pos::new(x, 0));
            map.set_wall(Pos::new(x, 2));
        }
        let mut entities = Entities::new();
        let start = Pos::new(1, 1);
        let goal = Pos::new(7, 1);
        let guard = spawn(&mut entities, Pos::new(4, 1));

        assert!(find_step(&map, &entities, start, goal).is_err());
        entities.kill(guard).expect("kill");
        assert_eq!(find_step(&map, &entities, start, goal), Ok((1, 0)));
    }

    #[test]
    fn opaque_walkable_cells_are_avoided_by_the_flood() {
        let mut map = Map::new(7, 3);
        for x in 0..7 {
            map.set_wall(Pos::new(x, 0));
            map.set_wall(Pos::new(x, 2));
        }
        map.set_cell(Pos::new(3, 1), Cell::GLASS);
        assert!(find_step(&map, &Entities::new(), Pos::new(1, 1), Pos::new(5, 1)).is_err());
    }

    #[test]
    fn direct_step_is_taken_when_free() {
        let map = Map::new(10, 10);
        let movement =
            move_towards(&map, &Entities::new(), Pos::new(2, 2), Pos::new(6, 7), MoveStyle::Direct);
        assert_eq!(movement, Movement::Step(Pos::new(3, 3)));
        assert_eq!(movement.destination(Pos::new(2, 2)), Pos::new(3, 3));
    }

    #[test]
    fn direct_style_falls_back_to_partial_steps() {
        let mut map = Map::new(10, 10);
        let from = Pos::new(2, 2);
        let to = Pos::new(5, 5);
        let entities = Entities::new();

        map.set_wall(Pos::new(3, 3));
        assert_eq!(
            move_towards(&map, &entities, from, to, MoveStyle::Direct),
            Movement::Step(Pos::new(3, 2))
        );

        map.set_wall(Pos::new(3, 2));
        assert_eq!(
            move_towards(&map, &entities, from, to, MoveStyle::Direct),
            Movement::Step(Pos::new(2, 3))
        );

        map.set_wall(Pos::new(2, 3));
        assert_eq!(move_towards(&map, &entities, from, to, MoveStyle::Direct), Movement::Hold);
    }

    #[test]
    fn straight_blocked_direct_mover_holds_while_pather_detours() {
        let (map, _, goal) = wall_between_fixture();
        let from = Pos::new(2, 0);
        let entities = Entities::new();

        assert_eq!(move_towards(&map, &entities, from, goal, MoveStyle::Direct), Movement::Hold);
        match move_towards(&map, &entities, from, goal, MoveStyle::Pather) {
            Movement::Step(next) => {
                assert_eq!(chebyshev(from, next), 1);
                assert!(!map.is_blocked(next));
            }
            Movement::Hold => panic!("pather should detour around the wall"),
        }
    }

    #[test]
    fn pather_will_not_step_onto_an_occupied_goal() {
        let map = Map::new(6, 6);
        let mut entities = Entities::new();
        let from = Pos::new(2, 2);
        let goal = Pos::new(3, 3);
        spawn(&mut entities, goal);
        assert_eq!(move_towards(&map, &entities, from, goal, MoveStyle::Pather), Movement::Hold);
    }
}
