//! Per-style AI turn decisions built on the spatial engines.
//! One match over [`AiStyle`] picks between attacking, moving, and holding; the
//! geometry itself lives in `fov`, `line`, `pathfinding`, and `targeting`.

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::Rng;

use super::fov::{RayTable, is_in_fov};
use super::pathfinding::{Movement, move_towards};
use super::targeting::{Impact, trace_shot};
use super::*;
use crate::config::Tunables;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Attack(EntityId),
    Move(Pos),
    Hold,
}

/// Everything a decision reads. Nothing here is mutated.
pub struct AiContext<'a, G: Grid + ?Sized> {
    pub grid: &'a G,
    pub entities: &'a Entities,
    pub rays: &'a RayTable,
    pub tunables: &'a Tunables,
}

/// Awareness roll for an idle creature: `roll(0..100) <= notice_chance`.
pub fn notices(rng: &mut ChaCha8Rng, notice_chance: u8) -> bool {
    let roll = (rng.next_u64() % 100) as u8;
    roll <= notice_chance
}

/// What `actor` does this turn about `target`, given its behaviour style.
///
/// Targets that are dead or outside the actor's field of view yield
/// [`Decision::Hold`]. Missing ids are an error for the caller to log.
pub fn decide<G: Grid + ?Sized>(
    ctx: &AiContext<'_, G>,
    actor: EntityId,
    style: AiStyle,
    target: EntityId,
) -> Result<Decision, SpatialError> {
    let from = ctx.entities.require(actor)?.pos;
    let quarry = ctx.entities.require(target)?;
    if !quarry.is_living_creature() {
        return Ok(Decision::Hold);
    }
    let to = quarry.pos;
    let t = ctx.tunables;
    if !is_in_fov(ctx.grid, ctx.rays, from, to, t.sight_range, t.ray_step) {
        return Ok(Decision::Hold);
    }

    let decision = match style.attack {
        AttackStyle::Melee if chebyshev(from, to) <= 1 => Decision::Attack(target),
        AttackStyle::Ranged { range } => {
            let shot = trace_shot(ctx.grid, ctx.entities, from, to)?;
            // Vector length includes the shooter's own cell, hence the + 1.
            let in_reach = shot.vector.len() <= range as usize + 1;
            if in_reach && shot.impact() == Impact::Creature(target) {
                Decision::Attack(target)
            } else {
                approach(ctx, from, to, style.movement)
            }
        }
        AttackStyle::Melee => approach(ctx, from, to, style.movement),
    };
    tracing::debug!(?actor, ?style, ?decision, "ai decision");
    Ok(decision)
}

fn approach<G: Grid + ?Sized>(
    ctx: &AiContext<'_, G>,
    from: Pos,
    to: Pos,
    movement: MoveStyle,
) -> Decision {
    match move_towards(ctx.grid, ctx.entities, from, to, movement) {
        Movement::Step(next) => Decision::Move(next),
        Movement::Hold => Decision::Hold,
    }
}
