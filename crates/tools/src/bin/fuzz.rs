use std::collections::BTreeSet;
use std::io;

use anyhow::{Result, ensure};
use clap::Parser;
use rand_chacha::{
    ChaCha8Rng,
    rand_core::{Rng, SeedableRng},
};
use sightline::{
    AiContext, AiStyle, AttackStyle, Decision, Entities, EntityId, Grid, Map, MoveStyle, Pos,
    RayTable, Tunables, cast_rays, decide, is_in_fov, notices,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    /// Random maps to generate
    #[arg(short, long, default_value_t = 100)]
    maps: u32,
    /// AI rounds simulated on each map
    #[arg(short, long, default_value_t = 30)]
    rounds: u32,
}

const STYLES: [AiStyle; 3] = [
    AiStyle::DUMB_MELEE,
    AiStyle::PATHER_MELEE,
    AiStyle { movement: MoveStyle::Pather, attack: AttackStyle::Ranged { range: 4 } },
];

fn random_pos(rng: &mut ChaCha8Rng, map: &Map) -> Pos {
    let x = (rng.next_u64() % map.width() as u64) as i32;
    let y = (rng.next_u64() % map.height() as u64) as i32;
    Pos::new(x, y)
}

fn free_pos(rng: &mut ChaCha8Rng, map: &Map, entities: &Entities) -> Option<Pos> {
    (0..64)
        .map(|_| random_pos(rng, map))
        .find(|&p| !map.is_blocked(p) && !entities.is_occupied(p))
}

fn random_map(rng: &mut ChaCha8Rng) -> Map {
    let width = 8 + (rng.next_u64() % 32) as usize;
    let height = 8 + (rng.next_u64() % 24) as usize;
    let mut map = Map::walled(width, height);
    for _ in 0..(width * height) / 6 {
        let p = random_pos(rng, &map);
        map.set_wall(p);
    }
    map
}

fn run_map(rng: &mut ChaCha8Rng, rounds: u32, tunables: &Tunables) -> Result<()> {
    let mut map = random_map(rng);
    let mut entities = Entities::new();
    let Some(hero_pos) = free_pos(rng, &map, &entities) else {
        return Ok(());
    };
    let hero = entities.spawn_creature("hero", hero_pos);
    let mut hunters: Vec<(EntityId, AiStyle)> = Vec::new();
    for i in 0..1 + rng.next_u64() % 5 {
        if let Some(p) = free_pos(rng, &map, &entities) {
            let style = STYLES[rng.next_u64() as usize % STYLES.len()];
            hunters.push((entities.spawn_creature(format!("hunter{i}"), p), style));
        }
    }

    let rays = RayTable::standard();
    let seen = cast_rays(&mut map, rays, hero_pos, tunables.sight_range, tunables.ray_step);
    ensure!(seen.contains(&hero_pos), "Invariant failed: hero cannot see its own cell");
    for &p in &seen {
        ensure!(
            is_in_fov(&map, rays, hero_pos, p, tunables.sight_range, tunables.ray_step),
            "Invariant failed: {p} explored but not in view"
        );
    }

    for _ in 0..rounds {
        for &(id, style) in &hunters {
            if !notices(rng, tunables.notice_chance) {
                continue;
            }
            let ctx = AiContext { grid: &map, entities: &entities, rays, tunables };
            if let Decision::Move(next) = decide(&ctx, id, style, hero)? {
                ensure!(!map.is_blocked(next), "Invariant failed: AI walked into {next}");
                ensure!(!entities.is_occupied(next), "Invariant failed: AI stacked on {next}");
                entities.move_to(id, next)?;
            }
        }
        let cells: BTreeSet<Pos> = entities.living_creatures().map(|e| e.pos).collect();
        ensure!(
            cells.len() == entities.living_creatures().count(),
            "Invariant failed: two creatures share a cell"
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    println!("Starting fuzz harness on seed {} over {} maps...", args.seed, args.maps);
    let tunables = Tunables::default();
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    for n in 0..args.maps {
        run_map(&mut rng, args.rounds, &tunables)?;
        tracing::debug!(map = n, "map passed");
    }

    println!("Fuzzing completed successfully.");
    Ok(())
}
