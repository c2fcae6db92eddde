use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand, ValueEnum};
use rand_chacha::{ChaCha8Rng, rand_core::SeedableRng};
use serde::Serialize;
use sightline::{
    AiContext, AiStyle, AttackStyle, Decision, EntityId, Grid, MoveStyle, Pos, Scenario,
    Targeting, Tunables, Vector, cast_rays, decide, distance, find_step, find_targets, flood_fill,
    notices,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, long_about = None)]
#[command(about = "Runs spatial queries against an ASCII scenario")]
struct Args {
    /// Scenario text file: `.` floor, `#` wall, `%` chasm, `"` glass, `o` crate,
    /// `@` and `a`-`z` creatures
    #[arg(short, long)]
    map: PathBuf,
    /// Tunables TOML; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Print a JSON report instead of text
    #[arg(long)]
    json: bool,
    /// Log filter, e.g. `sightline=trace`
    #[arg(long, default_value = "warn")]
    log: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Cells visible from a creature
    Fov {
        #[arg(long, default_value = "@")]
        from: Spot,
    },
    /// Flood-fill route between two spots
    Path {
        #[arg(long, default_value = "@")]
        from: Spot,
        to: Spot,
    },
    /// Straight line and its first blocker
    Line {
        #[arg(long, default_value = "@")]
        from: Spot,
        to: Spot,
    },
    /// Ranked targets for a creature and the one it would select
    Targets {
        #[arg(long, default_value = "@")]
        from: Spot,
    },
    /// Seeded AI turns: every other creature hunts `@`
    Turn {
        #[arg(short, long, default_value_t = 42)]
        seed: u64,
        #[arg(short, long, default_value_t = 5)]
        rounds: u32,
        #[arg(long, value_enum, default_value_t = Behaviour::PatherMelee)]
        style: Behaviour,
    },
}

/// A creature glyph or an `x,y` coordinate.
#[derive(Clone, Copy, Debug)]
enum Spot {
    Glyph(char),
    At(Pos),
}

impl FromStr for Spot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((x, y)) = s.split_once(',') {
            let x = x.trim().parse().map_err(|_| format!("bad x in {s:?}"))?;
            let y = y.trim().parse().map_err(|_| format!("bad y in {s:?}"))?;
            return Ok(Spot::At(Pos::new(x, y)));
        }
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(glyph), None) => Ok(Spot::Glyph(glyph)),
            _ => Err(format!("expected a glyph or x,y, got {s:?}")),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Behaviour {
    DumbMelee,
    PatherMelee,
    Archer,
}

impl Behaviour {
    fn style(self, tunables: &Tunables) -> AiStyle {
        match self {
            Behaviour::DumbMelee => AiStyle::DUMB_MELEE,
            Behaviour::PatherMelee => AiStyle::PATHER_MELEE,
            Behaviour::Archer => AiStyle {
                movement: MoveStyle::Pather,
                attack: AttackStyle::Ranged { range: tunables.sight_range },
            },
        }
    }
}

#[derive(Serialize)]
struct FovReport {
    source: Pos,
    visible: Vec<Pos>,
}

#[derive(Serialize)]
struct PathReport {
    from: Pos,
    to: Pos,
    found: bool,
    rounds: u32,
    first_step: Option<(i32, i32)>,
    route: Vec<Pos>,
}

#[derive(Serialize)]
struct LineReport {
    tiles: Vec<Pos>,
    passable: Vec<bool>,
    is_clear: bool,
    blocking_tile: Option<Pos>,
    blocking_entity: Option<Pos>,
    blocking_object: Option<Pos>,
}

#[derive(Serialize)]
struct TargetEntry {
    glyph: char,
    pos: Pos,
    distance: u32,
}

#[derive(Serialize)]
struct TargetsReport {
    ranked: Vec<TargetEntry>,
    selected: Option<char>,
}

#[derive(Serialize)]
struct TurnEntry {
    round: u32,
    glyph: char,
    noticed: bool,
    decision: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&args.log).context("Invalid log filter")?)
        .with_writer(io::stderr)
        .init();

    let text = fs::read_to_string(&args.map)
        .with_context(|| format!("Failed to read map file: {}", args.map.display()))?;
    let mut scenario = Scenario::parse(&text).context("Failed to parse scenario")?;
    let tunables = match &args.config {
        Some(path) => Tunables::load(path)
            .with_context(|| format!("Failed to load tunables: {}", path.display()))?,
        None => Tunables::default(),
    };
    tracing::info!(
        width = scenario.map.width(),
        height = scenario.map.height(),
        entities = scenario.entities.len(),
        "loaded scenario"
    );

    match args.command {
        Command::Fov { from } => fov(&mut scenario, &tunables, from, args.json),
        Command::Path { from, to } => path(&scenario, from, to, args.json),
        Command::Line { from, to } => line(&scenario, from, to, args.json),
        Command::Targets { from } => targets(&scenario, &tunables, from, args.json),
        Command::Turn { seed, rounds, style } => {
            turn(&mut scenario, &tunables, seed, rounds, style.style(&tunables), args.json)
        }
    }
}

fn resolve(scenario: &Scenario, spot: Spot) -> Result<Pos> {
    let pos = match spot {
        Spot::At(pos) => pos,
        Spot::Glyph(glyph) => scenario
            .entity(glyph)
            .and_then(|id| scenario.entities.get(id))
            .map(|e| e.pos)
            .ok_or_else(|| anyhow!("No creature {glyph:?} in scenario"))?,
    };
    if !scenario.map.in_bounds(pos) {
        bail!("{pos} is outside the {}x{} map", scenario.map.width(), scenario.map.height());
    }
    Ok(pos)
}

fn resolve_creature(scenario: &Scenario, spot: Spot) -> Result<EntityId> {
    let pos = resolve(scenario, spot)?;
    scenario
        .entities
        .living_creatures()
        .find(|e| e.pos == pos)
        .map(|e| e.id)
        .ok_or_else(|| anyhow!("No living creature at {pos}"))
}

fn emit<T: Serialize>(json: bool, report: &T, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report).context("Failed to encode report")?);
    } else {
        print!("{}", text());
    }
    Ok(())
}

fn fov(scenario: &mut Scenario, tunables: &Tunables, from: Spot, json: bool) -> Result<()> {
    let source = resolve(scenario, from)?;
    let rays = tunables.ray_table();
    let visible: BTreeSet<Pos> =
        cast_rays(&mut scenario.map, &rays, source, tunables.sight_range, tunables.ray_step);
    let report = FovReport { source, visible: visible.iter().copied().collect() };
    emit(json, &report, || {
        let drawn = scenario.render(|p| (!visible.contains(&p)).then_some(' '));
        format!("{drawn}{} cells visible from {source}\n", visible.len())
    })
}

fn path(scenario: &Scenario, from: Spot, to: Spot, json: bool) -> Result<()> {
    let (from, to) = (resolve(scenario, from)?, resolve(scenario, to)?);
    let graph = flood_fill(&scenario.map, &scenario.entities, from, to);
    let first_step = find_step(&scenario.map, &scenario.entities, from, to).ok();
    let route = graph.trace(from);
    let report = PathReport {
        from,
        to,
        found: graph.start_found(),
        rounds: graph.rounds(),
        first_step,
        route: route.clone(),
    };
    emit(json, &report, || {
        if !report.found {
            return format!("No path from {from} to {to}; a mover would hold position\n");
        }
        let drawn = scenario.render(|p| (route.contains(&p) && p != to).then_some('*'));
        format!("{drawn}{} steps after {} rounds\n", route.len(), report.rounds)
    })
}

fn line(scenario: &Scenario, from: Spot, to: Spot, json: bool) -> Result<()> {
    let (from, to) = (resolve(scenario, from)?, resolve(scenario, to)?);
    let mut vector = Vector::new(&scenario.map, from, to)?;
    vector.compute();
    let validation = vector.validate(&scenario.map, &scenario.entities);
    let pos_of = |id: Option<EntityId>| id.and_then(|id| scenario.entities.get(id)).map(|e| e.pos);
    let report = LineReport {
        is_clear: validation.is_clear,
        blocking_tile: validation.blocking_tile,
        blocking_entity: pos_of(validation.blocking_entity),
        blocking_object: pos_of(validation.blocking_object),
        tiles: vector.tiles.clone(),
        passable: vector.passable.clone(),
    };
    emit(json, &report, || {
        let drawn = scenario.render(|p| {
            let i = vector.tiles.iter().position(|&t| t == p)?;
            Some(if vector.passable[i] { '*' } else { 'x' })
        });
        let verdict = match (report.blocking_tile, report.blocking_entity, report.blocking_object) {
            (Some(p), _, _) => format!("blocked by terrain at {p}"),
            (_, Some(p), _) => format!("blocked by a creature at {p}"),
            (_, _, Some(p)) => format!("blocked by an object at {p}"),
            _ => "clear".to_string(),
        };
        format!("{drawn}{} cells, {verdict}\n", vector.len())
    })
}

fn targets(scenario: &Scenario, tunables: &Tunables, from: Spot, json: bool) -> Result<()> {
    let source = resolve_creature(scenario, from)?;
    let origin = resolve(scenario, from)?;
    let rays = tunables.ray_table();
    let ranked = find_targets(
        &scenario.map,
        &scenario.entities,
        &rays,
        source,
        tunables.sight_range,
        tunables.ray_step,
    )?;
    let selected = Targeting::new().select_target(&scenario.entities, source, &ranked)?;

    let entries: Vec<TargetEntry> = ranked
        .iter()
        .filter_map(|&id| {
            let pos = scenario.entities.get(id)?.pos;
            Some(TargetEntry {
                glyph: scenario.glyph_of(id)?,
                pos,
                distance: distance(origin, pos),
            })
        })
        .collect();
    let report = TargetsReport {
        ranked: entries,
        selected: (selected != source).then(|| scenario.glyph_of(selected)).flatten(),
    };
    emit(json, &report, || {
        let mut out = String::new();
        for (rank, entry) in report.ranked.iter().enumerate() {
            out.push_str(&format!(
                "{}. {} at {} (distance {})\n",
                rank + 1,
                entry.glyph,
                entry.pos,
                entry.distance
            ));
        }
        match report.selected {
            Some(glyph) => out.push_str(&format!("selected {glyph}\n")),
            None => out.push_str("no target in view\n"),
        }
        out
    })
}

fn turn(
    scenario: &mut Scenario,
    tunables: &Tunables,
    seed: u64,
    rounds: u32,
    style: AiStyle,
    json: bool,
) -> Result<()> {
    let hero = scenario.source().ok_or_else(|| anyhow!("Scenario has no @ creature"))?;
    let hunters: Vec<(char, EntityId)> = ('a'..='z')
        .filter_map(|glyph| scenario.entity(glyph).map(|id| (glyph, id)))
        .collect();
    let rays = tunables.ray_table();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut log = Vec::new();

    for round in 1..=rounds {
        for &(glyph, id) in &hunters {
            let noticed = notices(&mut rng, tunables.notice_chance);
            let decision = if noticed {
                let ctx = AiContext {
                    grid: &scenario.map,
                    entities: &scenario.entities,
                    rays: &rays,
                    tunables,
                };
                decide(&ctx, id, style, hero)?
            } else {
                Decision::Hold
            };
            if let Decision::Move(next) = decision {
                scenario.entities.move_to(id, next)?;
            }
            log.push(TurnEntry { round, glyph, noticed, decision: describe(scenario, decision) });
        }
    }

    emit(json, &log, || {
        let mut out = String::new();
        for entry in &log {
            let awareness = if entry.noticed { "" } else { " (unaware)" };
            out.push_str(&format!(
                "round {} {}: {}{awareness}\n",
                entry.round, entry.glyph, entry.decision
            ));
        }
        out.push_str(&scenario.render(|_| None));
        out
    })
}

fn describe(scenario: &Scenario, decision: Decision) -> String {
    match decision {
        Decision::Attack(id) => {
            format!("attacks {}", scenario.glyph_of(id).unwrap_or('?'))
        }
        Decision::Move(pos) => format!("moves to {pos}"),
        Decision::Hold => "holds".to_string(),
    }
}
