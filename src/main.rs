use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use bankshot::ai::{OpponentController, PlayerBehaviorTracker};
use bankshot::arena::{physics, ArenaConfig, ArenaState};
use bankshot::config::{profile_from_spec, profiles_dir, write_default_profile, Profile};
use bankshot::logging::{self, LogTarget};
use bankshot::world::Side;

const TARGET_FPS: u32 = 60;
const FRAME_MS: f32 = 1000.0 / TARGET_FPS as f32;

const DEFAULT_SECONDS: f32 = 120.0;
const DEFAULT_SEED: u64 = 0x5eed;

#[derive(Debug, Clone, PartialEq)]
struct DuelArgs {
    left: Option<String>,
    right: Option<String>,
    seed: u64,
    seconds: f32,
    debug: bool,
    write_profile: Option<PathBuf>,
}

impl Default for DuelArgs {
    fn default() -> Self {
        Self {
            left: None,
            right: None,
            seed: DEFAULT_SEED,
            seconds: DEFAULT_SECONDS,
            debug: false,
            write_profile: None,
        }
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let Some(duel) = parse_args(&args)? else {
        print_usage(args.first().map_or("bankshot", String::as_str));
        return Ok(());
    };

    let target = if duel.debug {
        LogTarget::debug_file()
    } else {
        LogTarget::Stderr
    };
    logging::init(target).context("failed to set up logging")?;

    if let Some(path) = &duel.write_profile {
        write_default_profile(path)
            .with_context(|| format!("failed to write profile template to {}", path.display()))?;
        println!("Wrote default profile to {}", path.display());
        return Ok(());
    }

    run_duel(&duel);
    Ok(())
}

/// Parse command line arguments. `Ok(None)` means usage was requested.
fn parse_args(args: &[String]) -> Result<Option<DuelArgs>> {
    let mut duel = DuelArgs::default();
    let mut iter = args.iter().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--left" | "-l" => duel.left = Some(value_for(arg, iter.next())?),
            "--right" | "-r" => duel.right = Some(value_for(arg, iter.next())?),
            "--seed" => {
                let raw = value_for(arg, iter.next())?;
                duel.seed = raw
                    .parse()
                    .with_context(|| format!("--seed expects an integer, got {raw:?}"))?;
            }
            "--seconds" => {
                let raw = value_for(arg, iter.next())?;
                let seconds: f32 = raw
                    .parse()
                    .with_context(|| format!("--seconds expects a number, got {raw:?}"))?;
                if !seconds.is_finite() || seconds <= 0.0 {
                    bail!("--seconds must be positive, got {seconds}");
                }
                duel.seconds = seconds;
            }
            "--debug" | "-d" => duel.debug = true,
            "--write-profile" => duel.write_profile = Some(PathBuf::from(value_for(arg, iter.next())?)),
            "--help" | "-h" => return Ok(None),
            other => bail!("unknown argument: {other} (try --help)"),
        }
    }

    Ok(Some(duel))
}

fn value_for(flag: &str, value: Option<&String>) -> Result<String> {
    match value {
        Some(v) => Ok(v.clone()),
        None => bail!("{flag} requires a value"),
    }
}

fn print_usage(program: &str) {
    println!("bankshot - headless launcher duel between two AI opponents");
    println!();
    println!("Usage:");
    println!("  {program} [--left PRESET|PATH] [--right PRESET|PATH] [--seed N] [--seconds N] [--debug]");
    println!("  {program} --write-profile PATH     # Write a commented profile template");
    println!();
    println!("Presets: {}", Profile::preset_names().join(", "));
    println!("Saved profiles: {}/<name>.toml", profiles_dir().display());
    println!();
    println!("Debug logging (--debug) goes to {}", logging::DEBUG_LOG_PATH);
    println!("  tail -f {}", logging::DEBUG_LOG_PATH);
}

/// A bad profile reference is not fatal: the controller falls back instead
fn side_profile(spec: Option<&str>, side: Side) -> Option<Profile> {
    let spec = spec?;
    match profile_from_spec(spec) {
        Ok(profile) => Some(profile),
        Err(e) => {
            warn!(%side, "could not use profile {:?}: {}", spec, e);
            None
        }
    }
}

fn run_duel(duel: &DuelArgs) {
    let mut arena = ArenaState::standard(&ArenaConfig::default());

    let mut left = OpponentController::new(
        Side::Left,
        side_profile(duel.left.as_deref(), Side::Left),
        duel.seed,
    );
    let mut right = OpponentController::new(
        Side::Right,
        side_profile(duel.right.as_deref(), Side::Right),
        duel.seed.wrapping_add(1),
    );

    // The left launcher stands in for a human so the right one can counter it
    let mut tracker = PlayerBehaviorTracker::new();
    tracker.init(Side::Left);

    let frames = (duel.seconds * TARGET_FPS as f32).round() as u64;
    info!(frames, seed = duel.seed, "duel starting");

    for frame in 0..frames {
        let time_ms = frame as f64 * f64::from(FRAME_MS);

        let shots_before = arena.shots_fired(Side::Left);
        left.update(&mut arena, time_ms, FRAME_MS, None);
        for _ in shots_before..arena.shots_fired(Side::Left) {
            tracker.record_human_shot();
        }
        right.update(&mut arena, time_ms, FRAME_MS, Some(&tracker));

        let events = physics::step(&mut arena, 1.0);
        if let Some(scorer) = events.goal_scored {
            info!(side = %scorer, left = arena.score(Side::Left), right = arena.score(Side::Right), "goal");
        }
        if events.round_over {
            left.reset_round();
            right.reset_round();
            tracker.reset();
            arena.center_launchers();
        }
    }

    let (l, r) = (arena.stats(Side::Left), arena.stats(Side::Right));
    info!(
        left_score = l.score,
        right_score = r.score,
        rounds = arena.rounds_played,
        "duel finished"
    );

    println!("Final score  {} - {}", l.score, r.score);
    println!(
        "Left  ({:<16}) shots {:>3}  reloads {:>3}  ammo {:>2}",
        left.personality().profile().name,
        l.shots_fired,
        l.reloads,
        l.ammo
    );
    println!(
        "Right ({:<16}) shots {:>3}  reloads {:>3}  ammo {:>2}",
        right.personality().profile().name,
        r.shots_fired,
        r.reloads,
        r.ammo
    );
    println!("Rounds completed: {}", arena.rounds_played);
}
