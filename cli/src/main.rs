//! Gambit CLI - headless match replays and rarity lookups.
//!
//! ```text
//! gambit replay <script.json> [--config <path>] [--owner <wallet>]
//! gambit classify <trait-count> <games-played>
//! ```
//!
//! `replay` spawns the script's roster, resolves each capture in order and
//! prints one JSON outcome per line. Under the complexity economy captures go
//! straight through the resolver; under the gas economy each one is offered to
//! a scripted player through the decision gate. Logs go to stderr.

mod script;

use std::{
    env,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use gambit_engine::{
    CaptureError, CaptureResolver, Economy, EngineConfig, EvolutionDecision, EvolutionDecisionGate,
    EvolutionOutcome, GateError, Inventory, MatchId, MatchState, NullBoard, TracingTelemetry, UnitId,
};

use crate::script::{Script, ScriptedPlayer};

const USAGE: &str = "usage:
  gambit replay <script.json> [--config <path>] [--owner <wallet>]
  gambit classify <trait-count> <games-played>";

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::try_new("warn").expect("warn filter is valid"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter)
        .init();
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Replay {
        script: PathBuf,
        config: Option<PathBuf>,
        owner: String,
    },
    Classify {
        trait_count: usize,
        games_played: u32,
    },
}

impl Command {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self> {
        match args.next().as_deref() {
            Some("replay") => {
                let mut script = None;
                let mut config = None;
                let mut owner = String::from("local");
                while let Some(arg) = args.next() {
                    match arg.as_str() {
                        "--config" => {
                            config = Some(PathBuf::from(args.next().context("--config needs a path")?));
                        }
                        "--owner" => owner = args.next().context("--owner needs a value")?,
                        other if script.is_none() => script = Some(PathBuf::from(other)),
                        other => bail!("unexpected argument {other:?}\n{USAGE}"),
                    }
                }
                Ok(Command::Replay {
                    script: script.context(USAGE)?,
                    config,
                    owner,
                })
            }
            Some("classify") => {
                let trait_count = args
                    .next()
                    .context(USAGE)?
                    .parse()
                    .context("trait count must be a number")?;
                let games_played = args
                    .next()
                    .context(USAGE)?
                    .parse()
                    .context("games played must be a number")?;
                Ok(Command::Classify {
                    trait_count,
                    games_played,
                })
            }
            _ => bail!(USAGE),
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => Ok(EngineConfig::load_from(path)?),
        None => Ok(EngineConfig::load()?.unwrap_or_default()),
    }
}

fn emit(out: &mut impl Write, outcome: &EvolutionOutcome) -> Result<()> {
    serde_json::to_writer(&mut *out, outcome)?;
    writeln!(out)?;
    Ok(())
}

async fn replay(script_path: &Path, config: &EngineConfig, owner: &str) -> Result<()> {
    let script = Script::load(script_path)?;
    let rules = config.rules();
    let economy = rules.economy;
    let timeout = rules.decision_timeout;
    let mut game = MatchState::new(MatchId::new(1), rules);
    script.populate(&mut game)?;
    tracing::info!(
        match_id = %game.id(),
        units = script.units.len(),
        captures = script.captures.len(),
        ?economy,
        "Replay started"
    );

    let mut out = io::stdout().lock();
    let mut resolver = CaptureResolver::new(NullBoard, TracingTelemetry);
    match economy {
        Economy::Complexity => {
            for (event, _) in script.events() {
                match resolver.resolve(&mut game, event) {
                    Ok(outcome) => emit(&mut out, &outcome)?,
                    // Blocked gain: the capture still happened.
                    Err(CaptureError::InsufficientBudget { outcome, .. }) => emit(&mut out, &outcome)?,
                    Err(err) => tracing::warn!(capture = %event.capture_id, "Capture rejected: {err}"),
                }
                game.tick_decay(event.turn);
            }
        }
        Economy::Gas => {
            let mut gate = EvolutionDecisionGate::new(resolver);
            for (event, decision) in script.events() {
                let mut player = ScriptedPlayer::new(decision);
                match gate.decide(&mut game, event, &mut player, timeout).await {
                    Ok(outcome) => emit(&mut out, &outcome)?,
                    Err(GateError::InsufficientBudget { budget, .. }) => {
                        // The board already committed to the capture; finish it without a gain.
                        tracing::warn!(capture = %event.capture_id, "Decision rejected: {budget}");
                        let outcome =
                            gate.submit(&mut game, event.capture_id, EvolutionDecision::Skip)?;
                        emit(&mut out, &outcome)?;
                    }
                    Err(err) => tracing::warn!(capture = %event.capture_id, "Capture rejected: {err}"),
                }
                game.tick_decay(event.turn);
            }
        }
    }

    if script.save.is_empty() {
        return Ok(());
    }
    let mut inventory = Inventory::new(owner, config.max_slots());
    for &index in &script.save {
        let Some(profile) = game.profile(UnitId::new(index)) else {
            bail!("unit {index} is not in the match");
        };
        let piece = inventory
            .save(profile, 1, None)
            .with_context(|| format!("failed to save unit {index}"))?;
        tracing::info!(unit = index, %piece, "Piece saved");
    }
    for record in inventory.pieces() {
        serde_json::to_writer(&mut out, record)?;
        writeln!(out)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    match Command::parse(env::args().skip(1))? {
        Command::Replay {
            script,
            config,
            owner,
        } => {
            let config = load_config(config.as_deref())?;
            replay(&script, &config, &owner).await
        }
        Command::Classify {
            trait_count,
            games_played,
        } => {
            let tier = gambit_core::classify(trait_count, games_played);
            println!("{tier}");
            Ok(())
        }
    }
}
