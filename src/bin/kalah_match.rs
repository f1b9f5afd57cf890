use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use kalah_agent::ai::{Agent, RandomAgent};
use kalah_agent::arbiter::{InProcessPeer, MatchOutcome, Peer, ProcessPeer, TurnArbiter};
use kalah_agent::config::AppConfig;
use kalah_agent::game::Side;

/// Referee Kalah matches between a local agent and an opponent.
#[derive(Parser)]
#[command(name = "kalah-match", about = "Play Kalah matches against an opponent program")]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "kalah.toml")]
    config: PathBuf,

    /// Opponent command line; the built-in opponent is used when absent
    #[arg(long)]
    opponent: Option<String>,

    /// Built-in opponent: minimax or random
    #[arg(long, default_value = "random")]
    builtin: String,

    /// Local agent: minimax or random
    #[arg(long, default_value = "minimax")]
    agent: String,

    /// Side the local agent starts on: south or north
    #[arg(long)]
    side: Option<String>,

    /// Override search depth
    #[arg(long)]
    depth: Option<usize>,

    /// Number of matches to play
    #[arg(long, default_value_t = 1)]
    games: usize,
}

fn build_agent(kind: &str, config: &AppConfig) -> Result<Box<dyn Agent>> {
    Ok(match kind {
        "minimax" => Box::new(config.search.build_agent(&config.heuristic)),
        "random" => Box::new(RandomAgent::new()),
        other => bail!("unknown agent '{}' (expected 'minimax' or 'random')", other),
    })
}

#[derive(Default)]
struct Tally {
    wins: usize,
    draws: usize,
    losses: usize,
    forfeits: usize,
}

/// Play `games` matches, building a fresh peer for each one.
fn play_matches<P, F>(
    config: &AppConfig,
    local: &mut dyn Agent,
    games: usize,
    mut make_peer: F,
) -> Result<Tally>
where
    P: Peer,
    F: FnMut() -> Result<P>,
{
    let mut arbiter = TurnArbiter::new(config.arbiter.clone(), config.game.holes, config.game.seeds);
    let mut tally = Tally::default();

    for game in 1..=games {
        let peer = make_peer()?;
        let played = arbiter.reset(peer).and_then(|_| {
            while let Some(position) = arbiter.position() {
                let Some(action) = local.select_action(&position) else {
                    break;
                };
                arbiter.step(action)?;
            }
            Ok(())
        });
        if let Err(e) = played {
            println!("game {game}: {e}");
        }

        let Some(outcome) = arbiter.outcome() else {
            bail!("game {game} stopped before it was over");
        };
        let (local_moves, peer_moves) = arbiter
            .game()
            .map(|g| g.moves_by_party())
            .unwrap_or_default();
        let (local_ms, peer_ms) = arbiter
            .game()
            .map(|g| g.millis_per_move())
            .unwrap_or_default();
        match outcome {
            MatchOutcome::Completed { score } => {
                println!(
                    "game {game}: score {score:+} (local: {local_moves} moves, {local_ms} ms per move; \
                     opponent: {peer_moves} moves, {peer_ms} ms per move)"
                );
                match score {
                    s if s > 0 => tally.wins += 1,
                    0 => tally.draws += 1,
                    _ => tally.losses += 1,
                }
            }
            MatchOutcome::ProtocolViolation { score } | MatchOutcome::Aborted { score } => {
                println!("game {game}: opponent forfeited at score {score:+}");
                tally.forfeits += 1;
            }
        }
        if let Some(g) = arbiter.game() {
            info!("final board\n{}", g.board());
        }
    }
    Ok(tally)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    kalah_agent::init_logging("info");

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    // Apply CLI overrides
    if let Some(depth) = cli.depth {
        config.search.depth = depth;
    }
    if cli.opponent.is_some() {
        config.arbiter.opponent = cli.opponent.clone();
    }
    if let Some(side) = cli.side.as_deref() {
        config.arbiter.agent_side = match side {
            "south" => Side::South,
            "north" => Side::North,
            other => bail!("unknown side '{}' (expected 'south' or 'north')", other),
        };
    }
    config.validate().context("invalid configuration")?;

    let mut local = build_agent(&cli.agent, &config)?;
    let tally = match config.arbiter.opponent.clone() {
        Some(command) => play_matches(&config, local.as_mut(), cli.games, || {
            ProcessPeer::spawn(&command)
                .with_context(|| format!("starting opponent '{command}'"))
        })?,
        None => {
            let (holes, seeds) = (config.game.holes, config.game.seeds);
            play_matches(&config, local.as_mut(), cli.games, || {
                let opponent = build_agent(&cli.builtin, &config)?;
                InProcessPeer::new(opponent, holes, seeds).context("creating built-in opponent")
            })?
        }
    };

    println!(
        "{} wins, {} draws, {} losses, {} forfeits",
        tally.wins, tally.draws, tally.losses, tally.forfeits
    );
    Ok(())
}
