use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use kalah_agent::ai::{Agent, RandomAgent};
use kalah_agent::config::AppConfig;
use kalah_agent::session::Session;

/// Play Kalah over the line protocol on stdin/stdout.
#[derive(Parser)]
#[command(name = "kalah-agent", about = "Kalah agent speaking the engine protocol on stdin/stdout")]
struct Cli {
    /// Agent to play with: minimax or random
    #[arg(long, default_value = "minimax")]
    agent: String,

    /// Path to TOML configuration file
    #[arg(long, default_value = "kalah.toml")]
    config: PathBuf,

    /// Override search depth
    #[arg(long)]
    depth: Option<usize>,

    /// Override the per-move time limit in milliseconds
    #[arg(long)]
    time_limit_ms: Option<u64>,

    /// Search to full depth without a time limit
    #[arg(long, conflicts_with = "time_limit_ms")]
    no_time_limit: bool,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    dump_config: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.dump_config {
        print!("{}", AppConfig::default_toml().context("serializing default config")?);
        return Ok(());
    }

    kalah_agent::init_logging("warn");

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    // Apply CLI overrides
    if let Some(depth) = cli.depth {
        config.search.depth = depth;
    }
    if let Some(ms) = cli.time_limit_ms {
        config.search.time_limit_ms = Some(ms);
    }
    if cli.no_time_limit {
        config.search.time_limit_ms = None;
    }
    config.validate().context("invalid configuration")?;

    let agent: Box<dyn Agent> = match cli.agent.as_str() {
        "minimax" => Box::new(config.search.build_agent(&config.heuristic)),
        "random" => Box::new(RandomAgent::new()),
        other => bail!("unknown agent '{}' (expected 'minimax' or 'random')", other),
    };

    let mut session = Session::new(agent, config.game.holes, config.game.seeds)
        .context("creating session")?;
    let stdin = io::stdin();
    session
        .run(stdin.lock(), io::stdout().lock())
        .context("talking to the game engine")?;
    Ok(())
}
