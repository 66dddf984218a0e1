use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use cogni_core::ScoreReport;
use cogni_games::{DualTaskGame, GamesConfig, RotationGame, SequenceGame, VigilanceGame};
use serde::Serialize;
use tracing::{info, info_span};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod player;
mod session;

use player::{DualTaskPlayer, RotationPlayer, SequencePlayer, VigilancePlayer};
use session::HostClock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
enum GameChoice {
    Sequence,
    Vigilance,
    DualTask,
    Rotation,
    All,
}

impl GameChoice {
    fn expand(self) -> Vec<GameChoice> {
        match self {
            GameChoice::All => vec![
                GameChoice::Sequence,
                GameChoice::Vigilance,
                GameChoice::DualTask,
                GameChoice::Rotation,
            ],
            one => vec![one],
        }
    }

    fn name(self) -> &'static str {
        match self {
            GameChoice::Sequence => "sequence",
            GameChoice::Vigilance => "vigilance",
            GameChoice::DualTask => "dual-task",
            GameChoice::Rotation => "rotation",
            GameChoice::All => "all",
        }
    }
}

/// Runs the cognitive mini-games headless against simulated players.
#[derive(Parser, Debug)]
#[command(name = "cognitive-games", version, about)]
struct Cli {
    /// Which game to run
    #[arg(long, value_enum, default_value_t = GameChoice::All)]
    game: GameChoice,

    /// Engine seed; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Simulated player quality, 0 (weak) to 1 (strong)
    #[arg(long, default_value_t = 0.8)]
    skill: f64,

    /// JSON file overriding the default difficulty tables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Host frame length in milliseconds
    #[arg(long, default_value_t = 16, value_parser = clap::value_parser!(u64).range(1..=250))]
    step_ms: u64,

    /// Pace sessions with the wall clock instead of simulating time
    #[arg(long)]
    realtime: bool,

    /// Print reports as JSON
    #[arg(long)]
    json: bool,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[derive(Debug, Serialize)]
struct SessionOutput {
    game: GameChoice,
    seed: u64,
    report: ScoreReport,
}

fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log level '{level}'"))?;
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .try_init()?;
    }
    Ok(())
}

fn run_game(
    choice: GameChoice,
    config: &GamesConfig,
    seed: u64,
    skill: f64,
    clock: &mut HostClock,
    step_ms: u64,
) -> Result<ScoreReport> {
    let _span = info_span!("session", game = choice.name(), seed).entered();
    // separate stream from the engine's
    let player_seed = seed.rotate_left(17) ^ 0x5eed;
    match choice {
        GameChoice::Sequence => session::run(
            SequenceGame::new(config.sequence.clone()),
            &mut SequencePlayer::new(skill, player_seed),
            seed,
            clock,
            step_ms,
        ),
        GameChoice::Vigilance => session::run(
            VigilanceGame::new(config.vigilance.clone()),
            &mut VigilancePlayer::new(skill, player_seed),
            seed,
            clock,
            step_ms,
        ),
        GameChoice::DualTask => session::run(
            DualTaskGame::new(config.dual_task.clone()),
            &mut DualTaskPlayer::new(skill, player_seed),
            seed,
            clock,
            step_ms,
        ),
        GameChoice::Rotation => session::run(
            RotationGame::new(config.rotation.clone()),
            &mut RotationPlayer::new(skill, player_seed),
            seed,
            clock,
            step_ms,
        ),
        GameChoice::All => bail!("'all' names several games and must be expanded first"),
    }
}

fn print_table(outputs: &[SessionOutput]) {
    println!(
        "{:<10} {:<19} {:>5} {:>9} {:>9} {:>7}  label",
        "game", "domain", "score", "accuracy", "mean rt", "trials"
    );
    for out in outputs {
        let r = &out.report;
        let rt = r
            .mean_reaction_ms
            .map_or_else(|| "-".to_string(), |ms| format!("{ms:.0}ms"));
        println!(
            "{:<10} {:<19} {:>5} {:>8.1}% {:>9} {:>7}  {}",
            out.game.name(),
            r.domain.as_str(),
            r.score,
            r.accuracy,
            rt,
            r.trials,
            r.label
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_json)?;

    let config = match &cli.config {
        Some(path) => GamesConfig::load(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => GamesConfig::default(),
    };
    let seed = cli.seed.unwrap_or_else(rand::random);
    info!(seed, skill = cli.skill, realtime = cli.realtime, "starting");

    let mut clock = HostClock::new(cli.realtime);
    let mut outputs = Vec::new();
    for (i, choice) in cli.game.expand().into_iter().enumerate() {
        let game_seed = seed.wrapping_add(i as u64);
        let report = run_game(
            choice,
            &config,
            game_seed,
            cli.skill,
            &mut clock,
            cli.step_ms,
        )
        .with_context(|| format!("{} session failed", choice.name()))?;
        outputs.push(SessionOutput {
            game: choice,
            seed: game_seed,
            report,
        });
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outputs)?);
    } else {
        print_table(&outputs);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn all_expands_to_every_game() {
        assert_eq!(GameChoice::All.expand().len(), 4);
        assert_eq!(GameChoice::Rotation.expand(), vec![GameChoice::Rotation]);
    }

    #[test]
    fn step_is_bounded() {
        let zero_step = ["cognitive-games", "--step-ms", "0"];
        assert!(Cli::try_parse_from(zero_step).is_err());
        let args = ["cognitive-games", "--game", "dual-task", "--seed", "4"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.game, GameChoice::DualTask);
        assert_eq!(cli.seed, Some(4));
    }
}
