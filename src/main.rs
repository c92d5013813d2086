//! Pipeflow - terminal front end for the pipe-network water puzzle.
//!
//! Rotate and swap pipes until water flows from the source to the tank,
//! before the clock runs out and without leaving any pipe spilling.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod cli;
mod console;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use console::PlayerCommand;
use pipeflow_engine::{
    DriverError, GameConfig, InteractionOutcome, PuzzleSession, SessionDriver, SessionEvent,
    SessionHandle, random_fact,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never interleave with the board.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Levels { config } => list_levels(config),
        Command::Play {
            level,
            seed,
            config,
        } => play(level, seed, config).await,
    }
}

/// Loads the configuration file, or the built-in catalog when none is given.
#[instrument]
fn load_config(path: Option<PathBuf>) -> Result<GameConfig> {
    match path {
        Some(path) => Ok(GameConfig::from_file(&path)?),
        None => {
            debug!("Using built-in level catalog");
            Ok(GameConfig::default())
        }
    }
}

/// Print the level catalog
#[instrument]
fn list_levels(config: Option<PathBuf>) -> Result<()> {
    let config = load_config(config)?;
    for level in config.levels() {
        println!("{}", console::render_level(level));
    }
    Ok(())
}

/// Play interactively on stdin/stdout
#[instrument]
async fn play(level: usize, seed: Option<u64>, config: Option<PathBuf>) -> Result<()> {
    let mut config = load_config(config)?;
    if seed.is_some() {
        config = config.with_seed(seed);
    }
    let catalog = config.levels().clone();

    info!(level, "Starting interactive game");
    let (handle, mut events, task) = SessionDriver::spawn(PuzzleSession::new(config));
    let mut screen = Screen {
        handle: handle.clone(),
        catalog,
        facts: seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64),
    };

    let started = handle.start(level).await;
    screen.transition(started).await?;
    println!("Type `help` for commands.");
    screen.prompt().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match console::parse(&line) {
                    Ok(PlayerCommand::Quit) => break,
                    Ok(command) => screen.execute(command).await?,
                    Err(console::ParseError::Empty) => {}
                    Err(err) => println!("{err}. Type `help` for commands."),
                }
                screen.prompt().await?;
            }
            Some(event) = events.recv() => {
                println!();
                screen.announce(&event).await?;
                screen.prompt().await?;
            }
        }
    }

    drop(screen);
    drop(handle);
    task.await?;
    info!("Game closed");
    Ok(())
}

/// Terminal output state for one interactive game.
struct Screen {
    handle: SessionHandle,
    catalog: Vec<pipeflow_engine::LevelConfig>,
    /// Picks the fact under each banner; seeded along with the grids.
    facts: StdRng,
}

impl Screen {
    #[instrument(skip(self))]
    async fn execute(&mut self, command: PlayerCommand) -> Result<()> {
        match command {
            PlayerCommand::Rotate(at) => {
                let outcome = self.handle.rotate(at).await?;
                self.outcome(outcome).await
            }
            PlayerCommand::Swap(a, b) => {
                let outcome = self.handle.swap(a, b).await?;
                self.outcome(outcome).await
            }
            PlayerCommand::Shuffle => {
                let outcome = self.handle.shuffle().await?;
                self.outcome(outcome).await
            }
            PlayerCommand::Restart => {
                let result = self.handle.restart().await;
                self.transition(result).await
            }
            PlayerCommand::Next => {
                let result = self.handle.next_level().await;
                self.transition(result).await
            }
            PlayerCommand::Level(level) => {
                let result = self.handle.start(level).await;
                self.transition(result).await
            }
            PlayerCommand::Menu => {
                self.handle.exit_to_menu().await?;
                self.show().await
            }
            PlayerCommand::Show => self.show().await,
            PlayerCommand::Help => {
                println!("{}", console::HELP);
                Ok(())
            }
            PlayerCommand::Quit => Ok(()),
        }
    }

    /// Completion events are announced by the event loop, so only the
    /// other outcomes redraw here.
    async fn outcome(&mut self, outcome: InteractionOutcome) -> Result<()> {
        match outcome {
            InteractionOutcome::Applied { event: Some(_) } => Ok(()),
            InteractionOutcome::Applied { event: None } => self.show().await,
            InteractionOutcome::Ignored(rejection) => {
                println!("Ignored: {rejection}");
                Ok(())
            }
        }
    }

    async fn transition(
        &mut self,
        result: Result<Option<SessionEvent>, DriverError>,
    ) -> Result<()> {
        match result {
            Ok(Some(_)) => Ok(()),
            Ok(None) => self.show().await,
            Err(DriverError::Session(err)) => {
                println!("{err}");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn announce(&mut self, event: &SessionEvent) -> Result<()> {
        self.show().await?;
        println!("{}", console::render_event(event, random_fact(&mut self.facts)));
        Ok(())
    }

    async fn show(&self) -> Result<()> {
        let snapshot = self.handle.snapshot().await?;
        println!("{}", console::render_snapshot(&snapshot, &self.catalog));
        Ok(())
    }

    async fn prompt(&self) -> Result<()> {
        let snapshot = self.handle.snapshot().await?;
        print!("{}", console::prompt(snapshot.hud.state));
        std::io::stdout().flush()?;
        Ok(())
    }
}
