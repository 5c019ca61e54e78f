//! # Delve Main Entry Point
//!
//! Builds a session from the command line, feeds it key presses from a script
//! or from standard input, and prints the screen after every batch.

use clap::Parser;
use delve::{
    AbilityScores, Character, CharacterClass, Dice, DelveError, DelveResult,
    DungeonDefinition, GameConfig, GameSession, InputHandler, Key, LevelCache, Party, TextDisplay,
};
use std::io::BufRead;
use std::path::{Path, PathBuf};
#[cfg(feature = "dev-tools")]
use tracing::{info, warn};

#[cfg(not(feature = "dev-tools"))]
use log::{info, warn};

/// Command line arguments for Delve.
#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(about = "A turn-based, tile-grid dungeon crawl")]
#[command(version)]
struct Args {
    /// Random seed for dungeon generation and dice
    #[arg(short, long)]
    seed: Option<u64>,

    /// Level width in tiles
    #[arg(long)]
    width: Option<u32>,

    /// Level height in tiles
    #[arg(long)]
    height: Option<u32>,

    /// Room placement attempts per level
    #[arg(long)]
    max_rooms: Option<u32>,

    /// Smallest room edge
    #[arg(long)]
    min_room_size: Option<u32>,

    /// Largest room edge
    #[arg(long)]
    max_room_size: Option<u32>,

    /// Predefined dungeon file (JSON)
    #[arg(short, long)]
    dungeon: Option<PathBuf>,

    /// Configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Generate levels and write them as a dungeon file instead of playing
    #[arg(long)]
    export: Option<PathBuf>,

    /// Number of levels to generate with --export
    #[arg(long, default_value_t = 3)]
    levels: u32,

    /// Key presses to replay instead of reading standard input
    #[arg(long)]
    script: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() {
    let args = Args::parse();
    initialize_logging(&args.log_level);

    if let Err(e) = run(&args) {
        eprintln!("delve: {}", e);
        std::process::exit(1);
    }
}

/// Initializes the logging system based on the specified log level.
fn initialize_logging(log_level: &str) {
    #[cfg(feature = "dev-tools")]
    {
        let filter = tracing_subscriber::EnvFilter::try_new(log_level)
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    #[cfg(not(feature = "dev-tools"))]
    {
        env_logger::Builder::new()
            .parse_filters(log_level)
            .parse_default_env()
            .init();
    }
}

fn run(args: &Args) -> DelveResult<()> {
    info!("Starting Delve v{}", delve::VERSION);
    let config = build_config(args)?;
    let seed = config.generation.seed;

    if let Some(path) = &args.export {
        return export_levels(&config, args.levels, path);
    }

    let dice = Dice::seeded(seed.wrapping_add(1));
    let session = match &args.dungeon {
        Some(path) => {
            let dungeon = DungeonDefinition::load(path)?;
            GameSession::start_with_dungeon(default_party(), config, &dungeon, dice)?
        }
        None => GameSession::start(default_party(), config, dice)?,
    };

    match &args.script {
        Some(script) => replay(session, std::iter::once(script.clone())),
        None => {
            let stdin = std::io::stdin();
            let lines = stdin.lock().lines().map_while(Result::ok);
            replay(session, lines)
        }
    }
}

/// Layers the config file, then individual flags, over the defaults.
fn build_config(args: &Args) -> DelveResult<GameConfig> {
    let mut config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };

    config.generation.seed = args.seed.unwrap_or(config.generation.seed);
    if let Some(width) = args.width {
        config.generation.width = width;
    }
    if let Some(height) = args.height {
        config.generation.height = height;
    }
    if let Some(max_rooms) = args.max_rooms {
        config.generation.max_rooms = max_rooms;
    }
    if let Some(size) = args.min_room_size {
        config.generation.min_room_size = size;
    }
    if let Some(size) = args.max_room_size {
        config.generation.max_room_size = size;
    }

    config.validate()?;
    Ok(config)
}

/// A balanced four-member starting party.
fn default_party() -> Party {
    let mut party = Party::new();
    party.add_member(Character::new(
        "Brunhild",
        CharacterClass::Fighter,
        1,
        AbilityScores::new(16, 12, 15, 10, 11, 9),
    ));
    party.add_member(Character::new(
        "Tamsin",
        CharacterClass::Rogue,
        1,
        AbilityScores::new(11, 16, 12, 13, 10, 12),
    ));
    party.add_member(Character::new(
        "Oswin",
        CharacterClass::Cleric,
        1,
        AbilityScores::new(13, 10, 14, 10, 16, 12),
    ));
    party.add_member(Character::new(
        "Ysolde",
        CharacterClass::Wizard,
        1,
        AbilityScores::new(8, 14, 12, 17, 12, 10),
    ));
    party
}

/// Generates `count` levels and saves them as a dungeon file.
fn export_levels(config: &GameConfig, count: u32, path: &Path) -> DelveResult<()> {
    let mut cache = LevelCache::new(config.generation.clone(), config.population.clone());
    let mut dice = Dice::seeded(config.generation.seed);
    let mut definitions = Vec::new();
    for number in 1..=count.max(1) {
        definitions.push(cache.get_or_create(number, &mut dice)?.to_definition());
    }
    DungeonDefinition::new(definitions).save(path)?;
    println!("Wrote {} levels to {}", count.max(1), path.display());
    Ok(())
}

/// Applies each batch of keys, printing the screen after every batch.
fn replay(mut session: GameSession, batches: impl Iterator<Item = String>) -> DelveResult<()> {
    let input_handler = InputHandler::new();
    let mut display = TextDisplay::default();
    println!("{}", display.render_game(&session)?);

    let mut stopped_early = false;
    'batches: for batch in batches {
        for key in Key::parse_stream(&batch) {
            let Some(command) = input_handler.command_for(key, &session.input_context()) else {
                continue;
            };
            if command.is_quit() {
                info!("Player quit the game");
                stopped_early = true;
                break 'batches;
            }
            match session.apply(command) {
                Ok(_) => {}
                Err(DelveError::InvalidAction(reason)) => {
                    warn!("ignored {:?}: {}", command, reason)
                }
                Err(e) => return Err(e),
            }
            if session.is_finished() {
                stopped_early = true;
                break 'batches;
            }
        }
        println!("{}", display.render_game(&session)?);
    }

    if stopped_early {
        println!("{}", display.render_game(&session)?);
    }
    Ok(())
}
