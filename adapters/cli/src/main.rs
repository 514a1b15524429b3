#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for the Warpflow rules engine.
//!
//! Replays the tutorial, previews a ship's options from a snapshot file and
//! converts map layouts to and from transfer strings.

mod ascii;
mod map_transfer;
mod preview;
mod walkthrough;

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use env_logger::{Builder, Env};
use warpflow_core::{GameSnapshot, Position, ShipId, Side};

use crate::{map_transfer::MapTransfer, preview::PreviewRequest};

/// Warpflow grid combat rules engine.
#[derive(Debug, Parser)]
#[command(name = "warpflow", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Plays the scripted tutorial through the scenario gate
    Tutorial {
        /// Skip the grid printed before every step change
        #[arg(long)]
        no_grid: bool,
    },
    /// Selects a ship from a snapshot and prints its options
    Preview {
        /// JSON game snapshot
        #[arg(long)]
        snapshot: PathBuf,
        /// Ship to select
        #[arg(long)]
        ship: u64,
        /// Side the preview is computed for
        #[arg(long, value_enum, default_value_t = ActingSide::Creator)]
        acting: ActingSide,
        /// Aim with the special ability
        #[arg(long)]
        special: bool,
        /// Stage a move to ROW,COL before targeting
        #[arg(long, value_parser = parse_position)]
        stage: Option<Position>,
        /// Ship to pick as the target
        #[arg(long)]
        target: Option<u64>,
        /// Let repairs restore disabled ships
        #[arg(long)]
        repair_disabled: bool,
    },
    /// Converts map layouts to and from transfer strings
    Map {
        #[command(subcommand)]
        command: MapCommand,
    },
}

#[derive(Debug, Subcommand)]
enum MapCommand {
    /// Prints the transfer string of a snapshot's map
    Encode {
        /// JSON game snapshot
        #[arg(long)]
        snapshot: PathBuf,
    },
    /// Prints the map layout stored in a transfer string as JSON
    Decode {
        /// Transfer string produced by `map encode`
        value: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ActingSide {
    Creator,
    Joiner,
}

impl From<ActingSide> for Side {
    fn from(side: ActingSide) -> Self {
        match side {
            ActingSide::Creator => Side::Creator,
            ActingSide::Joiner => Side::Joiner,
        }
    }
}

/// Entry point for the Warpflow command-line interface.
fn main() -> Result<()> {
    let _ = Builder::from_env(Env::default().default_filter_or("info")).try_init();
    let cli = Cli::parse();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Tutorial { no_grid } => {
            let summary = walkthrough::run(&mut out, !no_grid)?;
            writeln!(
                out,
                "\nfinished on step {} with {} refused inputs, creator {} joiner {}",
                summary.final_step + 1,
                summary.rejections,
                summary.scores.creator,
                summary.scores.joiner
            )
            .context("failed to write tutorial summary")?;
        }
        Commands::Preview {
            snapshot,
            ship,
            acting,
            special,
            stage,
            target,
            repair_disabled,
        } => {
            let request = PreviewRequest {
                snapshot: load_snapshot(&snapshot)?,
                ship: ShipId::new(ship),
                acting: acting.into(),
                special,
                stage,
                target: target.map(ShipId::new),
                repair_disabled,
            };
            preview::run(&mut out, &request)?;
        }
        Commands::Map {
            command: MapCommand::Encode { snapshot },
        } => {
            let snapshot = load_snapshot(&snapshot)?;
            let encoded = MapTransfer::new(snapshot.dimensions, &snapshot.layout).encode()?;
            writeln!(out, "{encoded}").context("failed to write transfer string")?;
        }
        Commands::Map {
            command: MapCommand::Decode { value },
        } => {
            let transfer = MapTransfer::decode(&value)?;
            let json = serde_json::to_string_pretty(&transfer.layout)
                .context("failed to serialise map layout")?;
            writeln!(
                out,
                "{}x{}\n{json}",
                transfer.dimensions.width(),
                transfer.dimensions.height()
            )
            .context("failed to write map layout")?;
        }
    }
    Ok(())
}

fn load_snapshot(path: &Path) -> Result<GameSnapshot> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse snapshot {}", path.display()))
}

fn parse_position(value: &str) -> Result<Position, String> {
    let (row, col) = value
        .split_once(',')
        .ok_or_else(|| format!("expected ROW,COL but got '{value}'"))?;
    let row = row
        .trim()
        .parse::<u32>()
        .map_err(|error| format!("invalid row '{row}': {error}"))?;
    let col = col
        .trim()
        .parse::<u32>()
        .map_err(|error| format!("invalid column '{col}': {error}"))?;
    Ok(Position::new(row, col))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn positions_parse_from_row_and_column() {
        assert_eq!(parse_position("5, 8"), Ok(Position::new(5, 8)));
        assert!(parse_position("5").is_err());
        assert!(parse_position("a,1").is_err());
    }

    #[test]
    fn preview_arguments_are_parsed() {
        let cli = Cli::try_parse_from([
            "warpflow",
            "preview",
            "--snapshot",
            "battle.json",
            "--ship",
            "1001",
            "--acting",
            "joiner",
            "--stage",
            "5,8",
        ])
        .expect("arguments parse");
        match cli.command {
            Commands::Preview {
                ship,
                acting,
                stage,
                special,
                ..
            } => {
                assert_eq!(ship, 1001);
                assert_eq!(Side::from(acting), Side::Joiner);
                assert_eq!(stage, Some(Position::new(5, 8)));
                assert!(!special);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
