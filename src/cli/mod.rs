//! Command-line interface wiring for the `cards` binary.
//!
//! This module owns the clap definitions and delegates execution to
//! specialized submodules that encapsulate each command family.

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod assets;
pub mod build;
pub mod common;
pub mod deck;
pub mod render;
pub mod sheet;
pub mod utils;

/// Parsed CLI entrypoint for the `cards` binary.
#[derive(Parser, Debug)]
#[command(name = "cards", version, about = "Party card deck renderer and sheet packer")]
pub struct Cli {
    /// Log per-card detail (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// Top-level command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// High-level command families made available to end users.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build every deck found in the input directory and any remote decks.
    Build(build::BuildArgs),
    /// Render a single card image.
    Render(render::RenderArgs),
    /// Pack an existing directory of rendered cards into sheets.
    Sheet(sheet::SheetArgs),
    /// Inspect deck sources.
    #[command(subcommand)]
    Deck(deck::DeckCommand),
    /// Manage template images.
    #[command(subcommand)]
    Assets(assets::AssetsCommand),
}

/// Execute the requested command.
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Build(args) => build::handle(args),
        Command::Render(args) => render::handle(args),
        Command::Sheet(args) => sheet::handle(args),
        Command::Deck(cmd) => deck::handle(cmd),
        Command::Assets(cmd) => assets::handle(cmd),
    }
}
