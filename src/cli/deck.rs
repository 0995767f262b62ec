use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use partycards::{DeckPayload, normalize_payload, read_csv};

use crate::cli::utils::format_listing;

#[derive(Subcommand, Debug)]
pub enum DeckCommand {
    /// Print the normalized cards of a CSV deck or a saved JSON payload.
    Show(DeckShowArgs),
}

#[derive(Args, Debug)]
pub struct DeckShowArgs {
    /// `.csv` deck or `.json` remote payload.
    pub path: PathBuf,
}

pub fn handle(cmd: DeckCommand) -> Result<()> {
    match cmd {
        DeckCommand::Show(args) => show(args),
    }
}

fn show(args: DeckShowArgs) -> Result<()> {
    let is_json = args
        .path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let records = if is_json {
        let raw = fs::read_to_string(&args.path)
            .with_context(|| format!("failed to read {}", args.path.display()))?;
        let payload: DeckPayload = serde_json::from_str(&raw)
            .with_context(|| format!("invalid deck payload in {}", args.path.display()))?;
        let id = args
            .path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        normalize_payload(&id, &payload)?
    } else {
        read_csv(&args.path)?
    };
    print!("{}", format_listing(&records));
    Ok(())
}
