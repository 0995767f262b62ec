use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use partycards::{CardRecord, DeckMetadata, load_image};

use crate::cli::common::{AssetArgs, CardKindArg};

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Card kind to render.
    #[arg(long, value_enum, default_value_t = CardKindArg::Primary)]
    pub kind: CardKindArg,
    /// Card text; blanks are written as `_______`.
    #[arg(long)]
    pub text: String,
    /// Number of responses the prompt asks for.
    #[arg(long, default_value_t = 1)]
    pub pick: u32,
    /// Deck name used for the subtitle.
    #[arg(long, default_value = "")]
    pub deck_name: String,
    /// Draw the subtitle patch and deck name.
    #[arg(long)]
    pub subtitle: bool,
    /// Icon stamped over the icon patch.
    #[arg(long)]
    pub icon: Option<PathBuf>,
    #[command(flatten)]
    pub assets: AssetArgs,
    /// Output PNG path.
    #[arg(short, long, default_value = "card.png")]
    pub output: PathBuf,
}

pub fn handle(args: RenderArgs) -> Result<()> {
    let record = CardRecord::new(args.kind.into(), args.text, args.pick)?;
    let deck = DeckMetadata {
        enable_subtitle: args.subtitle,
        ..DeckMetadata::named(args.deck_name)
    };
    let icon = args.icon.as_deref().map(load_image).transpose()?;
    let composer = args.assets.composer()?;
    let path = composer
        .compose_to(&record, &deck, icon.as_ref(), &args.output)
        .with_context(|| format!("failed to render {}", args.output.display()))?;
    println!("Wrote {} card to {}", record.kind, path.display());
    Ok(())
}
