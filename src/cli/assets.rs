use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use partycards::{
    CardLayout, DEFAULT_CARD_HEIGHT, DEFAULT_CARD_WIDTH, SheetSpec, scaffold_assets,
};

use crate::cli::common::GridArgs;

#[derive(Subcommand, Debug)]
pub enum AssetsCommand {
    /// Generate a default set of template images.
    Init(AssetsInitArgs),
}

#[derive(Args, Debug)]
pub struct AssetsInitArgs {
    /// Destination directory.
    #[arg(default_value = "cardassets")]
    pub dir: PathBuf,
    #[arg(long, default_value_t = DEFAULT_CARD_WIDTH)]
    pub card_width: u32,
    #[arg(long, default_value_t = DEFAULT_CARD_HEIGHT)]
    pub card_height: u32,
    #[command(flatten)]
    pub grid: GridArgs,
}

pub fn handle(cmd: AssetsCommand) -> Result<()> {
    match cmd {
        AssetsCommand::Init(args) => {
            let sheet = SheetSpec::new(
                args.grid.columns,
                args.grid.rows,
                args.card_width,
                args.card_height,
            );
            let files = scaffold_assets(
                &args.dir,
                args.card_width,
                args.card_height,
                &CardLayout::default(),
                &sheet,
            )?;
            for file in &files {
                println!("wrote {}", file.display());
            }
            Ok(())
        }
    }
}
