use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use partycards::{SHEET_BLANK, SheetSpec, collect_card_files, load_image, pack_directory};

use crate::cli::common::GridArgs;

#[derive(Args, Debug)]
pub struct SheetArgs {
    /// Directory of rendered `<kind>-card_<n>.png` files; sheets are written alongside.
    pub dir: PathBuf,
    /// Blank sheet template.
    #[arg(long)]
    pub blank: Option<PathBuf>,
    /// Asset directory holding the default blank template.
    #[arg(long, env = "CARDS_ASSETS", default_value = "cardassets")]
    pub assets: PathBuf,
    #[command(flatten)]
    pub grid: GridArgs,
}

pub fn handle(args: SheetArgs) -> Result<()> {
    let [primary, secondary] = collect_card_files(&args.dir)?;
    let Some(first) = primary.first().or(secondary.first()) else {
        println!("No cards found in {}", args.dir.display());
        return Ok(());
    };
    let cell = load_image(first)?.dimensions();

    let blank_path = args.blank.unwrap_or_else(|| args.assets.join(SHEET_BLANK));
    let blank = load_image(&blank_path)
        .with_context(|| format!("failed to load sheet template {}", blank_path.display()))?;
    let spec = SheetSpec::new(args.grid.columns, args.grid.rows, cell.0, cell.1);
    let report = pack_directory(&args.dir, spec, &blank)?;
    println!(
        "Packed {} primary and {} secondary sheet(s) into {}",
        report.primary.len(),
        report.secondary.len(),
        args.dir.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use partycards::{CardFileName, CardKind};

    #[test]
    fn packs_rendered_cards_into_sheets() {
        let dir = tempfile::tempdir().unwrap();
        for (kind, index) in [(CardKind::Primary, 0), (CardKind::Secondary, 1)] {
            let name = CardFileName::new(kind, index).to_string();
            RgbaImage::from_pixel(4, 6, Rgba([255, 0, 0, 255]))
                .save(dir.path().join(name))
                .unwrap();
        }
        let blank = dir.path().join("blank.png");
        RgbaImage::from_pixel(8, 6, Rgba([0, 0, 0, 255]))
            .save(&blank)
            .unwrap();

        handle(SheetArgs {
            dir: dir.path().to_path_buf(),
            blank: Some(blank),
            assets: PathBuf::from("unused"),
            grid: GridArgs { columns: 2, rows: 1 },
        })
        .unwrap();

        assert!(dir.path().join("primary-sheet_1.png").exists());
        assert!(dir.path().join("secondary-sheet_1.png").exists());
    }
}
