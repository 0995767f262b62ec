//! Shared clap helper types for CLI commands.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use partycards::{
    AssetSet, CardComposer, CardKind, CardLayout, DEFAULT_SHEET_COLUMNS, DEFAULT_SHEET_ROWS,
    SHEET_BLANK,
};

use crate::cli::utils::load_face;

/// Card kind selector.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum CardKindArg {
    Primary,
    Secondary,
}

impl From<CardKindArg> for CardKind {
    fn from(value: CardKindArg) -> CardKind {
        match value {
            CardKindArg::Primary => CardKind::Primary,
            CardKindArg::Secondary => CardKind::Secondary,
        }
    }
}

/// Location of the template images and the optional card font.
#[derive(Args, Debug)]
pub struct AssetArgs {
    /// Directory holding card templates, patches and badges.
    #[arg(long, env = "CARDS_ASSETS", default_value = "cardassets")]
    pub assets: PathBuf,
    /// TrueType/OpenType font for card text (built-in block face if omitted).
    #[arg(long, env = "CARDS_FONT")]
    pub font: Option<PathBuf>,
}

impl AssetArgs {
    pub fn composer(&self) -> Result<CardComposer> {
        let assets = AssetSet::load(&self.assets)
            .with_context(|| format!("failed to load assets from {}", self.assets.display()))?;
        let face = load_face(self.font.as_deref())?;
        Ok(CardComposer::new(
            Arc::new(assets),
            face,
            CardLayout::default(),
        ))
    }

    pub fn sheet_blank(&self) -> PathBuf {
        self.assets.join(SHEET_BLANK)
    }
}

/// Sheet grid dimensions.
#[derive(Args, Debug, Clone, Copy)]
pub struct GridArgs {
    /// Cards per sheet row.
    #[arg(long = "sheet-columns", default_value_t = DEFAULT_SHEET_COLUMNS)]
    pub columns: u32,
    /// Rows per sheet.
    #[arg(long = "sheet-rows", default_value_t = DEFAULT_SHEET_ROWS)]
    pub rows: u32,
}
