//! Core library for rendering party card game decks and packing print sheets.

mod deck;
mod error;
mod pipeline;
mod render;
mod sheet;
mod source;

pub use deck::{
    CardFileName, CardKind, CardRecord, DeckMetadata, DeckOptionEntry, DeckOptions,
    sheet_file_name,
};
pub use error::{RenderError, SourceError};
pub use render::{
    AssetSet, BlockFace, CardComposer, CardLayout, DEFAULT_CARD_HEIGHT, DEFAULT_CARD_WIDTH,
    DEFAULT_LINE_SPACING, DEFAULT_MIN_FONT_SIZE, FittedText, GlyphFitter, PICK_BADGES,
    PRIMARY_FRONT, PRIMARY_ICON_PATCH, SECONDARY_FRONT, SECONDARY_ICON_PATCH, SHEET_BLANK,
    SUBTITLE_PATCH, TextBox, TextFace, TrueTypeFace, load_image, scaffold_assets,
};
pub use pipeline::{
    BatchReport, BuildContext, DeckInput, DeckJob, DeckOutcome, DeckResolver, SheetSettings,
    build_deck, build_job, discover_inputs, run_batch,
};
pub use sheet::{
    DEFAULT_SHEET_COLUMNS, DEFAULT_SHEET_ROWS, KindPacker, PackReport, Sheet, SheetSpec,
    collect_card_files, pack_directory,
};
pub use source::{
    BLANK_PLACEHOLDER, BlankMarker, CachedFetcher, CallPart, DEFAULT_CACHE_TTL_HOURS, DeckFetcher,
    DeckPayload, HttpFetcher, ResponseText, normalize_call, normalize_payload, read_csv,
};
