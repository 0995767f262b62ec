//! Card rendering and the default template assets.

mod compose;
mod face;
mod fit;
mod scaffold;

pub use compose::{
    AssetSet, CardComposer, CardLayout, PICK_BADGES, PRIMARY_FRONT, PRIMARY_ICON_PATCH,
    SECONDARY_FRONT, SECONDARY_ICON_PATCH, SHEET_BLANK, SUBTITLE_PATCH, load_image,
};
pub use face::{BlockFace, TextFace, TrueTypeFace};
pub use fit::{DEFAULT_LINE_SPACING, DEFAULT_MIN_FONT_SIZE, FittedText, GlyphFitter, TextBox};
pub use scaffold::{DEFAULT_CARD_HEIGHT, DEFAULT_CARD_WIDTH, scaffold_assets};
