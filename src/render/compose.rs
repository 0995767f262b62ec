use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::imageops::overlay;
use image::{Rgba, RgbaImage};
use tracing::{debug, warn};

use crate::deck::{CardKind, CardRecord, DeckMetadata};
use crate::error::RenderError;
use crate::render::face::TextFace;
use crate::render::fit::{DEFAULT_LINE_SPACING, DEFAULT_MIN_FONT_SIZE, GlyphFitter, TextBox};

pub const PRIMARY_FRONT: &str = "primary-front.png";
pub const SECONDARY_FRONT: &str = "secondary-front.png";
pub const PRIMARY_ICON_PATCH: &str = "iconpatch-primary.png";
pub const SECONDARY_ICON_PATCH: &str = "iconpatch-secondary.png";
pub const SUBTITLE_PATCH: &str = "subtitle-patch.png";
pub const PICK_BADGES: [&str; 2] = ["pick-2.png", "pick-3.png"];
pub const SHEET_BLANK: &str = "sheet-blank.png";

/// Fixed offsets and typography of the card template.
#[derive(Debug, Clone, Copy)]
pub struct CardLayout {
    pub text_margin_x: u32,
    pub text_top: u32,
    pub text_height: u32,
    pub text_size: u32,
    pub icon_origin: (i64, i64),
    pub subtitle_origin: (i64, i64),
    pub subtitle_height: u32,
    pub subtitle_size: u32,
    /// Distance of the pick badge from the bottom-right corner.
    pub badge_margin: u32,
    pub min_font_size: u32,
    pub line_spacing: f32,
    pub primary_ink: Rgba<u8>,
    pub secondary_ink: Rgba<u8>,
}

impl Default for CardLayout {
    fn default() -> Self {
        Self {
            text_margin_x: 80,
            text_top: 80,
            text_height: 471,
            text_size: 56,
            icon_origin: (77, 571),
            subtitle_origin: (80, 24),
            subtitle_height: 44,
            subtitle_size: 28,
            badge_margin: 60,
            min_font_size: DEFAULT_MIN_FONT_SIZE,
            line_spacing: DEFAULT_LINE_SPACING,
            primary_ink: Rgba([0xfd, 0xfa, 0xf3, 0xff]),
            secondary_ink: Rgba([0x28, 0x24, 0x1f, 0xff]),
        }
    }
}

impl CardLayout {
    pub fn ink(&self, kind: CardKind) -> Rgba<u8> {
        match kind {
            CardKind::Primary => self.primary_ink,
            CardKind::Secondary => self.secondary_ink,
        }
    }

    fn text_box(&self, card_width: u32, height: u32, size: u32, kind: CardKind) -> TextBox {
        TextBox {
            max_width: card_width.saturating_sub(2 * self.text_margin_x),
            max_height: height,
            start_size: size,
            min_size: self.min_font_size,
            line_spacing: self.line_spacing,
            color: self.ink(kind),
        }
    }
}

/// Template images shared read-only by every render.
#[derive(Debug, Clone)]
pub struct AssetSet {
    pub primary_front: RgbaImage,
    pub secondary_front: RgbaImage,
    pub primary_icon_patch: RgbaImage,
    pub secondary_icon_patch: RgbaImage,
    pub subtitle_patch: RgbaImage,
    /// Badges for pick 2 and pick 3.
    pub pick_badges: [RgbaImage; 2],
}

impl AssetSet {
    /// Load every required template from `dir`; any missing file is fatal.
    pub fn load(dir: &Path) -> Result<Self, RenderError> {
        Ok(Self {
            primary_front: load_image(&dir.join(PRIMARY_FRONT))?,
            secondary_front: load_image(&dir.join(SECONDARY_FRONT))?,
            primary_icon_patch: load_image(&dir.join(PRIMARY_ICON_PATCH))?,
            secondary_icon_patch: load_image(&dir.join(SECONDARY_ICON_PATCH))?,
            subtitle_patch: load_image(&dir.join(SUBTITLE_PATCH))?,
            pick_badges: [
                load_image(&dir.join(PICK_BADGES[0]))?,
                load_image(&dir.join(PICK_BADGES[1]))?,
            ],
        })
    }

    pub fn front(&self, kind: CardKind) -> &RgbaImage {
        match kind {
            CardKind::Primary => &self.primary_front,
            CardKind::Secondary => &self.secondary_front,
        }
    }

    pub fn icon_patch(&self, kind: CardKind) -> &RgbaImage {
        match kind {
            CardKind::Primary => &self.primary_icon_patch,
            CardKind::Secondary => &self.secondary_icon_patch,
        }
    }

    pub fn pick_badge(&self, pick: u32) -> Option<&RgbaImage> {
        match pick {
            2 => Some(&self.pick_badges[0]),
            3 => Some(&self.pick_badges[1]),
            _ => None,
        }
    }
}

/// Decode an image from disk as RGBA.
pub fn load_image(path: &Path) -> Result<RgbaImage, RenderError> {
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|err| RenderError::asset(path, err))
}

/// Layers templates, decorations and fitted text into finished cards.
#[derive(Clone)]
pub struct CardComposer {
    assets: Arc<AssetSet>,
    face: Arc<dyn TextFace>,
    layout: CardLayout,
}

impl CardComposer {
    pub fn new(assets: Arc<AssetSet>, face: Arc<dyn TextFace>, layout: CardLayout) -> Self {
        Self {
            assets,
            face,
            layout,
        }
    }

    pub fn layout(&self) -> &CardLayout {
        &self.layout
    }

    /// Pixel size of a primary card; used as the sheet cell pitch.
    pub fn card_size(&self) -> (u32, u32) {
        self.assets.primary_front.dimensions()
    }

    pub fn compose(
        &self,
        record: &CardRecord,
        deck: &DeckMetadata,
        icon: Option<&RgbaImage>,
    ) -> Result<RgbaImage, RenderError> {
        let layout = &self.layout;
        let fitter = GlyphFitter::new(self.face.as_ref());
        let mut card = self.assets.front(record.kind).clone();
        let card_width = card.width();

        if let Some(icon) = icon {
            let (x, y) = layout.icon_origin;
            overlay(&mut card, self.assets.icon_patch(record.kind), x, y);
            overlay(&mut card, icon, x, y);
        }

        if deck.enable_subtitle {
            let (x, y) = layout.subtitle_origin;
            overlay(&mut card, &self.assets.subtitle_patch, x, y);
            let bounds = layout.text_box(
                card_width,
                layout.subtitle_height,
                layout.subtitle_size,
                record.kind,
            );
            let subtitle = fitter.fit(&deck.name, &bounds)?;
            overlay(&mut card, &subtitle.image, x, y);
        }

        if record.kind == CardKind::Primary {
            match self.assets.pick_badge(record.pick) {
                Some(badge) => {
                    let x = card_width as i64 - (badge.width() + layout.badge_margin) as i64;
                    let y = card.height() as i64 - (badge.height() + layout.badge_margin) as i64;
                    overlay(&mut card, badge, x, y);
                }
                None if record.pick > 3 => {
                    warn!(pick = record.pick, "no badge for pick count; drawing none");
                }
                None => {}
            }
        }

        let bounds = layout.text_box(card_width, layout.text_height, layout.text_size, record.kind);
        let body = fitter.fit(&record.text, &bounds)?;
        debug!(kind = %record.kind, size = body.size, lines = body.lines.len(), "composed card");
        overlay(
            &mut card,
            &body.image,
            layout.text_margin_x as i64,
            layout.text_top as i64,
        );

        Ok(card)
    }

    /// Compose a card and write it as PNG to `path`.
    pub fn compose_to(
        &self,
        record: &CardRecord,
        deck: &DeckMetadata,
        icon: Option<&RgbaImage>,
        path: &Path,
    ) -> Result<PathBuf, RenderError> {
        let card = self.compose(record, deck, icon)?;
        card.save(path).map_err(|source| RenderError::Write {
            kind: "card",
            path: path.to_path_buf(),
            source,
        })?;
        Ok(path.to_path_buf())
    }
}
