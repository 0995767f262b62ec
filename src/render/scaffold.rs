//! Generates a default template set so a fresh checkout can render decks.
//!
//! The artwork is deliberately plain: rounded card fronts in the two
//! color schemes, solid icon patches, a subtitle bar, "PICK N" badges set
//! in the block face, and a blank sheet sized for the configured grid.

use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_circle_mut};
use imageproc::rect::Rect;
use tracing::info;

use crate::error::RenderError;
use crate::render::compose::{
    CardLayout, PICK_BADGES, PRIMARY_FRONT, PRIMARY_ICON_PATCH, SECONDARY_FRONT,
    SECONDARY_ICON_PATCH, SHEET_BLANK, SUBTITLE_PATCH,
};
use crate::render::face::{BlockFace, TextFace};
use crate::sheet::SheetSpec;

pub const DEFAULT_CARD_WIDTH: u32 = 750;
pub const DEFAULT_CARD_HEIGHT: u32 = 1050;
const ICON_SIZE: u32 = 120;
const BADGE_WIDTH: u32 = 200;
const BADGE_HEIGHT: u32 = 64;
const CORNER_RADIUS: i32 = 40;

struct Palette {
    background: Rgba<u8>,
    emblem: Rgba<u8>,
}

const PRIMARY: Palette = Palette {
    background: Rgba([0x1c, 0x1a, 0x18, 0xff]),
    emblem: Rgba([0xfd, 0xfa, 0xf3, 0xff]),
};

const SECONDARY: Palette = Palette {
    background: Rgba([0xfd, 0xfa, 0xf3, 0xff]),
    emblem: Rgba([0x28, 0x24, 0x1f, 0xff]),
};

const SUBTITLE_BG: Rgba<u8> = Rgba([0x86, 0x74, 0x5d, 0xff]);
const BADGE_BG: Rgba<u8> = Rgba([0xfd, 0xfa, 0xf3, 0xff]);
const BADGE_INK: Rgba<u8> = Rgba([0x1c, 0x1a, 0x18, 0xff]);
const SHEET_BG: Rgba<u8> = Rgba([0x00, 0x00, 0x00, 0xff]);

/// Write every template [`AssetSet`](crate::AssetSet) needs, plus the blank sheet.
pub fn scaffold_assets(
    dir: &Path,
    card_width: u32,
    card_height: u32,
    layout: &CardLayout,
    sheet: &SheetSpec,
) -> Result<Vec<PathBuf>, RenderError> {
    let (sheet_width, sheet_height) = sheet.pixel_size()?;
    fs::create_dir_all(dir).map_err(|source| RenderError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let subtitle_width = card_width.saturating_sub(2 * layout.text_margin_x).max(1);
    let mut files = vec![
        (PRIMARY_FRONT, card_front(card_width, card_height, layout, &PRIMARY)),
        (SECONDARY_FRONT, card_front(card_width, card_height, layout, &SECONDARY)),
        (PRIMARY_ICON_PATCH, solid(ICON_SIZE, ICON_SIZE, PRIMARY.background)),
        (SECONDARY_ICON_PATCH, solid(ICON_SIZE, ICON_SIZE, SECONDARY.background)),
        (
            SUBTITLE_PATCH,
            solid(subtitle_width, layout.subtitle_height.max(1), SUBTITLE_BG),
        ),
        (
            SHEET_BLANK,
            solid(sheet_width, sheet_height, SHEET_BG),
        ),
    ];
    for (pick, name) in (2..).zip(PICK_BADGES) {
        files.push((name, pick_badge(pick)));
    }

    let mut written = Vec::with_capacity(files.len());
    for (name, image) in files {
        let path = dir.join(name);
        image.save(&path).map_err(|source| RenderError::Write {
            kind: "asset",
            path: path.clone(),
            source,
        })?;
        written.push(path);
    }
    info!(dir = %dir.display(), count = written.len(), "scaffolded assets");
    Ok(written)
}

fn solid(width: u32, height: u32, color: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_pixel(width.max(1), height.max(1), color)
}

/// Rounded card face with a default ring emblem where icon overrides land.
fn card_front(width: u32, height: u32, layout: &CardLayout, palette: &Palette) -> RgbaImage {
    let mut card = RgbaImage::new(width, height);
    let (w, h) = (width as i32, height as i32);
    let r = CORNER_RADIUS.min(w / 2).min(h / 2);
    if r > 0 {
        draw_filled_rect_mut(
            &mut card,
            Rect::at(r, 0).of_size((w - 2 * r).max(1) as u32, height),
            palette.background,
        );
        draw_filled_rect_mut(
            &mut card,
            Rect::at(0, r).of_size(width, (h - 2 * r).max(1) as u32),
            palette.background,
        );
        for (cx, cy) in [(r, r), (w - r - 1, r), (r, h - r - 1), (w - r - 1, h - r - 1)] {
            draw_filled_circle_mut(&mut card, (cx, cy), r, palette.background);
        }
    } else {
        card = solid(width, height, palette.background);
    }

    let (ix, iy) = layout.icon_origin;
    let half = (ICON_SIZE / 2) as i32;
    let center = (ix as i32 + half, iy as i32 + half);
    for ring in 0..4 {
        draw_hollow_circle_mut(&mut card, center, half - 8 - ring, palette.emblem);
    }
    card
}

fn pick_badge(pick: u32) -> RgbaImage {
    let mut badge = solid(BADGE_WIDTH, BADGE_HEIGHT, BADGE_BG);
    let label = format!("PICK {pick}");
    let face = BlockFace;
    let size = 32;
    let x = (BADGE_WIDTH.saturating_sub(face.line_width(&label, size)) / 2) as i32;
    let y = (BADGE_HEIGHT.saturating_sub(size) / 2) as i32;
    face.draw_line(&mut badge, &label, x, y, size, BADGE_INK);
    badge
}
