use std::fs;
use std::path::Path;

use ab_glyph::{FontArc, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::error::RenderError;

const GLYPH_WIDTH: usize = 5;
const GLYPH_HEIGHT: usize = 7;
/// Block glyphs sit on a 6x8 unit cell; one unit is `size / CELL_HEIGHT` pixels.
const CELL_WIDTH: usize = GLYPH_WIDTH + 1;
const CELL_HEIGHT: f32 = 8.0;

/// A font that can measure and draw single lines at an arbitrary pixel size.
pub trait TextFace: Send + Sync {
    /// Width in pixels of `text` laid out on one line.
    fn line_width(&self, text: &str, size: u32) -> u32;

    /// Draw `text` with the top of the line at `y`.
    fn draw_line(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        x: i32,
        y: i32,
        size: u32,
        color: Rgba<u8>,
    );
}

/// Scalable 5x7 block face compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockFace;

impl BlockFace {
    fn unit(size: u32) -> f32 {
        size as f32 / CELL_HEIGHT
    }
}

impl TextFace for BlockFace {
    fn line_width(&self, text: &str, size: u32) -> u32 {
        let count = text.chars().count();
        if count == 0 {
            return 0;
        }
        let units = count * CELL_WIDTH - 1;
        (units as f32 * Self::unit(size)).ceil() as u32
    }

    fn draw_line(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        x: i32,
        y: i32,
        size: u32,
        color: Rgba<u8>,
    ) {
        let unit = Self::unit(size);
        let offset = |units: usize| (units as f32 * unit).floor() as i32;
        for (idx, ch) in text.chars().enumerate() {
            let pattern = glyph_pattern(ch);
            for (row, bits) in pattern.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                        continue;
                    }
                    let gx = idx * CELL_WIDTH + col;
                    let px = x + offset(gx);
                    let py = y + offset(row);
                    let w = (offset(gx + 1) - offset(gx)).max(1) as u32;
                    let h = (offset(row + 1) - offset(row)).max(1) as u32;
                    draw_filled_rect_mut(canvas, Rect::at(px, py).of_size(w, h), color);
                }
            }
        }
    }
}

/// TrueType/OpenType face loaded with `ab_glyph`.
#[derive(Clone)]
pub struct TrueTypeFace {
    font: FontArc,
}

impl TrueTypeFace {
    pub fn load(path: &Path) -> Result<Self, RenderError> {
        let bytes = fs::read(path).map_err(|err| RenderError::asset(path, err))?;
        let font = FontArc::try_from_vec(bytes).map_err(|err| RenderError::asset(path, err))?;
        Ok(Self { font })
    }
}

impl TextFace for TrueTypeFace {
    fn line_width(&self, text: &str, size: u32) -> u32 {
        text_size(PxScale::from(size as f32), &self.font, text).0
    }

    fn draw_line(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        x: i32,
        y: i32,
        size: u32,
        color: Rgba<u8>,
    ) {
        draw_text_mut(
            canvas,
            color,
            x,
            y,
            PxScale::from(size as f32),
            &self.font,
            text,
        );
    }
}

/// 5x7 block glyphs, one row per entry, high bit on the left.
#[rustfmt::skip]
const BLOCK_GLYPHS: &[(char, [u8; GLYPH_HEIGHT])] = &[
    ('0', [0x0e, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0e]),
    ('1', [0x04, 0x0c, 0x04, 0x04, 0x04, 0x04, 0x0e]),
    ('2', [0x0e, 0x11, 0x01, 0x06, 0x08, 0x10, 0x1f]),
    ('3', [0x1e, 0x01, 0x01, 0x0e, 0x01, 0x01, 0x1e]),
    ('4', [0x02, 0x06, 0x0a, 0x12, 0x1f, 0x02, 0x02]),
    ('5', [0x1f, 0x10, 0x1e, 0x01, 0x01, 0x11, 0x0e]),
    ('6', [0x06, 0x08, 0x10, 0x1e, 0x11, 0x11, 0x0e]),
    ('7', [0x1f, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08]),
    ('8', [0x0e, 0x11, 0x11, 0x0e, 0x11, 0x11, 0x0e]),
    ('9', [0x0e, 0x11, 0x11, 0x0f, 0x01, 0x02, 0x0c]),
    ('A', [0x0e, 0x11, 0x11, 0x1f, 0x11, 0x11, 0x11]),
    ('B', [0x1e, 0x11, 0x11, 0x1e, 0x11, 0x11, 0x1e]),
    ('C', [0x0e, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0e]),
    ('D', [0x1e, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1e]),
    ('E', [0x1f, 0x10, 0x10, 0x1e, 0x10, 0x10, 0x1f]),
    ('F', [0x1f, 0x10, 0x10, 0x1e, 0x10, 0x10, 0x10]),
    ('G', [0x0e, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0e]),
    ('H', [0x11, 0x11, 0x11, 0x1f, 0x11, 0x11, 0x11]),
    ('I', [0x0e, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0e]),
    ('J', [0x07, 0x02, 0x02, 0x02, 0x12, 0x12, 0x0c]),
    ('K', [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11]),
    ('L', [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1f]),
    ('M', [0x11, 0x1b, 0x15, 0x15, 0x11, 0x11, 0x11]),
    ('N', [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11]),
    ('O', [0x0e, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0e]),
    ('P', [0x1e, 0x11, 0x11, 0x1e, 0x10, 0x10, 0x10]),
    ('Q', [0x0e, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0d]),
    ('R', [0x1e, 0x11, 0x11, 0x1e, 0x14, 0x12, 0x11]),
    ('S', [0x0f, 0x10, 0x10, 0x0e, 0x01, 0x01, 0x1e]),
    ('T', [0x1f, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04]),
    ('U', [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0e]),
    ('V', [0x11, 0x11, 0x11, 0x0a, 0x0a, 0x04, 0x04]),
    ('W', [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0a]),
    ('X', [0x11, 0x11, 0x0a, 0x04, 0x0a, 0x11, 0x11]),
    ('Y', [0x11, 0x11, 0x0a, 0x04, 0x04, 0x04, 0x04]),
    ('Z', [0x1f, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1f]),
    ('-', [0x00, 0x00, 0x00, 0x1f, 0x00, 0x00, 0x00]),
    ('&', [0x0c, 0x12, 0x14, 0x08, 0x15, 0x12, 0x0d]),
    ('/', [0x01, 0x02, 0x04, 0x08, 0x10, 0x10, 0x00]),
    (':', [0x00, 0x04, 0x00, 0x00, 0x04, 0x00, 0x00]),
    ('#', [0x0a, 0x1f, 0x0a, 0x0a, 0x1f, 0x0a, 0x0a]),
    ('@', [0x0e, 0x11, 0x17, 0x15, 0x17, 0x10, 0x0e]),
    ('\'', [0x04, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00]),
    ('’', [0x04, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00]),
    ('=', [0x00, 0x1f, 0x00, 0x00, 0x1f, 0x00, 0x00]),
    ('"', [0x0a, 0x0a, 0x00, 0x00, 0x00, 0x00, 0x00]),
    ('“', [0x0a, 0x0a, 0x00, 0x00, 0x00, 0x00, 0x00]),
    ('”', [0x0a, 0x0a, 0x00, 0x00, 0x00, 0x00, 0x00]),
    ('.', [0x00, 0x00, 0x00, 0x00, 0x00, 0x06, 0x06]),
    (',', [0x00, 0x00, 0x00, 0x00, 0x06, 0x04, 0x08]),
    ('(', [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02]),
    (')', [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08]),
    ('+', [0x04, 0x04, 0x1f, 0x04, 0x04, 0x00, 0x00]),
    ('!', [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04]),
    ('$', [0x04, 0x0f, 0x14, 0x0e, 0x05, 0x1e, 0x04]),
    ('%', [0x19, 0x1a, 0x04, 0x08, 0x16, 0x06, 0x00]),
    ('_', [0x00, 0x00, 0x00, 0x00, 0x00, 0x1f, 0x00]),
    (';', [0x00, 0x04, 0x00, 0x00, 0x06, 0x04, 0x08]),
    ('*', [0x04, 0x15, 0x0e, 0x15, 0x04, 0x00, 0x00]),
    ('?', [0x0e, 0x11, 0x02, 0x04, 0x04, 0x00, 0x04]),
];

/// Unknown characters draw nothing; lowercase shares the uppercase glyph.
fn glyph_pattern(ch: char) -> [u8; GLYPH_HEIGHT] {
    let ch = ch.to_ascii_uppercase();
    BLOCK_GLYPHS
        .iter()
        .find(|(glyph, _)| *glyph == ch)
        .map(|(_, rows)| *rows)
        .unwrap_or([0; GLYPH_HEIGHT])
}
