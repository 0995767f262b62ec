use image::{Rgba, RgbaImage};
use tracing::debug;

use crate::error::RenderError;
use crate::render::face::TextFace;

pub const DEFAULT_MIN_FONT_SIZE: u32 = 6;
pub const DEFAULT_LINE_SPACING: f32 = 1.2;
const EXCERPT_CHARS: usize = 24;

/// Bounding box and typography constraints for a fitted text block.
#[derive(Debug, Clone, Copy)]
pub struct TextBox {
    pub max_width: u32,
    pub max_height: u32,
    /// First size tried; never exceeded, even when below `min_size`.
    pub start_size: u32,
    /// Smallest size tried before giving up; values below 1 are treated as 1
    /// and values above `start_size` as `start_size`.
    pub min_size: u32,
    /// Line pitch as a multiple of the font size.
    pub line_spacing: f32,
    pub color: Rgba<u8>,
}

impl TextBox {
    pub fn new(max_width: u32, max_height: u32, start_size: u32, color: Rgba<u8>) -> Self {
        Self {
            max_width,
            max_height,
            start_size,
            min_size: DEFAULT_MIN_FONT_SIZE,
            line_spacing: DEFAULT_LINE_SPACING,
            color,
        }
    }

    fn pitch(&self, size: u32) -> u32 {
        ((size as f32 * self.line_spacing).round() as u32).max(1)
    }
}

/// Result of a successful fit.
#[derive(Debug, Clone)]
pub struct FittedText {
    /// Transparent `max_width x height` block holding the glyphs.
    pub image: RgbaImage,
    pub size: u32,
    pub lines: Vec<String>,
    pub height: u32,
    /// Every size laid out, in the order tried.
    pub sizes_tried: Vec<u32>,
}

struct Layout {
    lines: Vec<String>,
    width: u32,
    height: u32,
}

/// Shrinks text until it fits a [`TextBox`].
pub struct GlyphFitter<'a> {
    face: &'a dyn TextFace,
}

impl<'a> GlyphFitter<'a> {
    pub fn new(face: &'a dyn TextFace) -> Self {
        Self { face }
    }

    /// Lay out `text` at decreasing sizes and render the first layout that fits.
    pub fn fit(&self, text: &str, bounds: &TextBox) -> Result<FittedText, RenderError> {
        let start = bounds.start_size.max(1);
        let floor = bounds.min_size.max(1).min(start);
        let mut sizes_tried = Vec::new();
        let mut last = None;

        for size in (floor..=start).rev() {
            sizes_tried.push(size);
            let layout = self.layout(text, bounds, size);
            if layout.height <= bounds.max_height && layout.width <= bounds.max_width {
                debug!(size, lines = layout.lines.len(), "text fitted");
                let image = self.render(&layout, bounds, size);
                return Ok(FittedText {
                    image,
                    size,
                    lines: layout.lines,
                    height: layout.height,
                    sizes_tried,
                });
            }
            last = Some(layout);
        }

        let (width, height) = last.map(|l| (l.width, l.height)).unwrap_or_default();
        Err(RenderError::TextOverflow {
            excerpt: text.chars().take(EXCERPT_CHARS).collect(),
            min_size: floor,
            max_width: bounds.max_width,
            max_height: bounds.max_height,
            width,
            height,
        })
    }

    /// Greedy word wrap at `max_width`; an over-wide word keeps a line to itself.
    pub fn wrap(&self, text: &str, max_width: u32, size: u32) -> Vec<String> {
        let mut lines = Vec::new();
        for paragraph in text.split('\n') {
            let mut line = String::new();
            for word in paragraph.split_whitespace() {
                if line.is_empty() {
                    line.push_str(word);
                    continue;
                }
                let candidate = format!("{line} {word}");
                if self.face.line_width(&candidate, size) <= max_width {
                    line = candidate;
                } else {
                    lines.push(std::mem::replace(&mut line, word.to_string()));
                }
            }
            lines.push(line);
        }
        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }
        lines
    }

    fn layout(&self, text: &str, bounds: &TextBox, size: u32) -> Layout {
        let lines = self.wrap(text, bounds.max_width, size);
        let width = lines
            .iter()
            .map(|line| self.face.line_width(line, size))
            .max()
            .unwrap_or(0);
        let height = lines.len() as u32 * bounds.pitch(size);
        Layout {
            lines,
            width,
            height,
        }
    }

    fn render(&self, layout: &Layout, bounds: &TextBox, size: u32) -> RgbaImage {
        let mut block = RgbaImage::new(bounds.max_width.max(1), layout.height.max(1));
        let pitch = bounds.pitch(size) as i32;
        for (row, line) in layout.lines.iter().enumerate() {
            self.face
                .draw_line(&mut block, line, 0, row as i32 * pitch, size, bounds.color);
        }
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::face::BlockFace;
    use pretty_assertions::assert_eq;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    #[test]
    fn start_below_floor_is_never_exceeded() {
        let face = BlockFace;
        let fitter = GlyphFitter::new(&face);
        let mut bounds = TextBox::new(400, 200, 4, WHITE);
        bounds.min_size = 10;
        let fitted = fitter.fit("Tiny", &bounds).unwrap();
        assert_eq!(fitted.size, 4);
        assert_eq!(fitted.sizes_tried, vec![4]);

        let err = fitter.fit(&"x".repeat(500), &bounds).unwrap_err();
        assert!(matches!(err, RenderError::TextOverflow { min_size: 4, .. }));
    }

    #[test]
    fn short_text_keeps_start_size() {
        let face = BlockFace;
        let fitter = GlyphFitter::new(&face);
        let bounds = TextBox::new(400, 200, 32, WHITE);
        let fitted = fitter.fit("Why did", &bounds).unwrap();
        assert_eq!(fitted.size, 32);
        assert_eq!(fitted.sizes_tried, vec![32]);
        assert_eq!(fitted.lines, vec!["Why did".to_string()]);
        assert_eq!(fitted.image.width(), 400);
        assert_eq!(fitted.image.height(), fitted.height);
    }

    #[test]
    fn long_text_shrinks_until_it_fits() {
        let face = BlockFace;
        let fitter = GlyphFitter::new(&face);
        let bounds = TextBox::new(300, 120, 48, WHITE);
        let text = "The unstoppable tide of lukewarm casserole dishes brought over by \
                    concerned neighbours after a mildly inconvenient stubbed toe";
        let fitted = fitter.fit(text, &bounds).unwrap();

        assert!(fitted.size < 48);
        assert!(fitted.height <= bounds.max_height);
        assert!(fitted.sizes_tried.windows(2).all(|w| w[0] > w[1]));
        assert_eq!(fitted.sizes_tried.last(), Some(&fitted.size));
        for line in &fitted.lines {
            assert!(face.line_width(line, fitted.size) <= bounds.max_width);
        }
    }

    #[test]
    fn overflow_at_floor_is_reported() {
        let face = BlockFace;
        let fitter = GlyphFitter::new(&face);
        let mut bounds = TextBox::new(60, 10, 20, WHITE);
        bounds.min_size = 8;
        let text = "far too many words for this tiny little box to ever hold";
        match fitter.fit(text, &bounds) {
            Err(RenderError::TextOverflow {
                min_size, height, ..
            }) => {
                assert_eq!(min_size, 8);
                assert!(height > 10);
            }
            other => panic!("expected overflow, got {other:?}"),
        }
    }

    #[test]
    fn explicit_newlines_start_new_lines() {
        let face = BlockFace;
        let fitter = GlyphFitter::new(&face);
        let lines = fitter.wrap("Haiku:\none two\n\nthree\n", 1000, 16);
        assert_eq!(lines, vec!["Haiku:", "one two", "", "three"]);
    }

    #[test]
    fn wide_word_sits_on_its_own_line() {
        let face = BlockFace;
        let fitter = GlyphFitter::new(&face);
        let lines = fitter.wrap("a supercalifragilistic b", 60, 8);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }
}
