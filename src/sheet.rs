//! Tiling of rendered cards onto fixed-size grid sheets.
//!
//! Each card kind runs its own [`KindPacker`]. Cards are placed row-major;
//! a full sheet is only flushed when the next card arrives or the sequence
//! ends, so an input of exactly `columns * rows` cards yields one sheet.

use std::fs;
use std::mem;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use image::imageops::replace;
use tracing::{debug, info};

use crate::deck::{CardFileName, CardKind, sheet_file_name};
use crate::error::RenderError;
use crate::render::load_image;

pub const DEFAULT_SHEET_COLUMNS: u32 = 8;
pub const DEFAULT_SHEET_ROWS: u32 = 5;

/// Grid geometry shared by every sheet of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetSpec {
    pub columns: u32,
    pub rows: u32,
    pub cell_width: u32,
    pub cell_height: u32,
}

impl SheetSpec {
    pub fn new(columns: u32, rows: u32, cell_width: u32, cell_height: u32) -> Self {
        Self {
            columns,
            rows,
            cell_width,
            cell_height,
        }
    }

    pub fn capacity(&self) -> usize {
        (self.columns as usize).saturating_mul(self.rows as usize)
    }

    /// Pixel dimensions of the whole grid.
    pub fn pixel_size(&self) -> Result<(u32, u32), RenderError> {
        let width = self.columns.checked_mul(self.cell_width);
        let height = self.rows.checked_mul(self.cell_height);
        match (width, height) {
            (Some(width), Some(height)) => Ok((width, height)),
            _ => Err(RenderError::GridTooLarge {
                columns: self.columns,
                rows: self.rows,
                cell_width: self.cell_width,
                cell_height: self.cell_height,
            }),
        }
    }

    /// Top-left pixel of the `slot`-th cell, counting row-major.
    pub fn cell_origin(&self, slot: usize) -> (i64, i64) {
        let columns = self.columns.max(1) as usize;
        let x = (slot % columns) as i64 * self.cell_width as i64;
        let y = (slot / columns) as i64 * self.cell_height as i64;
        (x, y)
    }

    /// Reject empty grids and blank templates too small for the grid.
    pub fn check_blank(&self, blank: &RgbaImage) -> Result<(), RenderError> {
        let (needed_width, needed_height) = self.pixel_size()?;
        if self.capacity() == 0 || blank.width() < needed_width || blank.height() < needed_height
        {
            return Err(RenderError::SheetTooSmall {
                actual_width: blank.width(),
                actual_height: blank.height(),
                needed_width,
                needed_height,
            });
        }
        Ok(())
    }
}

/// A flushed sheet; never modified after it leaves its packer.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub kind: CardKind,
    /// 1-based position among the sheets of this kind.
    pub index: usize,
    pub placed: usize,
    pub image: RgbaImage,
}

enum PackState {
    Empty,
    Filling { sheet: RgbaImage, placed: usize },
    Full { sheet: RgbaImage },
}

/// Incremental sheet builder for one card kind.
pub struct KindPacker<'a> {
    kind: CardKind,
    spec: SheetSpec,
    blank: &'a RgbaImage,
    state: PackState,
    flushed: usize,
}

impl<'a> KindPacker<'a> {
    pub fn new(kind: CardKind, spec: SheetSpec, blank: &'a RgbaImage) -> Result<Self, RenderError> {
        spec.check_blank(blank)?;
        Ok(Self {
            kind,
            spec,
            blank,
            state: PackState::Empty,
            flushed: 0,
        })
    }

    /// Place the next card; returns the previous sheet if it had to be flushed first.
    pub fn push(&mut self, card: &RgbaImage) -> Option<Sheet> {
        match mem::replace(&mut self.state, PackState::Empty) {
            PackState::Empty => {
                self.start(card);
                None
            }
            PackState::Filling { mut sheet, placed } => {
                self.place(&mut sheet, placed, card);
                self.state = self.settle(sheet, placed + 1);
                None
            }
            PackState::Full { sheet } => {
                let capacity = self.spec.capacity();
                let done = self.seal(sheet, capacity);
                self.start(card);
                Some(done)
            }
        }
    }

    /// Flush any sheet in progress, partial or full.
    pub fn finish(mut self) -> Option<Sheet> {
        match mem::replace(&mut self.state, PackState::Empty) {
            PackState::Empty => None,
            PackState::Filling { sheet, placed } => Some(self.seal(sheet, placed)),
            PackState::Full { sheet } => {
                let capacity = self.spec.capacity();
                Some(self.seal(sheet, capacity))
            }
        }
    }

    fn start(&mut self, card: &RgbaImage) {
        let mut sheet = self.blank.clone();
        self.place(&mut sheet, 0, card);
        self.state = self.settle(sheet, 1);
    }

    fn place(&self, sheet: &mut RgbaImage, slot: usize, card: &RgbaImage) {
        let (x, y) = self.spec.cell_origin(slot);
        replace(sheet, card, x, y);
    }

    fn settle(&self, sheet: RgbaImage, placed: usize) -> PackState {
        if placed >= self.spec.capacity() {
            PackState::Full { sheet }
        } else {
            PackState::Filling { sheet, placed }
        }
    }

    fn seal(&mut self, image: RgbaImage, placed: usize) -> Sheet {
        self.flushed += 1;
        Sheet {
            kind: self.kind,
            index: self.flushed,
            placed,
            image,
        }
    }
}

/// Sheets written for each kind by [`pack_directory`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackReport {
    pub primary: Vec<PathBuf>,
    pub secondary: Vec<PathBuf>,
}

impl PackReport {
    pub fn total(&self) -> usize {
        self.primary.len() + self.secondary.len()
    }
}

/// Rendered card files of `dir`, grouped by kind and sorted by sequence index.
pub fn collect_card_files(dir: &Path) -> Result<[Vec<PathBuf>; 2], RenderError> {
    let io_err = |source| RenderError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut found = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let name = entry.file_name();
        match name.to_str().and_then(CardFileName::parse) {
            Some(parsed) => found.push((parsed, entry.path())),
            None => debug!(file = ?name, "skipping non-card file"),
        }
    }
    found.sort_by_key(|(parsed, _)| parsed.index);

    let mut grouped = [Vec::new(), Vec::new()];
    for (parsed, path) in found {
        let slot = match parsed.kind {
            CardKind::Primary => 0,
            CardKind::Secondary => 1,
        };
        grouped[slot].push(path);
    }
    Ok(grouped)
}

/// Pack every rendered card in `dir` into `<kind>-sheet_<n>.png` files beside them.
pub fn pack_directory(
    dir: &Path,
    spec: SheetSpec,
    blank: &RgbaImage,
) -> Result<PackReport, RenderError> {
    spec.check_blank(blank)?;
    let [primary, secondary] = collect_card_files(dir)?;
    let (primary, secondary) = rayon::join(
        || pack_kind(dir, CardKind::Primary, &primary, spec, blank),
        || pack_kind(dir, CardKind::Secondary, &secondary, spec, blank),
    );
    Ok(PackReport {
        primary: primary?,
        secondary: secondary?,
    })
}

fn pack_kind(
    dir: &Path,
    kind: CardKind,
    cards: &[PathBuf],
    spec: SheetSpec,
    blank: &RgbaImage,
) -> Result<Vec<PathBuf>, RenderError> {
    let mut packer = KindPacker::new(kind, spec, blank)?;
    let mut written = Vec::new();
    for path in cards {
        let card = load_image(path)?;
        if let Some(sheet) = packer.push(&card) {
            written.push(write_sheet(dir, &sheet)?);
        }
    }
    if let Some(sheet) = packer.finish() {
        written.push(write_sheet(dir, &sheet)?);
    }
    Ok(written)
}

fn write_sheet(dir: &Path, sheet: &Sheet) -> Result<PathBuf, RenderError> {
    let path = dir.join(sheet_file_name(sheet.kind, sheet.index));
    sheet.image.save(&path).map_err(|source| RenderError::Write {
        kind: "sheet",
        path: path.clone(),
        source,
    })?;
    info!(kind = %sheet.kind, index = sheet.index, placed = sheet.placed, "wrote sheet");
    Ok(path)
}
