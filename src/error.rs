use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while rendering cards or packing sheets.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A required template, font, badge or rendered card could not be loaded.
    #[error("failed to load asset {path}: {reason}")]
    Asset { path: PathBuf, reason: String },

    /// The text does not fit its box even at the smallest allowed size.
    #[error(
        "text \"{excerpt}\" does not fit {max_width}x{max_height} even at size {min_size} (needs {width}x{height})"
    )]
    TextOverflow {
        excerpt: String,
        min_size: u32,
        max_width: u32,
        max_height: u32,
        width: u32,
        height: u32,
    },

    /// The blank sheet template cannot hold the requested grid.
    #[error("sheet template is {actual_width}x{actual_height}, grid needs {needed_width}x{needed_height}")]
    SheetTooSmall {
        actual_width: u32,
        actual_height: u32,
        needed_width: u32,
        needed_height: u32,
    },

    /// The grid's pixel size does not fit in `u32`.
    #[error("a {columns}x{rows} grid of {cell_width}x{cell_height} cells is too large")]
    GridTooLarge {
        columns: u32,
        rows: u32,
        cell_width: u32,
        cell_height: u32,
    },

    #[error("failed to write {kind} image {path}: {source}")]
    Write {
        kind: &'static str,
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RenderError {
    pub(crate) fn asset(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        RenderError::Asset {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Failures raised while reading or normalizing deck sources.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("card text must not be empty")]
    EmptyText,

    #[error("pick count must be at least 1 (got {0})")]
    InvalidPick(u32),

    #[error("unknown card kind '{0}'")]
    UnknownKind(String),

    #[error("{path}: line {line}: {reason}")]
    Row {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("deck id '{0}' cannot be used as an output directory name")]
    InvalidId(String),

    #[error("deck '{0}' contains no cards")]
    EmptyDeck(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to fetch deck '{id}': {reason}")]
    Fetch { id: String, reason: String },
}
