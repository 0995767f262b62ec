//! Convenience helpers shared across command handlers.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use partycards::{BlockFace, CardRecord, TextFace, TrueTypeFace};

/// Load the card font, falling back to the built-in block face.
pub fn load_face(font: Option<&Path>) -> Result<Arc<dyn TextFace>> {
    match font {
        Some(path) => {
            let face = TrueTypeFace::load(path)
                .with_context(|| format!("failed to load font {}", path.display()))?;
            Ok(Arc::new(face))
        }
        None => Ok(Arc::new(BlockFace)),
    }
}

/// Human-readable card-by-card listing.
pub fn format_listing(records: &[CardRecord]) -> String {
    let mut output = String::new();
    for (idx, record) in records.iter().enumerate() {
        if idx > 0 {
            output.push('\n');
        }
        output.push_str(&format!(
            "Card {:>4} | {} | pick {}\n{}\n",
            idx, record.kind, record.pick, record.text
        ));
    }
    output
}
