use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SourceError;

const CARD_INFIX: &str = "-card_";
const SHEET_INFIX: &str = "-sheet_";
const IMAGE_EXT: &str = ".png";

/// Which face of the game a card belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    /// Prompt card with blanks; carries a pick count.
    Primary,
    /// Response card played into a prompt's blanks.
    Secondary,
}

impl CardKind {
    pub const ALL: [CardKind; 2] = [CardKind::Primary, CardKind::Secondary];

    pub fn label(self) -> &'static str {
        match self {
            CardKind::Primary => "primary",
            CardKind::Secondary => "secondary",
        }
    }
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CardKind {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" | "black" | "call" | "prompt" => Ok(CardKind::Primary),
            "secondary" | "white" | "response" | "answer" => Ok(CardKind::Secondary),
            other => Err(SourceError::UnknownKind(other.to_string())),
        }
    }
}

/// One card definition, ready to be composed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardRecord {
    pub kind: CardKind,
    pub text: String,
    /// Number of responses a prompt asks for. Ignored for secondary cards.
    pub pick: u32,
}

impl CardRecord {
    /// Build a record, rejecting blank text and zero picks.
    pub fn new<S: Into<String>>(kind: CardKind, text: S, pick: u32) -> Result<Self, SourceError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(SourceError::EmptyText);
        }
        if pick == 0 {
            return Err(SourceError::InvalidPick(pick));
        }
        Ok(Self { kind, text, pick })
    }

    pub fn primary<S: Into<String>>(text: S, pick: u32) -> Result<Self, SourceError> {
        Self::new(CardKind::Primary, text, pick)
    }

    pub fn secondary<S: Into<String>>(text: S) -> Result<Self, SourceError> {
        Self::new(CardKind::Secondary, text, 1)
    }
}

/// Per-deck switches controlling decorations and sheet output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckMetadata {
    pub name: String,
    pub enable_subtitle: bool,
    pub enable_sheet: bool,
}

impl DeckMetadata {
    pub fn named<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            enable_subtitle: false,
            enable_sheet: false,
        }
    }
}

/// A single row of the options table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeckOptionEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub subtitle: bool,
    #[serde(default)]
    pub sheet: bool,
}

/// Options table keyed by deck source identifier (CSV stem or remote code).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct DeckOptions {
    entries: BTreeMap<String, DeckOptionEntry>,
}

impl DeckOptions {
    pub fn load(path: &Path) -> Result<Self, SourceError> {
        let raw = fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| SourceError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn insert<S: Into<String>>(&mut self, id: S, entry: DeckOptionEntry) {
        self.entries.insert(id.into(), entry);
    }

    /// Resolve metadata for `id`; unknown ids get no subtitle and no sheets.
    pub fn resolve(&self, id: &str, fallback_name: Option<&str>) -> DeckMetadata {
        let fallback = fallback_name.unwrap_or(id);
        match self.entries.get(id) {
            Some(entry) => DeckMetadata {
                name: entry.name.clone().unwrap_or_else(|| fallback.to_string()),
                enable_subtitle: entry.subtitle,
                enable_sheet: entry.sheet,
            },
            None => DeckMetadata::named(fallback),
        }
    }
}

/// Parsed name of a rendered card file, `<kind>-card_<n>.png`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardFileName {
    pub kind: CardKind,
    pub index: usize,
}

impl CardFileName {
    pub fn new(kind: CardKind, index: usize) -> Self {
        Self { kind, index }
    }

    /// Parse a file name; sheets and unrelated files yield `None`.
    pub fn parse(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(IMAGE_EXT)?;
        let (kind, index) = stem.split_once(CARD_INFIX)?;
        let kind = match kind {
            "primary" => CardKind::Primary,
            "secondary" => CardKind::Secondary,
            _ => return None,
        };
        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self {
            kind,
            index: index.parse().ok()?,
        })
    }
}

impl fmt::Display for CardFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}{}", self.kind, CARD_INFIX, self.index, IMAGE_EXT)
    }
}

/// File name of the `index`-th (1-based) sheet of a kind.
pub fn sheet_file_name(kind: CardKind, index: usize) -> String {
    format!("{kind}{SHEET_INFIX}{index}{IMAGE_EXT}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn kind_aliases_parse() {
        assert_eq!("Black".parse::<CardKind>().unwrap(), CardKind::Primary);
        assert_eq!(" call ".parse::<CardKind>().unwrap(), CardKind::Primary);
        assert_eq!("white".parse::<CardKind>().unwrap(), CardKind::Secondary);
        assert_eq!("secondary".parse::<CardKind>().unwrap(), CardKind::Secondary);
        assert!("green".parse::<CardKind>().is_err());
    }

    #[test]
    fn record_rejects_blank_text_and_zero_pick() {
        assert!(matches!(
            CardRecord::primary("   ", 1),
            Err(SourceError::EmptyText)
        ));
        assert!(matches!(
            CardRecord::primary("Why?", 0),
            Err(SourceError::InvalidPick(0))
        ));
    }

    #[test]
    fn card_file_names_round_trip_and_sheets_are_ignored() {
        let name = CardFileName::new(CardKind::Secondary, 12).to_string();
        assert_eq!(name, "secondary-card_12.png");
        assert_eq!(
            CardFileName::parse(&name),
            Some(CardFileName::new(CardKind::Secondary, 12))
        );
        assert_eq!(CardFileName::parse("primary-sheet_1.png"), None);
        assert_eq!(CardFileName::parse("primary-card_.png"), None);
        assert_eq!(CardFileName::parse("primary-card_3.jpg"), None);
        assert_eq!(CardFileName::parse("primary-card_-3.png"), None);
        assert_eq!(sheet_file_name(CardKind::Primary, 2), "primary-sheet_2.png");
    }

    #[test]
    fn options_resolve_known_and_unknown_ids() {
        let options: DeckOptions = serde_json::from_str(
            r#"{"base": {"name": "Base Game", "subtitle": true, "sheet": true}, "extra": {}}"#,
        )
        .unwrap();
        assert_eq!(
            options.resolve("base", None),
            DeckMetadata {
                name: "Base Game".to_string(),
                enable_subtitle: true,
                enable_sheet: true,
            }
        );
        assert_eq!(
            options.resolve("extra", Some("Extra Pack")),
            DeckMetadata::named("Extra Pack")
        );
        assert_eq!(options.resolve("missing", None), DeckMetadata::named("missing"));
    }
}
