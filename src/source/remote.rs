use serde::{Deserialize, Serialize};

use crate::deck::CardRecord;
use crate::error::SourceError;

/// Rendered in place of each blank in a prompt.
pub const BLANK_PLACEHOLDER: &str = "_______";

/// The subset of a remote deck the renderer consumes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeckPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub calls: Vec<Vec<CallPart>>,
    #[serde(default)]
    pub responses: Vec<ResponseText>,
}

/// A fragment of a prompt: literal text, a blank, or a nested line of parts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CallPart {
    Text(String),
    Line(Vec<CallPart>),
    Blank(BlankMarker),
}

/// Blank markers are JSON objects; any styling fields they carry are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BlankMarker {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ResponseText {
    Text(String),
    Lines(Vec<String>),
}

/// Turn a remote payload into card records: calls first, then responses.
pub fn normalize_payload(id: &str, payload: &DeckPayload) -> Result<Vec<CardRecord>, SourceError> {
    let mut records = Vec::with_capacity(payload.calls.len() + payload.responses.len());
    for call in &payload.calls {
        records.push(normalize_call(call)?);
    }
    for response in &payload.responses {
        let text = match response {
            ResponseText::Text(text) => text.trim().to_string(),
            ResponseText::Lines(lines) => lines.join(" ").trim().to_string(),
        };
        records.push(CardRecord::secondary(text)?);
    }
    if records.is_empty() {
        return Err(SourceError::EmptyDeck(id.to_string()));
    }
    Ok(records)
}

/// Join a call's fragments into prompt text and derive its pick count.
///
/// The first blank belongs to the prompt itself, so the pick count is
/// `max(1, blanks - 1)`.
pub fn normalize_call(parts: &[CallPart]) -> Result<CardRecord, SourceError> {
    let mut fragments = Vec::new();
    let mut blanks = 0u32;
    collect_fragments(parts, &mut fragments, &mut blanks);

    let mut text = fragments.join(" ").trim_end().to_string();
    if text.ends_with(BLANK_PLACEHOLDER) {
        text.push('.');
    }
    let pick = blanks.saturating_sub(1).max(1);
    CardRecord::primary(text, pick)
}

fn collect_fragments<'a>(parts: &'a [CallPart], fragments: &mut Vec<&'a str>, blanks: &mut u32) {
    for part in parts {
        match part {
            CallPart::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    fragments.push(text);
                }
            }
            CallPart::Line(line) => collect_fragments(line, fragments, blanks),
            CallPart::Blank(_) => {
                *blanks += 1;
                fragments.push(BLANK_PLACEHOLDER);
            }
        }
    }
}
