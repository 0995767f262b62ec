//! Deck sources: local CSV files and remote decks behind a TTL cache.

mod cache;
mod local;
mod remote;

pub use cache::{CachedFetcher, DEFAULT_CACHE_TTL_HOURS, DeckFetcher, HttpFetcher};
pub use local::read_csv;
pub use remote::{
    BLANK_PLACEHOLDER, BlankMarker, CallPart, DeckPayload, ResponseText, normalize_call,
    normalize_payload,
};
