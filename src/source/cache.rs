use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::SourceError;
use crate::source::remote::DeckPayload;

pub const DEFAULT_CACHE_TTL_HOURS: i64 = 24;
const HTTP_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Anything that can produce the payload of a remote deck by id.
pub trait DeckFetcher: Send + Sync {
    fn fetch(&self, id: &str) -> Result<DeckPayload, SourceError>;
}

/// Fetches decks as JSON from `<base_url>/<id>`.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpFetcher {
    pub fn new<S: Into<String>>(base_url: S) -> Result<Self, SourceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| SourceError::Fetch {
                id: String::new(),
                reason: err.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url(&self, id: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), id)
    }
}

impl DeckFetcher for HttpFetcher {
    fn fetch(&self, id: &str) -> Result<DeckPayload, SourceError> {
        let fetch_err = |reason: String| SourceError::Fetch {
            id: id.to_string(),
            reason,
        };
        let url = self.url(id);
        debug!(%url, "fetching remote deck");
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| fetch_err(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(fetch_err(format!("{url} returned {status}")));
        }
        response
            .json::<DeckPayload>()
            .map_err(|err| fetch_err(format!("invalid deck payload: {err}")))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    fetched_at: DateTime<Utc>,
    payload: DeckPayload,
}

/// Wraps a fetcher with an on-disk JSON cache that expires after `ttl`.
pub struct CachedFetcher<F> {
    inner: F,
    dir: PathBuf,
    ttl: Duration,
}

impl<F: DeckFetcher> CachedFetcher<F> {
    pub fn new(inner: F, dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            inner,
            dir: dir.into(),
            ttl,
        }
    }

    /// Cache file for a deck id; ids that are not filename-safe are hashed.
    pub fn entry_path(&self, id: &str) -> PathBuf {
        let safe = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        let stem = if safe {
            id.to_string()
        } else {
            format!("{:x}", Sha256::digest(id.as_bytes()))
        };
        self.dir.join(format!("{stem}.json"))
    }

    /// Serve from cache when younger than the TTL at `now`, else fetch and store.
    pub fn fetch_at(&self, id: &str, now: DateTime<Utc>) -> Result<DeckPayload, SourceError> {
        let path = self.entry_path(id);
        match read_entry(&path) {
            Ok(Some(entry)) if now - entry.fetched_at < self.ttl => {
                debug!(id, fetched_at = %entry.fetched_at, "remote deck served from cache");
                return Ok(entry.payload);
            }
            Ok(Some(_)) => info!(id, "cached deck expired; refetching"),
            Ok(None) => {}
            Err(err) => warn!(id, error = %err, "unreadable cache entry; refetching"),
        }

        let payload = self.inner.fetch(id)?;
        write_entry(
            &path,
            &CacheEntry {
                fetched_at: now,
                payload: payload.clone(),
            },
        )?;
        Ok(payload)
    }
}

impl<F: DeckFetcher> DeckFetcher for CachedFetcher<F> {
    fn fetch(&self, id: &str) -> Result<DeckPayload, SourceError> {
        self.fetch_at(id, Utc::now())
    }
}

fn read_entry(path: &Path) -> Result<Option<CacheEntry>, SourceError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&raw)
        .map(Some)
        .map_err(|source| SourceError::Json {
            path: path.to_path_buf(),
            source,
        })
}

fn write_entry(path: &Path, entry: &CacheEntry) -> Result<(), SourceError> {
    let io_err = |source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let body = serde_json::to_vec_pretty(entry).map_err(|source| SourceError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, body).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::remote::CallPart;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFetcher {
        calls: AtomicUsize,
    }

    impl DeckFetcher for CountingFetcher {
        fn fetch(&self, id: &str) -> Result<DeckPayload, SourceError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(DeckPayload {
                name: Some(format!("{id} v{n}")),
                calls: vec![vec![CallPart::Text("Hello".to_string())]],
                responses: Vec::new(),
            })
        }
    }

    fn cached(dir: &Path) -> CachedFetcher<CountingFetcher> {
        CachedFetcher::new(
            CountingFetcher {
                calls: AtomicUsize::new(0),
            },
            dir,
            Duration::hours(DEFAULT_CACHE_TTL_HOURS),
        )
    }

    #[test]
    fn fresh_entry_is_served_without_fetching() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = cached(dir.path());
        let t0 = Utc::now();
        let first = fetcher.fetch_at("ABCDE", t0).unwrap();
        let second = fetcher.fetch_at("ABCDE", t0 + Duration::hours(23)).unwrap();
        assert_eq!(first, second);
        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 1);
        assert!(dir.path().join("ABCDE.json").exists());
    }

    #[test]
    fn expired_entry_is_refetched() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = cached(dir.path());
        let t0 = Utc::now();
        fetcher.fetch_at("ABCDE", t0).unwrap();
        let later = fetcher.fetch_at("ABCDE", t0 + Duration::hours(25)).unwrap();
        assert_eq!(later.name.as_deref(), Some("ABCDE v2"));
        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn corrupt_entry_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = cached(dir.path());
        fs::write(fetcher.entry_path("ABCDE"), "{not json").unwrap();
        let payload = fetcher.fetch_at("ABCDE", Utc::now()).unwrap();
        assert_eq!(payload.name.as_deref(), Some("ABCDE v1"));
        assert!(read_entry(&fetcher.entry_path("ABCDE")).unwrap().is_some());
    }

    #[test]
    fn unsafe_ids_are_hashed() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = cached(dir.path());
        let path = fetcher.entry_path("../escape");
        assert_eq!(path.parent(), Some(dir.path()));
        assert_ne!(path.file_name().unwrap(), "../escape.json");
    }
}
