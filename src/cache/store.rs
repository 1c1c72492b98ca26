use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::prices::model::{PriceQuote, PriceSnapshot, ScrapeMethod};

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// What the cache file holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheState {
    pub snapshot: PriceSnapshot,
    /// True while any manual quote is present; bypasses the freshness timer.
    #[serde(default)]
    pub manual: bool,
    #[serde(default)]
    pub manual_updated_at: Option<DateTime<Utc>>,
}

/// File-backed price cache. The in-memory copy is authoritative for reads;
/// the file is only touched on open and inside the write path.
pub struct PriceCache {
    path: PathBuf,
    state: RwLock<Option<CacheState>>,
}

impl PriceCache {
    /// Open the cache at `path`. A missing or corrupt file starts empty.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = load(&path).await;
        Self {
            path,
            state: RwLock::new(state),
        }
    }

    pub async fn read(&self) -> Option<CacheState> {
        self.state.read().await.clone()
    }

    /// Replace the snapshot.
    #[instrument(skip(self, snapshot))]
    pub async fn write(
        &self,
        snapshot: PriceSnapshot,
        manual: bool,
    ) -> Result<CacheState, CacheError> {
        let mut guard = self.state.write().await;
        let manual_updated_at = if manual {
            guard
                .as_ref()
                .and_then(|s| s.manual_updated_at)
                .or(Some(snapshot.timestamp))
        } else {
            None
        };
        let next = CacheState {
            snapshot,
            manual,
            manual_updated_at,
        };
        persist(&self.path, &next).await?;
        *guard = Some(next.clone());
        Ok(next)
    }

    /// Merge manual quotes into the current snapshot, one product at a time.
    /// Products not named in `quotes` keep their existing values.
    #[instrument(skip_all, fields(count = quotes.len()))]
    pub async fn merge_manual(
        &self,
        quotes: Vec<PriceQuote>,
        now: DateTime<Utc>,
    ) -> Result<CacheState, CacheError> {
        let mut guard = self.state.write().await;
        let mut snapshot = guard
            .as_ref()
            .map(|s| s.snapshot.clone())
            .unwrap_or_else(|| PriceSnapshot::new(now));
        for quote in quotes {
            snapshot.insert(quote);
        }
        snapshot.timestamp = now;
        snapshot.report.method = ScrapeMethod::Manual;

        let next = CacheState {
            snapshot,
            manual: true,
            manual_updated_at: Some(now),
        };
        persist(&self.path, &next).await?;
        *guard = Some(next.clone());
        info!("manual prices merged");
        Ok(next)
    }

    /// Drop every manual quote and hand freshness back to the timer.
    /// Returns `None` when there is nothing cached.
    #[instrument(skip_all)]
    pub async fn clear_manual(&self) -> Result<Option<CacheState>, CacheError> {
        let mut guard = self.state.write().await;
        let Some(current) = guard.as_ref() else {
            return Ok(None);
        };

        let mut snapshot = current.snapshot.clone();
        let removed = snapshot.remove_manual();
        if snapshot.report.method == ScrapeMethod::Manual {
            snapshot.report.method = ScrapeMethod::Automatic;
        }
        let next = CacheState {
            snapshot,
            manual: false,
            manual_updated_at: None,
        };
        persist(&self.path, &next).await?;
        *guard = Some(next.clone());
        info!(removed, "manual prices cleared");
        Ok(Some(next))
    }
}

async fn load(path: &Path) -> Option<CacheState> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no cache file yet");
            return None;
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cache file unreadable");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(state) => Some(state),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cache file corrupt, starting empty");
            None
        }
    }
}

/// Write to a sibling temp file and rename over the target.
async fn persist(path: &Path, state: &CacheState) -> Result<(), CacheError> {
    let json = serde_json::to_vec_pretty(state)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, &json).await?;
    tokio::fs::rename(&tmp, path).await?;
    debug!(path = %path.display(), bytes = json.len(), "cache persisted");
    Ok(())
}
