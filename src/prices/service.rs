use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::cache::{self, CacheError, CacheState, PriceCache};
use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::ApiError;
use crate::fetcher::PageFetcher;
use crate::prices::dtos::{ManualPricesRequest, StatusResponse};
use crate::prices::model::{
    PriceQuote, PriceSnapshot, QuoteSource, ScrapeMethod, Store, StoreReport,
};
use crate::scrape::{ScrapeCycle, Scraper};

#[derive(Debug, Clone, Copy)]
pub struct FreshnessPolicy {
    /// Age after which `GET /api/prices` triggers a refresh.
    pub cache_ttl: Duration,
    /// Age after which the status endpoint reports `stale`.
    pub status_stale_after: Duration,
    /// Keep last cycle's scraped quote for products that failed this cycle.
    pub keep_stale_on_failure: bool,
}

impl FreshnessPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cache_ttl: config.cache_ttl(),
            status_stale_after: config.status_stale_after(),
            keep_stale_on_failure: config.keep_stale_on_failure(),
        }
    }
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(3600),
            status_stale_after: Duration::from_secs(7200),
            keep_stale_on_failure: false,
        }
    }
}

/// Serves cached prices and coordinates refreshes. At most one scrape
/// cycle runs at a time; callers that arrive while one is running get its
/// result.
pub struct PriceService {
    catalog: Arc<Catalog>,
    scraper: Scraper<Arc<dyn PageFetcher>>,
    cache: PriceCache,
    policy: FreshnessPolicy,
    refresh_lock: Mutex<()>,
    /// Bumped after every completed refresh.
    generation: AtomicU64,
}

impl PriceService {
    pub fn new(
        catalog: Arc<Catalog>,
        scraper: Scraper<Arc<dyn PageFetcher>>,
        cache: PriceCache,
        policy: FreshnessPolicy,
    ) -> Self {
        Self {
            catalog,
            scraper,
            cache,
            policy,
            refresh_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub async fn cached(&self) -> Option<CacheState> {
        self.cache.read().await
    }

    /// The cached snapshot while fresh, otherwise a refreshed one.
    pub async fn current(&self) -> Result<PriceSnapshot, CacheError> {
        let seen = self.generation.load(Ordering::Acquire);
        if let Some(state) = self.cache.read().await
            && cache::is_fresh(&state, Utc::now(), self.policy.cache_ttl)
        {
            debug!("serving cached prices");
            return Ok(state.snapshot);
        }
        self.refresh_since(seen).await
    }

    /// Run a scrape cycle, or wait for the one already running.
    pub async fn refresh(&self) -> Result<PriceSnapshot, CacheError> {
        self.refresh_since(self.generation.load(Ordering::Acquire)).await
    }

    /// Refresh unless one completed after generation `seen` was observed.
    #[instrument(skip(self))]
    async fn refresh_since(&self, seen: u64) -> Result<PriceSnapshot, CacheError> {
        let _guard = self.refresh_lock.lock().await;

        if self.generation.load(Ordering::Acquire) != seen
            && let Some(state) = self.cache.read().await
        {
            debug!("refresh completed while waiting, reusing result");
            return Ok(state.snapshot);
        }

        let previous = self.cache.read().await;
        let cycle = self.scraper.scrape_catalog(&self.catalog).await;
        let snapshot = self.compose(cycle, previous.as_ref(), Utc::now());
        let manual = snapshot.has_manual();

        let state = self.cache.write(snapshot, manual).await?;
        self.generation.fetch_add(1, Ordering::AcqRel);
        info!(
            method = ?state.snapshot.report.method,
            items_scraped = state.snapshot.report.items_scraped,
            "prices refreshed"
        );
        Ok(state.snapshot)
    }

    /// Validate and merge manual entries. Stays in effect across automatic
    /// refreshes until cleared.
    pub async fn save_manual(
        &self,
        request: ManualPricesRequest,
    ) -> Result<CacheState, ApiError> {
        request.validate()?;
        let now = Utc::now();
        let quotes = request.into_quotes(&self.catalog, now);
        Ok(self.cache.merge_manual(quotes, now).await?)
    }

    pub async fn clear_manual(&self) -> Result<Option<CacheState>, CacheError> {
        self.cache.clear_manual().await
    }

    pub async fn status(&self) -> StatusResponse {
        let now = Utc::now();
        let state = self.cache.read().await;
        let status = cache::status(state.as_ref(), now, self.policy.status_stale_after);

        match state {
            None => StatusResponse {
                status,
                last_update: None,
                age_minutes: None,
                item_counts: Store::ALL.into_iter().map(|s| (s, 0)).collect(),
                method: None,
                is_manual: false,
                blocked: Default::default(),
            },
            Some(state) => StatusResponse {
                status,
                last_update: Some(state.snapshot.timestamp),
                age_minutes: Some(cache::age_minutes(&state, now)),
                item_counts: state.snapshot.item_counts(),
                method: Some(state.snapshot.report.method),
                is_manual: state.manual,
                blocked: state.snapshot.report.blocked_stores(),
            },
        }
    }

    /// Build the snapshot for a finished cycle: scraped quotes, optional
    /// carried quotes, placeholders on total failure, then manual entries
    /// on top.
    fn compose(
        &self,
        cycle: ScrapeCycle,
        previous: Option<&CacheState>,
        now: DateTime<Utc>,
    ) -> PriceSnapshot {
        let mut snapshot = PriceSnapshot::new(now);
        let items_scraped = cycle.items_scraped();

        for (store, outcome) in cycle.stores {
            snapshot.report.stores.insert(
                store,
                StoreReport {
                    scraped: outcome.quotes.len(),
                    failed: outcome.failures.len(),
                    skipped: outcome.skipped.len(),
                    blocked: outcome.blocked.is_some(),
                    blocked_reason: outcome.blocked,
                },
            );
            for quote in outcome.quotes {
                snapshot.insert(quote);
            }
        }
        snapshot.report.items_scraped = items_scraped;

        if items_scraped == 0 {
            warn!("no prices scraped, falling back to placeholder prices");
            for quote in placeholder_quotes(&self.catalog, now) {
                snapshot.insert(quote);
            }
            snapshot.report.method = ScrapeMethod::Placeholder;
        } else if self.policy.keep_stale_on_failure
            && let Some(previous) = previous
        {
            let carried = carry_forward(&mut snapshot, &previous.snapshot);
            if carried > 0 {
                info!(carried, "kept previous prices for failed products");
            }
        }

        if let Some(previous) = previous {
            for quote in previous.snapshot.manual_quotes() {
                snapshot.insert(quote);
            }
        }
        snapshot
    }
}

/// Copy previous scraped or carried quotes into gaps of `snapshot`.
fn carry_forward(snapshot: &mut PriceSnapshot, previous: &PriceSnapshot) -> usize {
    let gaps: Vec<PriceQuote> = previous
        .quotes()
        .filter(|q| matches!(q.source, QuoteSource::Scraped | QuoteSource::Carried))
        .filter(|q| snapshot.quote(q.store, &q.product_id).is_none())
        .cloned()
        .collect();
    let count = gaps.len();
    for mut quote in gaps {
        quote.source = QuoteSource::Carried;
        snapshot.insert(quote);
    }
    count
}

/// Badge text carried by placeholder specials, which have no was-price.
pub const PLACEHOLDER_SPECIAL_LABEL: &str = "Special";

/// Every catalog product at every store from the placeholder table.
pub fn placeholder_quotes(catalog: &Catalog, now: DateTime<Utc>) -> Vec<PriceQuote> {
    let mut quotes = Vec::new();
    for product in catalog.products() {
        for store in Store::ALL {
            let Some(placeholder) = product.placeholder.get(&store) else {
                debug!(product = %product.id, %store, "no placeholder price");
                continue;
            };
            quotes.push(PriceQuote {
                store,
                product_id: product.id.clone(),
                name: product.name.clone(),
                price: placeholder.price,
                was_price: None,
                special: placeholder.special,
                special_price: None,
                special_type: placeholder.special.then(|| PLACEHOLDER_SPECIAL_LABEL.to_string()),
                found_name: None,
                url: None,
                retrieved_at: now,
                source: QuoteSource::Placeholder,
            });
        }
    }
    quotes
}
