use anyhow::Context;
use std::sync::Arc;

use crate::cache::PriceCache;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::fetcher::{HostPacer, HttpFetcher, PacedFetcher, PageFetcher};
use crate::prices::{FreshnessPolicy, PriceService};
use crate::scrape::Scraper;
use crate::shopping::{ProcessRunner, Reminders};
use crate::specials::{SearchEngine, SpecialsCollector};

pub type SharedFetcher = Arc<dyn PageFetcher>;

#[derive(Clone)]
pub struct AppState {
    pub prices: Arc<PriceService>,
    pub reminders: Reminders,
    pub specials: Arc<SpecialsCollector<SharedFetcher>>,
}

impl AppState {
    pub fn new(
        prices: Arc<PriceService>,
        reminders: Reminders,
        specials: Arc<SpecialsCollector<SharedFetcher>>,
    ) -> Self {
        Self {
            prices,
            reminders,
            specials,
        }
    }

    /// Wire the production collaborators: one paced HTTP fetcher shared by
    /// the scraper and the specials collector, file cache, and the
    /// reminders CLI.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let fetcher = page_fetcher(config)?;
        let prices = price_service_with(config, fetcher.clone()).await?;
        let reminders = Reminders::new(
            Arc::new(ProcessRunner::default()),
            config.reminders_command(),
        );
        let search = config.specials_search().then(SearchEngine::duckduckgo);
        let specials = SpecialsCollector::new(fetcher).with_search(search);
        Ok(Self::new(Arc::new(prices), reminders, Arc::new(specials)))
    }
}

/// reqwest fetcher behind the per-host pacer.
pub fn page_fetcher(config: &Config) -> anyhow::Result<SharedFetcher> {
    let http = HttpFetcher::new(config.request_timeout()).context("Failed to build HTTP client")?;
    let pacer = Arc::new(HostPacer::new(config.min_request_spacing()));
    Ok(Arc::new(PacedFetcher::new(http, pacer)))
}

/// Price service backed by the real HTTP fetcher.
pub async fn price_service(config: &Config) -> anyhow::Result<PriceService> {
    price_service_with(config, page_fetcher(config)?).await
}

async fn price_service_with(
    config: &Config,
    fetcher: SharedFetcher,
) -> anyhow::Result<PriceService> {
    let catalog = Catalog::load_or_builtin(config.catalog_path())
        .context("Failed to load product catalog")?;

    let scraper = Scraper::new(fetcher).with_attempts(config.fetch_attempts());
    let cache = PriceCache::open(config.cache_path()).await;

    Ok(PriceService::new(
        Arc::new(catalog),
        scraper,
        cache,
        FreshnessPolicy::from_config(config),
    ))
}
