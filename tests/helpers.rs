use async_trait::async_trait;
use axum::{Router, body::Body, http::Response};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pricewatch::{
    app_state::AppState,
    cache::PriceCache,
    catalog::{Catalog, Category, PlaceholderPrice, StoreTarget, TrackedProduct},
    fetcher::{HttpFetcher, PageFetcher},
    prices::{FreshnessPolicy, PriceService, Store},
    router::router,
    scrape::{Scraper, StoreProfile},
    shopping::{CommandError, CommandOutput, CommandRunner, Reminders},
    specials::{ListingSource, SearchEngine, SpecialsCollector},
};

/// Records every invocation and answers from a fixed script.
#[derive(Default)]
pub struct FakeRunner {
    pub calls: Mutex<Vec<Vec<String>>>,
    /// Calls with an argument containing this fragment exit non-zero.
    pub fail_on: Option<&'static str>,
    pub lists_stdout: &'static str,
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn execute(&self, _program: &str, args: &[String]) -> Result<CommandOutput, CommandError> {
        self.calls.lock().unwrap().push(args.to_vec());

        let failing = self
            .fail_on
            .is_some_and(|fragment| args.iter().any(|a| a.contains(fragment)));
        if !failing && args.first().map(String::as_str) == Some("list-lists") {
            return Ok(CommandOutput {
                exit_code: Some(0),
                stdout: self.lists_stdout.to_string(),
                stderr: String::new(),
            });
        }

        Ok(if failing {
            CommandOutput {
                exit_code: Some(1),
                stdout: String::new(),
                stderr: "list not found".to_string(),
            }
        } else {
            CommandOutput {
                exit_code: Some(0),
                stdout: "added".to_string(),
                stderr: String::new(),
            }
        })
    }
}

/// Milk by product page at both stores; eggs by search at Coles and by
/// product page at Woolworths. Everything lives on the mock server.
pub fn catalog(base: &str) -> Catalog {
    let placeholder = |coles: f64, woolworths: f64| {
        BTreeMap::from([
            (Store::Coles, PlaceholderPrice { price: coles, special: false }),
            (Store::Woolworths, PlaceholderPrice { price: woolworths, special: false }),
        ])
    };

    Catalog::new(vec![
        TrackedProduct {
            id: "milk".to_string(),
            name: "Full Cream Milk 2L".to_string(),
            category: Category::Dairy,
            targets: BTreeMap::from([
                (Store::Coles, StoreTarget::Url(format!("{base}/coles/product/milk"))),
                (Store::Woolworths, StoreTarget::Url(format!("{base}/woolworths/product/milk"))),
            ]),
            placeholder: placeholder(3.10, 3.10),
        },
        TrackedProduct {
            id: "eggs".to_string(),
            name: "Free Range Eggs 12pk".to_string(),
            category: Category::Dairy,
            targets: BTreeMap::from([
                (
                    Store::Coles,
                    StoreTarget::Search(vec!["free range eggs".to_string(), "eggs".to_string()]),
                ),
                (Store::Woolworths, StoreTarget::Url(format!("{base}/woolworths/product/eggs"))),
            ]),
            placeholder: placeholder(6.50, 6.20),
        },
    ])
    .unwrap()
}

fn fetcher() -> Arc<dyn PageFetcher> {
    Arc::new(HttpFetcher::new(Duration::from_secs(5)).unwrap())
}

pub async fn price_service(base: &str, cache_dir: &Path) -> PriceService {
    let scraper = Scraper::new(fetcher())
        .with_attempts(1)
        .with_backoff_base(Duration::ZERO)
        .with_profile(StoreProfile::coles().with_search_url(format!("{base}/coles/search?q={{query}}")));
    let cache = PriceCache::open(cache_dir.join("prices.json")).await;

    PriceService::new(
        Arc::new(catalog(base)),
        scraper,
        cache,
        FreshnessPolicy::default(),
    )
}

/// Store listings at `/specials/<store>`, search results at `/search`.
pub fn specials_collector(base: &str) -> SpecialsCollector<Arc<dyn PageFetcher>> {
    SpecialsCollector::new(fetcher())
        .with_listings(vec![
            ListingSource::coles_on_special().with_url(format!("{base}/specials/coles")),
            ListingSource::woolworths_specials().with_url(format!("{base}/specials/woolworths")),
        ])
        .with_search(Some(
            SearchEngine::duckduckgo().with_url_template(format!("{base}/search?q={{query}}")),
        ))
}

pub async fn test_app(base: &str, cache_dir: &Path, runner: Arc<FakeRunner>) -> Router {
    let prices = price_service(base, cache_dir).await;
    let reminders = Reminders::new(runner, "reminders");
    let specials = specials_collector(base);
    router(AppState::new(Arc::new(prices), reminders, Arc::new(specials)))
}

pub async fn body_json<T: DeserializeOwned>(response: Response<Body>) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
