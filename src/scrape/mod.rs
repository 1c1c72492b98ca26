pub mod backoff;
pub mod profile;

pub use backoff::backoff_delay;
pub use profile::StoreProfile;

use chrono::Utc;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::catalog::{Catalog, StoreTarget, TrackedProduct};
use crate::extractor::{SpecialOutcome, detect_special, find_badge, first_price, first_text};
use crate::fetcher::{FetchError, PageFetcher, PageResponse, browser_headers};
use crate::prices::model::{PriceQuote, QuoteSource, Store};

const DEFAULT_BACKOFF_BASE: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("No price found on page")]
    NoPrice,

    #[error("No product tile matched {0:?}")]
    NoMatchingTile(Vec<String>),

    #[error("Product has no search terms")]
    NoSearchTerms,
}

impl ScrapeError {
    pub fn is_blocked(&self) -> bool {
        matches!(self, ScrapeError::Fetch(e) if e.is_blocked())
    }
}

/// What one store produced in a cycle.
#[derive(Debug, Default)]
pub struct StoreOutcome {
    pub quotes: Vec<PriceQuote>,
    /// (product id, error) for every product that failed.
    pub failures: Vec<(String, ScrapeError)>,
    pub blocked: Option<String>,
    pub skipped: Vec<String>,
}

/// Result of scraping the whole catalog.
#[derive(Debug, Default)]
pub struct ScrapeCycle {
    pub stores: BTreeMap<Store, StoreOutcome>,
}

impl ScrapeCycle {
    pub fn items_scraped(&self) -> usize {
        self.stores.values().map(|o| o.quotes.len()).sum()
    }
}

/// Fields read off a product page or search tile.
#[derive(Debug, Clone, PartialEq)]
struct Extracted {
    outcome: SpecialOutcome,
    found_name: Option<String>,
}

/// Runs the catalog through a page fetcher and the extractor.
pub struct Scraper<F> {
    fetcher: F,
    profiles: BTreeMap<Store, StoreProfile>,
    attempts: u32,
    backoff_base: Duration,
}

impl<F: PageFetcher> Scraper<F> {
    pub fn new(fetcher: F) -> Self {
        let profiles = Store::ALL
            .into_iter()
            .map(|store| (store, StoreProfile::for_store(store)))
            .collect();
        Self {
            fetcher,
            profiles,
            attempts: 2,
            backoff_base: DEFAULT_BACKOFF_BASE,
        }
    }

    /// Total tries per page, including the first.
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    pub fn with_profile(mut self, profile: StoreProfile) -> Self {
        self.profiles.insert(profile.store, profile);
        self
    }

    /// Scrape every store concurrently; products within a store run in order.
    #[instrument(skip_all, fields(products = catalog.len()))]
    pub async fn scrape_catalog(&self, catalog: &Catalog) -> ScrapeCycle {
        let (coles, woolworths) = tokio::join!(
            self.scrape_store(Store::Coles, catalog),
            self.scrape_store(Store::Woolworths, catalog),
        );
        let cycle = ScrapeCycle {
            stores: BTreeMap::from([(Store::Coles, coles), (Store::Woolworths, woolworths)]),
        };
        info!(items_scraped = cycle.items_scraped(), "scrape cycle finished");
        cycle
    }

    #[instrument(skip(self, catalog), fields(store = %store))]
    pub async fn scrape_store(&self, store: Store, catalog: &Catalog) -> StoreOutcome {
        let mut outcome = StoreOutcome::default();
        let Some(profile) = self.profiles.get(&store) else {
            warn!("no profile configured");
            return outcome;
        };

        for product in catalog.products() {
            if let Some(reason) = &outcome.blocked {
                debug!(product = %product.id, %reason, "skipping, store blocked");
                outcome.skipped.push(product.id.clone());
                continue;
            }
            let Some(target) = product.target(store) else {
                continue;
            };

            match self.scrape_product(profile, product, target).await {
                Ok(quote) => {
                    debug!(product = %product.id, price = quote.price, special = quote.special, "scraped");
                    outcome.quotes.push(quote);
                }
                Err(e) if e.is_blocked() => {
                    warn!(product = %product.id, error = %e, "store blocked, aborting store for this cycle");
                    outcome.blocked = Some(e.to_string());
                    outcome.failures.push((product.id.clone(), e));
                }
                Err(e) => {
                    warn!(product = %product.id, error = %e, "product failed");
                    outcome.failures.push((product.id.clone(), e));
                }
            }
        }
        outcome
    }

    pub async fn scrape_product(
        &self,
        profile: &StoreProfile,
        product: &TrackedProduct,
        target: &StoreTarget,
    ) -> Result<PriceQuote, ScrapeError> {
        let (url, extracted) = match target {
            StoreTarget::Url(url) => {
                let page = self.fetch_with_retry(url).await?;
                let extracted = extract_product_page(profile, &page.body)?;
                (page.url_final.to_string(), extracted)
            }
            StoreTarget::Search(terms) => {
                let first = terms.first().ok_or(ScrapeError::NoSearchTerms)?;
                let url = profile.search_url_for(first);
                let page = self.fetch_with_retry(&url).await?;
                let extracted = extract_search_tile(profile, &page.body, terms)?;
                (page.url_final.to_string(), extracted)
            }
        };

        let outcome = extracted.outcome;
        Ok(PriceQuote {
            store: profile.store,
            product_id: product.id.clone(),
            name: product.name.clone(),
            price: outcome.price,
            was_price: outcome.was_price,
            special: outcome.special,
            special_price: outcome.special_price,
            special_type: outcome.special_type,
            found_name: extracted.found_name,
            url: Some(url),
            retrieved_at: Utc::now(),
            source: QuoteSource::Scraped,
        })
    }

    async fn fetch_with_retry(&self, url: &str) -> Result<PageResponse, FetchError> {
        let mut attempt = 0;
        loop {
            match self.fetcher.fetch(url, browser_headers()).await {
                Ok(page) => return Ok(page),
                Err(e) if e.should_retry() && attempt + 1 < self.attempts => {
                    let delay = backoff_delay(attempt, self.backoff_base);
                    debug!(url, error = %e, attempt, ?delay, "retrying fetch");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn extract_product_page(profile: &StoreProfile, body: &str) -> Result<Extracted, ScrapeError> {
    let doc = Html::parse_document(body);
    extract_from(profile, &doc)
}

/// Pick the first tile whose name contains any search term and extract
/// from that tile alone.
fn extract_search_tile(
    profile: &StoreProfile,
    body: &str,
    terms: &[String],
) -> Result<Extracted, ScrapeError> {
    let doc = Html::parse_document(body);
    let lowered_terms: Vec<String> = terms.iter().map(|t| t.to_lowercase()).collect();

    let tiles: Vec<String> = profile
        .tiles
        .iter()
        .filter_map(|selector| Selector::parse(selector).ok())
        .map(|selector| doc.select(&selector).map(|el| el.html()).collect::<Vec<_>>())
        .find(|tiles| !tiles.is_empty())
        .unwrap_or_default();
    debug!(store = %profile.store, tiles = tiles.len(), "search tiles found");

    for tile in tiles {
        let fragment = Html::parse_fragment(&tile);
        let Some(name) = first_text(&profile.name, &fragment) else {
            continue;
        };
        let lowered = name.to_lowercase();
        if lowered_terms.iter().any(|term| lowered.contains(term.as_str())) {
            return extract_from(profile, &fragment);
        }
    }
    Err(ScrapeError::NoMatchingTile(terms.to_vec()))
}

fn extract_from(profile: &StoreProfile, doc: &Html) -> Result<Extracted, ScrapeError> {
    let current = first_price(&profile.price, doc, profile.bounds).ok_or(ScrapeError::NoPrice)?;
    let was = first_price(&profile.was_price, doc, profile.bounds);
    let badge = find_badge(&profile.badge, &profile.badge_keywords, doc);

    Ok(Extracted {
        outcome: detect_special(current, was, badge.as_ref()),
        found_name: first_text(&profile.name, doc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;
    use crate::fetcher::client::MockPageFetcher;
    use reqwest::StatusCode;

    fn product(id: &str, coles: StoreTarget) -> TrackedProduct {
        TrackedProduct {
            id: id.to_string(),
            name: id.to_string(),
            category: Category::Other,
            targets: BTreeMap::from([(Store::Coles, coles)]),
            placeholder: BTreeMap::new(),
        }
    }

    fn page(url: &str, body: &str) -> PageResponse {
        PageResponse::from_html(url::Url::parse(url).unwrap(), body)
    }

    const SEARCH_PAGE: &str = r#"
        <html><body>
          <section data-testid="product-tile">
            <h2 class="product__title">Coles Skim Milk 2L</h2>
            <span data-testid="pricing">$2.90</span>
          </section>
          <section data-testid="product-tile">
            <h2 class="product__title">Coles Full Cream Milk 2L</h2>
            <span data-testid="badge">Special</span>
            <span data-testid="pricing">$3.10</span>
            <span class="price__was">Was $3.60</span>
          </section>
        </body></html>
    "#;

    #[test]
    fn test_search_tile_matching() {
        let extracted = extract_search_tile(
            &StoreProfile::coles(),
            SEARCH_PAGE,
            &["full cream milk".to_string()],
        )
        .unwrap();

        assert_eq!(extracted.found_name.as_deref(), Some("Coles Full Cream Milk 2L"));
        assert_eq!(extracted.outcome.special_price, Some(3.10));
        assert_eq!(extracted.outcome.price, 3.60);
        assert_eq!(extracted.outcome.special_type.as_deref(), Some("Special"));
    }

    #[test]
    fn test_search_without_matching_tile() {
        let result = extract_search_tile(
            &StoreProfile::coles(),
            SEARCH_PAGE,
            &["greek yogurt".to_string()],
        );
        assert!(matches!(result, Err(ScrapeError::NoMatchingTile(_))));
    }

    #[test]
    fn test_product_page_without_price() {
        let result = extract_product_page(
            &StoreProfile::coles(),
            "<html><body><h1>Out of stock</h1></body></html>",
        );
        assert!(matches!(result, Err(ScrapeError::NoPrice)));
    }

    #[tokio::test]
    async fn test_blocked_store_stops_at_first_block() {
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_fetch().times(1).returning(|_, _| {
            Err(FetchError::Blocked {
                reason: "http 403".to_string(),
            })
        });

        let catalog = Catalog::new(vec![
            product("a", StoreTarget::Url("https://www.coles.com.au/product/a".to_string())),
            product("b", StoreTarget::Url("https://www.coles.com.au/product/b".to_string())),
        ])
        .unwrap();

        let outcome = Scraper::new(fetcher).scrape_store(Store::Coles, &catalog).await;
        assert!(outcome.blocked.is_some());
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.skipped, vec!["b".to_string()]);
        assert!(outcome.quotes.is_empty());
    }

    #[tokio::test]
    async fn test_item_failure_does_not_stop_store() {
        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_fetch()
            .withf(|url, _| url.to_string().ends_with("/a"))
            .returning(|url, _| Ok(page(url, "<html><body>nothing here</body></html>")));
        fetcher
            .expect_fetch()
            .withf(|url, _| url.to_string().ends_with("/b"))
            .returning(|url, _| {
                Ok(page(url, r#"<span data-testid="pricing">$4.00</span>"#))
            });

        let catalog = Catalog::new(vec![
            product("a", StoreTarget::Url("https://www.coles.com.au/product/a".to_string())),
            product("b", StoreTarget::Url("https://www.coles.com.au/product/b".to_string())),
        ])
        .unwrap();

        let outcome = Scraper::new(fetcher).scrape_store(Store::Coles, &catalog).await;
        assert!(outcome.blocked.is_none());
        assert_eq!(outcome.failures.len(), 1);
        assert!(matches!(outcome.failures[0].1, ScrapeError::NoPrice));
        assert_eq!(outcome.quotes.len(), 1);
        assert_eq!(outcome.quotes[0].price, 4.00);
        assert_eq!(outcome.quotes[0].source, QuoteSource::Scraped);
    }

    #[tokio::test]
    async fn test_retries_retriable_errors() {
        let mut fetcher = MockPageFetcher::new();
        let mut seq = mockall::Sequence::new();
        fetcher
            .expect_fetch()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Err(FetchError::Http {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    retriable: true,
                })
            });
        fetcher
            .expect_fetch()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|url, _| Ok(page(url, r#"<span data-testid="pricing">$2.20</span>"#)));

        let scraper = Scraper::new(fetcher)
            .with_attempts(2)
            .with_backoff_base(Duration::from_millis(1));
        let product = product("a", StoreTarget::Url("https://www.coles.com.au/product/a".to_string()));
        let quote = scraper
            .scrape_product(&StoreProfile::coles(), &product, product.target(Store::Coles).unwrap())
            .await
            .unwrap();
        assert_eq!(quote.price, 2.20);
    }

    #[tokio::test]
    async fn test_blocked_is_not_retried() {
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_fetch().times(1).returning(|_, _| {
            Err(FetchError::Blocked {
                reason: "captcha".to_string(),
            })
        });

        let scraper = Scraper::new(fetcher)
            .with_attempts(3)
            .with_backoff_base(Duration::from_millis(1));
        let product = product("a", StoreTarget::Url("https://www.coles.com.au/product/a".to_string()));
        let err = scraper
            .scrape_product(&StoreProfile::coles(), &product, product.target(Store::Coles).unwrap())
            .await
            .unwrap_err();
        assert!(err.is_blocked());
    }

    #[tokio::test]
    async fn test_products_without_target_are_ignored() {
        let fetcher = MockPageFetcher::new();
        let catalog = Catalog::new(vec![product(
            "a",
            StoreTarget::Url("https://www.coles.com.au/product/a".to_string()),
        )])
        .unwrap();

        let outcome = Scraper::new(fetcher)
            .scrape_store(Store::Woolworths, &catalog)
            .await;
        assert!(outcome.quotes.is_empty());
        assert!(outcome.failures.is_empty());
    }
}
