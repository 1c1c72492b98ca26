//! Specials discovery outside the tracked catalog.
//!
//! Reads the stores' own specials listings, a catalogue aggregator and
//! search-engine result snippets. Nothing here is cached; every call
//! fetches afresh through the same paced fetcher the scraper uses.

pub mod dtos;
pub mod handlers;
pub mod sources;

pub use dtos::{SourceFailure, SpecialItem, SpecialSource, SpecialsData, SpecialsResponse};
pub use sources::{ListingKind, ListingSource, SearchEngine};

use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::catalog::Catalog;
use crate::extractor::{element_text, extract_price, first_price, first_text};
use crate::fetcher::{PageFetcher, browser_headers};
use crate::prices::model::Store;

/// Snippet phrases that mark a search result as a special.
const SNIPPET_SPECIAL_KEYWORDS: &[&str] = &[
    "special",
    "half price",
    "1/2 price",
    "save $",
    "was $",
    "down down",
    "prices dropped",
];

pub struct SpecialsCollector<F> {
    fetcher: F,
    listings: Vec<ListingSource>,
    search: Option<SearchEngine>,
}

impl<F: PageFetcher> SpecialsCollector<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            listings: ListingSource::defaults(),
            search: Some(SearchEngine::duckduckgo()),
        }
    }

    /// Replace the listing pages. Later listings win on duplicate names.
    pub fn with_listings(mut self, listings: Vec<ListingSource>) -> Self {
        self.listings = listings;
        self
    }

    pub fn with_search(mut self, search: Option<SearchEngine>) -> Self {
        self.search = search;
        self
    }

    /// Listings first in order, then one search per catalog product and
    /// store. A failing source is recorded and the rest still run.
    #[instrument(skip_all, fields(listings = self.listings.len()))]
    pub async fn collect(&self, catalog: &Catalog) -> SpecialsData {
        let mut data = SpecialsData::new(Utc::now());

        for listing in &self.listings {
            match self.fetcher.fetch(&listing.url, browser_headers()).await {
                Ok(page) => {
                    let items = parse_listing(listing, &page.body);
                    debug!(source = listing.label, items = items.len(), "listing read");
                    for (name, item) in items {
                        data.insert(name, item);
                    }
                }
                Err(e) => {
                    warn!(source = listing.label, error = %e, "specials listing failed");
                    data.failures.push(SourceFailure {
                        source: listing.label.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        if let Some(engine) = &self.search {
            self.search_catalog(engine, catalog, &mut data).await;
        }

        info!(items = data.len(), failures = data.failures.len(), "specials collected");
        data
    }

    async fn search_catalog(&self, engine: &SearchEngine, catalog: &Catalog, data: &mut SpecialsData) {
        for product in catalog.products() {
            for store in Store::ALL {
                let query = SearchEngine::query_for(&product.name, store);
                let url = engine.url_for(&query);
                match self.fetcher.fetch(&url, browser_headers()).await {
                    Ok(page) => {
                        if let Some(item) = parse_search_results(engine, &page.body, store) {
                            debug!(%query, price = item.price, "special found in search results");
                            data.insert(product.name.clone(), item);
                        }
                    }
                    Err(e) if e.is_blocked() => {
                        warn!(%query, error = %e, "search engine blocked, skipping remaining searches");
                        data.failures.push(SourceFailure {
                            source: "search".to_string(),
                            error: e.to_string(),
                        });
                        return;
                    }
                    Err(e) => {
                        warn!(%query, error = %e, "search failed");
                        data.failures.push(SourceFailure {
                            source: format!("search: {query}"),
                            error: e.to_string(),
                        });
                    }
                }
            }
        }
    }
}

/// Named, priced tiles from a listing page, capped at the listing's limit.
pub fn parse_listing(listing: &ListingSource, body: &str) -> Vec<(String, SpecialItem)> {
    let doc = Html::parse_document(body);
    let tiles: Vec<String> = listing
        .tiles
        .iter()
        .filter_map(|selector| Selector::parse(selector).ok())
        .map(|selector| doc.select(&selector).map(|el| el.html()).collect::<Vec<_>>())
        .find(|tiles| !tiles.is_empty())
        .unwrap_or_default();

    let source = match listing.kind {
        ListingKind::StorePage => SpecialSource::StorePage,
        ListingKind::Catalogue => SpecialSource::Catalogue,
    };

    tiles
        .iter()
        .take(listing.limit)
        .filter_map(|tile| {
            let fragment = Html::parse_fragment(tile);
            let name = first_text(&listing.name, &fragment)?;
            let price = first_price(&listing.price, &fragment, listing.bounds)?;
            Some((
                name,
                SpecialItem {
                    price,
                    special: true,
                    store: listing.store,
                    source,
                    found_name: None,
                    url: None,
                },
            ))
        })
        .collect()
}

/// First result that names the store, mentions a special and quotes a price.
pub fn parse_search_results(engine: &SearchEngine, body: &str, store: Store) -> Option<SpecialItem> {
    let doc = Html::parse_document(body);
    let result_sel = Selector::parse(&engine.result).ok()?;
    let title_sel = Selector::parse(&engine.title).ok()?;
    let snippet_sel = Selector::parse(&engine.snippet).ok()?;

    doc.select(&result_sel).find_map(|result| {
        let title_el = result.select(&title_sel).next();
        let title = title_el.map(element_text).unwrap_or_default();
        let snippet = result
            .select(&snippet_sel)
            .next()
            .map(element_text)
            .unwrap_or_default();

        let text = format!("{title} {snippet}").to_lowercase();
        if !mentions_store(&text, store) {
            return None;
        }
        if !SNIPPET_SPECIAL_KEYWORDS.iter().any(|k| text.contains(k)) {
            return None;
        }
        let price = extract_price(&snippet, &engine.patterns, engine.bounds)
            .or_else(|| extract_price(&title, &engine.patterns, engine.bounds))?;

        Some(SpecialItem {
            price,
            special: true,
            store,
            source: SpecialSource::Search,
            found_name: (!title.is_empty()).then_some(title),
            url: title_el.and_then(result_link),
        })
    })
}

fn mentions_store(lowered: &str, store: Store) -> bool {
    match store {
        Store::Coles => lowered.contains("coles"),
        Store::Woolworths => lowered.contains("woolworths") || lowered.contains("woolies"),
    }
}

/// Result links go through a redirector carrying the target in `uddg`.
fn result_link(anchor: ElementRef<'_>) -> Option<String> {
    let href = anchor.value().attr("href")?;
    let base = Url::parse("https://duckduckgo.com/").ok()?;
    let link = base.join(href).ok()?;
    let target = link
        .query_pairs()
        .find(|(key, _)| key == "uddg")
        .map(|(_, value)| value.into_owned());
    Some(target.unwrap_or_else(|| link.to_string()))
}
