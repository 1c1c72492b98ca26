//! Where specials listings come from.
//!
//! Three kinds of page are read: each store's own "on special" listing, a
//! catalogue aggregator, and search-engine results for catalog products.

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use crate::extractor::{Locator, PriceBounds, PricePattern, Strategy};
use crate::prices::model::Store;

/// Listing prices above this are almost always multipacks or misreads.
const LISTING_MAX_PRICE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    StorePage,
    Catalogue,
}

/// A page of product tiles that are all on special.
#[derive(Debug, Clone)]
pub struct ListingSource {
    pub label: &'static str,
    pub kind: ListingKind,
    pub store: Store,
    pub url: String,
    /// Tile selectors; the first one with hits wins.
    pub tiles: Vec<String>,
    pub name: Vec<Locator>,
    pub price: Vec<Strategy>,
    /// Tiles read per page, in document order.
    pub limit: usize,
    pub bounds: PriceBounds,
}

impl ListingSource {
    pub fn coles_on_special() -> Self {
        Self {
            label: "coles on-special",
            kind: ListingKind::StorePage,
            store: Store::Coles,
            url: "https://www.coles.com.au/on-special".to_string(),
            tiles: vec![
                r#"article[class*="product-tile"]"#.to_string(),
                r#"section[data-testid="product-tile"]"#.to_string(),
            ],
            name: vec![
                Locator::css(r#"[class*="product-title"]"#),
                Locator::css(r#"[class*="product-name"]"#),
                Locator::css("h3"),
                Locator::css("h2"),
                Locator::css("h1"),
            ],
            price: vec![
                Strategy::css(r#"[class*="price"]"#),
                Strategy::css(r#"[class*="special"]"#),
            ],
            limit: 20,
            bounds: PriceBounds::new(PriceBounds::default().min, LISTING_MAX_PRICE),
        }
    }

    pub fn woolworths_specials() -> Self {
        Self {
            label: "woolworths specials",
            kind: ListingKind::StorePage,
            store: Store::Woolworths,
            url: "https://www.woolworths.com.au/shop/specials".to_string(),
            tiles: vec![
                r#"article[class*="product"]"#.to_string(),
                r#"div[class*="product-tile"]"#.to_string(),
                r#"section[class*="tile"]"#.to_string(),
            ],
            name: vec![
                Locator::css(r#"[class*="title"]"#),
                Locator::css(r#"[class*="name"]"#),
                Locator::css("h3"),
                Locator::css("h2"),
                Locator::css("h1"),
            ],
            price: vec![
                Strategy::css(r#"[class*="price"]"#),
                Strategy::css(r#"[class*="dollar"]"#),
            ],
            limit: 20,
            bounds: PriceBounds::new(PriceBounds::default().min, LISTING_MAX_PRICE),
        }
    }

    pub fn coles_catalogue() -> Self {
        Self {
            label: "coles catalogue",
            kind: ListingKind::Catalogue,
            store: Store::Coles,
            url: "https://www.latestcatalogues.com/coles/".to_string(),
            tiles: vec![
                r#"article[class*="deal"]"#.to_string(),
                r#"div[class*="product"]"#.to_string(),
                r#"div[class*="item"]"#.to_string(),
            ],
            name: vec![
                Locator::css("h3"),
                Locator::css("h2"),
                Locator::css("h4"),
                Locator::css("p"),
            ],
            price: vec![Strategy::css(r#"[class*="price"]"#)],
            limit: 15,
            bounds: PriceBounds::default(),
        }
    }

    pub fn defaults() -> Vec<Self> {
        vec![
            Self::coles_on_special(),
            Self::woolworths_specials(),
            Self::coles_catalogue(),
        ]
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

/// HTML search results page queried as `"<product name> <store>"`.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    /// URL with a `{query}` placeholder; spaces become `+`.
    pub url_template: String,
    pub result: String,
    pub title: String,
    pub snippet: String,
    /// Only explicit currency or labelled amounts; snippets are full of
    /// pack sizes and dates.
    pub patterns: Vec<PricePattern>,
    pub bounds: PriceBounds,
}

impl SearchEngine {
    pub fn duckduckgo() -> Self {
        Self {
            url_template: "https://html.duckduckgo.com/html/?q={query}".to_string(),
            result: "div.result".to_string(),
            title: "a.result__a".to_string(),
            snippet: ".result__snippet".to_string(),
            patterns: vec![PricePattern::Symbol, PricePattern::Labelled],
            bounds: PriceBounds::default(),
        }
    }

    pub fn with_url_template(mut self, template: impl Into<String>) -> Self {
        self.url_template = template.into();
        self
    }

    pub fn query_for(product_name: &str, store: Store) -> String {
        format!("{} {}", product_name, store)
    }

    pub fn url_for(&self, query: &str) -> String {
        let encoded = utf8_percent_encode(query, NON_ALPHANUMERIC)
            .to_string()
            .replace("%20", "+");
        self.url_template.replace("{query}", &encoded)
    }
}
