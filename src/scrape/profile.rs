//! Per-store page layouts.
//!
//! Supermarket markup changes often, so every field is an ordered list of
//! fallbacks. The most specific selector goes first and embedded JSON is
//! tried last.

use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

use crate::extractor::{Locator, PriceBounds, Strategy};
use crate::prices::model::Store;

#[derive(Debug, Clone)]
pub struct StoreProfile {
    pub store: Store,
    /// Search page URL with a `{query}` placeholder.
    pub search_url: String,
    pub price: Vec<Strategy>,
    pub was_price: Vec<Strategy>,
    pub badge: Vec<Locator>,
    pub badge_keywords: Vec<&'static str>,
    pub name: Vec<Locator>,
    /// Product tile selectors on a search page; the first one with hits wins.
    pub tiles: Vec<String>,
    pub bounds: PriceBounds,
}

impl StoreProfile {
    pub fn for_store(store: Store) -> Self {
        match store {
            Store::Coles => Self::coles(),
            Store::Woolworths => Self::woolworths(),
        }
    }

    pub fn coles() -> Self {
        Self {
            store: Store::Coles,
            search_url: "https://www.coles.com.au/search/products?q={query}".to_string(),
            price: vec![
                Strategy::css(r#"span[data-testid="pricing"]"#),
                Strategy::css(r#"span[data-testid="price-value"]"#),
                Strategy::css(r#"[data-testid="price"]"#),
                Strategy::css(".price__value"),
                Strategy::css(r#"[class*="product-price"]"#),
                Strategy::css(".price"),
                Strategy::json_field("now"),
            ],
            was_price: vec![
                Strategy::css(r#"span[data-testid="was-price"]"#),
                Strategy::css(".price__was"),
                Strategy::css(r#"[class*="was-price"]"#),
                Strategy::json_field("was"),
            ],
            badge: vec![
                Locator::css(r#"[data-testid="badge"]"#),
                Locator::css(r#"[data-testid*="special"]"#),
                Locator::css(r#"[class*="special-badge"]"#),
                Locator::css(r#"[class*="roundel"]"#),
            ],
            badge_keywords: vec!["special", "half price", "1/2 price", "save", "down down"],
            name: vec![
                Locator::css(r#"h1[data-testid="product-title"]"#),
                Locator::css(".product__title"),
                Locator::css(r#"[data-testid*="title"]"#),
                Locator::css("h1"),
                Locator::css("h2"),
                Locator::css("h3"),
                Locator::css(r#"[class*="title"]"#),
            ],
            tiles: vec![
                r#"section[data-testid="product-tile"]"#.to_string(),
                r#"[data-testid="product-tile"]"#.to_string(),
                "div.product-tile".to_string(),
                "article.product".to_string(),
                r#"[class*="product"][class*="tile"]"#.to_string(),
            ],
            bounds: PriceBounds::default(),
        }
    }

    pub fn woolworths() -> Self {
        Self {
            store: Store::Woolworths,
            search_url: "https://www.woolworths.com.au/shop/search/products?searchTerm={query}"
                .to_string(),
            price: vec![
                Strategy::css(r#"[data-testid="product-price"]"#),
                Strategy::css(r#"[data-testid="price"]"#),
                Strategy::css(r#"[class*="current-price"]"#),
                Strategy::css(".primary"),
                Strategy::css(".price"),
                Strategy::css(r#"span[class*="dollar"]"#),
                Strategy::json_field("Price"),
            ],
            was_price: vec![
                Strategy::css(r#"[data-testid="was-price"]"#),
                Strategy::css(r#"[class*="was-price"]"#),
                Strategy::css(r#"[class*="original-price"]"#),
                Strategy::json_field("WasPrice"),
            ],
            badge: vec![
                Locator::css(".badge--special"),
                Locator::css(r#"[class*="special-badge"]"#),
                Locator::css(".on-special"),
                Locator::css(r#"[data-testid*="badge"]"#),
                Locator::css(r#"div[class*="badge"]"#),
            ],
            badge_keywords: vec!["special", "half price", "1/2 price", "save", "prices dropped"],
            name: vec![
                Locator::css(r#"h1[class*="product-title"]"#),
                Locator::css(r#"a[href*="/shop/productdetails"]"#),
                Locator::css(".product-title"),
                Locator::css(r#"[class*="product-title"]"#),
                Locator::css(r#"[data-testid*="title"]"#),
                Locator::css("h1"),
                Locator::css("h2"),
                Locator::css("h3"),
                Locator::css("h4"),
            ],
            tiles: vec![
                r#"div[data-testid="product-grid-item"]"#.to_string(),
                "div.product-grid-item".to_string(),
                "article.product".to_string(),
                ".woolworths-product".to_string(),
                r#"section[data-testid="product-section"]"#.to_string(),
                r#"[class*="product"][class*="grid"]"#.to_string(),
            ],
            bounds: PriceBounds::default(),
        }
    }

    /// Point the search URL at another host; used against a local mock.
    pub fn with_search_url(mut self, template: impl Into<String>) -> Self {
        self.search_url = template.into();
        self
    }

    pub fn search_url_for(&self, term: &str) -> String {
        let query = utf8_percent_encode(term, NON_ALPHANUMERIC).to_string();
        self.search_url.replace("{query}", &query)
    }
}
