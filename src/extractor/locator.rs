//! Locator strategies.
//!
//! A strategy pairs a way of finding candidate text in a page with the
//! price patterns to run over it. Stores keep an ordered list of them and
//! the first strategy that yields an in-bounds price wins.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::extractor::price::{PriceBounds, PricePattern, extract_price};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Text of the first node matching the selector.
    Css(String),
    /// Text of every node matching the selector, in document order.
    CssAll(String),
    /// An attribute of the first node matching the selector.
    Attr { selector: String, attr: String },
    /// `"key": 12.34` embedded in page source, usually hydration JSON.
    JsonField(String),
    /// All text in the document.
    Document,
}

impl Locator {
    pub fn css(selector: &str) -> Self {
        Self::Css(selector.to_string())
    }

    pub fn css_all(selector: &str) -> Self {
        Self::CssAll(selector.to_string())
    }

    pub fn attr(selector: &str, attr: &str) -> Self {
        Self::Attr {
            selector: selector.to_string(),
            attr: attr.to_string(),
        }
    }

    pub fn json_field(key: &str) -> Self {
        Self::JsonField(key.to_string())
    }

    /// Candidate texts this locator finds. Empty when nothing matched.
    pub fn candidates(&self, doc: &Html) -> Vec<String> {
        match self {
            Locator::Css(selector) => parse_selector(selector)
                .and_then(|sel| doc.select(&sel).next().map(element_text))
                .into_iter()
                .collect(),
            Locator::CssAll(selector) => parse_selector(selector)
                .map(|sel| doc.select(&sel).map(element_text).collect())
                .unwrap_or_default(),
            Locator::Attr { selector, attr } => parse_selector(selector)
                .and_then(|sel| {
                    doc.select(&sel)
                        .next()
                        .and_then(|el| el.value().attr(attr))
                        .map(|value| value.trim().to_string())
                })
                .into_iter()
                .collect(),
            Locator::JsonField(key) => json_field_values(&doc.root_element().html(), key),
            Locator::Document => vec![element_text(doc.root_element())],
        }
    }

    /// Whether the locator matches any node at all.
    pub fn matches(&self, doc: &Html) -> bool {
        !self.candidates(doc).is_empty()
    }
}

/// A locator and the price patterns to run over what it finds.
#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub locator: Locator,
    pub patterns: Vec<PricePattern>,
}

impl Strategy {
    pub fn new(locator: Locator, patterns: &[PricePattern]) -> Self {
        Self {
            locator,
            patterns: patterns.to_vec(),
        }
    }

    /// CSS locator with the rendered-text patterns.
    pub fn css(selector: &str) -> Self {
        Self::new(Locator::css(selector), PricePattern::TEXT)
    }

    /// JSON field locator; values are bare numbers.
    pub fn json_field(key: &str) -> Self {
        Self::new(Locator::json_field(key), &[PricePattern::Plain])
    }

    pub fn extract(&self, doc: &Html, bounds: PriceBounds) -> Option<f64> {
        self.locator
            .candidates(doc)
            .iter()
            .find_map(|text| extract_price(text, &self.patterns, bounds))
    }
}

/// Run strategies in priority order; the first qualifying price wins.
pub fn first_price(strategies: &[Strategy], doc: &Html, bounds: PriceBounds) -> Option<f64> {
    strategies.iter().find_map(|strategy| {
        let found = strategy.extract(doc, bounds);
        if found.is_some() {
            debug!(locator = ?strategy.locator, price = ?found, "price located");
        }
        found
    })
}

/// Text of the first node matching any selector in order.
pub fn first_text(selectors: &[Locator], doc: &Html) -> Option<String> {
    selectors
        .iter()
        .flat_map(|locator| locator.candidates(doc))
        .find(|text| !text.is_empty())
}

/// Whitespace-normalized text content of an element.
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_selector(selector: &str) -> Option<Selector> {
    match Selector::parse(selector) {
        Ok(sel) => Some(sel),
        Err(e) => {
            debug!(selector, error = ?e, "unusable selector");
            None
        }
    }
}

fn json_field_values(source: &str, key: &str) -> Vec<String> {
    let pattern = format!(r#""{}"\s*:\s*"?(\d+(?:\.\d+)?)"?"#, regex::escape(key));
    match Regex::new(&pattern) {
        Ok(re) => re
            .captures_iter(source)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .collect(),
        Err(_) => Vec::new(),
    }
}
