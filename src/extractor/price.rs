//! Price text normalization.
//!
//! A price pattern finds candidate amounts in a piece of text; the first
//! candidate inside the sanity bounds wins. Anything else, including
//! out-of-range amounts like pack sizes or unit prices, is dropped without
//! being reported.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Digits with optional thousands separators and up to two decimals.
const AMOUNT: &str = r"(?P<amount>(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{1,2})?)";
const DECIMAL_AMOUNT: &str = r"(?P<amount>(?:\d{1,3}(?:,\d{3})+|\d+)\.\d{1,2})";

static SYMBOL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"[$€£]\s*{AMOUNT}")).unwrap());

static LABELLED_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:price|cost|was|now)\b\s*:?\s*[$€£]?\s*{AMOUNT}"
    ))
    .unwrap()
});

static DECIMAL_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(DECIMAL_AMOUNT).unwrap());

static PLAIN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^\s*[$€£]?\s*{AMOUNT}\s*$")).unwrap());

/// Exclusive plausibility window for a shelf price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBounds {
    pub min: f64,
    pub max: f64,
}

impl PriceBounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value > self.min && value < self.max
    }
}

impl Default for PriceBounds {
    fn default() -> Self {
        Self::new(0.50, 500.00)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricePattern {
    /// `$12.34`, `€ 5`, `£1,299.99`
    Symbol,
    /// `price: 12.34`, `Was $5`, `now 3.5`
    Labelled,
    /// Bare `12.34`; needs decimals so pack sizes like `12pk` are skipped.
    Decimal,
    /// The whole text is a number, as in JSON fields and data attributes.
    Plain,
}

impl PricePattern {
    /// Priority order used for rendered text.
    pub const TEXT: &'static [PricePattern] = &[
        PricePattern::Symbol,
        PricePattern::Labelled,
        PricePattern::Decimal,
    ];

    fn regex(&self) -> &'static Regex {
        match self {
            PricePattern::Symbol => &SYMBOL_REGEX,
            PricePattern::Labelled => &LABELLED_REGEX,
            PricePattern::Decimal => &DECIMAL_REGEX,
            PricePattern::Plain => &PLAIN_REGEX,
        }
    }

    /// All amounts this pattern finds in `text`, in order of appearance.
    pub fn amounts(&self, text: &str) -> Vec<f64> {
        self.regex()
            .captures_iter(text)
            .filter_map(|caps| caps.name("amount"))
            // "12.345" is not a price with two decimals
            .filter(|m| {
                !text[m.end()..]
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_ascii_digit())
            })
            .filter_map(|m| parse_amount(m.as_str()))
            .collect()
    }
}

/// Parse a price string, tolerating a currency symbol and thousands separators.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches(['$', '€', '£'])
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// First in-bounds amount, trying patterns in priority order.
pub fn extract_price(text: &str, patterns: &[PricePattern], bounds: PriceBounds) -> Option<f64> {
    patterns
        .iter()
        .flat_map(|pattern| pattern.amounts(text))
        .find(|value| bounds.contains(*value))
}
