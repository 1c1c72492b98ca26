//! Special/markdown detection.
//!
//! `price` has two meanings: while a was-price special is
//! active it is the *regular* price and `special_price` holds what the
//! shelf charges today; otherwise it is simply the current price.
//! Shopping list formatting downstream depends on this.

use scraper::Html;
use serde::{Deserialize, Serialize};

use crate::extractor::locator::Locator;

/// Label used when a was-price special has no badge text of its own.
pub const ON_SALE: &str = "On Sale";

/// A special/sale badge seen on the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Badge {
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialOutcome {
    pub price: f64,
    pub was_price: Option<f64>,
    pub special: bool,
    pub special_price: Option<f64>,
    pub special_type: Option<String>,
}

/// Decide whether an item is on special.
///
/// A was-price above the current price wins. Without one, a badge alone
/// marks the item special but there is no special price to report. A
/// was-price at or below the current price is ignored.
pub fn detect_special(current: f64, was: Option<f64>, badge: Option<&Badge>) -> SpecialOutcome {
    let badge_label = badge.and_then(|b| b.label.clone());

    match was {
        Some(was) if was > current => SpecialOutcome {
            price: was,
            was_price: Some(was),
            special: true,
            special_price: Some(current),
            special_type: badge_label.or_else(|| Some(ON_SALE.to_string())),
        },
        _ => SpecialOutcome {
            price: current,
            was_price: None,
            special: badge.is_some(),
            special_price: None,
            special_type: badge_label,
        },
    }
}

/// Look for a special badge.
///
/// A node with no text (an icon or roundel image) counts on its own. A
/// node with text must contain one of the keywords, case-insensitively,
/// unless no keywords are given.
pub fn find_badge(locators: &[Locator], keywords: &[&str], doc: &Html) -> Option<Badge> {
    locators
        .iter()
        .flat_map(|locator| locator.candidates(doc))
        .find(|text| {
            let lowered = text.to_lowercase();
            text.is_empty() || keywords.is_empty() || keywords.iter().any(|k| lowered.contains(*k))
        })
        .map(|text| Badge {
            label: (!text.is_empty()).then_some(text),
        })
}
