use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Store {
    Coles,
    Woolworths,
}

impl Store {
    pub const ALL: [Store; 2] = [Store::Coles, Store::Woolworths];

    pub fn as_str(&self) -> &'static str {
        match self {
            Store::Coles => "coles",
            Store::Woolworths => "woolworths",
        }
    }
}

impl Display for Store {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Store {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "coles" => Ok(Store::Coles),
            "woolworths" | "woolies" => Ok(Store::Woolworths),
            other => Err(format!("unknown store '{}'", other)),
        }
    }
}

/// Where a quote came from. Callers check this to tell real prices from fallbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum QuoteSource {
    Scraped,
    Manual,
    /// Default demo price used when a whole cycle failed.
    Placeholder,
    /// Previous scraped value kept after this cycle failed for the product.
    Carried,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PriceQuote {
    pub store: Store,
    pub product_id: String,
    pub name: String,
    /// Regular price while a was-price special is active, else the current price.
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub was_price: Option<f64>,
    pub special: bool,
    #[serde(default)]
    pub special_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub retrieved_at: DateTime<Utc>,
    pub source: QuoteSource,
}

impl PriceQuote {
    pub fn is_placeholder(&self) -> bool {
        self.source == QuoteSource::Placeholder
    }

    pub fn is_manual(&self) -> bool {
        self.source == QuoteSource::Manual
    }

    /// What the shelf charges today.
    pub fn effective_price(&self) -> f64 {
        self.special_price.unwrap_or(self.price)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeMethod {
    #[default]
    Automatic,
    Placeholder,
    Manual,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StoreReport {
    pub scraped: usize,
    pub failed: usize,
    /// Products not attempted because the store blocked us earlier in the cycle.
    pub skipped: usize,
    pub blocked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ScrapeReport {
    pub method: ScrapeMethod,
    pub items_scraped: usize,
    #[serde(default)]
    pub stores: BTreeMap<Store, StoreReport>,
}

impl ScrapeReport {
    pub fn blocked_stores(&self) -> BTreeMap<Store, String> {
        self.stores
            .iter()
            .filter(|(_, report)| report.blocked)
            .map(|(store, report)| {
                (
                    *store,
                    report
                        .blocked_reason
                        .clone()
                        .unwrap_or_else(|| "blocked".to_string()),
                )
            })
            .collect()
    }
}

/// Latest known prices, keyed by store then product id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PriceSnapshot {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub stores: BTreeMap<Store, BTreeMap<String, PriceQuote>>,
    #[serde(default)]
    pub report: ScrapeReport,
}

impl PriceSnapshot {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        let stores = Store::ALL
            .into_iter()
            .map(|store| (store, BTreeMap::new()))
            .collect();
        Self {
            timestamp,
            stores,
            report: ScrapeReport::default(),
        }
    }

    /// Insert or replace the quote for its (store, product) pair.
    pub fn insert(&mut self, quote: PriceQuote) -> Option<PriceQuote> {
        self.stores
            .entry(quote.store)
            .or_default()
            .insert(quote.product_id.clone(), quote)
    }

    pub fn quote(&self, store: Store, product_id: &str) -> Option<&PriceQuote> {
        self.stores.get(&store).and_then(|quotes| quotes.get(product_id))
    }

    pub fn quotes(&self) -> impl Iterator<Item = &PriceQuote> {
        self.stores.values().flat_map(|quotes| quotes.values())
    }

    pub fn item_counts(&self) -> BTreeMap<Store, usize> {
        Store::ALL
            .into_iter()
            .map(|store| (store, self.stores.get(&store).map_or(0, BTreeMap::len)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes().next().is_none()
    }

    pub fn has_manual(&self) -> bool {
        self.quotes().any(PriceQuote::is_manual)
    }

    pub fn manual_quotes(&self) -> Vec<PriceQuote> {
        self.quotes().filter(|q| q.is_manual()).cloned().collect()
    }

    /// Drop manual quotes, returning how many were removed.
    pub fn remove_manual(&mut self) -> usize {
        let mut removed = 0;
        for quotes in self.stores.values_mut() {
            let before = quotes.len();
            quotes.retain(|_, quote| !quote.is_manual());
            removed += before - quotes.len();
        }
        removed
    }

    pub fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        now - self.timestamp
    }
}
