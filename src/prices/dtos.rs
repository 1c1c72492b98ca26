use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::cache::CacheStatus;
use crate::catalog::Catalog;
use crate::error::ValidationError;
use crate::extractor::PriceBounds;
use crate::prices::model::{PriceQuote, PriceSnapshot, QuoteSource, ScrapeMethod, Store};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct ManualPriceEntry {
    /// Regular price; the shelf price when no `special_price` is given.
    pub price: f64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub special: Option<bool>,
    #[serde(default)]
    pub special_price: Option<f64>,
}

/// `{ "<store>": { "<product_id>": {price, ...} } }`
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ManualPricesRequest {
    pub stores: BTreeMap<String, BTreeMap<String, ManualPriceEntry>>,
}

impl ManualPricesRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let bounds = PriceBounds::default();
        let mut entries = 0;

        for (store, products) in &self.stores {
            store.parse::<Store>().map_err(ValidationError::new)?;

            for (product_id, entry) in products {
                if product_id.trim().is_empty() {
                    return Err(ValidationError::new("Product id must not be empty"));
                }
                if !entry.price.is_finite() || !bounds.contains(entry.price) {
                    return Err(ValidationError::new(format!(
                        "Price for '{}' must be between {:.2} and {:.2}",
                        product_id, bounds.min, bounds.max
                    )));
                }
                if entry.special == Some(false) && entry.special_price.is_some() {
                    return Err(ValidationError::new(format!(
                        "Special price for '{}' given with special set to false",
                        product_id
                    )));
                }
                if let Some(special_price) = entry.special_price
                    && (!special_price.is_finite()
                        || !bounds.contains(special_price)
                        || special_price >= entry.price)
                {
                    return Err(ValidationError::new(format!(
                        "Special price for '{}' must be below the regular price",
                        product_id
                    )));
                }
                entries += 1;
            }
        }

        if entries == 0 {
            return Err(ValidationError::new("No prices supplied"));
        }
        Ok(())
    }

    /// Turn validated entries into manual quotes. Names fall back to the
    /// catalog, then to the product id.
    pub fn into_quotes(self, catalog: &Catalog, now: DateTime<Utc>) -> Vec<PriceQuote> {
        let mut quotes = Vec::new();
        for (store, products) in self.stores {
            let Ok(store) = store.parse::<Store>() else {
                continue;
            };
            for (product_id, entry) in products {
                let name = entry
                    .name
                    .filter(|n| !n.trim().is_empty())
                    .or_else(|| catalog.get(&product_id).map(|p| p.name.clone()))
                    .unwrap_or_else(|| product_id.clone());
                quotes.push(PriceQuote {
                    store,
                    product_id,
                    name,
                    price: entry.price,
                    was_price: entry.special_price.map(|_| entry.price),
                    special: entry.special_price.is_some() || entry.special.unwrap_or(false),
                    special_price: entry.special_price,
                    special_type: None,
                    found_name: None,
                    url: None,
                    retrieved_at: now,
                    source: QuoteSource::Manual,
                });
            }
        }
        quotes
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ManualSaveResponse {
    pub status: String,
    pub prices: PriceSnapshot,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ManualClearResponse {
    pub status: String,
    pub prices: Option<PriceSnapshot>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub status: CacheStatus,
    pub last_update: Option<DateTime<Utc>>,
    pub age_minutes: Option<f64>,
    pub item_counts: BTreeMap<Store, usize>,
    pub method: Option<ScrapeMethod>,
    pub is_manual: bool,
    pub blocked: BTreeMap<Store, String>,
}
