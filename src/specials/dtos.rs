use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::prices::model::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SpecialSource {
    StorePage,
    Catalogue,
    Search,
}

/// One product seen on special somewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SpecialItem {
    pub price: f64,
    pub special: bool,
    pub store: Store,
    pub source: SpecialSource,
    /// Tile title or search result title, when it differs from the key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SourceFailure {
    pub source: String,
    pub error: String,
}

/// Specials keyed by product name per store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SpecialsData {
    pub coles: BTreeMap<String, SpecialItem>,
    pub woolworths: BTreeMap<String, SpecialItem>,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub failures: Vec<SourceFailure>,
}

impl SpecialsData {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            coles: BTreeMap::new(),
            woolworths: BTreeMap::new(),
            timestamp,
            source: "web_scrape".to_string(),
            failures: Vec::new(),
        }
    }

    /// Later inserts for the same name replace earlier ones.
    pub fn insert(&mut self, name: String, item: SpecialItem) {
        let items = match item.store {
            Store::Coles => &mut self.coles,
            Store::Woolworths => &mut self.woolworths,
        };
        items.insert(name, item);
    }

    pub fn len(&self) -> usize {
        self.coles.len() + self.woolworths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SpecialsResponse {
    pub success: bool,
    pub data: SpecialsData,
}
