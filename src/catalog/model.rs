use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use utoipa::ToSchema;

use crate::catalog::classify::classify;
use crate::catalog::defaults::builtin_products;
use crate::prices::model::Store;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Produce,
    Meat,
    Dairy,
    Pantry,
    Freezer,
    Bakery,
    Drinks,
    Other,
}

/// How a product is looked up at one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreTarget {
    /// A product detail page.
    Url(String),
    /// Search terms; the first one is queried, any of them may match a tile.
    Search(Vec<String>),
}

/// Demo price used when a whole cycle produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderPrice {
    pub price: f64,
    #[serde(default)]
    pub special: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedProduct {
    pub id: String,
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub targets: BTreeMap<Store, StoreTarget>,
    #[serde(default)]
    pub placeholder: BTreeMap<Store, PlaceholderPrice>,
}

impl TrackedProduct {
    pub fn target(&self, store: Store) -> Option<&StoreTarget> {
        self.targets.get(&store)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate product id '{0}'")]
    DuplicateId(String),

    #[error("Product '{0}' has an empty id or name")]
    MissingField(String),
}

/// Catalog entry as written in a JSON file; `category` may be omitted.
#[derive(Debug, Deserialize)]
struct CatalogEntry {
    id: String,
    name: String,
    category: Option<Category>,
    #[serde(default)]
    targets: BTreeMap<Store, StoreTarget>,
    #[serde(default)]
    placeholder: BTreeMap<Store, PlaceholderPrice>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    products: Vec<CatalogEntry>,
}

/// The fixed set of tracked products. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<TrackedProduct>,
}

impl Catalog {
    pub fn new(products: Vec<TrackedProduct>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for product in &products {
            if product.id.trim().is_empty() || product.name.trim().is_empty() {
                return Err(CatalogError::MissingField(product.id.clone()));
            }
            if !seen.insert(product.id.as_str()) {
                return Err(CatalogError::DuplicateId(product.id.clone()));
            }
        }
        Ok(Self { products })
    }

    pub fn builtin() -> Self {
        Self {
            products: builtin_products(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        let products = file
            .products
            .into_iter()
            .map(|entry| TrackedProduct {
                category: entry.category.unwrap_or_else(|| classify(&entry.name)),
                id: entry.id,
                name: entry.name,
                targets: entry.targets,
                placeholder: entry.placeholder,
            })
            .collect();
        Self::new(products)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Catalog from `path` when given, else the built-in one.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }

    pub fn products(&self) -> &[TrackedProduct] {
        &self.products
    }

    pub fn get(&self, id: &str) -> Option<&TrackedProduct> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
