pub mod classify;
mod defaults;
pub mod model;

pub use classify::{classify, contains_word};
pub use model::{Catalog, CatalogError, Category, PlaceholderPrice, StoreTarget, TrackedProduct};
