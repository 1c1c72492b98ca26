pub mod dtos;
pub mod handlers;
pub mod model;
pub mod service;

pub use model::{PriceQuote, PriceSnapshot, QuoteSource, ScrapeMethod, ScrapeReport, Store};
pub use service::{FreshnessPolicy, PriceService};
