pub mod freshness;
pub mod store;

pub use freshness::{CacheStatus, age_minutes, is_fresh, status};
pub use store::{CacheError, CacheState, PriceCache};
