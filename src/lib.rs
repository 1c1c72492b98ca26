pub mod app_state;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod health;
pub mod prices;
pub mod router;
pub mod scrape;
pub mod shopping;
pub mod specials;
