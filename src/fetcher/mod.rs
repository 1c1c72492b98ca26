pub mod client;
pub mod errors;
pub mod pacing;
pub mod pipeline;
pub mod types;

pub use client::{HttpFetcher, PacedFetcher, PageFetcher, browser_headers};
pub use errors::FetchError;
pub use pacing::HostPacer;
pub use types::PageResponse;
