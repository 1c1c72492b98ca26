use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use url::Url;

/// A fetched page, already decoded to UTF-8.
#[derive(Debug, Clone)]
pub struct PageResponse {
    pub url_final: Url,
    pub status: StatusCode,
    pub body: String,
    /// WHATWG label of the encoding the body was decoded from.
    pub encoding: &'static str,
    pub fetched_at: DateTime<Utc>,
}

impl PageResponse {
    /// Build a response from an in-memory body. Used by fakes and tests.
    pub fn from_html(url: Url, body: impl Into<String>) -> Self {
        Self {
            url_final: url,
            status: StatusCode::OK,
            body: body.into(),
            encoding: encoding_rs::UTF_8.name(),
            fetched_at: Utc::now(),
        }
    }
}
