use crate::fetcher::{
    errors::FetchError, pacing::HostPacer, pipeline::process_response, types::PageResponse,
};
use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, ClientBuilder, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const MAX_BODY_SIZE: u64 = 5 * 1024 * 1024; // 5MB
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Desktop browser user agents, rotated per request.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
];

/// Source of raw pages. The HTTP client is one implementation; a browser
/// driver or a test fake are others.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, headers: HeaderMap) -> Result<PageResponse, FetchError>;
}

/// Browser-like request headers with a randomly chosen user agent.
pub fn browser_headers() -> HeaderMap {
    let user_agent = USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0]);

    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(user_agent));
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-AU,en;q=0.5"));
    headers.insert(header::DNT, HeaderValue::from_static("1"));
    headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers
}

/// reqwest-backed fetcher with a per-request timeout.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(request_timeout: Duration) -> Result<Self, FetchError> {
        let client = ClientBuilder::new()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(request_timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FetchError::Unknown(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    #[instrument(skip_all, fields(url = %url))]
    async fn fetch(&self, url: &str, headers: HeaderMap) -> Result<PageResponse, FetchError> {
        let parsed_url = url::Url::parse(url)?;

        let response = self
            .client
            .get(parsed_url)
            .headers(headers)
            .send()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        if let Some(content_length) = response.content_length()
            && content_length > MAX_BODY_SIZE
        {
            return Err(FetchError::BodyTooLarge(content_length));
        }

        let final_url = response.url().clone();
        let status = response.status();

        if status == StatusCode::FORBIDDEN {
            warn!(%final_url, "target answered 403");
            return Err(FetchError::Blocked {
                reason: "http 403".to_string(),
            });
        }
        if !status.is_success() {
            return Err(FetchError::Http {
                status,
                retriable: status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS,
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or("text/html")
            .to_string();

        if !content_type.contains("text/html") && !content_type.contains("application/xhtml") {
            return Err(FetchError::UnsupportedContentType(content_type));
        }

        let body_bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Io(e.to_string()))?;

        // Content-Length may be missing or wrong
        if body_bytes.len() as u64 > MAX_BODY_SIZE {
            return Err(FetchError::BodyTooLarge(body_bytes.len() as u64));
        }

        debug!(status = %status, bytes = body_bytes.len(), "page fetched");
        process_response(final_url, status, body_bytes, &content_type)
    }
}

/// Wraps a fetcher so every request first takes the target host's permit.
pub struct PacedFetcher<F> {
    inner: F,
    pacer: Arc<HostPacer>,
}

impl<F: PageFetcher> PacedFetcher<F> {
    pub fn new(inner: F, pacer: Arc<HostPacer>) -> Self {
        Self { inner, pacer }
    }
}

#[async_trait]
impl<F: PageFetcher> PageFetcher for PacedFetcher<F> {
    async fn fetch(&self, url: &str, headers: HeaderMap) -> Result<PageResponse, FetchError> {
        let host = url::Url::parse(url)?
            .host_str()
            .map(str::to_string)
            .unwrap_or_default();
        let _permit = self.pacer.acquire(&host).await;
        self.inner.fetch(url, headers).await
    }
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for Arc<T> {
    async fn fetch(&self, url: &str, headers: HeaderMap) -> Result<PageResponse, FetchError> {
        (**self).fetch(url, headers).await
    }
}
