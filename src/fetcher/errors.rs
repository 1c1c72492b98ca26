use std::error::Error as _;
use thiserror::Error;

/// Why a store page could not be fetched.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("dns failure: {0}")]
    Dns(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("tls error: {0}")]
    Tls(String),

    #[error("connect timeout")]
    ConnectTimeout,

    #[error("request timeout")]
    RequestTimeout,

    #[error("too many redirects")]
    RedirectLoop,

    /// A 403 or a bot-wall page. The rest of the store is skipped for the cycle.
    #[error("blocked by target: {reason}")]
    Blocked { reason: String },

    #[error("http error {status}")]
    Http {
        status: reqwest::StatusCode,
        retriable: bool,
    },

    #[error("body too large ({0} bytes)")]
    BodyTooLarge(u64),

    #[error("unsupported content-type: {0}")]
    UnsupportedContentType(String),

    #[error("charset error: {0}")]
    Charset(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("unknown: {0}")]
    Unknown(String),
}

impl FetchError {
    /// Whether another attempt within the same cycle could succeed.
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Blocked { .. }
            | Self::InvalidUrl(_)
            | Self::BodyTooLarge(_)
            | Self::UnsupportedContentType(_)
            | Self::Charset(_) => false,

            Self::Http { retriable, .. } => *retriable,

            Self::Dns(_)
            | Self::Connect(_)
            | Self::Tls(_)
            | Self::ConnectTimeout
            | Self::RequestTimeout
            | Self::RedirectLoop
            | Self::Io(_)
            | Self::Unknown(_) => true,
        }
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }

    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return if err.is_connect() {
                Self::ConnectTimeout
            } else {
                Self::RequestTimeout
            };
        }
        if err.is_redirect() {
            return Self::RedirectLoop;
        }
        if let Some(status) = err.status() {
            return Self::Http {
                status,
                retriable: status.is_server_error() || status.as_u16() == 429,
            };
        }
        if err.is_connect() {
            let detail = error_chain(&err);
            // Classify on the causes only; the outer message carries the URL.
            let lowered = detail
                .split_once(": ")
                .map(|(_, causes)| causes.to_lowercase())
                .unwrap_or_default();
            return if lowered.contains("dns") || lowered.contains("lookup address") {
                Self::Dns(detail)
            } else if lowered.contains("certificate") || lowered.contains("tls") {
                Self::Tls(detail)
            } else {
                Self::Connect(detail)
            };
        }
        if err.is_request() || err.is_body() || err.is_decode() {
            return Self::Io(error_chain(&err));
        }
        Self::Unknown(err.to_string())
    }
}

/// `outer: inner: root` so the underlying cause survives into logs.
fn error_chain(err: &reqwest::Error) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        parts.push(cause.to_string());
        source = cause.source();
    }
    parts.join(": ")
}
