use crate::fetcher::{errors::FetchError, types::PageResponse};
use bytes::Bytes;
use chrono::Utc;
use encoding_rs::Encoding;
use regex::Regex;
use reqwest::StatusCode;
use std::sync::LazyLock;
use url::Url;

static CHARSET_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).unwrap());

static META_CHARSET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta\s+[^>]*?charset\s*=\s*["']?([^"'\s/>;]+)"#).unwrap()
});

static TITLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap());

/// Title fragments served by bot walls instead of the product page.
const BLOCKED_TITLE_MARKERS: &[&str] = &["access denied", "blocked", "just a moment"];

/// Phrases shown only by bot challenges. A recaptcha script alone is not one.
const CHALLENGE_BODY_MARKERS: &[&str] = &[
    "verify you are human",
    "please complete the security check",
    "bot detected",
    "incapsula incident",
];

/// Decode a raw body and make sure it is a usable page rather than a block screen.
pub fn process_response(
    url_final: Url,
    status: StatusCode,
    body_bytes: Bytes,
    content_type: &str,
) -> Result<PageResponse, FetchError> {
    let encoding = detect_encoding(content_type, &body_bytes);
    let (decoded, _, had_errors) = encoding.decode(&body_bytes);
    if had_errors {
        return Err(FetchError::Charset(format!(
            "failed to decode body as {}",
            encoding.name()
        )));
    }
    let body = decoded.into_owned();

    if let Some(reason) = detect_block(&body) {
        return Err(FetchError::Blocked { reason });
    }

    Ok(PageResponse {
        url_final,
        status,
        body,
        encoding: encoding.name(),
        fetched_at: Utc::now(),
    })
}

/// Header charset wins, then `<meta charset>` in the first 4KB, then a guess.
fn detect_encoding(content_type: &str, body: &[u8]) -> &'static Encoding {
    let head = &body[..body.len().min(4096)];
    let head_str = String::from_utf8_lossy(head);

    let labelled = [
        CHARSET_REGEX.captures(content_type),
        META_CHARSET_REGEX.captures(&head_str),
    ]
    .into_iter()
    .flatten()
    .filter_map(|caps| caps.get(1))
    .find_map(|label| Encoding::for_label(label.as_str().trim().as_bytes()));

    labelled.unwrap_or_else(|| {
        let mut detector = chardetng::EncodingDetector::new();
        detector.feed(head, body.len() <= head.len());
        detector.guess(None, true)
    })
}

/// Returns a short reason when the page looks like a bot wall.
pub fn detect_block(body: &str) -> Option<String> {
    if let Some(caps) = TITLE_REGEX.captures(body) {
        let title = caps[1].trim().to_lowercase();
        if let Some(marker) = BLOCKED_TITLE_MARKERS.iter().find(|m| title.contains(**m)) {
            return Some(format!("page title contains '{}'", marker));
        }
    }

    let lowered = body.to_lowercase();
    CHALLENGE_BODY_MARKERS
        .iter()
        .find(|m| lowered.contains(**m))
        .map(|marker| format!("challenge marker '{}' in body", marker))
}
