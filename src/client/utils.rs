// Helper functions shared by the transport and the controller

use regex::Regex;
use std::time::Duration;
use url::Url;

use super::errors::{ClientError, Result};

lazy_static::lazy_static! {
    // Generic http(s) link; not tied to any one video site.
    static ref URL_RE: Regex = Regex::new(r"(?i)^(https?://[^\s$.?#].[^\s]*)$")
        .expect("URL pattern is valid");
}

/// Query parameters that pre-fill the URL field, in priority order
const DEEP_LINK_PARAMS: [&str; 2] = ["videoUrl", "url"];

/// Check a string against the accepted URL pattern
pub fn is_valid_url(candidate: &str) -> bool {
    URL_RE.is_match(candidate)
}

/// Format a byte count the way the page displays sizes ("879 KB", "0 Bytes")
pub fn format_bytes(bytes: u64) -> String {
    const SIZES: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    // floor(log1024(bytes)) without float error at exact powers
    let mut exponent = 0usize;
    let mut threshold = 1024u64;
    while exponent < SIZES.len() - 1 && bytes >= threshold {
        exponent += 1;
        threshold = threshold.saturating_mul(1024);
    }
    let scaled = bytes as f64 / 1024f64.powi(exponent as i32);
    format!("{} {}", scaled.round() as u64, SIZES[exponent])
}

/// Video URL carried by a deep link (`?videoUrl=` or `?url=`)
pub fn deep_link_url(page_url: &str) -> Option<String> {
    let parsed = Url::parse(page_url).ok()?;
    DEEP_LINK_PARAMS.iter().find_map(|name| {
        parsed
            .query_pairs()
            .find(|(key, value)| key == name && !value.is_empty())
            .map(|(_, value)| value.into_owned())
    })
}

/// Build the shared HTTP client with optional proxy and timeout
pub fn build_http_client(proxy: Option<&str>, timeout_secs: Option<u64>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();

    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }

    if let Some(proxy_url) = proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| ClientError::Config(format!("invalid proxy {}: {}", proxy_url, e)))?;
        tracing::info!("[Http] Using proxy: {}", proxy_url);
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

/// Resolve a possibly relative download URL against the server base
pub fn resolve_url(base: &Url, target: &str) -> Result<Url> {
    base.join(target)
        .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", target, e)))
}
