// Client configuration: defaults, JSON file, environment overrides

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::client::cookies::DEFAULT_CSRF_COOKIE;
use crate::client::errors::{ClientError, Result};

/// Settings shared by the transport and the page controller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the yTube Downloader server
    pub server_url: String,
    /// Cookie holding the CSRF token
    pub csrf_cookie_name: String,
    /// `Cookie` header value sent with every request (e.g. "csrftoken=...; sessionid=...")
    pub cookies: Option<String>,
    /// SOCKS5/HTTP proxy URL (e.g. "socks5://127.0.0.1:1080")
    pub proxy: Option<String>,
    /// Timeout for details, progress, status and probe requests
    pub request_timeout_secs: Option<u64>,
    /// Quiet period before the details request fires
    pub debounce_ms: u64,
    /// Progress poll period
    pub poll_interval_ms: u64,
    /// Info/success messages disappear after this long
    pub message_timeout_ms: u64,
    /// Directory saved files are written to
    pub output_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000/".to_string(),
            csrf_cookie_name: DEFAULT_CSRF_COOKIE.to_string(),
            cookies: None,
            proxy: None,
            request_timeout_secs: Some(30),
            debounce_ms: 500,
            poll_interval_ms: 1000,
            message_timeout_ms: 5000,
            output_dir: dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")),
        }
    }
}

impl ClientConfig {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("ytube-client").join("config.json"))
    }

    /// Load from `path` (or the default location); a missing file yields defaults.
    /// Environment overrides are applied afterwards.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).or_else(Self::default_path);
        let mut config = match path {
            Some(p) if p.exists() => {
                let bytes = std::fs::read(&p)?;
                serde_json::from_slice::<Self>(&bytes).map_err(|e| {
                    ClientError::Config(format!(
                        "failed to parse config at {}: {e}",
                        p.to_string_lossy()
                    ))
                })?
            }
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Override fields from `YTUBE_*` environment variables
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("YTUBE_SERVER_URL") {
            self.server_url = v;
        }
        if let Some(v) = non_empty("YTUBE_PROXY") {
            self.proxy = Some(v);
        }
        if let Some(v) = non_empty("YTUBE_COOKIES") {
            self.cookies = Some(v);
        }
        if let Some(v) = non_empty("YTUBE_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(v);
        }
    }

    /// Parsed server base URL, always ending in '/' so endpoint joins stay under it
    pub fn base_url(&self) -> Result<Url> {
        let mut raw = self.server_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw)
            .map_err(|e| ClientError::Config(format!("invalid server_url {}: {e}", self.server_url)))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        // zero would make tokio's interval panic
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn message_timeout(&self) -> Duration {
        Duration::from_millis(self.message_timeout_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
