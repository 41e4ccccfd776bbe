// reqwest-backed implementation of the server endpoints

use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use url::Url;

use super::cookies::get_cookie;
use super::errors::{ClientError, Result};
use super::models::{
    DownloadRequest, DownloadResult, JobStatusUpdate, ProgressSnapshot, VideoDetails,
};
use super::traits::DownloaderApi;
use super::utils::{build_http_client, resolve_url};
use crate::config::ClientConfig;

const CSRF_HEADER: &str = "X-CSRFToken";
const CSRF_FORM_FIELD: &str = "csrfmiddlewaretoken";

/// Talks to a yTube Downloader server over HTTP
pub struct HttpApi {
    client: Client,
    base_url: Url,
    cookies: Option<String>,
    csrf_token: Option<String>,
    /// Applied to every call except the long-running download submit
    request_timeout: Option<Duration>,
}

impl HttpApi {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        // No client-wide timeout: the submit call lasts as long as the server-side download.
        let client = build_http_client(config.proxy.as_deref(), None)?;
        Self::with_client(client, config)
    }

    pub fn with_client(client: Client, config: &ClientConfig) -> Result<Self> {
        let cookies = config.cookies.clone().filter(|c| !c.trim().is_empty());
        let csrf_token = cookies
            .as_deref()
            .and_then(|c| get_cookie(c, &config.csrf_cookie_name));
        if csrf_token.is_none() {
            tracing::warn!(
                "[Http] No '{}' cookie configured; mutating requests will lack a CSRF token",
                config.csrf_cookie_name
            );
        }

        Ok(Self {
            client,
            base_url: config.base_url()?,
            cookies,
            csrf_token,
            request_timeout: config.request_timeout(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        resolve_url(&self.base_url, path)
    }

    /// Configured `Cookie` header value, if any
    pub fn cookies(&self) -> Option<&str> {
        self.cookies.as_deref()
    }

    /// Attach cookies, CSRF header and the short timeout
    fn decorate(&self, req: RequestBuilder, timed: bool) -> RequestBuilder {
        let mut req = with_cookies(req, self.cookies());
        if let Some(token) = &self.csrf_token {
            req = req.header(CSRF_HEADER, token.as_str());
        }
        if timed {
            if let Some(timeout) = self.request_timeout {
                req = req.timeout(timeout);
            }
        }
        req
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        let url = self.endpoint(path)?;
        tracing::debug!("[Http] POST {}", url);
        let req = self.decorate(self.client.post(url).json(&body), true);
        let response = req.send().await?;
        read_json(response).await
    }
}

/// Attach the session cookies the server expects on every request
pub(crate) fn with_cookies(req: RequestBuilder, cookies: Option<&str>) -> RequestBuilder {
    match cookies {
        Some(cookies) => req.header(COOKIE, cookies),
        None => req,
    }
}

/// Non-2xx becomes `ClientError::Http` with the parsed body; 2xx is decoded as JSON
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(ClientError::from_response(status, &text));
    }
    Ok(serde_json::from_str(&text)?)
}

#[async_trait]
impl DownloaderApi for HttpApi {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch_video_details(&self, video_url: &str) -> Result<VideoDetails> {
        self.post_json("fetch_video_details/", json!({ "video_url": video_url }))
            .await
    }

    async fn submit_download(&self, request: &DownloadRequest) -> Result<DownloadResult> {
        let url = self.endpoint("download_ajax/")?;
        tracing::info!(
            "[Http] POST {} (video {}, {} {})",
            url,
            request.video_id,
            request.format_type,
            request.quality
        );

        let token = self.csrf_token.clone().unwrap_or_default();
        let form = [
            ("url", request.url.as_str()),
            ("format_type", request.format_type.as_str()),
            ("quality", request.quality.as_str()),
            ("video_id", request.video_id.as_str()),
            (CSRF_FORM_FIELD, token.as_str()),
        ];
        let req = self.decorate(self.client.post(url).form(&form), false);
        let response = req.send().await?;
        read_json(response).await
    }

    async fn get_progress(&self, video_id: &str) -> Result<ProgressSnapshot> {
        self.post_json("get_download_progress/", json!({ "video_id": video_id }))
            .await
    }

    async fn update_download_status(
        &self,
        video_id: &str,
        status: JobStatusUpdate,
    ) -> Result<serde_json::Value> {
        self.post_json(
            "update_download_status/",
            json!({ "video_id": video_id, "status": status }),
        )
        .await
    }

    async fn probe_file(&self, download_url: &str) -> Result<()> {
        let url = resolve_url(&self.base_url, download_url)?;
        tracing::debug!("[Http] HEAD {}", url);
        let response = self.decorate(self.client.head(url), true).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::FileUnavailable);
        }
        Err(ClientError::from_response(status, ""))
    }
}
