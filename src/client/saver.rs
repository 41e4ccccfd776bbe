// Save action: fetch the produced file into the output directory

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use url::Url;

use super::errors::{ClientError, Result};
use super::http::with_cookies;
use super::traits::FileSaver;
use super::utils::resolve_url;

/// Writes downloads into a local directory
pub struct DirectorySaver {
    client: Client,
    base_url: Url,
    dir: PathBuf,
    cookies: Option<String>,
}

impl DirectorySaver {
    pub fn new(client: Client, base_url: Url, dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            base_url,
            dir: dir.into(),
            cookies: None,
        }
    }

    /// Send this `Cookie` header with every file request
    pub fn with_cookies(mut self, cookies: Option<&str>) -> Self {
        self.cookies = cookies.map(str::to_string);
        self
    }

    /// Staging file for `target`: the full file name with `.part` appended
    fn partial_path(target: &Path) -> PathBuf {
        let mut name = target.file_name().unwrap_or_default().to_os_string();
        name.push(".part");
        target.with_file_name(name)
    }

    fn request(&self, url: Url) -> RequestBuilder {
        with_cookies(self.client.get(url), self.cookies.as_deref())
    }

    /// Target path for a server-suggested filename; path components are stripped
    pub fn target_path(&self, filename: &str) -> PathBuf {
        let name = Path::new(filename)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .filter(|n| !n.is_empty() && n != "." && n != "..")
            .unwrap_or_else(|| "download".to_string());
        self.dir.join(name)
    }
}

#[async_trait]
impl FileSaver for DirectorySaver {
    async fn save(&self, download_url: &str, filename: &str) -> Result<PathBuf> {
        let url = resolve_url(&self.base_url, download_url)?;
        let target = self.target_path(filename);
        tracing::info!("[Saver] {} -> {}", url, target.display());

        let mut response = self.request(url).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::FileUnavailable);
        }
        if !status.is_success() {
            return Err(ClientError::from_response(status, ""));
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        // Body goes to `<name>.part` and is renamed into place once complete.
        let partial = Self::partial_path(&target);
        let written = match write_body(&mut response, &partial).await {
            Ok(written) => written,
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(&partial).await {
                    tracing::debug!("[Saver] Could not remove {}: {}", partial.display(), rm);
                }
                return Err(e);
            }
        };
        tokio::fs::rename(&partial, &target).await?;

        tracing::info!("[Saver] Saved {} bytes to {}", written, target.display());
        Ok(target)
    }
}

async fn write_body(response: &mut Response, path: &Path) -> Result<u64> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut written: u64 = 0;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}
