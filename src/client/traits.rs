// Transport and save-action traits

use async_trait::async_trait;
use std::path::PathBuf;

use super::errors::ClientError;
use super::models::{
    DownloadRequest, DownloadResult, JobStatusUpdate, ProgressSnapshot, VideoDetails,
};

/// Server endpoints the page controller talks to
#[async_trait]
pub trait DownloaderApi: Send + Sync {
    /// Name of the transport (for logging)
    fn name(&self) -> &'static str;

    /// POST `/fetch_video_details/`
    async fn fetch_video_details(&self, video_url: &str) -> Result<VideoDetails, ClientError>;

    /// POST `/download_ajax/`; resolves when the server has produced the file
    async fn submit_download(&self, request: &DownloadRequest) -> Result<DownloadResult, ClientError>;

    /// POST `/get_download_progress/`
    async fn get_progress(&self, video_id: &str) -> Result<ProgressSnapshot, ClientError>;

    /// POST `/update_download_status/`; the response body is only logged
    async fn update_download_status(
        &self,
        video_id: &str,
        status: JobStatusUpdate,
    ) -> Result<serde_json::Value, ClientError>;

    /// HEAD `<download_url>`; `FileUnavailable` on 404
    async fn probe_file(&self, download_url: &str) -> Result<(), ClientError>;
}

/// Where a finished download ends up (the browser's save action)
#[async_trait]
pub trait FileSaver: Send + Sync {
    async fn save(&self, download_url: &str, filename: &str) -> Result<PathBuf, ClientError>;
}
