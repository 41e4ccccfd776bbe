// Request/response models for the yTube Downloader endpoints

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::ClientError;
use super::utils::format_bytes;

/// Quality value submitted for shorts, regardless of selector state
pub const SHORT_QUALITY: &str = "best_short";

/// Label rendered for the short-video sentinel
pub const SHORT_QUALITY_LABEL: &str = "Best Quality (Short)";

/// Output container requested from the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatType {
    #[default]
    Mp4,
    Mp3,
}

impl FormatType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mp3 => "mp3",
        }
    }
}

impl fmt::Display for FormatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp4" => Ok(Self::Mp4),
            "mp3" => Ok(Self::Mp3),
            other => Err(ClientError::Config(format!("unknown format type: {}", other))),
        }
    }
}

/// One downloadable quality tier with its estimated size
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityOption {
    /// Tier label, e.g. "1080p" or "320kbps"
    pub quality: String,
    #[serde(default)]
    pub size_bytes: u64,
}

/// Metadata returned by `/fetch_video_details/`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoDetails {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub video_id: String,
    #[serde(default)]
    pub is_short: bool,
    #[serde(default)]
    pub available_mp4_qualities: Vec<QualityOption>,
    #[serde(default)]
    pub available_mp3_qualities: Vec<QualityOption>,
}

impl VideoDetails {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// Quality list for the given format
    pub fn qualities_for(&self, format: FormatType) -> &[QualityOption] {
        match format {
            FormatType::Mp4 => &self.available_mp4_qualities,
            FormatType::Mp3 => &self.available_mp3_qualities,
        }
    }
}

/// Body posted to `/download_ajax/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadRequest {
    pub url: String,
    pub format_type: FormatType,
    pub quality: String,
    pub video_id: String,
}

/// Response of `/download_ajax/`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DownloadResult {
    pub status: String,
    #[serde(default)]
    pub download_url: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}

impl DownloadResult {
    /// URL and filename when the server produced a file
    pub fn file(&self) -> Option<(&str, &str)> {
        if self.status != "success" {
            return None;
        }
        let url = self.download_url.as_deref().filter(|u| !u.is_empty())?;
        let name = self.filename.as_deref().filter(|n| !n.is_empty())?;
        Some((url, name))
    }
}

/// Job state reported by `/get_download_progress/`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Preparing,
    Starting,
    Downloading,
    Finished,
    Error,
    /// Anything else the tracker reports (e.g. "aborted", "not_found"), or nothing
    #[serde(other)]
    #[default]
    Unknown,
}

impl ProgressStatus {
    /// Statuses that only move the bar forward
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Preparing | Self::Starting | Self::Downloading)
    }
}

/// Byte counter as sent by the tracker: raw count or preformatted text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ByteCount {
    Bytes(u64),
    Text(String),
}

impl fmt::Display for ByteCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(n) => f.write_str(&format_bytes(*n)),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Speed or ETA field: the tracker sends either a number or display text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Number(f64),
    Text(String),
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Reading {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// One poll result; superseded by the next
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    #[serde(default)]
    pub status: ProgressStatus,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub speed: Option<Reading>,
    #[serde(default)]
    pub downloaded_bytes: Option<ByteCount>,
    #[serde(default)]
    pub total_bytes: Option<ByteCount>,
    #[serde(default)]
    pub eta: Option<Reading>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl ProgressSnapshot {
    /// Progress clamped to 0..=100
    pub fn percent(&self) -> f64 {
        self.progress.unwrap_or(0.0).clamp(0.0, 100.0)
    }

    /// Throughput text, `None` when absent or "N/A"
    pub fn speed_text(&self) -> Option<String> {
        self.speed
            .as_ref()
            .map(Reading::to_string)
            .filter(|s| !s.is_empty() && s != "N/A")
    }

    /// ETA text, `None` when absent or empty
    pub fn eta_text(&self) -> Option<String> {
        self.eta
            .as_ref()
            .map(Reading::to_string)
            .filter(|e| !e.is_empty())
    }
}

/// Status pushed to `/update_download_status/`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatusUpdate {
    Aborted,
}
