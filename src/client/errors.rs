// Error types for the page controller and its HTTP transport

use serde::Deserialize;
use thiserror::Error;

/// JSON error body the server attaches to failed responses
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServerErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ServerErrorBody {
    /// `message`, then `error`, whichever is present first
    pub fn text(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or(self.error.as_deref())
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// URL did not match the http(s) pattern
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Submit attempted before details produced a video id
    #[error("video id not found")]
    MissingVideoId,

    /// Long video submitted without an enabled, non-empty quality selection
    #[error("no quality selected")]
    QualityNotSelected,

    /// Quality value not among the rendered options
    #[error("unknown quality: {0}")]
    UnknownQuality(String),

    /// A download job is already in flight for this session
    #[error("a download is already in progress")]
    Busy,

    /// Server answered 2xx with a non-success status
    #[error("server reported failure: {0}")]
    Server(String),

    /// Non-2xx response
    #[error("HTTP {status} {reason}")]
    Http {
        status: u16,
        reason: String,
        /// Parsed JSON body, `None` when the body was not JSON
        body: Option<ServerErrorBody>,
    },

    /// No usable response (connect, timeout, decode)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Request cancelled before it completed
    #[error("request aborted")]
    Aborted,

    /// Download URL no longer exists on the server (404 on probe)
    #[error("file no longer available")]
    FileUnavailable,

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    /// Build an `Http` error from a status and the raw response text
    pub fn from_response(status: reqwest::StatusCode, text: &str) -> Self {
        let body = serde_json::from_str::<ServerErrorBody>(text).ok();
        Self::Http {
            status: status.as_u16(),
            reason: status
                .canonical_reason()
                .unwrap_or("error")
                .to_string(),
            body,
        }
    }

    /// HTTP status, 0 when no response was received
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Http { status, .. } => *status,
            Self::Transport(e) => e.status().map(|s| s.as_u16()).unwrap_or(0),
            _ => 0,
        }
    }

    /// Short reason phrase used in synthesized messages
    pub fn reason(&self) -> String {
        match self {
            Self::Http { reason, .. } => reason.clone(),
            Self::Transport(e) if e.is_timeout() => "timeout".to_string(),
            Self::Transport(_) => "error".to_string(),
            other => other.to_string(),
        }
    }

    /// Parsed JSON error body, if the server sent one
    pub fn server_body(&self) -> Option<&ServerErrorBody> {
        match self {
            Self::Http { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    /// Message shown when the details request fails
    pub fn details_message(&self) -> String {
        match self.server_body() {
            Some(body) => format!("Server Error: {}", body.text().unwrap_or("Unknown.")),
            None => format!(
                "An unexpected network error occurred. Status: {}. Error: {}.",
                self.status_code(),
                self.reason()
            ),
        }
    }

    /// Message shown when the download request fails
    pub fn submit_message(&self) -> String {
        if matches!(self, Self::Aborted) {
            return "Download cancelled by user.".to_string();
        }
        match self.server_body() {
            Some(ServerErrorBody {
                message: Some(m), ..
            }) => format!("Server Message: {}", m),
            Some(ServerErrorBody { error: Some(e), .. }) => format!("Server Error: {}", e),
            Some(_) => format!(
                "Unexpected response. Status: {}. Error: {}.",
                self.status_code(),
                self.reason()
            ),
            None => format!(
                "An unexpected error occurred. Status: {}. Error: {}.",
                self.status_code(),
                self.reason()
            ),
        }
    }

    /// Message shown when a progress poll fails
    pub fn progress_message(&self) -> String {
        match self.server_body() {
            Some(body) => format!("Progress Error: {}", body.text().unwrap_or("Unknown.")),
            None => format!(
                "Network error fetching progress. Status: {}. Error: {}.",
                self.status_code(),
                self.reason()
            ),
        }
    }

    /// Message shown when the manual re-download probe fails
    pub fn probe_message(&self) -> &'static str {
        if matches!(self, Self::FileUnavailable) || self.status_code() == 404 {
            "Video not available. Paste link or Download again!"
        } else {
            "An error occurred while checking video availability. Please try again."
        }
    }
}
