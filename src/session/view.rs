// Renderable page state and the channel it is published on

use serde::Serialize;
use std::path::PathBuf;
use tokio::sync::watch;

use super::state::Phase;
use crate::client::models::{FormatType, ProgressSnapshot};
use crate::client::quality::QualitySelector;

const IDLE_PROGRESS_TEXT: &str = "Processing your request...";
const COMPLETE_PROGRESS_TEXT: &str = "Download Complete!";
const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Info,
    Success,
    Error,
}

/// Banner shown above the form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub kind: MessageKind,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ThumbnailView {
    pub visible: bool,
    pub src: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ButtonView {
    pub enabled: bool,
    /// Submit in progress; the label switches to the spinner text
    pub busy: bool,
}

impl ButtonView {
    pub fn label(&self) -> &'static str {
        if self.busy {
            "Initiating Download..."
        } else {
            "Download"
        }
    }
}

/// The progress bar with its byte counters and ETA
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressView {
    pub visible: bool,
    /// Bar width, 0..=100
    pub percent: f64,
    pub text: String,
    pub size_info_visible: bool,
    pub downloaded: String,
    pub total: String,
    pub eta_visible: bool,
    pub eta: String,
}

impl Default for ProgressView {
    fn default() -> Self {
        Self {
            visible: false,
            percent: 0.0,
            text: IDLE_PROGRESS_TEXT.to_string(),
            size_info_visible: false,
            downloaded: "0 Bytes".to_string(),
            total: NOT_AVAILABLE.to_string(),
            eta_visible: false,
            eta: NOT_AVAILABLE.to_string(),
        }
    }
}

impl ProgressView {
    /// Show the bar at 0% with `text`
    pub fn start(&mut self, text: &str) {
        self.text = text.to_string();
        self.percent = 0.0;
        self.visible = true;
    }

    /// Hide the bar and its panels, back to the idle text
    pub fn stop(&mut self) {
        self.visible = false;
        self.percent = 0.0;
        self.text = IDLE_PROGRESS_TEXT.to_string();
        self.size_info_visible = false;
        self.eta_visible = false;
    }

    /// Counters cleared and panels shown for a fresh polling loop
    pub fn begin_polling(&mut self) {
        self.size_info_visible = true;
        self.eta_visible = true;
        self.downloaded = "0 Bytes".to_string();
        self.total = NOT_AVAILABLE.to_string();
        self.eta = NOT_AVAILABLE.to_string();
        self.visible = true;
        self.percent = 0.0;
    }

    /// preparing/starting/downloading snapshot
    pub fn apply_active(&mut self, snap: &ProgressSnapshot) {
        let percent = snap.percent();
        self.percent = percent;
        self.text = match snap.speed_text() {
            Some(speed) => format!("Downloading... {}% ({})", percent.round(), speed),
            None => format!("Downloading... {}%", percent.round()),
        };
        self.apply_counters(snap);
        self.eta = snap
            .eta_text()
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());
    }

    /// finished snapshot
    pub fn apply_finished(&mut self, snap: &ProgressSnapshot) {
        self.percent = 100.0;
        self.text = COMPLETE_PROGRESS_TEXT.to_string();
        self.apply_counters(snap);
        self.eta = "0s".to_string();
    }

    fn apply_counters(&mut self, snap: &ProgressSnapshot) {
        if let Some(downloaded) = &snap.downloaded_bytes {
            self.downloaded = downloaded.to_string();
        }
        if let Some(total) = &snap.total_bytes {
            self.total = total.to_string();
        }
    }
}

/// Estimated-size panel shown before a download starts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EstimateView {
    pub visible: bool,
    pub size: String,
}

impl Default for EstimateView {
    fn default() -> Self {
        Self {
            visible: false,
            size: NOT_AVAILABLE.to_string(),
        }
    }
}

/// Manual fallback link for a finished download
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadLink {
    pub href: String,
    pub filename: String,
    pub file_size: Option<u64>,
    /// Where the automatic save put the file, once it has
    pub saved_to: Option<PathBuf>,
}

/// Everything a front end needs to draw the page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView {
    pub phase: Phase,
    pub url: String,
    pub format: FormatType,
    pub thumbnail: ThumbnailView,
    pub quality: QualitySelector,
    pub download_button: ButtonView,
    pub cancel_visible: bool,
    pub message: Option<Message>,
    pub download_link: Option<DownloadLink>,
    pub progress: ProgressView,
    pub estimate: EstimateView,
}

impl Default for PageView {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            url: String::new(),
            format: FormatType::default(),
            thumbnail: ThumbnailView::default(),
            quality: QualitySelector::default(),
            download_button: ButtonView::default(),
            cancel_visible: false,
            message: None,
            download_link: None,
            progress: ProgressView::default(),
            estimate: EstimateView::default(),
        }
    }
}

impl PageView {
    pub fn message_text(&self) -> Option<&str> {
        self.message.as_ref().map(|m| m.text.as_str())
    }
}

/// Publishes view snapshots to any number of renderers
pub struct ViewEmitter {
    tx: watch::Sender<PageView>,
}

impl ViewEmitter {
    pub fn new(initial: PageView) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn emit(&self, view: &PageView) {
        // send_replace works with zero receivers
        self.tx.send_replace(view.clone());
    }

    pub fn subscribe(&self) -> watch::Receiver<PageView> {
        self.tx.subscribe()
    }
}
