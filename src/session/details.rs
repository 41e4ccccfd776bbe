// Detail Fetcher: debounced metadata request and rendering of its result

use super::controller::PageController;
use super::state::{Phase, Session};
use super::view::MessageKind;
use crate::client::errors::{ClientError, Result};
use crate::client::models::{FormatType, VideoDetails};
use crate::client::quality::QualitySelector;
use crate::client::utils::is_valid_url;

const INVALID_URL_MESSAGE: &str = "Please enter a valid YouTube or video URL.";
const FETCHING_TEXT: &str = "Fetching video details and available qualities...";
const SHORT_VIDEO_MESSAGE: &str =
    "This is a YouTube Short. It will be downloaded in the highest available quality (vertical format).";
const DETAILS_FAILED_MESSAGE: &str = "Could not fetch video details.";

impl PageController {
    /// URL field edited: reset, then fetch if anything was entered
    pub fn on_url_input(&self, text: &str) {
        let has_text = self.update(|s| {
            s.view.url = text.to_string();
            s.reset_ui();
            !text.trim().is_empty()
        });
        if has_text {
            self.fetch_video_details();
        }
    }

    /// Validate the URL field and schedule a debounced details request.
    /// Any pending request is aborted and its response discarded.
    pub fn fetch_video_details(&self) {
        let generation = self.update(|s| {
            let url = s.url().trim().to_string();
            if !is_valid_url(&url) {
                s.reset_ui();
                s.show_message(MessageKind::Error, INVALID_URL_MESSAGE);
                return None;
            }

            s.cancel_pending_fetch();
            s.view.progress.start(FETCHING_TEXT);
            s.view.progress.size_info_visible = false;
            s.view.progress.eta_visible = false;
            s.view.estimate.visible = false;
            s.view.quality = QualitySelector::placeholder("Fetching qualities...");
            s.view.download_button.enabled = false;
            s.view.thumbnail.visible = false;
            s.transition(Phase::FetchingDetails);
            Some((s.fetch_generation, url))
        });

        let Some((generation, url)) = generation else {
            return;
        };

        let this = self.clone();
        let debounce = self.shared.config.debounce();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            tracing::debug!("[Details] Fetching details for {}", url);
            let result = this.shared.api.fetch_video_details(&url).await;
            this.update(|s| apply_details(s, generation, result));
        });

        self.update(|s| {
            if s.fetch_generation == generation {
                s.pending_fetch = Some(handle);
            } else {
                handle.abort();
            }
        });
    }

    /// Format radio changed
    pub fn on_format_change(&self, format: FormatType) {
        self.update(|s| {
            s.view.format = format;
            if !s.url().trim().is_empty() && !s.is_short() && s.details().is_some() {
                s.populate_qualities();
                s.update_estimate();
            }
            s.update_download_button();
        });
    }

    /// Quality selector changed; `""` clears the selection
    pub fn on_quality_change(&self, value: &str) -> Result<()> {
        self.update(|s| {
            if !s.view.quality.select(value) {
                return Err(ClientError::UnknownQuality(value.to_string()));
            }
            s.update_estimate();
            s.update_download_button();
            Ok(())
        })
    }
}

fn apply_details(session: &mut Session, generation: u64, result: Result<VideoDetails>) {
    if session.fetch_generation != generation {
        tracing::debug!("[Details] Dropping stale response (generation {})", generation);
        return;
    }
    session.pending_fetch = None;
    session.view.progress.stop();

    match result {
        Ok(details) if details.is_success() => render_details(session, details),
        Ok(details) => {
            session.reset_ui();
            let text = details
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DETAILS_FAILED_MESSAGE.to_string());
            tracing::warn!("[Details] Server rejected URL: {}", text);
            session.show_message(MessageKind::Error, text);
        }
        Err(e) => {
            tracing::warn!("[Details] Request failed: {}", e);
            session.reset_ui();
            session.show_message(MessageKind::Error, e.details_message());
        }
    }
}

fn render_details(session: &mut Session, details: VideoDetails) {
    tracing::info!(
        "[Details] {} (short: {}, mp4: {}, mp3: {})",
        details.video_id,
        details.is_short,
        details.available_mp4_qualities.len(),
        details.available_mp3_qualities.len()
    );

    session.view.thumbnail.visible = true;
    session.view.thumbnail.src = details.thumbnail_url.clone();
    session.view.thumbnail.title = details
        .title
        .clone()
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "N/A".to_string());

    let is_short = details.is_short;
    session.set_details(details);

    if is_short {
        session.view.quality = QualitySelector::short_video();
        session.show_message(MessageKind::Info, SHORT_VIDEO_MESSAGE);
        session.view.estimate.visible = false;
    } else {
        session.populate_qualities();
        session.update_estimate();
    }

    session.transition(Phase::AwaitingSelection);
    session.update_download_button();
}
