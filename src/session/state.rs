// Session state: what the page used to keep in DOM data attributes

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::view::{ButtonView, EstimateView, Message, MessageKind, PageView, ProgressView};
use crate::client::models::VideoDetails;
use crate::client::quality::{self, no_qualities_message, Populated, QualitySelector};

/// Where the page is in the fetch → select → download cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Phase {
    Idle,
    FetchingDetails,
    AwaitingSelection,
    Submitting,
    Downloading { job_id: String },
    Finished,
    Cancelled,
    Failed,
}

impl Phase {
    /// A download request is being prepared or is in flight
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Submitting | Self::Downloading { .. })
    }

    pub fn can_transition_to(&self, next: &Phase) -> bool {
        use Phase::*;
        match (self, next) {
            (_, Idle) => true,
            (from, FetchingDetails) | (from, Submitting) => !from.is_busy(),
            (FetchingDetails, AwaitingSelection) => true,
            (Submitting, AwaitingSelection | Downloading { .. }) => true,
            (Downloading { .. }, Finished | Failed | Cancelled) => true,
            // a poll failure does not end the request; its late result still lands
            (Failed, Finished | Failed | Cancelled) => true,
            _ => false,
        }
    }
}

/// The retained download request
pub(crate) struct ActiveDownload {
    pub seq: u64,
    pub video_id: String,
    pub token: CancellationToken,
}

/// Mutable page state owned by one controller
pub struct Session {
    pub(crate) view: PageView,
    is_short: bool,
    video_id: String,
    details: Option<VideoDetails>,

    pub(crate) fetch_generation: u64,
    pub(crate) pending_fetch: Option<JoinHandle<()>>,

    pub(crate) poll_seq: u64,
    pub(crate) poller: Option<JoinHandle<()>>,

    pub(crate) download_seq: u64,
    pub(crate) active_download: Option<ActiveDownload>,

    message_seq: u64,
    pending_autohide: Option<u64>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            view: PageView::default(),
            is_short: false,
            video_id: String::new(),
            details: None,
            fetch_generation: 0,
            pending_fetch: None,
            poll_seq: 0,
            poller: None,
            download_seq: 0,
            active_download: None,
            message_seq: 0,
            pending_autohide: None,
        }
    }

    pub fn view(&self) -> &PageView {
        &self.view
    }

    pub fn phase(&self) -> &Phase {
        &self.view.phase
    }

    pub fn url(&self) -> &str {
        &self.view.url
    }

    pub fn is_short(&self) -> bool {
        self.is_short
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// Last successful details response
    pub fn details(&self) -> Option<&VideoDetails> {
        self.details.as_ref()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().map_or(false, |h| !h.is_finished())
    }

    pub(crate) fn set_details(&mut self, details: VideoDetails) {
        self.is_short = details.is_short;
        self.video_id = details.video_id.clone();
        self.details = Some(details);
    }

    /// Apply `next` if the state machine allows it
    pub(crate) fn transition(&mut self, next: Phase) -> bool {
        if self.view.phase.can_transition_to(&next) {
            tracing::debug!("[Session] {:?} -> {:?}", self.view.phase, next);
            self.view.phase = next;
            true
        } else {
            tracing::debug!(
                "[Session] Ignoring transition {:?} -> {:?}",
                self.view.phase,
                next
            );
            false
        }
    }

    /// Undo a `Submitting` that never sent a request
    pub(crate) fn restore_phase(&mut self, previous: Phase) {
        tracing::debug!("[Session] {:?} -> {:?} (rolled back)", self.view.phase, previous);
        self.view.phase = previous;
    }

    pub(crate) fn show_message(&mut self, kind: MessageKind, text: impl Into<String>) {
        self.message_seq += 1;
        self.view.message = Some(Message {
            kind,
            text: text.into(),
        });
        // errors stay until replaced
        self.pending_autohide = (kind != MessageKind::Error).then_some(self.message_seq);
    }

    pub(crate) fn clear_message(&mut self) {
        self.message_seq += 1;
        self.view.message = None;
        self.pending_autohide = None;
    }

    /// Sequence number of an info/success message that should be hidden later
    pub(crate) fn take_autohide(&mut self) -> Option<u64> {
        self.pending_autohide.take()
    }

    /// Hide the message if it is still the one identified by `seq`
    pub(crate) fn expire_message(&mut self, seq: u64) {
        if self.message_seq == seq {
            self.view.message = None;
        }
    }

    /// Abort the debounced/in-flight details request and invalidate its response
    pub(crate) fn cancel_pending_fetch(&mut self) {
        if let Some(handle) = self.pending_fetch.take() {
            handle.abort();
        }
        self.fetch_generation += 1;
    }

    /// Stop the polling loop; returns whether one was running
    pub(crate) fn stop_polling(&mut self) -> bool {
        self.poll_seq += 1;
        match self.poller.take() {
            Some(handle) => {
                let running = !handle.is_finished();
                handle.abort();
                if running {
                    tracing::info!("[Poller] Progress polling stopped.");
                }
                running
            }
            None => false,
        }
    }

    /// Called by the loop itself when it ends on its own
    pub(crate) fn release_poller(&mut self, seq: u64) {
        if self.poll_seq == seq {
            self.poller = None;
            self.poll_seq += 1;
        }
    }

    /// Download button back to clickable, cancel hidden
    pub(crate) fn rollback_submit(&mut self) {
        self.view.download_button = ButtonView {
            enabled: true,
            busy: false,
        };
        self.view.cancel_visible = false;
    }

    pub(crate) fn update_download_button(&mut self) {
        self.view.download_button.enabled =
            quality::download_enabled(&self.view.url, self.is_short, &self.view.quality);
    }

    /// Render the quality list for the current format
    pub(crate) fn populate_qualities(&mut self) {
        let format = self.view.format;
        let qualities = self
            .details
            .as_ref()
            .map(|d| d.qualities_for(format).to_vec())
            .unwrap_or_default();

        match self.view.quality.populate(&qualities) {
            Populated::Empty => {
                self.show_message(MessageKind::Error, no_qualities_message(format));
                self.view.estimate.visible = false;
            }
            Populated::Options => self.view.estimate.visible = true,
        }
        self.update_download_button();
    }

    /// Refresh the estimated-size panel from the current selection
    pub(crate) fn update_estimate(&mut self) {
        match self.view.quality.estimated_size() {
            Some(size) => {
                self.view.estimate.size = size;
                self.view.estimate.visible = true;
            }
            None => {
                self.view.estimate = EstimateView::default();
            }
        }
    }

    /// Back to the blank page; form values (URL, format) are kept
    pub(crate) fn reset_ui(&mut self) {
        self.cancel_pending_fetch();
        self.stop_polling();

        self.view.thumbnail = Default::default();
        self.is_short = false;
        self.video_id.clear();
        self.details = None;

        self.clear_message();
        self.view.download_link = None;

        self.view.quality = QualitySelector::default();
        self.view.download_button = ButtonView::default();
        self.view.cancel_visible = false;
        self.view.progress = ProgressView::default();
        self.view.estimate = EstimateView::default();

        self.transition(Phase::Idle);
    }
}
