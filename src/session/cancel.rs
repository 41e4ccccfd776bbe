// Cancel Handler

use std::sync::Arc;

use super::controller::PageController;
use super::state::Phase;
use super::view::MessageKind;
use crate::client::models::JobStatusUpdate;
use crate::client::traits::DownloaderApi;

const ABORTED_MESSAGE: &str = "Download process aborted.";

impl PageController {
    /// Abort the in-flight download and tell the server the job was aborted.
    ///
    /// Without a download in flight a stray poller is stopped; otherwise this
    /// does nothing. Returns whether anything was cancelled. The server
    /// notification runs in the background.
    pub fn cancel(&self) -> bool {
        match self.abort_local() {
            Some(video_id) => {
                if let Some(video_id) = video_id {
                    tokio::spawn(report_abort(self.shared.api.clone(), video_id));
                }
                true
            }
            None => false,
        }
    }

    /// Like [`cancel`](Self::cancel), but resolves once the server has been notified
    pub async fn cancel_and_report(&self) -> bool {
        match self.abort_local() {
            Some(video_id) => {
                if let Some(video_id) = video_id {
                    report_abort(self.shared.api.clone(), video_id).await;
                }
                true
            }
            None => false,
        }
    }

    /// UI side of cancelling. `None` when nothing was cancelled, otherwise the
    /// video id to report (if a request was in flight).
    fn abort_local(&self) -> Option<Option<String>> {
        self.update(|s| {
            let Some(active) = s.active_download.take() else {
                if s.stop_polling() {
                    s.view.progress.stop();
                    s.rollback_submit();
                    return Some(None);
                }
                tracing::debug!("[Cancel] Nothing to cancel");
                return None;
            };

            tracing::info!("[Cancel] Aborting download of {}", active.video_id);
            active.token.cancel();
            s.stop_polling();
            s.view.progress.stop();
            s.rollback_submit();
            s.show_message(MessageKind::Info, ABORTED_MESSAGE);
            s.transition(Phase::Cancelled);

            if !s.url().trim().is_empty() && !s.is_short() {
                s.update_estimate();
            }
            Some(Some(active.video_id).filter(|id| !id.is_empty()))
        })
    }
}

/// Best-effort `aborted` status update; the outcome is only logged
async fn report_abort(api: Arc<dyn DownloaderApi>, video_id: String) {
    match api
        .update_download_status(&video_id, JobStatusUpdate::Aborted)
        .await
    {
        Ok(body) => tracing::info!("[Cancel] Server acknowledged abort of {}: {}", video_id, body),
        Err(e) => tracing::error!("[Cancel] Failed to report abort of {}: {}", video_id, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::submit::DownloadOutcome;
    use crate::session::testing::{controller, long_video, short_video, Call, FakeApi};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn cancel_aborts_request_and_notifies_server() {
        let api = Arc::new(FakeApi::default());
        api.add_details("https://youtu.be/abc", long_video("abc"));
        api.hold_submit();
        let ctrl = controller(api.clone());
        ctrl.on_url_input("https://youtu.be/abc");
        tokio::time::sleep(Duration::from_secs(1)).await;

        let handle = ctrl.submit().unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(ctrl.cancel());

        assert!(matches!(handle.outcome().await, DownloadOutcome::Cancelled));
        tokio::time::sleep(Duration::from_millis(10)).await;

        let view = ctrl.view();
        assert_eq!(view.phase, Phase::Cancelled);
        assert_eq!(view.message_text(), Some(ABORTED_MESSAGE));
        assert!(view.download_button.enabled);
        assert!(!view.download_button.busy);
        assert!(!view.cancel_visible);
        assert!(!view.progress.visible);
        assert!(view.estimate.visible);
        assert_eq!(view.estimate.size, "879 KB");
        assert!(view.download_link.is_none());
        assert!(!ctrl.is_polling());

        assert!(api
            .calls()
            .contains(&Call::Status("abc".to_string(), JobStatusUpdate::Aborted)));
        let polls = api.progress_calls("abc");
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(api.progress_calls("abc"), polls);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_for_short_keeps_estimate_hidden() {
        let api = Arc::new(FakeApi::default());
        api.add_details("https://youtube.com/shorts/s1", short_video("s1"));
        api.hold_submit();
        let ctrl = controller(api.clone());
        ctrl.on_url_input("https://youtube.com/shorts/s1");
        tokio::time::sleep(Duration::from_secs(1)).await;

        let handle = ctrl.submit().unwrap();
        assert!(ctrl.cancel());
        handle.outcome().await;

        assert!(!ctrl.view().estimate.visible);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_with_nothing_in_flight_is_a_no_op() {
        let api = Arc::new(FakeApi::default());
        let ctrl = controller(api.clone());

        assert!(!ctrl.cancel());
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(ctrl.view().message_text(), None);
        assert_eq!(ctrl.phase(), Phase::Idle);
        assert!(api.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_stray_poller_without_notifying() {
        let api = Arc::new(FakeApi::default());
        let ctrl = controller(api.clone());

        ctrl.start_progress_polling("v1");
        assert!(ctrl.cancel());
        tokio::time::sleep(Duration::from_secs(3)).await;

        let view = ctrl.view();
        assert!(!view.progress.visible);
        assert!(view.download_button.enabled);
        assert!(api.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn late_completion_after_cancel_is_discarded() {
        let api = Arc::new(FakeApi::default());
        api.add_details("https://youtu.be/abc", long_video("abc"));
        api.hold_submit();
        let ctrl = controller(api.clone());
        ctrl.on_url_input("https://youtu.be/abc");
        tokio::time::sleep(Duration::from_secs(1)).await;

        let handle = ctrl.submit().unwrap();
        ctrl.cancel();
        api.release_submit();
        handle.outcome().await;
        tokio::time::sleep(Duration::from_secs(1)).await;

        let view = ctrl.view();
        assert!(view.download_link.is_none());
        assert_eq!(view.message_text(), Some(ABORTED_MESSAGE));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_and_report_waits_for_server() {
        let api = Arc::new(FakeApi::default());
        api.add_details("https://youtu.be/abc", long_video("abc"));
        api.hold_submit();
        let ctrl = controller(api.clone());
        ctrl.on_url_input("https://youtu.be/abc");
        tokio::time::sleep(Duration::from_secs(1)).await;

        let handle = ctrl.submit().unwrap();
        assert!(ctrl.cancel_and_report().await);
        assert!(api
            .calls()
            .contains(&Call::Status("abc".to_string(), JobStatusUpdate::Aborted)));
        handle.outcome().await;
        assert!(!ctrl.cancel_and_report().await);
    }
}
