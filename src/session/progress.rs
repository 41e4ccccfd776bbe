// Progress Poller: fixed-period job status polling keyed by video id

use std::ops::ControlFlow;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::controller::PageController;
use super::state::{Phase, Session};
use super::view::MessageKind;
use crate::client::errors::Result;
use crate::client::models::{ProgressSnapshot, ProgressStatus};

impl PageController {
    /// Start polling `video_id`, replacing any running loop.
    /// The first request goes out one period after the call.
    pub fn start_progress_polling(&self, video_id: &str) {
        let seq = self.update(|s| {
            s.stop_polling();
            s.view.progress.begin_polling();
            s.view.estimate.visible = false;
            s.poll_seq
        });

        let this = self.clone();
        let period = self.shared.config.poll_interval();
        let video_id = video_id.to_string();
        let handle = tokio::spawn(async move {
            tracing::info!("[Poller] Polling progress for {}", video_id);
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let result = this.shared.api.get_progress(&video_id).await;
                if this.update(|s| apply_progress(s, seq, result)).is_break() {
                    break;
                }
            }
            tracing::info!("[Poller] Finished polling {}", video_id);
        });

        self.update(|s| {
            if s.poll_seq == seq {
                s.poller = Some(handle);
            } else {
                handle.abort();
            }
        });
    }

    /// Stop the polling loop; a no-op when none is running
    pub fn stop_progress_polling(&self) -> bool {
        self.update(Session::stop_polling)
    }
}

fn apply_progress(s: &mut Session, seq: u64, result: Result<ProgressSnapshot>) -> ControlFlow<()> {
    if s.poll_seq != seq {
        return ControlFlow::Break(());
    }

    let snap = match result {
        Ok(snap) => snap,
        Err(e) => {
            tracing::warn!("[Poller] Progress request failed: {}", e);
            poll_failed(s, seq, e.progress_message());
            return ControlFlow::Break(());
        }
    };

    match snap.status {
        status if status.is_active() => {
            s.view.progress.apply_active(&snap);
            ControlFlow::Continue(())
        }
        ProgressStatus::Finished => {
            s.view.progress.apply_finished(&snap);
            s.release_poller(seq);
            ControlFlow::Break(())
        }
        ProgressStatus::Error => {
            let reason = snap
                .error_message
                .as_deref()
                .filter(|m| !m.is_empty())
                .unwrap_or("Unknown error.");
            tracing::warn!("[Poller] Job reported error: {}", reason);
            poll_failed(s, seq, format!("Download failed: {}", reason));
            ControlFlow::Break(())
        }
        _ => {
            tracing::debug!("[Poller] Ignoring unrecognised status");
            ControlFlow::Continue(())
        }
    }
}

fn poll_failed(s: &mut Session, seq: u64, text: String) {
    s.release_poller(seq);
    s.view.progress.stop();
    s.rollback_submit();
    s.show_message(MessageKind::Error, text);
    s.transition(Phase::Failed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::models::ByteCount;
    use crate::session::testing::{controller, progress, FakeApi, Reply};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn first_poll_waits_one_period() {
        let api = Arc::new(FakeApi::default());
        let ctrl = controller(api.clone());

        ctrl.start_progress_polling("v1");
        let view = ctrl.view();
        assert!(view.progress.visible);
        assert!(view.progress.size_info_visible);
        assert!(view.progress.eta_visible);
        assert_eq!(view.progress.downloaded, "0 Bytes");
        assert_eq!(view.progress.total, "N/A");
        assert!(!view.estimate.visible);

        tokio::time::sleep(Duration::from_millis(900)).await;
        assert_eq!(api.progress_calls("v1"), 0);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(api.progress_calls("v1"), 1);
        assert_eq!(ctrl.view().progress.percent, 50.0);
    }

    #[tokio::test(start_paused = true)]
    async fn finished_snapshot_stops_loop() {
        let api = Arc::new(FakeApi::default());
        let mut active = progress(ProgressStatus::Downloading, 40.0);
        active.speed = Some("1.5MiB/s".into());
        active.eta = Some("00:12".into());
        api.push_progress(Reply::Ok(active));
        let mut done = progress(ProgressStatus::Finished, 100.0);
        done.downloaded_bytes = Some(ByteCount::Bytes(10_485_760));
        done.total_bytes = Some(ByteCount::Text("10.0MiB".to_string()));
        api.push_progress(Reply::Ok(done));
        let ctrl = controller(api.clone());

        ctrl.start_progress_polling("v1");
        tokio::time::sleep(Duration::from_millis(1500)).await;
        let view = ctrl.view();
        assert_eq!(view.progress.text, "Downloading... 40% (1.5MiB/s)");
        assert_eq!(view.progress.eta, "00:12");

        tokio::time::sleep(Duration::from_secs(1)).await;
        let view = ctrl.view();
        assert_eq!(view.progress.percent, 100.0);
        assert_eq!(view.progress.text, "Download Complete!");
        assert_eq!(view.progress.eta, "0s");
        assert_eq!(view.progress.downloaded, "10 MB");
        assert_eq!(view.progress.total, "10.0MiB");
        assert!(!ctrl.is_polling());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(api.progress_calls("v1"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn error_snapshot_rolls_back_ui() {
        let api = Arc::new(FakeApi::default());
        let mut failed = progress(ProgressStatus::Error, 12.0);
        failed.error_message = Some("HTTP Error 403: Forbidden".to_string());
        api.push_progress(Reply::Ok(failed));
        api.push_progress(Reply::Ok(progress(ProgressStatus::Error, 0.0)));
        let ctrl = controller(api.clone());

        ctrl.start_progress_polling("v1");
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let view = ctrl.view();
        assert_eq!(
            view.message_text(),
            Some("Download failed: HTTP Error 403: Forbidden")
        );
        assert!(!view.progress.visible);
        assert!(!view.progress.size_info_visible);
        assert!(!view.progress.eta_visible);
        assert!(view.download_button.enabled);
        assert!(!view.cancel_visible);
        assert!(!ctrl.is_polling());

        ctrl.start_progress_polling("v1");
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(ctrl.view().message_text(), Some("Download failed: Unknown error."));
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_stops_loop() {
        let api = Arc::new(FakeApi::default());
        api.push_progress(Reply::Http(500, "oops".to_string()));
        let ctrl = controller(api.clone());

        ctrl.start_progress_polling("v1");
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(
            ctrl.view().message_text(),
            Some("Network error fetching progress. Status: 500. Error: Internal Server Error.")
        );
        assert_eq!(api.progress_calls("v1"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_status_keeps_polling() {
        let api = Arc::new(FakeApi::default());
        api.push_progress(Reply::Ok(progress(ProgressStatus::Unknown, 0.0)));
        let ctrl = controller(api.clone());

        ctrl.start_progress_polling("v1");
        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert_eq!(api.progress_calls("v1"), 2);
        assert!(ctrl.is_polling());
        assert_eq!(ctrl.view().message_text(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn restarting_leaves_a_single_loop() {
        let api = Arc::new(FakeApi::default());
        let ctrl = controller(api.clone());

        ctrl.start_progress_polling("a");
        ctrl.start_progress_polling("b");
        tokio::time::sleep(Duration::from_millis(3500)).await;

        assert_eq!(api.progress_calls("a"), 0);
        assert_eq!(api.progress_calls("b"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent() {
        let api = Arc::new(FakeApi::default());
        let ctrl = controller(api.clone());

        ctrl.start_progress_polling("v1");
        assert!(ctrl.stop_progress_polling());
        assert!(!ctrl.stop_progress_polling());
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(api.progress_calls("v1"), 0);
    }
}
