// Download Submitter: validation, the cancellable download request and the save step

use std::path::PathBuf;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::controller::PageController;
use super::state::{ActiveDownload, Phase, Session};
use super::view::{DownloadLink, MessageKind};
use crate::client::errors::{ClientError, Result};
use crate::client::models::{DownloadRequest, DownloadResult, SHORT_QUALITY};
use crate::client::utils::{format_bytes, is_valid_url};

const MISSING_VIDEO_ID_MESSAGE: &str =
    "Error: Video ID not found. Please re-enter URL and try again.";
const INVALID_DOWNLOAD_URL_MESSAGE: &str = "Please enter a valid URL for download.";
const NO_QUALITY_MESSAGE: &str = "Please select a valid quality for long videos.";
const NO_DOWNLOAD_URL_MESSAGE: &str = "Server did not return a valid download URL.";

/// How a submitted download ended
#[derive(Debug)]
pub enum DownloadOutcome {
    /// File produced and saved locally
    Saved { path: PathBuf, file_size: Option<u64> },
    /// File produced but the save step failed; the link stays for a manual retry
    SaveFailed { link: DownloadLink, error: ClientError },
    /// Server answered without a usable file
    Rejected(String),
    /// Request failed; carries the message shown to the user
    Failed(String),
    /// Aborted through the Cancel Handler
    Cancelled,
    /// Replaced by a newer submit before completing
    Superseded,
}

/// Handle to a running download request
pub struct DownloadHandle {
    task: JoinHandle<DownloadOutcome>,
}

impl DownloadHandle {
    pub async fn outcome(self) -> DownloadOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("[Submit] Download task failed: {}", e);
                DownloadOutcome::Failed(format!("Download task failed: {}", e))
            }
        }
    }
}

/// What `finish_download` decided under the lock
enum Completion {
    Save { download_url: String, filename: String },
    Done(DownloadOutcome),
}

impl PageController {
    /// Validate the form and start the download request.
    ///
    /// Progress polling starts alongside the request. Validation failures roll
    /// the UI back and are returned as errors; so is a download already in flight.
    pub fn submit(&self) -> Result<DownloadHandle> {
        let prepared = self.update(|s| -> Result<(u64, DownloadRequest, CancellationToken)> {
            if s.phase().is_busy() {
                return Err(ClientError::Busy);
            }

            let previous = s.phase().clone();
            s.clear_message();
            s.view.download_link = None;
            s.view.download_button.enabled = false;
            s.view.download_button.busy = true;
            s.view.cancel_visible = true;
            s.transition(Phase::Submitting);

            let request = validate(s).map_err(|(error, text)| {
                s.view.progress.stop();
                s.rollback_submit();
                s.show_message(MessageKind::Error, text);
                s.restore_phase(previous);
                error
            })?;

            if let Some(orphan) = s.active_download.take() {
                tracing::debug!("[Submit] Dropping orphaned request #{}", orphan.seq);
                orphan.token.cancel();
            }
            s.download_seq += 1;
            let token = CancellationToken::new();
            s.active_download = Some(ActiveDownload {
                seq: s.download_seq,
                video_id: request.video_id.clone(),
                token: token.clone(),
            });
            s.transition(Phase::Downloading {
                job_id: request.video_id.clone(),
            });
            Ok((s.download_seq, request, token))
        });
        let (seq, request, token) = prepared?;

        self.start_progress_polling(&request.video_id);
        self.update(|s| {
            s.view.progress.start("Starting download...");
            s.view.estimate.visible = false;
        });

        tracing::info!(
            "[Submit] Requesting {} as {} ({})",
            request.url,
            request.format_type,
            request.quality
        );
        let this = self.clone();
        let task = tokio::spawn(async move {
            let result = tokio::select! {
                _ = token.cancelled() => Err(ClientError::Aborted),
                r = this.shared.api.submit_download(&request) => r,
            };
            this.finish_download(seq, result).await
        });
        Ok(DownloadHandle { task })
    }

    async fn finish_download(
        &self,
        seq: u64,
        result: Result<DownloadResult>,
    ) -> DownloadOutcome {
        let completion = self.update(|s| complete(s, seq, result));
        let (download_url, filename) = match completion {
            Completion::Done(outcome) => return outcome,
            Completion::Save {
                download_url,
                filename,
            } => (download_url, filename),
        };

        match self.shared.saver.save(&download_url, &filename).await {
            Ok(path) => {
                tracing::info!("[Submit] Saved {}", path.display());
                let file_size = self.update(|s| {
                    let link = s.view.download_link.as_mut().filter(|l| l.href == download_url)?;
                    link.saved_to = Some(path.clone());
                    link.file_size
                });
                DownloadOutcome::Saved { path, file_size }
            }
            Err(error) => {
                tracing::warn!("[Submit] Saving {} failed: {}", filename, error);
                let link = self.update(|s| {
                    let link = s
                        .view
                        .download_link
                        .clone()
                        .filter(|l| l.href == download_url)?;
                    s.show_message(
                        MessageKind::Error,
                        format!(
                            "Could not save {} ({}). Use the download link to try again.",
                            link.filename, error
                        ),
                    );
                    Some(link)
                });
                let link = link.unwrap_or(DownloadLink {
                    href: download_url,
                    filename,
                    file_size: None,
                    saved_to: None,
                });
                DownloadOutcome::SaveFailed { link, error }
            }
        }
    }

    /// The manual fallback link: probe the file, then save it again
    pub async fn manual_download(&self) -> Result<PathBuf> {
        let link = self
            .read(|s| s.view().download_link.clone())
            .ok_or(ClientError::FileUnavailable)?;

        if let Err(e) = self.shared.api.probe_file(&link.href).await {
            tracing::warn!("[Submit] Probe of {} failed: {}", link.href, e);
            self.update(|s| s.show_message(MessageKind::Error, e.probe_message()));
            return Err(e);
        }

        let path = self.shared.saver.save(&link.href, &link.filename).await?;
        self.update(|s| {
            if let Some(current) = s.view.download_link.as_mut() {
                if current.href == link.href {
                    current.saved_to = Some(path.clone());
                }
            }
        });
        Ok(path)
    }
}

/// Build the request from the form, or the error and message to show
fn validate(s: &Session) -> std::result::Result<DownloadRequest, (ClientError, &'static str)> {
    if s.video_id().is_empty() {
        return Err((ClientError::MissingVideoId, MISSING_VIDEO_ID_MESSAGE));
    }
    let url = s.url().trim();
    if !is_valid_url(url) {
        return Err((
            ClientError::InvalidUrl(url.to_string()),
            INVALID_DOWNLOAD_URL_MESSAGE,
        ));
    }
    let quality = if s.is_short() {
        SHORT_QUALITY.to_string()
    } else {
        match s.view().quality.selected_value() {
            Some(q) if s.view().quality.enabled => q.to_string(),
            _ => return Err((ClientError::QualityNotSelected, NO_QUALITY_MESSAGE)),
        }
    };

    Ok(DownloadRequest {
        url: url.to_string(),
        format_type: s.view().format,
        quality,
        video_id: s.video_id().to_string(),
    })
}

fn complete(s: &mut Session, seq: u64, result: Result<DownloadResult>) -> Completion {
    let current = s.active_download.as_ref().map_or(false, |a| a.seq == seq);
    if !current {
        if matches!(result, Err(ClientError::Aborted)) {
            return Completion::Done(DownloadOutcome::Cancelled);
        }
        tracing::debug!("[Submit] Discarding result of superseded request #{}", seq);
        return Completion::Done(DownloadOutcome::Superseded);
    }
    s.active_download = None;

    s.stop_polling();
    s.view.progress.stop();
    s.rollback_submit();

    match result {
        Ok(body) => match body
            .file()
            .map(|(url, name)| (url.to_string(), name.to_string()))
        {
            Some((download_url, filename)) => {
                let size = format_bytes(body.file_size.unwrap_or(0));
                s.show_message(
                    MessageKind::Success,
                    format!("Download initiated successfully! (Size: {})", size),
                );
                s.view.download_link = Some(DownloadLink {
                    href: download_url.clone(),
                    filename: filename.clone(),
                    file_size: body.file_size,
                    saved_to: None,
                });
                s.transition(Phase::Finished);
                Completion::Save {
                    download_url,
                    filename,
                }
            }
            None => {
                let text = body
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| NO_DOWNLOAD_URL_MESSAGE.to_string());
                tracing::warn!("[Submit] No file in response: {}", text);
                s.show_message(MessageKind::Error, text.clone());
                s.transition(Phase::Failed);
                Completion::Done(DownloadOutcome::Rejected(text))
            }
        },
        Err(e) => {
            tracing::error!("[Submit] Download request failed: {}", e);
            let text = e.submit_message();
            s.show_message(MessageKind::Error, text.clone());
            s.transition(Phase::Failed);
            Completion::Done(DownloadOutcome::Failed(text))
        }
    }
}
