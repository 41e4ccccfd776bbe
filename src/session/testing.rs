// Scripted transport and saver for controller tests

use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use super::controller::PageController;
use crate::client::errors::{ClientError, Result};
use crate::client::models::{
    DownloadRequest, DownloadResult, JobStatusUpdate, ProgressSnapshot, ProgressStatus,
    QualityOption, VideoDetails,
};
use crate::client::traits::{DownloaderApi, FileSaver};
use crate::config::ClientConfig;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Details(String),
    Submit(DownloadRequest),
    Progress(String),
    Status(String, JobStatusUpdate),
    Probe(String),
}

/// Server reply scripted for one endpoint
pub enum Reply<T> {
    Ok(T),
    /// Non-2xx with this body
    Http(u16, String),
}

impl<T: Clone> Reply<T> {
    fn resolve(&self) -> Result<T> {
        match self {
            Reply::Ok(v) => Ok(v.clone()),
            Reply::Http(status, body) => Err(ClientError::from_response(
                StatusCode::from_u16(*status).unwrap(),
                body,
            )),
        }
    }
}

pub struct FakeApi {
    calls: Mutex<Vec<Call>>,
    details: Mutex<HashMap<String, (Duration, Reply<VideoDetails>)>>,
    progress: Mutex<VecDeque<Reply<ProgressSnapshot>>>,
    submit: Mutex<Reply<DownloadResult>>,
    /// When set, submit waits for `release_submit`
    hold_submit: Mutex<bool>,
    submit_gate: Notify,
    probe_status: Mutex<u16>,
}

impl Default for FakeApi {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            details: Mutex::new(HashMap::new()),
            progress: Mutex::new(VecDeque::new()),
            submit: Mutex::new(Reply::Ok(finished_download("clip.mp4", 10_485_760))),
            hold_submit: Mutex::new(false),
            submit_gate: Notify::new(),
            probe_status: Mutex::new(200),
        }
    }
}

impl FakeApi {
    pub fn add_details(&self, url: &str, details: VideoDetails) {
        self.add_details_after(url, Duration::ZERO, Reply::Ok(details));
    }

    pub fn add_details_after(&self, url: &str, delay: Duration, reply: Reply<VideoDetails>) {
        self.details
            .lock()
            .unwrap()
            .insert(url.to_string(), (delay, reply));
    }

    pub fn push_progress(&self, reply: Reply<ProgressSnapshot>) {
        self.progress.lock().unwrap().push_back(reply);
    }

    pub fn set_submit(&self, reply: Reply<DownloadResult>) {
        *self.submit.lock().unwrap() = reply;
    }

    pub fn hold_submit(&self) {
        *self.hold_submit.lock().unwrap() = true;
    }

    pub fn release_submit(&self) {
        self.submit_gate.notify_one();
    }

    pub fn set_probe_status(&self, status: u16) {
        *self.probe_status.lock().unwrap() = status;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn details_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Details(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn submits(&self) -> Vec<DownloadRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Submit(req) => Some(req),
                _ => None,
            })
            .collect()
    }

    pub fn progress_calls(&self, video_id: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Progress(id) if id == video_id))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DownloaderApi for FakeApi {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn fetch_video_details(&self, video_url: &str) -> Result<VideoDetails> {
        self.record(Call::Details(video_url.to_string()));
        let scripted = self
            .details
            .lock()
            .unwrap()
            .get(video_url)
            .map(|(delay, reply)| (*delay, reply.resolve()));
        match scripted {
            Some((delay, reply)) => {
                tokio::time::sleep(delay).await;
                reply
            }
            None => Err(ClientError::from_response(StatusCode::BAD_GATEWAY, "")),
        }
    }

    async fn submit_download(&self, request: &DownloadRequest) -> Result<DownloadResult> {
        self.record(Call::Submit(request.clone()));
        let hold = *self.hold_submit.lock().unwrap();
        if hold {
            self.submit_gate.notified().await;
        }
        self.submit.lock().unwrap().resolve()
    }

    async fn get_progress(&self, video_id: &str) -> Result<ProgressSnapshot> {
        self.record(Call::Progress(video_id.to_string()));
        match self.progress.lock().unwrap().pop_front() {
            Some(reply) => reply.resolve(),
            None => Ok(progress(ProgressStatus::Downloading, 50.0)),
        }
    }

    async fn update_download_status(
        &self,
        video_id: &str,
        status: JobStatusUpdate,
    ) -> Result<serde_json::Value> {
        self.record(Call::Status(video_id.to_string(), status));
        Ok(serde_json::json!({ "status": "success" }))
    }

    async fn probe_file(&self, download_url: &str) -> Result<()> {
        self.record(Call::Probe(download_url.to_string()));
        match *self.probe_status.lock().unwrap() {
            200 => Ok(()),
            404 => Err(ClientError::FileUnavailable),
            other => Err(ClientError::from_response(
                StatusCode::from_u16(other).unwrap(),
                "",
            )),
        }
    }
}

#[derive(Default)]
pub struct FakeSaver {
    pub saved: Mutex<Vec<(String, String)>>,
    /// Every save fails with `FileUnavailable` while set
    pub failing: Mutex<bool>,
}

#[async_trait]
impl FileSaver for FakeSaver {
    async fn save(&self, download_url: &str, filename: &str) -> Result<PathBuf> {
        if *self.failing.lock().unwrap() {
            return Err(ClientError::FileUnavailable);
        }
        self.saved
            .lock()
            .unwrap()
            .push((download_url.to_string(), filename.to_string()));
        Ok(PathBuf::from("/downloads").join(filename))
    }
}

pub fn config() -> ClientConfig {
    ClientConfig {
        debounce_ms: 500,
        poll_interval_ms: 1000,
        // long enough that messages outlive every test
        message_timeout_ms: 600_000,
        output_dir: PathBuf::from("/downloads"),
        ..ClientConfig::default()
    }
}

pub fn controller(api: Arc<FakeApi>) -> PageController {
    controller_with_saver(api, Arc::new(FakeSaver::default()))
}

pub fn controller_with_saver(api: Arc<FakeApi>, saver: Arc<FakeSaver>) -> PageController {
    PageController::new(api, saver, config())
}

fn quality(label: &str, size_bytes: u64) -> QualityOption {
    QualityOption {
        quality: label.to_string(),
        size_bytes,
    }
}

pub fn long_video(video_id: &str) -> VideoDetails {
    VideoDetails {
        status: "success".to_string(),
        title: Some(format!("Video {}", video_id)),
        thumbnail_url: format!("https://img.example.com/{}.jpg", video_id),
        video_id: video_id.to_string(),
        is_short: false,
        available_mp4_qualities: vec![
            quality("360p", 100_000),
            quality("720p", 500_000),
            quality("1080p", 900_000),
            quality("480p", 250_000),
        ],
        available_mp3_qualities: vec![quality("128kbps", 40_000), quality("320kbps", 95_000)],
        ..Default::default()
    }
}

pub fn short_video(video_id: &str) -> VideoDetails {
    VideoDetails {
        is_short: true,
        available_mp4_qualities: Vec::new(),
        available_mp3_qualities: Vec::new(),
        ..long_video(video_id)
    }
}

pub fn progress(status: ProgressStatus, percent: f64) -> ProgressSnapshot {
    ProgressSnapshot {
        status,
        progress: Some(percent),
        speed: None,
        downloaded_bytes: None,
        total_bytes: None,
        eta: None,
        error_message: None,
    }
}

pub fn finished_download(filename: &str, file_size: u64) -> DownloadResult {
    DownloadResult {
        status: "success".to_string(),
        download_url: Some(format!("/media/downloads/{}", filename)),
        filename: Some(filename.to_string()),
        file_size: Some(file_size),
        message: None,
    }
}
