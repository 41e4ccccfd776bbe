// Page controller: owns the session and wires the components together

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

use super::state::{Phase, Session};
use super::view::{PageView, ViewEmitter};
use crate::client::traits::{DownloaderApi, FileSaver};
use crate::client::utils::deep_link_url;
use crate::config::ClientConfig;

pub(crate) struct Shared {
    pub(crate) api: Arc<dyn DownloaderApi>,
    pub(crate) saver: Arc<dyn FileSaver>,
    pub(crate) config: ClientConfig,
    session: Mutex<Session>,
    emitter: ViewEmitter,
}

/// Drives one downloader page. Cheap to clone; clones share the session.
///
/// Every mutation goes through [`PageController::update`], which publishes
/// the resulting [`PageView`] to subscribers. The session lock is never held
/// across an await.
#[derive(Clone)]
pub struct PageController {
    pub(crate) shared: Arc<Shared>,
}

impl PageController {
    pub fn new(
        api: Arc<dyn DownloaderApi>,
        saver: Arc<dyn FileSaver>,
        config: ClientConfig,
    ) -> Self {
        tracing::debug!("[Session] Controller created (transport: {})", api.name());
        let session = Session::new();
        let emitter = ViewEmitter::new(session.view().clone());
        Self {
            shared: Arc::new(Shared {
                api,
                saver,
                config,
                session: Mutex::new(session),
                emitter,
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    /// Receiver of view snapshots, starting with the current one
    pub fn subscribe(&self) -> watch::Receiver<PageView> {
        self.shared.emitter.subscribe()
    }

    pub fn view(&self) -> PageView {
        self.read(|s| s.view().clone())
    }

    pub fn phase(&self) -> Phase {
        self.read(|s| s.phase().clone())
    }

    pub fn is_polling(&self) -> bool {
        self.read(Session::is_polling)
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&Session) -> R) -> R {
        f(&self.lock())
    }

    /// Mutate the session, publish the new view and arm message auto-hide
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let (result, autohide) = {
            let mut session = self.lock();
            let result = f(&mut session);
            self.shared.emitter.emit(session.view());
            (result, session.take_autohide())
        };

        if let Some(seq) = autohide {
            self.arm_autohide(seq);
        }
        result
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.shared
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Hide message `seq` after the configured timeout unless a newer one replaced it
    fn arm_autohide(&self, seq: u64) {
        let shared = Arc::clone(&self.shared);
        let delay = shared.config.message_timeout();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut session = shared
                .session
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            session.expire_message(seq);
            shared.emitter.emit(session.view());
        });
    }

    /// Clear everything derived from the current video
    pub fn reset(&self) {
        self.update(Session::reset_ui);
    }

    /// Page load: reset, then fetch details if the page URL carries a video link
    pub fn init(&self, page_url: &str) {
        self.reset();
        if let Some(video_url) = deep_link_url(page_url) {
            tracing::info!("[Details] Deep link: {}", video_url);
            self.update(|s| s.view.url = video_url);
            self.fetch_video_details();
        }
    }
}
