// Session module - page state and the components that drive it

pub mod cancel;
pub mod controller;
pub mod details;
pub mod progress;
pub mod state;
pub mod submit;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::PageController;
pub use state::{Phase, Session};
pub use submit::{DownloadHandle, DownloadOutcome};
pub use view::{
    ButtonView, DownloadLink, EstimateView, Message, MessageKind, PageView, ProgressView,
    ThumbnailView, ViewEmitter,
};
