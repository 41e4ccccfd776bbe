// Client module - typed access to the yTube Downloader server

pub mod cookies;
pub mod errors;
pub mod http;
pub mod models;
pub mod quality;
pub mod saver;
pub mod traits;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use errors::{ClientError, Result};
pub use http::HttpApi;
pub use models::{
    DownloadRequest, DownloadResult, FormatType, ProgressSnapshot, ProgressStatus, QualityOption,
    VideoDetails,
};
pub use quality::QualitySelector;
pub use saver::DirectorySaver;
pub use traits::{DownloaderApi, FileSaver};
