mod cli;
pub mod client;
pub mod config;
pub mod session;

pub use cli::run;
pub use client::{ClientError, DirectorySaver, DownloaderApi, FileSaver, HttpApi, Result};
pub use config::ClientConfig;
pub use session::{DownloadOutcome, PageController, PageView, Phase};
