// Command-line front end: drives one PageController and renders its view stream

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use crate::client::errors::{ClientError, Result};
use crate::client::models::FormatType;
use crate::client::utils::format_bytes;
use crate::client::{DirectorySaver, HttpApi};
use crate::config::ClientConfig;
use crate::session::{DownloadOutcome, MessageKind, PageController, PageView, Phase};

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
    /// Video URL to download
    url: Option<String>,

    /// Page URL carrying the video link as `videoUrl` or `url` query parameter
    #[arg(long)]
    page_url: Option<String>,

    /// Output format: mp4 or mp3
    #[arg(short, long, default_value = "mp4")]
    format: FormatType,

    /// Quality tier, e.g. 1080p or 320kbps (default: largest available)
    #[arg(short, long)]
    quality: Option<String>,

    /// List available qualities and exit
    #[arg(long)]
    list: bool,

    /// Server base URL
    #[arg(long)]
    server: Option<String>,

    /// Directory the file is saved to
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Config file (default: <config dir>/ytube-client/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Cookie header sent to the server, e.g. "csrftoken=...; sessionid=..."
    #[arg(long)]
    cookies: Option<String>,

    /// HTTP or SOCKS5 proxy URL
    #[arg(long)]
    proxy: Option<String>,
}

impl Args {
    fn apply(&self, config: &mut ClientConfig) {
        if let Some(server) = &self.server {
            config.server_url = server.clone();
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }
        if let Some(cookies) = &self.cookies {
            config.cookies = Some(cookies.clone());
        }
        if let Some(proxy) = &self.proxy {
            config.proxy = Some(proxy.clone());
        }
    }
}

/// Parse arguments, install logging and run one download to completion
pub fn run() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ytube_client_lib=info")),
        )
        .with_target(false)
        .init();

    tracing::debug!("ytube-client v{} starting", env!("CARGO_PKG_VERSION"));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(drive(args))
}

async fn drive(args: Args) -> Result<()> {
    let mut config = ClientConfig::load(args.config.as_deref())?;
    args.apply(&mut config);

    let api = HttpApi::new(&config)?;
    let saver = DirectorySaver::new(
        api.client().clone(),
        api.base_url().clone(),
        config.output_dir.clone(),
    )
    .with_cookies(api.cookies());
    let controller = PageController::new(Arc::new(api), Arc::new(saver), config);
    let mut rx = controller.subscribe();

    controller.on_format_change(args.format);
    match (&args.page_url, &args.url) {
        (Some(page_url), _) => controller.init(page_url),
        (None, Some(url)) => controller.on_url_input(url),
        (None, None) => {
            return Err(ClientError::Config(
                "a video URL or --page-url is required".to_string(),
            ))
        }
    }

    if controller.phase() == Phase::Idle {
        let view = controller.view();
        let text = view.message_text().unwrap_or("No video URL found on the page.");
        return Err(ClientError::InvalidUrl(text.to_string()));
    }

    let view = rx
        .wait_for(|v| v.phase != Phase::FetchingDetails)
        .await
        .map_err(|_| ClientError::Aborted)?
        .clone();
    if view.phase != Phase::AwaitingSelection {
        let text = view.message_text().unwrap_or("Could not fetch video details.");
        return Err(ClientError::Server(text.to_string()));
    }
    print_details(&view);
    if args.list {
        return Ok(());
    }

    if let Some(quality) = &args.quality {
        controller.on_quality_change(quality)?;
    }
    if let Some(message) = controller.view().message.filter(|m| m.kind == MessageKind::Error) {
        return Err(ClientError::Server(message.text));
    }

    let handle = controller.submit()?;
    let renderer = tokio::spawn(render_progress(controller.subscribe()));

    let outcome = handle.outcome();
    tokio::pin!(outcome);
    let outcome = tokio::select! {
        outcome = &mut outcome => outcome,
        _ = tokio::signal::ctrl_c() => {
            eprintln!();
            controller.cancel_and_report().await;
            outcome.await
        }
    };
    renderer.abort();

    match outcome {
        DownloadOutcome::Saved { path, file_size } => {
            println!(
                "Saved {} ({})",
                path.display(),
                format_bytes(file_size.unwrap_or(0))
            );
            Ok(())
        }
        DownloadOutcome::SaveFailed { link, error } => {
            eprintln!("File is still available at {}", link.href);
            Err(error)
        }
        DownloadOutcome::Rejected(text) | DownloadOutcome::Failed(text) => {
            Err(ClientError::Server(text))
        }
        DownloadOutcome::Cancelled | DownloadOutcome::Superseded => Err(ClientError::Aborted),
    }
}

fn print_details(view: &PageView) {
    println!("{}", view.thumbnail.title);
    if !view.quality.visible {
        println!("  Short video: best available quality");
        return;
    }
    for option in &view.quality.options {
        let marker = if view.quality.selected_value() == Some(option.value.as_str()) {
            "*"
        } else {
            " "
        };
        let size = option
            .size_bytes
            .map(format_bytes)
            .unwrap_or_else(|| "N/A".to_string());
        println!(" {} {:<8} {:<20} {}", marker, option.value, option.label, size);
    }
}

/// One stderr line per change of the progress text
async fn render_progress(mut rx: watch::Receiver<PageView>) {
    let mut last = String::new();
    while rx.changed().await.is_ok() {
        let line = {
            let view = rx.borrow_and_update();
            if !view.progress.visible {
                continue;
            }
            let p = &view.progress;
            if p.size_info_visible {
                format!("{} [{} / {}] ETA {}", p.text, p.downloaded, p.total, p.eta)
            } else {
                p.text.clone()
            }
        };
        if line != last {
            eprintln!("{}", line);
            last = line;
        }
    }
}
