use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process;
use std::sync::{Arc, Mutex};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use vidgrab::models::DownloadProgress;
use vidgrab::traits::ProgressObserver;
use vidgrab::{
    DownloadError, DownloadRequest, Downloader, FfmpegCombiner, FormatSelector, YtDlpProvider,
};

#[derive(Parser, Debug)]
#[command(name = "vidgrab", version, about = "Download YouTube videos as mp4 or mp3")]
struct Args {
    /// Video URL
    url: String,

    /// Target container: mp4 or mp3
    #[arg(short, long, default_value = "mp4")]
    container: String,

    /// Video quality label, e.g. 720p
    #[arg(short, long, default_value = "720p")]
    quality: String,

    /// Output directory (defaults to the user's download directory)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Audio bitrate in kbps for mp3 output
    #[arg(long, default_value_t = 128)]
    bitrate: u32,

    /// List available resolutions and exit
    #[arg(long)]
    list_formats: bool,
}

/// Renders engine progress updates as an indicatif bar, one bar per
/// transfer session.
struct BarObserver {
    bar: Mutex<Option<ProgressBar>>,
}

impl BarObserver {
    fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn make_bar(total: u64) -> ProgressBar {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::with_template(
                "Downloading |{bar:30.green}| {bytes}/{total_bytes} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    }
}

impl ProgressObserver for BarObserver {
    fn update(&self, progress: &DownloadProgress) {
        let Ok(mut guard) = self.bar.lock() else {
            return;
        };

        let bar = guard.get_or_insert_with(|| Self::make_bar(progress.total_bytes));
        if progress.total_bytes > 0 {
            bar.set_length(progress.total_bytes);
        }
        bar.set_position(progress.bytes_transferred);
        bar.set_message(format!(
            "{:.2} KB/s ETA: {}",
            progress.speed_kbs, progress.eta_formatted
        ));
    }

    fn finished(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_and_clear();
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), DownloadError> {
    let provider = Arc::new(YtDlpProvider::new()?);
    let combiner = FfmpegCombiner::new();
    if !combiner.is_available() {
        warn!("ffmpeg not found; merged mp4 and mp3 downloads will fail");
    }

    let downloader = Downloader::new(provider, Box::new(combiner))
        .with_observer(Box::new(BarObserver::new()));

    if args.list_formats {
        let info = downloader.resolve_info(&args.url).await?;
        println!("{} ({})", info.title, info.uploader);
        for label in FormatSelector::available_resolutions(&info) {
            println!("  {}", label);
        }
        return Ok(());
    }

    let request = DownloadRequest {
        url: args.url,
        container: args.container,
        quality: args.quality,
        output_dir: args
            .output_dir
            .unwrap_or_else(|| DownloadRequest::default().output_dir),
        mp3_bitrate: args.bitrate,
    };

    let output = downloader.download(&request).await?;
    println!("Saved to {}", output.display());
    Ok(())
}
