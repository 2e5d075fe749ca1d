// vidgrab - YouTube download engine with format selection and ffmpeg merging

pub mod errors;
pub mod format_selector;
pub mod metadata;
pub mod models;
pub mod muxer;
pub mod orchestrator;
pub mod output_path;
pub mod progress;
pub mod traits;
pub mod transfer;
pub mod utils;
pub mod ytdlp;

pub use errors::DownloadError;
pub use format_selector::FormatSelector;
pub use models::{
    DownloadProgress, DownloadRequest, MediaFormat, MediaInfo, MediaKind, Selection,
};
pub use muxer::FfmpegCombiner;
pub use orchestrator::Downloader;
pub use progress::RateEstimator;
pub use traits::{ByteStream, MediaProvider, NullObserver, ProgressObserver, StreamCombiner};
pub use ytdlp::{YtDlpConfig, YtDlpProvider};
