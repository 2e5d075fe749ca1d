// Download orchestration
//
// One request runs resolve -> select -> transfer(s) -> merge -> done, every
// stage failing fast. Temporary artifacts from the paired and mp3 paths are
// removed on every exit, successful or not.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use crate::errors::DownloadError;
use crate::format_selector::FormatSelector;
use crate::metadata::MetadataCache;
use crate::models::{DownloadRequest, MediaFormat, MediaInfo, MediaKind, Selection};
use crate::muxer::remove_temp;
use crate::output_path;
use crate::traits::{MediaProvider, NullObserver, ProgressObserver, StreamCombiner};
use crate::transfer::stream_to_file;

pub struct Downloader {
    provider: Arc<dyn MediaProvider>,
    metadata: MetadataCache,
    combiner: Box<dyn StreamCombiner>,
    observer: Box<dyn ProgressObserver>,
    scratch_dir: PathBuf,
}

impl Downloader {
    pub fn new(provider: Arc<dyn MediaProvider>, combiner: Box<dyn StreamCombiner>) -> Self {
        Self {
            metadata: MetadataCache::new(Arc::clone(&provider)),
            provider,
            combiner,
            observer: Box::new(NullObserver),
            scratch_dir: std::env::temp_dir().join("vidgrab"),
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn ProgressObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    /// Resolve metadata without downloading (format listings, prompts).
    pub async fn resolve_info(&self, url: &str) -> Result<Arc<MediaInfo>, DownloadError> {
        self.metadata.resolve(url).await
    }

    /// Run one download request to completion, returning the output path.
    /// No stage is retried; the first error surfaces to the caller.
    pub async fn download(&self, request: &DownloadRequest) -> Result<PathBuf, DownloadError> {
        let info = self.metadata.resolve(&request.url).await?;
        let selection = FormatSelector::select(&info, &request.container, &request.quality)?;

        let output = output_path::resolve(&request.output_dir, &info.title, &request.container)?;

        match selection {
            Selection::Single(format) if format.kind == MediaKind::Muxed => {
                info!(
                    "downloading {} muxed stream",
                    format.quality_label.as_deref().unwrap_or("unknown quality")
                );
                self.fetch_to(&format, &output).await?;
            }
            Selection::Single(audio) => {
                // mp3 path: audio-only source, transcoded into place
                self.ensure_scratch_dir().await?;
                let temp_audio = self.scratch_dir.join(format!("audio.{}", audio.ext));

                info!("downloading audio stream for mp3 conversion");
                let result = match self.fetch_to(&audio, &temp_audio).await {
                    Ok(()) => {
                        self.combiner
                            .transcode(&temp_audio, &output, request.mp3_bitrate)
                            .await
                    }
                    Err(e) => Err(e),
                };

                remove_temp(&temp_audio).await;
                result?;
            }
            Selection::Paired { video, audio } => {
                self.ensure_scratch_dir().await?;
                let temp_video = self.scratch_dir.join(format!("video.{}", video.ext));
                let temp_audio = self.scratch_dir.join(format!("audio.{}", audio.ext));

                info!(
                    "no muxed {} match, downloading video and audio separately",
                    request.quality
                );
                let result = self
                    .paired_download(&video, &audio, &temp_video, &temp_audio, &output)
                    .await;

                remove_temp(&temp_video).await;
                remove_temp(&temp_audio).await;
                result?;
            }
        }

        info!("saved {}", output.display());
        Ok(output)
    }

    async fn paired_download(
        &self,
        video: &MediaFormat,
        audio: &MediaFormat,
        temp_video: &Path,
        temp_audio: &Path,
        output: &Path,
    ) -> Result<(), DownloadError> {
        self.fetch_to(video, temp_video).await?;
        self.fetch_to(audio, temp_audio).await?;
        self.combiner.merge(temp_video, temp_audio, output).await
    }

    async fn fetch_to(&self, format: &MediaFormat, dest: &Path) -> Result<(), DownloadError> {
        let stream = self.provider.open_stream(format).await?;
        let total = format.effective_size().unwrap_or(0);
        stream_to_file(stream, dest, total, self.observer.as_ref()).await?;
        Ok(())
    }

    async fn ensure_scratch_dir(&self) -> Result<(), DownloadError> {
        tokio::fs::create_dir_all(&self.scratch_dir).await?;
        Ok(())
    }
}
