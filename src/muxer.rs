// ffmpeg invocation for merging and transcoding

use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, warn};

use crate::errors::DownloadError;
use crate::traits::StreamCombiner;
use crate::utils::{find_binary, run_output};

/// Combiner backed by the ffmpeg binary
pub struct FfmpegCombiner {
    ffmpeg_path: String,
}

impl FfmpegCombiner {
    pub fn new() -> Self {
        Self {
            ffmpeg_path: find_binary("ffmpeg"),
        }
    }

    /// Check if the ffmpeg binary is usable
    pub fn is_available(&self) -> bool {
        match std::process::Command::new(&self.ffmpeg_path)
            .arg("-version")
            .output()
        {
            Ok(out) => out.status.success(),
            Err(_) => false,
        }
    }

    async fn run_ffmpeg(&self, args: Vec<String>) -> Result<(), DownloadError> {
        debug!("running {} {}", self.ffmpeg_path, args.join(" "));

        let output = run_output(&self.ffmpeg_path, args).await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(DownloadError::Merge(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ))
        }
    }
}

impl Default for FfmpegCombiner {
    fn default() -> Self {
        Self::new()
    }
}

/// Delete a temporary artifact. Missing files are fine; any other failure
/// is logged and swallowed so it can never mask the transfer/merge result.
pub(crate) async fn remove_temp(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("failed to remove temporary file {}: {}", path.display(), e),
    }
}

#[async_trait]
impl StreamCombiner for FfmpegCombiner {
    /// Copy the video stream untouched, re-encode audio to AAC.
    async fn merge(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
    ) -> Result<(), DownloadError> {
        let args = vec![
            "-i".to_string(),
            video.display().to_string(),
            "-i".to_string(),
            audio.display().to_string(),
            "-c:v".to_string(),
            "copy".to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-y".to_string(),
            output.display().to_string(),
        ];

        self.run_ffmpeg(args).await?;

        remove_temp(video).await;
        remove_temp(audio).await;
        Ok(())
    }

    async fn transcode(
        &self,
        audio: &Path,
        output: &Path,
        bitrate_kbps: u32,
    ) -> Result<(), DownloadError> {
        let args = vec![
            "-i".to_string(),
            audio.display().to_string(),
            "-vn".to_string(),
            "-b:a".to_string(),
            format!("{}k", bitrate_kbps),
            "-f".to_string(),
            "mp3".to_string(),
            "-y".to_string(),
            output.display().to_string(),
        ];

        self.run_ffmpeg(args).await?;

        remove_temp(audio).await;
        Ok(())
    }
}
