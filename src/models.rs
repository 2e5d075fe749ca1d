// Common data models for the download engine

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What a format carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    /// Video and audio in one stream
    Muxed,
    /// Video track only
    VideoOnly,
    /// Audio track only
    AudioOnly,
}

/// One encoding variant offered by the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaFormat {
    /// Provider format ID (e.g., "137", "140")
    pub format_id: String,
    pub kind: MediaKind,
    /// Container tag (mp4, webm, m4a)
    pub container: String,
    /// Resolution label such as "720p"; audio-only formats have none
    pub quality_label: Option<String>,
    /// Audio bitrate in kbps
    pub audio_bitrate: Option<f32>,
    /// File extension used when writing this stream to disk
    pub ext: String,
    /// Direct download URL
    pub url: String,
    /// File size in bytes
    pub filesize: Option<u64>,
    /// Approximate file size (when exact is unknown)
    pub filesize_approx: Option<u64>,
}

impl MediaFormat {
    /// Get effective file size (exact or approximate)
    pub fn effective_size(&self) -> Option<u64> {
        self.filesize.or(self.filesize_approx)
    }

    /// Numeric resolution parsed from the quality label ("720p" -> 720)
    pub fn resolution(&self) -> Option<u32> {
        self.quality_label.as_deref().and_then(parse_resolution)
    }
}

/// Leading digits of a quality label, if any
pub(crate) fn parse_resolution(label: &str) -> Option<u32> {
    let digits: String = label.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Media resource descriptor. Built once per URL, never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    pub id: String,
    pub title: String,
    pub uploader: String,
    pub duration_seconds: u64,
    pub is_private: bool,
    pub is_live: bool,
    pub formats: Vec<MediaFormat>,
}

/// What the selector decided to download
#[derive(Debug, Clone)]
pub enum Selection {
    /// One stream covers the request
    Single(MediaFormat),
    /// Separate tracks to be merged after transfer
    Paired {
        video: MediaFormat,
        audio: MediaFormat,
    },
}

/// One download request
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    /// Target container: "mp4" or "mp3"
    pub container: String,
    /// Requested quality label, e.g. "720p"
    pub quality: String,
    pub output_dir: PathBuf,
    /// Audio bitrate in kbps for mp3 output
    pub mp3_bitrate: u32,
}

impl Default for DownloadRequest {
    fn default() -> Self {
        Self {
            url: String::new(),
            container: "mp4".to_string(),
            quality: "720p".to_string(),
            output_dir: dirs::download_dir().unwrap_or_else(|| PathBuf::from(".")),
            mp3_bitrate: 128,
        }
    }
}

/// Progress state emitted once per received chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadProgress {
    pub bytes_transferred: u64,
    /// 0 when the content length is unknown
    pub total_bytes: u64,
    pub speed_kbs: f64,
    pub eta_formatted: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_parsing() {
        assert_eq!(parse_resolution("720p"), Some(720));
        assert_eq!(parse_resolution("1080p60"), Some(1080));
        assert_eq!(parse_resolution("best"), None);
        assert_eq!(parse_resolution(""), None);
    }

    #[test]
    fn effective_size_prefers_exact() {
        let fmt = MediaFormat {
            format_id: "137".to_string(),
            kind: MediaKind::VideoOnly,
            container: "mp4".to_string(),
            quality_label: Some("1080p".to_string()),
            audio_bitrate: None,
            ext: "mp4".to_string(),
            url: String::new(),
            filesize: Some(100),
            filesize_approx: Some(200),
        };
        assert_eq!(fmt.effective_size(), Some(100));
    }
}
