// Error types for the download engine

use std::fmt;

#[derive(Debug, Clone)]
pub enum DownloadError {
    /// URL failed syntactic validation
    InvalidUrl(String),

    /// Resource has no playable media (deleted, removed, struck)
    VideoUnavailable,

    /// Resource is marked private
    PrivateVideo,

    /// Live/ongoing stream with no fixed byte length
    LiveStreamUnsupported,

    /// No variant satisfies the container/quality request
    NoSuitableFormat(String),

    /// Requested container is neither mp4 nor mp3
    UnsupportedContainer(String),

    /// `title.ext` through `title (99).ext` are all taken
    FilenameExhausted(String),

    /// Source stream errored mid-copy
    Transfer(String),

    /// ffmpeg merge or transcode failed
    Merge(String),

    /// yt-dlp or ffmpeg not found on the system
    ToolNotFound(String),

    /// Provider output could not be parsed
    Parse(String),

    /// Subprocess failed to run
    Execution(String),

    /// Filesystem error
    Io(String),
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl(url) => write!(f, "Invalid URL: {}", url),
            Self::VideoUnavailable => write!(f, "Video unavailable"),
            Self::PrivateVideo => write!(f, "Video is private"),
            Self::LiveStreamUnsupported => write!(f, "Live streams are not supported"),
            Self::NoSuitableFormat(msg) => write!(f, "No suitable format: {}", msg),
            Self::UnsupportedContainer(c) => write!(f, "Unsupported container: {}", c),
            Self::FilenameExhausted(name) => write!(
                f,
                "No free filename for '{}' after 100 tries. Change the name.",
                name
            ),
            Self::Transfer(msg) => write!(f, "Transfer failed: {}", msg),
            Self::Merge(msg) => write!(f, "Merge failed: {}", msg),
            Self::ToolNotFound(tool) => write!(f, "Tool not found: {}", tool),
            Self::Parse(msg) => write!(f, "Parse error: {}", msg),
            Self::Execution(msg) => write!(f, "Execution error: {}", msg),
            Self::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for DownloadError {}

impl From<std::io::Error> for DownloadError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

// Classify raw provider stderr into typed errors
impl From<String> for DownloadError {
    fn from(s: String) -> Self {
        // Restriction states reported by yt-dlp itself
        if s.contains("Private video") || s.contains("This video is private") {
            return Self::PrivateVideo;
        }

        if s.contains("Video unavailable") || s.contains("video is not available") {
            return Self::VideoUnavailable;
        }

        if s.contains("live event") || s.contains("live stream") {
            return Self::LiveStreamUnsupported;
        }

        // Malformed or unsupported resource identifiers
        if s.contains("Unsupported URL") || s.contains("is not a valid URL") {
            return Self::InvalidUrl(s);
        }

        // Tool not found
        if s.contains("not found") || s.contains("No such file") || s.contains("command not found")
        {
            return Self::ToolNotFound(s);
        }

        // Parse errors
        if s.contains("parse") || s.contains("JSON") {
            return Self::Parse(s);
        }

        // Everything else
        Self::Execution(s)
    }
}
