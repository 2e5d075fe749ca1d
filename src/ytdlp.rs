// yt-dlp metadata provider
//
// Shells out to the yt-dlp binary (`--dump-json`) for metadata and opens
// the direct format URLs as reqwest byte streams. The engine never parses
// yt-dlp's own progress output; transfers go over HTTP here.

use async_trait::async_trait;
use futures::StreamExt;
use regex::Regex;
use tracing::debug;

use crate::errors::DownloadError;
use crate::models::{MediaFormat, MediaInfo, MediaKind};
use crate::traits::{ByteStream, MediaProvider};
use crate::utils::{find_binary, run_output_with_timeout};

lazy_static::lazy_static! {
    static ref WATCH_URL_RE: Regex = Regex::new(
        r"^https?://(www\.|m\.|music\.)?(youtube\.com/(watch\?v=|shorts/|embed/)[\w-]{11}|youtu\.be/[\w-]{11})"
    ).unwrap();
}

/// Provider configuration
#[derive(Debug, Clone)]
pub struct YtDlpConfig {
    /// Socket and subprocess timeout in seconds
    pub timeout_seconds: u64,
    /// SOCKS5/HTTP proxy URL
    pub proxy: Option<String>,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            proxy: None,
        }
    }
}

pub struct YtDlpProvider {
    ytdlp_path: String,
    config: YtDlpConfig,
    client: reqwest::Client,
}

impl YtDlpProvider {
    pub fn new() -> Result<Self, DownloadError> {
        Self::with_config(YtDlpConfig::default())
    }

    pub fn with_config(config: YtDlpConfig) -> Result<Self, DownloadError> {
        let mut builder = reqwest::Client::builder();
        if let Some(proxy_url) = config.proxy.as_deref() {
            let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
                DownloadError::Execution(format!("Invalid proxy {}: {}", proxy_url, e))
            })?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| DownloadError::Execution(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            ytdlp_path: find_binary("yt-dlp"),
            config,
            client,
        })
    }

    /// Check if the yt-dlp binary is usable
    pub fn is_available(&self) -> bool {
        match std::process::Command::new(&self.ytdlp_path)
            .arg("--version")
            .output()
        {
            Ok(out) => out.status.success(),
            Err(_) => false,
        }
    }

    fn build_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--dump-json".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            self.config.timeout_seconds.to_string(),
        ];

        if let Some(proxy) = &self.config.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }

        args.push(url.to_string());
        args
    }

    fn parse_info(stdout: &[u8]) -> Result<MediaInfo, DownloadError> {
        let json_str = String::from_utf8_lossy(stdout);
        let json: serde_json::Value = serde_json::from_str(json_str.trim())
            .map_err(|e| DownloadError::Parse(format!("Invalid JSON from yt-dlp: {}", e)))?;

        let formats = Self::parse_formats(&json)?;

        Ok(MediaInfo {
            id: json["id"].as_str().unwrap_or("unknown").to_string(),
            title: json["title"].as_str().unwrap_or("Unknown").to_string(),
            uploader: json["uploader"].as_str().unwrap_or("Unknown").to_string(),
            duration_seconds: json["duration"].as_f64().unwrap_or(0.0) as u64,
            is_private: json["availability"].as_str() == Some("private"),
            is_live: json["is_live"].as_bool().unwrap_or(false),
            formats,
        })
    }

    fn parse_formats(json: &serde_json::Value) -> Result<Vec<MediaFormat>, DownloadError> {
        let formats_array = json["formats"]
            .as_array()
            .ok_or_else(|| DownloadError::Parse("No formats array in yt-dlp output".to_string()))?;

        let mut formats = Vec::new();

        for f in formats_array {
            let url = match f["url"].as_str() {
                Some(u) => u.to_string(),
                None => continue,
            };

            let vcodec = f["vcodec"].as_str().unwrap_or("none");
            let acodec = f["acodec"].as_str().unwrap_or("none");

            let kind = match (vcodec != "none", acodec != "none") {
                (true, true) => MediaKind::Muxed,
                (true, false) => MediaKind::VideoOnly,
                (false, true) => MediaKind::AudioOnly,
                // Storyboard/image tracks carry neither
                (false, false) => continue,
            };

            let ext = f["ext"].as_str().unwrap_or("mp4").to_string();
            let quality_label = f["height"]
                .as_u64()
                .map(|h| format!("{}p", h))
                .or_else(|| f["format_note"].as_str().map(|s| s.to_string()));

            formats.push(MediaFormat {
                format_id: f["format_id"].as_str().unwrap_or("").to_string(),
                kind,
                container: ext.clone(),
                quality_label,
                audio_bitrate: f["abr"].as_f64().map(|a| a as f32),
                ext,
                url,
                filesize: f["filesize"].as_u64(),
                filesize_approx: f["filesize_approx"].as_u64(),
            });
        }

        Ok(formats)
    }
}

#[async_trait]
impl MediaProvider for YtDlpProvider {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    fn validate(&self, url: &str) -> bool {
        WATCH_URL_RE.is_match(url)
    }

    async fn fetch_info(&self, url: &str) -> Result<MediaInfo, DownloadError> {
        if !self.is_available() {
            return Err(DownloadError::ToolNotFound(
                "yt-dlp binary not found".to_string(),
            ));
        }

        let args = self.build_args(url);
        debug!("running {} {}", self.ytdlp_path, args.join(" "));

        let output =
            run_output_with_timeout(&self.ytdlp_path, args, self.config.timeout_seconds).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DownloadError::from(stderr.to_string()));
        }

        Self::parse_info(&output.stdout)
    }

    async fn open_stream(&self, format: &MediaFormat) -> Result<ByteStream, DownloadError> {
        let response = self
            .client
            .get(&format.url)
            .send()
            .await
            .map_err(|e| DownloadError::Transfer(e.to_string()))?
            .error_for_status()
            .map_err(|e| DownloadError::Transfer(e.to_string()))?;

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| DownloadError::Transfer(e.to_string())));

        Ok(Box::pin(stream))
    }
}
