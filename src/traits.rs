// Seams between the engine and its external collaborators

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::path::Path;
use std::pin::Pin;

use crate::errors::DownloadError;
use crate::models::{DownloadProgress, MediaFormat, MediaInfo};

/// Chunked byte stream handed out by a provider
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, DownloadError>> + Send>>;

/// Resolves resource identifiers to descriptors and opens their byte streams
#[async_trait]
pub trait MediaProvider: Send + Sync {
    /// Name of the provider (for logging)
    fn name(&self) -> &'static str;

    /// Syntactic identifier check, no network
    fn validate(&self, url: &str) -> bool;

    /// Fetch the full descriptor for a resource
    async fn fetch_info(&self, url: &str) -> Result<MediaInfo, DownloadError>;

    /// Open the byte stream behind one format
    async fn open_stream(&self, format: &MediaFormat) -> Result<ByteStream, DownloadError>;
}

/// Combines or re-encodes downloaded streams via an external tool
#[async_trait]
pub trait StreamCombiner: Send + Sync {
    /// Merge a video-only and an audio-only file into `output`
    async fn merge(&self, video: &Path, audio: &Path, output: &Path)
        -> Result<(), DownloadError>;

    /// Re-encode an audio file into mp3 at the given bitrate
    async fn transcode(
        &self,
        audio: &Path,
        output: &Path,
        bitrate_kbps: u32,
    ) -> Result<(), DownloadError>;
}

/// Receives progress updates; rendering is the implementor's concern
pub trait ProgressObserver: Send + Sync {
    fn update(&self, progress: &DownloadProgress);

    /// Called exactly once when a transfer ends, success or not
    fn finished(&self);
}

/// Observer that drops every update
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn update(&self, _progress: &DownloadProgress) {}
    fn finished(&self) {}
}
