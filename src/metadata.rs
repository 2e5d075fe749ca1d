// Metadata resolution with per-engine caching

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::DownloadError;
use crate::models::MediaInfo;
use crate::traits::MediaProvider;

/// Resolves URLs to media descriptors, memoizing per URL for the life of
/// the owning engine. Insert-only; the process is short-lived and the
/// per-invocation cardinality is small.
pub struct MetadataCache {
    provider: Arc<dyn MediaProvider>,
    cache: Mutex<HashMap<String, Arc<MediaInfo>>>,
}

impl MetadataCache {
    pub fn new(provider: Arc<dyn MediaProvider>) -> Self {
        Self {
            provider,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve one URL, hitting the provider at most once per URL.
    pub async fn resolve(&self, url: &str) -> Result<Arc<MediaInfo>, DownloadError> {
        if !self.provider.validate(url) {
            return Err(DownloadError::InvalidUrl(url.to_string()));
        }

        if let Some(info) = self.cache.lock().await.get(url) {
            debug!("metadata cache hit for {}", url);
            return Ok(Arc::clone(info));
        }

        let info = self.provider.fetch_info(url).await?;

        if info.formats.is_empty() {
            return Err(DownloadError::VideoUnavailable);
        }
        if info.is_private {
            return Err(DownloadError::PrivateVideo);
        }
        if info.is_live {
            return Err(DownloadError::LiveStreamUnsupported);
        }

        let info = Arc::new(info);
        self.cache
            .lock()
            .await
            .insert(url.to_string(), Arc::clone(&info));
        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MediaFormat, MediaKind};
    use crate::traits::ByteStream;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        info: MediaInfo,
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl MediaProvider for CountingProvider {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn validate(&self, url: &str) -> bool {
            url.starts_with("https://")
        }

        async fn fetch_info(&self, _url: &str) -> Result<MediaInfo, DownloadError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.info.clone())
        }

        async fn open_stream(&self, _format: &MediaFormat) -> Result<ByteStream, DownloadError> {
            Err(DownloadError::Transfer("no streams in this test".to_string()))
        }
    }

    fn info(is_private: bool, is_live: bool, with_formats: bool) -> MediaInfo {
        let formats = if with_formats {
            vec![MediaFormat {
                format_id: "140".to_string(),
                kind: MediaKind::AudioOnly,
                container: "m4a".to_string(),
                quality_label: None,
                audio_bitrate: Some(128.0),
                ext: "m4a".to_string(),
                url: "https://cdn.example/140".to_string(),
                filesize: None,
                filesize_approx: None,
            }]
        } else {
            Vec::new()
        };

        MediaInfo {
            id: "abc".to_string(),
            title: "Clip".to_string(),
            uploader: "tester".to_string(),
            duration_seconds: 10,
            is_private,
            is_live,
            formats,
        }
    }

    fn cache_with(info: MediaInfo) -> (Arc<CountingProvider>, MetadataCache) {
        let provider = Arc::new(CountingProvider {
            info,
            fetches: AtomicUsize::new(0),
        });
        let cache = MetadataCache::new(Arc::clone(&provider) as Arc<dyn MediaProvider>);
        (provider, cache)
    }

    #[tokio::test]
    async fn second_resolve_hits_the_cache() {
        let (provider, cache) = cache_with(info(false, false, true));

        let first = cache.resolve("https://example.com/v").await.unwrap();
        let second = cache.resolve("https://example.com/v").await.unwrap();

        assert_eq!(provider.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn invalid_url_never_reaches_the_provider() {
        let (provider, cache) = cache_with(info(false, false, true));

        let err = cache.resolve("not a url").await.unwrap_err();
        assert!(matches!(err, DownloadError::InvalidUrl(_)));
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn private_videos_are_rejected() {
        let (_, cache) = cache_with(info(true, false, true));

        let err = cache.resolve("https://example.com/v").await.unwrap_err();
        assert!(matches!(err, DownloadError::PrivateVideo));
    }

    #[tokio::test]
    async fn live_streams_are_rejected() {
        let (_, cache) = cache_with(info(false, true, true));

        let err = cache.resolve("https://example.com/v").await.unwrap_err();
        assert!(matches!(err, DownloadError::LiveStreamUnsupported));
    }

    #[tokio::test]
    async fn empty_format_lists_are_unavailable() {
        let (_, cache) = cache_with(info(false, false, false));

        let err = cache.resolve("https://example.com/v").await.unwrap_err();
        assert!(matches!(err, DownloadError::VideoUnavailable));
    }

    #[tokio::test]
    async fn rejections_are_not_cached() {
        let (provider, cache) = cache_with(info(true, false, true));

        let _ = cache.resolve("https://example.com/v").await;
        let _ = cache.resolve("https://example.com/v").await;

        // A gated descriptor never enters the cache, so the provider is
        // consulted again.
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 2);
    }
}
