// Byte-stream to file copying with progress reporting

use futures::StreamExt;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::errors::DownloadError;
use crate::progress::RateEstimator;
use crate::traits::{ByteStream, ProgressObserver};

/// Copy `stream` into `dest`, reporting cumulative progress after every
/// chunk. `total` is 0 when the content length is unknown.
///
/// On a source or write error the partial destination file is left in
/// place; removing it is the caller's responsibility. The observer is
/// notified of completion exactly once on every exit path.
pub async fn stream_to_file(
    mut stream: ByteStream,
    dest: &Path,
    total: u64,
    observer: &dyn ProgressObserver,
) -> Result<u64, DownloadError> {
    let mut file = File::create(dest).await?;
    let mut session = RateEstimator::new();
    let mut downloaded: u64 = 0;

    observer.update(&session.sample(downloaded, total));

    while let Some(chunk) = stream.next().await {
        let chunk = match chunk {
            Ok(c) => c,
            Err(e) => {
                observer.finished();
                return Err(e);
            }
        };

        if let Err(e) = file.write_all(&chunk).await {
            observer.finished();
            return Err(e.into());
        }

        downloaded += chunk.len() as u64;
        observer.update(&session.sample(downloaded, total));
    }

    if let Err(e) = file.flush().await {
        observer.finished();
        return Err(e.into());
    }

    observer.finished();
    Ok(downloaded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::tempdir;

    use crate::models::DownloadProgress;

    #[derive(Default)]
    struct RecordingObserver {
        updates: Mutex<Vec<DownloadProgress>>,
        finishes: AtomicUsize,
    }

    impl ProgressObserver for RecordingObserver {
        fn update(&self, progress: &DownloadProgress) {
            if let Ok(mut updates) = self.updates.lock() {
                updates.push(progress.clone());
            }
        }

        fn finished(&self) {
            self.finishes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn stream_of(chunks: Vec<Result<Bytes, DownloadError>>) -> ByteStream {
        Box::pin(futures::stream::iter(chunks))
    }

    #[tokio::test]
    async fn copies_all_chunks_in_order() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("out.bin");
        let observer = RecordingObserver::default();

        let stream = stream_of(vec![
            Ok(Bytes::from_static(b"hello ")),
            Ok(Bytes::from_static(b"world")),
        ]);

        let written = stream_to_file(stream, &dest, 11, &observer).await.unwrap();

        assert_eq!(written, 11);
        assert_eq!(std::fs::read(&dest).unwrap(), b"hello world");
        assert_eq!(observer.finishes.load(Ordering::SeqCst), 1);

        let updates = observer.updates.lock().unwrap();
        // Zero-state sample plus one per chunk
        assert_eq!(updates.len(), 3);
        assert_eq!(updates[0].bytes_transferred, 0);
        assert_eq!(updates.last().unwrap().bytes_transferred, 11);
    }

    #[tokio::test]
    async fn source_error_leaves_partial_file() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("out.bin");
        let observer = RecordingObserver::default();

        let stream = stream_of(vec![
            Ok(Bytes::from_static(b"part")),
            Err(DownloadError::Transfer("connection reset".to_string())),
        ]);

        let err = stream_to_file(stream, &dest, 0, &observer).await.unwrap_err();

        assert!(matches!(err, DownloadError::Transfer(_)));
        assert_eq!(std::fs::read(&dest).unwrap(), b"part");
        assert_eq!(observer.finishes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_stream_produces_empty_file() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("out.bin");
        let observer = RecordingObserver::default();

        let written = stream_to_file(stream_of(Vec::new()), &dest, 0, &observer)
            .await
            .unwrap();

        assert_eq!(written, 0);
        assert!(dest.exists());
        assert_eq!(observer.finishes.load(Ordering::SeqCst), 1);
    }
}
