// FormatSelector - variant selection policy
//
// mp4: an exact muxed match wins outright; otherwise pair the video-only
// stream nearest the requested resolution with the best audio-only stream.
// mp3: best audio-only stream, converted later by the combiner.

use crate::errors::DownloadError;
use crate::models::{parse_resolution, MediaFormat, MediaInfo, MediaKind, Selection};

pub struct FormatSelector;

impl FormatSelector {
    /// Pick the format(s) satisfying a container/quality request.
    pub fn select(
        info: &MediaInfo,
        container: &str,
        quality: &str,
    ) -> Result<Selection, DownloadError> {
        match container {
            "mp4" => Self::select_mp4(info, quality),
            "mp3" => Self::best_audio(&info.formats)
                .cloned()
                .map(Selection::Single)
                .ok_or_else(|| {
                    DownloadError::NoSuitableFormat("no audio-only stream".to_string())
                }),
            other => Err(DownloadError::UnsupportedContainer(other.to_string())),
        }
    }

    fn select_mp4(info: &MediaInfo, quality: &str) -> Result<Selection, DownloadError> {
        // An exact muxed match short-circuits pairing. A muxed stream at the
        // wrong quality is never reconsidered once pairing starts.
        if let Some(muxed) = info.formats.iter().find(|f| {
            f.kind == MediaKind::Muxed
                && f.container == "mp4"
                && f.quality_label.as_deref() == Some(quality)
        }) {
            return Ok(Selection::Single(muxed.clone()));
        }

        let video = Self::closest_video(&info.formats, quality).ok_or_else(|| {
            DownloadError::NoSuitableFormat(format!("no mp4 video stream near {}", quality))
        })?;
        let audio = Self::best_audio(&info.formats)
            .ok_or_else(|| DownloadError::NoSuitableFormat("no audio-only stream".to_string()))?;

        Ok(Selection::Paired {
            video: video.clone(),
            audio: audio.clone(),
        })
    }

    /// Video-only mp4 format whose resolution is nearest the requested
    /// label; provider order breaks ties.
    fn closest_video<'a>(formats: &'a [MediaFormat], quality: &str) -> Option<&'a MediaFormat> {
        let target = parse_resolution(quality)? as i64;

        formats
            .iter()
            .filter(|f| f.kind == MediaKind::VideoOnly && f.container == "mp4")
            .filter_map(|f| f.resolution().map(|r| (f, r as i64)))
            .min_by_key(|(_, r)| (r - target).abs())
            .map(|(f, _)| f)
    }

    /// Audio-only format with the highest bitrate. Missing bitrates count
    /// as zero and earlier entries win ties.
    fn best_audio(formats: &[MediaFormat]) -> Option<&MediaFormat> {
        formats
            .iter()
            .filter(|f| f.kind == MediaKind::AudioOnly)
            .fold(None, |best: Option<&MediaFormat>, f| match best {
                Some(b) if f.audio_bitrate.unwrap_or(0.0) > b.audio_bitrate.unwrap_or(0.0) => {
                    Some(f)
                }
                Some(b) => Some(b),
                None => Some(f),
            })
    }

    /// Distinct video resolutions, highest first, for interactive listings.
    pub fn available_resolutions(info: &MediaInfo) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        for format in &info.formats {
            if format.kind != MediaKind::VideoOnly {
                continue;
            }
            if let Some(label) = &format.quality_label {
                if !labels.contains(label) {
                    labels.push(label.clone());
                }
            }
        }

        labels.sort_by(|a, b| {
            parse_resolution(b)
                .unwrap_or(0)
                .cmp(&parse_resolution(a).unwrap_or(0))
        });
        labels
    }
}
