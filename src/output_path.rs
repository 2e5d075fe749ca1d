// Collision-free output path derivation

use std::path::{Path, PathBuf};

use crate::errors::DownloadError;

const MAX_SUFFIX: u32 = 99;

/// Replace filesystem-illegal and control characters with '-' and trim
/// surrounding whitespace.
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '-',
            c if (c as u32) < 0x20 || c as u32 == 0x7f => '-',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Build `dir/title.ext`, probing ` (1)` .. ` (99)` suffixes past existing
/// files. Creates `dir` (and parents) if absent. Never returns a path that
/// already exists.
pub fn resolve(dir: &Path, title: &str, ext: &str) -> Result<PathBuf, DownloadError> {
    std::fs::create_dir_all(dir)?;

    let clean = sanitize_title(title);

    let base = dir.join(format!("{}.{}", clean, ext));
    if !base.exists() {
        return Ok(base);
    }

    for i in 1..=MAX_SUFFIX {
        let candidate = dir.join(format!("{} ({}).{}", clean, i, ext));
        if !candidate.exists() {
            return Ok(candidate);
        }
    }

    Err(DownloadError::FilenameExhausted(clean))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sanitize_replaces_illegal_chars() {
        assert_eq!(sanitize_title("a<b>:c|d"), "a-b--c-d");
        assert_eq!(sanitize_title("what/ever\\else"), "what-ever-else");
        assert_eq!(sanitize_title("tab\there"), "tab-here");
        assert_eq!(sanitize_title("  padded  "), "padded");
    }

    #[test]
    fn returns_base_when_nothing_exists() {
        let dir = tempdir().unwrap();
        let path = resolve(dir.path(), "clip", "mp4").unwrap();
        assert_eq!(path, dir.path().join("clip.mp4"));
    }

    #[test]
    fn probes_past_existing_files() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("clip.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("clip (1).mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("clip (2).mp4"), b"x").unwrap();

        let path = resolve(dir.path(), "clip", "mp4").unwrap();
        assert_eq!(path, dir.path().join("clip (3).mp4"));
    }

    #[test]
    fn fails_once_all_suffixes_are_taken() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("clip.mp4"), b"x").unwrap();
        for i in 1..=99 {
            std::fs::write(dir.path().join(format!("clip ({}).mp4", i)), b"x").unwrap();
        }

        let err = resolve(dir.path(), "clip", "mp4").unwrap_err();
        assert!(matches!(err, DownloadError::FilenameExhausted(_)));
    }

    #[test]
    fn creates_missing_directories() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");

        let path = resolve(&nested, "clip", "mp3").unwrap();
        assert!(nested.is_dir());
        assert_eq!(path, nested.join("clip.mp3"));
    }
}
