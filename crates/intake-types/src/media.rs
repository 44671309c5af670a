//! Media classification by file extension.
//!
//! The pipeline routes uploads purely on extension: audio goes through the
//! speech pipeline, images through document extraction, everything else is
//! rejected before any remote call is made.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Audio extensions accepted by the transcription endpoint.
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "mp3", "m4a", "mp4", "mpeg", "mpga", "webm"];

/// Image extensions accepted by document extraction.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff", "gif"];

/// The two media families the pipeline knows how to process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// Speech audio, routed through transcription → analysis → synthesis.
    Audio,
    /// A document image, routed through vision extraction.
    Image,
}

impl MediaKind {
    /// Classifies a path by its extension (case-insensitive).
    ///
    /// Returns `None` for paths with no extension or an extension outside the
    /// supported sets.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Audio)
        } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Image)
        } else {
            None
        }
    }

    /// Returns the string label for this media kind.
    pub fn label(self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Image => "image",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn classifies_audio_extensions() {
        for ext in AUDIO_EXTENSIONS {
            let path = PathBuf::from(format!("call.{ext}"));
            assert_eq!(MediaKind::from_path(&path), Some(MediaKind::Audio), "{ext}");
        }
    }

    #[test]
    fn classifies_image_extensions_case_insensitively() {
        assert_eq!(
            MediaKind::from_path(Path::new("scan.PNG")),
            Some(MediaKind::Image)
        );
        assert_eq!(
            MediaKind::from_path(Path::new("card.Jpeg")),
            Some(MediaKind::Image)
        );
    }

    #[test]
    fn rejects_unknown_and_missing_extensions() {
        assert_eq!(MediaKind::from_path(Path::new("notes.txt")), None);
        assert_eq!(MediaKind::from_path(Path::new("README")), None);
        assert_eq!(MediaKind::from_path(Path::new("archive.tar.gz")), None);
    }
}
