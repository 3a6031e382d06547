//! Media attached to a message (metadata only; bytes are fetched on demand through the Bot).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Photo,
    Document,
    Video,
    Audio,
    Voice,
    Sticker,
    Other,
}

/// Media descriptor. `mime_type` and `file_size` are whatever the transport reported and may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub kind: MediaKind,
    pub file_id: String,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: Option<u64>,
}

impl Media {
    /// Name used in prompts and uploads: the reported file name, else a name derived from the kind.
    pub fn display_file_name(&self) -> String {
        if let Some(name) = self.file_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        match self.kind {
            MediaKind::Photo => "photo.jpg",
            MediaKind::Video => "video.mp4",
            MediaKind::Audio => "audio.mp3",
            MediaKind::Voice => "voice.ogg",
            MediaKind::Sticker => "sticker.webp",
            MediaKind::Document | MediaKind::Other => "file",
        }
        .to_string()
    }
}
