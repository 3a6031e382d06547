//! MIME classification for attachments: trust specific transport metadata, otherwise probe content, otherwise
//! guess from the file name.

const OCTET_STREAM: &str = "application/octet-stream";

fn is_generic(mime: &str) -> bool {
    let mime = mime.trim();
    mime.is_empty() || mime.eq_ignore_ascii_case(OCTET_STREAM) || mime.eq_ignore_ascii_case("binary/octet-stream")
}

/// Magic-number probe for the formats users commonly send.
pub fn sniff(bytes: &[u8]) -> Option<&'static str> {
    let starts = |magic: &[u8]| bytes.starts_with(magic);
    if starts(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if starts(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if starts(b"GIF87a") || starts(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && starts(b"RIFF") && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else if bytes.len() >= 12 && starts(b"RIFF") && &bytes[8..12] == b"WAVE" {
        Some("audio/wav")
    } else if starts(b"%PDF-") {
        Some("application/pdf")
    } else if starts(b"OggS") {
        Some("audio/ogg")
    } else if starts(b"ID3") || starts(&[0xFF, 0xFB]) {
        Some("audio/mpeg")
    } else if starts(&[0x1A, 0x45, 0xDF, 0xA3]) {
        Some("video/webm")
    } else if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
        Some("video/mp4")
    } else {
        None
    }
}

/// Final MIME type for an attachment.
pub fn classify(declared: Option<&str>, file_name: &str, bytes: &[u8]) -> String {
    if let Some(mime) = declared.filter(|m| !is_generic(m)) {
        return mime.trim().to_string();
    }
    if let Some(mime) = sniff(bytes) {
        return mime.to_string();
    }
    mime_guess::from_path(file_name).first_or_octet_stream().to_string()
}

/// File extension for a generated image's MIME type.
pub fn image_extension(mime: &str) -> &'static str {
    match mime.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "png",
    }
}
