use serde::{Deserialize, Serialize};

/// Per-file size ceiling for proof uploads.
pub const MAX_PROOF_FILE_BYTES: usize = 10 * 1024 * 1024;

/// Proof attachment domain model - one uploaded media file evidencing
/// task completion. Append-only; rows are never mutated.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Proof {
    pub proof_id: String,
    pub task_id: String,

    /// Uploading user
    pub user_id: String,

    /// Key inside the proof bucket
    pub file_path: String,

    pub uploaded_at: String,
}

/// One file in a submission, carried inline as base64.
#[derive(Debug, Deserialize)]
pub struct ProofUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: String,
}

/// How the viewer should render a stored file, sniffed from the
/// extension of its path.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

pub fn media_kind_for_path(file_path: &str) -> MediaKind {
    let extension = file_path
        .rsplit('.')
        .next()
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "mp4" | "webm" | "mov" | "avi" | "mkv" => MediaKind::Video,
        _ => MediaKind::Image,
    }
}

/// Check one decoded file against the size ceiling and the allowed
/// media-type prefixes. Reports the offending file by name.
pub fn validate_proof_file(
    file_name: &str,
    content_type: &str,
    decoded_len: usize,
) -> Result<(), String> {
    if !content_type.starts_with("image/") && !content_type.starts_with("video/") {
        return Err(format!(
            "{}: only image or video files are accepted",
            file_name
        ));
    }
    if decoded_len > MAX_PROOF_FILE_BYTES {
        return Err(format!(
            "{}: file exceeds the {} MB limit",
            file_name,
            MAX_PROOF_FILE_BYTES / (1024 * 1024)
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_extensions_sniff_as_video() {
        for path in [
            "u/t-1-0.mp4",
            "u/t-1-0.webm",
            "u/t-1-0.MOV",
            "u/t-1-0.avi",
            "u/t-1-0.mkv",
        ] {
            assert_eq!(media_kind_for_path(path), MediaKind::Video, "{}", path);
        }
    }

    #[test]
    fn everything_else_sniffs_as_image() {
        assert_eq!(media_kind_for_path("u/t-1-0.png"), MediaKind::Image);
        assert_eq!(media_kind_for_path("u/t-1-0.jpeg"), MediaKind::Image);
        assert_eq!(media_kind_for_path("u/t-1-0"), MediaKind::Image);
    }

    #[test]
    fn accepts_images_and_videos_within_limit() {
        assert!(validate_proof_file("a.png", "image/png", 2 * 1024 * 1024).is_ok());
        assert!(validate_proof_file("b.mp4", "video/mp4", 3 * 1024 * 1024).is_ok());
    }

    #[test]
    fn rejects_oversized_file_naming_it() {
        let err =
            validate_proof_file("big.mp4", "video/mp4", 15 * 1024 * 1024).unwrap_err();
        assert!(err.contains("big.mp4"));
        assert!(err.contains("10 MB"));
    }

    #[test]
    fn boundary_size_is_accepted() {
        assert!(validate_proof_file("a.png", "image/png", MAX_PROOF_FILE_BYTES).is_ok());
        assert!(validate_proof_file("a.png", "image/png", MAX_PROOF_FILE_BYTES + 1).is_err());
    }

    #[test]
    fn rejects_non_media_content_type() {
        let err = validate_proof_file("notes.pdf", "application/pdf", 10).unwrap_err();
        assert!(err.contains("notes.pdf"));
    }
}
