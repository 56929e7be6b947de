//! Upload validation and storage-path normalization
//!
//! Guards the object-storage boundary: every uploaded file name is reduced
//! to a storage-safe stem and the extension must exactly match the declared
//! MIME type from a fixed allow-list. Paths are composed deterministically
//! from entity ids; uniqueness comes from the ids, never from randomness.

use policypilot_common::types::MediaKind;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

const MAX_STEM_LENGTH: usize = 64;

/// Allowed policy document uploads: extension → exact MIME type
const POLICY_EXTENSION_TO_MIME: [(&str, &str); 3] = [
    ("pdf", "application/pdf"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("txt", "text/plain"),
];

/// Allowed module media uploads: extension → exact MIME type
const MEDIA_EXTENSION_TO_MIME: [(&str, &str); 8] = [
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("mov", "video/quicktime"),
];

/// Normalized policy upload: storage path plus the sanitized file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPolicyFile {
    pub file_path: String,
    pub extension: String,
    pub safe_file_name: String,
}

/// Normalized module media upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMediaFile {
    pub file_path: String,
    pub safe_file_name: String,
    pub mime_type: String,
    pub kind: MediaKind,
}

/// Classify a MIME type into a media kind from its prefix
pub fn media_kind_from_mime(mime_type: &str) -> Option<MediaKind> {
    if mime_type.starts_with("image/") {
        Some(MediaKind::Image)
    } else if mime_type.starts_with("video/") {
        Some(MediaKind::Video)
    } else {
        None
    }
}

/// Reduce a file stem to `[a-zA-Z0-9._-]`: NFKD-normalize, turn path
/// separators and whitespace into `-`, drop everything else, collapse
/// repeated dashes, trim leading/trailing separators, cap the length.
/// An empty result falls back to `placeholder`.
fn sanitize_file_stem(stem: &str, placeholder: &str) -> String {
    let normalized: String = stem.nfkd().collect();

    let mut out = String::with_capacity(normalized.len());
    for ch in normalized.chars() {
        if ch == '\\' || ch == '/' || ch.is_whitespace() {
            out.push('-');
        } else if ch.is_ascii_alphanumeric() || ch == '.' || ch == '_' || ch == '-' {
            out.push(ch);
        } else {
            out.push('-');
        }
    }

    let mut collapsed = String::with_capacity(out.len());
    let mut previous_dash = false;
    for ch in out.chars() {
        if ch == '-' {
            if !previous_dash {
                collapsed.push(ch);
            }
            previous_dash = true;
        } else {
            collapsed.push(ch);
            previous_dash = false;
        }
    }

    let trimmed = collapsed.trim_matches(|c| c == '.' || c == '_' || c == '-');
    if trimmed.is_empty() {
        return placeholder.to_string();
    }

    trimmed.chars().take(MAX_STEM_LENGTH).collect()
}

/// Split a trimmed file name into (stem, lowercased extension)
fn split_extension(file_name: &str) -> ApiResult<(&str, String)> {
    let trimmed = file_name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(
            "Uploaded file must include a valid name.".to_string(),
        ));
    }

    let (stem, extension) = match trimmed.rsplit_once('.') {
        Some((stem, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            (stem, ext.to_ascii_lowercase())
        }
        _ => {
            return Err(ApiError::Validation(
                "Uploaded file must include an extension.".to_string(),
            ))
        }
    };

    Ok((stem, extension))
}

fn expected_mime<'a>(table: &[(&str, &'a str)], extension: &str) -> Option<&'a str> {
    table
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
}

/// Validate and normalize a policy document upload into its storage path
pub fn normalize_policy_upload_file(
    org_id: Uuid,
    policy_id: Uuid,
    file_name: &str,
    mime_type: &str,
) -> ApiResult<NormalizedPolicyFile> {
    let (stem, extension) = split_extension(file_name)?;

    let expected = expected_mime(&POLICY_EXTENSION_TO_MIME, &extension).ok_or_else(|| {
        ApiError::Validation("Only PDF, DOCX, and TXT files are supported.".to_string())
    })?;

    if expected != mime_type {
        return Err(ApiError::Validation(format!(
            "File extension .{} does not match MIME type {}.",
            extension, mime_type
        )));
    }

    let safe_stem = sanitize_file_stem(stem, "policy");
    let safe_file_name = format!("{}.{}", safe_stem, extension);
    let file_path = format!("org/{}/{}-{}", org_id, policy_id, safe_file_name);

    Ok(NormalizedPolicyFile {
        file_path,
        extension,
        safe_file_name,
    })
}

/// Validate and normalize a module media upload into its storage path.
/// The extension/MIME pairing is checked before kind classification.
pub fn normalize_module_media_upload_file(
    org_id: Uuid,
    campaign_id: Uuid,
    module_id: Uuid,
    embed_id: Uuid,
    file_name: &str,
    mime_type: &str,
) -> ApiResult<NormalizedMediaFile> {
    let (stem, extension) = split_extension(file_name)?;

    let expected = expected_mime(&MEDIA_EXTENSION_TO_MIME, &extension).ok_or_else(|| {
        ApiError::Validation(
            "Only PNG, JPG, WEBP, GIF, MP4, WEBM, and MOV files are supported.".to_string(),
        )
    })?;

    if expected != mime_type {
        return Err(ApiError::Validation(format!(
            "File extension .{} does not match MIME type {}.",
            extension, mime_type
        )));
    }

    let kind = media_kind_from_mime(mime_type).ok_or_else(|| {
        ApiError::Validation("Only image and video files are supported.".to_string())
    })?;

    let safe_stem = sanitize_file_stem(stem, "media");
    let safe_file_name = format!("{}.{}", safe_stem, extension);
    let file_path = format!(
        "org/{}/{}/{}/{}-{}",
        org_id, campaign_id, module_id, embed_id, safe_file_name
    );

    Ok(NormalizedMediaFile {
        file_path,
        safe_file_name,
        mime_type: mime_type.to_string(),
        kind,
    })
}
