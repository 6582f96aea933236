//! Input validation shared by services.
//!
//! Every function returns `AppError::InvalidInput` on failure so callers can
//! propagate with `?` before touching the database.

use std::collections::HashSet;

use crate::AppError;

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_TAGS: usize = 32;
pub const MAX_TAG_LEN: usize = 64;
pub const MAX_COMMENT_LEN: usize = 5000;

const DEFAULT_EXTENSION: &str = "mp4";

/// Check `0 <= start < end`, and `end <= duration` when the clip duration is known.
pub fn validate_segment_range(
    start_s: f64,
    end_s: f64,
    duration_s: Option<f64>,
) -> Result<(), AppError> {
    if !start_s.is_finite() || !end_s.is_finite() {
        return Err(AppError::InvalidInput(
            "Segment bounds must be finite numbers".to_string(),
        ));
    }
    if start_s < 0.0 {
        return Err(AppError::InvalidInput(
            "Segment start must not be negative".to_string(),
        ));
    }
    if end_s <= start_s {
        return Err(AppError::InvalidInput(
            "Segment end must be after its start".to_string(),
        ));
    }
    if let Some(duration) = duration_s {
        if end_s > duration {
            return Err(AppError::InvalidInput(format!(
                "Segment end {}s exceeds clip duration {}s",
                end_s, duration
            )));
        }
    }
    Ok(())
}

/// Trim a display name and enforce non-empty, bounded length.
pub fn validate_name(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput(format!("{} must not be empty", field)));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(AppError::InvalidInput(format!(
            "{} must be at most {} characters",
            field, MAX_NAME_LEN
        )));
    }
    Ok(trimmed.to_string())
}

pub fn validate_comment_body(body: &str) -> Result<String, AppError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput(
            "Comment body must not be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_COMMENT_LEN {
        return Err(AppError::InvalidInput(format!(
            "Comment body must be at most {} characters",
            MAX_COMMENT_LEN
        )));
    }
    Ok(trimmed.to_string())
}

/// Trim, drop empties and de-duplicate while keeping first-seen order.
pub fn normalize_tags(tags: &[String]) -> Result<Vec<String>, AppError> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        if tag.chars().count() > MAX_TAG_LEN {
            return Err(AppError::InvalidInput(format!(
                "Tag '{}' exceeds {} characters",
                tag, MAX_TAG_LEN
            )));
        }
        if seen.insert(tag.to_string()) {
            out.push(tag.to_string());
        }
    }
    if out.len() > MAX_TAGS {
        return Err(AppError::InvalidInput(format!(
            "At most {} tags are allowed",
            MAX_TAGS
        )));
    }
    Ok(out)
}

/// Lowercased extension of `filename`, or `mp4` when it has none.
pub fn file_extension(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    match base.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= 10
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

pub fn validate_content_type(content_type: &str, allowed: &[String]) -> Result<(), AppError> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase();
    if allowed.iter().any(|a| a.eq_ignore_ascii_case(&essence)) {
        Ok(())
    } else {
        Err(AppError::InvalidInput(format!(
            "Content type '{}' is not allowed. Allowed types: {}",
            content_type,
            allowed.join(", ")
        )))
    }
}

pub fn validate_file_size(file_size: Option<i64>, max_bytes: u64) -> Result<(), AppError> {
    match file_size {
        Some(size) if size < 0 => Err(AppError::InvalidInput(
            "File size must not be negative".to_string(),
        )),
        Some(size) if size as u64 > max_bytes => Err(AppError::InvalidInput(format!(
            "File size {} exceeds the maximum of {} bytes",
            size, max_bytes
        ))),
        _ => Ok(()),
    }
}

/// `requested` must contain exactly the ids in `current`, each once.
pub fn validate_permutation(current: &[i64], requested: &[i64]) -> Result<(), AppError> {
    if current.len() != requested.len() {
        return Err(AppError::InvalidInput(format!(
            "Expected {} ids, got {}",
            current.len(),
            requested.len()
        )));
    }
    let expected: HashSet<i64> = current.iter().copied().collect();
    let mut seen = HashSet::with_capacity(requested.len());
    for id in requested {
        if !expected.contains(id) {
            return Err(AppError::InvalidInput(format!("Unknown id {} in ordering", id)));
        }
        if !seen.insert(*id) {
            return Err(AppError::InvalidInput(format!("Duplicate id {} in ordering", id)));
        }
    }
    Ok(())
}
