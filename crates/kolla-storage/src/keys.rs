//! Shared key generation for storage backends.

use uuid::Uuid;

/// Key for a new original upload.
pub fn original_key(team_id: i64, event_id: i64, extension: &str) -> String {
    format!(
        "originals/{}/{}/{}.{}",
        team_id,
        event_id,
        Uuid::new_v4(),
        extension
    )
}

/// Destination prefix for a clip's HLS rendition.
pub fn hls_prefix(team_id: i64, event_id: i64, clip_id: i64) -> String {
    format!("hls/{}/{}/{}/", team_id, event_id, clip_id)
}

pub fn master_playlist_key(hls_prefix: &str) -> String {
    format!("{}master.m3u8", ensure_trailing_slash(hls_prefix))
}

pub fn ensure_trailing_slash(prefix: &str) -> String {
    if prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{}/", prefix)
    }
}

/// Rejects traversal and absolute keys.
pub fn is_safe_key(key: &str) -> bool {
    !key.is_empty() && !key.contains("..") && !key.starts_with('/') && !key.contains('\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn original_keys_are_scoped_and_unique() {
        let a = original_key(1, 5, "mp4");
        let b = original_key(1, 5, "mp4");
        assert!(a.starts_with("originals/1/5/"));
        assert!(a.ends_with(".mp4"));
        assert_ne!(a, b);
    }

    #[test]
    fn hls_layout() {
        assert_eq!(hls_prefix(1, 5, 9), "hls/1/5/9/");
        assert_eq!(master_playlist_key("hls/1/5/9/"), "hls/1/5/9/master.m3u8");
        assert_eq!(master_playlist_key("hls/1/5/9"), "hls/1/5/9/master.m3u8");
    }

    #[test]
    fn unsafe_keys() {
        assert!(is_safe_key("originals/1/2/a.mp4"));
        assert!(!is_safe_key("../etc/passwd"));
        assert!(!is_safe_key("/etc/passwd"));
        assert!(!is_safe_key(""));
    }
}
