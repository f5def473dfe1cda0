//! Content locator helpers for hosted documents and videos

use once_cell::sync::Lazy;
use regex::Regex;

static DRIVE_PATH_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/file/d/([a-zA-Z0-9_-]+)").expect("valid regex"));

static DRIVE_QUERY_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&]id=([a-zA-Z0-9_-]+)").expect("valid regex"));

static YOUTUBE_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^.*(youtu\.be/|v/|u/\w/|embed/|watch\?v=|&v=)([^#&?]*).*").expect("valid regex")
});

/// Extract a Google Drive file id from a sharing link
pub fn drive_file_id(url: &str) -> Option<&str> {
    DRIVE_PATH_ID
        .captures(url)
        .or_else(|| DRIVE_QUERY_ID.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Embeddable preview URL; non-Drive links pass through unchanged
pub fn preview_url(url: &str) -> String {
    match drive_file_id(url) {
        Some(id) => format!("https://drive.google.com/file/d/{}/preview", id),
        None => url.to_string(),
    }
}

/// Direct download URL; non-Drive links pass through unchanged
pub fn download_url(url: &str) -> String {
    match drive_file_id(url) {
        Some(id) => format!("https://drive.google.com/uc?export=download&id={}", id),
        None => url.to_string(),
    }
}

/// Extract an 11-character YouTube video id
pub fn youtube_id(url: &str) -> Option<&str> {
    YOUTUBE_ID
        .captures(url)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str())
        .filter(|id| id.len() == 11)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drive_id_from_view_link() {
        let url = "https://drive.google.com/file/d/1BxiMVs0XRA5nFMdKvBdBZjgmUUqptlbs/view";
        assert_eq!(drive_file_id(url), Some("1BxiMVs0XRA5nFMdKvBdBZjgmUUqptlbs"));
    }

    #[test]
    fn drive_id_from_query_link() {
        let url = "https://drive.google.com/open?id=abc_DEF-123";
        assert_eq!(drive_file_id(url), Some("abc_DEF-123"));
    }

    #[test]
    fn preview_and_download_urls() {
        let url = "https://drive.google.com/file/d/XYZ/view?usp=sharing";
        assert_eq!(preview_url(url), "https://drive.google.com/file/d/XYZ/preview");
        assert_eq!(download_url(url), "https://drive.google.com/uc?export=download&id=XYZ");
    }

    #[test]
    fn other_links_pass_through() {
        let url = "https://www.w3.org/WAI/ER/tests/xhtml/testfiles/resources/pdf/dummy.pdf";
        assert_eq!(preview_url(url), url);
        assert_eq!(download_url(url), url);
    }

    #[test]
    fn youtube_ids() {
        assert_eq!(youtube_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), Some("dQw4w9WgXcQ"));
        assert_eq!(youtube_id("https://youtu.be/dQw4w9WgXcQ"), Some("dQw4w9WgXcQ"));
        assert_eq!(youtube_id("https://www.youtube.com/embed/dQw4w9WgXcQ"), Some("dQw4w9WgXcQ"));
        assert_eq!(youtube_id("https://www.youtube.com/watch?v=..."), None);
        assert_eq!(youtube_id("https://example.com/video.mp4"), None);
    }
}
