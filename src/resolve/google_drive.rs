//! Google Drive share link normalization.

use regex::Regex;
use url::Url;

/// Check if a URL points at a single Google Drive file.
pub fn is_google_drive_file_url(url: &Url) -> bool {
    url.host_str() == Some("drive.google.com")
        && (url.path().contains("/file/d/") || url.path() == "/uc")
}

/// Extract the file ID from a `/file/d/<id>/...` share link.
pub fn extract_file_id(url: &Url) -> Option<String> {
    let re = Regex::new(r"(?:^|/)file/d/([a-zA-Z0-9_-]+)").ok()?;
    re.captures(url.path()).map(|c| c[1].to_string())
}

/// Direct download URL for a Google Drive file.
pub fn file_download_url(file_id: &str) -> String {
    format!("https://drive.google.com/uc?id={}&export=download", file_id)
}

/// Rewrite share links to their direct download form. Other URLs, including
/// links that are already `uc?id=...`, are returned unchanged.
pub fn normalize(url: &Url) -> String {
    if is_google_drive_file_url(url) {
        if let Some(id) = extract_file_id(url) {
            return file_download_url(&id);
        }
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_share_link_becomes_download_link() {
        let share = url("https://drive.google.com/file/d/1AbC-d_9/view?usp=sharing");
        assert!(is_google_drive_file_url(&share));
        assert_eq!(
            normalize(&share),
            "https://drive.google.com/uc?id=1AbC-d_9&export=download"
        );
    }

    #[test]
    fn test_download_link_is_kept() {
        let direct = url("https://drive.google.com/uc?id=XYZ&export=download");
        assert!(is_google_drive_file_url(&direct));
        assert_eq!(normalize(&direct), direct.to_string());
    }

    #[test]
    fn test_other_hosts_untouched() {
        let other = url("https://example.com/file/d/abc/view");
        assert!(!is_google_drive_file_url(&other));
        assert_eq!(normalize(&other), "https://example.com/file/d/abc/view");
    }

    #[test]
    fn test_drive_pages_without_a_file_are_untouched() {
        let folder = url("https://drive.google.com/drive/folders/abc");
        assert!(!is_google_drive_file_url(&folder));
        assert_eq!(normalize(&folder), folder.to_string());
    }
}
