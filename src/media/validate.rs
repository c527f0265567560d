use serde::Serialize;
use std::path::Path;

use super::{extension_allowed, MAX_IMAGE_BYTES};

/// Structured pass/fail report for a single referenced filename.
#[derive(Debug, Serialize)]
pub struct FileCheck {
    pub filename: String,
    pub exists: bool,
    /// "uploads" or "assets" when the file was found.
    pub location: Option<&'static str>,
    pub size_ok: bool,
    pub extension_ok: bool,
    pub is_valid: bool,
    pub reason: Option<String>,
}

impl FileCheck {
    fn invalid(filename: &str, reason: String) -> Self {
        Self {
            filename: filename.to_string(),
            exists: false,
            location: None,
            size_ok: false,
            extension_ok: extension_allowed(filename),
            is_valid: false,
            reason: Some(reason),
        }
    }
}

/// Checks a filename against the uploads directory, falling back to the
/// assets backup directory. Never touches the database.
pub fn validate_filename(uploads_dir: &Path, assets_dir: &Path, filename: &str) -> FileCheck {
    // Stored references are bare filenames; anything path-like is suspect.
    if filename.contains('/') || filename.contains("..") {
        return FileCheck::invalid(filename, "filename contains path components".to_string());
    }

    let candidates = [
        ("uploads", uploads_dir.join(filename)),
        ("assets", assets_dir.join(filename)),
    ];
    let found = candidates
        .iter()
        .find_map(|(loc, path)| std::fs::metadata(path).ok().map(|m| (*loc, m)));

    let (exists, location, size) = match found {
        Some((loc, meta)) if meta.is_file() => (true, Some(loc), meta.len()),
        _ => (false, None, 0),
    };

    let extension_ok = extension_allowed(filename);
    let size_ok = exists && size > 0 && size <= MAX_IMAGE_BYTES;

    let reason = if !exists {
        Some("file not found in uploads or assets".to_string())
    } else if !extension_ok {
        Some("extension is not an allowed image type".to_string())
    } else if size == 0 {
        Some("file is empty".to_string())
    } else if size > MAX_IMAGE_BYTES {
        Some(format!("file is {} bytes, over the {} byte limit", size, MAX_IMAGE_BYTES))
    } else {
        None
    };

    FileCheck {
        filename: filename.to_string(),
        exists,
        location,
        size_ok,
        extension_ok,
        is_valid: exists && size_ok && extension_ok,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_everywhere_is_invalid_with_exists_false() {
        let uploads = tempdir().unwrap();
        let assets = tempdir().unwrap();
        let check = validate_filename(uploads.path(), assets.path(), "ghost.jpg");
        assert!(!check.is_valid);
        assert!(!check.exists);
        assert_eq!(check.location, None);
        assert!(check.reason.unwrap().contains("not found"));
    }

    #[test]
    fn file_in_uploads_is_valid() {
        let uploads = tempdir().unwrap();
        let assets = tempdir().unwrap();
        std::fs::write(uploads.path().join("front.jpg"), b"jpeg bytes").unwrap();
        let check = validate_filename(uploads.path(), assets.path(), "front.jpg");
        assert!(check.is_valid);
        assert_eq!(check.location, Some("uploads"));
        assert!(check.reason.is_none());
    }

    #[test]
    fn file_only_in_assets_reports_assets_location() {
        let uploads = tempdir().unwrap();
        let assets = tempdir().unwrap();
        std::fs::write(assets.path().join("back.png"), b"png bytes").unwrap();
        let check = validate_filename(uploads.path(), assets.path(), "back.png");
        assert!(check.is_valid);
        assert_eq!(check.location, Some("assets"));
    }

    #[test]
    fn empty_file_is_invalid() {
        let uploads = tempdir().unwrap();
        let assets = tempdir().unwrap();
        std::fs::write(uploads.path().join("zero.jpg"), b"").unwrap();
        let check = validate_filename(uploads.path(), assets.path(), "zero.jpg");
        assert!(check.exists);
        assert!(!check.size_ok);
        assert!(!check.is_valid);
    }

    #[test]
    fn wrong_extension_is_invalid_even_when_present() {
        let uploads = tempdir().unwrap();
        let assets = tempdir().unwrap();
        std::fs::write(uploads.path().join("notes.txt"), b"hello").unwrap();
        let check = validate_filename(uploads.path(), assets.path(), "notes.txt");
        assert!(check.exists);
        assert!(!check.extension_ok);
        assert!(!check.is_valid);
    }

    #[test]
    fn path_components_are_rejected() {
        let uploads = tempdir().unwrap();
        let assets = tempdir().unwrap();
        let check = validate_filename(uploads.path(), assets.path(), "../etc/passwd");
        assert!(!check.is_valid);
        assert!(!check.exists);
    }
}
