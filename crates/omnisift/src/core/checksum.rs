//! Content checksums and file identifiers.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Bytes of the path digest kept in a file id.
const FILE_ID_BYTES: usize = 16;

/// SHA-256 of `content`, hex encoded.
pub fn content_checksum(content: &[u8]) -> String {
    hex::encode(Sha256::digest(content))
}

/// Deterministic identifier for a file location.
///
/// The first 16 bytes of the SHA-256 of the absolute path, hex encoded. Only
/// the path is hashed, so a file keeps its id when its content changes.
pub fn file_id(path: &Path) -> String {
    let absolute = absolute_path(path);
    let digest = Sha256::digest(absolute.to_string_lossy().as_bytes());
    hex::encode(&digest[..FILE_ID_BYTES])
}

/// Absolute form of `path` without touching the filesystem beyond the
/// current directory lookup. Falls back to the path as given.
pub fn absolute_path(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_checksum_known_value() {
        assert_eq!(
            content_checksum(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(content_checksum(b"abc"), content_checksum(b"abc"));
        assert_ne!(content_checksum(b"abc"), content_checksum(b"abd"));
    }

    #[test]
    fn test_file_id_is_stable_and_short() {
        let a = file_id(Path::new("/data/inbox/report.pdf"));
        let b = file_id(Path::new("/data/inbox/report.pdf"));
        assert_eq!(a, b);
        assert_eq!(a.len(), FILE_ID_BYTES * 2);
        assert_ne!(a, file_id(Path::new("/data/inbox/other.pdf")));
    }

    #[test]
    fn test_relative_and_absolute_paths_agree() {
        let cwd = std::env::current_dir().unwrap();
        let relative = Path::new("some/file.txt");
        assert_eq!(file_id(relative), file_id(&cwd.join(relative)));
    }
}
