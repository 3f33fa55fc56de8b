use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Ensures a directory exists, creating it and all parent directories if necessary.
///
/// Returns `true` when the directory had to be created.
pub async fn ensure_directory<P: AsRef<Path>>(path: P) -> io::Result<bool> {
    let path = path.as_ref();
    if fs::metadata(path).await.is_ok_and(|m| m.is_dir()) {
        return Ok(false);
    }
    fs::create_dir_all(path).await?;
    log::debug!("Created directory: {path:?}");
    Ok(true)
}

/// Path of the temporary file a download is streamed into before it is renamed.
pub fn part_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    destination.with_file_name(name)
}

/// Removes a file if it exists, ignoring a missing file.
pub async fn remove_file_if_exists<P: AsRef<Path>>(path: P) -> io::Result<()> {
    let path = path.as_ref();
    match fs::remove_file(path).await {
        Ok(()) => {
            log::debug!("Removed file: {path:?}");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Absolute form of `path`, falling back to the path itself when it cannot be resolved.
pub fn absolute_display(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ensure_directory_creates_nested_and_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b").join("lib");

        assert!(ensure_directory(&nested).await.unwrap());
        assert!(nested.is_dir());

        std::fs::write(nested.join("keep.js"), b"x").unwrap();
        assert!(!ensure_directory(&nested).await.unwrap());
        assert!(nested.join("keep.js").exists());
    }

    #[tokio::test]
    async fn ensure_directory_fails_when_a_file_is_in_the_way() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("lib");
        std::fs::write(&blocker, b"not a dir").unwrap();

        assert!(ensure_directory(blocker.join("inner")).await.is_err());
    }

    #[test]
    fn part_path_appends_suffix() {
        let p = part_path(Path::new("lib/ffmpeg-core.wasm"));
        assert_eq!(p, Path::new("lib/ffmpeg-core.wasm.part"));
    }

    #[tokio::test]
    async fn remove_missing_file_is_ok() {
        let tmp = tempfile::tempdir().unwrap();
        remove_file_if_exists(tmp.path().join("nope")).await.unwrap();
    }
}
