//! Filesystem helpers shared by the fetchers, the external cache, and the
//! vendor store.

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::Result;

/// Recursively copies the tree under `src` into `dst`.
///
/// `dst` is created if absent. Symlinks inside the tree are not followed;
/// they are recreated as links pointing at their original targets, so a
/// copied repository keeps its internal layout.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)?;
    for entry in WalkDir::new(src).follow_links(false).min_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .expect("walkdir yields paths under its root");
        let target = dst.join(relative);
        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            let link_target = fs::read_link(entry.path())?;
            recreate_symlink(&link_target, &target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Removes `path` if it exists, whether it is a directory, file, or dangling
/// symlink.
pub fn remove_existing(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(metadata) => {
            if metadata.is_dir() {
                fs::remove_dir_all(path)?;
            } else {
                fs::remove_file(path)?;
            }
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(unix)]
fn recreate_symlink(link_target: &Path, at: &Path) -> Result<()> {
    std::os::unix::fs::symlink(link_target, at)?;
    Ok(())
}

#[cfg(windows)]
fn recreate_symlink(link_target: &Path, at: &Path) -> Result<()> {
    if link_target.is_dir() {
        std::os::windows::fs::symlink_dir(link_target, at)?;
    } else {
        std::os::windows::fs::symlink_file(link_target, at)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_tree_copies_nested_files() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::create_dir_all(src.path().join("a/b")).unwrap();
        fs::write(src.path().join("top.txt"), b"top").unwrap();
        fs::write(src.path().join("a/b/deep.txt"), b"deep").unwrap();

        let out = dst.path().join("copy");
        copy_tree(src.path(), &out).unwrap();

        assert_eq!(fs::read_to_string(out.join("top.txt")).unwrap(), "top");
        assert_eq!(fs::read_to_string(out.join("a/b/deep.txt")).unwrap(), "deep");
    }

    #[test]
    fn test_copy_tree_empty_source() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let out = dst.path().join("copy");
        copy_tree(src.path(), &out).unwrap();
        assert!(out.is_dir());
        assert_eq!(fs::read_dir(&out).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_tree_preserves_symlinks() {
        let src = TempDir::new().unwrap();
        fs::write(src.path().join("real.txt"), b"real").unwrap();
        std::os::unix::fs::symlink("real.txt", src.path().join("link.txt")).unwrap();

        let dst = TempDir::new().unwrap();
        let out = dst.path().join("copy");
        copy_tree(src.path(), &out).unwrap();

        let copied = out.join("link.txt");
        assert!(fs::symlink_metadata(&copied).unwrap().is_symlink());
        assert_eq!(fs::read_link(&copied).unwrap().to_str(), Some("real.txt"));
    }

    #[test]
    fn test_remove_existing_directory_and_missing() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("victim");
        fs::create_dir_all(target.join("inner")).unwrap();
        remove_existing(&target).unwrap();
        assert!(!target.exists());
        // Removing again is a no-op
        remove_existing(&target).unwrap();
    }

    #[test]
    fn test_remove_existing_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("file.txt");
        fs::write(&target, b"x").unwrap();
        remove_existing(&target).unwrap();
        assert!(!target.exists());
    }
}
