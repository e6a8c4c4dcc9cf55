//! Containment checks for client-supplied storage paths.
//!
//! Paths are compared segment by segment after normalization, never by string
//! prefix, so `/var/test2` is not inside `/var/test`.

use std::path::{Component, Path, PathBuf};

use crate::errors::{DapError, DapResult};

/// True when `candidate` is `parent` or lies below it.
///
/// Both paths are made absolute, normalized (`.` and `..` removed) and, when
/// they exist, resolved through symlinks before comparison.
pub fn is_subdirectory(candidate: impl AsRef<Path>, parent: impl AsRef<Path>) -> bool {
    let candidate = normalized_segments(candidate.as_ref());
    let parent = normalized_segments(parent.as_ref());

    if parent.len() > candidate.len() {
        return false;
    }
    candidate.iter().zip(&parent).all(|(a, b)| a == b)
}

/// Join `relative` onto `root` and return the result if it stays inside
/// `root`. Fails closed with `AccessDenied` otherwise.
pub fn resolve_within(root: impl AsRef<Path>, relative: &str) -> DapResult<PathBuf> {
    let root = root.as_ref();
    let joined = root.join(relative.trim_start_matches('/'));
    let resolved = normalize(&joined);

    if !is_subdirectory(&resolved, root) {
        tracing::warn!("Rejected object id outside data root: {:?}", relative);
        return Err(DapError::AccessDenied(relative.to_string()));
    }
    Ok(resolved)
}

/// Absolute, lexically normalized, symlink-resolved form of `path`.
pub fn normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    resolve_symlinks(&lexical_normalize(&absolute))
}

/// Canonicalize the longest existing ancestor of `path` and re-append the
/// rest, so paths that do not exist yet still see symlinks above them.
fn resolve_symlinks(path: &Path) -> PathBuf {
    let mut existing = path.to_path_buf();
    let mut rest = Vec::new();
    loop {
        if let Ok(mut resolved) = std::fs::canonicalize(&existing) {
            for part in rest.iter().rev() {
                resolved.push(part);
            }
            return resolved;
        }
        match (existing.file_name().map(|n| n.to_os_string()), existing.parent()) {
            (Some(name), Some(parent)) => {
                rest.push(name);
                existing = parent.to_path_buf();
            }
            _ => return path.to_path_buf(),
        }
    }
}

fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Never climb above the root.
                if !matches!(out.components().next_back(), Some(Component::RootDir) | None) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn normalized_segments(path: &Path) -> Vec<String> {
    normalize(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_subdirectory_absolute() {
        assert!(is_subdirectory("/var/test/sub", "/var/test"));
        assert!(!is_subdirectory("/var/test2", "/var/test"));
        assert!(is_subdirectory("/var/test", "/var/test"));
        assert!(!is_subdirectory("/var/test", "/var/test/sub"));
        assert!(!is_subdirectory("/var/test", "/var/test2"));
    }

    #[test]
    fn test_is_subdirectory_relative() {
        assert!(!is_subdirectory("var/test2", "var/test"));
        assert!(is_subdirectory("var/test/sub", "var/test"));
        assert!(is_subdirectory("var/test", "var/test"));
        assert!(!is_subdirectory("var/test", "var/test/sub"));
    }

    #[test]
    fn test_is_subdirectory_dot_segments() {
        assert!(is_subdirectory("var/test", "var/test/fake_sub/.."));
        assert!(is_subdirectory("var/test/sub/sub2/sub3/../..", "var/test"));
        assert!(is_subdirectory("var/test/sub", "var/test/fake_sub/.."));
        assert!(!is_subdirectory("/var/test/../test2", "/var/test"));
    }

    #[test]
    fn test_parent_dir_at_root() {
        assert_eq!(lexical_normalize(Path::new("/../etc")), PathBuf::from("/etc"));
    }

    #[test]
    fn test_resolve_within_rejects_traversal() {
        let root = tempfile::tempdir().unwrap();
        assert!(matches!(
            resolve_within(root.path(), "../etc/passwd"),
            Err(DapError::AccessDenied(_))
        ));
        assert!(matches!(
            resolve_within(root.path(), "a/../../outside"),
            Err(DapError::AccessDenied(_))
        ));
    }

    #[test]
    fn test_resolve_within_accepts_nested() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("model/run")).unwrap();
        let resolved = resolve_within(root.path(), "/model/run").unwrap();
        assert!(resolved.ends_with("model/run"));
        assert!(is_subdirectory(&resolved, root.path()));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_escape_rejected() {
        let root = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), root.path().join("link")).unwrap();
        assert!(matches!(
            resolve_within(root.path(), "link"),
            Err(DapError::AccessDenied(_))
        ));
    }
}
