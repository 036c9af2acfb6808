//! Path sandboxing
//!
//! Every workbook path a caller supplies goes through [`SandboxPolicy::resolve`]
//! before anything touches the filesystem. Resolution uses the canonical
//! filesystem path of the nearest existing ancestor, so a symlink inside the
//! root that points elsewhere cannot be used to escape it.

use std::path::{Component, Path, PathBuf};

use crate::error::{EngineError, Result};

/// Container extensions the engine reads and writes
pub const ALLOWED_EXTENSIONS: [&str; 2] = ["xlsx", "xlsm"];

/// Root directory and extension rules for workbook paths
#[derive(Debug, Clone)]
pub struct SandboxPolicy {
    root: PathBuf,
    allowed_extensions: &'static [&'static str],
}

impl SandboxPolicy {
    /// Build a policy rooted at `root`
    ///
    /// The root is canonicalized once here. It must exist and be a directory.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        let canonical = root.canonicalize().map_err(|e| {
            EngineError::Security(format!(
                "sandbox root '{}' is not accessible: {}",
                root.display(),
                e
            ))
        })?;
        if !canonical.is_dir() {
            return Err(EngineError::Security(format!(
                "sandbox root '{}' is not a directory",
                root.display()
            )));
        }
        Ok(Self {
            root: canonical,
            allowed_extensions: &ALLOWED_EXTENSIONS,
        })
    }

    /// The canonical root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn allowed_extensions(&self) -> &[&'static str] {
        self.allowed_extensions
    }

    /// Resolve a requested path to an absolute path inside the root
    ///
    /// Relative paths are taken relative to the root. The file itself does
    /// not have to exist.
    pub fn resolve(&self, requested: &str) -> Result<PathBuf> {
        let requested = requested.trim();
        if requested.is_empty() {
            return Err(EngineError::Security("path is empty".into()));
        }

        let input = Path::new(requested);
        let joined = if input.is_absolute() {
            input.to_path_buf()
        } else {
            self.root.join(input)
        };

        let resolved = canonicalize_lenient(&joined)?;
        if !resolved.starts_with(&self.root) {
            return Err(EngineError::Security(format!(
                "path escapes root: '{}' is outside '{}'",
                requested,
                self.root.display()
            )));
        }
        if resolved.is_dir() {
            return Err(EngineError::Security(format!(
                "path is a directory: '{}'",
                requested
            )));
        }
        self.check_extension(&resolved, requested)?;

        Ok(resolved)
    }

    /// Check that the directory `path` will be written into is still inside the root
    ///
    /// Run right before a save, after any parent directories were created.
    pub fn check_parent(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let canonical = parent.canonicalize().map_err(|e| {
            EngineError::Security(format!("cannot resolve '{}': {}", parent.display(), e))
        })?;
        if canonical.starts_with(&self.root) {
            Ok(())
        } else {
            Err(EngineError::Security(format!(
                "path escapes root: '{}' is outside '{}'",
                path.display(),
                self.root.display()
            )))
        }
    }

    fn check_extension(&self, path: &Path, requested: &str) -> Result<()> {
        let allowed = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.allowed_extensions
                    .iter()
                    .any(|allowed| ext.eq_ignore_ascii_case(allowed))
            });
        if allowed {
            Ok(())
        } else {
            Err(EngineError::Security(format!(
                "extension not allowed: '{}' (expected .{})",
                requested,
                self.allowed_extensions.join(" or .")
            )))
        }
    }
}

/// Resolve `path` one component at a time against the real filesystem
///
/// Every component that exists is canonicalized as soon as it is reached, so
/// symlinks are followed wherever they appear, including after a `..`. Only
/// components that do not exist yet are appended as plain names, and a `..`
/// only ever undoes such a name or steps to the canonical parent.
fn canonicalize_lenient(path: &Path) -> Result<PathBuf> {
    let mut resolved = PathBuf::new();
    // Trailing components of `resolved` that do not exist on disk
    let mut missing = 0usize;

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if missing > 0 {
                    missing -= 1;
                }
                resolved.pop();
            }
            Component::Normal(name) => {
                let candidate = resolved.join(name);
                // symlink_metadata so a dangling link counts as existing and
                // then fails to canonicalize instead of being written through
                if missing == 0 && std::fs::symlink_metadata(&candidate).is_ok() {
                    resolved = candidate.canonicalize().map_err(|e| {
                        EngineError::Security(format!(
                            "cannot resolve '{}': {}",
                            candidate.display(),
                            e
                        ))
                    })?;
                } else {
                    resolved = candidate;
                    missing += 1;
                }
            }
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn policy() -> (tempfile::TempDir, SandboxPolicy) {
        let dir = tempfile::tempdir().unwrap();
        let policy = SandboxPolicy::new(dir.path()).unwrap();
        (dir, policy)
    }

    #[test]
    fn test_relative_path_resolves_under_root() {
        let (_dir, policy) = policy();
        let resolved = policy.resolve("reports/q1.xlsx").unwrap();
        assert_eq!(resolved, policy.root().join("reports").join("q1.xlsx"));
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let (_dir, policy) = policy();
        assert!(policy.resolve("Book.XLSX").is_ok());
        assert!(policy.resolve("macros.XlSm").is_ok());
    }

    #[test]
    fn test_rejects_bad_extensions() {
        let (_dir, policy) = policy();
        for path in ["notes.txt", "book.xls", "book", "book.xlsx.bak"] {
            let err = policy.resolve(path).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Security, "{}", path);
            assert!(err.message().contains("extension not allowed"), "{}", path);
        }
    }

    #[test]
    fn test_rejects_empty_path() {
        let (_dir, policy) = policy();
        assert_eq!(policy.resolve("  ").unwrap_err().kind(), ErrorKind::Security);
    }

    #[test]
    fn test_rejects_traversal() {
        let (_dir, policy) = policy();
        for path in ["../outside.xlsx", "a/../../outside.xlsx", "./../../x.xlsm"] {
            let err = policy.resolve(path).unwrap_err();
            assert!(err.message().contains("escapes root"), "{}: {}", path, err);
        }
    }

    #[test]
    fn test_traversal_that_stays_inside_is_fine() {
        let (_dir, policy) = policy();
        let resolved = policy.resolve("a/b/../c.xlsx").unwrap();
        assert_eq!(resolved, policy.root().join("a").join("c.xlsx"));
    }

    #[test]
    fn test_absolute_paths() {
        let (_dir, policy) = policy();
        let inside = policy.root().join("inside.xlsx");
        assert!(policy.resolve(inside.to_str().unwrap()).is_ok());

        let other = tempfile::tempdir().unwrap();
        let outside = other.path().join("outside.xlsx");
        let err = policy.resolve(outside.to_str().unwrap()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Security);
    }

    #[test]
    fn test_rejects_directory() {
        let (dir, policy) = policy();
        std::fs::create_dir(dir.path().join("folder.xlsx")).unwrap();
        let err = policy.resolve("folder.xlsx").unwrap_err();
        assert!(err.message().contains("path is a directory"));
    }

    #[test]
    fn test_root_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = SandboxPolicy::new(&missing).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Security);

        let file = dir.path().join("file.txt");
        std::fs::write(&file, b"x").unwrap();
        assert_eq!(
            SandboxPolicy::new(&file).unwrap_err().kind(),
            ErrorKind::Security
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_rejects_symlink_escape() {
        let (dir, policy) = policy();
        let outside = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();

        let err = policy.resolve("link/book.xlsx").unwrap_err();
        assert!(err.message().contains("escapes root"));
    }

    #[cfg(unix)]
    #[test]
    fn test_rejects_symlink_escape_after_missing_parent() {
        let (dir, policy) = policy();
        let outside = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();

        for path in [
            "missing/../link/book.xlsx",
            "a/b/../../link/book.xlsx",
            "./missing/./../link/sub/book.xlsm",
        ] {
            let err = policy.resolve(path).unwrap_err();
            assert!(err.message().contains("escapes root"), "{}: {}", path, err);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_inside_root_is_followed() {
        let (dir, policy) = policy();
        std::fs::create_dir(dir.path().join("real")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("alias")).unwrap();

        let resolved = policy.resolve("missing/../alias/book.xlsx").unwrap();
        assert_eq!(resolved, policy.root().join("real").join("book.xlsx"));
    }

    #[cfg(unix)]
    #[test]
    fn test_check_parent_rejects_escaped_directory() {
        let (dir, policy) = policy();
        let outside = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();

        assert!(policy.check_parent(&policy.root().join("book.xlsx")).is_ok());
        let err = policy
            .check_parent(&policy.root().join("link").join("book.xlsx"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Security);
    }

    #[cfg(unix)]
    #[test]
    fn test_rejects_dangling_symlink_file() {
        let (dir, policy) = policy();
        let outside = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("target.xlsx"),
            dir.path().join("book.xlsx"),
        )
        .unwrap();

        let err = policy.resolve("book.xlsx").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Security);
    }
}
