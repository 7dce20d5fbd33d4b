use crate::error::{Result, SweepError};
use std::path::{Path, PathBuf};

/// Pseudo and system trees a sweep must never walk or run `git` in.
const SYSTEM_ROOTS: &[&str] = &["/etc", "/sys", "/proc", "/dev", "/boot"];

/// Checks directories before they are scanned or handed to `git`.
pub struct PathValidator;

impl PathValidator {
    /// Canonicalise `path` and make sure it is a directory outside the
    /// system trees. Both the path as given and its resolved form are
    /// checked, so a symlink cannot smuggle a scan into `/proc`.
    pub fn validate_directory(path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();

        let canonical = path.canonicalize().map_err(|e| {
            SweepError::ProjectValidation(format!("Cannot open '{}': {e}", path.display()))
        })?;

        if !canonical.is_dir() {
            return Err(SweepError::ProjectValidation(format!(
                "'{}' is not a directory",
                canonical.display()
            )));
        }

        if let Some(system_root) = Self::system_root_of(path, &canonical) {
            return Err(SweepError::ProjectValidation(format!(
                "Refusing to sweep system directory '{system_root}'"
            )));
        }

        Ok(canonical)
    }

    fn system_root_of(given: &Path, canonical: &Path) -> Option<&'static str> {
        SYSTEM_ROOTS.iter().copied().find(|root| {
            let root_path = Path::new(root);
            given.starts_with(root_path)
                || canonical.starts_with(root_path)
                || root_path
                    .canonicalize()
                    .is_ok_and(|resolved| canonical.starts_with(resolved))
        })
    }
}
