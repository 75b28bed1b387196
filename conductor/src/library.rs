//! Score files under a configured root directory.
//!
//! Names are relative to the root; anything that would resolve outside it
//! (absolute paths, `..` escapes, symlinks pointing elsewhere) is rejected.

use std::path::{Component, Path, PathBuf};

use tokio::fs;

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("invalid score name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },
    #[error("score '{0}' not found")]
    NotFound(String),
    #[error("score library unavailable: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct ScoreLibrary {
    root: PathBuf,
}

impl ScoreLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `name` to an existing regular file below the root.
    pub async fn resolve(&self, name: &str) -> Result<PathBuf, LibraryError> {
        let invalid = |reason| LibraryError::InvalidName {
            name: name.to_string(),
            reason,
        };

        if name.trim().is_empty() {
            return Err(invalid("name is empty"));
        }
        if name.contains('\0') {
            return Err(invalid("name contains null bytes"));
        }
        if name.starts_with('/') || Path::new(name).is_absolute() {
            return Err(invalid("absolute paths are not allowed"));
        }

        let mut normalized = PathBuf::new();
        for comp in Path::new(name).components() {
            match comp {
                Component::Normal(s) => normalized.push(s),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !normalized.pop() {
                        return Err(invalid("path escapes the score directory"));
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(invalid("path contains invalid components"));
                }
            }
        }
        if normalized.as_os_str().is_empty() {
            return Err(invalid("name does not point at a file"));
        }

        let full_path = self.root.join(&normalized);
        let canonical = match fs::canonicalize(&full_path).await {
            Ok(p) => p,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LibraryError::NotFound(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        // Symlinks are followed by canonicalize; re-check containment.
        let root = fs::canonicalize(&self.root).await?;
        if !canonical.starts_with(&root) {
            return Err(invalid("path escapes the score directory"));
        }

        let metadata = fs::metadata(&canonical).await?;
        if !metadata.is_file() {
            return Err(LibraryError::NotFound(name.to_string()));
        }
        Ok(canonical)
    }

    pub async fn read(&self, name: &str) -> Result<Vec<u8>, LibraryError> {
        let path = self.resolve(name).await?;
        tracing::debug!(name, path = %path.display(), "reading score");
        Ok(fs::read(&path).await?)
    }
}
