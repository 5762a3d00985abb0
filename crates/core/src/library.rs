//! Music library filesystem access.
//!
//! A [`MusicLibrary`] is rooted at a single directory (`MUSIC_ROOT`). Every
//! download lands in a direct sub-folder of that root; the folder is created
//! up front so it exists as soon as a job is accepted.

use std::path::{Component, Path, PathBuf};

use crate::error::CoreError;

/// Handle to the music library root directory.
#[derive(Debug, Clone)]
pub struct MusicLibrary {
    root: PathBuf,
}

impl MusicLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the root directory currently exists.
    pub async fn root_exists(&self) -> bool {
        tokio::fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    /// List the names of all direct sub-directories of the root, sorted
    /// case-insensitively.
    pub async fn list_folders(&self) -> Result<Vec<String>, CoreError> {
        if !self.root_exists().await {
            return Err(CoreError::Internal("MUSIC_ROOT missing".to_string()));
        }

        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(|e| {
            tracing::error!(error = %e, root = %self.root.display(), "Failed to read music root");
            CoreError::Internal("Failed to list folders".to_string())
        })?;

        let mut folders = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read music root entry");
                    return Err(CoreError::Internal("Failed to list folders".to_string()));
                }
            };
            let is_dir = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            if is_dir {
                folders.push(entry.file_name().to_string_lossy().into_owned());
            }
        }

        folders.sort_by(|a, b| {
            a.to_lowercase()
                .cmp(&b.to_lowercase())
                .then_with(|| a.cmp(b))
        });
        Ok(folders)
    }

    /// Resolve `folder` under the root, rejecting anything that escapes it.
    pub fn resolve_folder(&self, folder: &str) -> Result<PathBuf, CoreError> {
        let target = self.root.join(folder);
        if is_inside_root(&self.root, &target) {
            Ok(target)
        } else {
            Err(CoreError::Validation("Folder outside root".to_string()))
        }
    }

    /// Make sure `folder` exists under the root, creating it if needed.
    ///
    /// `folder` is expected to be sanitised already; see
    /// [`crate::validation::validate_folder_name`].
    pub async fn ensure_folder(&self, folder: &str) -> Result<PathBuf, CoreError> {
        if !self.root_exists().await {
            return Err(CoreError::Internal("MUSIC_ROOT missing".to_string()));
        }

        let target = self.resolve_folder(folder)?;
        tokio::fs::create_dir_all(&target).await.map_err(|e| {
            tracing::error!(error = %e, path = %target.display(), "Failed to create folder");
            CoreError::Internal("Failed to create folder".to_string())
        })?;
        Ok(target)
    }
}

/// Lexically normalise `path`, resolving `.` and `..` without touching the
/// filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Returns `true` if `target` is `root` itself or lies beneath it.
pub fn is_inside_root(root: &Path, target: &Path) -> bool {
    normalize(target).starts_with(normalize(root))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
