//! File stores - where task files come from and where edits go
//!
//! [`FileStore`] is the seam between the task engine and the host's files.
//! Two implementations ship here:
//! - [`FsVault`]: a directory on disk (paired with [`crate::WatcherTask`] for
//!   change notifications)
//! - [`MemoryVault`]: an in-memory vault that reports its own changes to an
//!   attached index, used by tests and embedders

use std::{
  collections::{BTreeMap, HashSet},
  path::{Component, Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use async_trait::async_trait;
use taskdeck_core::FileHandle;
use tokio::sync::RwLock;
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

use crate::actor::IndexHandle;

// ============================================================================
// Events + Errors
// ============================================================================

/// A change notification for one vault file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultEvent {
  Created(FileHandle),
  Modified(FileHandle),
  Deleted(FileHandle),
  /// Folder renames are reported the same way; any rename triggers a rebuild
  Renamed { from: FileHandle, to: FileHandle },
}

impl VaultEvent {
  /// The file this event is about (the new location for renames)
  pub fn file(&self) -> &FileHandle {
    match self {
      Self::Created(file) | Self::Modified(file) | Self::Deleted(file) => file,
      Self::Renamed { to, .. } => to,
    }
  }
}

/// Errors raised by a file store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error("File not found: {0}")]
  NotFound(String),

  #[error("Invalid path: {0}")]
  InvalidPath(String),

  #[error("IO error on {path}: {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("Background task failed: {0}")]
  Background(String),
}

// ============================================================================
// FileStore
// ============================================================================

/// Access to the vault's markdown files
#[async_trait]
pub trait FileStore: Send + Sync {
  /// Enumerate every markdown file in the vault
  async fn markdown_files(&self) -> Result<Vec<FileHandle>, StoreError>;

  /// Read a file's full content
  async fn read(&self, file: &FileHandle) -> Result<String, StoreError>;

  /// Replace a file's content
  async fn write(&self, file: &FileHandle, content: &str) -> Result<(), StoreError>;
}

/// Whether a path names a markdown file
pub fn is_markdown(path: &Path) -> bool {
  path
    .extension()
    .and_then(|ext| ext.to_str())
    .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

/// Whether any component below the root is hidden (`.obsidian`, `.git`, ...)
fn has_hidden_component(relative: &Path) -> bool {
  relative
    .components()
    .any(|c| matches!(c, Component::Normal(name) if name.to_string_lossy().starts_with('.')))
}

/// Convert an absolute path under `root` into a vault-relative handle.
///
/// Returns `None` for paths outside the root or inside hidden folders.
pub fn relative_handle(root: &Path, path: &Path) -> Option<FileHandle> {
  let relative = path.strip_prefix(root).ok()?;
  if relative.as_os_str().is_empty() || has_hidden_component(relative) {
    return None;
  }

  let mut parts = Vec::new();
  for component in relative.components() {
    match component {
      Component::Normal(name) => parts.push(name.to_string_lossy().into_owned()),
      _ => return None,
    }
  }
  Some(FileHandle::new(parts.join("/")))
}

// ============================================================================
// FsVault
// ============================================================================

/// A vault backed by a directory on disk
#[derive(Debug, Clone)]
pub struct FsVault {
  root: PathBuf,
}

impl FsVault {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Absolute path for a handle, rejecting anything that escapes the root
  pub fn absolute_path(&self, file: &FileHandle) -> Result<PathBuf, StoreError> {
    let relative = Path::new(&file.path);
    let safe = relative.components().all(|c| matches!(c, Component::Normal(_)));
    if !safe || file.path.is_empty() {
      return Err(StoreError::InvalidPath(file.path.clone()));
    }
    Ok(self.root.join(relative))
  }

  fn scan(root: &Path) -> Vec<FileHandle> {
    let mut files: Vec<FileHandle> = WalkDir::new(root)
      .follow_links(false)
      .into_iter()
      .filter_entry(|entry| {
        entry.depth() == 0
          || !entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
      })
      .filter_map(|entry| match entry {
        Ok(entry) => Some(entry),
        Err(e) => {
          warn!(error = %e, "Skipping unreadable vault entry");
          None
        }
      })
      .filter(|entry| entry.file_type().is_file() && is_markdown(entry.path()))
      .filter_map(|entry| relative_handle(root, entry.path()))
      .collect();

    files.sort();
    files
  }
}

#[async_trait]
impl FileStore for FsVault {
  async fn markdown_files(&self) -> Result<Vec<FileHandle>, StoreError> {
    let root = self.root.clone();
    let files = tokio::task::spawn_blocking(move || Self::scan(&root))
      .await
      .map_err(|e| StoreError::Background(e.to_string()))?;
    debug!(root = %self.root.display(), files = files.len(), "Scanned vault");
    Ok(files)
  }

  async fn read(&self, file: &FileHandle) -> Result<String, StoreError> {
    let path = self.absolute_path(file)?;
    tokio::fs::read_to_string(&path).await.map_err(|source| {
      if source.kind() == std::io::ErrorKind::NotFound {
        StoreError::NotFound(file.path.clone())
      } else {
        StoreError::Io {
          path: file.path.clone(),
          source,
        }
      }
    })
  }

  async fn write(&self, file: &FileHandle, content: &str) -> Result<(), StoreError> {
    let path = self.absolute_path(file)?;
    trace!(file = %file, bytes = content.len(), "Writing file");
    tokio::fs::write(&path, content).await.map_err(|source| StoreError::Io {
      path: file.path.clone(),
      source,
    })
  }
}

// ============================================================================
// MemoryVault
// ============================================================================

#[derive(Default)]
struct MemoryState {
  files: BTreeMap<String, String>,
  unreadable: HashSet<String>,
  read_delays: BTreeMap<String, Duration>,
  listener: Option<IndexHandle>,
}

/// An in-memory vault.
///
/// Every mutation is reported to the attached index as a [`VaultEvent`],
/// the same way a file watcher would report changes on disk.
#[derive(Clone, Default)]
pub struct MemoryVault {
  state: Arc<RwLock<MemoryState>>,
}

impl MemoryVault {
  pub fn new() -> Self {
    Self::default()
  }

  /// Build a vault pre-populated with files (no events are emitted)
  pub fn from_files<I, P, C>(files: I) -> Self
  where
    I: IntoIterator<Item = (P, C)>,
    P: Into<String>,
    C: Into<String>,
  {
    let state = MemoryState {
      files: files.into_iter().map(|(p, c)| (p.into(), c.into())).collect(),
      ..Default::default()
    };
    Self {
      state: Arc::new(RwLock::new(state)),
    }
  }

  /// Report subsequent changes to this index
  pub async fn attach(&self, handle: IndexHandle) {
    self.state.write().await.listener = Some(handle);
  }

  /// Create or overwrite a file, emitting `Created` or `Modified`
  pub async fn put(&self, path: &str, content: impl Into<String>) {
    let mut state = self.state.write().await;
    let existed = state.files.insert(path.to_string(), content.into()).is_some();
    let file = FileHandle::new(path);
    let event = if existed {
      VaultEvent::Modified(file)
    } else {
      VaultEvent::Created(file)
    };
    Self::emit(&state, event);
  }

  /// Remove a file, emitting `Deleted`
  pub async fn remove(&self, path: &str) -> bool {
    let mut state = self.state.write().await;
    let existed = state.files.remove(path).is_some();
    if existed {
      Self::emit(&state, VaultEvent::Deleted(FileHandle::new(path)));
    }
    existed
  }

  /// Move a file, emitting `Renamed`
  pub async fn rename(&self, from: &str, to: &str) -> Result<(), StoreError> {
    let mut state = self.state.write().await;
    let content = state
      .files
      .remove(from)
      .ok_or_else(|| StoreError::NotFound(from.to_string()))?;
    state.files.insert(to.to_string(), content);
    Self::emit(
      &state,
      VaultEvent::Renamed {
        from: FileHandle::new(from),
        to: FileHandle::new(to),
      },
    );
    Ok(())
  }

  /// Current content of a file
  pub async fn content(&self, path: &str) -> Option<String> {
    self.state.read().await.files.get(path).cloned()
  }

  /// Make reads of a file fail until cleared
  pub async fn set_unreadable(&self, path: &str, unreadable: bool) {
    let mut state = self.state.write().await;
    if unreadable {
      state.unreadable.insert(path.to_string());
    } else {
      state.unreadable.remove(path);
    }
  }

  /// Delay completion of reads of a file (the content is captured first)
  pub async fn set_read_delay(&self, path: &str, delay: Option<Duration>) {
    let mut state = self.state.write().await;
    match delay {
      Some(delay) => state.read_delays.insert(path.to_string(), delay),
      None => state.read_delays.remove(path),
    };
  }

  fn emit(state: &MemoryState, event: VaultEvent) {
    if let Some(listener) = &state.listener
      && let Err(e) = listener.notify(event)
    {
      warn!(error = %e, "Failed to deliver vault event");
    }
  }
}

#[async_trait]
impl FileStore for MemoryVault {
  async fn markdown_files(&self) -> Result<Vec<FileHandle>, StoreError> {
    let state = self.state.read().await;
    Ok(
      state
        .files
        .keys()
        .filter(|path| is_markdown(Path::new(path)))
        .map(FileHandle::new)
        .collect(),
    )
  }

  async fn read(&self, file: &FileHandle) -> Result<String, StoreError> {
    let (content, delay) = {
      let state = self.state.read().await;
      if state.unreadable.contains(&file.path) {
        return Err(StoreError::Io {
          path: file.path.clone(),
          source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "unreadable"),
        });
      }
      let content = state
        .files
        .get(&file.path)
        .cloned()
        .ok_or_else(|| StoreError::NotFound(file.path.clone()))?;
      (content, state.read_delays.get(&file.path).copied())
    };

    if let Some(delay) = delay {
      tokio::time::sleep(delay).await;
    }
    Ok(content)
  }

  async fn write(&self, file: &FileHandle, content: &str) -> Result<(), StoreError> {
    self.put(&file.path, content).await;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn test_relative_handle() {
    let root = Path::new("/vault");
    assert_eq!(
      relative_handle(root, Path::new("/vault/a/b.md")),
      Some(FileHandle::new("a/b.md"))
    );
    assert_eq!(relative_handle(root, Path::new("/vault/top.md")), Some(FileHandle::new("top.md")));
    assert_eq!(relative_handle(root, Path::new("/vault/.obsidian/x.md")), None);
    assert_eq!(relative_handle(root, Path::new("/elsewhere/x.md")), None);
    assert_eq!(relative_handle(root, Path::new("/vault")), None);
  }

  #[test]
  fn test_absolute_path_rejects_escape() {
    let vault = FsVault::new("/vault");
    assert!(vault.absolute_path(&FileHandle::new("a/b.md")).is_ok());
    assert!(vault.absolute_path(&FileHandle::new("../etc/passwd")).is_err());
    assert!(vault.absolute_path(&FileHandle::new("/abs.md")).is_err());
  }

  #[tokio::test]
  async fn test_fs_vault_lists_markdown_only() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("notes/deep")).unwrap();
    std::fs::create_dir_all(dir.path().join(".obsidian")).unwrap();
    std::fs::write(dir.path().join("root.md"), "- [ ] a").unwrap();
    std::fs::write(dir.path().join("notes/deep/b.md"), "- [ ] b").unwrap();
    std::fs::write(dir.path().join("notes/image.png"), "png").unwrap();
    std::fs::write(dir.path().join(".obsidian/workspace.md"), "hidden").unwrap();

    let vault = FsVault::new(dir.path());
    let files = vault.markdown_files().await.unwrap();
    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["notes/deep/b.md", "root.md"]);
    assert_eq!(files[0].parent.as_deref(), Some("notes/deep"));
  }

  #[tokio::test]
  async fn test_fs_vault_read_write() {
    let dir = TempDir::new().unwrap();
    let vault = FsVault::new(dir.path());
    let file = FileHandle::new("todo.md");

    assert!(matches!(vault.read(&file).await, Err(StoreError::NotFound(_))));

    vault.write(&file, "- [ ] write tests\n").await.unwrap();
    assert_eq!(vault.read(&file).await.unwrap(), "- [ ] write tests\n");
  }

  #[tokio::test]
  async fn test_memory_vault_basics() {
    let vault = MemoryVault::from_files([("a.md", "one"), ("b.txt", "two")]);
    let files = vault.markdown_files().await.unwrap();
    assert_eq!(files, vec![FileHandle::new("a.md")]);

    vault.set_unreadable("a.md", true).await;
    assert!(vault.read(&FileHandle::new("a.md")).await.is_err());
    vault.set_unreadable("a.md", false).await;
    assert_eq!(vault.read(&FileHandle::new("a.md")).await.unwrap(), "one");

    vault.rename("a.md", "c.md").await.unwrap();
    assert_eq!(vault.content("c.md").await.as_deref(), Some("one"));
    assert!(vault.rename("a.md", "d.md").await.is_err());
    assert!(vault.remove("c.md").await);
    assert!(!vault.remove("c.md").await);
  }
}
