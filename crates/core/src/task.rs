//! Task domain types
//!
//! A [`Task`] is one markdown task line (`- [ ] ...`) found in a vault file.
//! Its [`Metadata`] carries what is needed to write the line back.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt;

/// Characters marking a task as done when none are configured
pub const DEFAULT_DONE_STATUS_MARKERS: &str = "xX";

/// Characters marking a task line as ignored when none are configured
pub const DEFAULT_IGNORED_STATUS_MARKERS: &str = "";

// ============================================================================
// File Handle
// ============================================================================

/// A file in the vault, identified by its vault-relative path.
///
/// Paths always use `/` as separator. `parent` is `None` for files at the
/// vault root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileHandle {
  pub path: String,
  pub parent: Option<String>,
}

impl FileHandle {
  /// Build a handle from a vault-relative path, deriving the parent folder
  pub fn new(path: impl Into<String>) -> Self {
    let path = path.into();
    let parent = path
      .rsplit_once('/')
      .map(|(parent, _)| parent.to_string())
      .filter(|parent| !parent.is_empty());
    Self { path, parent }
  }

  /// Parent folder path, or the empty string for root files
  pub fn parent_path(&self) -> &str {
    self.parent.as_deref().unwrap_or("")
  }

  /// File name without folders
  pub fn name(&self) -> &str {
    self.path.rsplit('/').next().unwrap_or(&self.path)
  }
}

impl fmt::Display for FileHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.path)
  }
}

// ============================================================================
// Task Id
// ============================================================================

/// Stable identifier of a task line.
///
/// Derived from the owning path, the line's text and how many identical
/// lines precede it in the same file. Editing other lines leaves the id
/// unchanged; editing the line itself produces a new id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
  pub fn derive(path: &str, line: &str, occurrence: usize) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(path.as_bytes());
    hasher.update([0u8]);
    hasher.update(line.trim_end().as_bytes());
    hasher.update([0u8]);
    hasher.update(occurrence.to_le_bytes());
    let digest = hasher.finalize();
    Self(hex::encode(&digest[..12]))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl From<String> for TaskId {
  fn from(value: String) -> Self {
    Self(value)
  }
}

impl From<&str> for TaskId {
  fn from(value: &str) -> Self {
    Self(value.to_string())
  }
}

impl fmt::Display for TaskId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ============================================================================
// Task + Metadata
// ============================================================================

/// A task line as presented to consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
  pub id: TaskId,
  /// Owning file path (vault-relative)
  pub path: String,
  /// Zero-based line number within the file
  pub row_index: usize,
  /// Character between the brackets (`' '` for open tasks)
  pub status_marker: char,
  pub done: bool,
  /// Display text, with the column tag (and consolidated tags) removed
  pub content: String,
  pub tags: BTreeSet<String>,
  /// Column assigned by a column tag, if any
  pub column: Option<String>,
}

/// Per-task data used to write a task back to its file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
  pub file: FileHandle,
  pub row_index: usize,
  /// The full source line as it was extracted
  pub raw_line: String,
  /// Indentation and list bullet before the status brackets, e.g. `"  - "`
  pub prefix: String,
  /// Text after the status brackets, tags included
  pub text: String,
}
