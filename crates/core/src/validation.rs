//! Input validation utilities
//!
//! Provides the checks applied to user-editable settings before they are
//! committed: excluded folder paths and status marker strings.

use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Longest excluded folder path accepted (in characters)
pub const MAX_FOLDER_PATH_LEN: usize = 255;

/// Device names that cannot be used as a folder segment on Windows
pub const RESERVED_FOLDER_NAMES: &[&str] = &[
  "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8", "COM9", "LPT1", "LPT2",
  "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// A validation error with field information
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
  pub field: String,
  pub message: String,
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.field, self.message)
  }
}

impl ValidationError {
  pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      field: field.into(),
      message: message.into(),
    }
  }

  /// Create error for too long string
  pub fn too_long(field: impl Into<String>, max_len: usize) -> Self {
    Self {
      field: field.into(),
      message: format!("is too long (max {} characters)", max_len),
    }
  }

  /// Create error for a missing value
  pub fn empty(field: impl Into<String>) -> Self {
    Self {
      field: field.into(),
      message: "must not be empty".to_string(),
    }
  }
}

/// Result type for validation
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate a folder path before it is added to the exclusion list.
///
/// Blank input is accepted (there is nothing to add). Leading and trailing
/// slashes are allowed here because [`normalize_folder_path`] strips them.
pub fn validate_folder_path(folder_path: &str) -> ValidationResult<()> {
  const FIELD: &str = "excluded_folders";

  let trimmed = folder_path.trim();
  if trimmed.is_empty() {
    return Ok(());
  }

  if trimmed.contains("..") {
    return Err(ValidationError::new(FIELD, "folder path cannot contain '..'"));
  }
  if trimmed.contains('\\') {
    return Err(ValidationError::new(FIELD, "folder path cannot contain backslashes"));
  }

  if trimmed.chars().count() > MAX_FOLDER_PATH_LEN {
    return Err(ValidationError::new(
      FIELD,
      format!("folder path is too long (max {} characters)", MAX_FOLDER_PATH_LEN),
    ));
  }

  for part in trimmed.split('/') {
    let upper = part.to_uppercase();
    if RESERVED_FOLDER_NAMES.contains(&upper.as_str()) {
      return Err(ValidationError::new(
        FIELD,
        format!("cannot exclude reserved folder name: {}", upper),
      ));
    }
  }

  Ok(())
}

/// Normalize a folder path: trim whitespace, drop leading/trailing slashes
/// and collapse repeated slashes.
pub fn normalize_folder_path(folder_path: &str) -> String {
  folder_path
    .trim()
    .split('/')
    .filter(|segment| !segment.is_empty())
    .collect::<Vec<_>>()
    .join("/")
}

/// Validate then normalize a folder path in one step.
///
/// Returns `Ok(None)` for blank input.
pub fn parse_folder_path(folder_path: &str) -> ValidationResult<Option<String>> {
  validate_folder_path(folder_path)?;
  let normalized = normalize_folder_path(folder_path);
  Ok((!normalized.is_empty()).then_some(normalized))
}

/// Validate a string of single-character status markers.
///
/// Every character must be printable, non-whitespace and appear once.
/// `allow_empty` controls whether an empty marker set is acceptable.
pub fn validate_status_markers(markers: &str, field: &str, allow_empty: bool) -> ValidationResult<()> {
  if markers.is_empty() {
    return if allow_empty {
      Ok(())
    } else {
      Err(ValidationError::empty(field))
    };
  }

  let mut problems = Vec::new();
  let mut seen = HashSet::new();
  let mut reported = HashSet::new();

  for c in markers.chars() {
    if c.is_whitespace() {
      if reported.insert(('w', c)) {
        problems.push("must not contain whitespace".to_string());
      }
      continue;
    }
    if c.is_control() {
      if reported.insert(('c', c)) {
        problems.push(format!("contains non-printable character U+{:04X}", c as u32));
      }
      continue;
    }
    if !seen.insert(c) && reported.insert(('d', c)) {
      problems.push(format!("duplicate marker '{}'", c));
    }
  }

  if problems.is_empty() {
    Ok(())
  } else {
    Err(ValidationError::new(field, problems.join(", ")))
  }
}

/// Validate the done status markers (must not be empty)
pub fn validate_done_status_markers(markers: &str) -> ValidationResult<()> {
  validate_status_markers(markers, "done_status_markers", false)
}

/// Validate the ignored status markers (may be empty)
pub fn validate_ignored_status_markers(markers: &str) -> ValidationResult<()> {
  validate_status_markers(markers, "ignored_status_markers", true)
}
