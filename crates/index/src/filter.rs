//! Path filter - decides whether a vault file is in scope for the board

use taskdeck_core::{FileHandle, Settings};

/// Check whether a file should be indexed.
///
/// With a `filename_filter` (folder scope) only the path prefix matters and
/// the exclusion list is not consulted. Without one (everywhere scope) the
/// file is rejected when its parent folder is, or lies below, an excluded
/// folder. Files at the vault root are never excluded.
///
/// Callers pass the settings current at the time of the call.
pub fn should_handle(file: &FileHandle, filename_filter: Option<&str>, settings: &Settings) -> bool {
  if let Some(filter) = filename_filter {
    let filter = filter.strip_prefix('/').unwrap_or(filter);
    return file.path.starts_with(filter);
  }

  let Some(parent) = file.parent.as_deref() else {
    return true;
  };

  !settings
    .excluded_folders
    .iter()
    .any(|excluded| is_within(parent, excluded))
}

/// `folder` equals `ancestor` or is nested below it
fn is_within(folder: &str, ancestor: &str) -> bool {
  folder == ancestor
    || folder
      .strip_prefix(ancestor)
      .is_some_and(|rest| rest.starts_with('/'))
}
