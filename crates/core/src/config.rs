//! Configuration system for taskdeck with per-vault overrides.
//!
//! Config priority: vault-relative (.taskdeck/config.toml) > user (~/.config/taskdeck/config.toml)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::column::ColumnTagTable;
use crate::error::{Error, Result};
use crate::task::{DEFAULT_DONE_STATUS_MARKERS, DEFAULT_IGNORED_STATUS_MARKERS};
use crate::validation::{
  ValidationResult, parse_folder_path, validate_done_status_markers, validate_ignored_status_markers,
};

// ============================================================================
// Board Settings
// ============================================================================

/// Where tasks are collected from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScopeOption {
  /// Only files under the board's folder
  #[default]
  Folder,
  /// Every file in the vault, minus excluded folders
  Everywhere,
}

/// When a special column is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityOption {
  AlwaysShow,
  /// Hide when empty
  #[default]
  Auto,
  NeverShow,
}

/// Board settings read by the task engine at the moment of use
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Column names, in display order
  pub columns: Vec<String>,

  /// Task discovery scope
  pub scope: ScopeOption,

  /// Folder the board lives in (used when scope = folder)
  pub folder: String,

  /// Show the owning file path on each task
  pub show_filepath: bool,

  pub uncategorized_visibility: VisibilityOption,

  pub done_visibility: VisibilityOption,

  /// Move tags out of the task text into a footer
  pub consolidate_tags: bool,

  /// Characters marking a task as done (e.g. "xX" for [x] and [X])
  pub done_status_markers: String,

  /// Characters marking a task line to be skipped entirely (e.g. "-")
  pub ignored_status_markers: String,

  /// Folders skipped when scope = everywhere (normalized, deduplicated)
  pub excluded_folders: Vec<String>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      columns: ["Later", "Soonish", "Next week", "This week", "Today", "Pending"]
        .into_iter()
        .map(String::from)
        .collect(),
      scope: ScopeOption::Folder,
      folder: String::new(),
      show_filepath: true,
      uncategorized_visibility: VisibilityOption::Auto,
      done_visibility: VisibilityOption::AlwaysShow,
      consolidate_tags: false,
      done_status_markers: DEFAULT_DONE_STATUS_MARKERS.to_string(),
      ignored_status_markers: DEFAULT_IGNORED_STATUS_MARKERS.to_string(),
      excluded_folders: Vec::new(),
    }
  }
}

impl Settings {
  /// Path prefix filter for folder scope, `None` when scanning everywhere
  pub fn filename_filter(&self) -> Option<String> {
    match self.scope {
      ScopeOption::Folder => Some(self.folder.clone()),
      ScopeOption::Everywhere => None,
    }
  }

  pub fn column_tag_table(&self) -> ColumnTagTable {
    ColumnTagTable::new(&self.columns)
  }

  /// Replace the columns from a comma separated list ("Todo, Doing")
  pub fn set_columns_from_str(&mut self, value: &str) {
    self.columns = value
      .split(',')
      .map(|column| column.trim().to_string())
      .filter(|column| !column.is_empty())
      .collect();
  }

  /// Validate, normalize and add a folder to the exclusion list.
  ///
  /// Returns `Ok(false)` when the input is blank or already excluded.
  pub fn add_excluded_folder(&mut self, folder: &str) -> ValidationResult<bool> {
    let Some(normalized) = parse_folder_path(folder)? else {
      return Ok(false);
    };
    if self.excluded_folders.contains(&normalized) {
      return Ok(false);
    }
    self.excluded_folders.push(normalized);
    Ok(true)
  }

  /// Remove a folder from the exclusion list (input is normalized first)
  pub fn remove_excluded_folder(&mut self, folder: &str) -> bool {
    let normalized = crate::validation::normalize_folder_path(folder);
    let before = self.excluded_folders.len();
    self.excluded_folders.retain(|existing| existing != &normalized);
    before != self.excluded_folders.len()
  }

  /// Set the done markers; settings are left untouched on error
  pub fn set_done_status_markers(&mut self, markers: &str) -> ValidationResult<()> {
    validate_done_status_markers(markers)?;
    self.done_status_markers = markers.to_string();
    Ok(())
  }

  /// Set the ignored markers; settings are left untouched on error
  pub fn set_ignored_status_markers(&mut self, markers: &str) -> ValidationResult<()> {
    validate_ignored_status_markers(markers)?;
    self.ignored_status_markers = markers.to_string();
    Ok(())
  }

  /// Repair values loaded from disk that would not pass validation
  pub fn sanitize(&mut self) {
    if let Err(e) = validate_done_status_markers(&self.done_status_markers) {
      warn!(error = %e, "Invalid done status markers in config, using defaults");
      self.done_status_markers = DEFAULT_DONE_STATUS_MARKERS.to_string();
    }
    if let Err(e) = validate_ignored_status_markers(&self.ignored_status_markers) {
      warn!(error = %e, "Invalid ignored status markers in config, using defaults");
      self.ignored_status_markers = DEFAULT_IGNORED_STATUS_MARKERS.to_string();
    }

    let mut folders = Vec::with_capacity(self.excluded_folders.len());
    for raw in &self.excluded_folders {
      match parse_folder_path(raw) {
        Ok(Some(folder)) if !folders.contains(&folder) => folders.push(folder),
        Ok(_) => {}
        Err(e) => warn!(folder = %raw, error = %e, "Dropping invalid excluded folder"),
      }
    }
    self.excluded_folders = folders;
  }
}

// ============================================================================
// Watcher Configuration
// ============================================================================

/// File watcher configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
  /// Quiet period before raw file events are forwarded (default: 200)
  pub debounce_ms: u64,

  /// Poll interval for polling backends in seconds (default: 2)
  pub poll_secs: u64,
}

impl Default for WatcherConfig {
  fn default() -> Self {
    Self {
      debounce_ms: 200,
      poll_secs: 2,
    }
  }
}

// ============================================================================
// Log Configuration
// ============================================================================

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
  /// Log level: error, warn, info, debug, trace (default: info)
  pub level: String,

  /// Log file rotation: daily, hourly, never (default: daily)
  pub rotation: String,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
      rotation: "daily".to_string(),
    }
  }
}

// ============================================================================
// Main Configuration
// ============================================================================

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
  /// Board settings
  #[serde(default)]
  pub board: Settings,

  /// File watcher settings
  #[serde(default)]
  pub watcher: WatcherConfig,

  /// Logging settings
  #[serde(default)]
  pub log: LogConfig,
}

impl Config {
  /// Load config for a vault, with fallback to user config
  pub fn load_for_vault(vault_path: &Path) -> Self {
    let mut config = Self::read_first(vault_path).unwrap_or_default();
    config.board.sanitize();
    config
  }

  fn read_first(vault_path: &Path) -> Option<Self> {
    let vault_config = Self::vault_config_path(vault_path);
    if vault_config.exists()
      && let Ok(content) = std::fs::read_to_string(&vault_config)
    {
      match toml::from_str(&content) {
        Ok(config) => return Some(config),
        Err(e) => warn!(path = %vault_config.display(), error = %e, "Failed to parse vault config"),
      }
    }

    if let Some(user_config_path) = Self::user_config_path()
      && user_config_path.exists()
      && let Ok(content) = std::fs::read_to_string(&user_config_path)
    {
      match toml::from_str(&content) {
        Ok(config) => return Some(config),
        Err(e) => warn!(path = %user_config_path.display(), error = %e, "Failed to parse user config"),
      }
    }

    None
  }

  /// Get the user-level config path
  pub fn user_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("CONFIG_DIR") {
      return Some(PathBuf::from(path).join("config.toml"));
    }

    if let Ok(path) = std::env::var("XDG_CONFIG_HOME") {
      return Some(PathBuf::from(path).join("taskdeck").join("config.toml"));
    }

    dirs::config_dir().map(|p: PathBuf| p.join("taskdeck").join("config.toml"))
  }

  /// Get the vault-relative config path
  pub fn vault_config_path(vault_path: &Path) -> PathBuf {
    vault_path.join(".taskdeck").join("config.toml")
  }

  /// Write this config to the vault config file
  pub fn save_for_vault(&self, vault_path: &Path) -> Result<PathBuf> {
    let path = Self::vault_config_path(vault_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
    std::fs::write(&path, content)?;
    Ok(path)
  }

  /// Generate a default config file as a string
  pub fn generate_template() -> String {
    r#"# taskdeck configuration
# Place in <vault>/.taskdeck/config.toml (vault) or ~/.config/taskdeck/config.toml (user)

# ============================================================================
# Board
# ============================================================================

[board]
columns = ["Later", "Soonish", "Next week", "This week", "Today", "Pending"]

# Where to look for tasks: "folder" (only under `folder`) or "everywhere"
scope = "folder"
folder = ""

show_filepath = true

# always_show, auto (hide when empty) or never_show
uncategorized_visibility = "auto"
done_visibility = "always_show"

# Move tags from the task text into a footer
consolidate_tags = false

# Characters inside [ ] that mark a task done / make the line ignored
done_status_markers = "xX"
ignored_status_markers = ""

# Folders skipped when scope = "everywhere"
excluded_folders = []

# ============================================================================
# Watcher
# ============================================================================

[watcher]
# Quiet period before file events are processed (milliseconds)
debounce_ms = 200
# Poll interval for polling backends (seconds)
poll_secs = 2

# ============================================================================
# Logging
# ============================================================================

[log]
# error, warn, info, debug, trace (RUST_LOG overrides)
level = "info"
# daily, hourly, never
rotation = "daily"
"#
    .to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn test_settings_defaults() {
    let settings = Settings::default();
    assert_eq!(settings.scope, ScopeOption::Folder);
    assert_eq!(settings.done_status_markers, "xX");
    assert_eq!(settings.ignored_status_markers, "");
    assert!(settings.show_filepath);
    assert!(settings.excluded_folders.is_empty());
    assert_eq!(settings.filename_filter(), Some(String::new()));
  }

  #[test]
  fn test_filename_filter_by_scope() {
    let mut settings = Settings {
      folder: "boards/work".to_string(),
      ..Default::default()
    };
    assert_eq!(settings.filename_filter().as_deref(), Some("boards/work"));

    settings.scope = ScopeOption::Everywhere;
    assert_eq!(settings.filename_filter(), None);
  }

  #[test]
  fn test_add_excluded_folder_normalizes_and_dedupes() {
    let mut settings = Settings::default();
    assert_eq!(settings.add_excluded_folder("/archive/"), Ok(true));
    assert_eq!(settings.add_excluded_folder("archive"), Ok(false));
    assert_eq!(settings.add_excluded_folder("   "), Ok(false));
    assert_eq!(settings.add_excluded_folder("//templates///old//"), Ok(true));
    assert_eq!(settings.excluded_folders, vec!["archive", "templates/old"]);
  }

  #[test]
  fn test_add_excluded_folder_rejects_invalid() {
    let mut settings = Settings::default();
    let err = settings.add_excluded_folder("NUL").unwrap_err();
    assert!(err.message.contains("reserved"));
    assert!(settings.add_excluded_folder("a/../b").is_err());
    assert!(settings.excluded_folders.is_empty());
  }

  #[test]
  fn test_remove_excluded_folder() {
    let mut settings = Settings {
      excluded_folders: vec!["archive".to_string(), "templates".to_string()],
      ..Default::default()
    };
    assert!(settings.remove_excluded_folder("/archive/"));
    assert!(!settings.remove_excluded_folder("archive"));
    assert_eq!(settings.excluded_folders, vec!["templates"]);
  }

  #[test]
  fn test_marker_setters_keep_old_value_on_error() {
    let mut settings = Settings::default();
    assert!(settings.set_done_status_markers("").is_err());
    assert_eq!(settings.done_status_markers, "xX");

    settings.set_done_status_markers("x✓").unwrap();
    assert_eq!(settings.done_status_markers, "x✓");

    assert!(settings.set_ignored_status_markers("- ").is_err());
    assert_eq!(settings.ignored_status_markers, "");
    settings.set_ignored_status_markers("-~").unwrap();
    assert_eq!(settings.ignored_status_markers, "-~");
  }

  #[test]
  fn test_set_columns_from_str() {
    let mut settings = Settings::default();
    settings.set_columns_from_str(" Todo, In Progress ,, Review ");
    assert_eq!(settings.columns, vec!["Todo", "In Progress", "Review"]);
  }

  #[test]
  fn test_sanitize() {
    let mut settings = Settings {
      done_status_markers: "x x".to_string(),
      ignored_status_markers: "--".to_string(),
      excluded_folders: vec![
        "/archive/".to_string(),
        "archive".to_string(),
        "CON".to_string(),
        "a\\b".to_string(),
      ],
      ..Default::default()
    };
    settings.sanitize();
    assert_eq!(settings.done_status_markers, "xX");
    assert_eq!(settings.ignored_status_markers, "");
    assert_eq!(settings.excluded_folders, vec!["archive"]);
  }

  #[test]
  fn test_load_vault_config() {
    let temp = TempDir::new().unwrap();
    let config_dir = temp.path().join(".taskdeck");
    std::fs::create_dir_all(&config_dir).unwrap();

    let config_content = r#"
[board]
scope = "everywhere"
columns = ["Todo", "Doing"]
excluded_folders = ["/templates/"]
done_visibility = "never_show"

[watcher]
debounce_ms = 50
"#;
    std::fs::write(config_dir.join("config.toml"), config_content).unwrap();

    let config = Config::load_for_vault(temp.path());
    assert_eq!(config.board.scope, ScopeOption::Everywhere);
    assert_eq!(config.board.columns, vec!["Todo", "Doing"]);
    assert_eq!(config.board.excluded_folders, vec!["templates"]);
    assert_eq!(config.board.done_visibility, VisibilityOption::NeverShow);
    assert_eq!(config.watcher.debounce_ms, 50);
    assert_eq!(config.watcher.poll_secs, 2);
    assert_eq!(config.log.level, "info");
  }

  #[test]
  fn test_save_then_load() {
    let temp = TempDir::new().unwrap();
    let mut config = Config::default();
    config.board.scope = ScopeOption::Everywhere;
    config.board.add_excluded_folder("archive").unwrap();

    let path = config.save_for_vault(temp.path()).unwrap();
    assert!(path.ends_with(".taskdeck/config.toml"));

    let loaded = Config::load_for_vault(temp.path());
    assert_eq!(loaded, config);
  }

  #[test]
  fn test_generate_template_parses() {
    let template = Config::generate_template();
    assert!(template.contains("[board]"));
    assert!(template.contains("[watcher]"));
    assert!(template.contains("[log]"));

    let parsed: Config = toml::from_str(&template).unwrap();
    assert_eq!(parsed, Config::default());
  }
}
