pub mod column;
pub mod config;
pub mod error;
pub mod task;
pub mod validation;

pub use column::{ColumnTagTable, kebab_case};
pub use config::{Config, LogConfig, ScopeOption, Settings, VisibilityOption, WatcherConfig};
pub use error::{Error, Result};
pub use task::{DEFAULT_DONE_STATUS_MARKERS, DEFAULT_IGNORED_STATUS_MARKERS, FileHandle, Metadata, Task, TaskId};
pub use validation::{
  MAX_FOLDER_PATH_LEN, RESERVED_FOLDER_NAMES, ValidationError, ValidationResult, normalize_folder_path,
  parse_folder_path, validate_done_status_markers, validate_folder_path, validate_ignored_status_markers,
  validate_status_markers,
};
