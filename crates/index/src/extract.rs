//! File task extractor - reads one file and runs the grammar over it

use taskdeck_core::{FileHandle, Metadata, Task};
use tracing::trace;

use crate::{
  parser::{ExtractConfig, TaskParser},
  vault::{FileStore, StoreError},
};

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
  #[error("Failed to read {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: StoreError,
  },
}

/// Read `file` and extract its tasks.
///
/// Ids in the result are unique within the file.
pub async fn extract_file(
  store: &dyn FileStore,
  parser: &dyn TaskParser,
  file: &FileHandle,
  config: &ExtractConfig,
) -> Result<Vec<(Task, Metadata)>, ExtractError> {
  let content = store.read(file).await.map_err(|source| ExtractError::Read {
    path: file.path.clone(),
    source,
  })?;

  let tasks = parser.parse(file, &content, config);
  trace!(file = %file, tasks = tasks.len(), "Extracted tasks");
  Ok(tasks)
}
