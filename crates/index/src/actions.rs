//! Task actions - edits that write back to the task's file
//!
//! Actions resolve the task through the index, check that the line on disk
//! still matches what was indexed, and write the file. They never touch the
//! index: the resulting file change flows back through the normal event path.

use std::sync::Arc;

use serde::Serialize;
use taskdeck_core::{FileHandle, Metadata, Task, TaskId};
use tracing::{debug, info};

use crate::{
  actor::{IndexHandle, SendError},
  parser::{find_tags, format_task_line, remove_tags},
  settings::SettingsSource,
  vault::{FileStore, StoreError},
};

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
  #[error("Task not found: {0}")]
  NotFound(TaskId),

  #[error("Task {id} changed on disk since it was indexed ({path}, line {line})")]
  Conflict { id: TaskId, path: String, line: usize },

  #[error("Unknown column: {0}")]
  UnknownColumn(String),

  #[error(transparent)]
  Store(#[from] StoreError),

  #[error(transparent)]
  Index(#[from] SendError),
}

/// Where a task lives, for "open at location"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskLocation {
  pub file: FileHandle,
  /// Zero-based line
  pub row_index: usize,
}

#[derive(Clone)]
pub struct TaskActions {
  index: IndexHandle,
  store: Arc<dyn FileStore>,
  settings: Arc<dyn SettingsSource>,
}

impl TaskActions {
  pub fn new(index: IndexHandle, store: Arc<dyn FileStore>, settings: Arc<dyn SettingsSource>) -> Self {
    Self { index, store, settings }
  }

  async fn resolve(&self, id: &TaskId) -> Result<(Task, Metadata), ActionError> {
    self
      .index
      .resolve(id)
      .await?
      .ok_or_else(|| ActionError::NotFound(id.clone()))
  }

  pub async fn locate(&self, id: &TaskId) -> Result<TaskLocation, ActionError> {
    let (_, metadata) = self.resolve(id).await?;
    Ok(TaskLocation {
      file: metadata.file,
      row_index: metadata.row_index,
    })
  }

  /// Flip the done state, returning the new state
  pub async fn toggle_done(&self, id: &TaskId) -> Result<bool, ActionError> {
    let (task, _) = self.resolve(id).await?;
    let done = !task.done;
    self.mark_done(id, done).await?;
    Ok(done)
  }

  pub async fn mark_done(&self, id: &TaskId, done: bool) -> Result<(), ActionError> {
    let marker = if done {
      self.settings.current().done_status_markers.chars().next().unwrap_or('x')
    } else {
      ' '
    };
    self
      .rewrite(id, |_, metadata| {
        Some(format_task_line(&metadata.prefix, marker, &metadata.text))
      })
      .await?;
    info!(task = %id, done, "Updated task status");
    Ok(())
  }

  /// Move a task to a column, or out of every column with `None`
  pub async fn change_column(&self, id: &TaskId, column: Option<&str>) -> Result<(), ActionError> {
    let table = self.settings.current().column_tag_table();
    let tag = match column {
      Some(name) => Some(
        table
          .tag_for_column(name)
          .ok_or_else(|| ActionError::UnknownColumn(name.to_string()))?
          .to_string(),
      ),
      None => None,
    };

    self
      .rewrite(id, |task, metadata| {
        let mut text = remove_tags(&metadata.text, |t| table.column_for_tag(t).is_some());
        if let Some(tag) = &tag {
          push_tag(&mut text, tag);
        }
        Some(format_task_line(&metadata.prefix, task.status_marker, &text))
      })
      .await?;
    info!(task = %id, column = ?column, "Moved task");
    Ok(())
  }

  /// Replace the task's text.
  ///
  /// Tags hidden from the display text (the column tag, and every tag when
  /// tags are consolidated) are carried over unless `text` repeats them.
  pub async fn update_content(&self, id: &TaskId, text: &str) -> Result<(), ActionError> {
    let settings = self.settings.current();
    let table = settings.column_tag_table();
    let text = text.trim();

    self
      .rewrite(id, |task, metadata| {
        let present: Vec<String> = find_tags(text).iter().map(|t| t.name.to_lowercase()).collect();
        let mut new_text = text.to_string();
        for tag in find_tags(&metadata.text) {
          let hidden = settings.consolidate_tags || table.column_for_tag(tag.name).is_some();
          if hidden && !present.contains(&tag.name.to_lowercase()) {
            push_tag(&mut new_text, tag.name);
          }
        }
        Some(format_task_line(&metadata.prefix, task.status_marker, &new_text))
      })
      .await?;
    info!(task = %id, "Updated task text");
    Ok(())
  }

  /// Remove the task's line from its file
  pub async fn delete_task(&self, id: &TaskId) -> Result<(), ActionError> {
    self.rewrite(id, |_, _| None).await?;
    info!(task = %id, "Deleted task");
    Ok(())
  }

  /// Replace (or with `None`, drop) the task's line after checking it is unchanged
  async fn rewrite<F>(&self, id: &TaskId, edit: F) -> Result<(), ActionError>
  where
    F: FnOnce(&Task, &Metadata) -> Option<String>,
  {
    let (task, metadata) = self.resolve(id).await?;
    let content = self.store.read(&metadata.file).await?;

    let conflict = || ActionError::Conflict {
      id: id.clone(),
      path: metadata.file.path.clone(),
      line: metadata.row_index + 1,
    };

    let mut lines: Vec<&str> = content.split('\n').collect();
    let line = lines.get(metadata.row_index).copied().ok_or_else(conflict)?;
    let (current, cr) = match line.strip_suffix('\r') {
      Some(stripped) => (stripped, true),
      None => (line, false),
    };
    if current != metadata.raw_line {
      return Err(conflict());
    }

    let replacement = edit(&task, &metadata).map(|line| if cr { format!("{line}\r") } else { line });
    match &replacement {
      Some(line) => lines[metadata.row_index] = line.as_str(),
      None => {
        lines.remove(metadata.row_index);
      }
    }

    let updated = lines.join("\n");
    debug!(file = %metadata.file, line = metadata.row_index, "Writing task edit");
    self.store.write(&metadata.file, &updated).await?;
    Ok(())
  }
}

fn push_tag(text: &mut String, tag: &str) {
  if !text.is_empty() {
    text.push(' ');
  }
  text.push('#');
  text.push_str(tag);
}
