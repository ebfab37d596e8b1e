//! Task commands - edit a single task in its file

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use super::{Engine, find_task};
use crate::TaskCommand;

pub async fn cmd_task(root: &Path, command: TaskCommand) -> Result<()> {
  let engine = Engine::start(root);
  engine.load().await?;

  let tasks = engine.store.snapshot();
  let actions = engine.store.actions();

  let id = match &command {
    TaskCommand::Done { id }
    | TaskCommand::Undo { id }
    | TaskCommand::Toggle { id }
    | TaskCommand::Move { id, .. }
    | TaskCommand::Edit { id, .. }
    | TaskCommand::Delete { id }
    | TaskCommand::Locate { id } => id,
  };
  let task = find_task(&tasks, id)?;
  debug!(task = %task.id, path = %task.path, "Resolved task");

  match command {
    TaskCommand::Done { .. } => {
      actions.mark_done(&task.id, true).await.context("Failed to complete task")?;
      println!("Completed: {}", task.content);
    }
    TaskCommand::Undo { .. } => {
      actions.mark_done(&task.id, false).await.context("Failed to reopen task")?;
      println!("Reopened: {}", task.content);
    }
    TaskCommand::Toggle { .. } => {
      let done = actions.toggle_done(&task.id).await.context("Failed to toggle task")?;
      println!("{}: {}", if done { "Completed" } else { "Reopened" }, task.content);
    }
    TaskCommand::Move { column, .. } => {
      actions
        .change_column(&task.id, column.as_deref())
        .await
        .context("Failed to move task")?;
      match column {
        Some(column) => println!("Moved to {}: {}", column, task.content),
        None => println!("Cleared column: {}", task.content),
      }
    }
    TaskCommand::Edit { text, .. } => {
      let text = text.join(" ");
      actions
        .update_content(&task.id, &text)
        .await
        .context("Failed to edit task")?;
      println!("Updated: {}", text);
    }
    TaskCommand::Delete { .. } => {
      actions.delete_task(&task.id).await.context("Failed to delete task")?;
      println!("Deleted: {}", task.content);
    }
    TaskCommand::Locate { .. } => {
      let location = actions.locate(&task.id).await.context("Failed to locate task")?;
      println!("{}:{}", root.join(&location.file.path).display(), location.row_index + 1);
    }
  }

  engine.cancel.cancel();
  Ok(())
}
