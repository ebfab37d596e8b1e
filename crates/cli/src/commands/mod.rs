//! CLI command implementations

mod config;
mod exclude;
mod list;
mod task;
mod watch;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::{Context, Result, bail};
use index::{FsVault, SettingsStore, TasksStore};
use taskdeck_core::{Config, Task, TaskId};
use tokio_util::sync::CancellationToken;

pub use config::{cmd_config_init, cmd_config_show};
pub use exclude::{cmd_exclude_add, cmd_exclude_list, cmd_exclude_remove};
pub use list::cmd_list;
pub use task::cmd_task;
pub use watch::cmd_watch;

/// Resolve the vault directory (defaults to the current directory)
pub fn vault_root(vault: Option<PathBuf>) -> Result<PathBuf> {
  let root = match vault {
    Some(path) => path,
    None => std::env::current_dir().context("Failed to get current directory")?,
  };
  if !root.is_dir() {
    bail!("Vault directory does not exist: {}", root.display());
  }
  Ok(root)
}

/// A running engine over an on-disk vault
pub struct Engine {
  pub config: Config,
  /// Board settings in force; the watcher replaces them on config edits
  pub settings: SettingsStore,
  pub store: TasksStore,
  pub cancel: CancellationToken,
}

impl Engine {
  pub fn start(root: &Path) -> Self {
    let config = Config::load_for_vault(root);
    let settings = SettingsStore::new(config.board.clone());
    let cancel = CancellationToken::new();
    let store = TasksStore::spawn(Arc::new(FsVault::new(root)), Arc::new(settings.clone()), cancel.clone());
    Self {
      config,
      settings,
      store,
      cancel,
    }
  }

  /// Rebuild and wait for the resulting snapshot
  pub async fn load(&self) -> Result<()> {
    self.store.initialise().context("Index actor stopped")?;
    self.store.settled().await.context("Index actor stopped")?;
    Ok(())
  }
}

/// Find a task by full id or unique id prefix
pub fn find_task<'a>(tasks: &'a [Task], id: &str) -> Result<&'a Task> {
  let id = id.trim();
  if id.is_empty() {
    bail!("Task id cannot be empty");
  }

  let exact = TaskId::from(id);
  if let Some(task) = tasks.iter().find(|t| t.id == exact) {
    return Ok(task);
  }

  let mut matches = tasks.iter().filter(|t| t.id.as_str().starts_with(id));
  match (matches.next(), matches.next()) {
    (Some(task), None) => Ok(task),
    (Some(_), Some(_)) => bail!("Task id prefix '{}' is ambiguous", id),
    (None, _) => bail!("No task with id '{}'", id),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::BTreeSet;

  fn task(path: &str, line: &str) -> Task {
    Task {
      id: TaskId::derive(path, line, 0),
      path: path.to_string(),
      row_index: 0,
      status_marker: ' ',
      done: false,
      content: line.to_string(),
      tags: BTreeSet::new(),
      column: None,
    }
  }

  #[test]
  fn test_find_task_by_prefix() {
    let tasks = vec![task("a.md", "- [ ] one"), task("b.md", "- [ ] two")];
    let full = tasks[0].id.as_str().to_string();

    assert_eq!(find_task(&tasks, &full).unwrap().path, "a.md");
    assert_eq!(find_task(&tasks, &full[..10]).unwrap().path, "a.md");
    assert!(find_task(&tasks, "zzzz").is_err());
    assert!(find_task(&tasks, "").is_err());
  }

  #[test]
  fn test_find_task_ambiguous_prefix() {
    let mut first = task("a.md", "- [ ] one");
    let mut second = task("b.md", "- [ ] two");
    first.id = TaskId::from("abc111");
    second.id = TaskId::from("abc222");
    let tasks = vec![first, second];

    let err = find_task(&tasks, "abc").unwrap_err();
    assert!(err.to_string().contains("ambiguous"));
    assert_eq!(find_task(&tasks, "abc2").unwrap().path, "b.md");
  }

  #[test]
  fn test_vault_root_must_exist() {
    let dir = tempfile::TempDir::new().unwrap();
    assert_eq!(vault_root(Some(dir.path().to_path_buf())).unwrap(), dir.path());
    assert!(vault_root(Some(dir.path().join("missing"))).is_err());
  }
}
