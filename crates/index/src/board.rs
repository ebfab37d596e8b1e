//! Board view - groups a task snapshot into columns

use serde::Serialize;
use taskdeck_core::{Settings, Task, VisibilityOption};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
  Uncategorized,
  Named,
  Done,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardColumn {
  pub kind: ColumnKind,
  pub name: String,
  pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Board {
  pub columns: Vec<BoardColumn>,
}

impl Board {
  /// Lay out tasks as: Uncategorized, each configured column, Done.
  ///
  /// Done tasks always land in Done regardless of their column tag. The
  /// Uncategorized and Done columns follow their visibility settings; `Auto`
  /// shows them only when they hold tasks.
  pub fn from_snapshot(tasks: &[Task], settings: &Settings) -> Self {
    let table = settings.column_tag_table();

    let mut uncategorized = Vec::new();
    let mut done = Vec::new();
    let mut named: Vec<BoardColumn> = table
      .names()
      .map(|name| BoardColumn {
        kind: ColumnKind::Named,
        name: name.to_string(),
        tasks: Vec::new(),
      })
      .collect();

    for task in tasks {
      if task.done {
        done.push(task.clone());
        continue;
      }
      let slot = task
        .column
        .as_deref()
        .and_then(|column| named.iter_mut().find(|c| c.name == column));
      match slot {
        Some(column) => column.tasks.push(task.clone()),
        None => uncategorized.push(task.clone()),
      }
    }

    let mut columns = Vec::with_capacity(named.len() + 2);
    if is_visible(settings.uncategorized_visibility, &uncategorized) {
      columns.push(BoardColumn {
        kind: ColumnKind::Uncategorized,
        name: "Uncategorized".to_string(),
        tasks: uncategorized,
      });
    }
    columns.extend(named);
    if is_visible(settings.done_visibility, &done) {
      columns.push(BoardColumn {
        kind: ColumnKind::Done,
        name: "Done".to_string(),
        tasks: done,
      });
    }

    Self { columns }
  }

  pub fn column(&self, name: &str) -> Option<&BoardColumn> {
    self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
  }
}

fn is_visible(option: VisibilityOption, tasks: &[Task]) -> bool {
  match option {
    VisibilityOption::AlwaysShow => true,
    VisibilityOption::Auto => !tasks.is_empty(),
    VisibilityOption::NeverShow => false,
  }
}
