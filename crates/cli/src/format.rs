//! Human-readable rendering of tasks and boards

use index::{Board, IndexStats};
use taskdeck_core::Task;

/// Characters of the id shown in listings
pub const SHORT_ID_LEN: usize = 8;

pub fn short_id(task: &Task) -> &str {
  let id = task.id.as_str();
  id.get(..SHORT_ID_LEN).unwrap_or(id)
}

/// `abcd1234  [x] text #tag  (notes/todo.md:4)`
pub fn format_task(task: &Task, show_filepath: bool) -> String {
  let mut line = format!("{}  [{}] {}", short_id(task), task.status_marker, task.content);
  if show_filepath {
    line.push_str(&format!("  ({}:{})", task.path, task.row_index + 1));
  }
  line
}

pub fn format_tasks(tasks: &[Task], show_filepath: bool) -> String {
  if tasks.is_empty() {
    return "No tasks found".to_string();
  }
  tasks
    .iter()
    .map(|task| format_task(task, show_filepath))
    .collect::<Vec<_>>()
    .join("\n")
}

pub fn format_board(board: &Board, show_filepath: bool) -> String {
  let mut out = String::new();
  for column in &board.columns {
    if !out.is_empty() {
      out.push('\n');
    }
    out.push_str(&format!("== {} ({}) ==\n", column.name, column.tasks.len()));
    for task in &column.tasks {
      out.push_str("  ");
      out.push_str(&format_task(task, show_filepath));
      out.push('\n');
    }
  }
  out
}

pub fn format_stats(stats: &IndexStats) -> String {
  format!(
    "{} tasks in {} files (publish #{}, generation {})",
    stats.tasks, stats.files, stats.published, stats.generation
  )
}
