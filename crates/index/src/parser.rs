//! Task line grammar
//!
//! Recognises markdown list items with a status box:
//!
//! ```text
//! - [ ] open task #tag
//!   * [x] done task
//! 1. [?] custom marker
//! ```
//!
//! Lines inside fenced code blocks are never tasks.

use std::collections::{BTreeSet, HashMap};
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use taskdeck_core::{ColumnTagTable, FileHandle, Metadata, Settings, Task, TaskId};

static TASK_LINE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(?P<prefix>[ \t]*(?:[-*+]|\d+[.)])[ \t]+)\[(?P<marker>[^\]])\](?:[ \t]+(?P<text>.*))?$")
    .expect("task line regex is valid")
});

static TAG: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"(?:^|\s)(#(?P<tag>[\p{L}\p{N}_/-]+))").expect("tag regex is valid"));

// ============================================================================
// Configuration
// ============================================================================

/// The settings-derived knobs the grammar needs
#[derive(Debug, Clone, Default)]
pub struct ExtractConfig {
  pub done_markers: String,
  pub ignored_markers: String,
  pub consolidate_tags: bool,
  pub columns: ColumnTagTable,
}

impl ExtractConfig {
  pub fn from_settings(settings: &Settings) -> Self {
    Self {
      done_markers: settings.done_status_markers.clone(),
      ignored_markers: settings.ignored_status_markers.clone(),
      consolidate_tags: settings.consolidate_tags,
      columns: settings.column_tag_table(),
    }
  }

  fn is_done(&self, marker: char) -> bool {
    self.done_markers.contains(marker)
  }

  fn is_ignored(&self, marker: char) -> bool {
    self.ignored_markers.contains(marker)
  }
}

/// Turns file content into task records
pub trait TaskParser: Send + Sync {
  fn parse(&self, file: &FileHandle, content: &str, config: &ExtractConfig) -> Vec<(Task, Metadata)>;
}

/// The markdown checkbox grammar
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownTaskParser;

impl TaskParser for MarkdownTaskParser {
  fn parse(&self, file: &FileHandle, content: &str, config: &ExtractConfig) -> Vec<(Task, Metadata)> {
    parse_tasks(file, content, config)
  }
}

// ============================================================================
// Line Grammar
// ============================================================================

/// The pieces of one task line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskLine<'a> {
  pub prefix: &'a str,
  pub marker: char,
  pub text: &'a str,
}

/// Split a line into prefix, status marker and text.
///
/// A trailing `\r` is ignored.
pub fn parse_task_line(line: &str) -> Option<TaskLine<'_>> {
  let line = line.strip_suffix('\r').unwrap_or(line);
  let caps = TASK_LINE.captures(line)?;
  let marker = caps.name("marker")?.as_str().chars().next()?;
  Some(TaskLine {
    prefix: caps.name("prefix")?.as_str(),
    marker,
    text: caps.name("text").map_or("", |m| m.as_str().trim_end()),
  })
}

/// Render a task line from its pieces
pub fn format_task_line(prefix: &str, marker: char, text: &str) -> String {
  if text.is_empty() {
    format!("{prefix}[{marker}]")
  } else {
    format!("{prefix}[{marker}] {text}")
  }
}

fn is_fence(line: &str) -> bool {
  let trimmed = line.trim_start();
  trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

// ============================================================================
// Tags
// ============================================================================

/// A `#tag` occurrence; `span` covers the `#` and the name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMatch<'a> {
  pub name: &'a str,
  pub span: Range<usize>,
}

/// Find every tag in a piece of text. Purely numeric tokens (`#12`) are not tags.
pub fn find_tags(text: &str) -> Vec<TagMatch<'_>> {
  TAG
    .captures_iter(text)
    .filter_map(|caps| {
      let full = caps.get(1)?;
      let name = caps.name("tag")?.as_str();
      if name.chars().all(|c| c.is_ascii_digit()) {
        return None;
      }
      Some(TagMatch {
        name,
        span: full.range(),
      })
    })
    .collect()
}

/// Remove the tags for which `remove` returns true, collapsing the whitespace
/// they leave behind. Text without matching tags is returned unchanged.
pub fn remove_tags(text: &str, mut remove: impl FnMut(&str) -> bool) -> String {
  let doomed: Vec<Range<usize>> = find_tags(text)
    .into_iter()
    .filter(|tag| remove(tag.name))
    .map(|tag| tag.span)
    .collect();
  if doomed.is_empty() {
    return text.to_string();
  }

  let mut out = String::with_capacity(text.len());
  let mut cursor = 0;
  for span in doomed {
    out.push_str(&text[cursor..span.start]);
    cursor = span.end;
  }
  out.push_str(&text[cursor..]);
  out.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============================================================================
// File Parsing
// ============================================================================

/// Extract every task from a file's content
pub fn parse_tasks(file: &FileHandle, content: &str, config: &ExtractConfig) -> Vec<(Task, Metadata)> {
  let mut tasks = Vec::new();
  let mut occurrences: HashMap<&str, usize> = HashMap::new();
  let mut in_fence = false;

  for (row_index, raw) in content.split('\n').enumerate() {
    let raw = raw.strip_suffix('\r').unwrap_or(raw);

    if is_fence(raw) {
      in_fence = !in_fence;
      continue;
    }
    if in_fence {
      continue;
    }

    let Some(line) = parse_task_line(raw) else {
      continue;
    };
    if config.is_ignored(line.marker) || line.text.is_empty() {
      continue;
    }

    let occurrence = occurrences.entry(raw.trim_end()).or_insert(0);
    let id = TaskId::derive(&file.path, raw, *occurrence);
    *occurrence += 1;

    let found = find_tags(line.text);
    let column = found
      .iter()
      .find_map(|tag| config.columns.column_for_tag(tag.name))
      .map(str::to_string);
    let tags: BTreeSet<String> = found
      .iter()
      .filter(|tag| config.columns.column_for_tag(tag.name).is_none())
      .map(|tag| tag.name.to_string())
      .collect();

    let content = remove_tags(line.text, |tag| {
      config.consolidate_tags || config.columns.column_for_tag(tag).is_some()
    });

    let task = Task {
      id,
      path: file.path.clone(),
      row_index,
      status_marker: line.marker,
      done: config.is_done(line.marker),
      content,
      tags,
      column,
    };
    let metadata = Metadata {
      file: file.clone(),
      row_index,
      raw_line: raw.to_string(),
      prefix: line.prefix.to_string(),
      text: line.text.to_string(),
    };
    tasks.push((task, metadata));
  }

  tasks
}
