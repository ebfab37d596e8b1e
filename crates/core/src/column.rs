//! Column tag table
//!
//! Board columns are assigned through tags: a column named "In Progress"
//! claims the tag `#in-progress`.

use std::collections::HashMap;

/// Lookup between configured column names and their tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnTagTable {
  /// (tag, column name) in configured order
  columns: Vec<(String, String)>,
  by_tag: HashMap<String, usize>,
}

impl ColumnTagTable {
  pub fn new<I, S>(columns: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let mut table = Self::default();
    for name in columns {
      let name = name.as_ref().trim();
      let tag = kebab_case(name);
      if tag.is_empty() || table.by_tag.contains_key(&tag) {
        continue;
      }
      table.by_tag.insert(tag.clone(), table.columns.len());
      table.columns.push((tag, name.to_string()));
    }
    table
  }

  /// Column name claimed by a tag (without the leading `#`)
  pub fn column_for_tag(&self, tag: &str) -> Option<&str> {
    self
      .by_tag
      .get(&tag.to_lowercase())
      .map(|&i| self.columns[i].1.as_str())
  }

  /// Tag used for a column name
  pub fn tag_for_column(&self, column: &str) -> Option<&str> {
    self
      .columns
      .iter()
      .find(|(_, name)| name.eq_ignore_ascii_case(column.trim()))
      .map(|(tag, _)| tag.as_str())
  }

  /// Column names in configured order
  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.columns.iter().map(|(_, name)| name.as_str())
  }

  pub fn is_empty(&self) -> bool {
    self.columns.is_empty()
  }
}

/// Convert a column name into its tag form: "In Progress" -> "in-progress"
pub fn kebab_case(name: &str) -> String {
  let mut out = String::with_capacity(name.len());
  let mut pending_dash = false;
  for c in name.chars() {
    if c.is_alphanumeric() || c == '_' {
      if pending_dash && !out.is_empty() {
        out.push('-');
      }
      pending_dash = false;
      out.extend(c.to_lowercase());
    } else {
      pending_dash = true;
    }
  }
  out
}
