//! Synchronised task index
//!
//! Three maps kept in lockstep:
//! - `tasks`: id -> presentation record
//! - `metadata`: id -> write-back record
//! - `files`: file -> ids extracted from it
//!
//! Every id in `tasks` has a `metadata` entry and belongs to exactly one
//! file's id set. Only the index actor mutates this structure.

use std::collections::{HashMap, HashSet};

use taskdeck_core::{FileHandle, Metadata, Task, TaskId};

/// Outcome of merging one extraction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
  pub removed: usize,
  pub inserted: usize,
}

impl MergeStats {
  pub fn changed(&self) -> bool {
    self.removed > 0 || self.inserted > 0
  }
}

#[derive(Debug, Default)]
pub struct SyncIndex {
  tasks: HashMap<TaskId, Task>,
  metadata: HashMap<TaskId, Metadata>,
  files: HashMap<FileHandle, HashSet<TaskId>>,
}

impl SyncIndex {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn clear(&mut self) {
    self.tasks.clear();
    self.metadata.clear();
    self.files.clear();
  }

  /// Replace everything known about `file` with a fresh extraction
  pub fn merge(&mut self, file: &FileHandle, extracted: Vec<(Task, Metadata)>) -> MergeStats {
    let removed = self.remove_file(file);

    let mut ids = HashSet::with_capacity(extracted.len());
    for (task, metadata) in extracted {
      let id = task.id.clone();

      // An id owned by another file moves here
      if let Some(previous) = self.metadata.get(&id)
        && previous.file != *file
      {
        let owner = previous.file.clone();
        self.detach(&owner, &id);
      }

      self.tasks.insert(id.clone(), task);
      self.metadata.insert(id.clone(), metadata);
      ids.insert(id);
    }

    let inserted = ids.len();
    if !ids.is_empty() {
      self.files.insert(file.clone(), ids);
    }

    MergeStats { removed, inserted }
  }

  /// Drop every task of `file`, returning how many were removed
  pub fn remove_file(&mut self, file: &FileHandle) -> usize {
    let Some(ids) = self.files.remove(file) else {
      return 0;
    };
    for id in &ids {
      self.tasks.remove(id);
      self.metadata.remove(id);
    }
    ids.len()
  }

  fn detach(&mut self, owner: &FileHandle, id: &TaskId) {
    if let Some(ids) = self.files.get_mut(owner) {
      ids.remove(id);
      if ids.is_empty() {
        self.files.remove(owner);
      }
    }
  }

  pub fn task(&self, id: &TaskId) -> Option<&Task> {
    self.tasks.get(id)
  }

  pub fn metadata(&self, id: &TaskId) -> Option<&Metadata> {
    self.metadata.get(id)
  }

  pub fn resolve(&self, id: &TaskId) -> Option<(Task, Metadata)> {
    Some((self.tasks.get(id)?.clone(), self.metadata.get(id)?.clone()))
  }

  pub fn task_ids_for(&self, file: &FileHandle) -> Option<&HashSet<TaskId>> {
    self.files.get(file)
  }

  pub fn len(&self) -> usize {
    self.tasks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.tasks.is_empty()
  }

  pub fn file_count(&self) -> usize {
    self.files.len()
  }

  pub fn metadata_count(&self) -> usize {
    self.metadata.len()
  }

  /// All tasks ordered by path, then row
  pub fn sorted_tasks(&self) -> Vec<Task> {
    let mut tasks: Vec<Task> = self.tasks.values().cloned().collect();
    sort_tasks(&mut tasks);
    tasks
  }

  /// Verify the three maps agree with each other
  pub fn check_consistency(&self) -> Result<(), String> {
    if self.tasks.len() != self.metadata.len() {
      return Err(format!(
        "{} tasks but {} metadata entries",
        self.tasks.len(),
        self.metadata.len()
      ));
    }

    let mut seen = HashSet::with_capacity(self.tasks.len());
    for (file, ids) in &self.files {
      for id in ids {
        if !seen.insert(id) {
          return Err(format!("task {id} is attributed to more than one file"));
        }
        match self.metadata.get(id) {
          Some(metadata) if metadata.file == *file => {}
          Some(metadata) => {
            return Err(format!("task {id} listed under {file} but its metadata names {}", metadata.file));
          }
          None => return Err(format!("task {id} listed under {file} has no metadata")),
        }
        if !self.tasks.contains_key(id) {
          return Err(format!("task {id} listed under {file} has no task record"));
        }
      }
    }

    if seen.len() != self.tasks.len() {
      return Err(format!("{} tasks but {} attributed to files", self.tasks.len(), seen.len()));
    }
    Ok(())
  }
}

/// Order tasks by path (byte-wise), then row index
pub fn sort_tasks(tasks: &mut [Task]) {
  tasks.sort_by(|a, b| a.path.cmp(&b.path).then(a.row_index.cmp(&b.row_index)));
}
