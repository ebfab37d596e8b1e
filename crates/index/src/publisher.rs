//! Debounced snapshot publisher
//!
//! The first mutation after a quiet period arms a fixed deadline; later
//! mutations before the deadline ride along without moving it. When the
//! deadline passes the owner calls [`Publisher::fire`], which publishes the
//! index as it is at that moment.

use std::sync::Arc;
use std::time::Duration;

use taskdeck_core::Task;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

use crate::sync::SyncIndex;

/// Delay between the first unpublished mutation and the publish
pub const PUBLISH_DEBOUNCE: Duration = Duration::from_millis(50);

/// An immutable, sorted view of every task
pub type Snapshot = Arc<[Task]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
  Idle,
  Pending(Instant),
}

pub struct Publisher {
  state: DebounceState,
  tx: watch::Sender<Snapshot>,
  published: u64,
}

impl Publisher {
  pub fn new() -> Self {
    let (tx, _) = watch::channel(Snapshot::from(Vec::new()));
    Self {
      state: DebounceState::Idle,
      tx,
      published: 0,
    }
  }

  pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
    self.tx.subscribe()
  }

  /// Most recently published snapshot
  pub fn current(&self) -> Snapshot {
    self.tx.borrow().clone()
  }

  pub fn state(&self) -> DebounceState {
    self.state
  }

  /// When the pending publish is due, if one is armed
  pub fn deadline(&self) -> Option<Instant> {
    match self.state {
      DebounceState::Idle => None,
      DebounceState::Pending(deadline) => Some(deadline),
    }
  }

  pub fn is_pending(&self) -> bool {
    matches!(self.state, DebounceState::Pending(_))
  }

  /// Record an index mutation. Returns true when this arms a new deadline.
  pub fn notify_mutated(&mut self, now: Instant) -> bool {
    match self.state {
      DebounceState::Idle => {
        self.state = DebounceState::Pending(now + PUBLISH_DEBOUNCE);
        true
      }
      DebounceState::Pending(_) => false,
    }
  }

  /// Publish the index state now and return to idle
  pub fn fire(&mut self, index: &SyncIndex) -> Snapshot {
    self.state = DebounceState::Idle;
    let snapshot: Snapshot = index.sorted_tasks().into();
    self.published += 1;
    debug!(tasks = snapshot.len(), publish = self.published, "Publishing task snapshot");
    self.tx.send_replace(snapshot.clone());
    snapshot
  }

  /// Snapshots published so far
  pub fn published(&self) -> u64 {
    self.published
  }
}

impl Default for Publisher {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parser::{ExtractConfig, parse_tasks};
  use taskdeck_core::{FileHandle, Settings};

  fn index_with(files: &[(&str, &str)]) -> SyncIndex {
    let config = ExtractConfig::from_settings(&Settings::default());
    let mut index = SyncIndex::new();
    for (path, content) in files {
      let file = FileHandle::new(*path);
      let tasks = parse_tasks(&file, content, &config);
      index.merge(&file, tasks);
    }
    index
  }

  #[test]
  fn test_deadline_is_not_extended() {
    let mut publisher = Publisher::new();
    let start = Instant::now();

    assert!(publisher.notify_mutated(start));
    assert!(!publisher.notify_mutated(start + Duration::from_millis(30)));
    assert!(!publisher.notify_mutated(start + Duration::from_millis(45)));
    assert_eq!(publisher.deadline(), Some(start + PUBLISH_DEBOUNCE));
  }

  #[test]
  fn test_fire_publishes_state_at_fire_time() {
    let mut publisher = Publisher::new();
    let mut rx = publisher.subscribe();
    let mut index = index_with(&[("b.md", "- [ ] b")]);

    publisher.notify_mutated(Instant::now());
    let file = FileHandle::new("a.md");
    let config = ExtractConfig::from_settings(&Settings::default());
    index.merge(&file, parse_tasks(&file, "- [ ] a", &config));
    publisher.notify_mutated(Instant::now());

    publisher.fire(&index);
    assert_eq!(publisher.state(), DebounceState::Idle);
    assert_eq!(publisher.published(), 1);

    assert!(rx.has_changed().unwrap());
    let snapshot = rx.borrow_and_update().clone();
    let paths: Vec<&str> = snapshot.iter().map(|t| t.path.as_str()).collect();
    assert_eq!(paths, vec!["a.md", "b.md"]);
  }

  #[test]
  fn test_rearms_after_fire() {
    let mut publisher = Publisher::new();
    let index = SyncIndex::new();
    let now = Instant::now();

    publisher.notify_mutated(now);
    publisher.fire(&index);
    assert!(publisher.notify_mutated(now + Duration::from_millis(60)));
    assert!(publisher.is_pending());
  }
}
