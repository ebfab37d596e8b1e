//! Messages understood by the index actor

use taskdeck_core::{FileHandle, Metadata, Task, TaskId};
use tokio::sync::oneshot;

use crate::{extract::ExtractError, vault::VaultEvent};

/// A request for the [`super::IndexActor`]
#[derive(Debug)]
pub enum IndexCommand {
  /// Clear the index and extract every in-scope file
  Initialise,
  /// A vault file changed
  Event(VaultEvent),
  /// Look up a task and its write-back record
  Resolve {
    id: TaskId,
    reply: oneshot::Sender<Option<(Task, Metadata)>>,
  },
  /// Current counters
  Stats { reply: oneshot::Sender<IndexStats> },
  /// Reply once no extraction is in flight and no publish is pending
  Settled { reply: oneshot::Sender<()> },
  /// Publish anything pending and stop
  Shutdown,
}

/// Result of a spawned extraction, routed back to the actor
#[derive(Debug)]
pub(crate) struct Extraction {
  pub generation: u64,
  pub seq: u64,
  pub file: FileHandle,
  pub outcome: Result<Vec<(Task, Metadata)>, ExtractError>,
}

/// Index counters, for status output and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
  pub tasks: usize,
  pub metadata: usize,
  pub files: usize,
  pub in_flight: usize,
  /// Bumped by every rebuild
  pub generation: u64,
  /// Snapshots published so far
  pub published: u64,
}
