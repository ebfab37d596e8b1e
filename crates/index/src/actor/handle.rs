//! Handle for talking to the index actor
//!
//! The handle is cheap to clone. Commands go over an unbounded channel so
//! fire-and-forget requests (`initialise`, `notify`) never wait.

use taskdeck_core::{Metadata, Task, TaskId};
use tokio::sync::{mpsc, oneshot};

use super::message::{IndexCommand, IndexStats};
use crate::vault::VaultEvent;

#[derive(Clone, Debug)]
pub struct IndexHandle {
  tx: mpsc::UnboundedSender<IndexCommand>,
}

impl IndexHandle {
  pub fn new(tx: mpsc::UnboundedSender<IndexCommand>) -> Self {
    Self { tx }
  }

  fn send(&self, command: IndexCommand) -> Result<(), SendError> {
    self.tx.send(command).map_err(|_| SendError::ActorGone)
  }

  /// Request a full rebuild
  pub fn initialise(&self) -> Result<(), SendError> {
    self.send(IndexCommand::Initialise)
  }

  /// Report a vault change
  pub fn notify(&self, event: VaultEvent) -> Result<(), SendError> {
    self.send(IndexCommand::Event(event))
  }

  /// Look up a task by id
  pub async fn resolve(&self, id: &TaskId) -> Result<Option<(Task, Metadata)>, SendError> {
    let (reply, rx) = oneshot::channel();
    self.send(IndexCommand::Resolve { id: id.clone(), reply })?;
    rx.await.map_err(|_| SendError::ActorGone)
  }

  pub async fn stats(&self) -> Result<IndexStats, SendError> {
    let (reply, rx) = oneshot::channel();
    self.send(IndexCommand::Stats { reply })?;
    rx.await.map_err(|_| SendError::ActorGone)
  }

  /// Wait until every dispatched extraction has landed and been published
  pub async fn settled(&self) -> Result<(), SendError> {
    let (reply, rx) = oneshot::channel();
    self.send(IndexCommand::Settled { reply })?;
    rx.await.map_err(|_| SendError::ActorGone)
  }

  pub fn shutdown(&self) -> Result<(), SendError> {
    self.send(IndexCommand::Shutdown)
  }
}

/// Error when sending to an actor
#[derive(Debug, Clone, thiserror::Error)]
pub enum SendError {
  #[error("Actor has shut down")]
  ActorGone,
}
