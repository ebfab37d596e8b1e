//! TasksStore - the engine's entry point for hosts
//!
//! Spawns the [`IndexActor`] and bundles what a host needs: the handle for
//! feeding events, the snapshot subscription, and the task actions.

use std::sync::Arc;

use tokio::{sync::mpsc, sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
  actions::TaskActions,
  actor::{IndexActor, IndexHandle, IndexStats, SendError},
  parser::{MarkdownTaskParser, TaskParser},
  publisher::{Publisher, Snapshot},
  settings::SettingsSource,
  vault::FileStore,
};

pub struct TasksStore {
  handle: IndexHandle,
  tasks: watch::Receiver<Snapshot>,
  actions: TaskActions,
  actor: JoinHandle<()>,
}

impl TasksStore {
  /// Spawn the engine with the markdown grammar. Must be called inside a
  /// tokio runtime. Nothing is indexed until [`TasksStore::initialise`].
  pub fn spawn(store: Arc<dyn FileStore>, settings: Arc<dyn SettingsSource>, cancel: CancellationToken) -> Self {
    Self::spawn_with_parser(store, settings, Arc::new(MarkdownTaskParser), cancel)
  }

  pub fn spawn_with_parser(
    store: Arc<dyn FileStore>,
    settings: Arc<dyn SettingsSource>,
    parser: Arc<dyn TaskParser>,
    cancel: CancellationToken,
  ) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = IndexHandle::new(tx);
    let publisher = Publisher::new();
    let tasks = publisher.subscribe();

    let actor = IndexActor::new(store.clone(), settings.clone(), parser, publisher, rx, cancel);
    let actor = tokio::spawn(actor.run());

    Self {
      actions: TaskActions::new(handle.clone(), store, settings),
      handle,
      tasks,
      actor,
    }
  }

  /// Rebuild the index from every in-scope file
  pub fn initialise(&self) -> Result<(), SendError> {
    self.handle.initialise()
  }

  pub fn handle(&self) -> IndexHandle {
    self.handle.clone()
  }

  pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
    self.tasks.clone()
  }

  /// Latest published snapshot
  pub fn snapshot(&self) -> Snapshot {
    self.tasks.borrow().clone()
  }

  pub fn actions(&self) -> &TaskActions {
    &self.actions
  }

  pub async fn stats(&self) -> Result<IndexStats, SendError> {
    self.handle.stats().await
  }

  /// Wait for in-flight extractions and the pending publish
  pub async fn settled(&self) -> Result<(), SendError> {
    self.handle.settled().await
  }

  /// Stop the actor, publishing anything pending first
  pub async fn shutdown(self) {
    let _ = self.handle.shutdown();
    let _ = self.actor.await;
  }
}
