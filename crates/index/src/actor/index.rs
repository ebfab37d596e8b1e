//! IndexActor - owns the task index and applies vault changes to it
//!
//! Extractions run as spawned tasks; their results come back over an
//! internal channel so every index mutation happens on the actor's loop.
//!
//! # Newest wins
//!
//! Each dispatched extraction carries the rebuild generation and a sequence
//! number. A result is merged only when its generation is current and its
//! sequence is the newest dispatched for that file. Deleting a file retires
//! its outstanding sequence, so a late extraction can never resurrect it.

use std::{collections::HashMap, sync::Arc};

use taskdeck_core::{FileHandle, Settings};
use tokio::{
  sync::{mpsc, oneshot},
  time::{Instant, sleep_until},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::message::{Extraction, IndexCommand, IndexStats};
use crate::{
  extract::extract_file,
  filter::should_handle,
  parser::{ExtractConfig, TaskParser},
  publisher::Publisher,
  settings::SettingsSource,
  sync::SyncIndex,
  vault::{FileStore, VaultEvent},
};

pub struct IndexActor {
  index: SyncIndex,
  publisher: Publisher,
  store: Arc<dyn FileStore>,
  settings: Arc<dyn SettingsSource>,
  parser: Arc<dyn TaskParser>,
  commands: mpsc::UnboundedReceiver<IndexCommand>,
  results_tx: mpsc::UnboundedSender<Extraction>,
  results_rx: mpsc::UnboundedReceiver<Extraction>,
  cancel: CancellationToken,
  generation: u64,
  next_seq: u64,
  /// Newest dispatched sequence per file, removed once applied or retired
  latest: HashMap<FileHandle, u64>,
  in_flight: usize,
  /// Index was cleared by a rebuild and no publish has been armed since
  cleared_unpublished: bool,
  waiters: Vec<oneshot::Sender<()>>,
}

impl IndexActor {
  pub fn new(
    store: Arc<dyn FileStore>,
    settings: Arc<dyn SettingsSource>,
    parser: Arc<dyn TaskParser>,
    publisher: Publisher,
    commands: mpsc::UnboundedReceiver<IndexCommand>,
    cancel: CancellationToken,
  ) -> Self {
    let (results_tx, results_rx) = mpsc::unbounded_channel();
    Self {
      index: SyncIndex::new(),
      publisher,
      store,
      settings,
      parser,
      commands,
      results_tx,
      results_rx,
      cancel,
      generation: 0,
      next_seq: 0,
      latest: HashMap::new(),
      in_flight: 0,
      cleared_unpublished: false,
      waiters: Vec::new(),
    }
  }

  /// Run until cancelled, shut down, or every handle is dropped
  pub async fn run(mut self) {
    info!("IndexActor started");

    loop {
      let deadline = self.publisher.deadline();

      tokio::select! {
        biased;

        _ = self.cancel.cancelled() => {
          info!("IndexActor shutting down (cancelled)");
          break;
        }

        _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
          self.publisher.fire(&self.index);
        }

        Some(extraction) = self.results_rx.recv() => {
          self.apply(extraction);
        }

        command = self.commands.recv() => {
          match command {
            Some(IndexCommand::Shutdown) => {
              info!("IndexActor shutting down (requested)");
              break;
            }
            Some(command) => self.handle_command(command).await,
            None => {
              info!("IndexActor shutting down (all handles dropped)");
              break;
            }
          }
        }
      }

      self.release_waiters();
    }

    if self.publisher.is_pending() {
      self.publisher.fire(&self.index);
    }
    self.release_waiters();
    info!(tasks = self.index.len(), "IndexActor stopped");
  }

  async fn handle_command(&mut self, command: IndexCommand) {
    match command {
      IndexCommand::Initialise => self.rebuild().await,
      IndexCommand::Event(event) => self.handle_event(event).await,
      IndexCommand::Resolve { id, reply } => {
        let _ = reply.send(self.index.resolve(&id));
      }
      IndexCommand::Stats { reply } => {
        let _ = reply.send(self.stats());
      }
      IndexCommand::Settled { reply } => self.waiters.push(reply),
      IndexCommand::Shutdown => {}
    }
  }

  async fn handle_event(&mut self, event: VaultEvent) {
    match event {
      VaultEvent::Created(file) | VaultEvent::Modified(file) => {
        let settings = self.settings.current();
        let filter = settings.filename_filter();
        if should_handle(&file, filter.as_deref(), &settings) {
          debug!(file = %file, "File changed, re-extracting");
          self.dispatch(file, ExtractConfig::from_settings(&settings));
        } else {
          trace!(file = %file, "Ignoring change outside board scope");
        }
      }
      VaultEvent::Deleted(file) => self.remove(&file),
      VaultEvent::Renamed { from, to } => {
        debug!(from = %from, to = %to, "File renamed, rebuilding");
        self.rebuild().await;
      }
    }
  }

  /// Clear everything and extract every in-scope file
  async fn rebuild(&mut self) {
    self.generation += 1;
    self.latest.clear();
    self.index.clear();

    let files = match self.store.markdown_files().await {
      Ok(files) => files,
      Err(e) => {
        error!(error = %e, "Failed to list vault files");
        self.publisher.notify_mutated(Instant::now());
        return;
      }
    };

    // Settings are read after the listing so the filter reflects the latest value
    let settings: Settings = self.settings.current();
    let filter = settings.filename_filter();
    let config = ExtractConfig::from_settings(&settings);

    let mut dispatched = 0usize;
    for file in files {
      if should_handle(&file, filter.as_deref(), &settings) {
        self.dispatch(file, config.clone());
        dispatched += 1;
      }
    }

    // The first merged extraction arms the publish; until then subscribers
    // keep the previous snapshot instead of the cleared index
    if dispatched == 0 {
      self.publisher.notify_mutated(Instant::now());
    } else {
      self.cleared_unpublished = true;
    }

    info!(generation = self.generation, files = dispatched, "Rebuilding task index");
  }

  fn remove(&mut self, file: &FileHandle) {
    // Retire any extraction still in flight for this file
    self.latest.remove(file);
    let removed = self.index.remove_file(file);
    debug!(file = %file, removed, "File deleted");
    if removed > 0 {
      self.publisher.notify_mutated(Instant::now());
    }
  }

  fn dispatch(&mut self, file: FileHandle, config: ExtractConfig) {
    self.next_seq += 1;
    let seq = self.next_seq;
    let generation = self.generation;
    self.latest.insert(file.clone(), seq);
    self.in_flight += 1;

    let store = self.store.clone();
    let parser = self.parser.clone();
    let results = self.results_tx.clone();
    tokio::spawn(async move {
      let outcome = extract_file(store.as_ref(), parser.as_ref(), &file, &config).await;
      let _ = results.send(Extraction {
        generation,
        seq,
        file,
        outcome,
      });
    });
  }

  fn apply(&mut self, extraction: Extraction) {
    self.in_flight = self.in_flight.saturating_sub(1);

    let Extraction {
      generation,
      seq,
      file,
      outcome,
    } = extraction;

    if generation != self.generation || self.latest.get(&file) != Some(&seq) {
      debug!(file = %file, seq, generation, "Discarding superseded extraction");
      return;
    }
    self.latest.remove(&file);

    match outcome {
      Ok(tasks) => {
        let stats = self.index.merge(&file, tasks);
        trace!(file = %file, removed = stats.removed, inserted = stats.inserted, "Merged extraction");
        debug_assert!(self.index.check_consistency().is_ok());
        self.cleared_unpublished = false;
        self.publisher.notify_mutated(Instant::now());
      }
      Err(e) => {
        warn!(file = %file, error = %e, "Extraction failed, keeping previous tasks");
        if std::mem::take(&mut self.cleared_unpublished) {
          self.publisher.notify_mutated(Instant::now());
        }
      }
    }
  }

  fn stats(&self) -> IndexStats {
    IndexStats {
      tasks: self.index.len(),
      metadata: self.index.metadata_count(),
      files: self.index.file_count(),
      in_flight: self.in_flight,
      generation: self.generation,
      published: self.publisher.published(),
    }
  }

  fn release_waiters(&mut self) {
    if self.waiters.is_empty() || self.in_flight > 0 || self.publisher.is_pending() {
      return;
    }
    for waiter in self.waiters.drain(..) {
      let _ = waiter.send(());
    }
  }
}
