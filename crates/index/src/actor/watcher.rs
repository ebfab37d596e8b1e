//! WatcherTask - turns filesystem notifications into vault events
//!
//! notify's callback runs on its own thread and forwards raw events over a
//! channel with `blocking_send`. The async loop coalesces them per path and
//! hands settled changes to the [`IndexHandle`].
//!
//! Directory moves and creations cannot be mapped to single files, so they
//! request a full rebuild instead. When a [`SettingsStore`] is attached the
//! vault config file is watched too and reloaded into it on change.
//!
//! Runs until the `CancellationToken` fires or the notify watcher goes away.

use std::{
  collections::HashMap,
  path::{Path, PathBuf},
  time::{Duration, Instant},
};

use notify::{
  Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
  event::{CreateKind, ModifyKind, RemoveKind, RenameMode},
};
use taskdeck_core::{Config, WatcherConfig};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::handle::IndexHandle;
use crate::{
  settings::{SettingsSource, SettingsStore},
  vault::{VaultEvent, is_markdown, relative_handle},
};

#[derive(Debug, thiserror::Error)]
pub enum WatcherError {
  #[error("Failed to initialize watcher: {0}")]
  Init(#[source] notify::Error),

  #[error("Failed to watch path: {0}")]
  Watch(#[source] notify::Error),
}

// ============================================================================
// Pending Changes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum ChangeKind {
  Created,
  Modified,
  Deleted,
  Renamed { from: PathBuf },
  /// A directory appeared, vanished or moved
  Rescan,
  /// The vault config file changed
  Config,
}

#[derive(Debug)]
struct PendingChange {
  kind: ChangeKind,
  last_event: Instant,
}

impl PendingChange {
  fn new(kind: ChangeKind) -> Self {
    Self {
      kind,
      last_event: Instant::now(),
    }
  }

  fn update(&mut self, kind: ChangeKind) {
    self.last_event = Instant::now();

    match (&self.kind, &kind) {
      (ChangeKind::Created, ChangeKind::Modified) => {
        trace!("Coalescing create+modify -> create");
      }
      (ChangeKind::Deleted, ChangeKind::Created) => {
        self.kind = ChangeKind::Modified;
        trace!("Coalescing delete+create -> modified");
      }
      (ChangeKind::Created, ChangeKind::Deleted) => {
        self.kind = ChangeKind::Deleted;
        trace!("Coalescing create+delete -> delete");
      }
      (ChangeKind::Renamed { .. }, ChangeKind::Modified) => {
        trace!("Coalescing rename+modify -> rename");
      }
      (ChangeKind::Rescan, _) | (ChangeKind::Config, _) => {}
      _ => self.kind = kind,
    }
  }
}

// ============================================================================
// WatcherTask
// ============================================================================

pub struct WatcherTask {
  root: PathBuf,
  config_path: PathBuf,
  debounce: Duration,
  index: IndexHandle,
  settings: Option<SettingsStore>,
  cancel: CancellationToken,
  // Dropping the notify watcher stops event delivery
  _watcher: RecommendedWatcher,
  event_rx: mpsc::Receiver<Result<Event, notify::Error>>,
}

impl WatcherTask {
  pub fn new(
    root: &Path,
    config: &WatcherConfig,
    index: IndexHandle,
    cancel: CancellationToken,
  ) -> Result<Self, WatcherError> {
    info!(root = %root.display(), "Initializing vault watcher");
    // notify reports canonical paths
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());

    let (event_tx, event_rx) = mpsc::channel::<Result<Event, notify::Error>>(256);
    let notify_config = NotifyConfig::default().with_poll_interval(Duration::from_secs(config.poll_secs));

    let mut watcher = RecommendedWatcher::new(
      move |res| {
        // Full or closed channel drops the event
        let _ = event_tx.blocking_send(res);
      },
      notify_config,
    )
    .map_err(WatcherError::Init)?;

    watcher
      .watch(&root, RecursiveMode::Recursive)
      .map_err(WatcherError::Watch)?;

    Ok(Self {
      config_path: Config::vault_config_path(&root),
      root,
      debounce: Duration::from_millis(config.debounce_ms),
      index,
      settings: None,
      cancel,
      _watcher: watcher,
      event_rx,
    })
  }

  /// Reload the vault config into `settings` whenever the file changes
  pub fn with_settings(mut self, settings: SettingsStore) -> Self {
    self.settings = Some(settings);
    self
  }

  pub fn spawn(self) -> tokio::task::JoinHandle<()> {
    tokio::spawn(self.run())
  }

  pub async fn run(mut self) {
    info!(root = %self.root.display(), "WatcherTask started");

    let mut pending: HashMap<PathBuf, PendingChange> = HashMap::new();
    let mut debounce_interval = tokio::time::interval(self.debounce.max(Duration::from_millis(10)));

    loop {
      tokio::select! {
        biased;

        _ = self.cancel.cancelled() => {
          info!("WatcherTask shutting down (cancelled)");
          break;
        }

        event = self.event_rx.recv() => {
          match event {
            Some(Ok(event)) => process_event(&mut pending, event, &self.config_path),
            Some(Err(e)) => warn!(error = %e, "Watcher error"),
            None => {
              info!("WatcherTask shutting down (channel closed)");
              break;
            }
          }
        }

        _ = debounce_interval.tick() => {
          self.flush_settled(&mut pending);
        }
      }
    }

    if !pending.is_empty() {
      debug!(pending = pending.len(), "Flushing remaining changes on shutdown");
      let changes: Vec<_> = pending.drain().collect();
      self.send_changes(changes);
    }

    info!(root = %self.root.display(), "WatcherTask stopped");
  }

  fn flush_settled(&self, pending: &mut HashMap<PathBuf, PendingChange>) {
    let now = Instant::now();
    let settled: Vec<PathBuf> = pending
      .iter()
      .filter(|(_, change)| now.duration_since(change.last_event) >= self.debounce)
      .map(|(path, _)| path.clone())
      .collect();

    let changes = settled
      .into_iter()
      .filter_map(|path| pending.remove(&path).map(|change| (path, change)))
      .collect();
    self.send_changes(changes);
  }

  /// Forward file events, then at most one rebuild for the whole batch
  fn send_changes(&self, changes: Vec<(PathBuf, PendingChange)>) {
    let mut rebuild = false;

    for (path, change) in changes {
      match change.kind {
        ChangeKind::Config => rebuild |= self.reload_settings(),
        ChangeKind::Rescan => {
          if relative_handle(&self.root, &path).is_some() {
            debug!(path = %path.display(), "Directory changed, rebuilding");
            rebuild = true;
          }
        }
        kind => {
          if let Some(event) = vault_event(&self.root, &path, kind) {
            self.deliver(event);
          }
        }
      }
    }

    if rebuild && let Err(e) = self.index.initialise() {
      warn!(error = %e, "Failed to request rebuild");
    }
  }

  /// Returns true when the board settings changed
  fn reload_settings(&self) -> bool {
    let Some(settings) = &self.settings else {
      return false;
    };

    let board = Config::load_for_vault(&self.root).board;
    if board == settings.current() {
      trace!("Config file touched, board settings unchanged");
      return false;
    }

    info!(path = %self.config_path.display(), "Config file changed, reloading board settings");
    settings.set(board);
    true
  }

  fn deliver(&self, event: VaultEvent) {
    if let Err(e) = self.index.notify(event) {
      warn!(error = %e, "Failed to deliver vault event");
    }
  }
}

/// Map a settled file change to the event the index sees
fn vault_event(root: &Path, path: &Path, kind: ChangeKind) -> Option<VaultEvent> {
  let file = relative_handle(root, path);

  let event = match (kind, file) {
    (ChangeKind::Created, Some(file)) => VaultEvent::Created(file),
    (ChangeKind::Modified, Some(file)) => VaultEvent::Modified(file),
    (ChangeKind::Deleted, Some(file)) => VaultEvent::Deleted(file),
    (ChangeKind::Renamed { from }, to) => match (relative_handle(root, &from), to) {
      (Some(from), Some(to)) => VaultEvent::Renamed { from, to },
      // Moved in from a hidden folder
      (None, Some(to)) => VaultEvent::Created(to),
      // Moved into a hidden folder such as .trash
      (Some(from), None) => VaultEvent::Deleted(from),
      (None, None) => return None,
    },
    (_, None) => {
      trace!(path = %path.display(), "Change outside the vault");
      return None;
    }
    (ChangeKind::Rescan | ChangeKind::Config, Some(_)) => return None,
  };
  Some(event)
}

/// Fold one notify event into the pending map
fn process_event(pending: &mut HashMap<PathBuf, PendingChange>, event: Event, config_path: &Path) {
  if let EventKind::Modify(ModifyKind::Name(RenameMode::Both)) = event.kind
    && let [from, to, ..] = event.paths.as_slice()
  {
    if to == config_path {
      record(pending, to, ChangeKind::Config);
    } else if to.is_dir() {
      // Either side may be hidden; each is checked against the vault later
      debug!(from = %from.display(), to = %to.display(), "Directory renamed");
      record(pending, from, ChangeKind::Rescan);
      record(pending, to, ChangeKind::Rescan);
    } else if is_markdown(to) {
      debug!(from = %from.display(), to = %to.display(), "Renamed");
      pending.remove(from);
      pending.insert(to.clone(), PendingChange::new(ChangeKind::Renamed { from: from.clone() }));
    } else if is_markdown(from) {
      record(pending, from, ChangeKind::Deleted);
    }
    return;
  }

  for path in &event.paths {
    if path == config_path {
      record(pending, path, ChangeKind::Config);
      continue;
    }

    let kind = match event.kind {
      EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => ChangeKind::Created,
      EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => ChangeKind::Deleted,
      // Backends that cannot tell the two sides of a rename apart
      EventKind::Modify(ModifyKind::Name(_)) if path.exists() => ChangeKind::Created,
      EventKind::Modify(ModifyKind::Name(_)) => ChangeKind::Deleted,
      EventKind::Modify(_) => ChangeKind::Modified,
      EventKind::Access(_) | EventKind::Any | EventKind::Other => {
        trace!(path = %path.display(), kind = ?event.kind, "Ignoring event");
        continue;
      }
    };

    if is_markdown(path) && !path.is_dir() {
      record(pending, path, kind);
    } else if is_directory_change(&event.kind, path) {
      trace!(path = %path.display(), kind = ?event.kind, "Directory change");
      record(pending, path, ChangeKind::Rescan);
    } else {
      trace!(path = %path.display(), "Skipping non-markdown path");
    }
  }
}

/// Whether an event on a non-markdown path may have moved markdown files.
///
/// A path renamed away no longer exists, so it is not known whether it was a
/// folder; it counts as one.
fn is_directory_change(kind: &EventKind, path: &Path) -> bool {
  match kind {
    EventKind::Create(CreateKind::Folder) | EventKind::Remove(RemoveKind::Folder) => true,
    EventKind::Create(_) => path.is_dir(),
    EventKind::Modify(ModifyKind::Name(_)) => path.is_dir() || !path.exists(),
    _ => false,
  }
}

fn record(pending: &mut HashMap<PathBuf, PendingChange>, path: &Path, kind: ChangeKind) {
  if let Some(existing) = pending.get_mut(path) {
    existing.update(kind);
  } else {
    pending.insert(path.to_path_buf(), PendingChange::new(kind));
  }
}
