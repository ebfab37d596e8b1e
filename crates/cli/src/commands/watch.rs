//! Watch command - keep the index live and print every published snapshot

use std::path::Path;

use anyhow::{Context, Result};
use index::{SettingsSource, WatcherTask};
use tracing::{info, warn};

use super::Engine;
use crate::format::{format_stats, format_tasks};

pub async fn cmd_watch(root: &Path, quiet: bool) -> Result<()> {
  let engine = Engine::start(root);
  let mut updates = engine.store.subscribe();

  let watcher = WatcherTask::new(
    root,
    &engine.config.watcher,
    engine.store.handle(),
    engine.cancel.clone(),
  )
  .context("Failed to start vault watcher")?
  .with_settings(engine.settings.clone())
  .spawn();

  engine.store.initialise().context("Index actor stopped")?;
  info!(vault = %root.display(), "Watching vault");
  eprintln!("Watching {} (Ctrl-C to stop)", root.display());

  loop {
    tokio::select! {
      _ = tokio::signal::ctrl_c() => {
        info!("Interrupted, shutting down");
        break;
      }

      changed = updates.changed() => {
        if changed.is_err() {
          warn!("Index actor stopped");
          break;
        }
        let tasks = updates.borrow_and_update().clone();
        match engine.store.stats().await {
          Ok(stats) => println!("-- {}", format_stats(&stats)),
          Err(_) => println!("-- {} tasks", tasks.len()),
        }
        if !quiet {
          println!("{}", format_tasks(&tasks, engine.settings.current().show_filepath));
        }
      }
    }
  }

  engine.cancel.cancel();
  let _ = watcher.await;
  Ok(())
}
