//! Settings access for the engine
//!
//! The engine never caches settings: every decision asks a
//! [`SettingsSource`] for the current value.

use std::sync::Arc;

use taskdeck_core::{Settings, ValidationResult};
use tokio::sync::watch;

/// Capability returning the settings in force right now
pub trait SettingsSource: Send + Sync {
  fn current(&self) -> Settings;
}

impl<F> SettingsSource for F
where
  F: Fn() -> Settings + Send + Sync,
{
  fn current(&self) -> Settings {
    self()
  }
}

/// Observable, mutable settings shared between the engine and its host
#[derive(Clone)]
pub struct SettingsStore {
  tx: Arc<watch::Sender<Settings>>,
}

impl SettingsStore {
  pub fn new(settings: Settings) -> Self {
    let (tx, _) = watch::channel(settings);
    Self { tx: Arc::new(tx) }
  }

  pub fn subscribe(&self) -> watch::Receiver<Settings> {
    self.tx.subscribe()
  }

  pub fn set(&self, settings: Settings) {
    self.tx.send_replace(settings);
  }

  /// Apply an infallible change
  pub fn update(&self, f: impl FnOnce(&mut Settings)) {
    self.tx.send_modify(f);
  }

  /// Apply a validated change; nothing is stored when `f` fails
  pub fn try_update<R>(&self, f: impl FnOnce(&mut Settings) -> ValidationResult<R>) -> ValidationResult<R> {
    let mut draft = self.current();
    let result = f(&mut draft)?;
    self.tx.send_replace(draft);
    Ok(result)
  }
}

impl Default for SettingsStore {
  fn default() -> Self {
    Self::new(Settings::default())
  }
}

impl SettingsSource for SettingsStore {
  fn current(&self) -> Settings {
    self.tx.borrow().clone()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_try_update_commits_only_on_success() {
    let store = SettingsStore::default();

    let added = store.try_update(|s| s.add_excluded_folder("/archive/")).unwrap();
    assert!(added);
    assert_eq!(store.current().excluded_folders, vec!["archive".to_string()]);

    let err = store.try_update(|s| {
      s.add_excluded_folder("keep")?;
      s.add_excluded_folder("../escape")
    });
    assert!(err.is_err());
    assert_eq!(store.current().excluded_folders, vec!["archive".to_string()]);
  }

  #[test]
  fn test_closure_source() {
    let source = || Settings {
      consolidate_tags: true,
      ..Default::default()
    };
    assert!(SettingsSource::current(&source).consolidate_tags);
  }

  #[test]
  fn test_subscribers_see_updates() {
    let store = SettingsStore::default();
    let mut rx = store.subscribe();
    store.update(|s| s.folder = "projects".to_string());
    assert!(rx.has_changed().unwrap());
    assert_eq!(rx.borrow_and_update().folder, "projects");
  }
}
