//! Actors driving the task index
//!
//! - [`IndexActor`]: owns the [`crate::SyncIndex`] and the publisher; all
//!   index mutation happens on its loop
//! - [`WatcherTask`]: watches a vault directory and feeds events to the actor
//!
//! Both are reached through an [`IndexHandle`].

pub mod handle;
pub mod index;
pub mod message;
pub mod watcher;

pub use handle::{IndexHandle, SendError};
pub use index::IndexActor;
pub use message::{IndexCommand, IndexStats};
pub use watcher::{WatcherError, WatcherTask};
