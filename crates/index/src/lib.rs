//! Task index engine
//!
//! Keeps an in-memory set of markdown tasks in step with a vault:
//!
//! ```text
//! vault events -> filter -> extract (async) -> SyncIndex -> Publisher -> snapshots
//! ```
//!
//! [`TasksStore`] wires the pieces together for a host.

pub mod actions;
pub mod actor;
pub mod board;
pub mod extract;
pub mod filter;
pub mod parser;
pub mod publisher;
pub mod settings;
pub mod store;
pub mod sync;
pub mod vault;

pub use actions::{ActionError, TaskActions, TaskLocation};
pub use actor::{IndexActor, IndexCommand, IndexHandle, IndexStats, SendError, WatcherError, WatcherTask};
pub use board::{Board, BoardColumn, ColumnKind};
pub use extract::{ExtractError, extract_file};
pub use filter::should_handle;
pub use parser::{ExtractConfig, MarkdownTaskParser, TaskParser, parse_tasks};
pub use publisher::{DebounceState, PUBLISH_DEBOUNCE, Publisher, Snapshot};
pub use settings::{SettingsSource, SettingsStore};
pub use store::TasksStore;
pub use sync::{MergeStats, SyncIndex};
pub use vault::{FileStore, FsVault, MemoryVault, StoreError, VaultEvent};
