//! taskdeck CLI - a kanban view over the markdown tasks in a vault

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod format;
mod logging;

use commands::{
  cmd_config_init, cmd_config_show, cmd_exclude_add, cmd_exclude_list, cmd_exclude_remove, cmd_list, cmd_task,
  cmd_watch, vault_root,
};
use logging::{init_cli_logging, init_watch_logging};
use taskdeck_core::Config;

#[derive(Parser)]
#[command(name = "taskdeck")]
#[command(about = "Kanban board over the markdown tasks in a vault")]
#[command(after_help = "\
QUICK START:
  taskdeck config init            # Write <vault>/.taskdeck/config.toml
  taskdeck list --board           # Show the board once
  taskdeck watch                  # Keep the board live as files change

TASK IDS:
  Any unique prefix of the id shown by `list` works, e.g. `taskdeck task done 3fa9`")]
struct Cli {
  /// Vault directory (default: current directory)
  #[arg(long, global = true, value_name = "DIR")]
  vault: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Index the vault once and print its tasks
  List {
    /// Output as JSON
    #[arg(long)]
    json: bool,
    /// Group tasks into board columns
    #[arg(long)]
    board: bool,
  },
  /// Watch the vault and print every updated snapshot
  Watch {
    /// Write logs to <vault>/.taskdeck/logs instead of stderr
    #[arg(long)]
    log_file: bool,
    /// Print only the summary line for each update
    #[arg(short, long)]
    quiet: bool,
  },
  /// Edit a single task
  Task {
    #[command(subcommand)]
    command: TaskCommand,
  },
  /// Manage excluded folders
  Exclude {
    #[command(subcommand)]
    command: ExcludeCommand,
  },
  /// Manage configuration
  Config {
    #[command(subcommand)]
    command: ConfigCommand,
  },
}

/// Subcommands for `taskdeck task`
#[derive(Subcommand)]
pub enum TaskCommand {
  /// Mark a task done
  Done { id: String },
  /// Mark a task not done
  Undo { id: String },
  /// Flip a task's done state
  Toggle { id: String },
  /// Move a task to a column (omit the column to clear it)
  Move { id: String, column: Option<String> },
  /// Replace a task's text
  Edit {
    id: String,
    #[arg(required = true, num_args = 1..)]
    text: Vec<String>,
  },
  /// Remove a task's line from its file
  Delete { id: String },
  /// Print the file and line of a task
  Locate { id: String },
}

/// Subcommands for `taskdeck exclude`
#[derive(Subcommand)]
enum ExcludeCommand {
  /// Exclude a folder (and everything below it)
  Add { folder: String },
  /// Stop excluding a folder
  Remove { folder: String },
  /// List excluded folders
  List,
}

/// Subcommands for `taskdeck config`
#[derive(Subcommand)]
enum ConfigCommand {
  /// Show the effective configuration
  Show,
  /// Write a commented config template into the vault
  Init,
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  let root = vault_root(cli.vault)?;

  let _guard = match &cli.command {
    Commands::Watch { log_file, .. } => {
      let config = Config::load_for_vault(&root);
      init_watch_logging(&root, &config.log, *log_file)
    }
    _ => {
      init_cli_logging();
      None
    }
  };

  match cli.command {
    Commands::List { json, board } => cmd_list(&root, json, board).await,
    Commands::Watch { quiet, .. } => cmd_watch(&root, quiet).await,
    Commands::Task { command } => cmd_task(&root, command).await,
    Commands::Exclude { command } => match command {
      ExcludeCommand::Add { folder } => cmd_exclude_add(&root, &folder).await,
      ExcludeCommand::Remove { folder } => cmd_exclude_remove(&root, &folder).await,
      ExcludeCommand::List => cmd_exclude_list(&root).await,
    },
    Commands::Config { command } => match command {
      ConfigCommand::Show => cmd_config_show(&root).await,
      ConfigCommand::Init => cmd_config_init(&root).await,
    },
  }
}
