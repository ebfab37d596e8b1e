//! List command - one rebuild, print the snapshot

use std::path::Path;

use anyhow::Result;
use index::Board;
use tracing::debug;

use super::Engine;
use crate::format::{format_board, format_tasks};

pub async fn cmd_list(root: &Path, json: bool, board: bool) -> Result<()> {
  let engine = Engine::start(root);
  engine.load().await?;

  let tasks = engine.store.snapshot();
  let settings = &engine.config.board;
  debug!(tasks = tasks.len(), "Loaded tasks");

  if board {
    let board = Board::from_snapshot(&tasks, settings);
    if json {
      println!("{}", serde_json::to_string_pretty(&board)?);
    } else {
      print!("{}", format_board(&board, settings.show_filepath));
    }
  } else if json {
    println!("{}", serde_json::to_string_pretty(&tasks[..])?);
  } else {
    println!("{}", format_tasks(&tasks, settings.show_filepath));
  }

  engine.cancel.cancel();
  Ok(())
}
