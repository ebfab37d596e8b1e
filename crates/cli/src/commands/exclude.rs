//! Exclude commands - manage the excluded folder list in the vault config

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use taskdeck_core::{Config, ScopeOption};

pub async fn cmd_exclude_add(root: &Path, folder: &str) -> Result<()> {
  let mut config = Config::load_for_vault(root);

  let added = config
    .board
    .add_excluded_folder(folder)
    .map_err(|e| anyhow!("Invalid folder '{}': {}", folder, e))?;
  if !added {
    println!("Already excluded (or empty): {}", folder);
    return Ok(());
  }

  let path = config.save_for_vault(root).context("Failed to save vault config")?;
  let normalized = config.board.excluded_folders.last().map_or(folder, String::as_str);
  println!("Excluded {} (saved to {})", normalized, path.display());
  if config.board.scope == ScopeOption::Folder {
    println!("Note: exclusions only apply when scope = \"everywhere\"");
  }
  Ok(())
}

pub async fn cmd_exclude_remove(root: &Path, folder: &str) -> Result<()> {
  let mut config = Config::load_for_vault(root);

  if !config.board.remove_excluded_folder(folder) {
    println!("Not excluded: {}", folder);
    return Ok(());
  }

  let path = config.save_for_vault(root).context("Failed to save vault config")?;
  println!("Removed exclusion {} (saved to {})", folder, path.display());
  Ok(())
}

pub async fn cmd_exclude_list(root: &Path) -> Result<()> {
  let config = Config::load_for_vault(root);
  if config.board.excluded_folders.is_empty() {
    println!("No excluded folders");
  }
  for folder in &config.board.excluded_folders {
    println!("{}", folder);
  }
  Ok(())
}
