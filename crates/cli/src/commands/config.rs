//! Config commands

use std::path::Path;

use anyhow::{Result, bail};
use taskdeck_core::Config;

pub async fn cmd_config_show(root: &Path) -> Result<()> {
  let config = Config::load_for_vault(root);

  let vault_config = Config::vault_config_path(root);
  let user_config = Config::user_config_path();

  println!("Effective configuration for: {}", root.display());
  println!();

  if vault_config.exists() {
    println!("Using vault config: {}", vault_config.display());
  } else if let Some(user_path) = user_config.filter(|p| p.exists()) {
    println!("Using user config: {}", user_path.display());
  } else {
    println!("Using default configuration (no config file found)");
  }
  println!();

  println!("{}", toml::to_string_pretty(&config)?);
  Ok(())
}

pub async fn cmd_config_init(root: &Path) -> Result<()> {
  let path = Config::vault_config_path(root);
  if path.exists() {
    bail!("Config file already exists: {} (delete it to regenerate)", path.display());
  }

  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)?;
  }
  std::fs::write(&path, Config::generate_template())?;

  println!("Created vault config: {}", path.display());
  println!("Edit the file to customize columns, scope and markers.");
  Ok(())
}
