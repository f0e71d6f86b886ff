//! Common paths for Dostana data storage
//!
//! All Dostana data is stored under ~/.config/dostana/ on all platforms:
//! - config.toml - User configuration
//! - dostana.sqlite - Push subscription and notification history

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Get the Dostana data directory (~/.config/dostana/)
pub fn dostana_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    let dir = home.join(".config").join("dostana");
    fs::create_dir_all(&dir).context("Failed to create dostana directory")?;
    Ok(dir)
}

/// Get the config file path (~/.config/dostana/config.toml)
pub fn config_path() -> Result<PathBuf> {
    Ok(dostana_dir()?.join("config.toml"))
}

/// Get the database file path (~/.config/dostana/dostana.sqlite)
pub fn database_path() -> Result<PathBuf> {
    Ok(dostana_dir()?.join("dostana.sqlite"))
}
