use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `~/.weekplan`, holding the config and calendar credentials.
pub fn weekplan_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".weekplan"))
}

pub fn ensure_weekplan_home() -> Result<PathBuf> {
    let dir = weekplan_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
