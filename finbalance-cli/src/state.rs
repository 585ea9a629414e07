use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$FINBALANCE_HOME`, or `~/.finbalance`
pub fn finbalance_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("FINBALANCE_HOME") {
        if !dir.is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".finbalance"))
}

pub fn ensure_finbalance_home() -> Result<PathBuf> {
    let dir = finbalance_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

pub fn default_db_path() -> Result<PathBuf> {
    Ok(ensure_finbalance_home()?.join("finbalance.db"))
}
