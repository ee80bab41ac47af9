//! Where the CLI keeps `config.toml` and `state.json`
//!
//! `HASHICUPS_CONFIG_DIR` / `HASHICUPS_STATE_DIR` win, then the XDG base
//! directories, then `~/.config/hashicups` and `~/.local/state/hashicups`.

use anyhow::{Context, Result};
use std::path::PathBuf;

const ENV_CONFIG_DIR: &str = "HASHICUPS_CONFIG_DIR";
const ENV_STATE_DIR: &str = "HASHICUPS_STATE_DIR";

const APP_DIR: &str = "hashicups";

/// Resolve one base directory: explicit override, XDG variable, then `~/<fallback>`
fn resolve(override_var: &str, xdg_var: &str, fallback: &[&str]) -> Result<PathBuf> {
    let path = if let Ok(dir) = std::env::var(override_var) {
        expand(&dir)
    } else if let Ok(base) = std::env::var(xdg_var) {
        PathBuf::from(base).join(APP_DIR)
    } else {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        fallback
            .iter()
            .fold(home, |path, part| path.join(part))
            .join(APP_DIR)
    };
    log::debug!("{override_var} resolved to {}", path.display());
    Ok(path)
}

pub fn config_dir() -> Result<PathBuf> {
    resolve(ENV_CONFIG_DIR, "XDG_CONFIG_HOME", &[".config"])
}

pub fn state_dir() -> Result<PathBuf> {
    resolve(ENV_STATE_DIR, "XDG_STATE_HOME", &[".local", "state"])
}

pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

pub fn state_file() -> Result<PathBuf> {
    Ok(state_dir()?.join("state.json"))
}

/// Expand `~` and `$VARS`; the input is returned as-is when expansion fails
pub fn expand(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(path),
    }
}
