//! Command implementations for the lineport CLI

pub mod check;
pub mod serve;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lineport_config::Config;

/// Load the config at `path`, or the first default path that exists
///
/// Returns the config and the path it came from. An explicit path that does
/// not exist is an error; with no path and no default file, defaults apply.
pub fn load_config(path: Option<&Path>) -> Result<(Config, Option<PathBuf>)> {
    if let Some(path) = path {
        if !path.exists() {
            anyhow::bail!("config file not found: {}", path.display());
        }
        let config = Config::from_file(path).context("failed to load configuration")?;
        return Ok((config, Some(path.to_path_buf())));
    }

    for candidate in ["configs/lineport.toml", "lineport.toml"] {
        let candidate = PathBuf::from(candidate);
        if candidate.exists() {
            let config = Config::from_file(&candidate).context("failed to load configuration")?;
            return Ok((config, Some(candidate)));
        }
    }

    Ok((Config::default(), None))
}
