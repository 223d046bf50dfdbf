use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Hosted origin the cache controller fronts. Override with `JUICY_ORIGIN`
/// for self-hosted deployments.
pub const DEFAULT_ORIGIN: &str = "https://juicy-tools.github.io/juicy";

pub struct Config {
    pub storage_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub origin: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "juicy").context("Could not determine home directory")?;

        let storage_dir = proj_dirs.data_dir().join("storage");
        std::fs::create_dir_all(&storage_dir).with_context(|| {
            format!("Failed to create data directory: {}", storage_dir.display())
        })?;

        let cache_dir = proj_dirs.cache_dir().to_path_buf();
        std::fs::create_dir_all(&cache_dir).with_context(|| {
            format!("Failed to create cache directory: {}", cache_dir.display())
        })?;

        let origin = std::env::var("JUICY_ORIGIN")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ORIGIN.to_string());

        Ok(Config {
            storage_dir,
            cache_dir,
            origin,
        })
    }
}
