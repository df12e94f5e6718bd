//! Configuration resolution: CLI arguments merged with an optional TOML
//! file. File values override CLI values where present.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI arguments that participate in config resolution. Mirrors the clap
/// struct in `main.rs`.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub db_path: PathBuf,
    pub profiles_dir: PathBuf,
    pub uploads_dir: PathBuf,
    pub history_limit: usize,
    pub market: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub db_path: Option<PathBuf>,
    pub profiles_dir: Option<PathBuf>,
    pub uploads_dir: Option<PathBuf>,
    pub history_limit: Option<usize>,
    pub market: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Sqlite history database file.
    pub db_path: PathBuf,
    /// Directory of per-user profile documents.
    pub profiles_dir: PathBuf,
    /// Directory for transient upload files.
    pub uploads_dir: PathBuf,
    /// Default entry count for limited history reads.
    pub history_limit: usize,
    /// Optional market code forwarded to the recommendation lookup.
    pub market: Option<String>,
}

impl AppConfig {
    pub fn resolve(cli: &CliConfig, file: Option<FileConfig>) -> Self {
        let file = file.unwrap_or_default();
        AppConfig {
            db_path: file.db_path.unwrap_or_else(|| cli.db_path.clone()),
            profiles_dir: file.profiles_dir.unwrap_or_else(|| cli.profiles_dir.clone()),
            uploads_dir: file.uploads_dir.unwrap_or_else(|| cli.uploads_dir.clone()),
            history_limit: file.history_limit.unwrap_or(cli.history_limit),
            market: file.market.or_else(|| cli.market.clone()),
        }
    }
}
