//! Configuration and path resolution for the CLI.
//!
//! The index directory is resolved in this order:
//! 1. `--index-dir` flag
//! 2. `$SITESEARCH_INDEX_DIR` environment variable
//! 3. `index_dir` in the config file
//! 4. `index/` below the platform data directory

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use sitesearch_core::config::{GraphConfig, PageRankConfig, SearchConfig};
use sitesearch_core::EngineConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Config file looked up in the data directory when `--config` is absent
const CONFIG_FILENAME: &str = "sitesearch.toml";

/// Index directory name below the data directory
const INDEX_DIRNAME: &str = "index";

/// Environment variable for a custom index directory
pub const INDEX_DIR_ENV: &str = "SITESEARCH_INDEX_DIR";

/// Contents of `sitesearch.toml`.
///
/// ```toml
/// index_dir = "/var/lib/sitesearch"
///
/// [graph]
/// dangling = "redistribute"
///
/// [pagerank]
/// epochs = 40
///
/// [search.blend]
/// lexical = 0.7
/// pagerank = 0.3
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub index_dir: Option<PathBuf>,
    pub graph: GraphConfig,
    pub pagerank: PageRankConfig,
    pub search: SearchConfig,
}

impl FileConfig {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("Invalid configuration file")
    }

    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            graph: self.graph,
            pagerank: self.pagerank.clone(),
            search: self.search.clone(),
        }
    }
}

/// Returns the platform data directory.
///
/// - macOS: `~/Library/Application Support/org.sitesearch.sitesearch/`
/// - Linux: `~/.local/share/sitesearch/`
/// - Windows: `%APPDATA%\sitesearch\sitesearch\data\`
pub fn get_data_dir() -> Result<PathBuf> {
    ProjectDirs::from("org", "sitesearch", "sitesearch")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| anyhow!("Could not determine data directory"))
}

/// Loads the config file.
///
/// An explicit path must exist. Without one, `sitesearch.toml` in the data
/// directory is used when present and defaults apply otherwise.
pub fn load_config(explicit: Option<&Path>) -> Result<FileConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = get_data_dir()?.join(CONFIG_FILENAME);
            if !path.exists() {
                debug!("No config file at {}, using defaults", path.display());
                return Ok(FileConfig::default());
            }
            path
        }
    };

    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    FileConfig::parse(&text).with_context(|| format!("In {}", path.display()))
}

/// Resolves the index directory from the flag, the environment and the config.
pub fn index_dir(flag: Option<&PathBuf>, config: &FileConfig) -> Result<PathBuf> {
    let env = std::env::var(INDEX_DIR_ENV).ok();
    pick_index_dir(flag, env.as_deref(), config)
}

fn pick_index_dir(flag: Option<&PathBuf>, env: Option<&str>, config: &FileConfig) -> Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(dir.clone());
    }
    if let Some(dir) = env.filter(|dir| !dir.trim().is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    if let Some(dir) = &config.index_dir {
        return Ok(dir.clone());
    }
    Ok(get_data_dir()?.join(INDEX_DIRNAME))
}
