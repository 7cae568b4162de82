use crate::DbError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_SEEK_CHUNK_LENGTH: usize = 100;
pub const DEFAULT_ROWID_ALIAS: &str = "_rowid_";

/// Tunables for row caches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    /// How many rows a query grid pulls from its cursor per seek-ahead.
    #[serde(default = "default_seek_chunk_length")]
    pub seek_chunk_length: usize,

    /// Base name the table rowid is selected under. Underscores are prepended
    /// until it no longer collides with a real column.
    #[serde(default = "default_rowid_alias")]
    pub rowid_alias: String,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            seek_chunk_length: DEFAULT_SEEK_CHUNK_LENGTH,
            rowid_alias: DEFAULT_ROWID_ALIAS.to_string(),
        }
    }
}

impl GridConfig {
    pub fn with_seek_chunk_length(mut self, length: usize) -> Self {
        self.seek_chunk_length = length;
        self
    }

    /// Chunk length, never below one row.
    pub fn chunk_length(&self) -> usize {
        self.seek_chunk_length.max(1)
    }
}

fn default_seek_chunk_length() -> usize {
    DEFAULT_SEEK_CHUNK_LENGTH
}

fn default_rowid_alias() -> String {
    DEFAULT_ROWID_ALIAS.to_string()
}

/// Loads [`GridConfig`] from `<config dir>/sqlgrid/config.json`.
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new() -> Result<Self, DbError> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            DbError::IoError(std::io::Error::other("Could not find config directory"))
        })?;

        Ok(Self {
            path: config_dir.join("sqlgrid").join("config.json"),
        })
    }

    pub fn from_path(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self) -> Result<GridConfig, DbError> {
        if !self.path.exists() {
            return Ok(GridConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        let config: GridConfig =
            serde_json::from_str(&content).map_err(|e| DbError::InvalidConfig(e.to_string()))?;

        Ok(config)
    }

    pub fn save(&self, config: &GridConfig) -> Result<(), DbError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(config)
            .map_err(|e| DbError::InvalidConfig(e.to_string()))?;
        fs::write(&self.path, content)?;

        Ok(())
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}
