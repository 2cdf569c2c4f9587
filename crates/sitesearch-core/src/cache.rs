//! Redb-backed cache of parsed websites.
//!
//! Extraction is the slowest stage of a run. With a cache the documents
//! parsed from a mirror are stored under the mirror's path and the next
//! run over the same directory skips extraction entirely.
//!
//! # Tables
//!
//! - `sites`: canonical website directory (string) -> [`CachedSite`] (JSON)

use crate::document::Document;
use crate::error::CacheError;
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Default cache file name inside the index directory.
pub const CACHE_FILE: &str = "documents.redb";

const SITES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("sites");

/// Parsed documents of one website directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSite {
    /// Unix timestamp (seconds) of the parse
    pub created_at: u64,
    pub documents: Vec<Document>,
}

/// Parsed document store keyed by website directory.
pub struct DocumentCache {
    db: Database,
}

impl DocumentCache {
    /// Opens or creates the cache database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)
            .map_err(|e| CacheError::Database(format!("Failed to open cache: {}", e)))?;

        let txn = db.begin_write().map_err(|e| {
            CacheError::Database(format!("Failed to begin write transaction: {}", e))
        })?;
        txn.open_table(SITES_TABLE)
            .map_err(|e| CacheError::Database(format!("Failed to create sites table: {}", e)))?;
        txn.commit()
            .map_err(|e| CacheError::Database(format!("Failed to commit table creation: {}", e)))?;

        debug!("Opened document cache {}", path.display());
        Ok(Self { db })
    }

    /// Documents cached for `website_dir`, if any.
    pub fn load(&self, website_dir: &Path) -> Result<Option<Vec<Document>>, CacheError> {
        let key = site_key(website_dir);
        let txn = self.db.begin_read().map_err(|e| {
            CacheError::Database(format!("Failed to begin read transaction: {}", e))
        })?;
        let table = txn
            .open_table(SITES_TABLE)
            .map_err(|e| CacheError::Database(format!("Failed to open sites table: {}", e)))?;
        let Some(bytes) = table
            .get(key.as_str())
            .map_err(|e| CacheError::Database(format!("Failed to read cached site: {}", e)))?
        else {
            info!("No cached documents found for {}", key);
            return Ok(None);
        };

        let site: CachedSite = serde_json::from_slice(bytes.value())?;
        info!("Loaded {} documents from cache", site.documents.len());
        Ok(Some(site.documents))
    }

    /// Replaces the cached documents of `website_dir`.
    pub fn store(&self, website_dir: &Path, documents: &[Document]) -> Result<(), CacheError> {
        let key = site_key(website_dir);
        let site = CachedSite {
            created_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_secs())
                .unwrap_or(0),
            documents: documents.to_vec(),
        };
        let bytes = serde_json::to_vec(&site)?;

        let txn = self.db.begin_write().map_err(|e| {
            CacheError::Database(format!("Failed to begin write transaction: {}", e))
        })?;
        {
            let mut table = txn
                .open_table(SITES_TABLE)
                .map_err(|e| CacheError::Database(format!("Failed to open sites table: {}", e)))?;
            table
                .insert(key.as_str(), bytes.as_slice())
                .map_err(|e| CacheError::Database(format!("Failed to store site: {}", e)))?;
        }
        txn.commit()
            .map_err(|e| CacheError::Database(format!("Failed to commit site: {}", e)))?;

        info!("Successfully cached {} documents", documents.len());
        Ok(())
    }

    /// Drops the cached documents of `website_dir`. Returns `true` if there were any.
    pub fn invalidate(&self, website_dir: &Path) -> Result<bool, CacheError> {
        let key = site_key(website_dir);
        let txn = self.db.begin_write().map_err(|e| {
            CacheError::Database(format!("Failed to begin write transaction: {}", e))
        })?;
        let removed = {
            let mut table = txn
                .open_table(SITES_TABLE)
                .map_err(|e| CacheError::Database(format!("Failed to open sites table: {}", e)))?;
            let removed = table
                .remove(key.as_str())
                .map_err(|e| CacheError::Database(format!("Failed to remove site: {}", e)))?;
            removed.is_some()
        };
        txn.commit()
            .map_err(|e| CacheError::Database(format!("Failed to commit removal: {}", e)))?;
        Ok(removed)
    }
}

impl std::fmt::Debug for DocumentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentCache").finish_non_exhaustive()
    }
}

/// The same mirror reached through different relative paths shares a key.
fn site_key(website_dir: &Path) -> String {
    std::fs::canonicalize(website_dir)
        .unwrap_or_else(|_| website_dir.to_path_buf())
        .display()
        .to_string()
}
