use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::loader::load_raw;
use crate::models::Table;
use crate::normalizer::{normalize, ColumnAliases};

/// Hex SHA-256 of a source file, streamed from disk.
pub fn source_checksum(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Canonical tables keyed by the identity of their source (content hash plus sheet).
///
/// Entries are written once and only read afterwards.
#[derive(Debug, Default)]
pub struct TableCache {
    entries: HashMap<String, Arc<Table>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return the canonical table for `path`, loading and normalizing it on first use.
    pub fn get_or_load(
        &mut self,
        path: &Path,
        sheet: Option<&str>,
        aliases: &ColumnAliases,
    ) -> Result<Arc<Table>> {
        let key = format!("{}:{}", source_checksum(path)?, sheet.unwrap_or(""));
        if let Some(table) = self.entries.get(&key) {
            log::debug!("cache hit for {}", path.display());
            return Ok(Arc::clone(table));
        }
        log::debug!("cache miss for {}", path.display());
        let raw = load_raw(path, sheet)?;
        let table = Arc::new(normalize(&raw, aliases)?);
        self.entries.insert(key, Arc::clone(&table));
        Ok(table)
    }
}
