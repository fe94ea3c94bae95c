//! Load-once catalog cache.
//!
//! The host process owns a `CatalogCache` and hands the cached catalog to the
//! pipeline. Entries are keyed by source identity (canonical path, modification
//! time, size), so an edited file is reloaded while repeated interactions reuse
//! the already-parsed records.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::error::AppError;
use crate::io::ingest::{load_catalog, IngestedCatalog};

/// Identity of a catalog source on disk.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceKey {
    pub path: PathBuf,
    pub modified: Option<SystemTime>,
    pub len: u64,
}

impl SourceKey {
    pub fn for_path(path: &Path) -> Result<Self, AppError> {
        let meta = std::fs::metadata(path).map_err(|e| {
            AppError::new(
                2,
                format!("Failed to stat catalog CSV '{}': {e}", path.display()),
            )
        })?;
        let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Ok(Self {
            path,
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

#[derive(Debug, Default)]
pub struct CatalogCache {
    entries: HashMap<SourceKey, Arc<IngestedCatalog>>,
    loads: usize,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached catalog for `path`, loading it if the source changed.
    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<IngestedCatalog>, AppError> {
        let key = SourceKey::for_path(path)?;
        if let Some(hit) = self.entries.get(&key) {
            tracing::debug!(path = %key.path.display(), "catalog cache hit");
            return Ok(Arc::clone(hit));
        }

        let loaded = Arc::new(load_catalog(path)?);
        self.loads += 1;

        // Only the latest version of a given path is worth keeping.
        self.entries.retain(|k, _| k.path != key.path);
        self.entries.insert(key, Arc::clone(&loaded));
        Ok(loaded)
    }

    /// Number of times a file was actually parsed.
    pub fn loads(&self) -> usize {
        self.loads
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "id,gender,masterCategory,subCategory,articleType,baseColour,season,year,usage,productDisplayName\n";

    fn write_catalog(file: &mut std::fs::File, rows: &[&str]) {
        file.set_len(0).unwrap();
        let mut body = HEADER.to_string();
        for row in rows {
            body.push_str(row);
            body.push('\n');
        }
        use std::io::Seek;
        file.seek(std::io::SeekFrom::Start(0)).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file.flush().unwrap();
    }

    #[test]
    fn repeated_gets_reuse_the_loaded_catalog() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write_catalog(tmp.as_file_mut(), &["1,Men,Apparel,Topwear,Shirts,Black,Fall,2012,Casual,A"]);

        let mut cache = CatalogCache::new();
        let a = cache.get_or_load(tmp.path()).unwrap();
        let b = cache.get_or_load(tmp.path()).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.loads(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn changed_source_is_reloaded() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write_catalog(tmp.as_file_mut(), &["1,Men,Apparel,Topwear,Shirts,Black,Fall,2012,Casual,A"]);

        let mut cache = CatalogCache::new();
        let first = cache.get_or_load(tmp.path()).unwrap();
        assert_eq!(first.rows_used, 1);

        // A different size changes the key even if the mtime granularity is coarse.
        write_catalog(
            tmp.as_file_mut(),
            &[
                "1,Men,Apparel,Topwear,Shirts,Black,Fall,2012,Casual,A",
                "2,Women,Apparel,Topwear,Tops,White,Summer,2013,Casual,B",
            ],
        );
        let second = cache.get_or_load(tmp.path()).unwrap();

        assert_eq!(second.rows_used, 2);
        assert_eq!(cache.loads(), 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn missing_file_is_an_input_error() {
        let mut cache = CatalogCache::new();
        let err = cache.get_or_load(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(cache.is_empty());
    }
}
