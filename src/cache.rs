use crate::models::Table;
use anyhow::Result;
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Memoizes loaded tables by resolved path.
///
/// Entries live for the lifetime of the cache and are never invalidated; a file edited on
/// disk after its first load keeps serving the old table.
#[derive(Debug, Default)]
pub struct LoadCache {
    entries: Mutex<HashMap<PathBuf, Arc<Table>>>,
}

impl LoadCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached table for `path`, or run `load` and remember its result. Errors are not cached.
    pub fn get_or_load<F>(&self, path: &Path, load: F) -> Result<Arc<Table>>
    where
        F: FnOnce(&Path) -> Result<Table>,
    {
        if let Some(hit) = self.lock().get(path) {
            debug!("cache hit for {}", path.display());
            return Ok(Arc::clone(hit));
        }
        // loaded outside the lock; a concurrent loader of the same path keeps the first insert
        let table = Arc::new(load(path)?);
        let mut entries = self.lock();
        let entry = entries.entry(path.to_path_buf()).or_insert(table);
        Ok(Arc::clone(entry))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Arc<Table>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_load_is_served_from_cache() {
        let cache = LoadCache::new();
        let mut calls = 0;
        let p = Path::new("counts.csv");
        let a = cache
            .get_or_load(p, |_| {
                calls += 1;
                Ok(Table::default())
            })
            .unwrap();
        let b = cache
            .get_or_load(p, |_| panic!("should not reload"))
            .unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failed_loads_are_not_cached() {
        let cache = LoadCache::new();
        let p = Path::new("missing.csv");
        assert!(cache.get_or_load(p, |_| anyhow::bail!("boom")).is_err());
        assert!(cache.is_empty());
    }
}
