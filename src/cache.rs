use crate::result::Result;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/** Key/value store that survives between runs
 *
 * The whole cache is a single JSON object kept in `base_dir/cache.json`:
 * ```text
 * {
 *   "last_target": "app",
 *   "mode": "release"
 * }
 * ```
 *
 * This type only does the file I/O. Whether a write is allowed is decided
 * by [`crate::exec::Session`], which skips [`PersistentCache::save`] and
 * every mutation while in shadow mode.
 */
#[derive(Debug, Clone)]
pub struct PersistentCache {
    // Path to the JSON file holding all entries
    cache_file: PathBuf,
    entries: BTreeMap<String, Value>,
}

impl PersistentCache {
    /** Creates an empty cache rooted at `base_dir`
     *
     * # Notes
     * - Nothing is read or created on disk until `load` or `save`
     * - The directory is created lazily on the first save
     */
    pub fn new(base_dir: &Path) -> Self {
        Self {
            cache_file: base_dir.join("cache.json"),
            entries: BTreeMap::new(),
        }
    }

    /** Loads the cache stored under `base_dir`
     *
     * # Returns
     * - An empty cache if the file doesn't exist
     * - An empty cache if the file is not a JSON object; the damaged file
     *   is replaced on the next save
     * - `Err` only on I/O failures
     */
    pub async fn load(base_dir: &Path) -> Result<Self> {
        let mut cache = Self::new(base_dir);

        if !cache.cache_file.exists() {
            return Ok(cache);
        }

        let content = fs::read_to_string(&cache.cache_file).await?;
        if content.trim().is_empty() {
            return Ok(cache);
        }

        match serde_json::from_str::<BTreeMap<String, Value>>(&content) {
            Ok(entries) => cache.entries = entries,
            Err(e) => log::warn!(
                "Ignoring unreadable cache file {}: {}",
                cache.cache_file.display(),
                e
            ),
        }

        Ok(cache)
    } // load

    /// Writes every entry back to disk, creating the cache directory if needed.
    pub async fn save(&self) -> Result<()> {
        if let Some(parent) = self.cache_file.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.cache_file, format!("{}\n", content)).await?;
        Ok(())
    } // save

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.cache_file
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn save_then_load_keeps_entries() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join(".rmk");

        let mut cache = PersistentCache::new(&base);
        cache.insert("last_target", json!("app"));
        cache.insert("jobs", json!(4));
        cache.save().await.unwrap();

        let loaded = PersistentCache::load(&base).await.unwrap();
        assert_eq!(loaded.get("last_target"), Some(&json!("app")));
        assert_eq!(loaded.get("jobs"), Some(&json!(4)));
        assert_eq!(loaded.keys().collect::<Vec<_>>(), ["jobs", "last_target"]);
    }

    #[tokio::test]
    async fn missing_file_loads_empty_without_creating_anything() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("nope");

        let cache = PersistentCache::load(&base).await.unwrap();
        assert!(cache.is_empty());
        assert!(!base.exists());
    }

    #[tokio::test]
    async fn damaged_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cache.json"), "{'mode': 'debug'}").unwrap();

        let cache = PersistentCache::load(dir.path()).await.unwrap();
        assert!(cache.is_empty());
    }
}
