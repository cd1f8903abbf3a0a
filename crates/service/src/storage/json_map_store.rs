use std::{collections::HashMap, hash::Hash, path::PathBuf, sync::Arc};
use tokio::{fs, sync::RwLock};
use tracing::debug;

use crate::errors::ServiceError;

/// Generic JSON file-backed key-value map store.
///
/// Persists a `HashMap<K, V>` to a JSON file; every mutation rewrites the
/// file through a sibling `.tmp` file and a rename.
pub struct JsonMapStore<K, V> {
    inner: RwLock<HashMap<K, V>>,
    file_path: PathBuf,
}

impl<K, V> JsonMapStore<K, V>
where
    K: Eq + Hash + serde::Serialize + serde::de::DeserializeOwned + Clone,
    V: serde::Serialize + serde::de::DeserializeOwned + Clone,
{
    /// Open the store at `path`. Creates the file with an empty map if missing;
    /// an unreadable file is an error rather than silently emptied.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.map_err(ServiceError::storage)?;
        }

        let map: HashMap<K, V> = match fs::read(&file_path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => HashMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                ServiceError::Storage(format!("{}: {e}", file_path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let empty: HashMap<K, V> = HashMap::new();
                fs::write(&file_path, serde_json::to_vec(&empty).map_err(ServiceError::storage)?)
                    .await
                    .map_err(ServiceError::storage)?;
                empty
            }
            Err(e) => return Err(ServiceError::storage(e)),
        };
        debug!(path = %file_path.display(), entries = map.len(), "json store opened");

        Ok(Arc::new(Self { inner: RwLock::new(map), file_path }))
    }

    async fn save(&self, map: &HashMap<K, V>) -> Result<(), ServiceError> {
        let data = serde_json::to_vec_pretty(map).map_err(ServiceError::storage)?;
        let tmp = self.file_path.with_extension("json.tmp");
        fs::write(&tmp, data).await.map_err(ServiceError::storage)?;
        fs::rename(&tmp, &self.file_path).await.map_err(ServiceError::storage)?;
        Ok(())
    }

    /// All values, in no particular order.
    pub async fn values(&self) -> Vec<V> {
        let map = self.inner.read().await;
        map.values().cloned().collect()
    }

    pub async fn get(&self, key: &K) -> Option<V> {
        let map = self.inner.read().await;
        map.get(key).cloned()
    }

    pub async fn contains_key(&self, key: &K) -> bool {
        self.inner.read().await.contains_key(key)
    }

    /// Insert or replace a value by key and persist.
    pub async fn insert(&self, key: K, value: V) -> Result<(), ServiceError> {
        self.update_map(|m| {
            m.insert(key, value);
            Ok(())
        })
        .await
    }

    /// Remove a key and persist; returns the removed value.
    pub async fn remove(&self, key: &K) -> Result<Option<V>, ServiceError> {
        let mut map = self.inner.write().await;
        if !map.contains_key(key) {
            return Ok(None);
        }
        let mut next = map.clone();
        let removed = next.remove(key);
        self.save(&next).await?;
        *map = next;
        Ok(removed)
    }

    /// Apply a mutation to a copy of the map under the write lock, persist it
    /// and only then make it visible. Nothing changes when `f` or the write fails.
    pub async fn update_map<F, R>(&self, f: F) -> Result<R, ServiceError>
    where
        F: FnOnce(&mut HashMap<K, V>) -> Result<R, ServiceError>,
    {
        let mut map = self.inner.write().await;
        let mut next = map.clone();
        let out = f(&mut next)?;
        self.save(&next).await?;
        *map = next;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn json_map_store_crud_persists() -> Result<(), anyhow::Error> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("store.json");
        let store = JsonMapStore::<String, String>::new(&path).await?;

        assert_eq!(store.values().await.len(), 0);

        store.insert("a".into(), "1".into()).await?;
        store.insert("b".into(), "2".into()).await?;
        assert!(store.contains_key(&"a".into()).await);
        assert_eq!(store.get(&"a".into()).await.as_deref(), Some("1"));

        let old = store
            .update_map(|m| {
                let v = m.get_mut("a").ok_or_else(|| ServiceError::not_found("a"))?;
                Ok(std::mem::replace(v, "10".into()))
            })
            .await?;
        assert_eq!(old, "1");

        assert_eq!(store.remove(&"b".into()).await?.as_deref(), Some("2"));
        assert_eq!(store.remove(&"b".into()).await?, None);

        let reloaded = JsonMapStore::<String, String>::new(&path).await?;
        assert_eq!(reloaded.values().await, vec!["10".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn failed_update_leaves_store_untouched() -> Result<(), anyhow::Error> {
        let dir = tempfile::tempdir()?;
        let store = JsonMapStore::<String, u32>::new(dir.path().join("s.json")).await?;
        let res = store
            .update_map(|m| -> Result<(), ServiceError> {
                m.get("missing").ok_or_else(|| ServiceError::not_found("Thing"))?;
                Ok(())
            })
            .await;
        assert!(matches!(res, Err(ServiceError::NotFound(m)) if m == "Thing not found"));
        Ok(())
    }

    #[tokio::test]
    async fn failed_write_keeps_memory_in_sync_with_disk() -> Result<(), anyhow::Error> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("s.json");
        let store = JsonMapStore::<String, u32>::new(&path).await?;
        store.insert("kept".into(), 1).await?;

        // a directory in place of the file makes the rename fail
        tokio::fs::remove_file(&path).await?;
        tokio::fs::create_dir(&path).await?;

        assert!(matches!(store.insert("ghost".into(), 2).await, Err(ServiceError::Storage(_))));
        assert_eq!(store.get(&"ghost".into()).await, None);

        assert!(store.remove(&"kept".into()).await.is_err());
        assert_eq!(store.get(&"kept".into()).await, Some(1));

        let res = store
            .update_map(|m| {
                m.insert("kept".into(), 5);
                Ok(())
            })
            .await;
        assert!(res.is_err());
        assert_eq!(store.values().await, vec![1]);
        Ok(())
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() -> Result<(), anyhow::Error> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("bad.json");
        tokio::fs::write(&path, b"{not json").await?;
        let res = JsonMapStore::<String, u32>::new(&path).await;
        assert!(matches!(res, Err(ServiceError::Storage(_))));
        Ok(())
    }
}
