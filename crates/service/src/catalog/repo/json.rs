use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use uuid::Uuid;

use crate::catalog::domain::Record;
use crate::catalog::repository::Repository;
use crate::errors::ServiceError;
use crate::storage::json_map_store::JsonMapStore;

/// File-backed repository: one JSON map per record type.
pub struct JsonRepository<T> {
    store: Arc<JsonMapStore<Uuid, T>>,
}

impl<T: Record> JsonRepository<T> {
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Self, ServiceError> {
        Ok(Self { store: JsonMapStore::new(path).await? })
    }
}

#[async_trait]
impl<T: Record> Repository<T> for JsonRepository<T> {
    async fn list(&self) -> Result<Vec<T>, ServiceError> {
        Ok(self.store.values().await)
    }

    async fn get(&self, id: Uuid) -> Result<Option<T>, ServiceError> {
        Ok(self.store.get(&id).await)
    }

    async fn insert(&self, record: T) -> Result<T, ServiceError> {
        let id = record.id();
        self.store
            .update_map(|map| {
                if map.contains_key(&id) {
                    return Err(ServiceError::Conflict(format!("{} {id} already exists", T::ENTITY)));
                }
                map.insert(id, record.clone());
                Ok(())
            })
            .await?;
        Ok(record)
    }

    async fn update(&self, record: T) -> Result<T, ServiceError> {
        let id = record.id();
        self.store
            .update_map(|map| {
                let slot = map.get_mut(&id).ok_or_else(|| ServiceError::not_found(T::ENTITY))?;
                *slot = record.clone();
                Ok(())
            })
            .await?;
        Ok(record)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        Ok(self.store.remove(&id).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::domain::Category;
    use chrono::Utc;

    fn category(name: &str) -> Category {
        let now = Utc::now();
        Category { id: Uuid::new_v4(), name: name.into(), description: None, image_url: None, created_at: now, updated_at: now }
    }

    #[tokio::test]
    async fn json_repository_round_trip() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("categories.json");
        let repo = JsonRepository::<Category>::open(&path).await?;

        let c = repo.insert(category("Cakes")).await?;
        assert!(matches!(repo.insert(c.clone()).await, Err(ServiceError::Conflict(_))));

        let mut renamed = c.clone();
        renamed.name = "Pastry".into();
        repo.update(renamed).await?;

        let reopened = JsonRepository::<Category>::open(&path).await?;
        assert_eq!(reopened.get(c.id).await?.map(|x| x.name), Some("Pastry".to_string()));
        assert!(reopened.delete(c.id).await?);
        assert!(!reopened.delete(c.id).await?);
        Ok(())
    }

    #[tokio::test]
    async fn update_of_missing_record_is_not_found() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let repo = JsonRepository::<Category>::open(dir.path().join("c.json")).await?;
        let err = repo.update(category("Ghost")).await.unwrap_err();
        assert_eq!(err.to_string(), "Category not found");
        Ok(())
    }
}
