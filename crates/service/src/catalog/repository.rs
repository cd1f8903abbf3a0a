use async_trait::async_trait;
use uuid::Uuid;

use super::domain::Record;
use crate::errors::ServiceError;

/// Persistence for one record type.
#[async_trait]
pub trait Repository<T: Record>: Send + Sync {
    async fn list(&self) -> Result<Vec<T>, ServiceError>;
    async fn get(&self, id: Uuid) -> Result<Option<T>, ServiceError>;
    async fn insert(&self, record: T) -> Result<T, ServiceError>;
    /// Replace the stored record with the same id; `NotFound` if absent.
    async fn update(&self, record: T) -> Result<T, ServiceError>;
    /// Returns whether a record was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError>;
}
