//! Runtime environment helpers
//!
//! Construction of the catalog service for the configured storage backend.

use std::{path::Path, sync::Arc};

use configs::{AppConfig, StorageBackend};
use migration::MigratorTrait;
use tracing::info;

use crate::catalog::repo::seaorm::{SeaOrmCategoryRepository, SeaOrmProductRepository, SeaOrmSubCategoryRepository};
use crate::catalog::CatalogService;
use crate::images::ImageStore;

/// Open the configured backend; the postgres backend runs pending migrations first.
pub async fn build_catalog(cfg: &AppConfig) -> anyhow::Result<CatalogService> {
    let storage = &cfg.storage;
    let images = ImageStore::new(&storage.uploads_dir, storage.max_image_bytes).await?;
    let catalog = match storage.backend {
        StorageBackend::File => {
            info!(data_dir = %storage.data_dir, "catalog backend: json files");
            CatalogService::open_files(Path::new(&storage.data_dir), images).await?
        }
        StorageBackend::Postgres => {
            let db = models::db::connect_with_config(&cfg.database).await?;
            migration::Migrator::up(&db, None).await?;
            info!("catalog backend: postgres");
            CatalogService::new(
                Arc::new(SeaOrmCategoryRepository { db: db.clone() }),
                Arc::new(SeaOrmSubCategoryRepository { db: db.clone() }),
                Arc::new(SeaOrmProductRepository { db }),
                images,
            )
        }
    };
    Ok(catalog)
}
