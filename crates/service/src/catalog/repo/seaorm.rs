use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder, Set};
use uuid::Uuid;

use models::{category, product, sub_category};

use crate::catalog::domain::{Category, Product, Record, StockStatus, SubCategory};
use crate::catalog::repository::Repository;
use crate::errors::ServiceError;

fn not_found_on_missing<T: Record>(e: DbErr) -> ServiceError {
    match e {
        DbErr::RecordNotUpdated | DbErr::RecordNotFound(_) => ServiceError::not_found(T::ENTITY),
        other => ServiceError::from(other),
    }
}

impl From<category::Model> for Category {
    fn from(m: category::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            description: m.description,
            image_url: m.image_url,
            created_at: m.created_at.with_timezone(&Utc),
            updated_at: m.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<&Category> for category::ActiveModel {
    fn from(c: &Category) -> Self {
        Self {
            id: Set(c.id),
            name: Set(c.name.clone()),
            description: Set(c.description.clone()),
            image_url: Set(c.image_url.clone()),
            created_at: Set(c.created_at.into()),
            updated_at: Set(c.updated_at.into()),
        }
    }
}

impl From<sub_category::Model> for SubCategory {
    fn from(m: sub_category::Model) -> Self {
        Self {
            id: m.id,
            category_id: m.category_id,
            name: m.name,
            description: m.description,
            image_url: m.image_url,
            created_at: m.created_at.with_timezone(&Utc),
            updated_at: m.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<&SubCategory> for sub_category::ActiveModel {
    fn from(s: &SubCategory) -> Self {
        Self {
            id: Set(s.id),
            category_id: Set(s.category_id),
            name: Set(s.name.clone()),
            description: Set(s.description.clone()),
            image_url: Set(s.image_url.clone()),
            created_at: Set(s.created_at.into()),
            updated_at: Set(s.updated_at.into()),
        }
    }
}

impl TryFrom<product::Model> for Product {
    type Error = ServiceError;

    fn try_from(m: product::Model) -> Result<Self, Self::Error> {
        let images: Vec<String> = serde_json::from_value(m.images)
            .map_err(|e| ServiceError::Storage(format!("product {} images: {e}", m.id)))?;
        let stock_status = m
            .stock_status
            .parse::<StockStatus>()
            .unwrap_or_else(|_| StockStatus::from_quantity(m.quantity));
        Ok(Self {
            id: m.id,
            category_id: m.category_id,
            sub_category_id: m.sub_category_id,
            name: m.name,
            description: m.description,
            price: m.price,
            previous_price: m.previous_price,
            quantity: m.quantity,
            stock_status,
            free_delivery: m.free_delivery,
            images,
            created_at: m.created_at.with_timezone(&Utc),
            updated_at: m.updated_at.with_timezone(&Utc),
        })
    }
}

impl From<&Product> for product::ActiveModel {
    fn from(p: &Product) -> Self {
        Self {
            id: Set(p.id),
            category_id: Set(p.category_id),
            sub_category_id: Set(p.sub_category_id),
            name: Set(p.name.clone()),
            description: Set(p.description.clone()),
            price: Set(p.price),
            previous_price: Set(p.previous_price),
            quantity: Set(p.quantity),
            stock_status: Set(p.stock_status.as_str().to_string()),
            free_delivery: Set(p.free_delivery),
            images: Set(serde_json::json!(p.images)),
            created_at: Set(p.created_at.into()),
            updated_at: Set(p.updated_at.into()),
        }
    }
}

pub struct SeaOrmCategoryRepository {
    pub db: DatabaseConnection,
}

#[async_trait]
impl Repository<Category> for SeaOrmCategoryRepository {
    async fn list(&self) -> Result<Vec<Category>, ServiceError> {
        let rows = category::Entity::find()
            .order_by_desc(category::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Category>, ServiceError> {
        Ok(category::Entity::find_by_id(id).one(&self.db).await?.map(Category::from))
    }

    async fn insert(&self, record: Category) -> Result<Category, ServiceError> {
        let m = category::ActiveModel::from(&record).insert(&self.db).await?;
        Ok(m.into())
    }

    async fn update(&self, record: Category) -> Result<Category, ServiceError> {
        let m = category::ActiveModel::from(&record)
            .update(&self.db)
            .await
            .map_err(not_found_on_missing::<Category>)?;
        Ok(m.into())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        let res = category::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(res.rows_affected > 0)
    }
}

pub struct SeaOrmSubCategoryRepository {
    pub db: DatabaseConnection,
}

#[async_trait]
impl Repository<SubCategory> for SeaOrmSubCategoryRepository {
    async fn list(&self) -> Result<Vec<SubCategory>, ServiceError> {
        let rows = sub_category::Entity::find()
            .order_by_desc(sub_category::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(SubCategory::from).collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<SubCategory>, ServiceError> {
        Ok(sub_category::Entity::find_by_id(id).one(&self.db).await?.map(SubCategory::from))
    }

    async fn insert(&self, record: SubCategory) -> Result<SubCategory, ServiceError> {
        let m = sub_category::ActiveModel::from(&record).insert(&self.db).await?;
        Ok(m.into())
    }

    async fn update(&self, record: SubCategory) -> Result<SubCategory, ServiceError> {
        let m = sub_category::ActiveModel::from(&record)
            .update(&self.db)
            .await
            .map_err(not_found_on_missing::<SubCategory>)?;
        Ok(m.into())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        let res = sub_category::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(res.rows_affected > 0)
    }
}

pub struct SeaOrmProductRepository {
    pub db: DatabaseConnection,
}

#[async_trait]
impl Repository<Product> for SeaOrmProductRepository {
    async fn list(&self) -> Result<Vec<Product>, ServiceError> {
        product::Entity::find()
            .order_by_desc(product::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Product::try_from)
            .collect()
    }

    async fn get(&self, id: Uuid) -> Result<Option<Product>, ServiceError> {
        product::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Product::try_from)
            .transpose()
    }

    async fn insert(&self, record: Product) -> Result<Product, ServiceError> {
        product::ActiveModel::from(&record).insert(&self.db).await?.try_into()
    }

    async fn update(&self, record: Product) -> Result<Product, ServiceError> {
        product::ActiveModel::from(&record)
            .update(&self.db)
            .await
            .map_err(not_found_on_missing::<Product>)?
            .try_into()
    }

    async fn delete(&self, id: Uuid) -> Result<bool, ServiceError> {
        let res = product::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(res.rows_affected > 0)
    }
}
