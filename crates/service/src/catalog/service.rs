use std::{cmp::Reverse, collections::HashMap, path::Path, sync::Arc};

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, instrument};
use uuid::Uuid;

use models::fields::{normalize_description, validate_amount, validate_name, validate_quantity};

use super::domain::{
    Category, CategoryForm, ImageUpload, Product, ProductFilter, ProductForm, Record, StockStatus,
    SubCategory, SubCategoryForm, SubCategoryView,
};
use super::repo::json::JsonRepository;
use super::repository::Repository;
use crate::errors::ServiceError;
use crate::images::{ImageKind, ImageStore};
use crate::pagination::{Page, Pagination};

/// Catalog business rules independent of web framework and storage backend.
#[derive(Clone)]
pub struct CatalogService {
    categories: Arc<dyn Repository<Category>>,
    sub_categories: Arc<dyn Repository<SubCategory>>,
    products: Arc<dyn Repository<Product>>,
    images: ImageStore,
    /// Held across existence checks and the mutation they guard.
    writes: Arc<Mutex<()>>,
}

fn newest_first<T: Record>(items: &mut [T]) {
    items.sort_by_key(|r| Reverse(r.created_at()));
}

/// Blank strings count as "not supplied", matching the dashboard's partial updates.
fn supplied(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

impl CatalogService {
    pub fn new(
        categories: Arc<dyn Repository<Category>>,
        sub_categories: Arc<dyn Repository<SubCategory>>,
        products: Arc<dyn Repository<Product>>,
        images: ImageStore,
    ) -> Self {
        Self { categories, sub_categories, products, images, writes: Arc::new(Mutex::new(())) }
    }

    /// File backend: `categories.json`, `sub_categories.json`, `products.json` under `data_dir`.
    pub async fn open_files(data_dir: &Path, images: ImageStore) -> Result<Self, ServiceError> {
        let categories = JsonRepository::<Category>::open(data_dir.join("categories.json")).await?;
        let sub_categories = JsonRepository::<SubCategory>::open(data_dir.join("sub_categories.json")).await?;
        let products = JsonRepository::<Product>::open(data_dir.join("products.json")).await?;
        Ok(Self::new(Arc::new(categories), Arc::new(sub_categories), Arc::new(products), images))
    }

    pub fn images(&self) -> &ImageStore { &self.images }

    async fn save_image(&self, kind: ImageKind, upload: Option<&ImageUpload>) -> Result<Option<String>, ServiceError> {
        match upload {
            Some(img) => Ok(Some(self.images.save(kind, img).await?)),
            None => Ok(None),
        }
    }

    async fn save_images(&self, kind: ImageKind, uploads: &[ImageUpload]) -> Result<Vec<String>, ServiceError> {
        for img in uploads {
            self.images.check(img)?;
        }
        let mut saved = Vec::with_capacity(uploads.len());
        for img in uploads {
            match self.images.save(kind, img).await {
                Ok(p) => saved.push(p),
                Err(e) => {
                    self.discard(&saved).await;
                    return Err(e);
                }
            }
        }
        Ok(saved)
    }

    async fn discard(&self, paths: &[String]) {
        for p in paths {
            self.images.remove(p).await;
        }
    }

    // ----- categories -----

    pub async fn list_categories(&self) -> Result<Vec<Category>, ServiceError> {
        let mut items = self.categories.list().await?;
        newest_first(&mut items);
        Ok(items)
    }

    pub async fn get_category(&self, id: Uuid) -> Result<Category, ServiceError> {
        self.categories.get(id).await?.ok_or_else(|| ServiceError::not_found("Category"))
    }

    #[instrument(skip(self, form))]
    pub async fn create_category(&self, form: CategoryForm) -> Result<Category, ServiceError> {
        let _guard = self.writes.lock().await;
        let name = validate_name("Category", form.name.as_deref().unwrap_or_default())?;
        let description = normalize_description(form.description.as_deref())?;
        let image_url = self.save_image(ImageKind::Category, form.image.as_ref()).await?;

        let now = Utc::now();
        let record = Category {
            id: Uuid::new_v4(),
            name,
            description,
            image_url: image_url.clone(),
            created_at: now,
            updated_at: now,
        };
        match self.categories.insert(record).await {
            Ok(c) => {
                info!(id = %c.id, name = %c.name, "category_created");
                Ok(c)
            }
            Err(e) => {
                self.discard(image_url.as_slice()).await;
                Err(e)
            }
        }
    }

    #[instrument(skip(self, form), fields(id = %id))]
    pub async fn update_category(&self, id: Uuid, form: CategoryForm) -> Result<Category, ServiceError> {
        let _guard = self.writes.lock().await;
        let mut current = self.get_category(id).await?;
        if let Some(name) = supplied(&form.name) {
            current.name = validate_name("Category", name)?;
        }
        if let Some(description) = supplied(&form.description) {
            current.description = normalize_description(Some(description))?;
        }
        let new_image = self.save_image(ImageKind::Category, form.image.as_ref()).await?;
        let old_image = match new_image.clone() {
            Some(url) => current.image_url.replace(url),
            None => None,
        };
        current.updated_at = Utc::now();

        match self.categories.update(current).await {
            Ok(c) => {
                if let Some(old) = old_image {
                    self.images.remove(&old).await;
                }
                info!(id = %c.id, "category_updated");
                Ok(c)
            }
            Err(e) => {
                self.discard(new_image.as_slice()).await;
                Err(e)
            }
        }
    }

    pub async fn update_category_image(&self, id: Uuid, image: ImageUpload) -> Result<Category, ServiceError> {
        self.update_category(id, CategoryForm { image: Some(image), ..Default::default() }).await
    }

    /// Refused while sub-categories or products still point at the category.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_category(&self, id: Uuid) -> Result<Category, ServiceError> {
        let _guard = self.writes.lock().await;
        let current = self.get_category(id).await?;
        let subs = self.sub_categories.list().await?.iter().filter(|s| s.category_id == id).count();
        if subs > 0 {
            return Err(ServiceError::Conflict(format!(
                "Category '{}' still has {subs} sub-categories",
                current.name
            )));
        }
        let products = self.products.list().await?.iter().filter(|p| p.category_id == id).count();
        if products > 0 {
            return Err(ServiceError::Conflict(format!(
                "Category '{}' still has {products} products",
                current.name
            )));
        }
        if !self.categories.delete(id).await? {
            return Err(ServiceError::not_found("Category"));
        }
        if let Some(img) = &current.image_url {
            self.images.remove(img).await;
        }
        info!(id = %id, "category_deleted");
        Ok(current)
    }

    // ----- sub-categories -----

    async fn category_names(&self) -> Result<HashMap<Uuid, String>, ServiceError> {
        Ok(self.categories.list().await?.into_iter().map(|c| (c.id, c.name)).collect())
    }

    async fn view(&self, sub: SubCategory) -> Result<SubCategoryView, ServiceError> {
        let category_name = self.categories.get(sub.category_id).await?.map(|c| c.name);
        Ok(SubCategoryView { sub_category: sub, category_name })
    }

    async fn require_category(&self, id: Uuid) -> Result<Category, ServiceError> {
        self.categories
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::Validation(format!("Category {id} does not exist")))
    }

    pub async fn list_sub_categories(&self, category_id: Option<Uuid>) -> Result<Vec<SubCategoryView>, ServiceError> {
        let names = self.category_names().await?;
        let mut items: Vec<SubCategory> = self
            .sub_categories
            .list()
            .await?
            .into_iter()
            .filter(|s| category_id.map_or(true, |c| s.category_id == c))
            .collect();
        newest_first(&mut items);
        Ok(items
            .into_iter()
            .map(|s| {
                let category_name = names.get(&s.category_id).cloned();
                SubCategoryView { sub_category: s, category_name }
            })
            .collect())
    }

    async fn get_sub_category_record(&self, id: Uuid) -> Result<SubCategory, ServiceError> {
        self.sub_categories.get(id).await?.ok_or_else(|| ServiceError::not_found("SubCategory"))
    }

    pub async fn get_sub_category(&self, id: Uuid) -> Result<SubCategoryView, ServiceError> {
        let sub = self.get_sub_category_record(id).await?;
        self.view(sub).await
    }

    #[instrument(skip(self, form))]
    pub async fn create_sub_category(&self, form: SubCategoryForm) -> Result<SubCategoryView, ServiceError> {
        let _guard = self.writes.lock().await;
        let name = validate_name("SubCategory", form.name.as_deref().unwrap_or_default())?;
        let description = normalize_description(form.description.as_deref())?;
        let category_id = form
            .category_id
            .ok_or_else(|| ServiceError::Validation("categoryId is required".into()))?;
        let parent = self.require_category(category_id).await?;
        let image_url = self.save_image(ImageKind::SubCategory, form.image.as_ref()).await?;

        let now = Utc::now();
        let record = SubCategory {
            id: Uuid::new_v4(),
            category_id,
            name,
            description,
            image_url: image_url.clone(),
            created_at: now,
            updated_at: now,
        };
        match self.sub_categories.insert(record).await {
            Ok(s) => {
                info!(id = %s.id, category_id = %category_id, "sub_category_created");
                Ok(SubCategoryView { sub_category: s, category_name: Some(parent.name) })
            }
            Err(e) => {
                self.discard(image_url.as_slice()).await;
                Err(e)
            }
        }
    }

    #[instrument(skip(self, form), fields(id = %id))]
    pub async fn update_sub_category(&self, id: Uuid, form: SubCategoryForm) -> Result<SubCategoryView, ServiceError> {
        let _guard = self.writes.lock().await;
        let mut current = self.get_sub_category_record(id).await?;
        if let Some(category_id) = form.category_id {
            if category_id != current.category_id {
                self.require_category(category_id).await?;
                current.category_id = category_id;
            }
        }
        if let Some(name) = supplied(&form.name) {
            current.name = validate_name("SubCategory", name)?;
        }
        if let Some(description) = supplied(&form.description) {
            current.description = normalize_description(Some(description))?;
        }
        let new_image = self.save_image(ImageKind::SubCategory, form.image.as_ref()).await?;
        let old_image = match new_image.clone() {
            Some(url) => current.image_url.replace(url),
            None => None,
        };
        current.updated_at = Utc::now();

        match self.sub_categories.update(current).await {
            Ok(s) => {
                if let Some(old) = old_image {
                    self.images.remove(&old).await;
                }
                info!(id = %s.id, "sub_category_updated");
                self.view(s).await
            }
            Err(e) => {
                self.discard(new_image.as_slice()).await;
                Err(e)
            }
        }
    }

    pub async fn update_sub_category_image(&self, id: Uuid, image: ImageUpload) -> Result<SubCategoryView, ServiceError> {
        self.update_sub_category(id, SubCategoryForm { image: Some(image), ..Default::default() }).await
    }

    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_sub_category(&self, id: Uuid) -> Result<SubCategoryView, ServiceError> {
        let _guard = self.writes.lock().await;
        let current = self.get_sub_category_record(id).await?;
        let products = self
            .products
            .list()
            .await?
            .iter()
            .filter(|p| p.sub_category_id == Some(id))
            .count();
        if products > 0 {
            return Err(ServiceError::Conflict(format!(
                "SubCategory '{}' is used by {products} products",
                current.name
            )));
        }
        if !self.sub_categories.delete(id).await? {
            return Err(ServiceError::not_found("SubCategory"));
        }
        if let Some(img) = &current.image_url {
            self.images.remove(img).await;
        }
        info!(id = %id, "sub_category_deleted");
        self.view(current).await
    }

    // ----- products -----

    /// Sub-category must exist and hang under `category_id`.
    async fn check_sub_category(&self, category_id: Uuid, sub_category_id: Uuid) -> Result<(), ServiceError> {
        let sub = self
            .sub_categories
            .get(sub_category_id)
            .await?
            .ok_or_else(|| ServiceError::Validation(format!("SubCategory {sub_category_id} does not exist")))?;
        if sub.category_id != category_id {
            return Err(ServiceError::Validation(format!(
                "SubCategory '{}' does not belong to category {category_id}",
                sub.name
            )));
        }
        Ok(())
    }

    pub async fn list_products(&self, filter: &ProductFilter, pagination: Pagination) -> Result<Page<Product>, ServiceError> {
        let mut items: Vec<Product> = self.products.list().await?.into_iter().filter(|p| filter.matches(p)).collect();
        newest_first(&mut items);
        Ok(Page::from_items(items, pagination))
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Product, ServiceError> {
        self.products.get(id).await?.ok_or_else(|| ServiceError::not_found("Product"))
    }

    #[instrument(skip(self, form))]
    pub async fn create_product(&self, form: ProductForm) -> Result<Product, ServiceError> {
        let _guard = self.writes.lock().await;
        let name = validate_name("Product", form.name.as_deref().unwrap_or_default())?;
        let description = normalize_description(form.description.as_deref())?;
        let price = validate_amount("price", form.price.ok_or_else(|| ServiceError::Validation("price is required".into()))?)?;
        let previous_price = form.previous_price.map(|p| validate_amount("previousPrice", p)).transpose()?;
        let quantity = validate_quantity(form.quantity.unwrap_or(0))?;
        let category_id = form
            .category_id
            .ok_or_else(|| ServiceError::Validation("categoryId is required".into()))?;
        self.require_category(category_id).await?;
        if let Some(sub_id) = form.sub_category_id {
            self.check_sub_category(category_id, sub_id).await?;
        }
        let images = self.save_images(ImageKind::Product, &form.images).await?;

        let now = Utc::now();
        let record = Product {
            id: Uuid::new_v4(),
            category_id,
            sub_category_id: form.sub_category_id,
            name,
            description,
            price,
            previous_price,
            quantity,
            stock_status: form.stock_status.unwrap_or_else(|| StockStatus::from_quantity(quantity)),
            free_delivery: form.free_delivery.unwrap_or(false),
            images: images.clone(),
            created_at: now,
            updated_at: now,
        };
        match self.products.insert(record).await {
            Ok(p) => {
                info!(id = %p.id, category_id = %p.category_id, images = p.images.len(), "product_created");
                Ok(p)
            }
            Err(e) => {
                self.discard(&images).await;
                Err(e)
            }
        }
    }

    #[instrument(skip(self, form), fields(id = %id))]
    pub async fn update_product(&self, id: Uuid, form: ProductForm) -> Result<Product, ServiceError> {
        let _guard = self.writes.lock().await;
        let mut current = self.get_product(id).await?;
        if let Some(name) = supplied(&form.name) {
            current.name = validate_name("Product", name)?;
        }
        if let Some(description) = supplied(&form.description) {
            current.description = normalize_description(Some(description))?;
        }
        if let Some(price) = form.price {
            current.price = validate_amount("price", price)?;
        }
        if let Some(previous) = form.previous_price {
            current.previous_price = Some(validate_amount("previousPrice", previous)?);
        }
        if let Some(quantity) = form.quantity {
            current.quantity = validate_quantity(quantity)?;
            if form.stock_status.is_none() {
                current.stock_status = StockStatus::from_quantity(current.quantity);
            }
        }
        if let Some(status) = form.stock_status {
            current.stock_status = status;
        }
        if let Some(free) = form.free_delivery {
            current.free_delivery = free;
        }
        let mut moved = false;
        if let Some(category_id) = form.category_id {
            if category_id != current.category_id {
                self.require_category(category_id).await?;
                current.category_id = category_id;
                moved = true;
            }
        }
        match form.sub_category_id {
            Some(sub_id) => current.sub_category_id = Some(sub_id),
            None if moved && form.clear_sub_category => current.sub_category_id = None,
            None => {}
        }
        if let Some(sub_id) = current.sub_category_id {
            self.check_sub_category(current.category_id, sub_id).await?;
        }

        let new_images = self.save_images(ImageKind::Product, &form.images).await?;
        let old_images = if new_images.is_empty() {
            Vec::new()
        } else {
            std::mem::replace(&mut current.images, new_images.clone())
        };
        current.updated_at = Utc::now();

        match self.products.update(current).await {
            Ok(p) => {
                self.discard(&old_images).await;
                info!(id = %p.id, "product_updated");
                Ok(p)
            }
            Err(e) => {
                self.discard(&new_images).await;
                Err(e)
            }
        }
    }

    pub async fn update_product_images(&self, id: Uuid, images: Vec<ImageUpload>) -> Result<Product, ServiceError> {
        if images.is_empty() {
            return Err(ServiceError::Validation("image is required".into()));
        }
        self.update_product(id, ProductForm { images, ..Default::default() }).await
    }

    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_product(&self, id: Uuid) -> Result<Product, ServiceError> {
        let _guard = self.writes.lock().await;
        let current = self.get_product(id).await?;
        if !self.products.delete(id).await? {
            return Err(ServiceError::not_found("Product"));
        }
        self.discard(&current.images).await;
        info!(id = %id, "product_deleted");
        Ok(current)
    }
}
