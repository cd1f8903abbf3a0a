//! Catalog operations shared by the legacy and REST route families.

use axum::http::StatusCode;
use axum::response::Response;
use serde::{Deserialize, Serialize};
use service::catalog::domain::{
    Category, CategoryForm, Product, ProductFilter, ProductForm, StockStatus, SubCategoryForm, SubCategoryView,
};
use service::errors::ServiceError;
use service::pagination::Pagination;
use service::CatalogService;
use tracing::info;
use uuid::Uuid;

use crate::errors::{ApiError, Flavor, RequestError};
use crate::observability::{RECORDS_CREATED_TOTAL, RECORDS_DELETED_TOTAL, RECORDS_UPDATED_TOTAL};
use crate::payload::{Payload, PayloadError};
use crate::routes::AppState;

/// One managed record type as seen by the HTTP layer.
#[async_trait::async_trait]
pub trait CatalogResource: Send + Sync + 'static {
    /// Singular name used in legacy paths and messages.
    const NAME: &'static str;
    const PLURAL: &'static str;
    /// `resource` label on the record counters.
    const METRIC: &'static str;

    type Item: Serialize + Send;

    async fn get(catalog: &CatalogService, id: Uuid) -> Result<Self::Item, ServiceError>;
    async fn create(catalog: &CatalogService, payload: Payload) -> Result<Self::Item, RequestError>;
    async fn update(catalog: &CatalogService, id: Uuid, payload: Payload) -> Result<Self::Item, RequestError>;
    async fn update_image(catalog: &CatalogService, id: Uuid, payload: Payload) -> Result<Self::Item, RequestError>;
    async fn delete(catalog: &CatalogService, id: Uuid) -> Result<Self::Item, ServiceError>;
}

pub struct Categories;
pub struct SubCategories;
pub struct Products;

fn category_form(payload: &mut Payload) -> CategoryForm {
    CategoryForm {
        name: payload.text("name"),
        description: payload.text("description"),
        image: payload.take_image(),
    }
}

fn sub_category_form(payload: &mut Payload) -> Result<SubCategoryForm, PayloadError> {
    Ok(SubCategoryForm {
        category_id: payload.uuid("categoryId")?,
        name: payload.text("name"),
        description: payload.text("description"),
        image: payload.take_image(),
    })
}

fn product_form(payload: &mut Payload) -> Result<ProductForm, PayloadError> {
    let stock_status = payload
        .text("stockStatus")
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<StockStatus>())
        .transpose()
        .map_err(|e| PayloadError::InvalidField { field: "stockStatus".into(), reason: e.to_string() })?;
    Ok(ProductForm {
        category_id: payload.uuid("categoryId")?,
        sub_category_id: payload.uuid("subCategoryId")?,
        clear_sub_category: payload.text("subCategoryId").is_some_and(|s| s.trim().is_empty()),
        name: payload.text("name"),
        description: payload.text("description"),
        price: payload.f64("price")?,
        previous_price: payload.f64("previousPrice")?,
        quantity: payload.i64("quantity")?,
        stock_status,
        free_delivery: payload.bool("freeDelivery")?,
        images: payload.take_images(),
    })
}

fn image_required() -> RequestError {
    ServiceError::Validation("image is required".into()).into()
}

#[async_trait::async_trait]
impl CatalogResource for Categories {
    const NAME: &'static str = "Category";
    const PLURAL: &'static str = "Categories";
    const METRIC: &'static str = "category";
    type Item = Category;

    async fn get(catalog: &CatalogService, id: Uuid) -> Result<Category, ServiceError> {
        catalog.get_category(id).await
    }

    async fn create(catalog: &CatalogService, mut payload: Payload) -> Result<Category, RequestError> {
        Ok(catalog.create_category(category_form(&mut payload)).await?)
    }

    async fn update(catalog: &CatalogService, id: Uuid, mut payload: Payload) -> Result<Category, RequestError> {
        Ok(catalog.update_category(id, category_form(&mut payload)).await?)
    }

    async fn update_image(catalog: &CatalogService, id: Uuid, mut payload: Payload) -> Result<Category, RequestError> {
        let image = payload.take_image().ok_or_else(image_required)?;
        Ok(catalog.update_category_image(id, image).await?)
    }

    async fn delete(catalog: &CatalogService, id: Uuid) -> Result<Category, ServiceError> {
        catalog.delete_category(id).await
    }
}

#[async_trait::async_trait]
impl CatalogResource for SubCategories {
    const NAME: &'static str = "SubCategory";
    const PLURAL: &'static str = "SubCategories";
    const METRIC: &'static str = "sub_category";
    type Item = SubCategoryView;

    async fn get(catalog: &CatalogService, id: Uuid) -> Result<SubCategoryView, ServiceError> {
        catalog.get_sub_category(id).await
    }

    async fn create(catalog: &CatalogService, mut payload: Payload) -> Result<SubCategoryView, RequestError> {
        let form = sub_category_form(&mut payload)?;
        Ok(catalog.create_sub_category(form).await?)
    }

    async fn update(catalog: &CatalogService, id: Uuid, mut payload: Payload) -> Result<SubCategoryView, RequestError> {
        let form = sub_category_form(&mut payload)?;
        Ok(catalog.update_sub_category(id, form).await?)
    }

    async fn update_image(
        catalog: &CatalogService,
        id: Uuid,
        mut payload: Payload,
    ) -> Result<SubCategoryView, RequestError> {
        let image = payload.take_image().ok_or_else(image_required)?;
        Ok(catalog.update_sub_category_image(id, image).await?)
    }

    async fn delete(catalog: &CatalogService, id: Uuid) -> Result<SubCategoryView, ServiceError> {
        catalog.delete_sub_category(id).await
    }
}

#[async_trait::async_trait]
impl CatalogResource for Products {
    const NAME: &'static str = "Product";
    const PLURAL: &'static str = "Products";
    const METRIC: &'static str = "product";
    type Item = Product;

    async fn get(catalog: &CatalogService, id: Uuid) -> Result<Product, ServiceError> {
        catalog.get_product(id).await
    }

    async fn create(catalog: &CatalogService, mut payload: Payload) -> Result<Product, RequestError> {
        let form = product_form(&mut payload)?;
        Ok(catalog.create_product(form).await?)
    }

    async fn update(catalog: &CatalogService, id: Uuid, mut payload: Payload) -> Result<Product, RequestError> {
        let form = product_form(&mut payload)?;
        Ok(catalog.update_product(id, form).await?)
    }

    async fn update_image(catalog: &CatalogService, id: Uuid, mut payload: Payload) -> Result<Product, RequestError> {
        Ok(catalog.update_product_images(id, payload.take_images()).await?)
    }

    async fn delete(catalog: &CatalogService, id: Uuid) -> Result<Product, ServiceError> {
        catalog.delete_product(id).await
    }
}

pub fn parse_id(flavor: Flavor, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::bad_request(flavor, format!("'{raw}' is not a valid id")))
}

/// Optional id from a query string; blank means "not filtered".
fn parse_filter_id(flavor: Flavor, raw: Option<&str>) -> Result<Option<Uuid>, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => parse_id(flavor, s).map(Some),
        None => Ok(None),
    }
}

pub async fn read_payload(flavor: Flavor, req: axum::extract::Request) -> Result<Payload, ApiError> {
    Payload::extract(req).await.map_err(|e| ApiError::from_payload(flavor, e))
}

pub async fn get_one<R: CatalogResource>(state: &AppState, flavor: Flavor, id: Uuid) -> Result<Response, ApiError> {
    let item = R::get(&state.catalog, id).await.map_err(|e| ApiError::from_service(flavor, e))?;
    Ok(flavor.ok(StatusCode::OK, Some(item), format!("{} retrieved successfully", R::NAME)))
}

pub async fn create<R: CatalogResource>(state: &AppState, flavor: Flavor, payload: Payload) -> Result<Response, ApiError> {
    let item = R::create(&state.catalog, payload).await.map_err(|e| ApiError::from((flavor, e)))?;
    RECORDS_CREATED_TOTAL.with_label_values(&[R::METRIC]).inc();
    Ok(flavor.ok(StatusCode::CREATED, Some(item), format!("{} created successfully", R::NAME)))
}

pub async fn update<R: CatalogResource>(
    state: &AppState,
    flavor: Flavor,
    id: Uuid,
    payload: Payload,
) -> Result<Response, ApiError> {
    let item = R::update(&state.catalog, id, payload).await.map_err(|e| ApiError::from((flavor, e)))?;
    RECORDS_UPDATED_TOTAL.with_label_values(&[R::METRIC]).inc();
    Ok(flavor.ok(StatusCode::OK, Some(item), format!("{} updated successfully", R::NAME)))
}

pub async fn update_image<R: CatalogResource>(
    state: &AppState,
    flavor: Flavor,
    id: Uuid,
    payload: Payload,
) -> Result<Response, ApiError> {
    let item = R::update_image(&state.catalog, id, payload).await.map_err(|e| ApiError::from((flavor, e)))?;
    RECORDS_UPDATED_TOTAL.with_label_values(&[R::METRIC]).inc();
    Ok(flavor.ok(StatusCode::OK, Some(item), format!("{} image updated successfully", R::NAME)))
}

pub async fn delete<R: CatalogResource>(state: &AppState, flavor: Flavor, id: Uuid) -> Result<Response, ApiError> {
    let item = R::delete(&state.catalog, id).await.map_err(|e| ApiError::from_service(flavor, e))?;
    RECORDS_DELETED_TOTAL.with_label_values(&[R::METRIC]).inc();
    info!(resource = R::METRIC, %id, "record deleted");
    Ok(flavor.ok(StatusCode::OK, Some(item), format!("{} deleted successfully", R::NAME)))
}

pub async fn list_categories(state: &AppState, flavor: Flavor) -> Result<Response, ApiError> {
    let items = state.catalog.list_categories().await.map_err(|e| ApiError::from_service(flavor, e))?;
    Ok(flavor.ok(StatusCode::OK, Some(items), format!("{} retrieved successfully", Categories::PLURAL)))
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SubCategoryQuery {
    /// Only sub-categories of this category
    pub category_id: Option<String>,
}

pub async fn list_sub_categories(
    state: &AppState,
    flavor: Flavor,
    category_id: Option<&str>,
) -> Result<Response, ApiError> {
    let category_id = parse_filter_id(flavor, category_id)?;
    let items = state
        .catalog
        .list_sub_categories(category_id)
        .await
        .map_err(|e| ApiError::from_service(flavor, e))?;
    Ok(flavor.ok(StatusCode::OK, Some(items), format!("{} retrieved successfully", SubCategories::PLURAL)))
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// 1-based page, default 1
    pub page: Option<u32>,
    /// Page size, default 20, at most 1000
    pub limit: Option<u32>,
    pub category_id: Option<String>,
    pub sub_category_id: Option<String>,
    /// Case-insensitive match on name or description
    pub search: Option<String>,
}

/// Legacy answers with the page's items only, REST with the whole page.
pub async fn list_products(state: &AppState, flavor: Flavor, query: ProductQuery) -> Result<Response, ApiError> {
    let filter = ProductFilter {
        category_id: parse_filter_id(flavor, query.category_id.as_deref())?,
        sub_category_id: parse_filter_id(flavor, query.sub_category_id.as_deref())?,
        search: query.search,
    };
    let page = state
        .catalog
        .list_products(&filter, Pagination::new(query.page, query.limit))
        .await
        .map_err(|e| ApiError::from_service(flavor, e))?;
    let message = format!("{} retrieved successfully", Products::PLURAL);
    Ok(match flavor {
        Flavor::Legacy => flavor.ok(StatusCode::OK, Some(page.items), message),
        Flavor::Rest => flavor.ok(StatusCode::OK, Some(page), message),
    })
}
