//! `/api/{entities}` routes answering with the `success` envelope.

use axum::extract::{Path, Query, Request, State};
use axum::response::Response;
use axum::routing::get;
use axum::Router;

use super::catalog::{self, CatalogResource, Categories, ProductQuery, Products, SubCategories, SubCategoryQuery};
use super::AppState;
use crate::errors::{ApiError, Flavor};

const FLAVOR: Flavor = Flavor::Rest;

async fn read<R: CatalogResource>(state: AppState, id: String) -> Result<Response, ApiError> {
    let id = catalog::parse_id(FLAVOR, &id)?;
    catalog::get_one::<R>(&state, FLAVOR, id).await
}

async fn write<R: CatalogResource>(state: AppState, req: Request) -> Result<Response, ApiError> {
    let payload = catalog::read_payload(FLAVOR, req).await?;
    catalog::create::<R>(&state, FLAVOR, payload).await
}

async fn replace<R: CatalogResource>(state: AppState, id: String, req: Request) -> Result<Response, ApiError> {
    let id = catalog::parse_id(FLAVOR, &id)?;
    let payload = catalog::read_payload(FLAVOR, req).await?;
    catalog::update::<R>(&state, FLAVOR, id, payload).await
}

async fn remove<R: CatalogResource>(state: AppState, id: String) -> Result<Response, ApiError> {
    let id = catalog::parse_id(FLAVOR, &id)?;
    catalog::delete::<R>(&state, FLAVOR, id).await
}

#[utoipa::path(get, path = "/api/categories", tag = "categories", responses((status = 200, description = "All categories")))]
pub async fn list_categories(State(state): State<AppState>) -> Result<Response, ApiError> {
    catalog::list_categories(&state, FLAVOR).await
}

#[utoipa::path(
    post, path = "/api/categories", tag = "categories",
    request_body(content = crate::openapi::CategoryFormDoc, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Created"),
        (status = 400, description = "Validation Error"),
        (status = 413, description = "Image too large"),
        (status = 415, description = "Unsupported image or body type")
    )
)]
pub async fn create_category(State(state): State<AppState>, req: Request) -> Result<Response, ApiError> {
    write::<Categories>(state, req).await
}

#[utoipa::path(
    get, path = "/api/categories/{id}", tag = "categories",
    params(("id" = String, Path, description = "Category ID (UUID)")),
    responses((status = 200, description = "OK"), (status = 404, description = "Category not found"))
)]
pub async fn get_category(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ApiError> {
    read::<Categories>(state, id).await
}

#[utoipa::path(
    put, path = "/api/categories/{id}", tag = "categories",
    params(("id" = String, Path, description = "Category ID (UUID)")),
    request_body(content = crate::openapi::CategoryFormDoc, content_type = "multipart/form-data"),
    responses((status = 200, description = "Updated"), (status = 404, description = "Category not found"))
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    req: Request,
) -> Result<Response, ApiError> {
    replace::<Categories>(state, id, req).await
}

#[utoipa::path(
    delete, path = "/api/categories/{id}", tag = "categories",
    params(("id" = String, Path, description = "Category ID (UUID)")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Category still has sub-categories or products")
    )
)]
pub async fn delete_category(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ApiError> {
    remove::<Categories>(state, id).await
}

#[utoipa::path(
    get, path = "/api/subcategories", tag = "subcategories",
    params(SubCategoryQuery),
    responses((status = 200, description = "Sub-categories with their category name"))
)]
pub async fn list_sub_categories(
    State(state): State<AppState>,
    Query(q): Query<SubCategoryQuery>,
) -> Result<Response, ApiError> {
    catalog::list_sub_categories(&state, FLAVOR, q.category_id.as_deref()).await
}

#[utoipa::path(
    get, path = "/api/subcategories/category/{categoryId}", tag = "subcategories",
    params(("categoryId" = String, Path, description = "Category ID")),
    responses((status = 200, description = "Sub-categories of one category"), (status = 400, description = "Bad category id"))
)]
pub async fn list_sub_categories_by_category(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
) -> Result<Response, ApiError> {
    catalog::list_sub_categories(&state, FLAVOR, Some(&category_id)).await
}

#[utoipa::path(
    post, path = "/api/subcategories", tag = "subcategories",
    request_body(content = crate::openapi::SubCategoryFormDoc, content_type = "multipart/form-data"),
    responses((status = 201, description = "Created"), (status = 400, description = "Validation Error"))
)]
pub async fn create_sub_category(State(state): State<AppState>, req: Request) -> Result<Response, ApiError> {
    write::<SubCategories>(state, req).await
}

#[utoipa::path(
    get, path = "/api/subcategories/{id}", tag = "subcategories",
    params(("id" = String, Path, description = "Sub-category ID (UUID)")),
    responses((status = 200, description = "OK"), (status = 404, description = "SubCategory not found"))
)]
pub async fn get_sub_category(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ApiError> {
    read::<SubCategories>(state, id).await
}

#[utoipa::path(
    put, path = "/api/subcategories/{id}", tag = "subcategories",
    params(("id" = String, Path, description = "Sub-category ID (UUID)")),
    request_body(content = crate::openapi::SubCategoryFormDoc, content_type = "multipart/form-data"),
    responses((status = 200, description = "Updated"), (status = 404, description = "SubCategory not found"))
)]
pub async fn update_sub_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    req: Request,
) -> Result<Response, ApiError> {
    replace::<SubCategories>(state, id, req).await
}

#[utoipa::path(
    delete, path = "/api/subcategories/{id}", tag = "subcategories",
    params(("id" = String, Path, description = "Sub-category ID (UUID)")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 404, description = "SubCategory not found"),
        (status = 409, description = "Sub-category still has products")
    )
)]
pub async fn delete_sub_category(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ApiError> {
    remove::<SubCategories>(state, id).await
}

#[utoipa::path(
    get, path = "/api/products", tag = "products",
    params(ProductQuery),
    responses((status = 200, description = "One page with totals"))
)]
pub async fn list_products(State(state): State<AppState>, Query(q): Query<ProductQuery>) -> Result<Response, ApiError> {
    catalog::list_products(&state, FLAVOR, q).await
}

#[utoipa::path(
    post, path = "/api/products", tag = "products",
    request_body(content = crate::openapi::ProductFormDoc, content_type = "multipart/form-data"),
    responses((status = 201, description = "Created"), (status = 400, description = "Validation Error"))
)]
pub async fn create_product(State(state): State<AppState>, req: Request) -> Result<Response, ApiError> {
    write::<Products>(state, req).await
}

#[utoipa::path(
    get, path = "/api/products/{id}", tag = "products",
    params(("id" = String, Path, description = "Product ID (UUID)")),
    responses((status = 200, description = "OK"), (status = 404, description = "Product not found"))
)]
pub async fn get_product(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ApiError> {
    read::<Products>(state, id).await
}

#[utoipa::path(
    put, path = "/api/products/{id}", tag = "products",
    params(("id" = String, Path, description = "Product ID (UUID)")),
    request_body(content = crate::openapi::ProductFormDoc, content_type = "multipart/form-data"),
    responses((status = 200, description = "Updated"), (status = 404, description = "Product not found"))
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    req: Request,
) -> Result<Response, ApiError> {
    replace::<Products>(state, id, req).await
}

#[utoipa::path(
    delete, path = "/api/products/{id}", tag = "products",
    params(("id" = String, Path, description = "Product ID (UUID)")),
    responses((status = 200, description = "Deleted"), (status = 404, description = "Product not found"))
)]
pub async fn delete_product(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response, ApiError> {
    remove::<Products>(state, id).await
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/categories", get(list_categories).post(create_category))
        .route("/api/categories/:id", get(get_category).put(update_category).delete(delete_category))
        .route("/api/subcategories", get(list_sub_categories).post(create_sub_category))
        .route("/api/subcategories/category/:category_id", get(list_sub_categories_by_category))
        .route(
            "/api/subcategories/:id",
            get(get_sub_category).put(update_sub_category).delete(delete_sub_category),
        )
        .route("/api/products", get(list_products).post(create_product))
        .route("/api/products/:id", get(get_product).put(update_product).delete(delete_product))
}
