//! `/api/{Entity}/{Action}` routes answering with the `succeeded` envelope.

use axum::extract::{Path, Query, Request, State};
use axum::response::Response;
use axum::routing::{delete, get, post, put};
use axum::Router;

use super::catalog::{self, CatalogResource, Categories, ProductQuery, Products, SubCategories, SubCategoryQuery};
use super::AppState;
use crate::errors::{ApiError, Flavor};

const FLAVOR: Flavor = Flavor::Legacy;

#[utoipa::path(
    get, path = "/api/Category/GetAll", tag = "legacy",
    responses((status = 200, description = "All categories, newest first"))
)]
pub async fn category_get_all(State(state): State<AppState>) -> Result<Response, ApiError> {
    catalog::list_categories(&state, FLAVOR).await
}

#[utoipa::path(
    get, path = "/api/SubCategory/GetAll", tag = "legacy",
    params(SubCategoryQuery),
    responses((status = 200, description = "Sub-categories with their category name"), (status = 400, description = "Bad category id"))
)]
pub async fn sub_category_get_all(
    State(state): State<AppState>,
    Query(q): Query<SubCategoryQuery>,
) -> Result<Response, ApiError> {
    catalog::list_sub_categories(&state, FLAVOR, q.category_id.as_deref()).await
}

#[utoipa::path(
    get, path = "/api/Product/GetAll", tag = "legacy",
    params(ProductQuery),
    responses((status = 200, description = "One page of products as a plain array"), (status = 400, description = "Bad filter id"))
)]
pub async fn product_get_all(State(state): State<AppState>, Query(q): Query<ProductQuery>) -> Result<Response, ApiError> {
    catalog::list_products(&state, FLAVOR, q).await
}

pub async fn get_by_id<R: CatalogResource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = catalog::parse_id(FLAVOR, &id)?;
    catalog::get_one::<R>(&state, FLAVOR, id).await
}

pub async fn create<R: CatalogResource>(State(state): State<AppState>, req: Request) -> Result<Response, ApiError> {
    let payload = catalog::read_payload(FLAVOR, req).await?;
    catalog::create::<R>(&state, FLAVOR, payload).await
}

/// Id travels in the body as `id`, `Id` or `_id`.
pub async fn update<R: CatalogResource>(State(state): State<AppState>, req: Request) -> Result<Response, ApiError> {
    let payload = catalog::read_payload(FLAVOR, req).await?;
    let id = payload.id().map_err(|e| ApiError::from_payload(FLAVOR, e))?;
    catalog::update::<R>(&state, FLAVOR, id, payload).await
}

/// Multipart `Id` plus `image` (products: one or more `images`).
pub async fn update_image<R: CatalogResource>(
    State(state): State<AppState>,
    req: Request,
) -> Result<Response, ApiError> {
    let payload = catalog::read_payload(FLAVOR, req).await?;
    let id = payload.id().map_err(|e| ApiError::from_payload(FLAVOR, e))?;
    catalog::update_image::<R>(&state, FLAVOR, id, payload).await
}

pub async fn delete_by_body<R: CatalogResource>(
    State(state): State<AppState>,
    req: Request,
) -> Result<Response, ApiError> {
    let payload = catalog::read_payload(FLAVOR, req).await?;
    let id = payload.id().map_err(|e| ApiError::from_payload(FLAVOR, e))?;
    catalog::delete::<R>(&state, FLAVOR, id).await
}

pub async fn delete_by_path<R: CatalogResource>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = catalog::parse_id(FLAVOR, &id)?;
    catalog::delete::<R>(&state, FLAVOR, id).await
}

/// Everything but `GetAll`, which differs per resource.
fn actions<R: CatalogResource>() -> Router<AppState> {
    let base = format!("/api/{}", R::NAME);
    Router::new()
        .route(&format!("{base}/Get/:id"), get(get_by_id::<R>))
        .route(&format!("{base}/Create"), post(create::<R>))
        .route(&format!("{base}/Update"), put(update::<R>).post(update::<R>))
        .route(&format!("{base}/UpdateImage"), put(update_image::<R>))
        .route(&format!("{base}/Delete"), delete(delete_by_body::<R>))
        .route(&format!("{base}/:id"), delete(delete_by_path::<R>))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/Category/GetAll", get(category_get_all))
        .route("/api/SubCategory/GetAll", get(sub_category_get_all))
        .route("/api/Product/GetAll", get(product_get_all))
        .merge(actions::<Categories>())
        .merge(actions::<SubCategories>())
        .merge(actions::<Products>())
}
