//! OpenAPI document served at `/api-docs/openapi.json`. The structs here only
//! describe payloads; handlers read forms through `payload::Payload`.

use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct ApiTestResponse { pub success: bool, pub message: String, pub timestamp: String }

/// Multipart or JSON; `image` is a file part or a `data:` URL.
#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct CategoryFormDoc {
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<Vec<u8>>,
}

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct SubCategoryFormDoc {
    pub category_id: String,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub image: Option<Vec<u8>>,
}

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct ProductFormDoc {
    pub category_id: String,
    pub sub_category_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub previous_price: Option<f64>,
    pub quantity: Option<i64>,
    /// `inStock` or `outOfStock`; derived from quantity when absent
    pub stock_status: Option<String>,
    pub free_delivery: Option<bool>,
    #[schema(value_type = Option<Vec<String>>)]
    pub images: Option<Vec<Vec<u8>>>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::api_test,
        crate::routes::legacy::category_get_all,
        crate::routes::legacy::sub_category_get_all,
        crate::routes::legacy::product_get_all,
        crate::routes::rest::list_categories,
        crate::routes::rest::create_category,
        crate::routes::rest::get_category,
        crate::routes::rest::update_category,
        crate::routes::rest::delete_category,
        crate::routes::rest::list_sub_categories,
        crate::routes::rest::list_sub_categories_by_category,
        crate::routes::rest::create_sub_category,
        crate::routes::rest::get_sub_category,
        crate::routes::rest::update_sub_category,
        crate::routes::rest::delete_sub_category,
        crate::routes::rest::list_products,
        crate::routes::rest::create_product,
        crate::routes::rest::get_product,
        crate::routes::rest::update_product,
        crate::routes::rest::delete_product,
    ),
    components(
        schemas(
            HealthResponse,
            ApiTestResponse,
            CategoryFormDoc,
            SubCategoryFormDoc,
            ProductFormDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "legacy"),
        (name = "categories"),
        (name = "subcategories"),
        (name = "products")
    )
)]
pub struct ApiDoc;
