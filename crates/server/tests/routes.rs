use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use configs::AppConfig;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

async fn app() -> Result<(Router, TempDir)> {
    let dir = tempfile::tempdir()?;
    let mut cfg = AppConfig::default();
    cfg.storage.data_dir = dir.path().join("data").to_string_lossy().into_owned();
    cfg.storage.uploads_dir = dir.path().join("Uploads").to_string_lossy().into_owned();
    cfg.storage.max_image_bytes = 1024;
    Ok((server::build_app(&cfg).await?, dir))
}

async fn send(app: &Router, req: Request<Body>) -> Result<(StatusCode, Value)> {
    let resp = app.clone().oneshot(req).await?;
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
    Ok((status, body))
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn json_req(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Text fields plus an optional `image` file part.
fn multipart_req(method: Method, uri: &str, fields: &[(&str, &str)], image: Option<(&str, &str, &[u8])>) -> Request<Body> {
    let boundary = "catalogtestboundary";
    let mut body = Vec::new();
    for (k, v) in fields {
        body.extend_from_slice(format!("--{boundary}\r\nContent-Disposition: form-data; name=\"{k}\"\r\n\r\n{v}\r\n").as_bytes());
    }
    if let Some((name, ct, bytes)) = image {
        body.extend_from_slice(
            format!("--{boundary}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{name}\"\r\nContent-Type: {ct}\r\n\r\n")
                .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn misc_endpoints() -> Result<()> {
    let (app, _dir) = app().await?;
    let (status, body) = send(&app, get("/health")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = send(&app, get("/api/test")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = send(&app, get("/api-docs/openapi.json")).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/categories"].is_object());

    let resp = app.clone().oneshot(get("/")).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let text = to_bytes(resp.into_body(), usize::MAX).await?;
    assert!(String::from_utf8_lossy(&text).contains("running"));
    Ok(())
}

#[tokio::test]
async fn legacy_category_lifecycle() -> Result<()> {
    let (app, _dir) = app().await?;

    let req = multipart_req(
        Method::POST,
        "/api/Category/Create",
        &[("name", "  Cakes "), ("description", "Sweet")],
        Some(("cake.png", "image/png", PNG)),
    );
    let (status, body) = send(&app, req).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["succeeded"], true);
    assert_eq!(body["data"]["name"], "Cakes");
    let id = body["data"]["id"].as_str().unwrap().to_string();
    let image = body["data"]["imageUrl"].as_str().unwrap().to_string();
    assert!(image.starts_with("Uploads/Category/") && image.ends_with(".png"));

    // stored image is served statically
    let resp = app.clone().oneshot(get(&format!("/{image}"))).await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let (status, body) = send(&app, get("/api/Category/GetAll")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // blank fields keep stored values; id may come as `Id`
    let req = json_req(Method::PUT, "/api/Category/Update", json!({"Id": id, "name": "", "description": "Sweeter"}));
    let (status, body) = send(&app, req).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Cakes");
    assert_eq!(body["data"]["description"], "Sweeter");
    assert_eq!(body["data"]["imageUrl"], image.as_str());

    let (status, body) = send(&app, json_req(Method::DELETE, "/api/Category/Delete", json!({"id": id}))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Category deleted successfully");

    let (status, body) = send(&app, get(&format!("/api/Category/Get/{id}"))).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"succeeded": false, "data": null, "message": "Category not found", "errors": ["Category not found"]}));
    Ok(())
}

#[tokio::test]
async fn validation_and_upload_errors() -> Result<()> {
    let (app, _dir) = app().await?;

    let (status, body) = send(&app, json_req(Method::POST, "/api/Category/Create", json!({"description": "x"}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["succeeded"], false);

    let (status, _) = send(&app, get("/api/Category/Get/not-a-uuid")).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let big = vec![0u8; 4096];
    let req = multipart_req(Method::POST, "/api/categories", &[("name", "Big")], Some(("big.png", "image/png", &big)));
    let (status, body) = send(&app, req).await?;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["success"], false);

    let req = multipart_req(Method::POST, "/api/categories", &[("name", "Txt")], Some(("a.txt", "text/plain", b"hi")));
    let (status, _) = send(&app, req).await?;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let (status, _) = send(&app, json_req(Method::PUT, "/api/Category/Update", json!({"name": "x"}))).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn rest_referential_rules_and_product_pages() -> Result<()> {
    let (app, _dir) = app().await?;

    let (_, body) = send(&app, json_req(Method::POST, "/api/categories", json!({"name": "Bakery"}))).await?;
    let cat = body["data"]["id"].as_str().unwrap().to_string();
    let (status, body) = send(
        &app,
        json_req(Method::POST, "/api/subcategories", json!({"category_id": cat, "name": "Bread"})),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["categoryName"], "Bakery");
    let sub = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, get(&format!("/api/subcategories/category/{cat}"))).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    for i in 0..3 {
        let form = json!({"CategoryId": cat, "SubCategoryId": sub, "Name": format!("Loaf {i}"), "Price": "2.5", "Quantity": i});
        let (status, _) = send(&app, json_req(Method::POST, "/api/products", form)).await?;
        assert_eq!(status, StatusCode::CREATED);
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let (status, body) = send(&app, get("/api/products?limit=2&page=1&search=loaf")).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["totalPages"], 2);
    assert_eq!(body["data"]["items"][0]["name"], "Loaf 2");
    assert_eq!(body["data"]["items"][1]["stockStatus"], "inStock");

    // legacy list answers with a bare array
    let (_, body) = send(&app, get(&format!("/api/Product/GetAll?limit=1000&subCategoryId={sub}"))).await?;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let (status, body) = send(&app, Request::delete(format!("/api/categories/{cat}")).body(Body::empty())?).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let (status, _) = send(&app, Request::delete(format!("/api/subcategories/{sub}")).body(Body::empty())?).await?;
    assert_eq!(status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn metrics_count_writes() -> Result<()> {
    let (app, _dir) = app().await?;
    send(&app, json_req(Method::POST, "/api/categories", json!({"name": "Counted"}))).await?;
    let resp = app.clone().oneshot(get("/metrics")).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let text = to_bytes(resp.into_body(), usize::MAX).await?;
    assert!(String::from_utf8_lossy(&text).contains("catalog_records_created_total"));
    Ok(())
}

#[tokio::test]
async fn legacy_update_image_replaces_file() -> Result<()> {
    let (app, dir) = app().await?;
    let on_disk = |public: &str| dir.path().join(public);

    let req = multipart_req(Method::POST, "/api/Category/Create", &[("name", "Bread")], Some(("old.png", "image/png", PNG)));
    let (status, body) = send(&app, req).await?;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_str().unwrap().to_string();
    let old = body["data"]["imageUrl"].as_str().unwrap().to_string();
    assert!(on_disk(&old).exists());

    let req = multipart_req(Method::PUT, "/api/Category/UpdateImage", &[("Id", id.as_str())], Some(("new.png", "image/png", PNG)));
    let (status, body) = send(&app, req).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Category image updated successfully");
    assert_eq!(body["data"]["name"], "Bread");
    let new = body["data"]["imageUrl"].as_str().unwrap().to_string();
    assert_ne!(new, old);
    assert!(new.starts_with("Uploads/Category/"));
    assert!(on_disk(&new).exists());
    assert!(!on_disk(&old).exists(), "replaced image is removed");

    // no file part
    let req = multipart_req(Method::PUT, "/api/Category/UpdateImage", &[("Id", id.as_str())], None);
    let (status, body) = send(&app, req).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["succeeded"], false);
    Ok(())
}
