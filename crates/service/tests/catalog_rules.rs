use service::catalog::domain::{CategoryForm, ImageUpload, ProductFilter, ProductForm, StockStatus, SubCategoryForm};
use service::catalog::CatalogService;
use service::errors::{ServiceError, UploadError};
use service::images::ImageStore;
use service::pagination::Pagination;
use tempfile::TempDir;

async fn catalog() -> anyhow::Result<(TempDir, CatalogService)> {
    let dir = tempfile::tempdir()?;
    let images = ImageStore::new(dir.path().join("Uploads"), 1024).await?;
    let svc = CatalogService::open_files(&dir.path().join("data"), images).await?;
    Ok((dir, svc))
}

fn png() -> ImageUpload {
    ImageUpload { file_name: Some("photo.png".into()), content_type: Some("image/png".into()), bytes: vec![1, 2, 3] }
}

fn named(name: &str) -> CategoryForm {
    CategoryForm { name: Some(name.into()), ..Default::default() }
}

#[tokio::test]
async fn category_create_with_image_and_partial_update() -> anyhow::Result<()> {
    let (dir, svc) = catalog().await?;
    let created = svc
        .create_category(CategoryForm { name: Some("  Cakes ".into()), description: Some("sweet".into()), image: Some(png()) })
        .await?;
    assert_eq!(created.name, "Cakes");
    let first_image = created.image_url.clone().expect("image url");
    assert!(first_image.starts_with("Uploads/Category/"));

    // blank name keeps the stored one; new image replaces and removes the old file
    let updated = svc
        .update_category(created.id, CategoryForm { name: Some("".into()), description: None, image: Some(png()) })
        .await?;
    assert_eq!(updated.name, "Cakes");
    assert_eq!(updated.description.as_deref(), Some("sweet"));
    assert_ne!(updated.image_url.as_deref(), Some(first_image.as_str()));
    assert!(!dir.path().join(first_image).exists());

    let all = svc.list_categories().await?;
    assert_eq!(all.len(), 1);
    Ok(())
}

#[tokio::test]
async fn missing_name_and_unknown_ids() -> anyhow::Result<()> {
    let (_dir, svc) = catalog().await?;
    let err = svc.create_category(CategoryForm::default()).await.unwrap_err();
    assert!(matches!(err, ServiceError::Model(_)));
    assert!(err.to_string().contains("Category name is required"));

    let err = svc.get_category(uuid::Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.to_string(), "Category not found");

    let err = svc
        .create_sub_category(SubCategoryForm { name: Some("Orphan".into()), ..Default::default() })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(m) if m == "categoryId is required"));
    Ok(())
}

#[tokio::test]
async fn oversized_image_is_rejected_before_anything_is_stored() -> anyhow::Result<()> {
    let (_dir, svc) = catalog().await?;
    let big = ImageUpload { bytes: vec![0; 2048], ..png() };
    let err = svc
        .create_category(CategoryForm { name: Some("Big".into()), image: Some(big), ..Default::default() })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Upload(UploadError::TooLarge { size: 2048, limit: 1024 })));
    assert!(svc.list_categories().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn referential_rules_block_deletes() -> anyhow::Result<()> {
    let (_dir, svc) = catalog().await?;
    let cat = svc.create_category(named("Baking")).await?;
    let sub = svc
        .create_sub_category(SubCategoryForm { category_id: Some(cat.id), name: Some("Molds".into()), ..Default::default() })
        .await?;
    assert_eq!(sub.category_name.as_deref(), Some("Baking"));

    let product = svc
        .create_product(ProductForm {
            category_id: Some(cat.id),
            sub_category_id: Some(sub.sub_category.id),
            name: Some("Mold Set".into()),
            price: Some(12.0),
            quantity: Some(0),
            ..Default::default()
        })
        .await?;
    assert_eq!(product.stock_status, StockStatus::OutOfStock);

    assert!(matches!(svc.delete_category(cat.id).await, Err(ServiceError::Conflict(_))));
    assert!(matches!(svc.delete_sub_category(sub.sub_category.id).await, Err(ServiceError::Conflict(_))));

    svc.delete_product(product.id).await?;
    svc.delete_sub_category(sub.sub_category.id).await?;
    svc.delete_category(cat.id).await?;
    assert!(svc.list_categories().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn product_sub_category_must_belong_to_category() -> anyhow::Result<()> {
    let (_dir, svc) = catalog().await?;
    let a = svc.create_category(named("A")).await?;
    let b = svc.create_category(named("B")).await?;
    let sub_b = svc
        .create_sub_category(SubCategoryForm { category_id: Some(b.id), name: Some("Under B".into()), ..Default::default() })
        .await?;
    let err = svc
        .create_product(ProductForm {
            category_id: Some(a.id),
            sub_category_id: Some(sub_b.sub_category.id),
            name: Some("Mismatch".into()),
            price: Some(1.0),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(m) if m.contains("does not belong")));
    Ok(())
}

#[tokio::test]
async fn products_filter_search_and_paginate_newest_first() -> anyhow::Result<()> {
    let (_dir, svc) = catalog().await?;
    let cat = svc.create_category(named("Tools")).await?;
    for name in ["Whisk", "Spatula", "Rolling Pin", "Steel Whisk"] {
        svc.create_product(ProductForm {
            category_id: Some(cat.id),
            name: Some(name.into()),
            price: Some(3.5),
            quantity: Some(2),
            ..Default::default()
        })
        .await?;
        // distinct creation times keep the newest-first order deterministic
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let page = svc.list_products(&ProductFilter::default(), Pagination { page: 1, per_page: 3 }).await?;
    assert_eq!(page.total, 4);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.items.len(), 3);
    assert_eq!(page.items[0].name, "Steel Whisk");

    let whisks = svc
        .list_products(&ProductFilter { search: Some("whisk".into()), ..Default::default() }, Pagination::default())
        .await?;
    assert_eq!(whisks.total, 2);
    Ok(())
}

#[tokio::test]
async fn product_images_are_replaced_as_a_list() -> anyhow::Result<()> {
    let (dir, svc) = catalog().await?;
    let cat = svc.create_category(named("Decor")).await?;
    let p = svc
        .create_product(ProductForm {
            category_id: Some(cat.id),
            name: Some("Topper".into()),
            price: Some(2.0),
            images: vec![png(), png()],
            ..Default::default()
        })
        .await?;
    assert_eq!(p.images.len(), 2);

    let updated = svc.update_product_images(p.id, vec![png()]).await?;
    assert_eq!(updated.images.len(), 1);
    for old in &p.images {
        assert!(!dir.path().join(old).exists());
    }

    let unchanged = svc
        .update_product(p.id, ProductForm { price: Some(4.0), ..Default::default() })
        .await?;
    assert_eq!(unchanged.images, updated.images);
    assert_eq!(unchanged.price, 4.0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_child_create_and_parent_delete_never_orphan() -> anyhow::Result<()> {
    let (_dir, svc) = catalog().await?;
    for round in 0..20 {
        let id = svc.create_category(named(&format!("Round {round}"))).await?.id;
        let (a, b) = (svc.clone(), svc.clone());
        let create = tokio::spawn(async move {
            a.create_sub_category(SubCategoryForm { category_id: Some(id), name: Some("Child".into()), ..Default::default() })
                .await
        });
        let delete = tokio::spawn(async move { b.delete_category(id).await });
        let (created, deleted) = (create.await?, delete.await?);
        match (created, deleted) {
            (Ok(_), Err(ServiceError::Conflict(_))) | (Err(ServiceError::Validation(_)), Ok(_)) => {}
            (created, deleted) => panic!("round {round}: create={created:?} delete={deleted:?}"),
        }
    }
    let categories: Vec<_> = svc.list_categories().await?.into_iter().map(|c| c.id).collect();
    for sub in svc.list_sub_categories(None).await? {
        assert!(categories.contains(&sub.sub_category.category_id));
    }
    Ok(())
}

#[tokio::test]
async fn moving_a_product_can_detach_its_sub_category() -> anyhow::Result<()> {
    let (_dir, svc) = catalog().await?;
    let a = svc.create_category(named("A")).await?;
    let b = svc.create_category(named("B")).await?;
    let sub_a = svc
        .create_sub_category(SubCategoryForm { category_id: Some(a.id), name: Some("Under A".into()), ..Default::default() })
        .await?;
    let p = svc
        .create_product(ProductForm {
            category_id: Some(a.id),
            sub_category_id: Some(sub_a.sub_category.id),
            name: Some("Pan".into()),
            price: Some(9.0),
            ..Default::default()
        })
        .await?;

    // blank sub-category without a move keeps it
    let kept = svc.update_product(p.id, ProductForm { clear_sub_category: true, ..Default::default() }).await?;
    assert_eq!(kept.sub_category_id, Some(sub_a.sub_category.id));

    let err = svc
        .update_product(p.id, ProductForm { category_id: Some(b.id), ..Default::default() })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(m) if m.contains("does not belong")));

    let moved = svc
        .update_product(p.id, ProductForm { category_id: Some(b.id), clear_sub_category: true, ..Default::default() })
        .await?;
    assert_eq!(moved.category_id, b.id);
    assert_eq!(moved.sub_category_id, None);
    Ok(())
}
