use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // SubCategory: lookups by parent
        manager
            .create_index(
                Index::create()
                    .name("idx_sub_category_category")
                    .table(SubCategory::Table)
                    .col(SubCategory::CategoryId)
                    .to_owned(),
            )
            .await?;

        // Product: filters by category and sub-category
        manager
            .create_index(
                Index::create()
                    .name("idx_product_category")
                    .table(Product::Table)
                    .col(Product::CategoryId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_product_sub_category")
                    .table(Product::Table)
                    .col(Product::SubCategoryId)
                    .to_owned(),
            )
            .await?;

        // Listings are newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_product_created_at")
                    .table(Product::Table)
                    .col(Product::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_sub_category_category").table(SubCategory::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_product_category").table(Product::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_product_sub_category").table(Product::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_product_created_at").table(Product::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum SubCategory { Table, CategoryId }

#[derive(DeriveIden)]
enum Product { Table, CategoryId, SubCategoryId, CreatedAt }
