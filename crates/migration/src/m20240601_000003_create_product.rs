//! Create `product` table with FKs to `category` and `sub_category`.
//!
//! `images` is a JSON array of relative upload paths.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Product::Table)
                    .if_not_exists()
                    .col(uuid(Product::Id).primary_key())
                    .col(uuid(Product::CategoryId).not_null())
                    .col(uuid_null(Product::SubCategoryId))
                    .col(string_len(Product::Name, 200).not_null())
                    .col(text_null(Product::Description))
                    .col(double(Product::Price).not_null())
                    .col(double_null(Product::PreviousPrice))
                    .col(integer(Product::Quantity).not_null())
                    .col(string_len(Product::StockStatus, 16).not_null())
                    .col(boolean(Product::FreeDelivery).not_null())
                    .col(json_binary(Product::Images).not_null())
                    .col(timestamp_with_time_zone(Product::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Product::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_category")
                            .from(Product::Table, Product::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_sub_category")
                            .from(Product::Table, Product::SubCategoryId)
                            .to(SubCategory::Table, SubCategory::Id)
                            .on_delete(ForeignKeyAction::Restrict)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Product::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Product {
    Table,
    Id,
    CategoryId,
    SubCategoryId,
    Name,
    Description,
    Price,
    PreviousPrice,
    Quantity,
    StockStatus,
    FreeDelivery,
    Images,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Category { Table, Id }

#[derive(DeriveIden)]
enum SubCategory { Table, Id }
