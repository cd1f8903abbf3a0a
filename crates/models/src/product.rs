use std::fmt;
use std::str::FromStr;

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{category, errors::ModelError, sub_category};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub category_id: Uuid,
    pub sub_category_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub previous_price: Option<f64>,
    pub quantity: i32,
    pub stock_status: String,
    pub free_delivery: bool,
    /// JSON array of relative image paths, in display order.
    pub images: Json,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Category, SubCategory }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Category => Entity::belongs_to(category::Entity)
                .from(Column::CategoryId)
                .to(category::Column::Id)
                .into(),
            Relation::SubCategory => Entity::belongs_to(sub_category::Entity)
                .from(Column::SubCategoryId)
                .to(sub_category::Column::Id)
                .into(),
        }
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StockStatus {
    InStock,
    OutOfStock,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::InStock => "inStock",
            StockStatus::OutOfStock => "outOfStock",
        }
    }

    pub fn from_quantity(quantity: i32) -> Self {
        if quantity > 0 { StockStatus::InStock } else { StockStatus::OutOfStock }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StockStatus {
    type Err = ModelError;

    /// Accepts the dashboard's radio values plus a few spellings seen from other clients.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "instock" | "available" | "true" => Ok(StockStatus::InStock),
            "outofstock" | "soldout" | "unavailable" | "false" => Ok(StockStatus::OutOfStock),
            _ => Err(ModelError::Validation(format!("invalid stock status: {s}"))),
        }
    }
}
