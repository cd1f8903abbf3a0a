use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

pub use models::product::StockStatus;

/// Common surface of the stored catalog records.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Human name used in messages, e.g. `"Category"`.
    const ENTITY: &'static str;

    fn id(&self) -> Uuid;
    fn created_at(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubCategory {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sub-category as returned to readers, with the parent's name resolved.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubCategoryView {
    #[serde(flatten)]
    pub sub_category: SubCategory,
    pub category_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub category_id: Uuid,
    pub sub_category_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub previous_price: Option<f64>,
    pub quantity: i32,
    pub stock_status: StockStatus,
    pub free_delivery: bool,
    #[serde(default)]
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Category {
    const ENTITY: &'static str = "Category";
    fn id(&self) -> Uuid { self.id }
    fn created_at(&self) -> DateTime<Utc> { self.created_at }
}

impl Record for SubCategory {
    const ENTITY: &'static str = "SubCategory";
    fn id(&self) -> Uuid { self.id }
    fn created_at(&self) -> DateTime<Utc> { self.created_at }
}

impl Record for Product {
    const ENTITY: &'static str = "Product";
    fn id(&self) -> Uuid { self.id }
    fn created_at(&self) -> DateTime<Utc> { self.created_at }
}

/// An uploaded image before it is written to disk.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageUpload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Category create/update input. On update, `None` or blank keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct CategoryForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Clone, Default)]
pub struct SubCategoryForm {
    pub category_id: Option<Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub category_id: Option<Uuid>,
    pub sub_category_id: Option<Uuid>,
    /// `subCategoryId` was sent blank; detaches the product when its category changes.
    pub clear_sub_category: bool,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub previous_price: Option<f64>,
    pub quantity: Option<i64>,
    pub stock_status: Option<StockStatus>,
    pub free_delivery: Option<bool>,
    /// New uploads; when non-empty they replace the stored list.
    pub images: Vec<ImageUpload>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    pub sub_category_id: Option<Uuid>,
    /// Case-insensitive match on name or description.
    pub search: Option<String>,
}

impl ProductFilter {
    pub fn matches(&self, p: &Product) -> bool {
        if self.category_id.is_some_and(|c| c != p.category_id) {
            return false;
        }
        if self.sub_category_id.is_some() && self.sub_category_id != p.sub_category_id {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                p.name.to_lowercase().contains(&term)
                    || p.description.as_deref().is_some_and(|d| d.to_lowercase().contains(&term))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product(name: &str, description: Option<&str>) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4(),
            category_id: Uuid::nil(),
            sub_category_id: None,
            name: name.into(),
            description: description.map(Into::into),
            price: 1.0,
            previous_price: None,
            quantity: 1,
            stock_status: StockStatus::InStock,
            free_delivery: false,
            images: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn records_serialize_camel_case() {
        let now = Utc::now();
        let sub = SubCategory {
            id: Uuid::nil(),
            category_id: Uuid::nil(),
            name: "Molds".into(),
            description: None,
            image_url: Some("Uploads/SubCategory/a.png".into()),
            created_at: now,
            updated_at: now,
        };
        let v = serde_json::to_value(SubCategoryView { sub_category: sub, category_name: Some("Baking".into()) }).unwrap();
        assert_eq!(v["categoryId"], json!(Uuid::nil()));
        assert_eq!(v["imageUrl"], "Uploads/SubCategory/a.png");
        assert_eq!(v["categoryName"], "Baking");
        assert!(v.get("createdAt").is_some());

        let p = serde_json::to_value(product("Whisk", None)).unwrap();
        assert_eq!(p["stockStatus"], "inStock");
        assert_eq!(p["freeDelivery"], false);
    }

    #[test]
    fn filter_searches_name_and_description() {
        let whisk = product("Steel Whisk", Some("for cream"));
        let mold = product("Cake Mold", None);
        let f = ProductFilter { search: Some("CREAM".into()), ..Default::default() };
        assert!(f.matches(&whisk));
        assert!(!f.matches(&mold));

        let by_cat = ProductFilter { category_id: Some(Uuid::new_v4()), ..Default::default() };
        assert!(!by_cat.matches(&mold));
        assert!(ProductFilter::default().matches(&mold));
    }
}
