//! Typed records as seen by the client, tolerant of the differences
//! between backends (numeric or string ids, numbers sent as strings,
//! populated references).

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Opaque record id; backends use UUIDs, integers or ObjectId strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn from_value(v: &Value) -> Option<Self> {
        match v {
            Value::String(s) if !s.trim().is_empty() => Some(Self(s.trim().to_string())),
            Value::Number(n) => Some(Self(n.to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let v = Value::deserialize(d)?;
        RecordId::from_value(&v).ok_or_else(|| serde::de::Error::custom(format!("invalid id: {v}")))
    }
}

/// Deserializers accepting numbers and booleans sent as strings.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn number(v: &Value) -> Option<f64> {
        match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(opt_f64(d)?.unwrap_or_default())
    }

    pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        let v = Value::deserialize(d)?;
        match v {
            Value::Null => Ok(None),
            Value::String(ref s) if s.trim().is_empty() => Ok(None),
            other => number(&other)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("not a number: {other}"))),
        }
    }

    pub fn i64<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        Ok(opt_f64(d)?.map(|n| n as i64).unwrap_or_default())
    }

    pub fn bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        let v = Value::deserialize(d)?;
        Ok(match v {
            Value::Bool(b) => b,
            Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
            Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on"),
            _ => false,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubCategory {
    pub id: RecordId,
    #[serde(default)]
    pub category_id: Option<RecordId>,
    #[serde(default)]
    pub category_name: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: RecordId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64")]
    pub price: f64,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub previous_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::i64")]
    pub quantity: i64,
    #[serde(default)]
    pub stock_status: Option<String>,
    #[serde(default, deserialize_with = "lenient::bool")]
    pub free_delivery: bool,
    #[serde(default)]
    pub category_id: Option<RecordId>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub sub_category_id: Option<RecordId>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Outcome of a create/update: some backends echo the record, some only its id.
#[derive(Clone, Debug, PartialEq)]
pub enum Saved<T> {
    Record(T),
    Id(RecordId),
    Empty,
}

impl<T> Saved<T> {
    pub fn record(self) -> Option<T> {
        match self {
            Saved::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Saved<U> {
        match self {
            Saved::Record(r) => Saved::Record(f(r)),
            Saved::Id(id) => Saved::Id(id),
            Saved::Empty => Saved::Empty,
        }
    }
}

/// Fold a populated reference (`category: {id, name}` or `category: "id"`)
/// into `{name}Id` / `{name}Name`.
pub(crate) fn flatten_reference(value: &mut Value, field: &str) {
    let Value::Object(map) = value else { return };
    let Some(reference) = map.get(field).cloned() else { return };
    let id_key = format!("{field}Id");
    let name_key = format!("{field}Name");
    match reference {
        Value::Object(inner) => {
            if let Some(id) = inner.get("id") {
                map.entry(id_key).or_insert_with(|| id.clone());
            }
            if let Some(name) = inner.get("name") {
                map.entry(name_key).or_insert_with(|| name.clone());
            }
        }
        v @ (Value::String(_) | Value::Number(_)) => {
            map.entry(id_key).or_insert(v);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_keys;
    use serde_json::json;

    #[test]
    fn ids_accept_numbers_and_strings() {
        let a: RecordId = serde_json::from_value(json!(7)).unwrap();
        let b: RecordId = serde_json::from_value(json!("7")).unwrap();
        assert_eq!(a, b);
        assert!(serde_json::from_value::<RecordId>(json!(null)).is_err());
    }

    #[test]
    fn product_tolerates_strings_for_numbers() {
        let v = normalize_keys(json!({
            "Id": 3, "Name": "Mold", "Price": "12.50", "Quantity": "4",
            "FreeDelivery": "true", "Images": ["Uploads/Product/a.png"]
        }));
        let p: Product = serde_json::from_value(v).unwrap();
        assert_eq!(p.id.as_str(), "3");
        assert_eq!(p.price, 12.5);
        assert_eq!(p.quantity, 4);
        assert!(p.free_delivery);
        assert_eq!(p.previous_price, None);
    }

    #[test]
    fn populated_category_is_flattened() {
        let mut v = json!({"id": "s1", "name": "Molds", "category": {"id": "c1", "name": "Baking"}});
        flatten_reference(&mut v, "category");
        let s: SubCategory = serde_json::from_value(v).unwrap();
        assert_eq!(s.category_id, Some(RecordId::new("c1")));
        assert_eq!(s.category_name.as_deref(), Some("Baking"));

        let mut plain = json!({"id": "s2", "name": "Tins", "category": "c9"});
        flatten_reference(&mut plain, "category");
        assert_eq!(plain["categoryId"], "c9");
    }
}
