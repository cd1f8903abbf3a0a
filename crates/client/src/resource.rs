//! Typed resource clients built on the dispatcher.

use std::marker::PhantomData;

use common::data_url::{image_extension, DataUrl};
use reqwest::multipart::Part;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::dispatch::{Call, Dispatcher};
use crate::error::{ClientError, Operation};
use crate::model::{flatten_reference, Category, Product, RecordId, Saved, SubCategory};
use crate::normalize::full_image_url;
use crate::resolver::{candidates_for, EndpointResolver, Endpoint};
use crate::retry::RetryPolicy;

#[derive(Clone, Debug, PartialEq)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { file_name: file_name.into(), content_type: content_type.into(), bytes }
    }

    /// `data:<mime>;base64,...`, as used for in-browser previews.
    pub fn to_data_url(&self) -> String {
        DataUrl::new(self.content_type.clone(), self.bytes.clone()).encode()
    }

    /// Rebuild a file from a preview data URL; the name defaults to `image.<ext>`.
    pub fn from_data_url(data_url: &str, file_name: Option<&str>) -> Result<Self, ClientError> {
        let parsed = DataUrl::parse(data_url).map_err(|e| ClientError::decode("image data url", e))?;
        let file_name = match file_name {
            Some(n) => n.to_string(),
            None => format!("image.{}", image_extension(&parsed.mime).unwrap_or("bin")),
        };
        Ok(Self { file_name, content_type: parsed.mime, bytes: parsed.bytes })
    }

    pub(crate) fn to_part(&self) -> Result<Part, ClientError> {
        Ok(Part::bytes(self.bytes.clone())
            .file_name(self.file_name.clone())
            .mime_str(&self.content_type)?)
    }
}

/// Form contents of a create/update: camelCase text fields plus images.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormPayload {
    fields: Vec<(String, String)>,
    images: Vec<ImageFile>,
}

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a text field.
    pub fn text(mut self, key: &str, value: impl ToString) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl ToString) {
        let value = value.to_string();
        match self.fields.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key.to_string(), value)),
        }
    }

    pub fn image(mut self, image: ImageFile) -> Self {
        self.images.push(image);
        self
    }

    pub fn with_images(mut self, images: Vec<ImageFile>) -> Self {
        self.images = images;
        self
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn images(&self) -> &[ImageFile] {
        &self.images
    }

    pub fn has_image(&self) -> bool {
        !self.images.is_empty()
    }
}

/// List filters; only the set ones are sent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub category_id: Option<String>,
    pub sub_category_id: Option<String>,
}

impl ListQuery {
    /// Everything in one page, as the dashboard requests it.
    pub fn all() -> Self {
        Self { limit: Some(1000), ..Default::default() }
    }

    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        if let Some(p) = self.page {
            out.push(("page".into(), p.to_string()));
        }
        if let Some(l) = self.limit {
            out.push(("limit".into(), l.to_string()));
        }
        if let Some(s) = self.search.as_deref().filter(|s| !s.is_empty()) {
            out.push(("search".into(), s.to_string()));
        }
        if let Some(c) = &self.category_id {
            out.push(("categoryId".into(), c.clone()));
        }
        if let Some(s) = &self.sub_category_id {
            out.push(("subCategoryId".into(), s.clone()));
        }
        out
    }
}

/// A managed record type and where it lives.
pub trait Resource: Send + Sync + 'static {
    type Record: DeserializeOwned + Send;

    const NAME: &'static str;
    /// Path segments under `/api/` for the legacy shape, tried in order.
    const LEGACY_PATHS: &'static [&'static str];
    /// Path segment under `/api/` for the REST shape.
    const REST_PATH: &'static str;

    /// Fix up a normalized record before deserializing.
    fn prepare(_value: &mut Value) {}

    /// Expand relative image paths into absolute URLs.
    fn expand_images(record: &mut Self::Record, prefix: &str);
}

pub struct Categories;
pub struct SubCategories;
pub struct Products;

fn expand(slot: &mut Option<String>, prefix: &str) {
    *slot = slot.as_deref().and_then(|p| full_image_url(prefix, p));
}

impl Resource for Categories {
    type Record = Category;
    const NAME: &'static str = "category";
    const LEGACY_PATHS: &'static [&'static str] = &["Category", "category"];
    const REST_PATH: &'static str = "categories";

    fn expand_images(record: &mut Category, prefix: &str) {
        expand(&mut record.image_url, prefix);
    }
}

impl Resource for SubCategories {
    type Record = SubCategory;
    const NAME: &'static str = "subcategory";
    const LEGACY_PATHS: &'static [&'static str] = &["SubCategory", "subcategory"];
    const REST_PATH: &'static str = "subcategories";

    fn prepare(value: &mut Value) {
        flatten_reference(value, "category");
    }

    fn expand_images(record: &mut SubCategory, prefix: &str) {
        expand(&mut record.image_url, prefix);
    }
}

impl Resource for Products {
    type Record = Product;
    const NAME: &'static str = "product";
    const LEGACY_PATHS: &'static [&'static str] = &["Product", "product"];
    const REST_PATH: &'static str = "products";

    fn prepare(value: &mut Value) {
        flatten_reference(value, "category");
        flatten_reference(value, "subCategory");
    }

    fn expand_images(record: &mut Product, prefix: &str) {
        expand(&mut record.image_url, prefix);
        record.images = record.images.iter().filter_map(|p| full_image_url(prefix, p)).collect();
    }
}

/// List payloads come as a bare array or wrapped in a page object.
fn list_items(data: Value) -> Vec<Value> {
    const WRAPPERS: [&str; 6] = ["items", "data", "products", "categories", "subcategories", "results"];
    match data {
        Value::Array(items) => items,
        Value::Object(mut map) => WRAPPERS
            .iter()
            .find_map(|k| match map.remove(*k) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

pub struct ResourceClient<R: Resource> {
    dispatcher: Dispatcher,
    image_prefix: String,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Clone for ResourceClient<R> {
    fn clone(&self) -> Self {
        Self { dispatcher: self.dispatcher.clone(), image_prefix: self.image_prefix.clone(), _resource: PhantomData }
    }
}

impl<R: Resource> ResourceClient<R> {
    /// Candidates for `R` on every host, probed lazily on first use.
    pub fn new(http: reqwest::Client, hosts: &[String], retry: RetryPolicy, image_prefix: impl Into<String>) -> Self {
        let candidates = candidates_for(hosts, R::LEGACY_PATHS, R::REST_PATH);
        Self::from_endpoints(http, candidates, retry, image_prefix)
    }

    pub fn from_endpoints(
        http: reqwest::Client,
        endpoints: Vec<Endpoint>,
        retry: RetryPolicy,
        image_prefix: impl Into<String>,
    ) -> Self {
        let resolver = EndpointResolver::new(http.clone(), endpoints);
        Self {
            dispatcher: Dispatcher::new(http, resolver, retry),
            image_prefix: image_prefix.into(),
            _resource: PhantomData,
        }
    }

    pub fn resolver(&self) -> &EndpointResolver {
        self.dispatcher.resolver()
    }

    fn decode(&self, mut value: Value) -> Result<R::Record, ClientError> {
        R::prepare(&mut value);
        let mut record: R::Record =
            serde_json::from_value(value).map_err(|e| ClientError::decode(R::NAME, e))?;
        R::expand_images(&mut record, &self.image_prefix);
        Ok(record)
    }

    fn decode_list(&self, data: Option<Value>) -> Result<Vec<R::Record>, ClientError> {
        data.map(list_items).unwrap_or_default().into_iter().map(|v| self.decode(v)).collect()
    }

    fn decode_saved(&self, data: Option<Value>) -> Result<Saved<R::Record>, ClientError> {
        match data {
            None | Some(Value::Null) => Ok(Saved::Empty),
            Some(v @ (Value::String(_) | Value::Number(_))) => {
                Ok(RecordId::from_value(&v).map(Saved::Id).unwrap_or(Saved::Empty))
            }
            Some(v) => {
                let id = v.get("id").and_then(RecordId::from_value);
                match self.decode(v) {
                    Ok(record) => Ok(Saved::Record(record)),
                    Err(e) => id.map(Saved::Id).ok_or(e),
                }
            }
        }
    }

    pub async fn list(&self, query: &ListQuery) -> Result<Vec<R::Record>, ClientError> {
        let pairs = query.to_pairs();
        let env = self.dispatcher.execute(Call::new(Operation::List).query(&pairs)).await?;
        self.decode_list(env.data)
    }

    pub async fn get(&self, id: &str) -> Result<R::Record, ClientError> {
        let env = self.dispatcher.execute(Call::new(Operation::Get).id(id)).await?;
        let data = env.data.ok_or_else(|| ClientError::decode(R::NAME, "response carried no data"))?;
        self.decode(data)
    }

    pub async fn create(&self, form: &FormPayload) -> Result<Saved<R::Record>, ClientError> {
        let env = self.dispatcher.execute(Call::new(Operation::Create).form(form)).await?;
        self.decode_saved(env.data)
    }

    pub async fn update(&self, id: &str, form: &FormPayload) -> Result<Saved<R::Record>, ClientError> {
        let env = self.dispatcher.execute(Call::new(Operation::Update).id(id).form(form)).await?;
        self.decode_saved(env.data)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        self.dispatcher.execute(Call::new(Operation::Delete).id(id)).await?;
        Ok(())
    }
}

impl ResourceClient<SubCategories> {
    pub async fn list_by_category(&self, category_id: &str) -> Result<Vec<SubCategory>, ClientError> {
        let env = self.dispatcher.execute(Call::new(Operation::ListByCategory).id(category_id)).await?;
        self.decode_list(env.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn image_file_data_url_round_trip() {
        let img = ImageFile::new("cake.png", "image/png", vec![137, 80, 78, 71]);
        let back = ImageFile::from_data_url(&img.to_data_url(), None).unwrap();
        assert_eq!(back.bytes, img.bytes);
        assert_eq!(back.file_name, "image.png");
        assert!(ImageFile::from_data_url("Uploads/a.png", None).is_err());
    }

    #[test]
    fn form_payload_replaces_fields() {
        let mut f = FormPayload::new().text("name", "A").text("price", 3.5);
        f.set("name", "B");
        assert_eq!(f.field("name"), Some("B"));
        assert_eq!(f.field("price"), Some("3.5"));
        assert_eq!(f.fields().len(), 2);
    }

    #[test]
    fn list_query_pairs() {
        assert_eq!(ListQuery::all().to_pairs(), vec![("limit".to_string(), "1000".to_string())]);
        let q = ListQuery { page: Some(2), search: Some(String::new()), category_id: Some("c".into()), ..Default::default() };
        assert_eq!(q.to_pairs().len(), 2);
    }

    #[test]
    fn list_items_unwraps_pages() {
        assert_eq!(list_items(json!([1, 2])).len(), 2);
        assert_eq!(list_items(json!({"items": [1], "total": 1})).len(), 1);
        assert_eq!(list_items(json!({"products": [1, 2, 3]})).len(), 3);
        assert!(list_items(json!("x")).is_empty());
    }

    #[test]
    fn saved_prefers_record_then_id() {
        let client: ResourceClient<Categories> =
            ResourceClient::from_endpoints(reqwest::Client::new(), vec![], RetryPolicy::disabled(), "http://h/");
        let rec = client
            .decode_saved(Some(json!({"id": 1, "name": "Cakes", "imageUrl": "Uploads/Category/a.png"})))
            .unwrap();
        let cat = rec.record().unwrap();
        assert_eq!(cat.image_url.as_deref(), Some("http://h/Uploads/Category/a.png"));

        assert_eq!(client.decode_saved(Some(json!(42))).unwrap(), Saved::Id(RecordId::new("42")));
        assert_eq!(client.decode_saved(Some(json!({"id": "x"}))).unwrap(), Saved::Id(RecordId::new("x")));
        assert_eq!(client.decode_saved(None).unwrap(), Saved::Empty);
    }
}
