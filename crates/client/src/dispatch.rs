//! Multi-strategy dispatch.
//!
//! A logical operation is tried as a sequence of concrete requests
//! ([`Strategy`]) that differ in verb, URL, body encoding, field casing and
//! id placement. The first one the backend accepts wins.

use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::Form;
use reqwest::Method;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{Attempt, ClientError, Operation};
use crate::normalize::{normalize, Envelope};
use crate::observability::STRATEGY_FALLBACKS_TOTAL;
use crate::resolver::{ApiShape, Endpoint, EndpointResolver};
use crate::resource::FormPayload;
use crate::retry::{retry_with_policy, RetryPolicy};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldCase {
    /// `categoryId`
    Camel,
    /// `CategoryId`
    Pascal,
}

impl FieldCase {
    /// Re-case a camelCase field name.
    pub fn apply(self, camel: &str) -> String {
        match self {
            FieldCase::Camel => camel.to_string(),
            FieldCase::Pascal => {
                let mut chars = camel.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    Multipart(FieldCase),
    Json(FieldCase),
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdPlacement {
    Body,
    Path,
    None,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Strategy {
    pub name: &'static str,
    pub method: Method,
    pub url: String,
    pub encoding: Encoding,
    pub id: IdPlacement,
    /// Whether images travel with this request (multipart parts or data URLs).
    pub with_image: bool,
    /// Separate image upload sent after a successful image-less update.
    pub image_follow_up: Option<String>,
}

impl Strategy {
    fn new(name: &'static str, method: Method, url: String, encoding: Encoding, id: IdPlacement) -> Self {
        let with_image = !matches!(encoding, Encoding::None);
        Self { name, method, url, encoding, id, with_image, image_follow_up: None }
    }

    fn without_image(mut self, follow_up: Option<String>) -> Self {
        self.with_image = false;
        self.image_follow_up = follow_up;
        self
    }
}

/// Ordered strategies for `operation` against `endpoint`; `id` is the record
/// id (or the category id for [`Operation::ListByCategory`]).
pub fn plan(operation: Operation, endpoint: &Endpoint, id: Option<&str>) -> Vec<Strategy> {
    use Encoding as E;
    use FieldCase::{Camel, Pascal};
    use IdPlacement as I;

    let id = id.unwrap_or_default();
    let e = endpoint;
    match (operation, e.shape) {
        (Operation::List, ApiShape::Legacy) => {
            vec![Strategy::new("get-all", Method::GET, e.url("GetAll"), E::None, I::None)]
        }
        (Operation::List, ApiShape::Rest) => {
            vec![Strategy::new("collection", Method::GET, e.url(""), E::None, I::None)]
        }
        (Operation::ListByCategory, ApiShape::Legacy) => {
            vec![Strategy::new("get-all-filtered", Method::GET, e.url("GetAll"), E::None, I::None)]
        }
        (Operation::ListByCategory, ApiShape::Rest) => vec![Strategy::new(
            "by-category",
            Method::GET,
            e.url(&format!("category/{id}")),
            E::None,
            I::Path,
        )],
        (Operation::Get, ApiShape::Legacy) => vec![
            Strategy::new("get-by-id", Method::GET, e.url(&format!("Get/{id}")), E::None, I::Path),
            Strategy::new("get-path", Method::GET, e.url(id), E::None, I::Path),
        ],
        (Operation::Get, ApiShape::Rest) => {
            vec![Strategy::new("get-path", Method::GET, e.url(id), E::None, I::Path)]
        }
        (Operation::Create, ApiShape::Legacy) => vec![
            Strategy::new("multipart", Method::POST, e.url("Create"), E::Multipart(Camel), I::None),
            Strategy::new("json", Method::POST, e.url("Create"), E::Json(Camel), I::None),
            Strategy::new("multipart-pascal", Method::POST, e.url("Create"), E::Multipart(Pascal), I::None),
        ],
        (Operation::Create, ApiShape::Rest) => vec![
            Strategy::new("multipart", Method::POST, e.url(""), E::Multipart(Camel), I::None),
            Strategy::new("json", Method::POST, e.url(""), E::Json(Camel), I::None),
        ],
        (Operation::Update, ApiShape::Legacy) => vec![
            Strategy::new("put-multipart", Method::PUT, e.url("Update"), E::Multipart(Camel), I::Body),
            Strategy::new("put-json", Method::PUT, e.url("Update"), E::Json(Camel), I::Body)
                .without_image(Some(e.url("UpdateImage"))),
            Strategy::new("post-multipart", Method::POST, e.url("Update"), E::Multipart(Camel), I::Body),
            Strategy::new("put-json-pascal", Method::PUT, e.url("Update"), E::Json(Pascal), I::Body)
                .without_image(Some(e.url("UpdateImage"))),
        ],
        (Operation::Update, ApiShape::Rest) => vec![
            Strategy::new("put-multipart", Method::PUT, e.url(id), E::Multipart(Camel), I::Path),
            Strategy::new("put-json", Method::PUT, e.url(id), E::Json(Camel), I::Path),
        ],
        (Operation::Delete, ApiShape::Legacy) => vec![
            Strategy::new("delete-json-body", Method::DELETE, e.url("Delete"), E::Json(Camel), I::Body),
            Strategy::new("delete-path", Method::DELETE, e.url(id), E::None, I::Path),
            Strategy::new("delete-form-body", Method::DELETE, e.url("Delete"), E::Multipart(Camel), I::Body),
        ],
        (Operation::Delete, ApiShape::Rest) => {
            vec![Strategy::new("delete-path", Method::DELETE, e.url(id), E::None, I::Path)]
        }
    }
}

/// Everything needed to run one logical operation.
#[derive(Clone, Copy, Debug)]
pub struct Call<'a> {
    pub operation: Operation,
    pub id: Option<&'a str>,
    pub form: Option<&'a FormPayload>,
    pub query: &'a [(String, String)],
}

impl<'a> Call<'a> {
    pub fn new(operation: Operation) -> Self {
        Self { operation, id: None, form: None, query: &[] }
    }

    pub fn id(mut self, id: &'a str) -> Self {
        self.id = Some(id);
        self
    }

    pub fn form(mut self, form: &'a FormPayload) -> Self {
        self.form = Some(form);
        self
    }

    pub fn query(mut self, query: &'a [(String, String)]) -> Self {
        self.query = query;
        self
    }
}

fn id_key(case: FieldCase) -> String {
    case.apply("id")
}

pub(crate) fn encode_multipart(form: &FormPayload, case: FieldCase, id: Option<&str>, with_image: bool) -> Result<Form, ClientError> {
    let mut out = Form::new();
    if let Some(id) = id {
        out = out.text(id_key(case), id.to_string());
    }
    for (k, v) in form.fields() {
        out = out.text(case.apply(k), v.clone());
    }
    if with_image {
        for img in form.images() {
            out = out.part(case.apply("image"), img.to_part()?);
        }
    }
    Ok(out)
}

pub(crate) fn encode_json(form: &FormPayload, case: FieldCase, id: Option<&str>, with_image: bool) -> Value {
    let mut out = Map::new();
    if let Some(id) = id {
        out.insert(id_key(case), Value::String(id.to_string()));
    }
    for (k, v) in form.fields() {
        out.insert(case.apply(k), Value::String(v.clone()));
    }
    if with_image {
        let urls: Vec<Value> = form.images().iter().map(|i| Value::String(i.to_data_url())).collect();
        match urls.len() {
            0 => {}
            1 => {
                out.insert(case.apply("image"), urls[0].clone());
            }
            _ => {
                out.insert(case.apply("images"), Value::Array(urls));
            }
        }
    }
    Value::Object(out)
}

/// Runs strategy plans against the resolved endpoint.
#[derive(Clone)]
pub struct Dispatcher {
    http: reqwest::Client,
    resolver: EndpointResolver,
    retry: RetryPolicy,
}

impl Dispatcher {
    pub fn new(http: reqwest::Client, resolver: EndpointResolver, retry: RetryPolicy) -> Self {
        Self { http, resolver, retry }
    }

    pub fn resolver(&self) -> &EndpointResolver {
        &self.resolver
    }

    /// Run `call`. If every strategy failed at the transport level the
    /// endpoint is re-resolved and the plan replayed once.
    pub async fn execute(&self, call: Call<'_>) -> Result<Envelope, ClientError> {
        let endpoint = self.resolver.resolve().await?;
        let mut attempts = match self.run_plan(&endpoint, call).await {
            Ok(env) => return Ok(env),
            Err(PlanError::Terminal(e)) => return Err(e),
            Err(PlanError::Exhausted(attempts)) => attempts,
        };

        if attempts.iter().all(|a| a.error.is_transport()) {
            warn!(operation = %call.operation, base = %endpoint.base, "endpoint unreachable, re-resolving");
            self.resolver.invalidate();
            if let Ok(fresh) = self.resolver.resolve().await {
                match self.run_plan(&fresh, call).await {
                    Ok(env) => return Ok(env),
                    Err(PlanError::Terminal(e)) => return Err(e),
                    Err(PlanError::Exhausted(more)) => attempts.extend(more),
                }
            }
        }
        Err(ClientError::Exhausted { operation: call.operation, attempts })
    }

    async fn run_plan(&self, endpoint: &Endpoint, call: Call<'_>) -> Result<Envelope, PlanError> {
        let strategies = plan(call.operation, endpoint, call.id);
        let total = strategies.len();
        let mut attempts = Vec::new();
        for (i, strategy) in strategies.into_iter().enumerate() {
            let result = retry_with_policy(&self.retry, || self.send(&strategy, call)).await;
            let result = match result {
                Ok(env) => self.follow_up(&strategy, call).await.map(|_| env),
                Err(e) => Err(e),
            };
            match result {
                Ok(env) => {
                    if i > 0 {
                        info!(operation = %call.operation, strategy = strategy.name, "fallback strategy succeeded");
                    } else {
                        debug!(operation = %call.operation, strategy = strategy.name, "request succeeded");
                    }
                    return Ok(env);
                }
                Err(error) if error.is_terminal() => {
                    warn!(operation = %call.operation, strategy = strategy.name, %error, "backend rejected request");
                    return Err(PlanError::Terminal(error));
                }
                Err(error) => {
                    if i + 1 < total {
                        STRATEGY_FALLBACKS_TOTAL.with_label_values(&[call.operation.as_str()]).inc();
                        warn!(operation = %call.operation, strategy = strategy.name, url = %strategy.url, %error, "strategy failed, trying next");
                    } else {
                        warn!(operation = %call.operation, strategy = strategy.name, url = %strategy.url, %error, "last strategy failed");
                    }
                    attempts.push(Attempt {
                        strategy: strategy.name,
                        method: strategy.method.to_string(),
                        url: strategy.url.clone(),
                        error,
                    });
                }
            }
        }
        Err(PlanError::Exhausted(attempts))
    }

    async fn follow_up(&self, strategy: &Strategy, call: Call<'_>) -> Result<(), ClientError> {
        let (Some(url), Some(form), Some(id)) = (&strategy.image_follow_up, call.form, call.id) else {
            return Ok(());
        };
        if !form.has_image() {
            return Ok(());
        }
        let image_only = FormPayload::new().with_images(form.images().to_vec());
        let upload = Strategy::new("update-image", Method::PUT, url.clone(), Encoding::Multipart(FieldCase::Camel), IdPlacement::None);
        let mut parts = encode_multipart(&image_only, FieldCase::Camel, None, true)?;
        parts = parts.text("Id", id.to_string());
        let req = self.http.request(upload.method.clone(), &upload.url).multipart(parts);
        self.finish(&upload, req).await.map(|_| ())
    }

    async fn send(&self, strategy: &Strategy, call: Call<'_>) -> Result<Envelope, ClientError> {
        let empty = FormPayload::new();
        let form = call.form.unwrap_or(&empty);
        let body_id = match strategy.id {
            IdPlacement::Body => call.id,
            _ => None,
        };

        let mut req = self.http.request(strategy.method.clone(), &strategy.url);
        if !call.query.is_empty() {
            req = req.query(call.query);
        }
        if call.operation == Operation::ListByCategory && strategy.id == IdPlacement::None {
            if let Some(category_id) = call.id {
                req = req.query(&[("categoryId", category_id)]);
            }
        }
        req = match strategy.encoding {
            Encoding::Multipart(case) => req.multipart(encode_multipart(form, case, body_id, strategy.with_image)?),
            Encoding::Json(case) => req.json(&encode_json(form, case, body_id, strategy.with_image)),
            Encoding::None => req,
        };
        self.finish(strategy, req).await
    }

    async fn finish(&self, strategy: &Strategy, req: reqwest::RequestBuilder) -> Result<Envelope, ClientError> {
        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let content_type = resp.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()).map(str::to_owned);
        let body = resp.bytes().await?;
        let env = normalize(status, content_type.as_deref(), &body)?;
        if !env.is_success_status() {
            return Err(ClientError::Status {
                method: strategy.method.to_string(),
                url: strategy.url.clone(),
                status,
                message: env.summary(),
            });
        }
        if !env.ok {
            return Err(ClientError::Rejected { status, message: env.summary(), errors: env.errors });
        }
        Ok(env)
    }
}

enum PlanError {
    Terminal(ClientError),
    Exhausted(Vec<Attempt>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ImageFile;

    fn names(s: &[Strategy]) -> Vec<(&'static str, String, String)> {
        s.iter().map(|s| (s.name, s.method.to_string(), s.url.clone())).collect()
    }

    #[test]
    fn legacy_update_plan() {
        let ep = Endpoint::legacy("http://h/api/Category");
        let p = plan(Operation::Update, &ep, Some("7"));
        assert_eq!(
            names(&p),
            vec![
                ("put-multipart", "PUT".into(), "http://h/api/Category/Update".into()),
                ("put-json", "PUT".into(), "http://h/api/Category/Update".into()),
                ("post-multipart", "POST".into(), "http://h/api/Category/Update".into()),
                ("put-json-pascal", "PUT".into(), "http://h/api/Category/Update".into()),
            ]
        );
        assert!(p.iter().all(|s| s.id == IdPlacement::Body));
        assert!(!p[1].with_image);
        assert_eq!(p[1].image_follow_up.as_deref(), Some("http://h/api/Category/UpdateImage"));
        assert_eq!(p[3].encoding, Encoding::Json(FieldCase::Pascal));
    }

    #[test]
    fn delete_plans() {
        let legacy = plan(Operation::Delete, &Endpoint::legacy("http://h/api/Category"), Some("9"));
        assert_eq!(legacy[0].encoding, Encoding::Json(FieldCase::Camel));
        assert_eq!(legacy[1].url, "http://h/api/Category/9");
        assert_eq!(legacy[1].id, IdPlacement::Path);
        assert_eq!(legacy[2].encoding, Encoding::Multipart(FieldCase::Camel));

        let rest = plan(Operation::Delete, &Endpoint::rest("http://h/api/categories"), Some("9"));
        assert_eq!(names(&rest), vec![("delete-path", "DELETE".into(), "http://h/api/categories/9".into())]);
    }

    #[test]
    fn create_and_read_plans() {
        let legacy = plan(Operation::Create, &Endpoint::legacy("http://h/api/Product"), None);
        let encodings: Vec<_> = legacy.iter().map(|s| s.encoding).collect();
        assert_eq!(
            encodings,
            vec![
                Encoding::Multipart(FieldCase::Camel),
                Encoding::Json(FieldCase::Camel),
                Encoding::Multipart(FieldCase::Pascal),
            ]
        );
        let get = plan(Operation::Get, &Endpoint::legacy("http://h/api/Product"), Some("3"));
        assert_eq!(get[0].url, "http://h/api/Product/Get/3");
        assert_eq!(get[1].url, "http://h/api/Product/3");
        let by_cat = plan(Operation::ListByCategory, &Endpoint::rest("http://h/api/subcategories"), Some("c1"));
        assert_eq!(by_cat[0].url, "http://h/api/subcategories/category/c1");
    }

    #[test]
    fn json_encoding_applies_case_and_data_urls() {
        let form = FormPayload::new()
            .text("name", "Cakes")
            .text("categoryId", "c1")
            .image(ImageFile::new("a.png", "image/png", vec![1, 2]));
        let camel = encode_json(&form, FieldCase::Camel, Some("7"), true);
        assert_eq!(camel["id"], "7");
        assert_eq!(camel["categoryId"], "c1");
        assert!(camel["image"].as_str().unwrap().starts_with("data:image/png;base64,"));

        let pascal = encode_json(&form, FieldCase::Pascal, Some("7"), false);
        assert_eq!(pascal["Id"], "7");
        assert_eq!(pascal["CategoryId"], "c1");
        assert_eq!(pascal["Name"], "Cakes");
        assert!(pascal.get("Image").is_none());
    }
}
