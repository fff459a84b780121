//! HTTP executor.
//!
//! [`Executor`] is the single seam through which every request leaves the
//! crate. Pagination and the change stream only ever talk to this trait, so
//! they can be driven by the real [`HttpExecutor`] or by a scripted fake.

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, IF_MATCH};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::auth::ApiKeyAuth;
use crate::config::Config;
use crate::error::{CybsiError, Result};
use crate::models::Tag;

const USER_AGENT: &str = concat!("cybsi-sdk-client/v", env!("CARGO_PKG_VERSION"));
const API_MEDIA_TYPE: &str = "application/vnd.ptsecurity.app-v2";
const ETAG_HEADER: &str = "ETag";

/// Where a request is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Path relative to the configured API URL.
    Path(String),
    /// Absolute URL, as advertised by a `Link` header.
    Url(Url),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.write_str(path),
            Self::Url(url) => f.write_str(url.as_str()),
        }
    }
}

/// A single API request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub target: Target,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    fn new(method: Method, target: Target) -> Self {
        Self {
            method,
            target,
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// `GET` a path relative to the API URL.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, Target::Path(path.into()))
    }

    /// `GET` an absolute URL.
    pub fn follow(url: Url) -> Self {
        Self::new(Method::GET, Target::Url(url))
    }

    /// `POST` a JSON body.
    pub fn post<B: Serialize + ?Sized>(path: impl Into<String>, body: &B) -> Result<Self> {
        Self::new(Method::POST, Target::Path(path.into())).json(body)
    }

    /// `PUT` a JSON body.
    pub fn put<B: Serialize + ?Sized>(path: impl Into<String>, body: &B) -> Result<Self> {
        Self::new(Method::PUT, Target::Path(path.into())).json(body)
    }

    /// `PATCH` a JSON body guarded by an `If-Match` tag.
    pub fn patch<B: Serialize + ?Sized>(
        path: impl Into<String>,
        tag: &Tag,
        body: &B,
    ) -> Result<Self> {
        let value = HeaderValue::from_str(tag.as_str())
            .map_err(|_| CybsiError::InvalidData(format!("invalid ETag value: {tag}")))?;
        let mut request = Self::new(Method::PATCH, Target::Path(path.into())).json(body)?;
        request.headers.insert(IF_MATCH, value);
        Ok(request)
    }

    fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Append a query parameter.
    #[must_use]
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    /// Append a query parameter when a value is present.
    #[must_use]
    pub fn query_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    /// Append every field of a serializable query struct.
    pub fn query_struct<Q: Serialize + ?Sized>(mut self, query: &Q) -> Result<Self> {
        match serde_json::to_value(query)? {
            serde_json::Value::Object(fields) => {
                for (key, value) in fields {
                    match value {
                        serde_json::Value::Null => {}
                        serde_json::Value::String(s) => self.query.push((key, s)),
                        serde_json::Value::Array(items) => {
                            for item in items {
                                self.query.push((key.clone(), scalar_to_string(item)));
                            }
                        }
                        other => self.query.push((key, scalar_to_string(other))),
                    }
                }
                Ok(self)
            }
            _ => Err(CybsiError::InvalidData(
                "query parameters must serialize to an object".to_string(),
            )),
        }
    }

    /// First query parameter value with the given key.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

fn scalar_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

/// A successful API response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// Final URL of the request; relative `Link` targets resolve against it.
    pub url: Url,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ApiResponse {
    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CybsiError::InvalidData`] if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| {
            CybsiError::InvalidData(format!("unexpected response body from {}: {e}", self.url))
        })
    }

    /// Header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Resource version from the `ETag` header, empty if absent.
    pub fn tag(&self) -> Tag {
        Tag::new(self.header(ETAG_HEADER).unwrap_or_default())
    }
}

/// Performs one HTTP round trip.
///
/// Implementations return `Ok` only for 2xx responses and map every other
/// status through [`CybsiError::from_status`]. Implementations must be safe
/// to share between independent paginations.
#[async_trait]
pub trait Executor: Send + Sync + fmt::Debug {
    /// Execute the request.
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// [`Executor`] backed by a `reqwest` connection pool.
///
/// Authenticates with [`ApiKeyAuth`] and transparently re-authenticates
/// once when a request is rejected with HTTP 401.
pub struct HttpExecutor {
    http: Client,
    api_url: Url,
    auth: ApiKeyAuth,
    embed_object_url: bool,
}

impl fmt::Debug for HttpExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpExecutor")
            .field("api_url", &self.api_url.as_str())
            .finish_non_exhaustive()
    }
}

impl HttpExecutor {
    /// Build an executor from client configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(API_MEDIA_TYPE));

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .danger_accept_invalid_certs(!config.ssl_verify)
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .timeout(config.timeout)
            .build()
            .map_err(CybsiError::HttpError)?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            auth: ApiKeyAuth::new(&config.api_url, &config.api_key)?,
            embed_object_url: config.embed_object_url,
        })
    }

    fn resolve(&self, target: &Target) -> Result<Url> {
        match target {
            Target::Path(path) => Ok(self.api_url.join(path.trim_start_matches('/'))?),
            Target::Url(url) => Ok(url.clone()),
        }
    }

    async fn send(&self, request: &ApiRequest, authorization: &str) -> Result<Response> {
        let url = self.resolve(&request.target)?;

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .headers(request.headers.clone())
            .header(reqwest::header::AUTHORIZATION, authorization);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        // Link targets already carry the query of the request they came from.
        if self.embed_object_url && matches!(request.target, Target::Path(_)) {
            builder = builder.query(&[("embedObjectURL", "true")]);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        builder.send().await.map_err(CybsiError::HttpError)
    }

    /// Check response status and convert errors.
    async fn check_response(response: Response) -> Result<ApiResponse> {
        let status = response.status();
        let url = response.url().clone();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(CybsiError::HttpError)?;

        if !status.is_success() {
            return Err(CybsiError::from_status(status.as_u16(), &body));
        }

        Ok(ApiResponse {
            url,
            status,
            headers,
            body,
        })
    }
}

#[async_trait]
impl Executor for HttpExecutor {
    #[tracing::instrument(skip(self, request), fields(method = %request.method, target = %request.target))]
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        let authorization = self.auth.authorization(&self.http).await?;
        let mut response = self.send(&request, &authorization).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!("request was not authorized, refreshing access token");
            let authorization = self.auth.refresh(&self.http, &authorization).await?;
            response = self.send(&request, &authorization).await?;
        }

        let response = Self::check_response(response).await?;
        tracing::debug!(status = %response.status, "request completed");
        Ok(response)
    }
}
