//! Wire-level request/response envelope and the HTTP transport behind it.
//!
//! The gateway and the session manager build an [`ApiRequest`] and hand it
//! to a [`Transport`]. The production transport is [`HttpTransport`]
//! (reqwest); tests substitute a scripted one.

use async_trait::async_trait;
use reqwest::{multipart, Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::ApiError;

/// Default backend location when nothing is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Multipart field name the upload endpoint expects
pub const UPLOAD_FIELD_NAME: &str = "file";

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    /// Sent as `application/x-www-form-urlencoded`
    Form(Vec<(String, String)>),
    /// Sent as `multipart/form-data` with a single file part
    File {
        file_name: String,
        content_type: String,
        bytes: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub bearer: Option<String>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            bearer: None,
            body: RequestBody::Empty,
        }
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn bearer(mut self, token: Option<String>) -> Self {
        self.bearer = token;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON, mapping failures to `InvalidResponse`
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse response body: {}", e))
        })
    }
}

/// Sends one request and returns whatever status the server answered with.
///
/// Implementations only fail for transport-level problems (connection
/// refused, DNS, TLS); HTTP error statuses come back as `Ok`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// reqwest-backed transport.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport rooted at `base_url`. No timeout override is set;
    /// reqwest's defaults apply.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn the envelope into the reqwest request that goes on the wire
    fn build(&self, request: ApiRequest) -> Result<reqwest::Request, ApiError> {
        let url = self.url(&request.path);
        debug!(method = %request.method, url = %url, authenticated = request.bearer.is_some(), "API request");

        let mut builder = self.client.request(request.method, &url);
        if let Some(ref token) = request.bearer {
            builder = builder.bearer_auth(token);
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Form(fields) => builder.form(&fields),
            RequestBody::File {
                file_name,
                content_type,
                bytes,
            } => {
                let part = multipart::Part::bytes(bytes)
                    .file_name(file_name)
                    .mime_str(&content_type)
                    .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
                builder.multipart(multipart::Form::new().part(UPLOAD_FIELD_NAME, part))
            }
        };

        builder
            .build()
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to build request: {}", e)))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let method = request.method.clone();
        let http_request = self.build(request)?;
        let url = http_request.url().to_string();

        let response = self.client.execute(http_request).await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(method = %method, url = %url, status, "API response");

        Ok(ApiResponse { status, body })
    }
}
