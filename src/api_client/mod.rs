// HTTP client wrapper shared by every domain API module

pub mod envelope;
pub mod error;

use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use futures::StreamExt;
use reqwest::{
    Method, StatusCode,
    header::CONTENT_TYPE,
    multipart::{Form, Part},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

pub use envelope::Envelope;
pub use error::ApiError;

use crate::{
    domain::{Paginated, Pagination},
    session::Session,
};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const UPLOAD_CHUNK: usize = 64 * 1024;

#[derive(Debug)]
pub enum RequestBody {
    Json(Value),
    Multipart(Form),
}

/// Per-call knobs. Anything left `None` falls back to the service defaults.
#[derive(Debug, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub query: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub requires_auth: Option<bool>,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        RequestOptions {
            method,
            ..Default::default()
        }
    }

    pub fn query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = Some(RequestBody::Json(serde_json::to_value(body)?));
        Ok(self)
    }

    pub fn multipart(mut self, form: Form) -> Self {
        self.body = Some(RequestBody::Multipart(form));
        self
    }

    pub fn requires_auth(mut self, requires_auth: bool) -> Self {
        self.requires_auth = Some(requires_auth);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A file to send as one multipart part, alongside plain text fields.
#[derive(Debug, Clone)]
pub struct Upload {
    pub field: String,
    pub file_name: String,
    pub bytes: Bytes,
    pub content_type: Option<String>,
    pub fields: Vec<(String, String)>,
}

#[derive(Clone, Debug)]
pub struct ApiService {
    base_url: String,
    requires_auth: bool,
    timeout: Duration,
    session: Session,
    client: reqwest::Client,
}

impl ApiService {
    /// Create a client rooted at `base_url` (e.g. "https://portal.example.com/api").
    pub fn new(base_url: impl Into<String>, session: Session) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().build()?;
        let base_url_str = base_url.into();
        tracing::debug!(base_url = %base_url_str, "creating ApiService");
        Ok(ApiService {
            base_url: base_url_str.trim_end_matches('/').to_string(),
            requires_auth: false,
            timeout: DEFAULT_TIMEOUT,
            session,
            client,
        })
    }

    /// Attach the session bearer token to every call unless a call opts out.
    pub fn with_auth(mut self, requires_auth: bool) -> Self {
        self.requires_auth = requires_auth;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Issue one call and return the unwrapped `data`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        Ok(self.request_envelope(endpoint, options).await?.data)
    }

    /// Issue one call and return the whole envelope, pagination included.
    #[tracing::instrument(level = "debug", skip(self, options), fields(method = %options.method))]
    pub async fn request_envelope<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<Envelope<T>, ApiError> {
        let (status, body) = self.exchange(endpoint, options).await?;
        envelope::decode(status, &body)
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.request(endpoint, RequestOptions::new(Method::GET)).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: Vec<(String, String)>,
    ) -> Result<T, ApiError> {
        self.request(endpoint, RequestOptions::new(Method::GET).query(query))
            .await
    }

    /// GET a list route. A missing pagination block is treated as a single page.
    pub async fn get_paginated<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: Vec<(String, String)>,
    ) -> Result<Paginated<T>, ApiError> {
        let env: Envelope<Vec<T>> = self
            .request_envelope(endpoint, RequestOptions::new(Method::GET).query(query))
            .await?;
        let pagination = env.pagination.unwrap_or_else(|| {
            tracing::warn!(%endpoint, "list response without pagination");
            Pagination::single_page(env.data.len())
        });
        Ok(Paginated {
            items: env.data,
            pagination,
        })
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(endpoint, RequestOptions::new(Method::POST).json(body)?)
            .await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(endpoint, RequestOptions::new(Method::PUT).json(body)?)
            .await
    }

    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(endpoint, RequestOptions::new(Method::PATCH).json(body)?)
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.request(endpoint, RequestOptions::new(Method::DELETE))
            .await
    }

    pub async fn delete_with_body<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.request(endpoint, RequestOptions::new(Method::DELETE).json(body)?)
            .await
    }

    /// Multipart upload reporting progress as a fraction in 0.0..=1.0.
    ///
    /// The callback fires as the transport pulls each chunk of the file part.
    #[tracing::instrument(level = "debug", skip(self, upload, on_progress), fields(file_name = %upload.file_name, size = upload.bytes.len()))]
    pub async fn upload<T, F>(
        &self,
        endpoint: &str,
        upload: Upload,
        on_progress: F,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        F: Fn(f64) + Send + Sync + 'static,
    {
        let on_progress = Arc::new(on_progress);
        let total = upload.bytes.len();
        let chunks: Vec<Bytes> = (0..total)
            .step_by(UPLOAD_CHUNK)
            .map(|start| upload.bytes.slice(start..(start + UPLOAD_CHUNK).min(total)))
            .collect();

        let report = on_progress.clone();
        let mut sent = 0usize;
        let stream = futures::stream::iter(chunks).map(move |chunk| {
            sent += chunk.len();
            report(sent as f64 / total as f64);
            Ok::<_, std::io::Error>(chunk)
        });

        let mut part = Part::stream_with_length(reqwest::Body::wrap_stream(stream), total as u64)
            .file_name(upload.file_name.clone());
        if let Some(ct) = upload.content_type.as_deref() {
            part = part.mime_str(ct)?;
        }
        let mut form = Form::new();
        for (k, v) in upload.fields {
            form = form.text(k, v);
        }
        form = form.part(upload.field, part);

        let result = self
            .request(endpoint, RequestOptions::new(Method::POST).multipart(form))
            .await;
        if result.is_ok() && total == 0 {
            on_progress(1.0);
        }
        result
    }

    /// Fetch raw bytes from an absolute URL, typically a signed storage URL on another origin.
    ///
    /// No bearer header and no session side effects: a 401 here comes from the storage origin.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn fetch_bytes(&self, url: &str) -> Result<Bytes, ApiError> {
        let timeout = self.timeout;
        let req = self.client.get(url);
        let exchange = async {
            let resp = req.send().await?;
            let status = resp.status();
            let body = resp.bytes().await?;
            Ok::<_, reqwest::Error>((status, body))
        };
        let (status, body) = match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(%url, ?timeout, "download timed out");
                return Err(ApiError::Timeout { timeout });
            }
        };
        if !status.is_success() {
            return Err(ApiError::RequestFailed {
                message: format!("download failed with HTTP {}", status.as_u16()),
                status: status.as_u16(),
                payload: None,
            });
        }
        tracing::debug!(bytes = body.len(), "downloaded file");
        Ok(body)
    }

    async fn exchange(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<(StatusCode, String), ApiError> {
        let url = self.url(endpoint);
        let timeout = options.timeout.unwrap_or(self.timeout);
        let requires_auth = options.requires_auth.unwrap_or(self.requires_auth);

        let mut req = self.client.request(options.method, &url);
        if !options.query.is_empty() {
            req = req.query(&options.query);
        }
        req = match options.body {
            // reqwest sets the multipart boundary header itself
            Some(RequestBody::Multipart(form)) => req.multipart(form),
            Some(RequestBody::Json(value)) => req.json(&value),
            None => req.header(CONTENT_TYPE, "application/json"),
        };
        if requires_auth {
            match self.session.token().await? {
                Some(token) => req = req.bearer_auth(token),
                None => tracing::debug!(%url, "no session token, sending unauthenticated"),
            }
        }

        tracing::debug!(%url, requires_auth, "sending request");
        let exchange = async {
            let resp = req.send().await?;
            let status = resp.status();
            let body = resp.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        };
        let (status, body) = match tokio::time::timeout(timeout, exchange).await {
            Ok(result) => result.map_err(|e| {
                tracing::error!(error = %e, %url, "network error");
                ApiError::Network(e)
            })?,
            Err(_) => {
                tracing::warn!(%url, ?timeout, "request timed out");
                return Err(ApiError::Timeout { timeout });
            }
        };

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!(%url, "got 401, ending session");
            let payload = serde_json::from_str(&body).ok();
            self.session.handle_unauthorized().await?;
            return Err(ApiError::Unauthorized { payload });
        }
        Ok((status, body))
    }
}
