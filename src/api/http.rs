//! reqwest-backed [`Transport`].
//!
//! # Security Note - Logging
//!
//! The bearer token is wrapped in `RedactedHeader`, whose `Display` and
//! `Debug` print `[REDACTED]`, so enabling `BACKOFFICE_LOG=reqwest=debug` cannot
//! leak it through header formatting.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header;
use reqwest::{Client, multipart};
use secrecy::{ExposeSecret, SecretBox};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::config::{Config, ServiceFamily};
use crate::error::{BackofficeError, Result};

use super::{ApiResponse, FormData, FormField, Transport};

/// Wrapper for sensitive header values that redacts the value when formatted.
struct RedactedHeader {
    value: String,
}

impl RedactedHeader {
    fn bearer(token: &str) -> Self {
        Self {
            value: format!("Bearer {token}"),
        }
    }

    fn as_header_value(&self) -> Result<header::HeaderValue> {
        let mut value = header::HeaderValue::from_str(&self.value)
            .map_err(|_| BackofficeError::Config("token contains invalid characters".into()))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Display for RedactedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Debug for RedactedHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedactedHeader")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// HTTP transport bound to one service family's `API_DOMAIN`
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    token: Option<SecretBox<String>>,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl HttpTransport {
    /// Create a transport for `base_url` with the given request timeout.
    ///
    /// Connect timeout is capped at half the total timeout.
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout / 2)
            .build()?;

        Ok(Self {
            client,
            base_url,
            token: token.map(|t| SecretBox::new(Box::new(t))),
        })
    }

    /// Create a transport for a service family from configuration
    pub fn from_config(config: &Config, family: ServiceFamily) -> Result<Self> {
        let domain = config.require_api_domain(family)?;
        Self::new(&domain, config.token(), config.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an endpoint path against the base URL, keeping any path
    /// prefix the base carries (`https://host/api` + `/vehicles/list`).
    pub fn endpoint_url(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        match &self.token {
            Some(token) => {
                let auth_header = RedactedHeader::bearer(token.expose_secret());
                Ok(request.header(header::AUTHORIZATION, auth_header.as_header_value()?))
            }
            None => Ok(request),
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<ApiResponse> {
        let response = self
            .authorize(request)?
            .header(header::ACCEPT, header::HeaderValue::from_static("application/json"))
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.bytes().await?;
        debug!(status, bytes = body.len(), "received response");
        ApiResponse::from_http(status, &body)
    }
}

/// Flatten a JSON object into form pairs; nested values are sent as JSON text.
fn form_pairs(body: &Value) -> Vec<(String, String)> {
    match body {
        Value::Object(map) => map
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| {
                let value = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.clone(), value)
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn multipart_form(form: FormData) -> Result<multipart::Form> {
    let mut multipart = multipart::Form::new();
    for (name, field) in form.fields {
        multipart = match field {
            FormField::Text(text) => multipart.text(name, text),
            FormField::File {
                file_name,
                mime,
                bytes,
            } => {
                let mut part = multipart::Part::bytes(bytes).file_name(file_name);
                if let Some(mime) = mime {
                    part = part.mime_str(&mime)?;
                }
                multipart.part(name, part)
            }
        };
    }
    Ok(multipart)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<ApiResponse> {
        let url = self.endpoint_url(path)?;
        debug!(%url, "GET");
        self.send(self.client.get(url)).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse> {
        let url = self.endpoint_url(path)?;
        debug!(%url, "POST form");
        self.send(self.client.post(url).form(&form_pairs(body))).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<ApiResponse> {
        let url = self.endpoint_url(path)?;
        debug!(%url, "POST json");
        self.send(self.client.post(url).json(body)).await
    }

    async fn post_with_form_data(&self, path: &str, form: FormData) -> Result<ApiResponse> {
        let url = self.endpoint_url(path)?;
        debug!(%url, parts = form.fields.len(), "POST multipart");
        self.send(self.client.post(url).multipart(multipart_form(form)?))
            .await
    }
}
