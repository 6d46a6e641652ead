//! REST call contract shared by every back-office endpoint.
//!
//! All endpoints answer with the same envelope:
//! `{ "status": 200, "data": ..., "message": "..." }`, optionally with
//! pagination fields for list endpoints. The [`Transport`] trait is the
//! only way stores reach the network.

pub mod http;

#[cfg(test)]
pub(crate) mod scripted;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BackofficeError, Result};

pub use http::HttpTransport;

/// Status the backend uses for a successful read or update
pub const STATUS_OK: u16 = 200;
/// Status the backend uses for a successful create
pub const STATUS_CREATED: u16 = 201;

/// Response envelope returned by every endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: u16,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl ApiResponse {
    /// A `200` envelope carrying `data`
    pub fn ok(data: Value) -> Self {
        Self {
            status: STATUS_OK,
            data,
            ..Default::default()
        }
    }

    /// A `201` envelope carrying `data`
    pub fn created(data: Value) -> Self {
        Self {
            status: STATUS_CREATED,
            data,
            ..Default::default()
        }
    }

    /// A failed envelope with a human-readable message
    pub fn failure(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            data: Value::Null,
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn with_pages(mut self, pages: u32) -> Self {
        self.pages = Some(pages);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// `200` or `201`
    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK || self.status == STATUS_CREATED
    }

    /// The message to surface for this envelope, with a fallback
    pub fn message_or(&self, fallback: &str) -> String {
        match self.message.as_deref() {
            Some(message) if !message.trim().is_empty() => message.to_string(),
            _ => fallback.to_string(),
        }
    }

    /// Decode a raw response body.
    ///
    /// The envelope's own `status` wins over the HTTP status; bodies that
    /// are not an envelope (proxies, HTML error pages) are folded into one
    /// using the HTTP status so callers always see the same shape.
    pub fn from_http(http_status: u16, body: &[u8]) -> Result<Self> {
        let parsed: Option<Value> = serde_json::from_slice(body).ok();

        match parsed {
            Some(Value::Object(mut object)) => {
                if !object.get("status").is_some_and(Value::is_u64) {
                    object.insert("status".to_string(), Value::from(http_status));
                }
                Ok(serde_json::from_value(Value::Object(object))?)
            }
            _ if (200..300).contains(&http_status) => Err(BackofficeError::api(
                http_status,
                "response body is not a JSON envelope",
            )),
            _ => {
                let text = String::from_utf8_lossy(body).trim().to_string();
                let message = if text.is_empty() {
                    format!("HTTP {http_status}")
                } else {
                    text
                };
                Ok(ApiResponse::failure(http_status, message))
            }
        }
    }
}

/// One part of a multipart upload
#[derive(Debug, Clone, PartialEq)]
pub enum FormField {
    Text(String),
    File {
        file_name: String,
        mime: Option<String>,
        bytes: Vec<u8>,
    },
}

/// Ordered multipart form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormData {
    pub fields: Vec<(String, FormField)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), FormField::Text(value.into())));
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: Option<&str>,
        bytes: Vec<u8>,
    ) -> Self {
        self.fields.push((
            name.into(),
            FormField::File {
                file_name: file_name.into(),
                mime: mime.map(str::to_string),
                bytes,
            },
        ));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// HTTP helpers the stores and sessions call.
///
/// Implementations return the envelope for ordinary HTTP error statuses and
/// only return `Err` when the request never completed.
#[async_trait]
pub trait Transport: Send + Sync {
    /// `GET path`
    async fn get(&self, path: &str) -> Result<ApiResponse>;

    /// `POST path` with a form-encoded body
    async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse>;

    /// `POST path` with a JSON body
    async fn post_json(&self, path: &str, body: &Value) -> Result<ApiResponse>;

    /// `POST path` with a multipart body
    async fn post_with_form_data(&self, path: &str, form: FormData) -> Result<ApiResponse>;
}
