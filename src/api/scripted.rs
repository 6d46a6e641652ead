//! In-memory transport for unit tests: replies are queued up front and every
//! call is recorded for later assertions.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::error::{BackofficeError, Result};

use super::{ApiResponse, FormData, Transport};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedCall {
    pub method: &'static str,
    pub path: String,
    pub body: Value,
}

struct Reply {
    response: Result<ApiResponse>,
    gate: Option<oneshot::Receiver<()>>,
}

#[derive(Clone, Default)]
pub(crate) struct ScriptedTransport {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, response: ApiResponse) -> &Self {
        self.replies.lock().push_back(Reply {
            response: Ok(response),
            gate: None,
        });
        self
    }

    pub fn fail(&self, message: &str) -> &Self {
        self.replies.lock().push_back(Reply {
            response: Err(BackofficeError::Other(message.to_string())),
            gate: None,
        });
        self
    }

    /// Queue a reply that is held back until the returned sender fires.
    pub fn reply_when(&self, response: ApiResponse) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().push_back(Reply {
            response: Ok(response),
            gate: Some(rx),
        });
        tx
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    async fn respond(&self, method: &'static str, path: &str, body: Value) -> Result<ApiResponse> {
        self.calls.lock().push(RecordedCall {
            method,
            path: path.to_string(),
            body,
        });
        let reply = self.replies.lock().pop_front();
        match reply {
            Some(Reply { response, gate }) => {
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                response
            }
            None => Err(BackofficeError::Other(format!(
                "no scripted reply for {method} {path}"
            ))),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.respond("GET", path, Value::Null).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<ApiResponse> {
        self.respond("POST", path, body.clone()).await
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<ApiResponse> {
        self.respond("POST_JSON", path, body.clone()).await
    }

    async fn post_with_form_data(&self, path: &str, form: FormData) -> Result<ApiResponse> {
        let names: Vec<Value> = form
            .fields
            .iter()
            .map(|(name, _)| Value::String(name.clone()))
            .collect();
        self.respond("POST_FORM", path, Value::Array(names)).await
    }
}
