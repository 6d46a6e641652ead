#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use parking_lot::Mutex;
use serde_json::{Map, Value, json};
use tempfile::TempDir;

/// Environment variables a developer may have set that would leak into runs
const SCRUBBED_ENV: &[&str] = &[
    "BACKOFFICE_ROOT",
    "BACKOFFICE_TOKEN",
    "BACKOFFICE_CRM_API_DOMAIN",
    "BACKOFFICE_ECOMMERCE_API_DOMAIN",
    "BACKOFFICE_RENTAL_API_DOMAIN",
    "BACKOFFICE_LOG",
    "BACKOFFICE_LOG_JSON",
];

pub fn backoffice_binary() -> PathBuf {
    let debug = concat!(env!("CARGO_MANIFEST_DIR"), "/target/debug/backoffice");
    let release = concat!(env!("CARGO_MANIFEST_DIR"), "/target/release/backoffice");
    match option_env!("CARGO_BIN_EXE_backoffice") {
        Some(path) => PathBuf::from(path),
        None if !cfg!(debug_assertions) && std::path::Path::new(release).exists() => {
            PathBuf::from(release)
        }
        None => PathBuf::from(debug),
    }
}

/// Runs the binary in an isolated temp directory
pub struct BackofficeTest {
    pub temp_dir: TempDir,
    env: Vec<(String, String)>,
}

impl BackofficeTest {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        BackofficeTest {
            temp_dir,
            env: Vec::new(),
        }
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    pub fn root(&self) -> PathBuf {
        self.temp_dir.path().join(".backoffice")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join("config.yaml")
    }

    pub fn write_config(&self, content: &str) {
        std::fs::create_dir_all(self.root()).expect("Failed to create .backoffice directory");
        std::fs::write(self.config_path(), content).expect("Failed to write config");
    }

    pub fn run(&self, args: &[&str]) -> Output {
        let mut command = Command::new(backoffice_binary());
        command.args(args).current_dir(self.temp_dir.path());
        for key in SCRUBBED_ENV {
            command.env_remove(key);
        }
        command.env("NO_COLOR", "1");
        for (key, value) in &self.env {
            command.env(key, value);
        }
        command.output().expect("Failed to execute backoffice command")
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if !output.status.success() {
            panic!(
                "Command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
                args,
                output.status,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "Expected command {:?} to fail, but it succeeded",
            args
        );
        String::from_utf8_lossy(&output.stderr).to_string()
    }

    pub fn run_json(&self, args: &[&str]) -> Value {
        let stdout = self.run_success(args);
        serde_json::from_str(&stdout).unwrap_or_else(|e| panic!("invalid JSON ({e}): {stdout}"))
    }
}

/// A request the mock backend received
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub body: Value,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Default)]
struct MockState {
    records: Mutex<HashMap<String, Vec<Value>>>,
    requests: Mutex<Vec<SeenRequest>>,
    token: Option<String>,
    next_id: Mutex<i64>,
}

impl MockState {
    fn record(&self, method: &str, path: String, headers: &HeaderMap, body: Value) {
        let text = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.requests.lock().push(SeenRequest {
            method: method.to_string(),
            path,
            body,
            authorization: text(header::AUTHORIZATION),
            content_type: text(header::CONTENT_TYPE),
        });
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        match &self.token {
            None => true,
            Some(token) => headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                == Some(format!("Bearer {token}").as_str()),
        }
    }
}

fn envelope(status: StatusCode, body: Value) -> Response {
    (status, axum::Json(body)).into_response()
}

fn unauthorized() -> Response {
    envelope(
        StatusCode::UNAUTHORIZED,
        json!({"status": 401, "message": "Unauthorized"}),
    )
}

fn not_found(resource: &str, id: i64) -> Response {
    envelope(
        StatusCode::NOT_FOUND,
        json!({"status": 404, "message": format!("{resource} {id} not found")}),
    )
}

fn flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64().unwrap_or(0) != 0,
        _ => false,
    }
}

async fn list(
    State(state): State<Arc<MockState>>,
    Path(resource): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    state.record("POST", format!("/{resource}/list"), &headers, body.clone());
    if !state.authorized(&headers) {
        return unauthorized();
    }
    if resource == "broken" {
        return (StatusCode::BAD_GATEWAY, "upstream unavailable").into_response();
    }

    let page = body["page"].as_u64().unwrap_or(1).max(1) as usize;
    let limit = body["limit"].as_u64().unwrap_or(10).max(1) as usize;
    let view = body["view"].as_str().unwrap_or_default();

    let all = state.records.lock().get(&resource).cloned().unwrap_or_default();
    let visible: Vec<Value> = all
        .into_iter()
        .filter(|r| match view {
            "deleted" => flag(&r["deleted"]),
            _ => !flag(&r["deleted"]),
        })
        .filter(|r| {
            body.as_object()
                .into_iter()
                .flatten()
                .filter(|(k, _)| !matches!(k.as_str(), "page" | "limit" | "view"))
                .all(|(k, wanted)| match wanted {
                    Value::Array(options) => options.contains(&r[k]),
                    other => &r[k] == other,
                })
        })
        .collect();

    let total = visible.len();
    let pages = total.div_ceil(limit);
    let records: Vec<Value> = visible.into_iter().skip((page - 1) * limit).take(limit).collect();

    envelope(
        StatusCode::OK,
        json!({
            "status": 200,
            "data": records,
            "page": page,
            "pages": pages,
            "limit": limit,
            "total": total,
        }),
    )
}

async fn save(
    State(state): State<Arc<MockState>>,
    Path(resource): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let is_multipart = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    let fields: Map<String, Value> = if is_multipart {
        let text = String::from_utf8_lossy(&body);
        let mut fields = Map::new();
        for name in ["title", "name", "plate"] {
            if text.contains(&format!("name=\"{name}\"")) {
                fields.insert(name.to_string(), json!(true));
            }
        }
        fields.insert("uploaded_bytes".to_string(), json!(body.len()));
        fields
    } else {
        serde_json::from_slice::<Value>(&body)
            .ok()
            .and_then(|v| v.as_object().cloned())
            .unwrap_or_default()
    };
    state.record(
        "POST",
        format!("/{resource}/save"),
        &headers,
        Value::Object(fields.clone()),
    );
    if !state.authorized(&headers) {
        return unauthorized();
    }

    let id = {
        let mut next = state.next_id.lock();
        *next += 1;
        *next
    };
    let mut record = fields;
    record.insert("id".to_string(), json!(id));
    let record = Value::Object(record);
    state
        .records
        .lock()
        .entry(resource)
        .or_default()
        .push(record.clone());

    envelope(
        StatusCode::CREATED,
        json!({"status": 201, "data": record, "message": "Saved successfully"}),
    )
}

async fn update(
    State(state): State<Arc<MockState>>,
    Path(resource): Path<String>,
    headers: HeaderMap,
    axum::Form(form): axum::Form<HashMap<String, String>>,
) -> Response {
    let body = json!(form);
    state.record("POST", format!("/{resource}/update"), &headers, body);
    if !state.authorized(&headers) {
        return unauthorized();
    }

    let Some(id) = form.get("id").and_then(|id| id.parse::<i64>().ok()) else {
        return envelope(
            StatusCode::BAD_REQUEST,
            json!({"status": 400, "message": "id is required"}),
        );
    };
    let mut records = state.records.lock();
    let Some(record) = records
        .get_mut(&resource)
        .and_then(|rs| rs.iter_mut().find(|r| r["id"] == json!(id)))
    else {
        return not_found(&resource, id);
    };
    for (key, value) in &form {
        if key != "id" {
            record[key] = serde_json::from_str(value).unwrap_or_else(|_| json!(value));
        }
    }
    envelope(
        StatusCode::OK,
        json!({"status": 200, "data": record.clone(), "message": "Updated successfully"}),
    )
}

fn patch_record(
    state: &MockState,
    resource: &str,
    id: i64,
    f: impl FnOnce(&mut Value),
) -> Option<Value> {
    let mut records = state.records.lock();
    let record = records
        .get_mut(resource)?
        .iter_mut()
        .find(|r| r["id"] == json!(id))?;
    f(record);
    Some(record.clone())
}

async fn set_deleted(
    State(state): State<Arc<MockState>>,
    Path((resource, id, deleted)): Path<(String, i64, u8)>,
    headers: HeaderMap,
) -> Response {
    state.record(
        "GET",
        format!("/{resource}/{id}/deleted/{deleted}"),
        &headers,
        Value::Null,
    );
    if !state.authorized(&headers) {
        return unauthorized();
    }
    let message = if deleted == 1 {
        "Deleted successfully"
    } else {
        "Restored successfully"
    };
    match patch_record(&state, &resource, id, |r| r["deleted"] = json!(deleted)) {
        Some(_) => envelope(StatusCode::OK, json!({"status": 200, "message": message})),
        None => not_found(&resource, id),
    }
}

async fn favorite(
    State(state): State<Arc<MockState>>,
    Path((resource, id)): Path<(String, i64)>,
    headers: HeaderMap,
) -> Response {
    state.record("GET", format!("/{resource}/{id}/favorite"), &headers, Value::Null);
    if !state.authorized(&headers) {
        return unauthorized();
    }
    match patch_record(&state, &resource, id, |r| {
        let on = flag(&r["favorite"]);
        r["favorite"] = json!(!on);
    }) {
        Some(record) => envelope(StatusCode::OK, json!({"status": 200, "data": record})),
        None => not_found(&resource, id),
    }
}

async fn set_status(
    State(state): State<Arc<MockState>>,
    Path((resource, id, value)): Path<(String, i64, u8)>,
    headers: HeaderMap,
) -> Response {
    state.record(
        "GET",
        format!("/{resource}/{id}/status/{value}"),
        &headers,
        Value::Null,
    );
    if !state.authorized(&headers) {
        return unauthorized();
    }
    match patch_record(&state, &resource, id, |r| r["status"] = json!(value)) {
        Some(_) => envelope(StatusCode::OK, json!({"status": 200})),
        None => not_found(&resource, id),
    }
}

/// In-memory REST backend speaking the `{status, data, message}` envelope.
/// Routes live under `/api` so base URLs with a path prefix are exercised.
pub struct MockBackend {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockBackend {
    pub async fn start() -> Self {
        Self::start_with(None).await
    }

    pub async fn start_with_token(token: &str) -> Self {
        Self::start_with(Some(token.to_string())).await
    }

    async fn start_with(token: Option<String>) -> Self {
        let state = Arc::new(MockState {
            token,
            next_id: Mutex::new(1000),
            ..Default::default()
        });
        let routes = Router::new()
            .route("/:resource/list", post(list))
            .route("/:resource/save", post(save))
            .route("/:resource/update", post(update))
            .route("/:resource/:id/favorite", get(favorite))
            .route("/:resource/:id/status/:value", get(set_status))
            .route("/:resource/:id/deleted/:flag", get(set_deleted))
            .with_state(Arc::clone(&state));
        let app = Router::new().nest("/api", routes);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        MockBackend {
            base_url: format!("http://{addr}/api"),
            state,
        }
    }

    /// Replace the stored records of a resource
    pub fn seed(&self, resource: &str, records: Value) {
        let records = records.as_array().cloned().unwrap_or_default();
        self.state.records.lock().insert(resource.to_string(), records);
    }

    pub fn records(&self, resource: &str) -> Vec<Value> {
        self.state
            .records
            .lock()
            .get(resource)
            .cloned()
            .unwrap_or_default()
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.state.requests.lock().clone()
    }

    pub fn last_request(&self) -> SeenRequest {
        self.requests().pop().expect("no request received")
    }
}
