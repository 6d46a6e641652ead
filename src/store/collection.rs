//! Record store: one cached page of server records per entity.
//!
//! `fetch_records` replaces the page wholesale; the mutators patch it in
//! place after the caller has already had the server confirm the write.
//! Failures never propagate to the caller: they land in `error` and go to
//! the notifier, and the last good page stays visible.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::api::{ApiResponse, STATUS_OK, Transport};
use crate::notify::{GENERIC_FAILURE, Notifier};

use super::entity::{DeleteMode, EntityConfig};
use super::observer::{SubscriptionId, Subscribers};
use super::record::{DELETED_FIELD, FAVORITE_FIELD, Record, RecordId};

/// The cached page and its request status
#[derive(Debug, Clone, PartialEq)]
pub struct RecordState {
    pub records: Vec<Record>,
    /// 1-based
    pub page: u32,
    pub pages: u32,
    pub limit: u32,
    pub total: Option<u64>,
    pub loading: bool,
    pub error: Option<String>,
}

impl RecordState {
    fn new(limit: u32) -> Self {
        Self {
            records: Vec::new(),
            page: 1,
            pages: 0,
            limit,
            total: None,
            loading: false,
            error: None,
        }
    }

    fn position(&self, id: &RecordId) -> Option<usize> {
        self.records.iter().position(|r| r.has_id(id))
    }
}

/// State transition broadcast to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum RecordEvent {
    FetchStarted,
    FetchApplied { count: usize },
    FetchFailed { message: String },
    /// A response arrived after a newer request was issued and was dropped
    FetchSuperseded,
    RecordsChanged,
    PageChanged { page: u32, limit: u32 },
}

/// How a `fetch_records` call ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied { count: usize },
    Failed { message: String },
    Superseded,
}

/// Page contents pulled out of a list envelope
struct Page {
    records: Vec<Record>,
    page: Option<u32>,
    pages: Option<u32>,
    limit: Option<u32>,
    total: Option<u64>,
}

fn parse_records(items: &[Value]) -> Option<Vec<Record>> {
    items.iter().cloned().map(Record::from_value).collect()
}

fn u32_field(map: &Map<String, Value>, key: &str) -> Option<u32> {
    map.get(key)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
}

/// Accepts `data: [...]` or a wrapped page `data: {records|rows|data: [...],
/// pages, ...}`; top-level envelope fields win over wrapped ones.
fn parse_page(response: &ApiResponse) -> Option<Page> {
    let mut page = match &response.data {
        Value::Array(items) => Page {
            records: parse_records(items)?,
            page: None,
            pages: None,
            limit: None,
            total: None,
        },
        Value::Object(wrapper) => {
            let items = ["records", "rows", "data"]
                .iter()
                .find_map(|key| wrapper.get(*key).and_then(Value::as_array))?;
            Page {
                records: parse_records(items)?,
                page: u32_field(wrapper, "page"),
                pages: u32_field(wrapper, "pages"),
                limit: u32_field(wrapper, "limit"),
                total: wrapper.get("total").and_then(Value::as_u64),
            }
        }
        _ => return None,
    };

    page.page = response.page.or(page.page);
    page.pages = response.pages.or(page.pages);
    page.limit = response.limit.or(page.limit);
    page.total = response.total.or(page.total);
    Some(page)
}

/// A record with its fuzzy match score
#[derive(Debug, Clone)]
pub struct MatchedRecord {
    pub record: Record,
    pub score: i64,
}

fn searchable_text(record: &Record) -> String {
    record
        .fields()
        .iter()
        .filter(|(key, _)| !key.ends_with("_details"))
        .filter_map(|(_, value)| match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct RecordStore {
    entity: EntityConfig,
    transport: Arc<dyn Transport>,
    notifier: Arc<dyn Notifier>,
    state: RwLock<RecordState>,
    /// Token of the most recently issued fetch
    latest_request: AtomicU64,
    subscribers: Subscribers<RecordEvent>,
    events: broadcast::Sender<RecordEvent>,
}

/// Buffered events per broadcast receiver before it starts lagging
const EVENT_CAPACITY: usize = 64;

impl RecordStore {
    pub fn new(
        entity: EntityConfig,
        transport: Arc<dyn Transport>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let state = RecordState::new(entity.page_size);
        Self {
            entity,
            transport,
            notifier,
            state: RwLock::new(state),
            latest_request: AtomicU64::new(0),
            subscribers: Subscribers::new(),
            events: broadcast::channel(EVENT_CAPACITY).0,
        }
    }

    pub fn entity(&self) -> &EntityConfig {
        &self.entity
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.notifier
    }

    pub fn snapshot(&self) -> RecordState {
        self.state.read().clone()
    }

    pub fn records(&self) -> Vec<Record> {
        self.state.read().records.clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.read().error.clone()
    }

    pub fn page(&self) -> u32 {
        self.state.read().page
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&RecordEvent) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Receiver for state transitions, for async consumers that outlive a
    /// single call. Only events sent after this call are delivered.
    pub fn events(&self) -> broadcast::Receiver<RecordEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: RecordEvent) {
        self.subscribers.emit(&event);
        // No receivers is fine
        let _ = self.events.send(event);
    }

    /// Load the current page from the list endpoint.
    ///
    /// `body` is merged over the implicit `page`/`limit`. Only the most
    /// recently issued call may write its response; an older one that
    /// resolves late returns [`FetchOutcome::Superseded`] and changes nothing.
    pub async fn fetch_records(&self, body: Map<String, Value>) -> FetchOutcome {
        let (token, mut request) = {
            let mut state = self.state.write();
            let token = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
            state.loading = true;
            state.error = None;

            let mut request = Map::new();
            request.insert("page".to_string(), Value::from(state.page));
            request.insert("limit".to_string(), Value::from(state.limit));
            (token, request)
        };
        request.extend(body);

        self.emit(RecordEvent::FetchStarted);
        debug!(entity = %self.entity.name, token, "fetching records");

        let result = self
            .transport
            .post_json(self.entity.list_path(), &Value::Object(request))
            .await;

        let outcome = {
            let mut state = self.state.write();
            if self.latest_request.load(Ordering::SeqCst) != token {
                None
            } else {
                state.loading = false;
                Some(match &result {
                    Ok(response) if response.status == STATUS_OK => match parse_page(response) {
                        Some(page) => {
                            let count = page.records.len();
                            state.records = page.records;
                            if let Some(n) = page.page {
                                state.page = n.max(1);
                            }
                            if let Some(n) = page.pages {
                                state.pages = n;
                            }
                            if let Some(n) = page.limit {
                                state.limit = n.max(1);
                            }
                            if page.total.is_some() {
                                state.total = page.total;
                            }
                            state.error = None;
                            FetchOutcome::Applied { count }
                        }
                        None => {
                            let message = format!("Unexpected response while loading {}", self.entity.name);
                            state.error = Some(message.clone());
                            FetchOutcome::Failed { message }
                        }
                    },
                    Ok(response) => {
                        let message = response.message_or(GENERIC_FAILURE);
                        state.error = Some(message.clone());
                        FetchOutcome::Failed { message }
                    }
                    Err(e) => {
                        let message = format!("Failed to load {}: {e}", self.entity.name);
                        state.error = Some(message.clone());
                        FetchOutcome::Failed { message }
                    }
                })
            }
        };

        match outcome {
            None => {
                debug!(entity = %self.entity.name, token, "dropping superseded response");
                self.emit(RecordEvent::FetchSuperseded);
                FetchOutcome::Superseded
            }
            Some(FetchOutcome::Applied { count }) => {
                debug!(entity = %self.entity.name, count, "records loaded");
                self.emit(RecordEvent::FetchApplied { count });
                FetchOutcome::Applied { count }
            }
            Some(FetchOutcome::Failed { message }) => {
                warn!(entity = %self.entity.name, error = %message, "failed to fetch records");
                self.notifier.error(&message);
                self.emit(RecordEvent::FetchFailed {
                    message: message.clone(),
                });
                FetchOutcome::Failed { message }
            }
            Some(FetchOutcome::Superseded) => FetchOutcome::Superseded,
        }
    }

    /// Drop any in-flight fetch; its response will be ignored.
    pub fn invalidate(&self) {
        {
            let mut state = self.state.write();
            self.latest_request.fetch_add(1, Ordering::SeqCst);
            state.loading = false;
        }
        self.emit(RecordEvent::RecordsChanged);
    }

    /// Set the page to fetch next. Does not fetch.
    pub fn set_page(&self, page: u32) {
        let (page, limit) = {
            let mut state = self.state.write();
            state.page = page.max(1);
            (state.page, state.limit)
        };
        self.emit(RecordEvent::PageChanged { page, limit });
    }

    /// Set the page size for the next fetch. Does not fetch.
    pub fn set_limit(&self, limit: u32) {
        let (page, limit) = {
            let mut state = self.state.write();
            state.limit = limit.max(1);
            (state.page, state.limit)
        };
        self.emit(RecordEvent::PageChanged { page, limit });
    }

    /// Local lookup only
    pub fn get_record(&self, id: &RecordId) -> Option<Record> {
        let state = self.state.read();
        state.position(id).map(|i| state.records[i].clone())
    }

    /// Put a newly created record at the front of the page
    pub fn save_record(&self, record: Record) {
        self.state.write().records.insert(0, record);
        self.emit(RecordEvent::RecordsChanged);
    }

    /// Shallow-merge `record` into the row with the same id.
    /// Returns false (and changes nothing) when no row matches.
    pub fn update_record(&self, record: &Record) -> bool {
        let Some(id) = record.id() else {
            return false;
        };
        self.modify(&id, |existing| existing.merge(record))
    }

    /// Remove the row
    pub fn hard_delete_record(&self, id: &RecordId) -> bool {
        let removed = {
            let mut state = self.state.write();
            match state.position(id) {
                Some(i) => {
                    state.records.remove(i);
                    true
                }
                None => false,
            }
        };
        if removed {
            self.emit(RecordEvent::RecordsChanged);
        }
        removed
    }

    /// Keep the row, mark it deleted
    pub fn soft_delete_record(&self, id: &RecordId) -> bool {
        self.modify(id, |r| r.set(DELETED_FIELD, Value::Bool(true)))
    }

    /// Delete according to the entity's [`DeleteMode`]
    pub fn delete_record(&self, id: &RecordId) -> bool {
        match self.entity.delete_mode {
            DeleteMode::Soft => self.soft_delete_record(id),
            DeleteMode::Hard => self.hard_delete_record(id),
        }
    }

    /// Undo a delete. Soft mode clears the flag; hard mode drops the row
    /// from the listing of deleted records it was restored from.
    pub fn restore_record(&self, id: &RecordId) -> bool {
        match self.entity.delete_mode {
            DeleteMode::Soft => self.modify(id, |r| r.set(DELETED_FIELD, Value::Bool(false))),
            DeleteMode::Hard => self.hard_delete_record(id),
        }
    }

    pub fn mark_as_favorite(&self, id: &RecordId) -> bool {
        self.toggle_status(id, FAVORITE_FIELD)
    }

    /// Flip a boolean-like field in place
    pub fn toggle_status(&self, id: &RecordId, field: &str) -> bool {
        self.modify(id, |r| r.toggle_flag(field))
    }

    /// Client-side fuzzy search over the loaded page, best match first.
    /// `*_details` snapshots are not searched.
    pub fn search(&self, query: &str) -> Vec<MatchedRecord> {
        let records = self.records();
        if query.trim().is_empty() {
            return records
                .into_iter()
                .map(|record| MatchedRecord { record, score: 0 })
                .collect();
        }

        let matcher = SkimMatcherV2::default().smart_case();
        let mut matches: Vec<MatchedRecord> = records
            .into_iter()
            .filter_map(|record| {
                matcher
                    .fuzzy_match(&searchable_text(&record), query)
                    .map(|score| MatchedRecord { record, score })
            })
            .collect();
        matches.sort_by(|a, b| b.score.cmp(&a.score));
        matches
    }

    fn modify(&self, id: &RecordId, f: impl FnOnce(&mut Record)) -> bool {
        let found = {
            let mut state = self.state.write();
            match state.position(id) {
                Some(i) => {
                    f(&mut state.records[i]);
                    true
                }
                None => false,
            }
        };
        if found {
            self.emit(RecordEvent::RecordsChanged);
        }
        found
    }
}
