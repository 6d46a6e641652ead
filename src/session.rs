//! The list-view call pattern on top of a module's stores.
//!
//! A session seeds the tab and filter stores on mount, builds the list
//! payload from the active view and the filter values, and runs the record
//! mutations in server-first order: the endpoint is called, the outcome is
//! toasted, and the local page is patched only when the server confirmed.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::api::{ApiResponse, FormData};
use crate::error::Result;
use crate::modules::Module;
use crate::registry::ModuleStores;
use crate::store::{FetchOutcome, FilterDefinition, FilterValue, Record, RecordId};

/// Request key carrying the active view
pub const VIEW_KEY: &str = "view";

pub struct ListSession {
    stores: Arc<ModuleStores>,
}

impl ListSession {
    pub fn new(stores: Arc<ModuleStores>) -> Self {
        Self { stores }
    }

    pub fn module(&self) -> Module {
        self.stores.module
    }

    pub fn stores(&self) -> &Arc<ModuleStores> {
        &self.stores
    }

    /// Seed default views and filters into empty stores.
    /// Returns whether anything was seeded.
    pub fn mount(&self) -> bool {
        let module = self.module();
        let catalog = module.tab_catalog();
        let seeded_tabs = self.stores.tabs.update(|tabs| tabs.initialize(&catalog));

        let seeded_filters = self.stores.filters.update(|filters| {
            if filters.is_empty() {
                filters.set_filters(module.default_filters());
                true
            } else {
                false
            }
        });

        debug!(%module, seeded_tabs, seeded_filters, "mounted list session");
        seeded_tabs || seeded_filters
    }

    /// Stop listening for the in-flight fetch, if any
    pub fn unmount(&self) {
        self.stores.records.invalidate();
    }

    /// List request body: normalized filter values plus the active view
    pub fn payload(&self) -> Map<String, Value> {
        let mut payload = self.stores.filters.read(|filters| filters.payload());
        if let Some(view) = self.stores.tabs.read(|tabs| tabs.active_tab().map(str::to_string)) {
            payload.insert(VIEW_KEY.to_string(), Value::String(view));
        }
        payload
    }

    /// Fetch the current page with the current payload
    pub async fn refresh(&self) -> FetchOutcome {
        self.stores.records.fetch_records(self.payload()).await
    }

    /// Activate a view, opening it from the catalog if it is not shown.
    /// Goes back to page 1. Returns false if the view cannot be shown.
    pub fn select_tab(&self, value: &str) -> bool {
        let catalog = self.module().tab_catalog();
        let selected = self.stores.tabs.update(|tabs| {
            if tabs.contains(value) {
                tabs.set_active_tab(value)
            } else if let Some(tab) = catalog.find(value) {
                tabs.add_tab(tab.clone())
            } else {
                warn!(module = %self.module(), tab = %value, "unknown view");
                false
            }
        });
        if selected {
            self.stores.records.set_page(1);
        }
        selected
    }

    pub async fn change_tab(&self, value: &str) -> Option<FetchOutcome> {
        if self.select_tab(value) {
            Some(self.refresh().await)
        } else {
            None
        }
    }

    /// Set a filter value, showing the filter first if needed.
    /// Goes back to page 1. Returns false if the filter cannot be shown.
    pub fn apply_filter(&self, key: &str, value: FilterValue) -> bool {
        let module = self.module();
        let applied = self.stores.filters.update(|filters| {
            if !filters.contains(key) {
                let definition = module
                    .find_filter(key)
                    .unwrap_or_else(|| FilterDefinition::new(key, key));
                if !filters.add_filter(definition) {
                    return false;
                }
            }
            filters.update_value(key, value);
            true
        });
        if applied {
            self.stores.records.set_page(1);
        }
        applied
    }

    pub fn remove_filter(&self, key: &str) {
        self.stores.filters.update(|filters| filters.remove_filter(key));
        self.stores.records.set_page(1);
    }

    pub fn clear_filters(&self) {
        self.stores.filters.update(|filters| filters.clear_values());
        self.stores.records.set_page(1);
    }

    pub async fn go_to_page(&self, page: u32) -> FetchOutcome {
        self.stores.records.set_page(page);
        self.refresh().await
    }

    /// Create a record, then put the saved version at the top of the page
    pub async fn create(&self, fields: Map<String, Value>) -> Option<Record> {
        let entity = self.stores.records.entity();
        let body = Value::Object(fields.clone());
        let result = self
            .stores
            .records
            .transport()
            .post_json(entity.save_path(), &body)
            .await;
        let response = self.confirm("create", "Record created", result)?;
        let record = Record::from_value(response.data).unwrap_or_else(|| Record::new(fields));
        self.stores.records.save_record(record.clone());
        Some(record)
    }

    /// Create a record from a multipart form (records with attachments)
    pub async fn create_with_form(&self, form: FormData) -> Option<Record> {
        let entity = self.stores.records.entity();
        let result = self
            .stores
            .records
            .transport()
            .post_with_form_data(entity.save_path(), form)
            .await;
        let response = self.confirm("create", "Record created", result)?;
        let Some(record) = Record::from_value(response.data) else {
            warn!(module = %self.module(), "save response carried no record");
            return None;
        };
        self.stores.records.save_record(record.clone());
        Some(record)
    }

    /// Send changed fields, then merge the server's version into the page
    pub async fn update(&self, changes: Record) -> bool {
        if changes.id().is_none() {
            self.stores.records.notifier().error("Cannot update a record without an id");
            return false;
        }
        let entity = self.stores.records.entity();
        let result = self
            .stores
            .records
            .transport()
            .post(entity.update_path(), &changes.clone().into_value())
            .await;
        let Some(response) = self.confirm("update", "Record updated", result) else {
            return false;
        };

        let patch = Record::from_value(response.data)
            .filter(|r| r.id() == changes.id())
            .unwrap_or(changes);
        self.stores.records.update_record(&patch);
        true
    }

    pub async fn delete(&self, id: &RecordId) -> bool {
        let path = self.stores.records.entity().delete_path(id);
        let result = self.stores.records.transport().get(&path).await;
        if self.confirm("delete", "Record deleted", result).is_none() {
            return false;
        }
        self.stores.records.delete_record(id);
        true
    }

    pub async fn restore(&self, id: &RecordId) -> bool {
        let path = self.stores.records.entity().restore_path(id);
        let result = self.stores.records.transport().get(&path).await;
        if self.confirm("restore", "Record restored", result).is_none() {
            return false;
        }
        self.stores.records.restore_record(id);
        true
    }

    pub async fn favorite(&self, id: &RecordId) -> bool {
        let path = self.stores.records.entity().favorite_path(id);
        let result = self.stores.records.transport().get(&path).await;
        if self.confirm("update favorites", "Favorites updated", result).is_none() {
            return false;
        }
        self.stores.records.mark_as_favorite(id);
        true
    }

    /// Flip a loaded record's status switch on the server, then locally
    pub async fn toggle_status(&self, id: &RecordId, field: &str) -> bool {
        let Some(record) = self.stores.records.get_record(id) else {
            self.stores
                .records
                .notifier()
                .error(&format!("Record {id} is not loaded"));
            return false;
        };
        let path = self.stores.records.entity().status_path(id, !record.flag(field));
        let result = self.stores.records.transport().get(&path).await;
        if self.confirm("update status", "Status updated", result).is_none() {
            return false;
        }
        self.stores.records.toggle_status(id, field);
        true
    }

    /// Toast the outcome; hand back the envelope only when it succeeded
    fn confirm(
        &self,
        action: &str,
        success: &str,
        result: Result<ApiResponse>,
    ) -> Option<ApiResponse> {
        let notifier = self.stores.records.notifier();
        match result {
            Ok(response) if response.is_success() => {
                notifier.success(&response.message_or(success));
                Some(response)
            }
            Ok(response) => {
                warn!(module = %self.module(), action, status = response.status, "request rejected");
                notifier.handle_response(&response);
                None
            }
            Err(e) => {
                warn!(module = %self.module(), action, error = %e, "request failed");
                notifier.error(&format!("Failed to {action}: {e}"));
                None
            }
        }
    }
}
