//! Per-entity parameters of the generic record store.

use serde::{Deserialize, Serialize};

use super::record::RecordId;

/// How a confirmed delete shows up in the local collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeleteMode {
    /// Keep the row and flip its `deleted` flag (list filters locally)
    Soft,
    /// Drop the row (server filters deleted rows out)
    #[default]
    Hard,
}

/// Endpoint templates; `{id}` is replaced with the record id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub list: String,
    pub save: String,
    pub update: String,
    pub favorite: String,
    pub status: String,
    pub delete: String,
    pub restore: String,
}

impl Endpoints {
    /// Conventional endpoints for a resource path segment
    pub fn for_resource(resource: &str) -> Self {
        let resource = resource.trim_matches('/');
        Self {
            list: format!("/{resource}/list"),
            save: format!("/{resource}/save"),
            update: format!("/{resource}/update"),
            favorite: format!("/{resource}/{{id}}/favorite"),
            status: format!("/{resource}/{{id}}/status/{{value}}"),
            delete: format!("/{resource}/{{id}}/deleted/1"),
            restore: format!("/{resource}/{{id}}/deleted/0"),
        }
    }
}

fn render(template: &str, id: &RecordId) -> String {
    template.replace("{id}", &id.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityConfig {
    /// Human name used in messages ("vehicles")
    pub name: String,
    pub endpoints: Endpoints,
    pub delete_mode: DeleteMode,
    pub page_size: u32,
}

impl EntityConfig {
    pub fn new(name: impl Into<String>, resource: &str) -> Self {
        Self {
            name: name.into(),
            endpoints: Endpoints::for_resource(resource),
            delete_mode: DeleteMode::default(),
            page_size: 10,
        }
    }

    pub fn with_delete_mode(mut self, mode: DeleteMode) -> Self {
        self.delete_mode = mode;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn list_path(&self) -> &str {
        &self.endpoints.list
    }

    pub fn save_path(&self) -> &str {
        &self.endpoints.save
    }

    pub fn update_path(&self) -> &str {
        &self.endpoints.update
    }

    pub fn favorite_path(&self, id: &RecordId) -> String {
        render(&self.endpoints.favorite, id)
    }

    pub fn status_path(&self, id: &RecordId, on: bool) -> String {
        render(&self.endpoints.status, id).replace("{value}", if on { "1" } else { "0" })
    }

    pub fn delete_path(&self, id: &RecordId) -> String {
        render(&self.endpoints.delete, id)
    }

    pub fn restore_path(&self, id: &RecordId) -> String {
        render(&self.endpoints.restore, id)
    }
}
