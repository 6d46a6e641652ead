//! Filter value store.
//!
//! Tracks which filter inputs a module shows, which one has focus, and what
//! each one holds, and turns that into the request payload for the list
//! endpoint.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Most filters a module shows at once
pub const DEFAULT_MAX_FILTERS: usize = 5;

/// One selectable filter field. Identity is `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDefinition {
    pub label: String,
    pub value: String,
}

impl FilterDefinition {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// A `{label, value}` option picked in a select input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: Value,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// What a filter input currently holds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Null,
    Text(String),
    Choice(SelectOption),
    Choices(Vec<SelectOption>),
    Other(Value),
}

impl FilterValue {
    /// The value a filter falls back to once removed or cleared
    pub fn cleared(&self) -> FilterValue {
        match self {
            FilterValue::Choices(_) => FilterValue::Choices(Vec::new()),
            FilterValue::Other(Value::Array(_)) => FilterValue::Choices(Vec::new()),
            _ => FilterValue::Null,
        }
    }

    /// Wire form: option objects collapse to their `value`. `None` means the
    /// filter contributes nothing to the query.
    pub fn normalized(&self) -> Option<Value> {
        match self {
            FilterValue::Null => None,
            FilterValue::Text(text) if text.trim().is_empty() => None,
            FilterValue::Text(text) => Some(Value::String(text.clone())),
            FilterValue::Choice(option) => Some(option.value.clone()),
            FilterValue::Choices(options) if options.is_empty() => None,
            FilterValue::Choices(options) => Some(Value::Array(
                options.iter().map(|o| o.value.clone()).collect(),
            )),
            FilterValue::Other(Value::Null) => None,
            FilterValue::Other(Value::Array(items)) if items.is_empty() => None,
            FilterValue::Other(value) => Some(value.clone()),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(text: &str) -> Self {
        FilterValue::Text(text.to_string())
    }
}

impl From<SelectOption> for FilterValue {
    fn from(option: SelectOption) -> Self {
        FilterValue::Choice(option)
    }
}

impl From<Vec<SelectOption>> for FilterValue {
    fn from(options: Vec<SelectOption>) -> Self {
        FilterValue::Choices(options)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterStore {
    filters: Vec<FilterDefinition>,
    active_filter: Option<String>,
    values: BTreeMap<String, FilterValue>,
    max_filters: usize,
}

impl Default for FilterStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILTERS)
    }
}

impl FilterStore {
    pub fn new(max_filters: usize) -> Self {
        Self {
            filters: Vec::new(),
            active_filter: None,
            values: BTreeMap::new(),
            max_filters,
        }
    }

    pub fn filters(&self) -> &[FilterDefinition] {
        &self.filters
    }

    pub fn active_filter(&self) -> Option<&str> {
        self.active_filter.as_deref()
    }

    pub fn max_filters(&self) -> usize {
        self.max_filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.filters.iter().any(|f| f.value == key)
    }

    pub fn value(&self, key: &str) -> Option<&FilterValue> {
        self.values.get(key)
    }

    /// Raw values, exactly as the inputs set them
    pub fn values(&self) -> &BTreeMap<String, FilterValue> {
        &self.values
    }

    /// Replace the shown filter set wholesale. Filters that are no longer
    /// shown lose their values.
    pub fn set_filters(&mut self, filters: Vec<FilterDefinition>) {
        for dropped in &self.filters {
            if !filters.iter().any(|f| f.value == dropped.value)
                && let Some(value) = self.values.get_mut(&dropped.value)
            {
                *value = value.cleared();
            }
        }
        if let Some(active) = self.active_filter.as_deref()
            && !filters.iter().any(|f| f.value == active)
        {
            self.active_filter = filters.first().map(|f| f.value.clone());
        }

        for filter in &filters {
            self.values
                .entry(filter.value.clone())
                .or_insert(FilterValue::Null);
        }
        self.filters = filters;
    }

    /// Focus a filter. Does not touch values.
    pub fn set_active_filter(&mut self, key: Option<&str>) {
        self.active_filter = key.map(str::to_string);
    }

    /// Show a filter and focus it.
    ///
    /// Re-adding a shown filter only focuses it. Returns false, leaving the
    /// store unchanged, when the store is already at capacity.
    pub fn add_filter(&mut self, filter: FilterDefinition) -> bool {
        if self.contains(&filter.value) {
            self.active_filter = Some(filter.value);
            return true;
        }

        if self.filters.len() >= self.max_filters {
            warn!(
                filter = %filter.value,
                max = self.max_filters,
                "filter limit reached, not adding"
            );
            return false;
        }

        self.values
            .entry(filter.value.clone())
            .or_insert(FilterValue::Null);
        self.active_filter = Some(filter.value.clone());
        self.filters.push(filter);
        true
    }

    /// Hide a filter and clear its value
    pub fn remove_filter(&mut self, key: &str) {
        self.filters.retain(|f| f.value != key);

        if let Some(value) = self.values.get_mut(key) {
            *value = value.cleared();
        }

        if self.active_filter.as_deref() == Some(key) {
            self.active_filter = self.filters.first().map(|f| f.value.clone());
        }
    }

    /// Set a filter's value. No validation happens at this layer.
    pub fn update_value(&mut self, key: &str, value: FilterValue) {
        self.values.insert(key.to_string(), value);
    }

    /// Clear every value, keeping the shown filters
    pub fn clear_values(&mut self) {
        for value in self.values.values_mut() {
            *value = value.cleared();
        }
    }

    /// Request payload: normalized values of every shown filter that holds one
    pub fn payload(&self) -> Map<String, Value> {
        self.values
            .iter()
            .filter(|(key, _)| self.contains(key))
            .filter_map(|(key, value)| value.normalized().map(|v| (key.clone(), v)))
            .collect()
    }
}
