//! `ls`: fetch and print one page of a module's records.

use owo_colors::OwoColorize;
use serde_json::{Value, json};
use tabled::builder::Builder;
use tabled::settings::Style;

use super::{CommandOutput, open_session};
use crate::cli::OutputOptions;
use crate::error::{BackofficeError, Result};
use crate::modules::Module;
use crate::store::{FetchOutcome, FilterValue, Record, SelectOption};

/// Most columns shown in the text table
const MAX_COLUMNS: usize = 6;

pub struct LsOptions {
    pub module: Module,
    pub tab: Option<String>,
    pub filters: Vec<(String, String)>,
    pub page: u32,
    pub limit: Option<u32>,
    pub search: Option<String>,
}

/// A command-line filter value: `a,b` sends a list, anything else a string
fn filter_value(raw: &str) -> FilterValue {
    if raw.contains(',') {
        FilterValue::Choices(
            raw.split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| SelectOption::new(part, part))
                .collect(),
        )
    } else {
        FilterValue::from(raw)
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

/// `id` first, then the first scalar fields of the first record
fn columns(records: &[Record]) -> Vec<String> {
    let mut columns = vec!["id".to_string()];
    if let Some(first) = records.first() {
        columns.extend(
            first
                .fields()
                .iter()
                .filter(|(key, value)| {
                    key.as_str() != "id" && !key.ends_with("_details") && is_scalar(value)
                })
                .map(|(key, _)| key.clone())
                .take(MAX_COLUMNS - 1),
        );
    }
    columns
}

fn render_table(records: &[Record]) -> String {
    let columns = columns(records);
    let mut builder = Builder::default();
    builder.push_record(columns.clone());
    for record in records {
        builder.push_record(columns.iter().map(|c| record.display_field(c)));
    }
    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

pub async fn cmd_ls(options: LsOptions, output: OutputOptions) -> Result<()> {
    let module = options.module;
    let session = open_session(module).await?;

    if let Some(tab) = options.tab.as_deref()
        && !session.select_tab(tab)
    {
        return Err(BackofficeError::Other(format!(
            "cannot show view '{tab}' for {module}. See `backoffice tabs {module}`"
        )));
    }

    for (key, raw) in &options.filters {
        if !session.apply_filter(key, filter_value(raw)) {
            return Err(BackofficeError::InvalidFilter(format!(
                "cannot add filter '{key}': {module} shows at most {} filters",
                module.max_filters()
            )));
        }
    }

    let records_store = &session.stores().records;
    if let Some(limit) = options.limit {
        records_store.set_limit(limit);
    }
    records_store.set_page(options.page);

    if let FetchOutcome::Failed { message } = session.refresh().await {
        return Err(BackofficeError::Other(message));
    }

    let state = records_store.snapshot();
    let records: Vec<Record> = match options.search.as_deref() {
        Some(query) => records_store
            .search(query)
            .into_iter()
            .map(|m| m.record)
            .collect(),
        None => state.records.clone(),
    };
    let view = session
        .stores()
        .tabs
        .read(|tabs| tabs.active_tab().map(str::to_string));

    let json_output = json!({
        "module": module.name(),
        "view": view,
        "page": state.page,
        "pages": state.pages,
        "limit": state.limit,
        "total": state.total,
        "records": records,
    });

    let mut text = String::new();
    if records.is_empty() {
        text.push_str(&format!("No {module} found"));
    } else {
        text.push_str(&render_table(&records));
    }
    let footer = match state.total {
        Some(total) => format!(
            "Page {} of {} ({} per page, {total} total)",
            state.page,
            state.pages.max(1),
            state.limit
        ),
        None => format!(
            "Page {} of {} ({} per page)",
            state.page,
            state.pages.max(1),
            state.limit
        ),
    };
    text.push_str(&format!("\n{}", footer.dimmed()));

    CommandOutput::new(json_output).with_text(text).print(output)
}
