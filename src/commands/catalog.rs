//! `modules` and `tabs`: what the back office offers, no network needed.

use owo_colors::OwoColorize;
use serde_json::json;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::CommandOutput;
use crate::cli::OutputOptions;
use crate::error::Result;
use crate::modules::Module;

/// A row in the modules table
#[derive(Tabled)]
struct ModuleRow {
    #[tabled(rename = "Module")]
    name: String,
    #[tabled(rename = "Backend")]
    family: String,
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Delete")]
    delete_mode: String,
    #[tabled(rename = "Max Tabs")]
    max_tabs: usize,
    #[tabled(rename = "Max Filters")]
    max_filters: usize,
}

fn delete_mode_name(module: Module) -> String {
    serde_json::to_value(module.delete_mode())
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

pub fn cmd_modules(output: OutputOptions) -> Result<()> {
    let json_output = json!(
        Module::ALL
            .iter()
            .map(|m| json!({
                "name": m.name(),
                "family": m.family().to_string(),
                "resource": m.resource(),
                "delete_mode": m.delete_mode(),
                "max_tabs": m.max_tabs(),
                "max_filters": m.max_filters(),
                "default_tab": m.default_tab(),
            }))
            .collect::<Vec<_>>()
    );

    let rows: Vec<ModuleRow> = Module::ALL
        .iter()
        .map(|m| ModuleRow {
            name: m.name().to_string(),
            family: m.family().to_string(),
            resource: m.resource().to_string(),
            delete_mode: delete_mode_name(*m),
            max_tabs: m.max_tabs(),
            max_filters: m.max_filters(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());

    CommandOutput::new(json_output)
        .with_text(table.to_string())
        .print(output)
}

pub fn cmd_tabs(module: Module, output: OutputOptions) -> Result<()> {
    let catalog = module.tab_catalog();
    let json_output = json!({
        "module": module.name(),
        "default_tab": module.default_tab(),
        "sentinel": module.sentinel(),
        "max_tabs": module.max_tabs(),
        "groups": catalog.groups,
        "filters": module.filters(),
    });

    let mut text = String::new();
    text.push_str(&format!(
        "{} {}\n",
        module.name().cyan().bold(),
        format!("(up to {} open views)", module.max_tabs()).dimmed()
    ));
    for group in &catalog.groups {
        text.push_str(&format!("\n{}:\n", group.label.cyan()));
        for tab in &group.options {
            let marker = if tab.value == module.default_tab() {
                " (default)".green().to_string()
            } else {
                String::new()
            };
            text.push_str(&format!("  {:<22} {}{marker}\n", tab.value, tab.label));
        }
    }
    text.push_str(&format!("\n{}:\n", "Filters".cyan()));
    for filter in module.filters() {
        text.push_str(&format!("  {:<22} {}\n", filter.value, filter.label));
    }

    CommandOutput::new(json_output)
        .with_text(text.trim_end().to_string())
        .print(output)
}
