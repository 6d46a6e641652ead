//! `delete`, `restore` and `favorite`: single-record actions.

use owo_colors::OwoColorize;
use serde_json::json;

use super::{CommandOutput, open_session};
use crate::cli::OutputOptions;
use crate::error::{BackofficeError, Result};
use crate::modules::Module;
use crate::store::RecordId;

fn finish(action: &str, module: Module, id: &RecordId, ok: bool, output: OutputOptions) -> Result<()> {
    if !ok {
        return Err(BackofficeError::Other(format!(
            "could not {action} {module} record {id}"
        )));
    }
    CommandOutput::new(json!({
        "action": action,
        "module": module.name(),
        "id": id,
        "success": true,
    }))
    .with_text(format!("{} {module} record {}", past_tense(action), id.cyan()))
    .print(output)
}

fn past_tense(action: &str) -> &'static str {
    match action {
        "delete" => "Deleted",
        "restore" => "Restored",
        _ => "Toggled favorite on",
    }
}

pub async fn cmd_delete(module: Module, id: RecordId, output: OutputOptions) -> Result<()> {
    let session = open_session(module).await?;
    let ok = session.delete(&id).await;
    finish("delete", module, &id, ok, output)
}

pub async fn cmd_restore(module: Module, id: RecordId, output: OutputOptions) -> Result<()> {
    let session = open_session(module).await?;
    let ok = session.restore(&id).await;
    finish("restore", module, &id, ok, output)
}

pub async fn cmd_favorite(module: Module, id: RecordId, output: OutputOptions) -> Result<()> {
    let session = open_session(module).await?;
    let ok = session.favorite(&id).await;
    finish("favorite", module, &id, ok, output)
}
