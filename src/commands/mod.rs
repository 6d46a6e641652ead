mod catalog;
mod config;
mod ls;
mod mutate;

pub use catalog::{cmd_modules, cmd_tabs};
pub use config::{cmd_config_get, cmd_config_set, cmd_config_show};
pub use ls::{LsOptions, cmd_ls};
pub use mutate::{cmd_delete, cmd_favorite, cmd_restore};

use std::sync::Arc;

use owo_colors::OwoColorize;
use serde_json::Value;

use crate::cli::OutputOptions;
use crate::config::Config;
use crate::error::Result;
use crate::modules::Module;
use crate::notify::{Notifier, Toast, ToastLevel};
use crate::registry::{StoreRegistry, get_or_init_registry};
use crate::session::ListSession;

/// What a command prints: JSON always, text when it differs
pub struct CommandOutput {
    json: Value,
    text: Option<String>,
}

impl CommandOutput {
    pub fn new(json: Value) -> Self {
        Self { json, text: None }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn print(self, output: OutputOptions) -> Result<()> {
        if output.json || self.text.is_none() {
            print_json(&self.json)
        } else {
            if let Some(text) = self.text {
                println!("{text}");
            }
            Ok(())
        }
    }
}

pub fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints toasts to stderr so JSON on stdout stays clean
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, toast: Toast) {
        match toast.level {
            ToastLevel::Success => eprintln!("{} {}", "✓".green(), toast.message),
            ToastLevel::Info => eprintln!("{} {}", "i".cyan(), toast.message),
            ToastLevel::Warning => eprintln!("{} {}", "!".yellow(), toast.message),
            ToastLevel::Error => eprintln!("{} {}", "✗".red(), toast.message.red()),
        }
    }
}

/// The process registry, built from the config file on first use
pub async fn registry() -> Result<&'static StoreRegistry> {
    get_or_init_registry(|| {
        let config = Config::load()?;
        StoreRegistry::from_config(&config, Arc::new(ConsoleNotifier))
    })
    .await
}

/// A mounted list session for `module`
pub async fn open_session(module: Module) -> Result<ListSession> {
    let stores = registry().await?.stores(module)?;
    let session = ListSession::new(stores);
    session.mount();
    Ok(session)
}
