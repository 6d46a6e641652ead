use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io;

use crate::error::{BackofficeError, Result};
use crate::modules::Module;
use crate::store::RecordId;

#[derive(Parser)]
#[command(name = "backoffice")]
#[command(about = "List, filter and manage back-office records")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format shared by every command
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List one page of a module's records
    #[command(visible_alias = "l")]
    Ls {
        /// Module name (see `backoffice modules`)
        module: Module,

        /// View to list (defaults to the module's "all" view)
        #[arg(short, long)]
        tab: Option<String>,

        /// Filter as key=value; a comma-separated value sends a list
        #[arg(short, long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,

        /// Page number (1-based)
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Records per page (default: config page_size)
        #[arg(long)]
        limit: Option<u32>,

        /// Fuzzy search within the fetched page
        #[arg(short, long)]
        search: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the views a module offers
    Tabs {
        module: Module,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List every module with its backend and list settings
    Modules {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a record
    Delete {
        module: Module,
        #[arg(value_parser = parse_record_id)]
        id: RecordId,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Restore a deleted record
    Restore {
        module: Module,
        #[arg(value_parser = parse_record_id)]
        id: RecordId,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Toggle a record's favorite flag
    Favorite {
        module: Module,
        #[arg(value_parser = parse_record_id)]
        id: RecordId,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for [possible values: bash, zsh, fish, powershell, elvish]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set a configuration value
    Set {
        /// Key: api.crm, api.ecommerce, api.rental, auth.token, timeout, page_size
        key: String,
        value: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Get a configuration value
    Get {
        key: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Parse a `key=value` filter argument
pub fn parse_filter(s: &str) -> Result<(String, String)> {
    let Some((key, value)) = s.split_once('=') else {
        return Err(BackofficeError::InvalidFilter(format!(
            "'{s}' is not key=value"
        )));
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(BackofficeError::InvalidFilter(format!(
            "'{s}' has an empty key"
        )));
    }
    Ok((key.to_string(), value.trim().to_string()))
}

pub fn parse_record_id(s: &str) -> Result<RecordId> {
    s.parse()
}

pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "backoffice", &mut io::stdout());
}
