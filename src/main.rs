use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use backoffice::cli::{Cli, Commands, ConfigAction, OutputOptions, generate_completions};
use backoffice::commands::{
    LsOptions, cmd_config_get, cmd_config_set, cmd_config_show, cmd_delete, cmd_favorite, cmd_ls,
    cmd_modules, cmd_restore, cmd_tabs,
};

/// Filter directives, e.g. `BACKOFFICE_LOG=backoffice=debug`
const LOG_ENV: &str = "BACKOFFICE_LOG";
const LOG_JSON_ENV: &str = "BACKOFFICE_LOG_JSON";

fn env_bool(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

/// Logs go to stderr; stdout is reserved for command output
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    if env_bool(LOG_JSON_ENV, false) {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ls {
            module,
            tab,
            filters,
            page,
            limit,
            search,
            json,
        } => {
            cmd_ls(
                LsOptions {
                    module,
                    tab,
                    filters,
                    page,
                    limit,
                    search,
                },
                OutputOptions { json },
            )
            .await
        }
        Commands::Tabs { module, json } => cmd_tabs(module, OutputOptions { json }),
        Commands::Modules { json } => cmd_modules(OutputOptions { json }),
        Commands::Delete { module, id, json } => {
            cmd_delete(module, id, OutputOptions { json }).await
        }
        Commands::Restore { module, id, json } => {
            cmd_restore(module, id, OutputOptions { json }).await
        }
        Commands::Favorite { module, id, json } => {
            cmd_favorite(module, id, OutputOptions { json }).await
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { json } => cmd_config_show(OutputOptions { json }),
            ConfigAction::Set { key, value, json } => {
                cmd_config_set(&key, &value, OutputOptions { json })
            }
            ConfigAction::Get { key, json } => cmd_config_get(&key, OutputOptions { json }),
        },
        Commands::Completions { shell } => {
            generate_completions(shell);
            Ok(())
        }
    };

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
