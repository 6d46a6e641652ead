use std::path::PathBuf;

/// Environment variable that relocates the settings directory.
pub const ROOT_ENV: &str = "BACKOFFICE_ROOT";

/// Returns the root settings directory path.
///
/// Resolution order:
/// 1. `BACKOFFICE_ROOT` environment variable (if set)
/// 2. Current working directory + `.backoffice`
pub fn backoffice_root() -> PathBuf {
    if let Ok(root) = std::env::var(ROOT_ENV) {
        PathBuf::from(root)
    } else {
        PathBuf::from(".backoffice")
    }
}

/// Returns the path to the configuration file.
pub fn config_file() -> PathBuf {
    backoffice_root().join("config.yaml")
}
