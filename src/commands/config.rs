//! Configuration commands.
//!
//! - `config show`: Display current configuration
//! - `config get`: Print one value (secrets masked)
//! - `config set`: Set a configuration value

use owo_colors::OwoColorize;
use serde_json::json;

use super::CommandOutput;
use crate::cli::OutputOptions;
use crate::config::{Config, ServiceFamily, TOKEN_ENV};
use crate::error::{BackofficeError, Result};

const VALID_KEYS: &str = "api.crm, api.ecommerce, api.rental, auth.token, timeout, page_size";

/// A key `config get|set` understands
enum ConfigKey {
    Api(ServiceFamily),
    Token,
    Timeout,
    PageSize,
}

fn parse_key(key: &str) -> Result<ConfigKey> {
    if let Some(family) = key.strip_prefix("api.") {
        return family
            .parse()
            .map(ConfigKey::Api)
            .map_err(|_| unknown_key(key));
    }
    match key {
        "auth.token" => Ok(ConfigKey::Token),
        "timeout" => Ok(ConfigKey::Timeout),
        "page_size" => Ok(ConfigKey::PageSize),
        _ => Err(unknown_key(key)),
    }
}

fn unknown_key(key: &str) -> BackofficeError {
    BackofficeError::Config(format!(
        "unknown config key '{key}'. Valid keys: {VALID_KEYS}"
    ))
}

/// Mask a sensitive value by showing only the first 2 and last 2 characters
fn mask_sensitive_value(value: &str) -> String {
    let char_count = value.chars().count();
    if char_count > 4 {
        let first: String = value.chars().take(2).collect();
        let last: String = value.chars().skip(char_count - 2).collect();
        format!("{first}...{last}")
    } else {
        "****".to_string()
    }
}

fn parse_positive(key: &str, value: &str) -> Result<u64> {
    match value.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(BackofficeError::Config(format!(
            "invalid value '{value}' for {key}. Expected a positive whole number"
        ))),
    }
}

/// Show current configuration
pub fn cmd_config_show(output: OutputOptions) -> Result<()> {
    let config = Config::load()?;

    let domains: Vec<(ServiceFamily, Option<String>)> = ServiceFamily::ALL
        .iter()
        .map(|f| (*f, config.api_domain(*f)))
        .collect();
    let token_configured = config.token().is_some();

    let json_output = json!({
        "api": domains
            .iter()
            .map(|(f, d)| (f.to_string(), json!(d)))
            .collect::<serde_json::Map<_, _>>(),
        "auth": {
            "token_configured": token_configured,
        },
        "timeout": config.timeout,
        "page_size": config.page_size,
        "config_file": Config::config_path().to_string_lossy(),
    });

    let mut text_output = String::new();
    text_output.push_str(&format!("{}\n\n", "Configuration:".cyan().bold()));

    text_output.push_str(&format!("{}:\n", "api".cyan()));
    for (family, domain) in &domains {
        match domain {
            Some(domain) => text_output.push_str(&format!("  {family}: {domain}\n")),
            None => text_output.push_str(&format!(
                "  {family}: {}\n",
                "not configured".dimmed()
            )),
        }
    }
    text_output.push('\n');

    // Never print the token itself
    let token_status = if token_configured {
        "configured".green().to_string()
    } else {
        "not configured".dimmed().to_string()
    };
    text_output.push_str(&format!("{}:\n", "auth".cyan()));
    text_output.push_str(&format!("  token: {token_status}\n\n"));

    text_output.push_str(&format!("{}: {}s\n", "timeout".cyan(), config.timeout));
    text_output.push_str(&format!("{}: {}\n\n", "page_size".cyan(), config.page_size));
    text_output.push_str(&format!(
        "{}",
        format!("Config file: {}", Config::config_path().display()).dimmed()
    ));

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output)
}

/// Set a configuration value
pub fn cmd_config_set(key: &str, value: &str, output: OutputOptions) -> Result<()> {
    let parsed = parse_key(key)?;
    let mut config = Config::load()?;

    let shown = match parsed {
        ConfigKey::Api(family) => {
            url::Url::parse(value).map_err(|e| {
                BackofficeError::Config(format!("invalid URL '{value}' for {key}: {e}"))
            })?;
            config.set_api_domain(family, value.to_string());
            json!(value)
        }
        ConfigKey::Token => {
            config.set_token(value.to_string());
            json!(null)
        }
        ConfigKey::Timeout => {
            config.timeout = parse_positive(key, value)?;
            json!(config.timeout)
        }
        ConfigKey::PageSize => {
            let size = parse_positive(key, value)?;
            config.page_size = u32::try_from(size).map_err(|_| {
                BackofficeError::Config(format!("page_size {size} is too large"))
            })?;
            json!(config.page_size)
        }
    };
    config.save()?;

    let text = if shown.is_null() {
        format!("Set {}", key.cyan())
    } else {
        format!("Set {} to {value}", key.cyan())
    };
    let mut json_output = json!({
        "action": "config_set",
        "key": key,
        "success": true,
    });
    if !shown.is_null() {
        json_output["value"] = shown;
    }

    CommandOutput::new(json_output).with_text(text).print(output)
}

/// Get a specific configuration value
pub fn cmd_config_get(key: &str, output: OutputOptions) -> Result<()> {
    let parsed = parse_key(key)?;
    let config = Config::load()?;

    let (json_output, text_output) = match parsed {
        ConfigKey::Api(family) => {
            let domain = config
                .api_domain(family)
                .ok_or_else(|| BackofficeError::Config(format!("{key} not set")))?;
            (
                json!({"key": key, "value": domain, "configured": true}),
                domain,
            )
        }
        ConfigKey::Token => {
            let token = config.token().ok_or_else(|| {
                BackofficeError::Config(format!("{key} not set (config or {TOKEN_ENV})"))
            })?;
            let masked = mask_sensitive_value(&token);
            let text = format!("{masked} (masked - showing first 2 and last 2 characters)");
            (
                json!({"key": key, "value": masked, "configured": true, "masked": true}),
                text,
            )
        }
        ConfigKey::Timeout => (
            json!({"key": key, "value": config.timeout, "configured": true}),
            config.timeout.to_string(),
        ),
        ConfigKey::PageSize => (
            json!({"key": key, "value": config.page_size, "configured": true}),
            config.page_size.to_string(),
        ),
    };

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_sensitive_value() {
        assert_eq!(mask_sensitive_value("abcdef"), "ab...ef");
        assert_eq!(mask_sensitive_value("12345678"), "12...78");
        assert_eq!(mask_sensitive_value("abcd"), "****");
        assert_eq!(mask_sensitive_value("日本語テキスト"), "日本...スト");
    }

    #[test]
    fn test_parse_key() {
        assert!(matches!(
            parse_key("api.rental"),
            Ok(ConfigKey::Api(ServiceFamily::Rental))
        ));
        assert!(matches!(parse_key("auth.token"), Ok(ConfigKey::Token)));
        assert!(matches!(parse_key("page_size"), Ok(ConfigKey::PageSize)));
        let err = match parse_key("api.billing") {
            Err(e) => e.to_string(),
            Ok(_) => panic!("expected unknown key"),
        };
        assert!(err.contains("Valid keys"));
    }

    #[test]
    fn test_parse_positive() {
        assert_eq!(parse_positive("timeout", "45").unwrap(), 45);
        assert!(parse_positive("timeout", "0").is_err());
        assert!(parse_positive("timeout", "soon").is_err());
    }
}
