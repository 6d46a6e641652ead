//! Top-level application configuration.
//!
//! Configuration is stored in `.backoffice/config.yaml` and includes:
//! - One API base URL per backend service family (CRM, e-commerce, rental)
//! - The bearer token sent to every backend
//! - Request timeout and default page size

use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BackofficeError, Result};
use crate::paths;

/// Environment variable overriding the configured token.
pub const TOKEN_ENV: &str = "BACKOFFICE_TOKEN";

/// Backend service family. Each family has its own `API_DOMAIN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceFamily {
    Crm,
    Ecommerce,
    Rental,
}

impl ServiceFamily {
    pub const ALL: [ServiceFamily; 3] = [
        ServiceFamily::Crm,
        ServiceFamily::Ecommerce,
        ServiceFamily::Rental,
    ];

    /// Name of the environment variable overriding this family's base URL.
    pub fn env_var(self) -> &'static str {
        match self {
            ServiceFamily::Crm => "BACKOFFICE_CRM_API_DOMAIN",
            ServiceFamily::Ecommerce => "BACKOFFICE_ECOMMERCE_API_DOMAIN",
            ServiceFamily::Rental => "BACKOFFICE_RENTAL_API_DOMAIN",
        }
    }
}

impl fmt::Display for ServiceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceFamily::Crm => write!(f, "crm"),
            ServiceFamily::Ecommerce => write!(f, "ecommerce"),
            ServiceFamily::Rental => write!(f, "rental"),
        }
    }
}

impl std::str::FromStr for ServiceFamily {
    type Err = BackofficeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "crm" => Ok(ServiceFamily::Crm),
            "ecommerce" | "e-commerce" => Ok(ServiceFamily::Ecommerce),
            "rental" => Ok(ServiceFamily::Rental),
            _ => Err(BackofficeError::Config(format!(
                "unknown service family '{s}', expected 'crm', 'ecommerce' or 'rental'"
            ))),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URLs per service family
    #[serde(default)]
    pub api: ApiDomains,

    /// Authentication
    #[serde(default)]
    pub auth: AuthConfig,

    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Records per page when the caller does not say otherwise (default: 10)
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

fn default_timeout() -> u64 {
    30
}

fn default_page_size() -> u32 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiDomains::default(),
            auth: AuthConfig::default(),
            timeout: default_timeout(),
            page_size: default_page_size(),
        }
    }
}

/// `API_DOMAIN` per service family
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiDomains {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ecommerce: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rental: Option<String>,
}

/// Authentication configuration
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> PathBuf {
        paths::config_file()
    }

    /// Load configuration from file, or return default if not found
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            BackofficeError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config at {}: {}", path.display(), e),
            ))
        })?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                BackofficeError::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create directory for config at {}: {}",
                        parent.display(),
                        e
                    ),
                ))
            })?;
        }

        let content = serde_yaml_ng::to_string(self)?;
        fs::write(&path, content).map_err(|e| {
            BackofficeError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write config at {}: {}", path.display(), e),
            ))
        })?;

        // Owner read/write only, the file may hold a token
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&path, permissions)?;
        }

        Ok(())
    }

    /// Base URL for a service family, environment variable first
    pub fn api_domain(&self, family: ServiceFamily) -> Option<String> {
        if let Ok(domain) = env::var(family.env_var())
            && !domain.is_empty()
        {
            return Some(domain);
        }

        match family {
            ServiceFamily::Crm => self.api.crm.clone(),
            ServiceFamily::Ecommerce => self.api.ecommerce.clone(),
            ServiceFamily::Rental => self.api.rental.clone(),
        }
    }

    /// Like [`Config::api_domain`] but fails with a hint when unset
    pub fn require_api_domain(&self, family: ServiceFamily) -> Result<String> {
        self.api_domain(family).ok_or_else(|| {
            BackofficeError::Config(format!(
                "no API domain configured for '{family}'. Set {} or run: backoffice config set api.{family} <url>",
                family.env_var()
            ))
        })
    }

    /// Set the base URL for a service family
    pub fn set_api_domain(&mut self, family: ServiceFamily, domain: String) {
        let slot = match family {
            ServiceFamily::Crm => &mut self.api.crm,
            ServiceFamily::Ecommerce => &mut self.api.ecommerce,
            ServiceFamily::Rental => &mut self.api.rental,
        };
        *slot = Some(domain);
    }

    /// Get the bearer token from environment or config
    pub fn token(&self) -> Option<String> {
        if let Ok(token) = env::var(TOKEN_ENV)
            && !token.is_empty()
        {
            return Some(token);
        }

        self.auth.token.clone()
    }

    /// Set the bearer token
    pub fn set_token(&mut self, token: String) {
        self.auth.token = Some(token);
    }

    /// Get the request timeout duration, never shorter than one second
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.max(1))
    }
}
