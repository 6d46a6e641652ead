use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackofficeError {
    #[error("unknown module '{0}'")]
    UnknownModule(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("invalid record id '{0}'")]
    InvalidRecordId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

impl BackofficeError {
    /// Build an API error from a failed response envelope.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        BackofficeError::Api {
            status,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BackofficeError>;
