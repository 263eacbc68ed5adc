use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{key}: invalid base URL '{value}'")]
    InvalidBaseUrl { key: &'static str, value: String },

    #[error("{key}: base URL must use http or https, got '{scheme}'")]
    UnsupportedScheme { key: &'static str, scheme: String },

    #[error("{key}: expected a positive integer, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key}: expected a comma-separated list of integers, got '{value}'")]
    InvalidCodeList { key: &'static str, value: String },

    #[error("{key}: expected one of error, warn, info, debug, got '{value}'")]
    InvalidLogLevel { key: &'static str, value: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
