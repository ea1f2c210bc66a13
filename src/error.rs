//! Error types for the dashboard library

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level failure talking to the data service
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Data service answered with a non-success status
    #[error("request to {url} failed with status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlDecode(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlEncode(#[from] toml::ser::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown dimension: {0}")]
    UnknownDimension(String),

    /// Filter expression not of the form `dimension=value`
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
}
