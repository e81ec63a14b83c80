use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading, analyzing, or charting EV registration data.
#[derive(Error, Debug)]
pub enum EvError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Missing required column: '{0}'")]
    MissingColumn(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Fit error: {0}")]
    Fit(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),
}
