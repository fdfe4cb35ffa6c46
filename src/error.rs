use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a whole run
#[derive(Debug, Error)]
pub enum LeadsError {
    #[error("proxy API key is not configured: set \"api_key\" in {0} or SCRAPEOPS_API_KEY, or pass --no-proxy")]
    MissingApiKey(PathBuf),
    #[error("invalid config file {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0} does not contain a JSON list of listing URLs")]
    NotAList(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, LeadsError>;
