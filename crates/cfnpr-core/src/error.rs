use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("stack declarations: {0}")]
    Config(String),

    #[error("template {path}: {source}")]
    Template {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{account}/{stack}: {message}")]
    RemoteService {
        account: String,
        stack: String,
        message: String,
    },

    #[error("{account}/{stack}: changeset not terminal after {elapsed_secs}s")]
    Timeout {
        account: String,
        stack: String,
        elapsed_secs: u64,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
